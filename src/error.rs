//! Structured error types for the contract engine.
//!
//! Validation problems (a missing signature, a missing id) are raised before
//! anything is drawn. Encoding and I/O failures abort the transaction with no
//! file left behind. Network failures leave the saved file in place so the
//! caller can retry sharing by hand.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::SignatureRole;

/// Which image input an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Header,
    Signature(SignatureRole),
}

impl fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSlot::Header => write!(f, "header image"),
            ImageSlot::Signature(role) => write!(f, "{} signature", role),
        }
    }
}

/// The unified error type returned by all public loanform functions.
#[derive(Debug, Error)]
pub enum ContractError {
    /// A required signature slot is empty.
    #[error("missing {which} signature")]
    MissingSignature { which: SignatureRole },

    /// An image could not be read or decoded.
    #[error("could not decode {which}: {reason}")]
    ImageDecode { which: ImageSlot, reason: String },

    /// Page geometry was unusable or PDF serialization failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The contract file could not be written, or was missing after the write.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The asset host rejected the upload or could not be reached.
    #[error("upload failed: {cause}")]
    Upload { cause: String },

    /// The loan backend rejected the open/return registration.
    #[error("loan registration failed: {cause}")]
    Registry { cause: String },

    /// No share target exists on this platform.
    #[error("sharing is not available on this platform")]
    ShareUnavailable,

    /// A request lacks a field needed further down the pipeline.
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// JSON input failed to parse as a contract request.
    #[error("failed to parse request: {source}{}", format_hint(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for ContractError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the contract request schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => "Unexpected end of input, is the JSON truncated?".to_string(),
            serde_json::error::Category::Io => String::new(),
        };
        ContractError::Parse { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_signature_names_the_slot() {
        let err = ContractError::MissingSignature {
            which: SignatureRole::Custodian,
        };
        assert_eq!(err.to_string(), "missing custodian signature");
    }

    #[test]
    fn test_parse_error_carries_hint() {
        let err: ContractError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.contains("Hint: Check for trailing commas"), "got: {}", msg);
    }

    #[test]
    fn test_image_slot_display() {
        assert_eq!(ImageSlot::Header.to_string(), "header image");
        assert_eq!(
            ImageSlot::Signature(SignatureRole::Counterparty).to_string(),
            "counterparty signature"
        );
    }
}

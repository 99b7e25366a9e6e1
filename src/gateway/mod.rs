//! # Upload/Share Gateway
//!
//! The collaborators a contract meets after it is saved: an asset host that
//! stores the PDF and hands back a URL, the loan backend that records the
//! loan against that URL, and a share target for the saved file.
//!
//! Each is a trait so the workflow can run against the real services, a
//! local directory, or test fakes. All calls are blocking and run one after
//! another; retries are left to the caller.

pub mod http;

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::ContractError;

pub use http::{HttpAssetHost, HttpLoanRegistry};

/// Stores a finished contract and returns a stable URL for it.
pub trait AssetHost {
    fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, ContractError>;
}

/// Body of `POST /loanObject`, sent form-encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenLoanRequest {
    pub user_id: String,
    pub ceiit_id: String,
    /// RFC 3339 timestamp of the signing.
    pub date: String,
    pub link_open_loan: String,
}

/// Body of `POST /returnLoan`, sent as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnLoanRequest {
    pub loan_id: String,
    pub link_close_loan: String,
}

/// The loan backend.
pub trait LoanRegistry {
    fn open_loan(&self, request: &OpenLoanRequest) -> Result<(), ContractError>;
    fn return_loan(&self, request: &ReturnLoanRequest) -> Result<(), ContractError>;
}

/// Somewhere the saved contract can be handed to the user.
pub trait ShareTarget {
    fn is_available(&self) -> bool;
    fn share(&self, path: &Path) -> Result<(), ContractError>;
}

/// Asset host backed by a local folder. Returns `file://` URLs.
#[derive(Debug, Clone)]
pub struct DirectoryAssetHost {
    root: PathBuf,
}

impl DirectoryAssetHost {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetHost for DirectoryAssetHost {
    fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, ContractError> {
        let upload_err = |e: std::io::Error| ContractError::Upload {
            cause: format!("{}: {}", self.root.display(), e),
        };

        fs::create_dir_all(&self.root).map_err(upload_err)?;
        let target = self.root.join(file_name);
        fs::write(&target, bytes).map_err(upload_err)?;
        let absolute = target.canonicalize().map_err(upload_err)?;

        let url = format!("file://{}", absolute.display());
        info!("Stored contract at {}", url);
        Ok(url)
    }
}

/// Opens the file with the platform's default handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemShare;

impl ShareTarget for SystemShare {
    fn is_available(&self) -> bool {
        true
    }

    fn share(&self, path: &Path) -> Result<(), ContractError> {
        opener::open(path).map_err(|e| {
            log::error!("Could not open {}: {}", path.display(), e);
            ContractError::ShareUnavailable
        })?;
        info!("Shared {}", path.display());
        Ok(())
    }
}

/// For headless runs: sharing is never possible.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoShare;

impl ShareTarget for NoShare {
    fn is_available(&self) -> bool {
        false
    }

    fn share(&self, _path: &Path) -> Result<(), ContractError> {
        Err(ContractError::ShareUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_host_returns_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let host = DirectoryAssetHost::new(dir.path().join("uploads"));
        let url = host.upload("loan_contract_1.pdf", b"%PDF").unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("loan_contract_1.pdf"));
        assert_eq!(
            fs::read(dir.path().join("uploads").join("loan_contract_1.pdf")).unwrap(),
            b"%PDF"
        );
    }

    #[test]
    fn test_directory_host_failure_is_upload_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        let err = DirectoryAssetHost::new(&blocker).upload("x.pdf", b"").unwrap_err();
        assert!(matches!(err, ContractError::Upload { .. }));
    }

    #[test]
    fn test_no_share() {
        assert!(!NoShare.is_available());
        assert!(matches!(
            NoShare.share(Path::new("x.pdf")),
            Err(ContractError::ShareUnavailable)
        ));
    }

    #[test]
    fn test_registry_payload_field_names() {
        let open = OpenLoanRequest {
            user_id: "u1".into(),
            ceiit_id: "o1".into(),
            date: "2026-10-17T00:00:00.000Z".into(),
            link_open_loan: "https://files/x.pdf".into(),
        };
        let json = serde_json::to_value(&open).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["ceiitId"], "o1");
        assert_eq!(json["linkOpenLoan"], "https://files/x.pdf");

        let close = ReturnLoanRequest {
            loan_id: "l1".into(),
            link_close_loan: "https://files/y.pdf".into(),
        };
        let json = serde_json::to_value(&close).unwrap();
        assert_eq!(json["loanId"], "l1");
        assert_eq!(json["linkCloseLoan"], "https://files/y.pdf");
    }
}

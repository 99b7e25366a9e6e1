//! # Contract Model
//!
//! The input records for a contract transaction. Everything here is a
//! snapshot taken when the contract is created: a `LoanParty` embedded in a
//! document is not linked back to the live user record, and a
//! `LoanableObject` is read-only (the inventory service owns its state).
//!
//! Field names serialize as camelCase. Object fields also accept the
//! backend's legacy names (`_id`, `NOMBRE`, `Lugar`) so records fetched from
//! the inventory API can be passed through unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A person on one side of the contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanParty {
    /// Backend user id. Only needed to register the loan, never printed.
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub sur_name: String,
    /// Student or staff id ("matrícula").
    #[serde(default)]
    pub tuition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cellphone: Option<String>,
}

impl LoanParty {
    /// "name surName", without a dangling space when either half is empty.
    pub fn full_name(&self) -> String {
        match (self.name.trim(), self.sur_name.trim()) {
            ("", s) => s.to_string(),
            (n, "") => n.to_string(),
            (n, s) => format!("{} {}", n, s),
        }
    }
}

/// An inventory item that can be lent out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanableObject {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "NOMBRE")]
    pub name: String,
    #[serde(default, alias = "Lugar", alias = "lugar")]
    pub location: String,
    #[serde(default = "default_true")]
    pub availability: bool,
}

fn default_true() -> bool {
    true
}

/// Which clause template and signature pair a contract uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContractKind {
    /// Custodian + borrower sign when the object leaves the lab.
    LoanOpening,
    /// Custodian + returner sign when the object comes back.
    LoanReturn,
}

impl ContractKind {
    /// Document title, also used for the PDF /Title entry.
    pub fn title(&self) -> &'static str {
        match self {
            ContractKind::LoanOpening => "Contrato de Préstamo",
            ContractKind::LoanReturn => "Contrato de Devolución",
        }
    }

    /// Prefix for saved file names: `<stem>_contract_<timestamp>.pdf`.
    pub fn file_stem(&self) -> &'static str {
        match self {
            ContractKind::LoanOpening => "loan",
            ContractKind::LoanReturn => "return",
        }
    }
}

/// The two signature slots a contract carries.
///
/// The custodian (lab staff acting as guarantor) always signs first. The
/// counterparty is the borrower on an opening and the returner on a return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignatureRole {
    Custodian,
    Counterparty,
}

impl fmt::Display for SignatureRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureRole::Custodian => write!(f, "custodian"),
            SignatureRole::Counterparty => write!(f, "counterparty"),
        }
    }
}

/// Raw bytes of a captured signature (PNG from the signature pad, or JPEG).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureImage {
    pub bytes: Vec<u8>,
}

impl SignatureImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Image sources for the two signature slots. Each is a data URI, an
/// explicit file path, or raw base64 (see `image_loader::read_source_bytes`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureSources {
    #[serde(default)]
    pub custodian: Option<String>,
    #[serde(default)]
    pub counterparty: Option<String>,
}

impl SignatureSources {
    pub fn get(&self, role: SignatureRole) -> Option<&str> {
        match role {
            SignatureRole::Custodian => self.custodian.as_deref(),
            SignatureRole::Counterparty => self.counterparty.as_deref(),
        }
        .filter(|s| !s.trim().is_empty())
    }
}

/// Document metadata embedded in the PDF Info dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    /// PDF date string (`D:YYYYMMDDHHmmSSZ`).
    pub creation_date: Option<String>,
}

/// A complete contract transaction as read from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRequest {
    pub kind: ContractKind,
    pub party: LoanParty,
    pub object: LoanableObject,
    /// Name of the lab staff member handing over or receiving the object.
    #[serde(default)]
    pub custodian_name: String,
    /// Contact number typed on the form. Falls back to `party.cellphone`.
    #[serde(default)]
    pub cellphone: Option<String>,
    /// Loan being closed. Required to register a return.
    #[serde(default)]
    pub loan_id: Option<String>,
    #[serde(default)]
    pub header_image: Option<String>,
    #[serde(default)]
    pub signatures: SignatureSources,
}

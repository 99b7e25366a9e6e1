//! # Contract Text
//!
//! Maps the parties and the object to the clause text of a loan or return
//! agreement. The same [`ClauseBlock`] list feeds both the plain-text
//! rendering ([`build_contract_text`]) and the PDF layout, so the two never
//! drift apart.
//!
//! The only impure input is the date, which comes from an injected
//! [`Clock`]. With a fixed clock the output is byte-identical across calls.

use serde::{Deserialize, Serialize};

use crate::clock::{format_contract_date, Clock};
use crate::model::{ContractKind, LoanParty, LoanableObject, SignatureRole};

pub const LOAN_LOCATION: &str = "CEIIT ULSA Cd. Chihuahua, Chihuahua";
/// Printed on a return when the object record has no location.
pub const DEFAULT_RETURN_LOCATION: &str = "Cd. Chihuahua, Chihuahua";
pub const PHONE_PLACEHOLDER: &str = "[Agregar número de contacto]";
pub const CUSTODIAN_PLACEHOLDER: &str = "[Agregar nombre del encargado]";

/// Terms of loan, printed verbatim on every opening contract.
pub const LOAN_TERMS: [&str; 8] = [
    "1. Plazo del Préstamo: El objeto debe ser devuelto en condiciones óptimas el [agregar fecha límite].",
    "2. Responsabilidades del Prestatario:",
    "  o El prestatario se compromete a cuidar y mantener el objeto en condiciones óptimas durante el periodo del préstamo.",
    "  o El prestatario deberá notificar inmediatamente al prestamista en caso de cualquier daño, pérdida o robo del objeto.",
    "3. Devolución del Objeto:",
    "  o El objeto debe ser devuelto al prestamista en FABLAB CEIIT ULSA.",
    "  o El prestatario deberá asegurarse de que el objeto se encuentra en las mismas condiciones en que fue prestado.",
    "4. Incumplimiento: En caso de no devolver el objeto en la fecha acordada o de devolverlo en condiciones no óptimas, el prestatario se compromete a cubrir el costo de reparación o total en caso de descompostura.",
];

/// A labelled section of a contract.
///
/// `label` is a heading drawn in bold on its own line (empty for none).
/// `text` may contain newlines; each line is wrapped as its own paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseBlock {
    pub label: String,
    pub text: String,
}

impl ClauseBlock {
    fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

/// Form fields that are not part of the party or object records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractExtra {
    /// Contact number typed on the form; wins over `LoanParty::cellphone`.
    pub cellphone: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    non_blank(Some(value)).unwrap_or(placeholder)
}

/// Clause blocks for a contract dated `date`.
pub fn contract_clauses(
    kind: ContractKind,
    party: &LoanParty,
    object: &LoanableObject,
    custodian_name: &str,
    extra: &ContractExtra,
    date: chrono::NaiveDate,
) -> Vec<ClauseBlock> {
    let date = format_contract_date(date);
    let custodian = or_placeholder(custodian_name, CUSTODIAN_PLACEHOLDER);

    match kind {
        ContractKind::LoanOpening => {
            let phone = non_blank(extra.cellphone.as_deref())
                .or_else(|| non_blank(party.cellphone.as_deref()))
                .unwrap_or(PHONE_PLACEHOLDER);

            vec![
                ClauseBlock::new(kind.title(), ""),
                ClauseBlock::new("", format!("Fecha: {}\nLugar: {}", date, LOAN_LOCATION)),
                ClauseBlock::new(
                    "Parte Prestataria:",
                    format!(
                        "Nombre: {}\nMatrícula: {}\nTeléfono: {}",
                        party.full_name(),
                        party.tuition,
                        phone
                    ),
                ),
                ClauseBlock::new(
                    "Parte Prestamista:",
                    format!("Nombre del encargado: {}", custodian),
                ),
                ClauseBlock::new(
                    "Objeto del Préstamo:",
                    format!(
                        "Nombre: {}\nNúmero de serie: {}\n\
                         Condiciones del objeto al momento del préstamo: Óptimas",
                        object.name, object.id
                    ),
                ),
                ClauseBlock::new("Condiciones del Préstamo:", LOAN_TERMS.join("\n")),
            ]
        }
        ContractKind::LoanReturn => {
            let location = or_placeholder(&object.location, DEFAULT_RETURN_LOCATION);

            vec![
                ClauseBlock::new(kind.title(), ""),
                ClauseBlock::new("", format!("Fecha: {}\nLugar: {}", date, location)),
                ClauseBlock::new(
                    "",
                    format!(
                        "Por medio del presente, se certifica que {} con matrícula {} \
                         ha devuelto el objeto {} con número de serie {} en óptimas \
                         condiciones, y que ha sido inspeccionado y validado su \
                         funcionamiento y condiciones.",
                        party.full_name(),
                        party.tuition,
                        object.name,
                        object.id
                    ),
                ),
                ClauseBlock::new("", format!("Nombre del encargado: {}", custodian)),
            ]
        }
    }
}

/// Plain-text rendering of clause blocks: label and text lines joined with
/// newlines, in order.
pub fn render_clauses(blocks: &[ClauseBlock]) -> String {
    blocks
        .iter()
        .flat_map(|b| [b.label.as_str(), b.text.as_str()])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// The full clause text of a contract, dated by `clock`.
pub fn build_contract_text(
    kind: ContractKind,
    party: &LoanParty,
    object: &LoanableObject,
    custodian_name: &str,
    extra: &ContractExtra,
    clock: &dyn Clock,
) -> String {
    render_clauses(&contract_clauses(
        kind,
        party,
        object,
        custodian_name,
        extra,
        clock.today(),
    ))
}

/// Caption printed under a signature.
pub fn signature_caption(role: SignatureRole, party: &LoanParty, custodian_name: &str) -> String {
    match role {
        SignatureRole::Custodian => or_placeholder(custodian_name, CUSTODIAN_PLACEHOLDER).to_string(),
        SignatureRole::Counterparty => party.full_name(),
    }
}

//! # Loanform
//!
//! Loan and return contracts for the CEIIT ULSA fabrication lab.
//!
//! A contract is a short document: a title, the parties, the object, a few
//! clauses, and two signatures captured on a signature pad. This crate turns
//! those inputs into a PDF, saves it, uploads it and records the loan.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON request)
//!       ↓
//!   [contract] - Clause blocks for a loan opening or a return
//!       ↓
//!   [layout]   - Wrapped lines, logo and signatures placed on pages
//!       ↓
//!   [pdf]      - Serialize to PDF bytes
//!       ↓
//!   [workflow] - Save, upload, register the loan, share
//! ```
//!
//! Every step that reads the time takes a [`clock::Clock`], so the same
//! request and a fixed clock always give the same bytes.

pub mod clock;
pub mod compose;
pub mod config;
pub mod contract;
pub mod error;
pub mod font;
pub mod gateway;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod storage;
pub mod text;
pub mod workflow;

use log::warn;

pub use error::ContractError;

use clock::{format_pdf_date, Clock};
use compose::{compose_document, ComposeConfig, ComposedDocument, SignatureInput};
use contract::{contract_clauses, signature_caption, ContractExtra};
use error::ImageSlot;
use image_loader::read_source_bytes;
use model::{ContractRequest, Metadata, SignatureImage, SignatureRole};

/// Resolve a request into composer input.
///
/// An absent signature source leaves the slot empty, so composition reports
/// it as missing. A source that cannot be read is an `ImageDecode` error. An
/// unreadable header source is logged and dropped.
pub fn contract_config(
    request: &ContractRequest,
    clock: &dyn Clock,
) -> Result<ComposeConfig, ContractError> {
    let extra = ContractExtra {
        cellphone: request.cellphone.clone(),
    };
    let blocks = contract_clauses(
        request.kind,
        &request.party,
        &request.object,
        &request.custodian_name,
        &extra,
        clock.today(),
    );

    let header_image = request
        .header_image
        .as_deref()
        .filter(|src| !src.trim().is_empty())
        .and_then(|src| {
            read_source_bytes(src)
                .map_err(|reason| warn!("Ignoring {}: {}", ImageSlot::Header, reason))
                .ok()
        });

    let signatures = [SignatureRole::Custodian, SignatureRole::Counterparty]
        .into_iter()
        .map(|role| -> Result<SignatureInput, ContractError> {
            let image = request
                .signatures
                .get(role)
                .map(|src| {
                    read_source_bytes(src)
                        .map(SignatureImage::new)
                        .map_err(|reason| ContractError::ImageDecode {
                            which: ImageSlot::Signature(role),
                            reason,
                        })
                })
                .transpose()?;
            Ok(SignatureInput {
                role,
                image,
                caption: signature_caption(role, &request.party, &request.custodian_name),
            })
        })
        .collect::<Result<Vec<_>, ContractError>>()?;

    let author = Some(request.custodian_name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    Ok(ComposeConfig {
        blocks,
        header_image,
        signatures,
        metadata: Metadata {
            title: Some(request.kind.title().to_string()),
            author,
            subject: Some(request.object.name.clone()),
            creation_date: Some(format_pdf_date(clock.now())),
        },
        ..Default::default()
    })
}

/// Compose the PDF for a contract request.
pub fn render_contract(
    request: &ContractRequest,
    clock: &dyn Clock,
) -> Result<ComposedDocument, ContractError> {
    compose_document(&contract_config(request, clock)?)
}

/// Parse a JSON contract request and render it to PDF bytes.
pub fn render_json(json: &str, clock: &dyn Clock) -> Result<Vec<u8>, ContractError> {
    let request: ContractRequest = serde_json::from_str(json)?;
    Ok(render_contract(&request, clock)?.bytes)
}

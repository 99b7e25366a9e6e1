//! # Document Composer
//!
//! Turns clause blocks, an optional header logo and the two signatures into
//! PDF bytes. Validation happens up front: a missing or repeated signature is
//! reported before any image is decoded or anything is laid out. A pad that
//! decodes to nothing but transparency is caught right after decoding.

use log::{debug, info, warn};

use crate::contract::ClauseBlock;
use crate::error::{ContractError, ImageSlot};
use crate::image_loader::{decode_image_bytes, LoadedImage};
use crate::layout::{Cursor, LayoutEngine, LayoutPage, OverflowPolicy, PageGeometry, SignaturePlacement};
use crate::model::{Metadata, SignatureImage, SignatureRole};
use crate::pdf::PdfWriter;

/// One signature slot: the captured image (if any) and the caption under it.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureInput {
    pub role: SignatureRole,
    pub image: Option<SignatureImage>,
    pub caption: String,
}

/// Everything `compose_document` needs.
#[derive(Debug, Clone, Default)]
pub struct ComposeConfig {
    pub blocks: Vec<ClauseBlock>,
    /// Encoded PNG or JPEG bytes for the top-right logo.
    pub header_image: Option<Vec<u8>>,
    /// One per role, drawn custodian first whatever the order here.
    pub signatures: Vec<SignatureInput>,
    pub geometry: PageGeometry,
    pub overflow: OverflowPolicy,
    pub metadata: Metadata,
}

/// The laid-out pages and the PDF they serialize to.
#[derive(Debug, Clone)]
pub struct ComposedDocument {
    pub pages: Vec<LayoutPage>,
    /// Cursor positions in drawing order (see `layout::Layout::trace`).
    pub trace: Vec<Cursor>,
    pub bytes: Vec<u8>,
}

impl ComposedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Lay out and encode a contract.
pub fn compose_document(config: &ComposeConfig) -> Result<ComposedDocument, ContractError> {
    config.geometry.validate()?;

    // Refuse before any decoding or drawing.
    let signatures = signature_slots(&config.signatures)?;

    let header = config.header_image.as_deref().and_then(|bytes| {
        decode_image_bytes(bytes)
            .map_err(|reason| warn!("Skipping header image: {}", reason))
            .ok()
    });

    let decoded = signatures
        .iter()
        .map(|s| decode_signature(s).map(|image| (image, s.caption.as_str())))
        .collect::<Result<Vec<(LoadedImage, &str)>, ContractError>>()?;
    let placements: Vec<SignaturePlacement<'_>> = decoded
        .iter()
        .map(|(image, caption)| SignaturePlacement { image, caption })
        .collect();

    debug!(
        "Composing {} blocks and {} signatures ({:?})",
        config.blocks.len(),
        placements.len(),
        config.overflow
    );

    let engine = LayoutEngine::new(config.geometry, config.overflow);
    let layout = engine.layout(header.as_ref(), &config.blocks, &placements);
    let bytes = PdfWriter::new().write(&layout.pages, &config.metadata)?;

    info!(
        "Composed contract: {} page(s), {} bytes",
        layout.pages.len(),
        bytes.len()
    );

    Ok(ComposedDocument {
        pages: layout.pages,
        trace: layout.trace,
        bytes,
    })
}

/// Exactly one captured signature per role, custodian first.
fn signature_slots(signatures: &[SignatureInput]) -> Result<Vec<&SignatureInput>, ContractError> {
    [SignatureRole::Custodian, SignatureRole::Counterparty]
        .into_iter()
        .map(|role| {
            let mut matching = signatures.iter().filter(|s| s.role == role);
            let Some(signature) = matching.next() else {
                return Err(ContractError::MissingSignature { which: role });
            };
            if matching.next().is_some() {
                return Err(ContractError::Encoding(format!(
                    "{} signature given more than once",
                    role
                )));
            }
            if signature.image.as_ref().map_or(true, SignatureImage::is_empty) {
                return Err(ContractError::MissingSignature { which: role });
            }
            Ok(signature)
        })
        .collect()
}

fn decode_signature(signature: &SignatureInput) -> Result<LoadedImage, ContractError> {
    let bytes = signature
        .image
        .as_ref()
        .map(|image| image.bytes.as_slice())
        .unwrap_or_default();
    let image = decode_image_bytes(bytes).map_err(|reason| ContractError::ImageDecode {
        which: ImageSlot::Signature(signature.role),
        reason,
    })?;
    // A pad exported before anyone signed.
    if image.is_blank() {
        return Err(ContractError::MissingSignature {
            which: signature.role,
        });
    }
    Ok(image)
}

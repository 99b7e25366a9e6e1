//! # Contract Layout
//!
//! Places clause text, the header logo and the signatures on fixed-size
//! pages.
//!
//! Coordinates are PDF user space: origin at the bottom-left corner, `y`
//! growing upwards. A text element's `y` is its baseline; an image element's
//! `(x, y)` is its bottom-left corner. The PDF writer emits them unchanged.
//!
//! ## The cursor
//!
//! Placement is a fold over the document's items. Every `place_*` method
//! takes a [`Cursor`] by value and returns the cursor for the next item
//! together with what it placed; nothing holds a running `y` between calls.
//! Within one page the cursor only moves down. When [`OverflowPolicy::NewPage`]
//! is in effect and an item would land below the bottom margin, the cursor
//! moves to the top of a fresh page first.

pub mod page_break;

use serde::{Deserialize, Serialize};

use crate::contract::ClauseBlock;
use crate::error::ContractError;
use crate::font::StandardFont;
use crate::image_loader::LoadedImage;
use crate::text::{estimate_width, wrap_text};

pub use page_break::{decide_break, BreakDecision, OverflowPolicy};

/// Edge length of the square header logo.
pub const HEADER_IMAGE_SIZE: f64 = 100.0;
pub const SIGNATURE_WIDTH: f64 = 100.0;
pub const SIGNATURE_HEIGHT: f64 = 50.0;
/// A signature sits this many line spacings below the cursor.
pub const SIGNATURE_DROP_LINES: f64 = 6.0;

/// Page size and text metrics, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub line_spacing: f64,
    pub font_size: f64,
}

impl Default for PageGeometry {
    /// A4 with a 50pt margin and 12pt text on a 16pt pitch.
    fn default() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin: 50.0,
            line_spacing: 16.0,
            font_size: 12.0,
        }
    }
}

impl PageGeometry {
    /// Width available to a line of text.
    pub fn text_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    /// Where the cursor starts on every page.
    pub fn top(&self) -> f64 {
        self.height - self.margin
    }

    pub fn validate(&self) -> Result<(), ContractError> {
        let values = [
            self.width,
            self.height,
            self.margin,
            self.line_spacing,
            self.font_size,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ContractError::Encoding(
                "page geometry must be finite".to_string(),
            ));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(ContractError::Encoding(format!(
                "page size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.margin < 0.0 || self.text_width() <= 0.0 || self.top() <= self.margin {
            return Err(ContractError::Encoding(format!(
                "margin {} leaves no room on a {}x{} page",
                self.margin, self.width, self.height
            )));
        }
        if self.line_spacing <= 0.0 || self.font_size <= 0.0 {
            return Err(ContractError::Encoding(
                "line spacing and font size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where the next item goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub page: usize,
    pub y: f64,
}

/// A single page of laid-out elements.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<LayoutElement>,
}

/// A positioned element on a page.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub draw: DrawCommand,
}

/// What to draw for a layout element.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// One line of text with its baseline at the element's `y`.
    Text {
        text: String,
        font: StandardFont,
        font_size: f64,
    },
    /// An image scaled into the element's box.
    Image { image_data: LoadedImage },
}

/// An element together with the cursor it was drawn at.
#[derive(Debug, Clone)]
pub struct Placement {
    pub at: Cursor,
    pub element: LayoutElement,
}

/// A decoded signature and the caption printed under it.
#[derive(Debug, Clone, Copy)]
pub struct SignaturePlacement<'a> {
    pub image: &'a LoadedImage,
    pub caption: &'a str,
}

/// The finished layout.
#[derive(Debug, Clone)]
pub struct Layout {
    pub pages: Vec<LayoutPage>,
    /// Cursor positions in drawing order: the start, one entry per drawn
    /// line or signature, and the final cursor.
    pub trace: Vec<Cursor>,
}

pub struct LayoutEngine {
    geometry: PageGeometry,
    policy: OverflowPolicy,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(PageGeometry::default(), OverflowPolicy::default())
    }
}

impl LayoutEngine {
    pub fn new(geometry: PageGeometry, policy: OverflowPolicy) -> Self {
        Self { geometry, policy }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn start(&self) -> Cursor {
        Cursor {
            page: 0,
            y: self.geometry.top(),
        }
    }

    /// The cursor an item reaching `depth` below it should be drawn from.
    fn make_room(&self, cursor: Cursor, depth: f64) -> Cursor {
        let at_page_top = cursor.y >= self.geometry.top();
        match decide_break(
            self.policy,
            cursor.y - depth,
            self.geometry.margin,
            at_page_top,
        ) {
            BreakDecision::Place => cursor,
            BreakDecision::MoveToNextPage => Cursor {
                page: cursor.page + 1,
                y: self.geometry.top(),
            },
        }
    }

    /// Draw one already-wrapped line at the cursor and step down a line.
    pub fn place_line(&self, cursor: Cursor, text: &str, font: StandardFont) -> (Cursor, Placement) {
        let g = &self.geometry;
        let at = self.make_room(cursor, 0.0);
        let element = LayoutElement {
            x: g.margin,
            y: at.y,
            width: estimate_width(text, g.font_size),
            height: g.font_size,
            draw: DrawCommand::Text {
                text: text.to_string(),
                font,
                font_size: g.font_size,
            },
        };
        let next = Cursor {
            y: at.y - g.line_spacing,
            ..at
        };
        (next, Placement { at, element })
    }

    /// Wrap `text` to the text width and draw every resulting line.
    pub fn place_paragraph(
        &self,
        cursor: Cursor,
        text: &str,
        font: StandardFont,
    ) -> (Cursor, Vec<Placement>) {
        wrap_text(text, self.geometry.text_width(), self.geometry.font_size)
            .iter()
            .fold((cursor, Vec::new()), |(cursor, mut placed), line| {
                let (next, placement) = self.place_line(cursor, line, font);
                placed.push(placement);
                (next, placed)
            })
    }

    /// Draw a clause: the label in bold, then each line of its text as its
    /// own paragraph, then one line of paragraph gap.
    pub fn place_block(&self, cursor: Cursor, block: &ClauseBlock) -> (Cursor, Vec<Placement>) {
        let label = Some(block.label.as_str())
            .filter(|l| !l.is_empty())
            .map(|l| (l, StandardFont::HelveticaBold));
        let body = block.text.lines().map(|l| (l, StandardFont::Helvetica));

        let (end, placed) = label.into_iter().chain(body).fold(
            (cursor, Vec::new()),
            |(cursor, mut placed), (paragraph, font)| {
                let (next, mut lines) = self.place_paragraph(cursor, paragraph, font);
                placed.append(&mut lines);
                (next, placed)
            },
        );

        let after_gap = Cursor {
            y: end.y - self.geometry.line_spacing,
            ..end
        };
        (after_gap, placed)
    }

    /// Draw a signature image `SIGNATURE_DROP_LINES` below the cursor, then
    /// its caption starting at the image's bottom edge.
    pub fn place_signature(
        &self,
        cursor: Cursor,
        signature: SignaturePlacement<'_>,
    ) -> (Cursor, Vec<Placement>) {
        let g = &self.geometry;
        let drop = SIGNATURE_DROP_LINES * g.line_spacing;
        let at = self.make_room(cursor, drop);
        let image_cursor = Cursor {
            y: at.y - drop,
            ..at
        };

        let image = Placement {
            at: image_cursor,
            element: LayoutElement {
                x: g.margin,
                y: image_cursor.y,
                width: SIGNATURE_WIDTH,
                height: SIGNATURE_HEIGHT,
                draw: DrawCommand::Image {
                    image_data: signature.image.clone(),
                },
            },
        };

        let (next, mut caption) =
            self.place_paragraph(image_cursor, signature.caption, StandardFont::Helvetica);
        let mut placed = Vec::with_capacity(caption.len() + 1);
        placed.push(image);
        placed.append(&mut caption);
        (next, placed)
    }

    /// The header logo sits in the top-right corner of the first page,
    /// independent of the text cursor.
    pub fn place_header(&self, image: &LoadedImage) -> LayoutElement {
        let g = &self.geometry;
        LayoutElement {
            x: g.width - g.margin - HEADER_IMAGE_SIZE,
            y: g.height - g.margin - HEADER_IMAGE_SIZE,
            width: HEADER_IMAGE_SIZE,
            height: HEADER_IMAGE_SIZE,
            draw: DrawCommand::Image {
                image_data: image.clone(),
            },
        }
    }

    /// Lay out a whole contract: header, clause blocks, then signatures in
    /// the order given.
    pub fn layout(
        &self,
        header: Option<&LoadedImage>,
        blocks: &[ClauseBlock],
        signatures: &[SignaturePlacement<'_>],
    ) -> Layout {
        let start = self.start();

        let (cursor, placed) = blocks
            .iter()
            .fold((start, Vec::new()), |(cursor, mut placed), block| {
                let (next, mut items) = self.place_block(cursor, block);
                placed.append(&mut items);
                (next, placed)
            });

        let (end, placed) = signatures
            .iter()
            .fold((cursor, placed), |(cursor, mut placed), signature| {
                let (next, mut items) = self.place_signature(cursor, *signature);
                placed.append(&mut items);
                (next, placed)
            });

        let page_count = placed
            .iter()
            .map(|p| p.at.page)
            .chain(std::iter::once(end.page))
            .max()
            .unwrap_or(0)
            + 1;

        let mut pages: Vec<LayoutPage> = (0..page_count)
            .map(|_| LayoutPage {
                width: self.geometry.width,
                height: self.geometry.height,
                elements: Vec::new(),
            })
            .collect();

        if let Some(image) = header {
            pages[0].elements.push(self.place_header(image));
        }

        let mut trace = Vec::with_capacity(placed.len() + 2);
        trace.push(start);
        for placement in placed {
            trace.push(placement.at);
            pages[placement.at.page].elements.push(placement.element);
        }
        trace.push(end);

        Layout { pages, trace }
    }
}

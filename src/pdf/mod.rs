//! # PDF Serializer
//!
//! Takes laid-out pages and writes a valid PDF file.
//!
//! This is a small from-scratch PDF 1.7 writer. Contracts only need two
//! standard fonts, JPEG/PNG images and an Info dictionary, so writing the
//! bytes ourselves keeps the output fully deterministic: the same pages and
//! metadata always produce the same file.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (fonts, pages, content streams, images)
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::ContractError;
use crate::font::StandardFont;
use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};
use crate::layout::{DrawCommand, LayoutElement, LayoutPage};
use crate::model::Metadata;

const PRODUCER: &str = concat!("loanform ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Default)]
pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<Vec<u8>>,
    /// Fonts in resource order: /F0, /F1, ...
    font_objects: Vec<(StandardFont, usize)>,
    /// XObject ids for images, indexed as /Im0, /Im1, ...
    image_objects: Vec<usize>,
    /// Maps (page_index, image_position_in_page) to an index in image_objects.
    image_index_map: BTreeMap<(usize, usize), usize>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(data);
        self.objects.len() - 1
    }

    fn push_stream(&mut self, dict_entries: &str, payload: &[u8]) -> usize {
        let mut data: Vec<u8> = Vec::with_capacity(payload.len() + 64);
        let _ = write!(
            data,
            "<< {} /Length {} >>\nstream\n",
            dict_entries,
            payload.len()
        );
        data.extend_from_slice(payload);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write laid-out pages to a PDF byte vector.
    pub fn write(&self, pages: &[LayoutPage], metadata: &Metadata) -> Result<Vec<u8>, ContractError> {
        if pages.is_empty() {
            return Err(ContractError::Encoding("document has no pages".to_string()));
        }

        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        let mut builder = PdfBuilder {
            objects: vec![Vec::new(), Vec::new(), Vec::new()],
            font_objects: Vec::new(),
            image_objects: Vec::new(),
            image_index_map: BTreeMap::new(),
        };

        self.register_fonts(&mut builder, pages);
        self.register_images(&mut builder, pages);

        let mut page_obj_ids: Vec<usize> = Vec::with_capacity(pages.len());
        for (page_idx, page) in pages.iter().enumerate() {
            if !(page.width > 0.0 && page.height > 0.0) {
                return Err(ContractError::Encoding(format!(
                    "page {} has invalid size {}x{}",
                    page_idx + 1,
                    page.width,
                    page.height
                )));
            }

            let content = self.build_content_stream_for_page(page, page_idx, &builder);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
            let content_obj_id = builder.push_stream("/Filter /FlateDecode", &compressed);

            let font_resources = self.build_font_resource_dict(&builder.font_objects);
            let xobject_resources = self.build_xobject_resource_dict(page_idx, &builder);
            let resources = if xobject_resources.is_empty() {
                format!("/Font << {} >>", font_resources)
            } else {
                format!(
                    "/Font << {} >> /XObject << {} >>",
                    font_resources, xobject_resources
                )
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page.width, page.height, content_obj_id, resources
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1] = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info_obj_id = self.write_info(&mut builder, metadata);

        Ok(self.serialize(&builder, info_obj_id))
    }

    fn write_info(&self, builder: &mut PdfBuilder, metadata: &Metadata) -> Option<usize> {
        let entries = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
            ("CreationDate", &metadata.creation_date),
        ];
        if entries.iter().all(|(_, v)| v.is_none()) {
            return None;
        }

        let mut info = String::from("<< ");
        for (key, value) in entries {
            if let Some(value) = value {
                let _ = write!(info, "/{} {} ", key, Self::encode_info_text(value));
            }
        }
        let _ = write!(info, "/Producer ({}) /Creator (loanform) >>", PRODUCER);
        Some(builder.push(info.into_bytes()))
    }

    /// Build the PDF content stream for a single page.
    fn build_content_stream_for_page(
        &self,
        page: &LayoutPage,
        page_idx: usize,
        builder: &PdfBuilder,
    ) -> String {
        let mut stream = String::new();
        let mut image_counter = 0usize;
        for element in &page.elements {
            self.write_element(&mut stream, element, builder, page_idx, &mut image_counter);
        }
        stream
    }

    /// Write a single layout element as PDF operators.
    fn write_element(
        &self,
        stream: &mut String,
        element: &LayoutElement,
        builder: &PdfBuilder,
        page_idx: usize,
        image_counter: &mut usize,
    ) {
        match &element.draw {
            DrawCommand::Text {
                text,
                font,
                font_size,
            } => {
                let font_idx = self.font_index(*font, &builder.font_objects);
                let _ = write!(
                    stream,
                    "BT\n0 0 0 rg\n/F{} {:.1} Tf\n{:.2} {:.2} Td\n({}) Tj\nET\n",
                    font_idx,
                    font_size,
                    element.x,
                    element.y,
                    Self::encode_text(text)
                );
            }

            DrawCommand::Image { .. } => {
                let position = *image_counter;
                *image_counter += 1;
                if let Some(&img_idx) = builder.image_index_map.get(&(page_idx, position)) {
                    let _ = write!(
                        stream,
                        "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                        element.width, element.height, element.x, element.y, img_idx
                    );
                }
            }
        }
    }

    /// Each font used anywhere in the document gets one Type1 object.
    fn register_fonts(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        let mut fonts: BTreeSet<StandardFont> = pages
            .iter()
            .flat_map(|p| &p.elements)
            .filter_map(|el| match &el.draw {
                DrawCommand::Text { font, .. } => Some(*font),
                _ => None,
            })
            .collect();

        // Always have at least Helvetica
        if fonts.is_empty() {
            fonts.insert(StandardFont::Helvetica);
        }

        for font in fonts {
            let font_dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.pdf_name()
            );
            let obj_id = builder.push(font_dict.into_bytes());
            builder.font_objects.push((font, obj_id));
        }
    }

    /// Create XObjects for every image, in drawing order, and record which
    /// page position refers to which /ImN.
    fn register_images(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        for (page_idx, page) in pages.iter().enumerate() {
            let images = page.elements.iter().filter_map(|el| match &el.draw {
                DrawCommand::Image { image_data } => Some(image_data),
                _ => None,
            });
            for (position, image) in images.enumerate() {
                let img_idx = builder.image_objects.len();
                let xobj_id = Self::write_image_xobject(builder, image);
                builder.image_objects.push(xobj_id);
                builder.image_index_map.insert((page_idx, position), img_idx);
            }
        }
    }

    /// Write a single image as one or two XObject PDF objects.
    /// Returns the main XObject ID.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space_str = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                };
                let dict = format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode",
                    image.width_px, image.height_px, color_space_str
                );
                builder.push_stream(&dict, data)
            }

            ImagePixelData::Decoded { rgb, alpha } => {
                // Signature ink sits on a transparent background: keep it as an SMask.
                let smask_ref = alpha
                    .as_ref()
                    .map(|alpha_data| {
                        let dict = format!(
                            "/Type /XObject /Subtype /Image /Width {} /Height {} \
                             /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode",
                            image.width_px, image.height_px
                        );
                        let id = builder.push_stream(&dict, &compress_to_vec_zlib(alpha_data, 6));
                        format!(" /SMask {} 0 R", id)
                    })
                    .unwrap_or_default();

                let dict = format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode{}",
                    image.width_px, image.height_px, smask_ref
                );
                builder.push_stream(&dict, &compress_to_vec_zlib(rgb, 6))
            }
        }
    }

    /// The /XObject resource entries for one page.
    fn build_xobject_resource_dict(&self, page_idx: usize, builder: &PdfBuilder) -> String {
        builder
            .image_index_map
            .iter()
            .filter(|((pidx, _), _)| *pidx == page_idx)
            .map(|(_, &img_idx)| format!("/Im{} {} 0 R", img_idx, builder.image_objects[img_idx]))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_font_resource_dict(&self, font_objects: &[(StandardFont, usize)]) -> String {
        font_objects
            .iter()
            .enumerate()
            .map(|(i, (_, obj_id))| format!("/F{} {} 0 R", i, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Resource index (/F0, /F1, ...) of a font, falling back to the first.
    fn font_index(&self, font: StandardFont, font_objects: &[(StandardFont, usize)]) -> usize {
        font_objects
            .iter()
            .position(|(f, _)| *f == font)
            .unwrap_or(0)
    }

    /// Encode a string as the body of a PDF literal string in WinAnsiEncoding.
    /// Unmappable characters become `?`; bytes outside printable ASCII use
    /// octal escapes.
    fn encode_text(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for ch in s.chars() {
            let b = Self::unicode_to_winansi(ch).unwrap_or(b'?');
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Encode a document-information value as a complete PDF string token.
    ///
    /// Info strings are read as PDFDocEncoding, not WinAnsi, so anything
    /// beyond printable ASCII is written as a UTF-16BE hex string with a BOM.
    fn encode_info_text(s: &str) -> String {
        if s.chars().all(|ch| matches!(ch, ' '..='~')) {
            let escaped = s
                .replace('\\', "\\\\")
                .replace('(', "\\(")
                .replace(')', "\\)");
            return format!("({})", escaped);
        }
        let mut out = String::from("<FEFF");
        for unit in s.encode_utf16() {
            let _ = write!(out, "{:04X}", unit);
        }
        out.push('>');
        out
    }

    /// Map a Unicode codepoint to a WinAnsiEncoding byte value.
    ///
    /// WinAnsiEncoding is based on Windows-1252. Codepoints in 0x20..=0x7E and
    /// 0xA0..=0xFF map directly, which covers Spanish accents and ñ. The
    /// 0x80..=0x9F range holds smart quotes, bullets and dashes.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        match cp {
            0x20AC => Some(0x80), // Euro sign
            0x201A => Some(0x82), // Single low-9 quotation mark
            0x0192 => Some(0x83), // Latin small letter f with hook
            0x201E => Some(0x84), // Double low-9 quotation mark
            0x2026 => Some(0x85), // Horizontal ellipsis
            0x2020 => Some(0x86), // Dagger
            0x2021 => Some(0x87), // Double dagger
            0x02C6 => Some(0x88), // Modifier letter circumflex accent
            0x2030 => Some(0x89), // Per mille sign
            0x0160 => Some(0x8A), // Latin capital letter S with caron
            0x2039 => Some(0x8B), // Single left-pointing angle quotation
            0x0152 => Some(0x8C), // Latin capital ligature OE
            0x017D => Some(0x8E), // Latin capital letter Z with caron
            0x2018 => Some(0x91), // Left single quotation mark
            0x2019 => Some(0x92), // Right single quotation mark
            0x201C => Some(0x93), // Left double quotation mark
            0x201D => Some(0x94), // Right double quotation mark
            0x2022 => Some(0x95), // Bullet
            0x2013 => Some(0x96), // En dash
            0x2014 => Some(0x97), // Em dash
            0x02DC => Some(0x98), // Small tilde
            0x2122 => Some(0x99), // Trade mark sign
            0x0161 => Some(0x9A), // Latin small letter s with caron
            0x203A => Some(0x9B), // Single right-pointing angle quotation
            0x0153 => Some(0x9C), // Latin small ligature oe
            0x017E => Some(0x9E), // Latin small letter z with caron
            0x0178 => Some(0x9F), // Latin capital letter Y with diaeresis
            _ => None,
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: Option<usize>) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, data) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(output, "trailer\n<< /Size {} /Root 1 0 R", builder.objects.len());
        if let Some(info_id) = info_obj_id {
            let _ = write!(output, " /Info {} 0 R", info_id);
        }
        let _ = write!(output, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);

        output
    }
}

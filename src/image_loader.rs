//! # Signature and Logo Images
//!
//! Signature pads hand over a `data:image/png;base64,...` URI with ink drawn
//! on a transparent background. The logo is usually a file path. Both are
//! resolved to bytes here, sniffed with `image::guess_format`, and turned into
//! something the PDF writer can embed.
//!
//! JPEG bytes are embedded as they are; only the header is read for size and
//! colour. PNG is decoded and split into RGB plus an alpha plane, which the
//! writer emits as an SMask so the pad background stays transparent.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use image::codecs::jpeg::JpegDecoder;
use image::{ColorType, ImageDecoder, ImageFormat};

/// An image ready for PDF embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImagePixelData {
    /// Untouched JPEG bytes for a DCTDecode stream.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// Decoded PNG pixels.
    Decoded {
        /// width * height * 3 bytes
        rgb: Vec<u8>,
        /// width * height bytes. None when every pixel is opaque.
        alpha: Option<Vec<u8>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

impl LoadedImage {
    /// Whether a pad export carries no ink at all: every pixel fully
    /// transparent. An opaque or JPEG image is never blank.
    pub fn is_blank(&self) -> bool {
        match &self.pixel_data {
            ImagePixelData::Decoded {
                alpha: Some(alpha), ..
            } => alpha.iter().all(|&a| a == 0),
            _ => false,
        }
    }
}

/// Where the bytes of an image come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource<'a> {
    /// Base64 payload of a `data:image/...;base64,` URI.
    DataUri(&'a str),
    /// A file path written as `/...`, `./...` or `../...`.
    Path(&'a Path),
    /// Bare base64. It may contain `/`, so only the prefixes above mark a path.
    Base64(&'a str),
}

impl<'a> ImageSource<'a> {
    pub fn parse(src: &'a str) -> Result<Self, String> {
        let src = src.trim();
        if let Some(rest) = src.strip_prefix("data:") {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| "Invalid data URI: no payload after the header".to_string())?;
            if !header.starts_with("image/") {
                return Err(format!("Data URI is not an image: '{}'", header));
            }
            if !header.ends_with(";base64") {
                return Err(format!("Data URI is not base64-encoded: '{}'", header));
            }
            return Ok(ImageSource::DataUri(payload));
        }
        if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
            return Ok(ImageSource::Path(Path::new(src)));
        }
        Ok(ImageSource::Base64(src))
    }

    pub fn read(&self) -> Result<Vec<u8>, String> {
        match self {
            ImageSource::DataUri(payload) | ImageSource::Base64(payload) => {
                base64::engine::general_purpose::STANDARD
                    .decode(payload.trim())
                    .map_err(|e| format!("Base64 decode error: {}", e))
            }
            ImageSource::Path(path) => std::fs::read(path)
                .map_err(|e| format!("Failed to read image file '{}': {}", path.display(), e)),
        }
    }
}

/// Resolve a source string to raw image bytes.
pub fn read_source_bytes(src: &str) -> Result<Vec<u8>, String> {
    ImageSource::parse(src)?.read()
}

/// Decode PNG or JPEG bytes for embedding.
pub fn decode_image_bytes(data: &[u8]) -> Result<LoadedImage, String> {
    match image::guess_format(data) {
        Ok(ImageFormat::Png) => load_png(data),
        Ok(ImageFormat::Jpeg) => load_jpeg(data),
        Ok(other) => Err(format!("Unsupported image format {:?} (expected PNG or JPEG)", other)),
        Err(_) => Err("Unrecognized image data (expected PNG or JPEG)".to_string()),
    }
}

fn load_jpeg(data: &[u8]) -> Result<LoadedImage, String> {
    let decoder =
        JpegDecoder::new(Cursor::new(data)).map_err(|e| format!("Invalid JPEG header: {}", e))?;
    let (width_px, height_px) = decoder.dimensions();
    let color_space = match decoder.color_type() {
        ColorType::L8 | ColorType::L16 => JpegColorSpace::DeviceGray,
        _ => JpegColorSpace::DeviceRGB,
    };

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Jpeg {
            data: data.to_vec(),
            color_space,
        },
        width_px,
        height_px,
    })
}

fn load_png(data: &[u8]) -> Result<LoadedImage, String> {
    let rgba = image::load_from_memory_with_format(data, ImageFormat::Png)
        .map_err(|e| format!("Failed to decode PNG: {}", e))?
        .into_rgba8();
    let (width_px, height_px) = rgba.dimensions();
    let raw = rgba.into_raw();

    let rgb: Vec<u8> = raw
        .chunks_exact(4)
        .flat_map(|px| px[..3].iter().copied())
        .collect();
    let alpha: Vec<u8> = raw.chunks_exact(4).map(|px| px[3]).collect();
    let translucent = alpha.iter().any(|&a| a != u8::MAX);

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: translucent.then_some(alpha),
        },
        width_px,
        height_px,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), width, height, ColorType::Rgba8)
            .unwrap();
        buf
    }

    fn jpeg(img: image::DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .unwrap();
        buf
    }

    #[test]
    fn test_source_kinds() {
        assert_eq!(
            ImageSource::parse("data:image/png;base64,AAAA").unwrap(),
            ImageSource::DataUri("AAAA")
        );
        assert_eq!(
            ImageSource::parse(" ./logo.png ").unwrap(),
            ImageSource::Path(Path::new("./logo.png"))
        );
        // Base64 alphabet includes '/', but not as a leading path prefix here.
        assert_eq!(
            ImageSource::parse("iVBO/rw==").unwrap(),
            ImageSource::Base64("iVBO/rw==")
        );
    }

    #[test]
    fn test_malformed_data_uris() {
        assert!(read_source_bytes("data:image/png;base64").is_err());
        let err = ImageSource::parse("data:text/plain;base64,AAAA").unwrap_err();
        assert!(err.contains("not an image"));
        let err = ImageSource::parse("data:image/svg+xml,<svg/>").unwrap_err();
        assert!(err.contains("not base64"));
    }

    #[test]
    fn test_unrecognized_bytes() {
        assert!(decode_image_bytes(&[]).is_err());
        assert!(decode_image_bytes(&[0x00, 0x01]).is_err());
        assert!(decode_image_bytes(b"GIF89a\x01\x00\x01\x00").is_err());
    }

    #[test]
    fn test_opaque_png_has_no_alpha() {
        let loaded = decode_image_bytes(&png(1, 1, [255, 0, 0, 255])).unwrap();
        assert_eq!((loaded.width_px, loaded.height_px), (1, 1));
        assert!(!loaded.is_blank());
        match &loaded.pixel_data {
            ImagePixelData::Decoded { rgb, alpha } => {
                assert_eq!(rgb, &[255, 0, 0]);
                assert!(alpha.is_none());
            }
            _ => panic!("PNG should decode to Decoded variant"),
        }
    }

    #[test]
    fn test_inked_pad_keeps_transparency() {
        let mut img = image::RgbaImage::new(3, 1);
        img.put_pixel(1, 0, image::Rgba([0, 0, 128, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 3, 1, ColorType::Rgba8).unwrap();

        let loaded = decode_image_bytes(&buf).unwrap();
        assert!(!loaded.is_blank());
        match &loaded.pixel_data {
            ImagePixelData::Decoded { alpha, .. } => {
                assert_eq!(alpha.as_deref(), Some(&[0u8, 255, 0][..]))
            }
            _ => panic!("PNG should decode to Decoded variant"),
        }
    }

    #[test]
    fn test_untouched_pad_is_blank() {
        let loaded = decode_image_bytes(&png(4, 2, [0, 0, 0, 0])).unwrap();
        assert!(loaded.is_blank());
    }

    #[test]
    fn test_jpeg_passes_through() {
        let rgb = image::RgbImage::from_pixel(2, 3, image::Rgb([0, 128, 255]));
        let buf = jpeg(image::DynamicImage::ImageRgb8(rgb));

        let loaded = decode_image_bytes(&buf).unwrap();
        assert_eq!((loaded.width_px, loaded.height_px), (2, 3));
        assert!(!loaded.is_blank());
        match &loaded.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                assert_eq!(data, &buf);
                assert_eq!(*color_space, JpegColorSpace::DeviceRGB);
            }
            _ => panic!("JPEG should stay as Jpeg variant"),
        }
    }

    #[test]
    fn test_grayscale_jpeg() {
        let gray = image::GrayImage::from_pixel(2, 2, image::Luma([90]));
        let loaded = decode_image_bytes(&jpeg(image::DynamicImage::ImageLuma8(gray))).unwrap();
        match &loaded.pixel_data {
            ImagePixelData::Jpeg { color_space, .. } => {
                assert_eq!(*color_space, JpegColorSpace::DeviceGray)
            }
            _ => panic!("JPEG should stay as Jpeg variant"),
        }
    }

    #[test]
    fn test_data_uri_and_raw_base64_resolve_to_same_bytes() {
        let png = png(1, 1, [0, 255, 0, 255]);
        let b64 = base64::engine::general_purpose::STANDARD.encode(&png);

        let from_uri = read_source_bytes(&format!("data:image/png;base64,{}", b64)).unwrap();
        let from_raw = read_source_bytes(&b64).unwrap();
        assert_eq!(from_uri, png);
        assert_eq!(from_raw, png);
    }

    #[test]
    fn test_missing_file_path_is_an_error() {
        let err = read_source_bytes("./definitely/not/here.png").unwrap_err();
        assert!(err.contains("Failed to read image file"));
    }
}

//! # Fonts
//!
//! Contracts use two of the 14 standard PDF fonts, which every viewer ships
//! with, so nothing is embedded. Body text is Helvetica; clause labels are
//! Helvetica-Bold.

/// A standard Type1 font referenced by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }
}

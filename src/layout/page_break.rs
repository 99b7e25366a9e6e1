//! # Page Break Decisions
//!
//! Whether the next item goes on the current page or starts a new one.
//! Contract items (a text line, a signature) are never split, so the only
//! question is whether the item fits above the bottom margin.

use serde::{Deserialize, Serialize};

/// What happens when content would cross the bottom margin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OverflowPolicy {
    /// Append a fresh page and continue at its top margin.
    #[default]
    NewPage,
    /// Keep drawing below the margin on the same page. Content past the
    /// page edge is clipped by viewers.
    Overlap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    /// The item fits on the current page.
    Place,
    /// Move the item to the next page.
    MoveToNextPage,
}

/// Decide where an item whose lowest point would land at `lowest_y` goes.
///
/// `at_page_top` short-circuits to `Place`: an item too tall for an empty
/// page is drawn anyway instead of producing an endless run of pages.
pub fn decide_break(
    policy: OverflowPolicy,
    lowest_y: f64,
    bottom_margin: f64,
    at_page_top: bool,
) -> BreakDecision {
    match policy {
        OverflowPolicy::Overlap => BreakDecision::Place,
        OverflowPolicy::NewPage if at_page_top || lowest_y >= bottom_margin => BreakDecision::Place,
        OverflowPolicy::NewPage => BreakDecision::MoveToNextPage,
    }
}

//! # Catalog Rules
//!
//! Pure naming rules shared by the Square mapper and the bulk importer.

use crate::types::ProductType;

/// Square's name for the variation it creates on a single-variation item.
pub const DEFAULT_VARIATION_NAME: &str = "Regular";

/// Classifies a product by keywords in its name.
///
/// Rules are checked in order, case-insensitively, and the first hit wins:
///
/// | contains                              | type      |
/// |---------------------------------------|-----------|
/// | `top`                                 | Top       |
/// | `bottom`                              | Bottom    |
/// | `one-piece`, `one piece`, `swimsuit`  | One-Piece |
/// | `cover`, `sarong`, `wrap`             | Cover-up  |
///
/// Anything else is `Other`. Substring matching is intentionally loose:
/// "Stop Sign Tee" classifies as Top.
pub fn classify_product_type(name: &str) -> ProductType {
    let name = name.to_lowercase();

    if name.contains("top") {
        ProductType::Top
    } else if name.contains("bottom") {
        ProductType::Bottom
    } else if name.contains("one-piece") || name.contains("one piece") || name.contains("swimsuit")
    {
        ProductType::OnePiece
    } else if name.contains("cover") || name.contains("sarong") || name.contains("wrap") {
        ProductType::CoverUp
    } else {
        ProductType::Other
    }
}

/// The size label a variation name stands for.
///
/// Returns `None` for size-less variations: an empty name or Square's default
/// `"Regular"`.
pub fn size_label_for_variation(name: Option<&str>) -> Option<String> {
    let name = name.map(str::trim).unwrap_or_default();
    if name.is_empty() || name.eq_ignore_ascii_case(DEFAULT_VARIATION_NAME) {
        None
    } else {
        Some(name.to_string())
    }
}

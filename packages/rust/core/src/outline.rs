//! Outline post-processing: salvage a JSON array from model output and drop
//! the item kinds a run did not ask for.

use serde_json::Value;
use tracing::{debug, warn};

use blogsmith_shared::OutlineKind;

/// Recover a JSON array from free-form text.
///
/// Tries the whole text first, then the slice from the first `[` to the last
/// `]`. Returns the items and whether recovery succeeded; on failure the
/// list is empty.
pub fn recover_json_array(text: &str) -> (Vec<Value>, bool) {
    if let Ok(items) = serde_json::from_str::<Vec<Value>>(text.trim()) {
        return (items, true);
    }

    let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) else {
        return (Vec::new(), false);
    };
    if end <= start {
        return (Vec::new(), false);
    }

    match serde_json::from_str::<Vec<Value>>(&text[start..=end]) {
        Ok(items) => (items, true),
        Err(_) => (Vec::new(), false),
    }
}

/// Drop items carrying a `faq` key unless `faq`, and items carrying a
/// `product_title` key unless `has_product`.
///
/// The two checks are independent, so an item with both keys must pass
/// both. Sections and unrecognized shapes are always kept.
pub fn filter_outline(items: Vec<Value>, faq: bool, has_product: bool) -> Vec<Value> {
    items
        .into_iter()
        .filter(|item| {
            (faq || !OutlineKind::Faq.marks(item))
                && (has_product || !OutlineKind::Product.marks(item))
        })
        .collect()
}

/// The outline text handed to the writer.
///
/// A recovered, non-empty array is filtered and re-serialized; anything
/// else passes through as the raw model text.
pub fn prepare_outline(raw: &str, faq: bool, has_product: bool) -> String {
    let (items, recovered) = recover_json_array(raw);
    if !recovered || items.is_empty() {
        debug!(recovered, "outline not usable as JSON, passing raw text");
        return raw.to_string();
    }

    let before = items.len();
    let kept = filter_outline(items, faq, has_product);
    debug!(before, after = kept.len(), "outline filtered");

    match serde_json::to_string(&kept) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "outline re-serialization failed, passing raw text");
            raw.to_string()
        }
    }
}

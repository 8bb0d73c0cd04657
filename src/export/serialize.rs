use crate::document::model::AnimationDocument;
use crate::foundation::error::FlipbookResult;

/// Canonical compact form: no insignificant whitespace, fields in schema order.
pub fn serialize(doc: &AnimationDocument) -> FlipbookResult<String> {
    Ok(serde_json::to_string(doc)?)
}

/// Indented form, for inspection and for measuring how much [`serialize`] saves.
pub fn serialize_pretty(doc: &AnimationDocument) -> FlipbookResult<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

pub fn parse(text: &str) -> FlipbookResult<AnimationDocument> {
    Ok(serde_json::from_str(text)?)
}

/// Size saved by `compact` relative to `original`, in percent. An empty original yields 0.
pub fn compression_ratio(original: &str, compact: &str) -> f64 {
    if original.is_empty() {
        return 0.0;
    }
    (1.0 - compact.len() as f64 / original.len() as f64) * 100.0
}

/// `animation_<unix_ms>.json`.
pub fn suggested_filename(unix_ms: u128) -> String {
    format!("animation_{unix_ms}.json")
}

/// [`suggested_filename`] for the current wall-clock time.
pub fn timestamped_filename() -> String {
    let ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    suggested_filename(ms)
}

#[cfg(test)]
#[path = "../../tests/unit/export/serialize.rs"]
mod tests;

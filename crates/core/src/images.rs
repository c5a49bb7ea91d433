//! Image list parsing and URL normalisation.
//!
//! Product and variant images reach the API in several shapes: a JSON
//! array, a string holding a JSON-encoded array (how older rows were
//! written), or a single URL. Entries may be absolute URLs, upload paths, or
//! bare filenames returned by the upload endpoint. Everything is normalised
//! to a deduplicated list of absolute URLs before it is stored.

use serde_json::Value;

use crate::error::CoreError;

/// Upper bound on images attached to one product or variant.
pub const MAX_IMAGES_PER_ITEM: usize = 10;

/// URL path under which uploaded files are served.
pub const UPLOADS_PATH: &str = "/uploads";

/// Parse an image list from any accepted JSON shape into raw strings.
///
/// - `null`, `""`, `"[]"` → empty list
/// - `["a.jpg", "b.jpg"]` → both entries
/// - `"[\"a.jpg\"]"` → the decoded array
/// - `"a.jpg"` → single entry
pub fn parse_image_list(value: &Value) -> Result<Vec<String>, CoreError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(CoreError::Validation(format!(
                    "images: expected string entries, found {}",
                    json_kind(other)
                ))),
            })
            .collect(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(Vec::new());
            }
            if trimmed.starts_with('[') {
                let decoded: Value = serde_json::from_str(trimmed).map_err(|e| {
                    CoreError::Validation(format!("images: malformed JSON array ({e})"))
                })?;
                return match decoded {
                    Value::Array(_) => parse_image_list(&decoded),
                    _ => Err(CoreError::Validation(
                        "images: encoded value is not an array".into(),
                    )),
                };
            }
            Ok(vec![trimmed.to_string()])
        }
        other => Err(CoreError::Validation(format!(
            "images: expected an array or string, found {}",
            json_kind(other)
        ))),
    }
}

/// Normalise one image reference against the public base URL.
///
/// Returns `None` for blank input.
pub fn normalize_image_url(raw: &str, public_base: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let base = public_base.trim_end_matches('/');

    let url = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else if let Some(rest) = raw.strip_prefix("//") {
        format!("https://{rest}")
    } else if raw.starts_with(UPLOADS_PATH) {
        format!("{base}{raw}")
    } else if let Some(rest) = raw.strip_prefix("uploads/") {
        format!("{base}{UPLOADS_PATH}/{rest}")
    } else {
        format!("{base}{UPLOADS_PATH}/{}", raw.trim_start_matches('/'))
    };
    Some(url)
}

/// Parse, normalise, deduplicate, and bound an image list.
pub fn normalize_images(value: &Value, public_base: &str) -> Result<Vec<String>, CoreError> {
    let mut out: Vec<String> = Vec::new();
    for raw in parse_image_list(value)? {
        if let Some(url) = normalize_image_url(&raw, public_base) {
            if !out.contains(&url) {
                out.push(url);
            }
        }
    }
    if out.len() > MAX_IMAGES_PER_ITEM {
        return Err(CoreError::Validation(format!(
            "images: at most {MAX_IMAGES_PER_ITEM} images are allowed"
        )));
    }
    Ok(out)
}

/// Read back a stored image column, tolerating legacy string-encoded rows.
///
/// Never fails: unreadable values yield an empty list.
pub fn stored_images(value: &Value) -> Vec<String> {
    parse_image_list(value).unwrap_or_default()
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

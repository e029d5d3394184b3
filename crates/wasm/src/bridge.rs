//! Moving data across the JS boundary as JSON, the same way render output
//! leaves the core as JSON strings.

use js_sys::JSON;
use serde_json::Value;
use viewport_badge_core::ContextId;
use wasm_bindgen::{JsCast, JsValue};

pub fn to_js(value: &Value) -> Result<JsValue, JsValue> {
    JSON::parse(&value.to_string())
}

/// `None` for `undefined` or anything JSON cannot represent.
pub fn from_js(value: &JsValue) -> Option<Value> {
    if value.is_undefined() {
        return None;
    }
    let text = JSON::stringify(value).ok()?.as_string()?;
    serde_json::from_str(&text).ok()
}

/// Best-effort human-readable form of a thrown JS value.
pub fn describe(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    format!("{value:?}")
}

/// Pull one record out of a `storage.get` result (`{ [key]: record }`).
/// A missing or `null` record counts as absent.
pub fn extract_record(items: Option<Value>, key: &str) -> Option<Value> {
    let mut items = items?;
    let record = items.get_mut(key)?.take();
    (!record.is_null()).then_some(record)
}

/// Ids of the tabs in a `tabs.query` result. Tabs without an id (devtools
/// windows, for instance) are skipped.
pub fn tab_ids(tabs: &Value) -> Vec<ContextId> {
    tabs.as_array()
        .map(|tabs| {
            tabs.iter()
                .filter_map(|tab| tab.get("id").and_then(Value::as_i64))
                .map(ContextId)
                .collect()
        })
        .unwrap_or_default()
}

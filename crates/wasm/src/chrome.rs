//! Extension APIs: `chrome.storage.sync` as the settings store,
//! `chrome.tabs` for notifying open pages, `chrome.runtime.onMessage` for
//! receiving those notifications.

use js_sys::{Function, Object, Promise};
use serde_json::{Map, Value};
use viewport_badge_core::{ContextId, DeliveryError, Peers, SettingsStore, StoreError};
use viewport_badge_protocol::{Ack, Message};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::bridge::{describe, extract_record, from_js, tab_ids, to_js};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "sync"], js_name = get)]
    fn storage_sync_get(keys: &str) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "sync"], js_name = set)]
    fn storage_sync_set(items: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = query)]
    fn tabs_query(query_info: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = sendMessage)]
    fn tabs_send_message(tab_id: i32, message: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime", "onMessage"], js_name = addListener)]
    pub fn add_message_listener(listener: &Function) -> Result<(), JsValue>;
}

/// `chrome.storage.sync`.
pub struct ChromeStore;

impl SettingsStore for ChromeStore {
    async fn read(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let promise = storage_sync_get(key).map_err(|e| StoreError::Unavailable(describe(&e)))?;
        let items = JsFuture::from(promise)
            .await
            .map_err(|e| StoreError::Read(describe(&e)))?;
        Ok(extract_record(from_js(&items), key))
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut items = Map::new();
        items.insert(key.to_string(), value);
        let items = to_js(&Value::Object(items)).map_err(|e| StoreError::Write(describe(&e)))?;
        let promise =
            storage_sync_set(&items).map_err(|e| StoreError::Unavailable(describe(&e)))?;
        JsFuture::from(promise)
            .await
            .map_err(|e| StoreError::Write(describe(&e)))?;
        Ok(())
    }
}

/// Every open tab, addressed through `chrome.tabs.sendMessage`.
pub struct ChromeTabs;

impl Peers for ChromeTabs {
    async fn contexts(&self) -> Result<Vec<ContextId>, DeliveryError> {
        let promise = tabs_query(&Object::new())
            .map_err(|e| DeliveryError::Transport(describe(&e)))?;
        let tabs = JsFuture::from(promise)
            .await
            .map_err(|e| DeliveryError::Transport(describe(&e)))?;
        Ok(from_js(&tabs).map(|tabs| tab_ids(&tabs)).unwrap_or_default())
    }

    async fn send(&self, to: ContextId, message: &Message) -> Result<Ack, DeliveryError> {
        let tab_id = i32::try_from(to.0).map_err(|_| DeliveryError::Unreachable(to))?;
        let payload = serde_json::to_value(message)
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        let payload = to_js(&payload).map_err(|e| DeliveryError::Transport(describe(&e)))?;
        // Tabs without a content script reject with "Receiving end does not exist".
        let promise =
            tabs_send_message(tab_id, &payload).map_err(|_| DeliveryError::Unreachable(to))?;
        let response = JsFuture::from(promise)
            .await
            .map_err(|_| DeliveryError::Unreachable(to))?;
        from_js(&response)
            .and_then(|v| serde_json::from_value::<Ack>(v).ok())
            .ok_or(DeliveryError::Rejected(to))
    }
}

mod bridge;
mod chrome;
mod content;
mod dom;
mod logging;
mod popup;
mod timers;

use viewport_badge_core::{AgentConfig, ConfigError, EditorConfig};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Window};

/// Start the dimensions overlay in the current page. `config_json` may be
/// omitted; an unparsable config falls back to defaults with a warning.
#[wasm_bindgen]
pub fn start_overlay(config_json: Option<String>) -> Result<(), JsError> {
    console_error_panic_hook::set_once();
    let (config, problem) = parse_config(config_json.as_deref(), AgentConfig::from_json);
    logging::init(config.debug_logging);
    if let Some(e) = problem {
        tracing::warn!(error = %e, "invalid overlay config, using defaults");
    }

    let (window, document) = page()?;
    content::start(window, document, config).map_err(|e| JsError::new(&bridge::describe(&e)))
}

/// Wire up the settings panel form.
#[wasm_bindgen]
pub fn start_settings_panel(config_json: Option<String>) -> Result<(), JsError> {
    console_error_panic_hook::set_once();
    let (config, problem) = parse_config(config_json.as_deref(), EditorConfig::from_json);
    logging::init(config.debug_logging);
    if let Some(e) = problem {
        tracing::warn!(error = %e, "invalid settings panel config, using defaults");
    }

    let (window, document) = page()?;
    popup::start(window, document, config).map_err(|e| JsError::new(&bridge::describe(&e)))
}

fn parse_config<C: Default>(
    json: Option<&str>,
    parse: fn(&str) -> Result<C, ConfigError>,
) -> (C, Option<ConfigError>) {
    match json.map(parse) {
        None => (C::default(), None),
        Some(Ok(config)) => (config, None),
        Some(Err(e)) => (C::default(), Some(e)),
    }
}

fn page() -> Result<(Window, Document), JsError> {
    let window = web_sys::window().ok_or_else(|| JsError::new("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsError::new("no document"))?;
    Ok((window, document))
}

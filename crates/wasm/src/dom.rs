use viewport_badge_core::style::LabelStyle;
use viewport_badge_core::{Presence, Scheduler, Surface, TimerId, TimerKind};
use viewport_badge_protocol::Viewport;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen::closure::Closure;
use web_sys::{Document, EventTarget, HtmlElement, Window};

use crate::bridge::describe;
use crate::timers::WindowTimers;

/// The page a content script runs in.
pub struct DomHost {
    window: Window,
    document: Document,
    label: Option<HtmlElement>,
    timers: WindowTimers,
}

impl DomHost {
    pub fn new(window: Window, document: Document, timers: WindowTimers) -> Self {
        Self {
            window,
            document,
            label: None,
            timers,
        }
    }

    fn create_label(&self, id: &str, style: &LabelStyle) -> Result<HtmlElement, JsValue> {
        let label: HtmlElement = self.document.create_element("div")?.dyn_into()?;
        label.set_id(id);
        let css = label.style();
        for (name, value) in style.declarations() {
            css.set_property(name, &value)?;
        }
        let body = self
            .document
            .body()
            .ok_or_else(|| JsValue::from_str("document has no body"))?;
        body.append_child(&label)?;
        Ok(label)
    }
}

impl Scheduler for DomHost {
    fn schedule(&mut self, kind: TimerKind, delay_ms: u32) -> TimerId {
        self.timers.schedule(kind, delay_ms)
    }

    fn cancel(&mut self, id: TimerId) {
        self.timers.cancel(id);
    }
}

impl Surface for DomHost {
    fn viewport(&self) -> Viewport {
        let px = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Viewport::new(px(self.window.inner_width()), px(self.window.inner_height()))
    }

    fn mount_label(&mut self, id: &str, style: &LabelStyle) {
        // A previous instance of the script may have left its label behind.
        if let Some(stale) = self.document.get_element_by_id(id) {
            stale.remove();
        }
        match self.create_label(id, style) {
            Ok(label) => self.label = Some(label),
            Err(e) => tracing::warn!(error = %describe(&e), "failed to mount label"),
        }
    }

    fn unmount_label(&mut self) {
        if let Some(label) = self.label.take() {
            label.remove();
        }
    }

    fn set_text(&mut self, text: &str) {
        if let Some(label) = &self.label {
            label.set_text_content(Some(text));
        }
    }

    fn set_presence(&mut self, presence: Presence) {
        let Some(label) = &self.label else {
            return;
        };
        let css = label.style();
        let display = if presence.is_displayed() {
            css.remove_property("display").map(drop)
        } else {
            css.set_property("display", "none")
        };
        let result =
            display.and_then(|()| css.set_property("opacity", &presence.opacity().to_string()));
        if let Err(e) = result {
            tracing::warn!(?presence, error = %describe(&e), "failed to update label visibility");
        }
    }
}

/// Attach `handler` to `event` for the lifetime of the page.
pub fn listen(
    target: &EventTarget,
    event: &str,
    handler: impl FnMut() + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut()>::new(handler);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// Run `start` now, or once the document finishes parsing if it is still
/// loading.
pub fn when_ready(document: &Document, start: impl FnOnce() + 'static) -> Result<(), JsValue> {
    if document.ready_state() != "loading" {
        start();
        return Ok(());
    }
    let mut start = Some(start);
    listen(document, "DOMContentLoaded", move || {
        if let Some(start) = start.take() {
            start();
        }
    })
}

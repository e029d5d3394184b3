//! Settings panel side: binds the popup form to a `ConfigEditor`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use viewport_badge_core::{
    ConfigEditor, EditorConfig, FormValues, TimerId, load_settings, publish, toggle_enabled,
};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, HtmlElement, HtmlInputElement, HtmlSelectElement, Window};

use crate::bridge::describe;
use crate::chrome::{ChromeStore, ChromeTabs};
use crate::dom::{listen, when_ready};
use crate::timers::{TimerCallback, WindowTimers};

struct Inputs {
    enabled: HtmlInputElement,
    position: HtmlSelectElement,
    font_size: HtmlSelectElement,
    text_color: HtmlInputElement,
    bg_color: HtmlInputElement,
    bg_opacity: HtmlInputElement,
    always_show: HtmlInputElement,
    hide_after: HtmlInputElement,
    save: HtmlElement,
}

impl Inputs {
    fn find(document: &Document) -> Result<Self, JsValue> {
        Ok(Self {
            enabled: by_id(document, "enableDisplay")?,
            position: by_id(document, "position")?,
            font_size: by_id(document, "fontSize")?,
            text_color: by_id(document, "textColor")?,
            bg_color: by_id(document, "bgColor")?,
            bg_opacity: by_id(document, "bgOpacity")?,
            always_show: by_id(document, "alwaysShow")?,
            hide_after: by_id(document, "hideAfter")?,
            save: by_id(document, "saveSettings")?,
        })
    }

    fn fill(&self, form: &FormValues) {
        self.enabled.set_checked(form.enabled);
        self.position.set_value(&form.position);
        self.font_size.set_value(&form.font_size);
        // Color inputs hold lowercase values.
        self.text_color.set_value(&form.text_color.to_ascii_lowercase());
        self.bg_color.set_value(&form.bg_color.to_ascii_lowercase());
        self.bg_opacity.set_value(&form.bg_opacity);
        self.always_show.set_checked(form.always_show);
        self.hide_after.set_value(&form.hide_after);
        self.hide_after.set_disabled(form.hide_after_disabled());
    }

    fn read(&self) -> FormValues {
        FormValues {
            enabled: self.enabled.checked(),
            position: self.position.value(),
            font_size: self.font_size.value(),
            text_color: self.text_color.value(),
            bg_color: self.bg_color.value(),
            bg_opacity: self.bg_opacity.value(),
            always_show: self.always_show.checked(),
            hide_after: self.hide_after.value(),
        }
    }
}

fn by_id<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("settings panel is missing #{id}")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("#{id} is not the expected kind of element")))
}

struct Panel {
    editor: ConfigEditor,
    inputs: Inputs,
    timers: WindowTimers,
}

type SharedPanel = Rc<RefCell<Panel>>;

pub fn start(window: Window, document: Document, config: EditorConfig) -> Result<(), JsValue> {
    let ready = document.clone();
    when_ready(&ready, move || {
        spawn_local(async move {
            if let Err(e) = open(window, &document, config).await {
                tracing::error!(error = %describe(&e), "settings panel failed to start");
            }
        });
    })
}

async fn open(window: Window, document: &Document, config: EditorConfig) -> Result<(), JsValue> {
    let inputs = Inputs::find(document)?;
    let current = load_settings(&ChromeStore, &config.storage_key).await;

    let panel: SharedPanel = Rc::new_cyclic(|weak: &Weak<RefCell<Panel>>| {
        let weak = weak.clone();
        let on_fire: TimerCallback = Rc::new(move |id| revert_status(&weak, id));
        RefCell::new(Panel {
            editor: ConfigEditor::new(config, &current),
            inputs,
            timers: WindowTimers::new(window, on_fire),
        })
    });

    {
        let p = panel.borrow();
        p.inputs.fill(p.editor.form());
    }

    let owner = Rc::clone(&panel);
    let always_show = panel.borrow().inputs.always_show.clone();
    listen(&always_show, "change", move || {
        let mut p = owner.borrow_mut();
        let checked = p.inputs.always_show.checked();
        let disabled = p.editor.set_always_show(checked);
        p.inputs.hide_after.set_disabled(disabled);
    })?;

    let owner = Rc::clone(&panel);
    let enabled = panel.borrow().inputs.enabled.clone();
    listen(&enabled, "change", move || {
        let (key, enabled) = {
            let mut p = owner.borrow_mut();
            let enabled = p.inputs.enabled.checked();
            p.editor.set_enabled(enabled);
            (p.editor.config().storage_key.clone(), enabled)
        };
        let panel = Rc::clone(&owner);
        spawn_local(async move {
            if let Err(e) = toggle_enabled(&ChromeStore, &ChromeTabs, &key, enabled).await {
                tracing::error!(error = %e, "failed to toggle overlay");
                // Nothing was stored; put the checkbox back.
                let mut p = panel.borrow_mut();
                p.editor.set_enabled(!enabled);
                p.inputs.enabled.set_checked(!enabled);
            }
        });
    })?;

    let owner = Rc::clone(&panel);
    let save = panel.borrow().inputs.save.clone();
    listen(&save, "click", move || {
        let (key, settings) = {
            let mut p = owner.borrow_mut();
            let form = p.inputs.read();
            p.editor.update_form(form);
            (p.editor.config().storage_key.clone(), p.editor.submit())
        };
        let panel = Rc::clone(&owner);
        spawn_local(async move {
            let outcome = publish(&ChromeStore, &ChromeTabs, &key, &settings).await;
            let mut p = panel.borrow_mut();
            let Panel {
                editor,
                inputs,
                timers,
            } = &mut *p;
            let status = editor.finish_save(&outcome, timers);
            inputs.save.set_text_content(Some(status.label()));
        });
    })?;

    Ok(())
}

fn revert_status(weak: &Weak<RefCell<Panel>>, id: TimerId) {
    let Some(panel) = weak.upgrade() else {
        return;
    };
    let mut p = panel.borrow_mut();
    if let Some(status) = p.editor.on_timer(id) {
        p.inputs.save.set_text_content(Some(status.label()));
    }
}

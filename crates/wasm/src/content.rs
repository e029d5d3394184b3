//! Content-script side: one overlay agent per page.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::Function;
use viewport_badge_core::{
    AgentConfig, OverlayAgent, TimerFired, TimerId, Trigger, load_settings, poll_settings,
};
use viewport_badge_protocol::Message;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, VisibilityState, Window};

use crate::bridge::{describe, from_js, to_js};
use crate::chrome::{ChromeStore, add_message_listener};
use crate::dom::{DomHost, listen, when_ready};
use crate::timers::{TimerCallback, WindowTimers};

type SharedAgent = Rc<RefCell<OverlayAgent<DomHost>>>;
type WeakAgent = Weak<RefCell<OverlayAgent<DomHost>>>;

pub fn start(window: Window, document: Document, config: AgentConfig) -> Result<(), JsValue> {
    let push = config.strategy.push_enabled();
    let agent: SharedAgent = Rc::new_cyclic(|weak: &WeakAgent| {
        let weak = weak.clone();
        let on_fire: TimerCallback = Rc::new(move |id| fire_timer(&weak, id));
        let timers = WindowTimers::new(window.clone(), on_fire);
        let host = DomHost::new(window.clone(), document.clone(), timers);
        RefCell::new(OverlayAgent::new(config, host))
    });

    // Registered before the document is ready so early pushes are answered.
    if push {
        listen_for_messages(&agent)?;
    }

    let ready = document.clone();
    when_ready(&ready, move || {
        if let Err(e) = boot(&window, &document, agent) {
            tracing::error!(error = %describe(&e), "overlay failed to start");
        }
    })
}

fn boot(window: &Window, document: &Document, agent: SharedAgent) -> Result<(), JsValue> {
    // The resize listener lives as long as the page and owns the agent.
    let owner = Rc::clone(&agent);
    listen(window, "resize", move || owner.borrow_mut().on_resize())?;

    if agent.borrow().config().strategy.poll_enabled() {
        let weak = Rc::downgrade(&agent);
        listen(window, "focus", move || attention(&weak))?;

        let weak = Rc::downgrade(&agent);
        let doc = document.clone();
        listen(document, "visibilitychange", move || {
            if doc.visibility_state() == VisibilityState::Visible {
                attention(&weak);
            }
        })?;
    }

    spawn_local(async move {
        let key = agent.borrow().config().storage_key.clone();
        let settings = load_settings(&ChromeStore, &key).await;
        agent.borrow_mut().initialize(settings);
    });
    Ok(())
}

fn fire_timer(weak: &WeakAgent, id: TimerId) {
    let Some(agent) = weak.upgrade() else {
        return;
    };
    let fired = agent.borrow_mut().on_timer(id);
    if fired == TimerFired::PollDue {
        spawn_local(refresh(agent, Trigger::Poll));
    }
}

fn attention(weak: &WeakAgent) {
    let Some(agent) = weak.upgrade() else {
        return;
    };
    let wants_poll = agent.borrow().wants_poll();
    if wants_poll {
        spawn_local(refresh(agent, Trigger::Attention));
    }
}

async fn refresh(agent: SharedAgent, trigger: Trigger) {
    let key = agent.borrow().config().storage_key.clone();
    if let Some(settings) = poll_settings(&ChromeStore, &key).await {
        agent.borrow_mut().reconcile(trigger, settings);
    }
}

fn listen_for_messages(agent: &SharedAgent) -> Result<(), JsValue> {
    let weak = Rc::downgrade(agent);
    let listener = Closure::<dyn FnMut(JsValue, JsValue, Function) -> bool>::new(
        move |message: JsValue, _sender: JsValue, send_response: Function| {
            // Anything that is not ours is left for other listeners.
            let Some(message) =
                from_js(&message).and_then(|v| serde_json::from_value::<Message>(v).ok())
            else {
                return false;
            };
            let Some(agent) = weak.upgrade() else {
                return false;
            };
            let ack = agent.borrow_mut().handle_message(message);
            let reply = serde_json::to_value(ack)
                .map_err(|e| JsValue::from_str(&e.to_string()))
                .and_then(|v| to_js(&v))
                .and_then(|reply| send_response.call1(&JsValue::NULL, &reply));
            if let Err(e) = reply {
                tracing::debug!(error = %describe(&e), "could not acknowledge settings message");
            }
            false
        },
    );
    add_message_listener(listener.as_ref().unchecked_ref())?;
    listener.forget();
    Ok(())
}

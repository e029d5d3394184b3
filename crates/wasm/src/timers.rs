use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use viewport_badge_core::{Scheduler, TimerId, TimerKind};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen_futures::spawn_local;
use web_sys::Window;

use crate::bridge::describe;

/// Called with the id of each timer that fires.
pub type TimerCallback = Rc<dyn Fn(TimerId)>;

/// Timers that have been handed to the browser and not fired yet, each with
/// its browser handle and whatever keeps its callback alive.
struct Armed<C> {
    entries: HashMap<TimerId, (i32, C)>,
}

impl<C> Armed<C> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    fn insert(&mut self, id: TimerId, handle: i32, callback: C) {
        self.entries.insert(id, (handle, callback));
    }

    fn take(&mut self, id: TimerId) -> Option<(i32, C)> {
        self.entries.remove(&id)
    }

    fn drain(&mut self) -> impl Iterator<Item = (i32, C)> + '_ {
        self.entries.drain().map(|(_, entry)| entry)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

type ArmedClosures = Armed<Closure<dyn FnMut()>>;

/// `setTimeout`-backed scheduler. Each callback lives exactly as long as its
/// timer: it is released when the timer fires, is cancelled, or the
/// scheduler is dropped.
pub struct WindowTimers {
    window: Window,
    next: u64,
    armed: Rc<RefCell<ArmedClosures>>,
    on_fire: TimerCallback,
}

impl WindowTimers {
    pub fn new(window: Window, on_fire: TimerCallback) -> Self {
        Self {
            window,
            next: 1,
            armed: Rc::new(RefCell::new(Armed::new())),
            on_fire,
        }
    }

    fn callback(&self, id: TimerId) -> Closure<dyn FnMut()> {
        let armed: Weak<RefCell<ArmedClosures>> = Rc::downgrade(&self.armed);
        let on_fire = Rc::clone(&self.on_fire);
        Closure::new(move || {
            let fired = armed.upgrade().and_then(|armed| armed.borrow_mut().take(id));
            on_fire(id);
            // This closure is still running; free it once the call returns.
            if let Some((_, closure)) = fired {
                spawn_local(async move { drop(closure) });
            }
        })
    }
}

impl Scheduler for WindowTimers {
    fn schedule(&mut self, kind: TimerKind, delay_ms: u32) -> TimerId {
        let id = TimerId(self.next);
        self.next += 1;

        let callback = self.callback(id);
        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        match self.window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            delay,
        ) {
            Ok(handle) => self.armed.borrow_mut().insert(id, handle, callback),
            Err(e) => tracing::warn!(?kind, error = %describe(&e), "failed to schedule timer"),
        }
        id
    }

    fn cancel(&mut self, id: TimerId) {
        let cancelled = self.armed.borrow_mut().take(id);
        if let Some((handle, _callback)) = cancelled {
            self.window.clear_timeout_with_handle(handle);
        }
    }
}

impl Drop for WindowTimers {
    fn drop(&mut self) {
        let pending: Vec<_> = self.armed.borrow_mut().drain().collect();
        tracing::debug!(count = pending.len(), "clearing pending timers");
        for (handle, _callback) in pending {
            self.window.clear_timeout_with_handle(handle);
        }
    }
}

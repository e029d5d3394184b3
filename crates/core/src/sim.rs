//! Headless host with a virtual clock.
//!
//! `SimHost` keeps the label as plain data and records every surface
//! mutation, so callers can assert both on the resulting state and on
//! whether anything was touched at all. Time only moves when asked to.

use std::collections::BTreeMap;

use viewport_badge_protocol::Viewport;

use crate::host::{Scheduler, Surface, TimerId, TimerKind};
use crate::style::LabelStyle;
use crate::visibility::Presence;

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Mount(LabelStyle),
    Unmount,
    SetText(String),
    SetPresence(Presence),
}

/// The label as it currently exists on the simulated page.
#[derive(Debug, Clone, PartialEq)]
pub struct SimLabel {
    pub id: String,
    pub style: LabelStyle,
    pub text: String,
    pub presence: Presence,
}

#[derive(Debug)]
struct PendingTimer {
    kind: TimerKind,
    due_ms: u64,
}

#[derive(Debug)]
pub struct SimHost {
    viewport: Viewport,
    now_ms: u64,
    next_timer: u64,
    timers: BTreeMap<TimerId, PendingTimer>,
    label: Option<SimLabel>,
    ops: Vec<SurfaceOp>,
    mounts: usize,
}

impl SimHost {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            now_ms: 0,
            next_timer: 1,
            timers: BTreeMap::new(),
            label: None,
            ops: Vec::new(),
            mounts: 0,
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn now(&self) -> u64 {
        self.now_ms
    }

    pub fn label(&self) -> Option<&SimLabel> {
        self.label.as_ref()
    }

    /// Number of labels created over the host's lifetime.
    pub fn mount_count(&self) -> usize {
        self.mounts
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    pub fn pending_timers(&self) -> impl Iterator<Item = (TimerId, TimerKind, u64)> + '_ {
        self.timers.iter().map(|(&id, t)| (id, t.kind, t.due_ms))
    }

    pub fn has_pending(&self, kind: TimerKind) -> bool {
        self.timers.values().any(|t| t.kind == kind)
    }

    /// Remove and return the earliest timer due at or before `until_ms`,
    /// moving the clock to its due time. Ties fire in scheduling order.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<TimerId> {
        let (&id, due_ms) = self
            .timers
            .iter()
            .filter(|(_, t)| t.due_ms <= until_ms)
            .min_by_key(|(id, t)| (t.due_ms, **id))
            .map(|(id, t)| (id, t.due_ms))?;
        self.timers.remove(&id);
        self.now_ms = self.now_ms.max(due_ms);
        Some(id)
    }

    /// Move the clock forward without firing anything. Timers that became
    /// due stay pending until popped.
    pub fn advance_to(&mut self, ms: u64) {
        self.now_ms = self.now_ms.max(ms);
    }

    fn label_mut(&mut self) -> Option<&mut SimLabel> {
        self.label.as_mut()
    }
}

impl Scheduler for SimHost {
    fn schedule(&mut self, kind: TimerKind, delay_ms: u32) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.timers.insert(
            id,
            PendingTimer {
                kind,
                due_ms: self.now_ms + u64::from(delay_ms),
            },
        );
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }
}

impl Surface for SimHost {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn mount_label(&mut self, id: &str, style: &LabelStyle) {
        self.ops.push(SurfaceOp::Mount(style.clone()));
        self.mounts += 1;
        self.label = Some(SimLabel {
            id: id.to_string(),
            style: style.clone(),
            text: String::new(),
            presence: Presence::Visible,
        });
    }

    fn unmount_label(&mut self) {
        self.ops.push(SurfaceOp::Unmount);
        self.label = None;
    }

    fn set_text(&mut self, text: &str) {
        self.ops.push(SurfaceOp::SetText(text.to_string()));
        if let Some(label) = self.label_mut() {
            label.text = text.to_string();
        }
    }

    fn set_presence(&mut self, presence: Presence) {
        self.ops.push(SurfaceOp::SetPresence(presence));
        if let Some(label) = self.label_mut() {
            label.presence = presence;
        }
    }
}

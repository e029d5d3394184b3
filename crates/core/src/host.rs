//! The seams between an overlay agent and the environment it runs in.

use viewport_badge_protocol::Viewport;

use crate::style::LabelStyle;
use crate::visibility::Presence;

/// Handle to a scheduled one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    AutoHide,
    Poll,
    StatusRevert,
}

/// One-shot timers. The host calls back into its owner with the returned id
/// when the delay elapses; cancelled timers never fire.
pub trait Scheduler {
    fn schedule(&mut self, kind: TimerKind, delay_ms: u32) -> TimerId;
    fn cancel(&mut self, id: TimerId);
}

/// Rendering primitives for the single dimension label.
pub trait Surface {
    fn viewport(&self) -> Viewport;

    /// Create a fresh label with `id` and `style`, replacing any element
    /// that already carries the id.
    fn mount_label(&mut self, id: &str, style: &LabelStyle);

    fn unmount_label(&mut self);

    fn set_text(&mut self, text: &str);

    fn set_presence(&mut self, presence: Presence);
}

/// Everything an [`OverlayAgent`](crate::agent::OverlayAgent) needs.
pub trait OverlayHost: Surface + Scheduler {}

impl<T: Surface + Scheduler> OverlayHost for T {}

use viewport_badge_protocol::{Ack, Message, Settings};

use crate::config::AgentConfig;
use crate::host::{OverlayHost, TimerId, TimerKind};
use crate::style::apply_style;
use crate::visibility::{self, Presence, VisibilityPlan};

/// What caused a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A notification pushed by the settings editor.
    Push,
    /// The periodic poll timer.
    Poll,
    /// The context became visible or focused again.
    Attention,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// Incoming settings equal the snapshot; nothing was touched.
    Unchanged,
    /// The label was rebuilt for the new settings.
    Applied,
    /// The agent has not been initialized yet.
    NotRunning,
}

/// Result of delivering a timer callback to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerFired {
    /// The auto-hide delay elapsed and the label faded out.
    Faded,
    /// Time to re-read the store; the next poll is already scheduled.
    PollDue,
    /// Cancelled, superseded, or no longer relevant.
    Ignored,
}

/// Owns the dimension label of one rendering context and keeps it in step
/// with the stored settings.
///
/// The agent never reads the store itself: hosts load settings (with
/// [`load_settings`](crate::store::load_settings)) and hand them to
/// [`initialize`](Self::initialize) or [`reconcile`](Self::reconcile).
pub struct OverlayAgent<H> {
    config: AgentConfig,
    host: H,
    settings: Settings,
    running: bool,
    /// Latest push received before `initialize`.
    pending: Option<Settings>,
    presence: Presence,
    hide_timer: Option<TimerId>,
    poll_timer: Option<TimerId>,
}

impl<H: OverlayHost> OverlayAgent<H> {
    pub fn new(config: AgentConfig, host: H) -> Self {
        Self {
            config,
            host,
            settings: Settings::default(),
            running: false,
            pending: None,
            presence: Presence::Hidden,
            hide_timer: None,
            poll_timer: None,
        }
    }

    /// Mount the label for `settings`, render, apply the visibility policy
    /// and start polling. A push that arrived earlier is applied on top.
    /// Calling it again on a running agent does nothing.
    pub fn initialize(&mut self, settings: Settings) {
        if self.running {
            tracing::debug!("overlay already initialized");
            return;
        }
        self.running = true;
        self.settings = settings;
        self.rebuild_label();
        if self.config.strategy.poll_enabled() {
            self.schedule_poll();
        }
        tracing::debug!(settings = ?self.settings, "overlay initialized");
        if let Some(pushed) = self.pending.take() {
            self.reconcile(Trigger::Push, pushed);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn presence(&self) -> Presence {
        self.presence
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Whether attention events should trigger a store read.
    pub fn wants_poll(&self) -> bool {
        self.running && self.config.strategy.poll_enabled()
    }

    /// Write the current viewport size into the label.
    pub fn render_label(&mut self) {
        let text = self.host.viewport().dimensions().to_string();
        self.host.set_text(&text);
    }

    /// Apply the visibility policy for the current settings, replacing any
    /// pending auto-hide.
    pub fn apply_visibility(&mut self) {
        self.cancel_hide();
        match visibility::plan(&self.settings) {
            VisibilityPlan::Hidden => self.set_presence(Presence::Hidden),
            VisibilityPlan::Pinned => self.set_presence(Presence::Visible),
            VisibilityPlan::ShowThenFade { after_ms } => {
                self.set_presence(Presence::Visible);
                self.hide_timer = Some(self.host.schedule(TimerKind::AutoHide, after_ms));
            }
        }
    }

    /// Re-render and, for an auto-hiding label, show it again and restart
    /// the hide delay.
    pub fn on_resize(&mut self) {
        if !self.running {
            return;
        }
        self.render_label();
        if visibility::resize_reveals(&self.settings) {
            self.apply_visibility();
        }
    }

    pub fn on_timer(&mut self, id: TimerId) -> TimerFired {
        if self.hide_timer == Some(id) {
            self.hide_timer = None;
            if visibility::resize_reveals(&self.settings) {
                self.set_presence(Presence::Faded);
                return TimerFired::Faded;
            }
            return TimerFired::Ignored;
        }
        if self.poll_timer == Some(id) {
            self.poll_timer = None;
            if self.running && self.config.strategy.poll_enabled() {
                self.schedule_poll();
                return TimerFired::PollDue;
            }
        }
        TimerFired::Ignored
    }

    /// Adopt `incoming` if and only if it differs from the current snapshot.
    ///
    /// Every trigger funnels through here. With unchanged settings no host
    /// call is made at all.
    pub fn reconcile(&mut self, trigger: Trigger, incoming: Settings) -> Reconciled {
        if !self.running {
            return Reconciled::NotRunning;
        }
        if incoming == self.settings {
            return Reconciled::Unchanged;
        }
        tracing::debug!(?trigger, settings = ?incoming, "applying changed settings");
        self.settings = incoming;
        self.rebuild_label();
        Reconciled::Applied
    }

    /// Handle a pushed message. Push-disabled agents decline. Before
    /// initialization the settings are held and applied by `initialize`.
    pub fn handle_message(&mut self, message: Message) -> Ack {
        if !self.config.strategy.push_enabled() {
            return Ack { success: false };
        }
        match message {
            Message::SettingsUpdated { settings } if !self.running => {
                tracing::debug!("holding settings pushed before initialization");
                self.pending = Some(settings);
            }
            Message::SettingsUpdated { settings } => {
                self.reconcile(Trigger::Push, settings);
            }
        }
        Ack::OK
    }

    /// Cancel timers and remove the label.
    pub fn shutdown(&mut self) {
        self.pending = None;
        self.cancel_hide();
        if let Some(id) = self.poll_timer.take() {
            self.host.cancel(id);
        }
        if self.running {
            self.host.unmount_label();
            self.running = false;
        }
    }

    /// Destroy and recreate the label so no style from a previous
    /// configuration survives.
    fn rebuild_label(&mut self) {
        self.cancel_hide();
        self.host.unmount_label();
        let style = apply_style(&self.settings);
        self.host.mount_label(&self.config.label_id, &style);
        self.render_label();
        self.apply_visibility();
    }

    fn schedule_poll(&mut self) {
        self.poll_timer = Some(
            self.host
                .schedule(TimerKind::Poll, self.config.poll_interval_ms),
        );
    }

    fn cancel_hide(&mut self) {
        if let Some(id) = self.hide_timer.take() {
            self.host.cancel(id);
        }
    }

    fn set_presence(&mut self, presence: Presence) {
        self.presence = presence;
        self.host.set_presence(presence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Strategy;
    use crate::sim::{SimHost, SurfaceOp};
    use viewport_badge_protocol::{Position, Viewport};

    fn agent_with(strategy: Strategy) -> OverlayAgent<SimHost> {
        let config = AgentConfig {
            strategy,
            ..AgentConfig::default()
        };
        OverlayAgent::new(config, SimHost::new(Viewport::new(1024.4, 768.6)))
    }

    fn fire_due(agent: &mut OverlayAgent<SimHost>, until_ms: u64) -> Vec<TimerFired> {
        let mut fired = Vec::new();
        while let Some(id) = agent.host_mut().pop_due(until_ms) {
            fired.push(agent.on_timer(id));
        }
        agent.host_mut().advance_to(until_ms);
        fired
    }

    #[test]
    fn initialize_renders_dimensions() {
        let mut agent = agent_with(Strategy::Push);
        agent.initialize(Settings::default());
        let label = agent.host().label().unwrap();
        assert_eq!(label.text, "1024px × 769px");
        assert_eq!(label.id, "viewport-dimensions-display");
        assert_eq!(label.style, apply_style(&Settings::default()));
        assert_eq!(label.presence, Presence::Visible);
    }

    #[test]
    fn second_initialize_is_ignored() {
        let mut agent = agent_with(Strategy::PushAndPoll);
        agent.initialize(Settings::default());
        agent.initialize(Settings {
            enabled: false,
            ..Settings::default()
        });
        assert_eq!(agent.host().mount_count(), 1);
        assert!(agent.settings().enabled);
    }

    #[test]
    fn disabled_label_is_hidden_without_timer() {
        let mut agent = agent_with(Strategy::Push);
        agent.initialize(Settings {
            enabled: false,
            always_show: true,
            ..Settings::default()
        });
        assert_eq!(agent.presence(), Presence::Hidden);
        assert!(!agent.host().has_pending(TimerKind::AutoHide));
    }

    #[test]
    fn always_show_never_fades() {
        let mut agent = agent_with(Strategy::Push);
        agent.initialize(Settings {
            always_show: true,
            hide_after: 1000,
            ..Settings::default()
        });
        assert!(fire_due(&mut agent, 10_000).is_empty());
        assert_eq!(agent.presence(), Presence::Visible);
        assert_eq!(agent.presence().opacity(), 1.0);
    }

    #[test]
    fn auto_hide_fades_but_keeps_label() {
        let mut agent = agent_with(Strategy::Push);
        agent.initialize(Settings {
            hide_after: 1000,
            ..Settings::default()
        });
        assert_eq!(agent.presence(), Presence::Visible);
        assert!(fire_due(&mut agent, 999).is_empty());
        assert_eq!(fire_due(&mut agent, 1001), vec![TimerFired::Faded]);
        let label = agent.host().label().unwrap();
        assert_eq!(label.presence, Presence::Faded);
        assert!(label.presence.is_displayed());
    }

    #[test]
    fn resize_reveals_and_restarts_delay() {
        let mut agent = agent_with(Strategy::Push);
        agent.initialize(Settings::default());
        fire_due(&mut agent, 1500);
        assert_eq!(agent.presence(), Presence::Faded);

        agent.host_mut().set_viewport(Viewport::new(640.0, 480.0));
        agent.on_resize();
        assert_eq!(agent.presence(), Presence::Visible);
        assert_eq!(agent.host().label().unwrap().text, "640px × 480px");
        assert_eq!(agent.host().mount_count(), 1);

        assert!(fire_due(&mut agent, 2499).is_empty());
        assert_eq!(fire_due(&mut agent, 2500), vec![TimerFired::Faded]);
    }

    #[test]
    fn resize_with_always_show_only_updates_text() {
        let mut agent = agent_with(Strategy::Push);
        agent.initialize(Settings {
            always_show: true,
            ..Settings::default()
        });
        agent.host_mut().clear_ops();
        agent.on_resize();
        assert_eq!(
            agent.host().ops(),
            &[SurfaceOp::SetText("1024px × 769px".into())]
        );
    }

    #[test]
    fn repeated_resizes_leave_one_hide_timer() {
        let mut agent = agent_with(Strategy::Push);
        agent.initialize(Settings::default());
        for _ in 0..5 {
            agent.on_resize();
        }
        let hide_timers = agent
            .host()
            .pending_timers()
            .filter(|(_, kind, _)| *kind == TimerKind::AutoHide)
            .count();
        assert_eq!(hide_timers, 1);
    }

    #[test]
    fn unchanged_settings_touch_nothing() {
        let mut agent = agent_with(Strategy::PushAndPoll);
        agent.initialize(Settings::default());
        agent.host_mut().clear_ops();
        for trigger in [Trigger::Poll, Trigger::Push, Trigger::Attention] {
            assert_eq!(agent.reconcile(trigger, Settings::default()), Reconciled::Unchanged);
        }
        assert!(agent.host().ops().is_empty());
        assert_eq!(agent.host().mount_count(), 1);
    }

    #[test]
    fn changed_settings_rebuild_label() {
        let mut agent = agent_with(Strategy::Push);
        agent.initialize(Settings::default());
        let next = Settings {
            position: Position::TopLeft,
            always_show: true,
            ..Settings::default()
        };
        assert_eq!(agent.reconcile(Trigger::Poll, next.clone()), Reconciled::Applied);
        assert_eq!(agent.host().mount_count(), 2);
        let label = agent.host().label().unwrap();
        assert_eq!(label.style, apply_style(&next));
        assert_eq!(label.text, "1024px × 769px");
        // The old auto-hide timer must not fade the pinned label.
        assert!(!agent.host().has_pending(TimerKind::AutoHide));
        assert!(fire_due(&mut agent, 5000).is_empty());
        assert_eq!(agent.presence(), Presence::Visible);
    }

    #[test]
    fn stale_hide_callback_is_ignored() {
        let mut agent = agent_with(Strategy::Push);
        agent.initialize(Settings::default());
        let (stale, _, _) = agent.host().pending_timers().next().unwrap();
        agent.on_resize();
        assert_eq!(agent.on_timer(stale), TimerFired::Ignored);
        assert_eq!(agent.presence(), Presence::Visible);
    }

    #[test]
    fn poll_timer_reschedules_itself() {
        let mut agent = agent_with(Strategy::Poll);
        agent.initialize(Settings {
            always_show: true,
            ..Settings::default()
        });
        let fired = fire_due(&mut agent, 1500);
        assert_eq!(fired, vec![TimerFired::PollDue; 3]);
        assert!(agent.host().has_pending(TimerKind::Poll));
    }

    #[test]
    fn push_only_agent_never_polls() {
        let mut agent = agent_with(Strategy::Push);
        agent.initialize(Settings::default());
        assert!(!agent.host().has_pending(TimerKind::Poll));
        assert!(!agent.wants_poll());
    }

    #[test]
    fn messages_respect_strategy() {
        let disabled = Settings {
            enabled: false,
            ..Settings::default()
        };

        let mut push = agent_with(Strategy::PushAndPoll);
        push.initialize(Settings::default());
        assert_eq!(push.handle_message(Message::settings_updated(disabled.clone())), Ack::OK);
        assert_eq!(push.presence(), Presence::Hidden);

        let mut poll = agent_with(Strategy::Poll);
        poll.initialize(Settings::default());
        let ack = poll.handle_message(Message::settings_updated(disabled));
        assert!(!ack.success);
        assert!(poll.settings().enabled);
    }

    #[test]
    fn reconcile_before_initialize_touches_nothing() {
        let mut agent = agent_with(Strategy::PushAndPoll);
        let result = agent.reconcile(Trigger::Push, Settings::default());
        assert_eq!(result, Reconciled::NotRunning);
        assert!(agent.host().label().is_none());
    }

    #[test]
    fn push_before_initialize_is_applied_on_start() {
        let mut agent = agent_with(Strategy::Push);
        let pushed = Settings {
            enabled: false,
            ..Settings::default()
        };
        let ack = agent.handle_message(Message::settings_updated(pushed.clone()));
        assert!(ack.success);
        assert!(agent.host().label().is_none());

        // The initial read raced the save and came back stale.
        agent.initialize(Settings::default());
        assert_eq!(agent.settings(), &pushed);
        assert_eq!(agent.presence(), Presence::Hidden);
        assert!(!agent.host().has_pending(TimerKind::AutoHide));
    }

    #[test]
    fn latest_early_push_wins() {
        let mut agent = agent_with(Strategy::PushAndPoll);
        for position in [Position::TopLeft, Position::TopRight] {
            let settings = Settings {
                position,
                ..Settings::default()
            };
            agent.handle_message(Message::settings_updated(settings));
        }
        agent.initialize(Settings::default());
        assert_eq!(agent.settings().position, Position::TopRight);
        assert_eq!(
            agent.host().label().unwrap().style,
            apply_style(agent.settings())
        );
    }

    #[test]
    fn shutdown_clears_timers_and_label() {
        let mut agent = agent_with(Strategy::PushAndPoll);
        agent.initialize(Settings::default());
        agent.shutdown();
        assert!(agent.host().label().is_none());
        assert_eq!(agent.host().pending_timers().count(), 0);
        assert!(!agent.is_running());
    }
}

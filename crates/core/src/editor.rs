//! Settings panel model.
//!
//! The panel's widgets are external; this module owns what they hold, how
//! their raw values become `Settings`, the save-button status, and the
//! persist-then-notify flow.

use viewport_badge_protocol::settings::{clamp_opacity, parse_float_prefix, parse_int_prefix};
use viewport_badge_protocol::{CssColor, HexColor, Message, Settings};

use crate::broadcast::{BroadcastReport, Peers, broadcast};
use crate::config::EditorConfig;
use crate::host::{Scheduler, TimerId, TimerKind};
use crate::store::{SettingsStore, StoreError, save_settings};

/// Raw form values, as the inputs report them.
#[derive(Debug, Clone, PartialEq)]
pub struct FormValues {
    pub enabled: bool,
    pub position: String,
    pub font_size: String,
    pub text_color: String,
    pub bg_color: String,
    pub bg_opacity: String,
    pub always_show: bool,
    pub hide_after: String,
}

impl FormValues {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            enabled: settings.enabled,
            position: settings.position.to_string(),
            font_size: settings.font_size.to_string(),
            text_color: settings.text_color.to_string(),
            bg_color: settings.bg_color.to_string(),
            bg_opacity: settings.bg_opacity.to_string(),
            always_show: settings.always_show,
            hide_after: settings.hide_after.to_string(),
        }
    }

    /// Build a complete settings record. Unparseable fields fall back to
    /// their defaults; numbers are clamped instead of rejected.
    pub fn to_settings(&self) -> Settings {
        let defaults = Settings::default();
        Settings {
            enabled: self.enabled,
            position: self.position.parse().unwrap_or(defaults.position),
            font_size: self.font_size.parse().unwrap_or(defaults.font_size),
            text_color: CssColor::parse(&self.text_color).unwrap_or(defaults.text_color),
            bg_color: HexColor::parse(&self.bg_color).unwrap_or(defaults.bg_color),
            bg_opacity: parse_float_prefix(&self.bg_opacity)
                .map_or(defaults.bg_opacity, clamp_opacity),
            always_show: self.always_show,
            hide_after: parse_int_prefix(&self.hide_after)
                .map_or(defaults.hide_after, |ms| ms.clamp(0, i64::from(u32::MAX)) as u32),
        }
    }

    /// The hide-delay input is inert while always-show is checked.
    pub fn hide_after_disabled(&self) -> bool {
        self.always_show
    }
}

/// Text on the save button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saved,
    Failed,
}

impl SaveStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Save Settings",
            Self::Saved => "Saved!",
            Self::Failed => "Error!",
        }
    }
}

pub struct ConfigEditor {
    config: EditorConfig,
    form: FormValues,
    status: SaveStatus,
    revert_timer: Option<TimerId>,
}

impl ConfigEditor {
    pub fn new(config: EditorConfig, current: &Settings) -> Self {
        Self {
            config,
            form: FormValues::from_settings(current),
            status: SaveStatus::Idle,
            revert_timer: None,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn form(&self) -> &FormValues {
        &self.form
    }

    /// Replace the form contents with what the widgets currently hold.
    pub fn update_form(&mut self, form: FormValues) {
        self.form = form;
    }

    /// Returns whether the hide-delay input should now be disabled.
    pub fn set_always_show(&mut self, always_show: bool) -> bool {
        self.form.always_show = always_show;
        self.form.hide_after_disabled()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.form.enabled = enabled;
    }

    /// The record a save would persist.
    pub fn submit(&self) -> Settings {
        self.form.to_settings()
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    /// Show the outcome of a save and schedule the revert to idle.
    pub fn finish_save<T>(
        &mut self,
        outcome: &Result<T, StoreError>,
        scheduler: &mut impl Scheduler,
    ) -> SaveStatus {
        if let Some(id) = self.revert_timer.take() {
            scheduler.cancel(id);
        }
        self.status = match outcome {
            Ok(_) => SaveStatus::Saved,
            Err(e) => {
                tracing::error!(error = %e, "saving settings failed");
                SaveStatus::Failed
            }
        };
        self.revert_timer =
            Some(scheduler.schedule(TimerKind::StatusRevert, self.config.status_revert_ms));
        self.status
    }

    /// Returns the new status when `id` was the pending revert timer.
    pub fn on_timer(&mut self, id: TimerId) -> Option<SaveStatus> {
        if self.revert_timer != Some(id) {
            return None;
        }
        self.revert_timer = None;
        self.status = SaveStatus::Idle;
        Some(self.status)
    }
}

/// Persist `settings` as a full replacement, then tell every reachable
/// context about it. Notification only happens after a successful write.
pub async fn publish<S, P>(
    store: &S,
    peers: &P,
    key: &str,
    settings: &Settings,
) -> Result<BroadcastReport, StoreError>
where
    S: SettingsStore,
    P: Peers,
{
    save_settings(store, key, settings).await?;
    let report = broadcast(peers, &Message::settings_updated(settings.clone())).await;
    tracing::debug!(
        delivered = report.delivered.len(),
        unreachable = report.unreachable.len(),
        "settings published"
    );
    Ok(report)
}

/// The enable checkbox applies immediately: re-read what is stored, flip
/// only `enabled`, and publish the result.
///
/// A failed read aborts without writing, so the stored record is never
/// replaced by defaults.
pub async fn toggle_enabled<S, P>(
    store: &S,
    peers: &P,
    key: &str,
    enabled: bool,
) -> Result<BroadcastReport, StoreError>
where
    S: SettingsStore,
    P: Peers,
{
    let stored = store.read(key).await?;
    let next = Settings {
        enabled,
        ..Settings::from_stored(stored.as_ref())
    };
    publish(store, peers, key, &next).await
}

use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// A notification pushed from the settings editor to a rendering context.
///
/// On the wire this is `{"type": "settingsUpdated", "settings": {...}}`.
/// Messages with any other `type` fail to decode and are left for other
/// listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Message {
    SettingsUpdated { settings: Settings },
}

impl Message {
    pub fn settings_updated(settings: Settings) -> Self {
        Self::SettingsUpdated { settings }
    }
}

/// Receiver's reply to a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub const OK: Ack = Ack { success: true };
}

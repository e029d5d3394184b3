pub mod agent;
pub mod broadcast;
pub mod config;
pub mod editor;
pub mod host;
pub mod sim;
pub mod store;
pub mod style;
pub mod visibility;

pub use agent::{OverlayAgent, Reconciled, TimerFired, Trigger};
pub use broadcast::{BroadcastReport, ContextId, DeliveryError, Peers, broadcast};
pub use config::{AgentConfig, ConfigError, EditorConfig, Strategy};
pub use editor::{ConfigEditor, FormValues, SaveStatus, publish, toggle_enabled};
pub use host::{OverlayHost, Scheduler, Surface, TimerId, TimerKind};
pub use store::{MemoryStore, SettingsStore, StoreError, load_settings, poll_settings, save_settings};
pub use style::{LabelStyle, apply_style};
pub use visibility::Presence;

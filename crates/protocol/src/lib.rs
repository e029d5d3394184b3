pub mod message;
pub mod settings;
pub mod types;

pub use message::{Ack, Message};
pub use settings::{CssColor, FontSize, HexColor, Position, STORAGE_KEY, Settings};
pub use types::{Dimensions, Viewport};

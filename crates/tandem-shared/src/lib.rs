// Shared domain types for the Tandem couples companion backend.

pub mod code;
pub mod constants;
pub mod models;
pub mod prompts;
pub mod types;
pub mod widget;

pub use code::{CodeError, HeartCode};
pub use models::{
    CheckIn, HeartRecord, HeartSnapshot, Letter, MusicTrack, PairingSnapshot, QuestionAnswer,
    UserAccount,
};
pub use types::{HeartRole, UserId};
pub use widget::{WidgetLetter, WidgetSummary, WidgetTrack};

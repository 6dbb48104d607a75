pub mod bot;

pub use bot::{BotError, BotState, BotStatus, InsiderBot};

//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Turns inbound updates into engine input
//! - `messenger`: Reply values and delivery through the Telegram API
//! - `dialogue_manager`: The step runner shared by both bots
//! - `ui_builder`: Creates keyboards and formats messages
//! - `admin`: Flows of the administrative bot
//! - `lookup`: Flow of the end-user lookup bot

pub mod admin;
pub mod dialogue_manager;
pub mod lookup;
pub mod message_handler;
pub mod messenger;
pub mod ui_builder;

pub use admin::AdminConversation;
pub use dialogue_manager::{Conversation, ConversationEngine, StepOutcome, Transition};
pub use lookup::LookupConversation;
pub use message_handler::{Content, Incoming};
pub use messenger::{deliver, Keyboard, Messenger, Reply};

//! # Cinema Bots
//!
//! Two Telegram bots sharing one movie catalog: an end-user bot that looks
//! movies up by id and an administrative bot that manages the catalog and
//! the administrator allow-list. Both receive updates through webhooks.

pub mod bot;
pub mod catalog;
pub mod config;
pub mod dialogue;
pub mod instance_guard;
pub mod localization;
pub mod webhook;

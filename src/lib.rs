//! Client for a webhook-backed chat: it posts messages to one webhook and
//! polls another for the stored conversation.
//!
//! The core (content normalization, history decoding, form encoding, thread
//! state) has no I/O and also builds for the browser front end. The `client`
//! feature adds the native HTTP client and polling loop.

pub mod content;
pub mod envelope;
pub mod history;
pub mod models;
pub mod session;
pub mod thread;

#[cfg(feature = "client")]
pub mod api;
#[cfg(feature = "client")]
pub mod config;
#[cfg(feature = "client")]
pub mod errors;
#[cfg(feature = "client")]
pub mod sync;
#[cfg(feature = "client")]
pub mod terminal;

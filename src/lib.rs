//! Document summaries with a persisted history, aggregate statistics and a
//! per-document chat.
//!
//! The host constructs every component explicitly; [`app::App`] is the
//! default wiring used by the command-line binary.

pub mod ai;
pub mod app;
pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod models;
pub mod services;
pub mod session;
pub mod stats;

pub use error::{AppError, Result};

//! Weekly class-schedule generation.
//!
//! The [`generator`] module holds the engine; [`catalog`] feeds it course data
//! and [`server`] exposes it over HTTP.
pub mod catalog;
pub mod config;
pub mod error;
pub mod generator;
pub mod gpa;
pub mod models;
pub mod server;
pub mod server_handlers;

pub use config::Config;
pub use server::{run_server, AppState};

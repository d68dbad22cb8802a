//! Terminal client for a music streaming API.
//!
//! The binary wires these together in [`runtime::run`].

pub mod api;
pub mod app;
pub mod audio;
pub mod config;
pub mod library;
pub mod logging;
pub mod mpris;
pub mod runtime;
pub mod spotlight;
pub mod store;
pub mod surface;
pub mod sync;
pub mod ui;

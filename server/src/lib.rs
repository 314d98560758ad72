//! SafariBugTracker server: Issue API, Logger API and health endpoints.

pub mod api;
mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;

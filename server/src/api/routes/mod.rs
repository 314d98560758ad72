//! API route handlers

pub mod health;
pub mod issues;
pub mod logs;
pub mod metrics;

//! Utility functions for the application

pub mod crypto;
pub mod encoding;
pub mod path;
pub mod string;

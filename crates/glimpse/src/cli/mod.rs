//! Command implementations for the `glimpse` binary.

pub mod classify;
pub mod config;
pub mod models;
pub mod render;
pub mod session;
pub mod theme;

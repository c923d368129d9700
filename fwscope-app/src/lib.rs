//! Fwscope application library.
//!
//! This library exposes internal modules for integration testing.
//! In production, `fwscope-app` is used as a binary (main.rs).

pub mod intent;
pub mod ports;
pub mod runtime;
pub mod session;
pub mod view;

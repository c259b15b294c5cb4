//! # Core Runtime Module
//!
//! Shared runtime plumbing for the passkey bridge:
//! - Logging and tracing infrastructure
//! - Configuration management (`BridgeConfig`, `FlowSettings`)
//! - Event bus for authentication lifecycle notifications
//!
//! ## Overview
//!
//! Both halves of the bridge depend on this crate. The page-side flow only
//! needs [`config::FlowSettings`] and logging; the native side builds a full
//! [`config::BridgeConfig`] with a secure store and subscribes to the
//! [`events::EventBus`] to learn when to close the embedded surface.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};

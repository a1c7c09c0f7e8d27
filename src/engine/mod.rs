//! # Engine Module
//!
//! Internal runtime implementation.
//!
//! This module contains the core building blocks:
//! - Identifiers and component type keys
//! - Component contract and type-keyed storage
//! - Entities and managed entity access
//! - The inverted component index
//! - Deferred registry changes
//! - Structural change notifications
//! - Systems and the manager that dispatches them
//!
//! Public API exposure is controlled by `lib.rs`.

pub mod types;
pub mod error;
pub mod config;
pub mod component;
pub mod entity;
pub mod index;
pub mod commands;
pub mod events;
pub mod systems;
pub mod manager;

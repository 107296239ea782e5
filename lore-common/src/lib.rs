//! # LORE Common Library
//!
//! Shared code for the layered override resolution workspace:
//! - Error and result types
//! - Configuration loading and root folder resolution
//! - Database pool initialization and table creation
//! - Row models for the override and benchmark tables

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};

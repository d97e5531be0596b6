//! Foundation module - Core utilities and types
//!
//! This module provides the small utilities the window layer is built on:
//! - Text held in both application and window-system encodings
//! - Unique tokens for window-class names
//! - Logging utilities

pub mod logging;
pub mod text;
pub mod token;

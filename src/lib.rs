// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Mammoscan: mammogram upload client
//!
//! Picks an image, uploads it to an external analysis service and renders
//! the structured verdict. Inference happens entirely on the service side.

pub mod analysis;
pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod picker;
pub mod render;
pub mod session;

pub use config::AppConfig;
pub use error::{MammoscanError, Result};

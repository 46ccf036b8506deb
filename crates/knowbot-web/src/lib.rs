#![forbid(unsafe_code)]

//! Browser binding for the Knowbot website widget.
//!
//! This crate exports [`Knowbot`], a `wasm-bindgen` class that renders the
//! widget markup into the page, implements `knowbot_core::PageHost` over
//! `web-sys`, forwards DOM events to the session controller and arms one
//! browser timeout for the controller's next deadline.
//!
//! Everything that does not need a browser lives in [`bridge`], [`error`]
//! and [`logging`] so it can be tested natively.

pub mod bridge;
pub mod error;
pub mod logging;

#[cfg(target_arch = "wasm32")]
mod wasm;

pub use error::WidgetError;
#[cfg(target_arch = "wasm32")]
pub use wasm::Knowbot;

#![forbid(unsafe_code)]

//! Core: session state machine, visibility rules, and page-level effects for
//! the Knowbot website widget.
//!
//! # Role in Knowbot
//! `knowbot-core` decides when the widget is open, when its chrome counts as
//! active, and what that means for the page: classes, element visibility,
//! the scroll lock, and the embedded content surface.
//!
//! # Design goals
//! - **Host-driven I/O**: the embedding environment pushes page signals and
//!   reads/writes the page through [`host::PageHost`].
//! - **Deterministic time**: the host advances a monotonic clock; every
//!   throttle, debounce and idle countdown runs off [`timer::TimerQueue`].
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! `knowbot-web` binds this crate to the browser with `wasm-bindgen`.

pub mod config;
pub mod embed;
pub mod error;
pub mod host;
pub mod inactivity;
pub mod markup;
pub mod rate_limit;
pub mod scroll_lock;
pub mod session;
pub mod timer;
pub mod visibility;

pub use config::{ParsedConfig, WidgetConfig};
pub use error::{ConfigError, ConfigWarning};
pub use host::{HeadlessPage, PageHost, StyleProperty, WidgetElement};
pub use session::{ActivityKind, CloseReason, SessionController, SessionState};

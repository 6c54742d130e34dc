//! Format handler registry.
//!
//! Handlers are registered by name and extension and build a fresh
//! [`Parser`] or [`Writer`] per call from the injected projector and
//! configuration. Third-party formats register a [`FormatHandler`] without
//! touching the bundled ones.

mod config;
mod core;
mod handler;
pub mod handlers;
mod types;

pub use config::create_handler_registry;
pub use core::{FormatHandler, HandlerRegistry};
pub use handler::{Parser, ParserFactory, Writer, WriterFactory};
pub use types::{ErrorMessages, ErrorPolicy};

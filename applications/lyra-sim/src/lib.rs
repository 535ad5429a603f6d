//! Lyra Simulator Library
//!
//! Headless listening sessions against the playback engine: a virtual-clock
//! media output, an in-memory catalog and a recording view registrar.
//!
//! This library exposes the components for testing purposes.

pub mod catalog;
pub mod config;
pub mod error;
pub mod registrar;
pub mod session;
pub mod sink;

// Re-export commonly used types for convenience
pub use catalog::CatalogRepository;
pub use config::{CatalogEntry, ClockSettings, SessionSettings, SimConfig};
pub use error::{Result, SimError};
pub use registrar::LoggingRegistrar;
pub use session::{run_session, SessionReport};
pub use sink::VirtualSink;

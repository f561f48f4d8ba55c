//! Built-in probes, one module per capability.

pub mod clock;
pub mod entropy;
pub mod environ;
pub mod file_open;
pub mod thread;
pub mod truncate;

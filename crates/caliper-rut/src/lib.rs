pub mod config;
pub mod errno;
pub mod fd;
pub mod host;
pub mod memory;
pub mod path;
pub mod runtime;
pub mod thread;

pub use errno::{Errno, ErrorKind};
pub use runtime::Runtime;

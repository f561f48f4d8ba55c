pub mod outcome;
pub mod probe;
pub mod probes;
pub mod registry;
pub mod scope;
pub mod settings;

pub use outcome::{Outcome, Value};
pub use probe::{Capability, Probe, ProbeContext};
pub use registry::{ProbeRegistry, RegistryError};
pub use settings::ProbeSettings;

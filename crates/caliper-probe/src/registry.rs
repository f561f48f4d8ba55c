use crate::probe::{Capability, Probe};
use crate::probes::{clock, entropy, environ, file_open, thread, truncate};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Probe already registered: {0}")]
    Duplicate(String),
}

/// Probes by name, in registration order. Built once at startup.
#[derive(Debug, Default)]
pub struct ProbeRegistry {
    probes: Vec<Probe>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full set of built-in probes.
    pub fn builtin() -> Self {
        let builtin = [
            probe("clock.res.monotonic", Capability::Clock, clock::res_monotonic),
            probe("clock.res.realtime", Capability::Clock, clock::res_realtime),
            probe("clock.time.monotonic", Capability::Clock, clock::time_monotonic),
            probe("clock.time.realtime", Capability::Clock, clock::time_realtime),
            probe("fileopen.missing-parent", Capability::FileOpen, file_open::missing_parent),
            probe("fileopen.parent-token", Capability::FileOpen, file_open::parent_token),
            probe("fileopen.sibling-escape", Capability::FileOpen, file_open::sibling_escape),
            probe("truncate.grow-shrink", Capability::Truncate, truncate::grow_shrink),
            probe("entropy.single", Capability::Entropy, entropy::single),
            probe("entropy.strided", Capability::Entropy, entropy::strided),
            probe("thread.guarded-flag", Capability::Thread, thread::guarded_flag),
            probe("argv.enumeration", Capability::EnvironMirror, environ::argv),
            probe("environ.enumeration", Capability::EnvironMirror, environ::environ),
        ];
        Self {
            probes: builtin.to_vec(),
        }
    }

    pub fn register(&mut self, probe: Probe) -> Result<(), RegistryError> {
        if self.get(probe.name).is_some() {
            return Err(RegistryError::Duplicate(probe.name.to_string()));
        }
        self.probes.push(probe);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Probe> {
        self.probes.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Probe> {
        self.probes.iter()
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

fn probe(name: &'static str, capability: Capability, invoke: crate::probe::ProbeFn) -> Probe {
    Probe {
        name,
        capability,
        invoke,
    }
}

//! Runtime registry

use super::{GoRuntime, NodeRuntime, PythonRuntime, RuntimeCommands, RuntimeId};
use crate::config::ScriptSettings;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of runtime generators, indexed by id and manifest name
#[derive(Clone)]
pub struct RuntimeRegistry {
    runtimes: Vec<Arc<dyn RuntimeCommands>>,
    manifest_index: HashMap<String, Vec<(usize, u8)>>,
}

impl RuntimeRegistry {
    pub fn new() -> Self {
        Self {
            runtimes: Vec::new(),
            manifest_index: HashMap::new(),
        }
    }

    pub fn with_settings(settings: &ScriptSettings) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(NodeRuntime::new(settings.clone())));
        registry.register(Arc::new(PythonRuntime::new(settings.clone())));
        registry.register(Arc::new(GoRuntime::new(settings.clone())));
        registry
    }

    pub fn register(&mut self, runtime: Arc<dyn RuntimeCommands>) {
        let idx = self.runtimes.len();

        for pattern in runtime.manifest_patterns() {
            let entry = self
                .manifest_index
                .entry(pattern.filename.to_string())
                .or_default();
            entry.push((idx, pattern.priority));
            entry.sort_by_key(|&(_, priority)| priority);
        }

        self.runtimes.push(runtime);
    }

    pub fn get(&self, id: RuntimeId) -> Option<&dyn RuntimeCommands> {
        self.runtimes
            .iter()
            .find(|r| r.id() == id)
            .map(|r| r.as_ref())
    }

    /// Runtime owning a manifest file name, e.g. `go.mod`
    ///
    /// Accepts a bare file name or a path; only the last component is matched.
    pub fn detect(&self, manifest: &str) -> Option<&dyn RuntimeCommands> {
        let filename = manifest.rsplit(['/', '\\']).next().unwrap_or(manifest);
        let candidates = self.manifest_index.get(filename)?;
        let &(idx, priority) = candidates.first()?;
        let runtime = self.runtimes[idx].as_ref();
        debug!(manifest = filename, runtime = %runtime.id(), priority, "Detected runtime");
        Some(runtime)
    }

    pub fn ids(&self) -> Vec<RuntimeId> {
        self.runtimes.iter().map(|r| r.id()).collect()
    }
}

impl Default for RuntimeRegistry {
    fn default() -> Self {
        Self::with_settings(&ScriptSettings::default())
    }
}

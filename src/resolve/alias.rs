use dashmap::DashMap;

/// Runtime alias registrations (`shortcut <alias> <target>`).
///
/// Shared across snapshots; not persisted. Entries here shadow configured
/// jump shortcuts of the same name.
#[derive(Debug, Default)]
pub struct AliasTable {
    entries: DashMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace an alias. Returns the previous target.
    pub fn register(&self, alias: impl Into<String>, target: impl Into<String>) -> Option<String> {
        self.entries.insert(alias.into(), target.into())
    }

    pub fn get(&self, alias: &str) -> Option<String> {
        self.entries.get(alias).map(|e| e.value().clone())
    }

    pub fn remove(&self, alias: &str) -> Option<String> {
        self.entries.remove(alias).map(|(_, target)| target)
    }

    /// All aliases, sorted by name.
    pub fn list(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

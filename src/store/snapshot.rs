use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::ShellError;
use crate::loader::{ConfigSource, FamilyLoader, RawDocument};
use crate::merge::{collect_system, merge, NodeMerge, ShortcutMerge, ZoneMerge};
use crate::nav::{NavAssigner, NavMap};
use crate::resolve::AddressResolver;
use crate::schema::{
    CustomizationRecord, NavConfig, Shortcut, ShortcutsDoc, ZoneConfig, ZoneDef,
};
use crate::validation::{Layer, ValidationWarning};
use crate::zone::{ZoneGrouper, ZoneMap};

use super::node_store::NodeStore;

pub const NAV_DOC: &str = "nav";
pub const ZONES_DOC: &str = "zones";
pub const SHORTCUTS_DOC: &str = "shortcuts";
pub const NODES_CUSTOM_DOC: &str = "nodes_custom";
pub const ZONES_CUSTOM_DOC: &str = "zones_custom";
pub const SHORTCUTS_CUSTOM_DOC: &str = "shortcuts_custom";

/// Everything one merge pass produced. Immutable once built.
#[derive(Debug)]
pub struct ShellSnapshot {
    pub generation: u64,
    pub built_at: DateTime<Utc>,
    pub store: NodeStore,
    pub nav: NavMap,
    pub zones: ZoneMap,
    pub shortcuts: IndexMap<String, Shortcut>,
    pub warnings: Vec<ValidationWarning>,
}

impl ShellSnapshot {
    /// Resolver over this snapshot, without runtime aliases.
    pub fn resolver(&self) -> AddressResolver<'_> {
        AddressResolver::new(&self.store, &self.nav)
            .with_zones(&self.zones)
            .with_shortcuts(&self.shortcuts)
    }
}

/// Builds snapshots from a system source and an optional user source.
///
/// The system source is re-read on every build.
pub struct SnapshotBuilder<'a> {
    system: &'a dyn ConfigSource,
    user: Option<&'a dyn ConfigSource>,
    nav_prefix: Option<String>,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(system: &'a dyn ConfigSource, user: Option<&'a dyn ConfigSource>) -> Self {
        Self {
            system,
            user,
            nav_prefix: None,
        }
    }

    /// Prefix for nav configs that do not set their own.
    pub fn with_nav_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.nav_prefix = Some(prefix.into());
        self
    }

    /// Run one full merge pass.
    ///
    /// Only unreadable sources and nav coordinate collisions fail the build;
    /// every other problem becomes a warning.
    pub fn build(&self, generation: u64) -> Result<ShellSnapshot, ShellError> {
        let loaded = FamilyLoader::new(self.system, self.user).load_all()?;
        let mut warnings = loaded.warnings;

        let mut system_nodes = IndexMap::new();
        let mut families = BTreeMap::new();
        for (name, validated) in loaded.families {
            system_nodes.extend(validated.nodes);
            families.insert(name, validated.family);
        }

        let node_kind = NodeMerge::new(families.keys().cloned());
        let nodes_custom = self.customization(NODES_CUSTOM_DOC, &mut warnings)?;
        let merged = merge(&node_kind, &system_nodes, nodes_custom.as_ref());
        warnings.extend(merged.warnings);
        let (store, store_warnings) = NodeStore::build(merged.entries, families);
        warnings.extend(store_warnings);

        let mut nav_config = self.nav_config(&mut warnings)?;
        if nav_config.prefix.is_none() {
            nav_config.prefix = self.nav_prefix.clone();
        }
        let (nav, nav_warnings) = NavAssigner::new(&nav_config).assign(&store)?;
        warnings.extend(nav_warnings);

        let zone_defs = self.zone_defs(&mut warnings)?;
        let plain = AddressResolver::new(&store, &nav);
        let (zones, zone_warnings) = ZoneGrouper::new(&store, &plain).build(&zone_defs);
        warnings.extend(zone_warnings);

        let shortcuts = self.shortcuts(&mut warnings)?;

        for w in &warnings {
            warn!(code = %w.code, layer = %w.layer, node_id = ?w.node_id, "{}", w.reason);
        }
        info!(
            generation,
            nodes = store.len(),
            nav = nav.len(),
            zones = zones.len(),
            shortcuts = shortcuts.len(),
            warnings = warnings.len(),
            "snapshot built"
        );

        Ok(ShellSnapshot {
            generation,
            built_at: Utc::now(),
            store,
            nav,
            zones,
            shortcuts,
            warnings,
        })
    }

    fn customization(
        &self,
        stem: &str,
        warnings: &mut Vec<ValidationWarning>,
    ) -> Result<Option<CustomizationRecord>, ShellError> {
        let Some(user) = self.user else {
            return Ok(None);
        };
        Ok(user
            .document(stem)?
            .and_then(|doc| parse_or_warn(&doc, Layer::User, "W200", warnings)))
    }

    /// The user nav config replaces the system one when it parses.
    fn nav_config(&self, warnings: &mut Vec<ValidationWarning>) -> Result<NavConfig, ShellError> {
        if let Some(user) = self.user {
            if let Some(doc) = user.document(NAV_DOC)? {
                if let Some(config) = parse_or_warn(&doc, Layer::User, "W300", warnings) {
                    return Ok(config);
                }
            }
        }
        Ok(self
            .system
            .document(NAV_DOC)?
            .and_then(|doc| parse_or_warn(&doc, Layer::System, "W300", warnings))
            .unwrap_or_default())
    }

    fn zone_defs(
        &self,
        warnings: &mut Vec<ValidationWarning>,
    ) -> Result<IndexMap<String, ZoneDef>, ShellError> {
        let system: ZoneConfig = self
            .system
            .document(ZONES_DOC)?
            .and_then(|doc| parse_or_warn(&doc, Layer::System, "W400", warnings))
            .unwrap_or_default();
        let (entries, system_warnings) = collect_system(&ZoneMerge, &system.zones);
        warnings.extend(system_warnings);
        let custom = self.customization(ZONES_CUSTOM_DOC, warnings)?;
        let merged = merge(&ZoneMerge, &entries, custom.as_ref());
        warnings.extend(merged.warnings);
        Ok(merged.entries)
    }

    fn shortcuts(
        &self,
        warnings: &mut Vec<ValidationWarning>,
    ) -> Result<IndexMap<String, Shortcut>, ShellError> {
        let system = match self.system.document(SHORTCUTS_DOC)? {
            Some(doc) => parse_or_warn::<Value>(&doc, Layer::System, "W500", warnings)
                .map(ShortcutsDoc::from_value)
                .unwrap_or_default(),
            None => ShortcutsDoc::default(),
        };
        let (entries, system_warnings) = collect_system(&ShortcutMerge, &system.shortcuts);
        warnings.extend(system_warnings);
        let custom = self.customization(SHORTCUTS_CUSTOM_DOC, warnings)?;
        let merged = merge(&ShortcutMerge, &entries, custom.as_ref());
        warnings.extend(merged.warnings);
        Ok(merged.entries)
    }
}

fn parse_or_warn<T: DeserializeOwned>(
    doc: &RawDocument,
    layer: Layer,
    code: &str,
    warnings: &mut Vec<ValidationWarning>,
) -> Option<T> {
    match doc.parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            warnings.push(ValidationWarning::new(
                layer,
                code,
                None,
                format!("{} unusable, ignored: {}", doc.locator, err),
            ));
            None
        }
    }
}

/// Holder of the active snapshot. Readers take a cheap `Arc` and keep using
/// it even if a reload swaps in a newer one.
pub struct SnapshotHandle {
    current: ArcSwap<ShellSnapshot>,
}

impl SnapshotHandle {
    pub fn new(initial: ShellSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    pub fn load(&self) -> Arc<ShellSnapshot> {
        self.current.load_full()
    }

    /// Replace the active snapshot, returning the previous one.
    pub fn swap(&self, next: ShellSnapshot) -> Arc<ShellSnapshot> {
        self.current.swap(Arc::new(next))
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation
    }
}

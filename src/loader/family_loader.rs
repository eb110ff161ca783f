use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::error::ShellError;
use crate::schema::{FamilyDoc, FamilyOrigin};
use crate::validation::{validate_family, Layer, ValidatedFamily, ValidationWarning};

use super::source::{ConfigSource, RawDocument};

/// Families selected for one merge pass, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct LoadedFamilies {
    pub families: BTreeMap<String, ValidatedFamily>,
    pub warnings: Vec<ValidationWarning>,
}

/// Loads families from the system source and the optional user source.
///
/// A valid user family replaces the system family of the same name. A
/// broken user family never blocks the system one.
pub struct FamilyLoader<'a> {
    system: &'a dyn ConfigSource,
    user: Option<&'a dyn ConfigSource>,
}

impl<'a> FamilyLoader<'a> {
    pub fn new(system: &'a dyn ConfigSource, user: Option<&'a dyn ConfigSource>) -> Self {
        Self { system, user }
    }

    /// Load every family found in either source.
    pub fn load_all(&self) -> Result<LoadedFamilies, ShellError> {
        let system_docs = index_by_stem(self.system.family_documents()?);
        let user_docs = match self.user {
            Some(user) => index_by_stem(user.family_documents()?),
            None => BTreeMap::new(),
        };

        let mut names: Vec<&String> = system_docs.keys().chain(user_docs.keys()).collect();
        names.sort();
        names.dedup();

        let mut loaded = LoadedFamilies::default();
        for name in names {
            let (family, warnings) = select(system_docs.get(name), user_docs.get(name));
            loaded.warnings.extend(warnings);
            if let Some(family) = family {
                loaded.families.insert(family.family.name.clone(), family);
            }
        }

        for w in &loaded.warnings {
            warn!(code = %w.code, layer = %w.layer, node_id = ?w.node_id, "{}", w.reason);
        }
        info!(
            families = loaded.families.len(),
            warnings = loaded.warnings.len(),
            system = %self.system.describe(),
            "families loaded"
        );
        Ok(loaded)
    }

    /// Load a single family by name.
    pub fn load_family(
        &self,
        name: &str,
    ) -> Result<(Option<ValidatedFamily>, Vec<ValidationWarning>), ShellError> {
        let system = find(self.system.family_documents()?, name);
        let user = match self.user {
            Some(user) => find(user.family_documents()?, name),
            None => None,
        };
        Ok(select(system.as_ref(), user.as_ref()))
    }
}

fn index_by_stem(docs: Vec<RawDocument>) -> BTreeMap<String, RawDocument> {
    docs.into_iter().map(|d| (d.stem.clone(), d)).collect()
}

fn find(docs: Vec<RawDocument>, name: &str) -> Option<RawDocument> {
    docs.into_iter().find(|d| d.stem == name)
}

fn select(
    system: Option<&RawDocument>,
    user: Option<&RawDocument>,
) -> (Option<ValidatedFamily>, Vec<ValidationWarning>) {
    let mut warnings = Vec::new();

    let system_family = system.and_then(|doc| {
        let (family, w) = parse_and_validate(doc, FamilyOrigin::System);
        warnings.extend(w);
        family
    });

    let Some(user_doc) = user else {
        return (system_family, warnings);
    };

    let (user_family, user_warnings) = parse_and_validate(user_doc, FamilyOrigin::User);
    warnings.extend(user_warnings);
    match user_family {
        Some(family) => {
            debug!(family = %family.family.name, "user family replaces system family");
            (Some(family), warnings)
        }
        None => {
            if let Some(family) = &system_family {
                warnings.push(ValidationWarning::new(
                    Layer::User,
                    "W003",
                    Some(&family.family.name),
                    format!("user family at {} unusable, system family kept", user_doc.locator),
                ));
            }
            (system_family, warnings)
        }
    }
}

fn parse_and_validate(
    doc: &RawDocument,
    origin: FamilyOrigin,
) -> (Option<ValidatedFamily>, Vec<ValidationWarning>) {
    let layer = match origin {
        FamilyOrigin::System => Layer::System,
        FamilyOrigin::User => Layer::User,
    };
    match doc.parse::<FamilyDoc>() {
        Ok(family_doc) => validate_family(&family_doc, origin),
        Err(err) => (
            None,
            vec![ValidationWarning::new(
                layer,
                "W001",
                Some(&doc.stem),
                format!("family document {} unusable: {}", doc.locator, err),
            )],
        ),
    }
}

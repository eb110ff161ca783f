use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::ShellError;
use crate::schema::{parse_document, ConfigFormat};

/// Directory holding family documents inside a source.
pub const FAMILIES_DIR: &str = "families";
/// File-name suffix of family documents (`<name>_family.<ext>`).
pub const FAMILY_SUFFIX: &str = "_family";

/// Unparsed document text plus enough context to report on it.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Name derived from the locator (family name for family documents).
    pub stem: String,
    /// Human-readable location, used in warnings.
    pub locator: String,
    pub format: ConfigFormat,
    /// Document text, or the reason it could not be read.
    pub content: Result<String, String>,
}

impl RawDocument {
    /// Parse the document. An unreadable document fails like an unparseable one.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ShellError> {
        match &self.content {
            Ok(text) => parse_document(text, self.format),
            Err(reason) => Err(ShellError::ConfigParse(format!("unreadable: {}", reason))),
        }
    }
}

/// A place configuration documents are read from.
pub trait ConfigSource: Send + Sync {
    /// Every family document, ordered by stem.
    fn family_documents(&self) -> Result<Vec<RawDocument>, ShellError>;

    /// A top-level document by stem, e.g. `nav` or `nodes_custom`.
    fn document(&self, stem: &str) -> Result<Option<RawDocument>, ShellError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Documents read from a directory tree.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read one file. Failures stay with the document so the caller can
    /// warn and fall back instead of aborting the whole build.
    fn read(&self, stem: String, path: &Path, format: ConfigFormat) -> RawDocument {
        let content = fs::read_to_string(path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "config document unreadable");
            e.to_string()
        });
        RawDocument {
            stem,
            locator: path.display().to_string(),
            format,
            content,
        }
    }
}

impl ConfigSource for DirSource {
    fn family_documents(&self) -> Result<Vec<RawDocument>, ShellError> {
        let dir = self.root.join(FAMILIES_DIR);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut found: BTreeMap<String, (usize, PathBuf, ConfigFormat)> = BTreeMap::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(format) = ConfigFormat::from_path(&path) else {
                continue;
            };
            let Some(stem) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_suffix(FAMILY_SUFFIX))
            else {
                continue;
            };
            let rank = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(|e| ConfigFormat::EXTENSIONS.iter().position(|x| x.eq_ignore_ascii_case(e)))
                .unwrap_or(usize::MAX);
            // a family present in several formats: lowest-ranked extension wins
            match found.get(stem) {
                Some((existing, _, _)) if *existing <= rank => {}
                _ => {
                    found.insert(stem.to_string(), (rank, path.clone(), format));
                }
            }
        }

        let mut docs = Vec::with_capacity(found.len());
        for (stem, (_, path, format)) in found {
            docs.push(self.read(stem, &path, format));
        }
        Ok(docs)
    }

    fn document(&self, stem: &str) -> Result<Option<RawDocument>, ShellError> {
        for ext in ConfigFormat::EXTENSIONS {
            let path = self.root.join(format!("{}.{}", stem, ext));
            if path.is_file() {
                let Some(format) = ConfigFormat::from_extension(ext) else {
                    continue;
                };
                return Ok(Some(self.read(stem.to_string(), &path, format)));
            }
        }
        Ok(None)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Documents held in memory, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    families: BTreeMap<String, RawDocument>,
    documents: HashMap<String, RawDocument>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_family(mut self, name: &str, format: ConfigFormat, content: impl Into<String>) -> Self {
        self.families.insert(
            name.to_string(),
            RawDocument {
                stem: name.to_string(),
                locator: format!("memory:families/{}", name),
                format,
                content: Ok(content.into()),
            },
        );
        self
    }

    pub fn with_document(mut self, stem: &str, format: ConfigFormat, content: impl Into<String>) -> Self {
        self.documents.insert(
            stem.to_string(),
            RawDocument {
                stem: stem.to_string(),
                locator: format!("memory:{}", stem),
                format,
                content: Ok(content.into()),
            },
        );
        self
    }
}

impl ConfigSource for MemorySource {
    fn family_documents(&self) -> Result<Vec<RawDocument>, ShellError> {
        Ok(self.families.values().cloned().collect())
    }

    fn document(&self, stem: &str) -> Result<Option<RawDocument>, ShellError> {
        Ok(self.documents.get(stem).cloned())
    }

    fn describe(&self) -> String {
        format!("memory({} families)", self.families.len())
    }
}

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum OntologyError {
    #[error("Failed to read ontology: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse ontology: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Term '{term}' has unknown parent '{parent}'")]
    UnknownParent { term: String, parent: String },
}

/// Ontology table version for compatibility checking
pub const ONTOLOGY_VERSION: &str = "1.0.0";

/// Serializable term table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyData {
    pub version: String,
    pub terms: Vec<OntologyTerm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyTerm {
    pub name: String,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

lazy_static! {
    static ref SHARED: Arc<SequenceOntology> = Arc::new(SequenceOntology::load_embedded().unwrap_or_else(|e| {
        warn!("Embedded ontology could not be loaded, type queries will not be expanded: {e}");
        SequenceOntology::new()
    }));
}

/// A read-only "is-a" hierarchy of feature type names.
///
/// A term may have several parents; `is_a` follows every path upward.
#[derive(Debug, Clone, Default)]
pub struct SequenceOntology {
    terms: BTreeMap<String, OntologyTerm>,
}

impl SequenceOntology {
    /// Create an empty ontology in which only identical terms match
    pub fn new() -> Self {
        Self::default()
    }

    /// The embedded term table, parsed once and shared
    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED)
    }

    /// Load the embedded term table
    pub fn load_embedded() -> Result<Self, OntologyError> {
        // Validated at compile time by build.rs
        const EMBEDDED_ONTOLOGY: &str = include_str!("../../ontology/sequence_ontology_lite.json");
        Self::from_json(EMBEDDED_ONTOLOGY)
    }

    /// Load a term table from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, OntologyError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a term table from a JSON string
    pub fn from_json(json: &str) -> Result<Self, OntologyError> {
        let data: OntologyData = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if data.version != ONTOLOGY_VERSION {
            warn!(
                "Ontology version mismatch (expected {}, found {})",
                ONTOLOGY_VERSION, data.version
            );
        }

        Self::from_terms(data.terms)
    }

    /// Build from a list of terms; every parent must itself be listed
    pub fn from_terms(terms: impl IntoIterator<Item = OntologyTerm>) -> Result<Self, OntologyError> {
        let terms: BTreeMap<String, OntologyTerm> =
            terms.into_iter().map(|t| (t.name.clone(), t)).collect();

        for term in terms.values() {
            if let Some(parent) = term.parents.iter().find(|p| !terms.contains_key(*p)) {
                return Err(OntologyError::UnknownParent {
                    term: term.name.clone(),
                    parent: parent.clone(),
                });
            }
        }

        Ok(Self { terms })
    }

    /// Export the term table to JSON
    pub fn to_json(&self) -> Result<String, OntologyError> {
        let data = OntologyData {
            version: ONTOLOGY_VERSION.to_string(),
            terms: self.terms.values().cloned().collect(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    pub fn is_valid_term(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    pub fn term(&self, term: &str) -> Option<&OntologyTerm> {
        self.terms.get(term)
    }

    /// All term names, sorted
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    pub fn parents(&self, term: &str) -> &[String] {
        self.terms.get(term).map_or(&[], |t| t.parents.as_slice())
    }

    /// True if `child` is `parent` or a descendant of it.
    ///
    /// A term always is-a itself, recognized or not; otherwise both terms
    /// must be in the table.
    pub fn is_a(&self, child: &str, parent: &str) -> bool {
        if child == parent {
            return true;
        }
        if !self.is_valid_term(child) {
            debug!("Ontology term '{child}' not recognized");
            return false;
        }
        if !self.is_valid_term(parent) {
            debug!("Ontology term '{parent}' not recognized");
            return false;
        }

        let mut seen = HashSet::new();
        let mut pending: Vec<&str> = vec![child];
        while let Some(term) = pending.pop() {
            for p in self.parents(term) {
                if p == parent {
                    return true;
                }
                if seen.insert(p.as_str()) {
                    pending.push(p);
                }
            }
        }
        false
    }

    /// Every known term that is-a `term`, including `term` if known
    pub fn descendants(&self, term: &str) -> BTreeSet<&str> {
        self.terms().filter(|t| self.is_a(t, term)).collect()
    }

    /// Top-level ancestors of a term (those with no parents); a root term
    /// is its own root
    pub fn root_parents(&self, term: &str) -> BTreeSet<&str> {
        let mut roots = BTreeSet::new();
        let mut seen = HashSet::new();
        let mut pending = vec![term];
        while let Some(t) = pending.pop() {
            let Some((name, entry)) = self.terms.get_key_value(t) else {
                continue;
            };
            if entry.parents.is_empty() {
                roots.insert(name.as_str());
            }
            for p in &entry.parents {
                if seen.insert(p.as_str()) {
                    pending.push(p);
                }
            }
        }
        roots
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use crate::core::iupac::IupacError;
use crate::parsing::barcodes::parse_barcodes_text;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Barcode file not found: {}", .0.display())]
    NotFound(std::path::PathBuf),

    #[error("Failed to read barcode file: {0}")]
    Io(#[from] std::io::Error),

    #[error("No barcodes found in the barcode file")]
    Empty,

    #[error("Ambiguous barcodes: {count} sequences are recognized by more than one barcode")]
    Ambiguous { count: usize },

    #[error("Invalid barcode '{name}': {source}")]
    Iupac {
        name: String,
        #[source]
        source: IupacError,
    },
}

/// Raw barcode definitions keyed by name.
///
/// Built once from the barcode file and read-only afterwards. Sequences are stored
/// upper-case and unexpanded; see [`crate::catalog::ambiguity`] for expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BarcodeCatalog {
    barcodes: BTreeMap<String, String>,
}

impl BarcodeCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a `name,sequence` CSV file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the path does not exist, `CatalogError::Io`
    /// if it cannot be read, or `CatalogError::Empty` if no entries were parsed.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Err(CatalogError::NotFound(path.to_path_buf()));
        }
        info!("Reading barcodes from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_text(&content)
    }

    /// Build a catalog from CSV text.
    ///
    /// Duplicate names overwrite earlier entries (last wins).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Empty` if no entries were parsed.
    pub fn from_text(text: &str) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for (name, sequence) in parse_barcodes_text(text) {
            catalog.insert(name, sequence);
        }

        if catalog.is_empty() {
            return Err(CatalogError::Empty);
        }
        debug!("Loaded {} barcodes", catalog.len());
        Ok(catalog)
    }

    /// Add a barcode, replacing any existing entry with the same name
    pub fn insert(&mut self, name: impl Into<String>, sequence: impl AsRef<str>) {
        let name = name.into();
        let sequence = sequence.as_ref().trim().to_ascii_uppercase();
        if let Some(previous) = self.barcodes.insert(name.clone(), sequence) {
            debug!("Barcode '{name}' redefined (previously {previous}); keeping the last definition");
        }
    }

    /// Get a raw barcode by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.barcodes.get(name).map(String::as_str)
    }

    /// Iterate `(name, raw sequence)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.barcodes.iter().map(|(n, s)| (n.as_str(), s.as_str()))
    }

    /// Number of barcodes in catalog
    pub fn len(&self) -> usize {
        self.barcodes.len()
    }

    /// Check if catalog is empty
    pub fn is_empty(&self) -> bool {
        self.barcodes.is_empty()
    }
}

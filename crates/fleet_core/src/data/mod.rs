//! Data structures for research catalog files.
//!
//! This module contains pure data structures that define the research
//! blueprints. All structs are designed to be deserialized from RON.

mod research_data;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use research_data::{ResearchData, SlotData};

use crate::error::{PlannerError, Result};
use crate::research::ResearchCatalog;

/// A research catalog as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    /// Every blueprint.
    pub research: Vec<ResearchData>,
}

impl CatalogData {
    /// Convert and validate into a [`ResearchCatalog`].
    pub fn into_catalog(self) -> Result<ResearchCatalog> {
        let mut catalog = ResearchCatalog::new();
        for data in self.research {
            let rt = data.into_research()?;
            if catalog.contains(&rt.id) {
                return Err(PlannerError::CorruptBlueprint {
                    id: rt.id,
                    reason: "duplicate id".to_string(),
                });
            }
            catalog.register(rt);
        }
        catalog.validate()?;
        Ok(catalog)
    }
}

/// Parse a catalog from a RON string.
pub fn catalog_from_ron_str(ron_str: &str) -> Result<ResearchCatalog> {
    let data: CatalogData = ron::from_str(ron_str).map_err(|e| PlannerError::DataParseError {
        path: "<inline>".to_string(),
        message: e.to_string(),
    })?;
    data.into_catalog()
}

/// Load a catalog from a RON file.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<ResearchCatalog> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| PlannerError::DataParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let data: CatalogData = ron::from_str(&contents).map_err(|e| PlannerError::DataParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    data.into_catalog()
}

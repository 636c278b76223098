//! Base reference data.
//!
//! The operator's fixed facility set: four air units (LF1-LF4), two ground
//! MICU posts, and the candidate sites under siting evaluation. Loaded once
//! at startup; read-only thereafter.

use serde::{Deserialize, Serialize};

use crate::{AssetType, DataError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseKind {
    Existing,
    Candidate,
}

/// A named facility a unit launches from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Base {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub kind: BaseKind,
    pub asset: AssetType,
}

pub struct BaseRegistry {
    bases: Vec<Base>,
}

impl BaseRegistry {
    pub fn new() -> Self {
        Self { bases: Vec::new() }
    }

    pub fn with_gulf_coast_network() -> Self {
        let mut registry = Self::new();
        registry.load_gulf_coast_network();
        registry
    }

    fn load_gulf_coast_network(&mut self) {
        let network = vec![
            // name, lat, lon, kind, asset
            ("LF1", 29.7080, -95.4010, BaseKind::Existing, AssetType::Air),
            ("LF2", 29.2651, -94.8614, BaseKind::Existing, AssetType::Air),
            ("LF3", 30.3118, -95.4561, BaseKind::Existing, AssetType::Air),
            ("LF4", 29.7702, -96.1550, BaseKind::Existing, AssetType::Air),
            ("MICU-North", 30.0799, -95.4172, BaseKind::Existing, AssetType::Ground),
            ("MICU-East", 29.7355, -94.9774, BaseKind::Existing, AssetType::Ground),
            ("Huntsville Candidate", 30.7235, -95.5508, BaseKind::Candidate, AssetType::Air),
            ("Victoria Candidate", 28.8053, -97.0036, BaseKind::Candidate, AssetType::Air),
            ("Lufkin Candidate", 31.3382, -94.7291, BaseKind::Candidate, AssetType::Air),
        ];

        for (name, lat, lon, kind, asset) in network {
            self.bases.push(Base {
                name: name.to_string(),
                latitude: lat,
                longitude: lon,
                kind,
                asset,
            });
        }
    }

    pub fn get(&self, name: &str) -> Result<&Base> {
        self.bases
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| DataError::BaseNotFound(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Base> {
        self.bases.iter()
    }

    pub fn existing(&self) -> impl Iterator<Item = &Base> {
        self.bases.iter().filter(|b| b.kind == BaseKind::Existing)
    }

    pub fn candidates(&self) -> impl Iterator<Item = &Base> {
        self.bases.iter().filter(|b| b.kind == BaseKind::Candidate)
    }

    /// Resolve a list of base names, failing on the first unknown name.
    pub fn resolve<'a>(&'a self, names: &[String]) -> Result<Vec<&'a Base>> {
        names.iter().map(|n| self.get(n)).collect()
    }
}

impl Default for BaseRegistry {
    fn default() -> Self {
        Self::new()
    }
}

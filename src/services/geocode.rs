//! Trait and types for attaching map coordinates to locations.
//!
//! Lookups are an outside capability. The pipeline never geocodes on its own;
//! callers inject a [`Geocoder`] when they want positions.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

use crate::analyzers::types::{Coordinates, LocatedRollup, LocationRollup};

/// Resolves a free-text location into coordinates.
pub trait Geocoder {
    /// Returns `None` when the location is unknown to the provider.
    fn lookup(&self, location: &str) -> Option<Coordinates>;
}

/// Read-only lookup table held in memory.
///
/// Loaded from a JSON object on disk:
/// ```json
/// {
///   "Av. Paulista, São Paulo": [-23.5614, -46.6559],
///   "BR-116 km 20": [-22.7, -43.3]
/// }
/// ```
#[derive(Debug, Default, Clone)]
pub struct StaticGeocoder {
    entries: HashMap<String, Coordinates>,
}

impl StaticGeocoder {
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Coordinates)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Loads the table from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read coordinates '{}'", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("invalid coordinates '{}'", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let raw: HashMap<String, (f64, f64)> = serde_json::from_str(content)?;
        Ok(Self::from_entries(
            raw.into_iter()
                .map(|(location, (lat, lon))| (location, Coordinates { lat, lon })),
        ))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Geocoder for StaticGeocoder {
    fn lookup(&self, location: &str) -> Option<Coordinates> {
        self.entries.get(location.trim()).copied()
    }
}

/// Pairs each location rollup with its coordinates, keeping rollup order.
/// Locations the geocoder cannot resolve are left out.
pub fn geolocate(rollups: &[LocationRollup], geocoder: &impl Geocoder) -> Vec<LocatedRollup> {
    rollups
        .iter()
        .filter_map(|rollup| {
            geocoder.lookup(&rollup.location).map(|coordinates| LocatedRollup {
                rollup: rollup.clone(),
                coordinates,
            })
        })
        .collect()
}

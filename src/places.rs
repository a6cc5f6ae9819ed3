//! Named places and route resolution

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PlaceError {
    #[error("one or both unknown place names: {0}")]
    UnknownPlace(String),
}

/// Resolved origin and destination
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub orig_name: String,
    pub orig: Place,
    pub dest_name: String,
    pub dest: Place,
}

/// Lookup table of named places
#[derive(Debug, Clone)]
pub struct Places {
    entries: BTreeMap<String, Place>,
}

impl Default for Places {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            "home".to_string(),
            Place {
                lat: 34.051876,
                lng: -118.461077,
            },
        );
        entries.insert(
            "work".to_string(),
            Place {
                lat: 33.992140,
                lng: -118.473471,
            },
        );
        Self { entries }
    }
}

impl Places {
    /// Built-in places, extended or overridden by `extra`
    pub fn with_overrides(extra: &BTreeMap<String, Place>) -> Self {
        let mut places = Self::default();
        for (name, place) in extra {
            places.entries.insert(name.clone(), *place);
        }
        places
    }

    pub fn get(&self, name: &str) -> Option<Place> {
        self.entries.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Place)> {
        self.entries.iter()
    }

    /// Resolve both ends of a route. Fails if either name is unknown.
    pub fn route(&self, orig: &str, dest: &str) -> Result<Route, PlaceError> {
        match (self.get(orig), self.get(dest)) {
            (Some(o), Some(d)) => Ok(Route {
                orig_name: orig.to_string(),
                orig: o,
                dest_name: dest.to_string(),
                dest: d,
            }),
            (o, d) => {
                let unknown = [(o.is_none(), orig), (d.is_none(), dest)]
                    .into_iter()
                    .filter_map(|(missing, name)| missing.then_some(name))
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(PlaceError::UnknownPlace(unknown))
            }
        }
    }
}

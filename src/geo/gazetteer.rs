// src/geo/gazetteer.rs

use crate::geo::GeoPoint;

/// A named location returned by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    pub point: GeoPoint,
}

const DEFAULT_ENTRIES: &[(&str, GeoPoint)] = &[
    ("北京", GeoPoint::new(116.4074, 39.9042)),
    ("上海", GeoPoint::new(121.4737, 31.2304)),
    ("广州", GeoPoint::new(113.2644, 23.1291)),
    ("深圳", GeoPoint::new(114.0579, 22.5431)),
    ("香港", GeoPoint::new(114.1694, 22.3193)),
    ("西安", GeoPoint::new(108.9398, 34.3416)),
    ("成都", GeoPoint::new(104.0668, 30.5728)),
    ("杭州", GeoPoint::new(120.1551, 30.2741)),
    ("武汉", GeoPoint::new(114.3055, 30.5928)),
    ("南京", GeoPoint::new(118.7969, 32.0603)),
    ("Beijing", GeoPoint::new(116.4074, 39.9042)),
    ("Shanghai", GeoPoint::new(121.4737, 31.2304)),
    ("Guangzhou", GeoPoint::new(113.2644, 23.1291)),
    ("Shenzhen", GeoPoint::new(114.0579, 22.5431)),
    ("Hong Kong", GeoPoint::new(114.1694, 22.3193)),
    ("Xi'an", GeoPoint::new(108.9398, 34.3416)),
    ("Chengdu", GeoPoint::new(104.0668, 30.5728)),
    ("Hangzhou", GeoPoint::new(120.1551, 30.2741)),
];

/// Static gazetteer with substring matching.
///
/// A query matches an entry when either string contains the other
/// (case-sensitive). Entries are tried in insertion order and the first
/// match wins, so a short alias placed early can shadow a longer one.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    entries: Vec<(String, GeoPoint)>,
}

impl LocationResolver {
    pub fn new() -> Self {
        Self {
            entries: DEFAULT_ENTRIES
                .iter()
                .map(|(name, point)| ((*name).to_string(), *point))
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends an entry; it is consulted after every existing one.
    pub fn with_entry(mut self, name: &str, point: GeoPoint) -> Self {
        self.entries.push((name.to_string(), point));
        self
    }

    pub fn resolve(&self, name: &str) -> Option<Place> {
        let query = name.trim();
        if query.is_empty() {
            return None;
        }

        self.entries
            .iter()
            .find(|(entry, _)| query.contains(entry.as_str()) || entry.contains(query))
            .map(|(entry, point)| Place {
                name: entry.clone(),
                point: *point,
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LocationResolver {
    fn default() -> Self {
        Self::new()
    }
}

// 📍 Location Entity - Static registry of monitored places
//
// "Location name is the KEY everything joins on"
//
// Locations are loaded once per run and handed out as Arc<Location>, so a
// feedback or traffic record can only point at something the registry knows.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::sync::Arc;

/// Map centre used by report consumers (geographic middle of India)
pub const CITY_CENTER: (f64, f64) = (22.0, 77.5);

// ============================================================================
// LOCATION ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Unique key (joins feedback, traffic and coordinates)
    pub name: String,

    /// Latitude in decimal degrees
    pub latitude: f64,

    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Location {
    /// Create a location, rejecting empty names and out-of-range coordinates
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Result<Self> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(Error::InvalidRecord("location name is empty".to_string()));
        }

        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidRecord(format!(
                "{}: latitude {} out of range",
                name, latitude
            )));
        }

        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidRecord(format!(
                "{}: longitude {} out of range",
                name, longitude
            )));
        }

        Ok(Location {
            name,
            latitude,
            longitude,
        })
    }

    /// Check that another location carries the same key and coordinates
    pub fn same_place(&self, other: &Location) -> bool {
        self.name == other.name
            && self.latitude == other.latitude
            && self.longitude == other.longitude
    }
}

/// Serialize a shared location as its name (records store the key, not a copy)
pub fn serialize_name<S>(location: &Arc<Location>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&location.name)
}

// ============================================================================
// LOCATION REGISTRY
// ============================================================================

/// Registry of all monitored locations
///
/// Read-only once built; cloned Arcs are handed to records and concurrent
/// traffic fetches.
#[derive(Debug, Clone, Default)]
pub struct LocationRegistry {
    /// Locations in registration order
    locations: Vec<Arc<Location>>,

    /// name -> index into `locations`
    index: HashMap<String, usize>,
}

impl LocationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from a list of locations (names must be unique)
    pub fn from_locations(locations: impl IntoIterator<Item = Location>) -> Result<Self> {
        let mut registry = Self::new();
        for location in locations {
            registry.register(location)?;
        }
        Ok(registry)
    }

    /// Registry with the default pan-India metros
    pub fn with_default_locations() -> Self {
        let mut registry = Self::new();
        registry.register_default_locations();
        registry
    }

    /// Add a location; duplicate names are rejected
    pub fn register(&mut self, location: Location) -> Result<Arc<Location>> {
        if self.index.contains_key(&location.name) {
            return Err(Error::InvalidRecord(format!(
                "location registered twice: {}",
                location.name
            )));
        }

        let location = Arc::new(location);
        self.index
            .insert(location.name.clone(), self.locations.len());
        self.locations.push(Arc::clone(&location));
        Ok(location)
    }

    fn register_default_locations(&mut self) {
        const DEFAULTS: &[(&str, f64, f64)] = &[
            // North
            ("Delhi", 28.7041, 77.1025),
            ("New Delhi", 28.6139, 77.2090),
            ("Gurugram", 28.4595, 77.0266),
            ("Noida", 28.5355, 77.3910),
            ("Ghaziabad", 28.6673, 77.4483),
            ("Faridabad", 28.4089, 77.3172),
            ("Chandigarh", 30.7333, 76.7794),
            ("Jaipur", 26.9124, 75.7873),
            ("Lucknow", 26.8467, 80.9462),
            ("Kanpur", 26.4499, 80.3319),
            ("Agra", 27.1767, 78.0081),
            // West
            ("Mumbai", 19.0760, 72.8777),
            ("Pune", 18.5204, 73.8567),
            ("Navi Mumbai", 19.0330, 73.0297),
            ("Thane", 19.2183, 72.9781),
            ("Ahmedabad", 23.0225, 72.5714),
            ("Surat", 21.1702, 72.8311),
            ("Vadodara", 22.3072, 73.1812),
            ("Nagpur", 21.1458, 79.0882),
            ("Indore", 22.7196, 75.8577),
            ("Bhopal", 23.2599, 77.4126),
            // South
            ("Bengaluru", 12.9716, 77.5946),
            ("Hyderabad", 17.3850, 78.4867),
            ("Chennai", 13.0827, 80.2707),
            ("Coimbatore", 11.0168, 76.9558),
            ("Kochi", 9.9312, 76.2673),
            ("Thiruvananthapuram", 8.5241, 76.9366),
            ("Visakhapatnam", 17.6868, 83.2185),
            ("Mysuru", 12.2958, 76.6394),
            ("Mangaluru", 12.9141, 74.8560),
            // East
            ("Kolkata", 22.5726, 88.3639),
            ("Howrah", 22.5958, 88.2636),
            ("Bhubaneswar", 20.2961, 85.8245),
            ("Guwahati", 26.1445, 91.7362),
            // Central
            ("Raipur", 21.2514, 81.6296),
            ("Jabalpur", 23.1815, 79.9864),
        ];

        for (name, lat, lon) in DEFAULTS {
            let location = Location {
                name: (*name).to_string(),
                latitude: *lat,
                longitude: *lon,
            };
            // Static table: names are unique
            let _ = self.register(location);
        }
    }

    /// Look up a location by name
    pub fn get(&self, name: &str) -> Option<&Arc<Location>> {
        self.index.get(name).map(|&i| &self.locations[i])
    }

    /// Look up a location by name, failing loudly if it is unknown
    pub fn resolve(&self, name: &str) -> Result<Arc<Location>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownLocation(name.to_string()))
    }

    /// Check that a location belongs to this registry (same key, same coordinates)
    pub fn is_registered(&self, location: &Location) -> bool {
        self.get(&location.name)
            .map(|known| known.same_place(location))
            .unwrap_or(false)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All locations in registration order
    pub fn all(&self) -> &[Arc<Location>] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

// Entity Models
// Static reference data shared by every stage of a run

pub mod location;

pub use location::{Location, LocationRegistry, CITY_CENTER};

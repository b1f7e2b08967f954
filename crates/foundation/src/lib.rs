//! Primitives shared by the tour crates: virtual time, typed ids, generation
//! tokens and geodesy. No third-party dependencies.

pub mod handles;
pub mod ids;
pub mod math;
pub mod time;

pub use handles::Generation;
pub use ids::IdAllocator;
pub use math::{FixedGeoPoint, GeoPoint};
pub use time::{TimeMs, TimeSpan};

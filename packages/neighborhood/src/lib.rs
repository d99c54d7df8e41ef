#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Winnipeg neighbourhood reference points.
//!
//! The list is embedded at compile time from `data/winnipeg.toml` and
//! parsed once on first use. [`nearest`] labels a coordinate with the
//! closest reference point by squared Euclidean distance in degrees,
//! which is good enough to pick a name at this latitude.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Number of embedded neighbourhoods. Enforced by a test.
#[cfg(test)]
const EXPECTED_NEIGHBORHOOD_COUNT: usize = 19;

const WINNIPEG_TOML: &str = include_str!("../data/winnipeg.toml");

/// A named reference point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighborhood {
    /// Display name.
    pub name: String,
    /// Latitude of the reference point, in degrees.
    pub lat: f64,
    /// Longitude of the reference point, in degrees.
    pub lng: f64,
}

impl Neighborhood {
    /// Squared Euclidean distance to `(lat, lng)` in degrees.
    #[must_use]
    pub fn distance_sq(&self, lat: f64, lng: f64) -> f64 {
        let dlat = lat - self.lat;
        let dlng = lng - self.lng;
        dlat.mul_add(dlat, dlng * dlng)
    }
}

#[derive(Deserialize)]
struct NeighborhoodFile {
    neighborhood: Vec<Neighborhood>,
}

static NEIGHBORHOODS: LazyLock<Vec<Neighborhood>> = LazyLock::new(|| {
    toml::de::from_str::<NeighborhoodFile>(WINNIPEG_TOML)
        .map(|file| file.neighborhood)
        .unwrap_or_else(|e| panic!("Failed to parse embedded neighbourhood list: {e}"))
});

/// Returns every embedded neighbourhood, in file order.
///
/// # Panics
///
/// Panics if the embedded TOML fails to parse. It is a compile-time
/// constant, so a failure is a development error caught by the tests.
#[must_use]
pub fn all() -> &'static [Neighborhood] {
    &NEIGHBORHOODS
}

/// Returns the neighbourhood closest to `(lat, lng)`. Ties go to the
/// entry listed first. Non-finite coordinates match nothing.
#[must_use]
pub fn nearest(lat: f64, lng: f64) -> Option<&'static Neighborhood> {
    if !lat.is_finite() || !lng.is_finite() {
        return None;
    }

    all().iter().fold(None, |best: Option<(&Neighborhood, f64)>, n| {
        let dist = n.distance_sq(lat, lng);
        match best {
            Some((_, best_dist)) if best_dist <= dist => best,
            _ => Some((n, dist)),
        }
    })
    .map(|(n, _)| n)
}

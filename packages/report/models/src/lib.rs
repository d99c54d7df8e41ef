#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report domain types, intensity levels, and submission validation.
//!
//! This crate defines the canonical shape of a worm sighting as it moves
//! through the system: the raw [`ReportSubmission`] posted by a resident,
//! the validated [`NewReport`] handed to the store, the [`Intensity`] scale,
//! and the fixed geography ([`CITY_BOUNDS`]) and calendar
//! ([`SeasonWindow`]) that every other crate agrees on.

use chrono::{DateTime, Datelike as _, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Maximum length of the free-text notes on a report, in characters.
pub const MAX_NOTES_LENGTH: usize = 500;

/// How long a report stays active after it is created.
pub const REPORT_RETENTION_HOURS: i64 = 48;

/// First month (inclusive, 1-indexed) of the worm season.
pub const SEASON_START_MONTH: u32 = 5;

/// Last month (inclusive, 1-indexed) of the worm season.
pub const SEASON_END_MONTH: u32 = 7;

/// Returns the retention period applied to new reports.
#[must_use]
pub fn report_retention() -> TimeDelta {
    TimeDelta::hours(REPORT_RETENTION_HOURS)
}

/// How bad the worms are at a location, from 1 (a few stragglers) to 5
/// (plague level).
///
/// Serialized over the wire as its plain numeric value.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(try_from = "u8", into = "u8")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Intensity {
    /// Level 1: Just a handful, easy to ignore
    Stragglers = 1,
    /// Level 2: You noticed them. They noticed you.
    Noticeable = 2,
    /// Level 3: Unpleasant. Avoid if possible.
    GettingGross = 3,
    /// Level 4: Stay away. Seriously.
    FullInfestation = 4,
    /// Level 5: Do not go outside.
    Plague = 5,
}

impl Intensity {
    /// The highest intensity level, used to normalize weights.
    pub const MAX: Self = Self::Plague;

    /// Returns the numeric value of this intensity level.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Creates an intensity level from a numeric value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-5.
    pub const fn from_value(value: u8) -> Result<Self, InvalidIntensityError> {
        match value {
            1 => Ok(Self::Stragglers),
            2 => Ok(Self::Noticeable),
            3 => Ok(Self::GettingGross),
            4 => Ok(Self::FullInfestation),
            5 => Ok(Self::Plague),
            _ => Err(InvalidIntensityError { value }),
        }
    }

    /// Returns all variants of this enum, lowest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Stragglers,
            Self::Noticeable,
            Self::GettingGross,
            Self::FullInfestation,
            Self::Plague,
        ]
    }

    /// Short human-readable label shown next to the level picker.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Stragglers => "A Few Stragglers",
            Self::Noticeable => "Noticeable",
            Self::GettingGross => "Getting Gross",
            Self::FullInfestation => "Full Infestation",
            Self::Plague => "Plague Level",
        }
    }

    /// Emoji used to render this level.
    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Stragglers => "🐛",
            Self::Noticeable => "🐛🐛",
            Self::GettingGross => "😬",
            Self::FullInfestation => "😨",
            Self::Plague => "☠️",
        }
    }

    /// One-line description of what this level means on the ground.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Stragglers => "Just a handful, easy to ignore",
            Self::Noticeable => "You noticed them. They noticed you.",
            Self::GettingGross => "Unpleasant. Avoid if possible.",
            Self::FullInfestation => "Stay away. Seriously.",
            Self::Plague => "Do not go outside.",
        }
    }

    /// Normalized weight in `(0, 1]` for heatmap rendering.
    #[must_use]
    pub fn weight(self) -> f64 {
        f64::from(self.value()) / f64::from(Self::MAX.value())
    }
}

impl From<Intensity> for u8 {
    fn from(value: Intensity) -> Self {
        value.value()
    }
}

impl TryFrom<u8> for Intensity {
    type Error = InvalidIntensityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Error returned when attempting to create an [`Intensity`] from an invalid
/// numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidIntensityError {
    /// The invalid intensity value that was provided.
    pub value: u8,
}

impl std::fmt::Display for InvalidIntensityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid intensity value {}: expected 1-5", self.value)
    }
}

impl std::error::Error for InvalidIntensityError {}

/// An inclusive latitude/longitude rectangle in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    /// Southern latitude boundary.
    pub lat_min: f64,
    /// Northern latitude boundary.
    pub lat_max: f64,
    /// Western longitude boundary.
    pub lng_min: f64,
    /// Eastern longitude boundary.
    pub lng_max: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given edges.
    #[must_use]
    pub const fn new(lat_min: f64, lat_max: f64, lng_min: f64, lng_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lng_min,
            lng_max,
        }
    }

    /// Whether the point lies inside the box, edges included.
    ///
    /// `NaN` coordinates are never contained.
    #[must_use]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&lat) && (self.lng_min..=self.lng_max).contains(&lng)
    }
}

/// Geographic limits of the Winnipeg metro area. Submissions outside this
/// box are rejected.
pub const CITY_BOUNDS: BoundingBox = BoundingBox::new(49.75, 50.05, -97.35, -96.95);

/// A sighting as posted by a resident, before any validation.
///
/// Every field is optional so that missing values can be reported as such
/// instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSubmission {
    /// Latitude in degrees.
    pub lat: Option<f64>,
    /// Longitude in degrees.
    pub lng: Option<f64>,
    /// Intensity level. Accepted as any JSON number so that non-integers
    /// produce a validation error rather than a parse error.
    pub intensity: Option<f64>,
    /// Free-text notes.
    pub notes: Option<String>,
}

impl ReportSubmission {
    /// Validates the submission against the intensity scale, the city
    /// bounds, and the notes length cap.
    ///
    /// Zero is a present value; only `None` counts as missing. Empty notes
    /// are normalized to `None`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ReportValidationError`] encountered.
    pub fn validate(self) -> Result<NewReport, ReportValidationError> {
        let (Some(lat), Some(lng), Some(raw_intensity)) = (self.lat, self.lng, self.intensity)
        else {
            return Err(ReportValidationError::MissingFields);
        };

        let intensity = parse_intensity(raw_intensity)?;

        if !CITY_BOUNDS.contains(lat, lng) {
            return Err(ReportValidationError::OutsideCity { lat, lng });
        }

        let notes = self.notes.filter(|n| !n.is_empty());

        if let Some(notes) = &notes {
            let length = notes.chars().count();
            if length > MAX_NOTES_LENGTH {
                return Err(ReportValidationError::NotesTooLong { length });
            }
        }

        Ok(NewReport {
            lat,
            lng,
            intensity,
            notes,
        })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_intensity(raw: f64) -> Result<Intensity, ReportValidationError> {
    if !raw.is_finite() || raw < 1.0 || raw > f64::from(Intensity::MAX.value()) {
        return Err(ReportValidationError::IntensityOutOfRange);
    }
    if raw.fract() != 0.0 {
        return Err(ReportValidationError::IntensityNotWhole);
    }

    Intensity::from_value(raw as u8).map_err(|_| ReportValidationError::IntensityOutOfRange)
}

/// A validated sighting, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReport {
    /// Latitude in degrees, inside [`CITY_BOUNDS`].
    pub lat: f64,
    /// Longitude in degrees, inside [`CITY_BOUNDS`].
    pub lng: f64,
    /// Intensity level.
    pub intensity: Intensity,
    /// Non-empty notes of at most [`MAX_NOTES_LENGTH`] characters.
    pub notes: Option<String>,
}

/// Reasons a [`ReportSubmission`] is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReportValidationError {
    /// One of `lat`, `lng` or `intensity` was absent.
    #[error("lat, lng, and intensity are required")]
    MissingFields,

    /// Intensity below 1 or above 5.
    #[error("intensity must be between 1 and 5")]
    IntensityOutOfRange,

    /// Intensity in range but fractional.
    #[error("intensity must be a whole number between 1 and 5")]
    IntensityNotWhole,

    /// Coordinates outside [`CITY_BOUNDS`].
    #[error("Report location must be within Winnipeg")]
    OutsideCity {
        /// Submitted latitude.
        lat: f64,
        /// Submitted longitude.
        lng: f64,
    },

    /// Notes longer than [`MAX_NOTES_LENGTH`].
    #[error("Notes must be {MAX_NOTES_LENGTH} characters or less")]
    NotesTooLong {
        /// Submitted length in characters.
        length: usize,
    },
}

/// Whether a 1-indexed calendar month falls in the worm season
/// (May through July).
#[must_use]
pub const fn is_season_month(month: u32) -> bool {
    month >= SEASON_START_MONTH && month <= SEASON_END_MONTH
}

/// A half-open `[start, end)` UTC time range covering one worm season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonWindow {
    /// May 1, 00:00 UTC.
    pub start: DateTime<Utc>,
    /// August 1, 00:00 UTC.
    pub end: DateTime<Utc>,
}

impl SeasonWindow {
    /// The season of the given calendar year.
    #[must_use]
    pub fn for_year(year: i32) -> Self {
        Self {
            start: first_of_month(year, SEASON_START_MONTH),
            end: first_of_month(year, SEASON_END_MONTH + 1),
        }
    }

    /// The season of the calendar year before `now`.
    #[must_use]
    pub fn previous(now: DateTime<Utc>) -> Self {
        Self::for_year(now.year() - 1)
    }

    /// Whether `at` falls inside the window.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

fn first_of_month(year: i32, month: u32) -> DateTime<Utc> {
    let date = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default();
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

//! Cinema entity model and DTOs.
//!
//! A cinema's location is an optional latitude/longitude pair. It is stored
//! as two nullable columns that are either both set or both empty.

use marquee_core::types::{DbId, Timestamp};
use marquee_core::validation::{
    max_length, required, FieldViolation, ValidationErrors, Validator,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Maximum length of a cinema name.
pub const CINEMA_NAME_MAX: usize = 75;

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A row from the `cinemas` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Cinema {
    pub id: DbId,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Cinema {
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

/// DTO for creating or updating a cinema.
#[derive(Debug, Clone, Deserialize)]
pub struct CinemaInput {
    #[serde(default)]
    pub name: String,
    pub location: Option<GeoPoint>,
}

impl CinemaInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let name = Some(self.name.as_str());
        Validator::new()
            .check(required("name", name))
            .check(max_length("name", name, CINEMA_NAME_MAX))
            .check(self.location.and_then(coordinates_in_range))
            .finish()
    }
}

fn coordinates_in_range(point: GeoPoint) -> Option<FieldViolation> {
    let valid = (-90.0..=90.0).contains(&point.latitude)
        && (-180.0..=180.0).contains(&point.longitude);
    (!valid).then(|| {
        FieldViolation::new(
            "location",
            "Latitude must be within [-90, 90] and longitude within [-180, 180]",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, location: Option<(f64, f64)>) -> CinemaInput {
        CinemaInput {
            name: name.to_string(),
            location: location.map(|(latitude, longitude)| GeoPoint {
                latitude,
                longitude,
            }),
        }
    }

    #[test]
    fn location_is_optional() {
        assert!(input("Downtown", None).validate().is_ok());
    }

    #[test]
    fn out_of_range_location_is_rejected() {
        let err = input("Downtown", Some((91.0, 0.0))).validate().unwrap_err();
        assert!(err.has_field("location"));
    }

    #[test]
    fn long_name_is_rejected() {
        let err = input(&"C".repeat(CINEMA_NAME_MAX + 1), None)
            .validate()
            .unwrap_err();
        assert!(err.has_field("name"));
    }
}

use std::{error::Error, fmt};

use schemars::{
    gen::SchemaGenerator,
    schema::{InstanceType, Schema, SchemaObject},
    JsonSchema,
};
use serde::{de, Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the earth's surface. Serialized as a `[longitude, latitude]`
/// array in GeoJSON order at every boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    longitude: f64,
    latitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidCoordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl fmt::Display for InvalidCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "coordinate ({}, {}) is outside the valid longitude/latitude range",
            self.longitude, self.latitude
        )
    }
}

impl Error for InvalidCoordinate {}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, InvalidCoordinate> {
        if !(-180.0..=180.0).contains(&longitude)
            || !(-90.0..=90.0).contains(&latitude)
            || longitude.is_nan()
            || latitude.is_nan()
        {
            return Err(InvalidCoordinate {
                longitude,
                latitude,
            });
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Great-circle distance in kilometers, computed with the haversine
    /// formula over the mean earth radius.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let lat1_rad = self.latitude.to_radians();
        let lat2_rad = other.latitude.to_radians();

        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }
}

impl Serialize for GeoPoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // GeoJSON order: longitude first.
        (self.longitude, self.latitude).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GeoPoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (longitude, latitude) = <(f64, f64)>::deserialize(deserializer)?;
        GeoPoint::new(longitude, latitude).map_err(de::Error::custom)
    }
}

impl JsonSchema for GeoPoint {
    fn schema_name() -> String {
        "GeoPoint".to_owned()
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::Array.into()),
            format: Some("[longitude, latitude]".to_owned()),
            ..Default::default()
        }
        .into()
    }
}

/// The minimal axis-aligned box covering a set of points. Exact extents,
/// display padding is up to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_longitude: f64,
    pub min_latitude: f64,
    pub max_longitude: f64,
    pub max_latitude: f64,
}

impl BoundingBox {
    /// Fits a box around all `points` plus an optional reference point.
    /// Returns `None` when there is nothing to fit.
    pub fn fit<'a, I>(points: I, reference: Option<&'a GeoPoint>) -> Option<Self>
    where
        I: IntoIterator<Item = &'a GeoPoint>,
    {
        let mut bounds: Option<Self> = None;
        for point in points.into_iter().chain(reference) {
            match bounds.as_mut() {
                Some(bounds) => bounds.extend(point),
                None => bounds = Some(Self::around(point)),
            }
        }
        bounds
    }

    fn around(point: &GeoPoint) -> Self {
        Self {
            min_longitude: point.longitude(),
            min_latitude: point.latitude(),
            max_longitude: point.longitude(),
            max_latitude: point.latitude(),
        }
    }

    fn extend(&mut self, point: &GeoPoint) {
        self.min_longitude = self.min_longitude.min(point.longitude());
        self.min_latitude = self.min_latitude.min(point.latitude());
        self.max_longitude = self.max_longitude.max(point.longitude());
        self.max_latitude = self.max_latitude.max(point.latitude());
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_longitude..=self.max_longitude).contains(&point.longitude())
            && (self.min_latitude..=self.max_latitude).contains(&point.latitude())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(longitude: f64, latitude: f64) -> GeoPoint {
        GeoPoint::new(longitude, latitude).unwrap()
    }

    #[test]
    fn distance_is_symmetric() {
        let a = point(13.5169, 39.45389);
        let b = point(10.1228, 54.3233);
        assert!((a.distance_km(&b) - b.distance_km(&a)).abs() < 1e-9);
    }

    #[test]
    fn distance_to_self_is_zero() {
        let a = point(13.5169, 39.45389);
        assert_eq!(a.distance_km(&a), 0.0);
    }

    #[test]
    fn one_degree_of_latitude() {
        let a = point(0.0, 0.0);
        let b = point(0.0, 1.0);
        let distance = a.distance_km(&b);
        assert!((distance - 111.19).abs() < 0.5, "got {distance}");
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(GeoPoint::new(181.0, 0.0).is_err());
        assert!(GeoPoint::new(-181.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, 91.0).is_err());
        assert!(GeoPoint::new(0.0, -91.0).is_err());
        assert!(GeoPoint::new(180.0, 90.0).is_ok());
    }

    #[test]
    fn serializes_longitude_first() {
        let json = serde_json::to_string(&point(13.5, 52.4)).unwrap();
        assert_eq!(json, "[13.5,52.4]");
        let back: GeoPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, point(13.5, 52.4));
    }

    #[test]
    fn deserialization_checks_the_invariant() {
        assert!(serde_json::from_str::<GeoPoint>("[200.0,0.0]").is_err());
    }

    #[test]
    fn bounds_contain_every_input_point() {
        let points = vec![
            point(10.0, 54.0),
            point(10.5, 53.8),
            point(9.9, 54.4),
        ];
        let bounds = BoundingBox::fit(points.iter(), None).unwrap();
        for p in &points {
            assert!(bounds.contains(p));
        }
    }

    #[test]
    fn bounds_include_the_reference_point() {
        let points = vec![point(10.0, 54.0)];
        let reference = point(11.0, 53.0);
        let bounds = BoundingBox::fit(points.iter(), Some(&reference)).unwrap();
        assert!(bounds.contains(&reference));
    }

    #[test]
    fn empty_input_has_no_bounds() {
        assert_eq!(BoundingBox::fit(std::iter::empty(), None), None);
    }
}

use std::fmt::Debug;

use model::{
    blood_bank::BloodBank, donor::Donor, institution::MedicalInstitution,
    map::MapPoint, WithDistance, WithId,
};
use serde::Serialize;
use utility::{
    geo::GeoPoint,
    id::HasId,
};

/// Anything with an optional position on the map.
pub trait Locate {
    fn position(&self) -> Option<GeoPoint>;
}

impl Locate for Donor {
    fn position(&self) -> Option<GeoPoint> {
        self.location
    }
}

impl Locate for BloodBank {
    fn position(&self) -> Option<GeoPoint> {
        self.location
    }
}

impl Locate for MedicalInstitution {
    fn position(&self) -> Option<GeoPoint> {
        self.location
    }
}

impl Locate for MapPoint {
    fn position(&self) -> Option<GeoPoint> {
        self.location
    }
}

impl<T> Locate for WithId<T>
where
    T: Locate + HasId,
    T::IdType: Debug + Clone + Serialize,
{
    fn position(&self) -> Option<GeoPoint> {
        self.content.position()
    }
}

/// Keeps entities within `radius_km` of `center`. Entities without a known
/// position cannot satisfy the predicate and are dropped.
pub fn filter_within_radius<T: Locate>(
    entities: Vec<T>,
    center: &GeoPoint,
    radius_km: f64,
) -> Vec<T> {
    entities
        .into_iter()
        .filter(|entity| {
            entity
                .position()
                .map(|position| center.distance_km(&position) <= radius_km)
                .unwrap_or(false)
        })
        .collect()
}

/// Stable ascending sort by distance from `center`. Ties keep their original
/// relative order; entities without a position sort last.
pub fn sort_by_distance<T: Locate>(entities: &mut [T], center: &GeoPoint) {
    entities.sort_by(|a, b| {
        let distance_a = a.position().map(|p| center.distance_km(&p));
        let distance_b = b.position().map(|p| center.distance_km(&p));
        match (distance_a, distance_b) {
            (Some(a), Some(b)) => {
                a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
            }
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    });
}

/// Decorates entities with their distance to `center`. Entities without a
/// position are skipped, since there is no distance to report.
pub fn with_distances<T: Locate>(
    entities: Vec<T>,
    center: &GeoPoint,
) -> Vec<WithDistance<T>> {
    entities
        .into_iter()
        .filter_map(|entity| {
            entity
                .position()
                .map(|position| center.distance_km(&position))
                .map(|distance| WithDistance::new(distance, entity))
        })
        .collect()
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::geo::GeoPoint;

use crate::{
    blood_bank::BloodBank,
    donor::{Donor, DonorAvailability},
    institution::MedicalInstitution,
    WithId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Donor,
    BloodBank,
    MedicalInstitution,
    Generic,
}

// Marker colors per entity kind and donor availability.
pub const COLOR_DONOR_AVAILABLE: &str = "#2e7d32";
pub const COLOR_DONOR_ELIGIBLE: &str = "#f9a825";
pub const COLOR_DONOR_UNAVAILABLE: &str = "#9e9e9e";
pub const COLOR_BLOOD_BANK: &str = "#c62828";
pub const COLOR_BLOOD_BANK_EMERGENCY: &str = "#ff1744";
pub const COLOR_INSTITUTION: &str = "#1565c0";
pub const COLOR_GENERIC: &str = "#546e7a";

/// A uniform, render-ready representation of a geo-tagged entity. Built
/// fresh from query results on every pass and never mutated afterwards.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MapPoint {
    pub id: String,
    pub title: String,
    pub kind: EntityKind,
    /// Absent when the source record carries no coordinate. Consumers
    /// decide whether to omit such points; no placeholder is invented.
    pub location: Option<GeoPoint>,
    pub color: String,
    pub description: String,
}

impl MapPoint {
    pub fn from_donor(donor: &WithId<Donor>, distance_km: Option<f64>) -> Self {
        let color = match donor.content.availability() {
            DonorAvailability::Available => COLOR_DONOR_AVAILABLE,
            DonorAvailability::EligibleNoAlerts => COLOR_DONOR_ELIGIBLE,
            DonorAvailability::Unavailable => COLOR_DONOR_UNAVAILABLE,
        };
        let availability = match donor.content.availability() {
            DonorAvailability::Available => "available",
            DonorAvailability::EligibleNoAlerts => "eligible, no alerts",
            DonorAvailability::Unavailable => "unavailable",
        };
        let description = format!(
            "{} ({})",
            donor.content.blood_group, availability
        );
        Self {
            id: donor.id.raw(),
            title: donor.content.name.clone(),
            kind: EntityKind::Donor,
            location: donor.content.location,
            color: color.to_owned(),
            description: append_distance(description, distance_km),
        }
    }

    pub fn from_blood_bank(
        bank: &WithId<BloodBank>,
        distance_km: Option<f64>,
    ) -> Self {
        let color = if bank.content.emergency_need {
            COLOR_BLOOD_BANK_EMERGENCY
        } else {
            COLOR_BLOOD_BANK
        };
        let mut description = bank.content.address.clone();
        if bank.content.emergency_need {
            description.push_str(" (urgent need for donations)");
        }
        Self {
            id: bank.id.raw(),
            title: bank.content.name.clone(),
            kind: EntityKind::BloodBank,
            location: bank.content.location,
            color: color.to_owned(),
            description: append_distance(description, distance_km),
        }
    }

    pub fn from_institution(
        institution: &WithId<MedicalInstitution>,
        distance_km: Option<f64>,
    ) -> Self {
        let description = institution
            .content
            .address
            .clone()
            .unwrap_or_default();
        Self {
            id: institution.id.raw(),
            title: institution.content.name.clone(),
            kind: EntityKind::MedicalInstitution,
            location: institution.content.location,
            color: COLOR_INSTITUTION.to_owned(),
            description: append_distance(description, distance_km),
        }
    }
}

/// Meters below one kilometer, kilometers with one decimal above.
pub fn format_distance(distance_km: f64) -> String {
    let meters = (distance_km * 1000.0).round();
    if meters < 1000.0 {
        format!("{}m", meters as i64)
    } else {
        format!("{:.1}km", distance_km)
    }
}

fn append_distance(description: String, distance_km: Option<f64>) -> String {
    match distance_km {
        Some(distance) if description.is_empty() => format_distance(distance),
        Some(distance) => {
            format!("{}, {}", description, format_distance(distance))
        }
        None => description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExampleData;
    use utility::id::Id;

    #[test]
    fn distance_formatting_switches_at_one_kilometer() {
        assert_eq!(format_distance(0.0), "0m");
        assert_eq!(format_distance(0.25), "250m");
        assert_eq!(format_distance(0.9994), "999m");
        // rounding must not produce "1000m"
        assert_eq!(format_distance(0.9996), "1.0km");
        assert_eq!(format_distance(1.0), "1.0km");
        assert_eq!(format_distance(12.34), "12.3km");
    }

    #[test]
    fn donor_color_follows_availability() {
        let mut donor = Donor::example_data();
        let point = MapPoint::from_donor(
            &WithId::new(Id::new("donor-1".to_owned()), donor.clone()),
            None,
        );
        assert_eq!(point.color, COLOR_DONOR_AVAILABLE);

        donor.receive_donation_alerts = false;
        let point = MapPoint::from_donor(
            &WithId::new(Id::new("donor-1".to_owned()), donor.clone()),
            None,
        );
        assert_eq!(point.color, COLOR_DONOR_ELIGIBLE);

        donor.is_eligible = false;
        let point = MapPoint::from_donor(
            &WithId::new(Id::new("donor-1".to_owned()), donor),
            None,
        );
        assert_eq!(point.color, COLOR_DONOR_UNAVAILABLE);
    }

    #[test]
    fn emergency_bank_gets_the_emergency_color() {
        let mut bank = BloodBank::example_data();
        bank.emergency_need = true;
        let point = MapPoint::from_blood_bank(
            &WithId::new(Id::new("bank-1".to_owned()), bank),
            Some(2.5),
        );
        assert_eq!(point.color, COLOR_BLOOD_BANK_EMERGENCY);
        assert!(point.description.ends_with("2.5km"));
    }

    #[test]
    fn missing_location_stays_missing() {
        let mut donor = Donor::example_data();
        donor.location = None;
        let point = MapPoint::from_donor(
            &WithId::new(Id::new("donor-1".to_owned()), donor),
            None,
        );
        assert!(point.location.is_none());
    }
}

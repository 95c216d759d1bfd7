use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::{geo::GeoPoint, id::HasId};

use crate::{blood::BloodGroup, ExampleData};

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    pub name: String,
    pub blood_group: BloodGroup,
    pub is_eligible: bool,
    pub receive_donation_alerts: bool,
    /// Absent when the donor has not shared a position. An absent location
    /// is kept absent, never substituted with a placeholder coordinate.
    pub location: Option<GeoPoint>,
    pub last_donation_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// The one place where donor availability is classified. Map coloring and
/// alert targeting both go through this, so the rule cannot drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DonorAvailability {
    /// Eligible and opted into donation alerts.
    Available,
    /// Eligible, but not reachable through alerts.
    EligibleNoAlerts,
    Unavailable,
}

impl Donor {
    pub fn availability(&self) -> DonorAvailability {
        if !self.is_eligible {
            DonorAvailability::Unavailable
        } else if self.receive_donation_alerts {
            DonorAvailability::Available
        } else {
            DonorAvailability::EligibleNoAlerts
        }
    }
}

impl HasId for Donor {
    type IdType = String;
}

impl ExampleData for Donor {
    fn example_data() -> Self {
        Donor {
            name: "Jona Petersen".to_owned(),
            blood_group: BloodGroup {
                blood_type: crate::blood::BloodType::O,
                rh_factor: crate::blood::RhFactor::Negative,
            },
            is_eligible: true,
            receive_donation_alerts: true,
            location: GeoPoint::new(10.1228, 54.3233).ok(),
            last_donation_date: None,
            phone: None,
            email: Some("jona.petersen@example.com".to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_is_three_way() {
        let mut donor = Donor::example_data();
        assert_eq!(donor.availability(), DonorAvailability::Available);

        donor.receive_donation_alerts = false;
        assert_eq!(donor.availability(), DonorAvailability::EligibleNoAlerts);

        donor.is_eligible = false;
        assert_eq!(donor.availability(), DonorAvailability::Unavailable);

        // opting into alerts does not override ineligibility
        donor.receive_donation_alerts = true;
        assert_eq!(donor.availability(), DonorAvailability::Unavailable);
    }
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::{geo::GeoPoint, id::HasId};

use crate::ExampleData;

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BloodBank {
    pub name: String,
    pub address: String,
    pub location: Option<GeoPoint>,
    /// Set when the bank has an urgent need for donations.
    pub emergency_need: bool,
    pub operating_hours: Option<String>,
    pub phone: Option<String>,
}

impl HasId for BloodBank {
    type IdType = String;
}

impl ExampleData for BloodBank {
    fn example_data() -> Self {
        BloodBank {
            name: "Blutspendezentrale Kiel".to_owned(),
            address: "Hospitalstraße 42, 24105 Kiel".to_owned(),
            location: GeoPoint::new(10.1356, 54.3256).ok(),
            emergency_need: false,
            operating_hours: Some("Mo-Fr 08:00-18:00".to_owned()),
            phone: None,
        }
    }
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::{geo::GeoPoint, id::HasId};

use crate::ExampleData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstitutionCategory {
    Hospital,
    Clinic,
    Laboratory,
    Other,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicalInstitution {
    pub name: String,
    pub category: InstitutionCategory,
    pub address: Option<String>,
    pub location: Option<GeoPoint>,
}

impl HasId for MedicalInstitution {
    type IdType = String;
}

impl ExampleData for MedicalInstitution {
    fn example_data() -> Self {
        MedicalInstitution {
            name: "Städtisches Krankenhaus Kiel".to_owned(),
            category: InstitutionCategory::Hospital,
            address: Some("Chemnitzstraße 33, 24116 Kiel".to_owned()),
            location: GeoPoint::new(10.1081, 54.3289).ok(),
        }
    }
}

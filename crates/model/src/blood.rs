use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ABO blood group, transmitted as the literals `A`, `B`, `AB`, `O`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum BloodType {
    A,
    B,
    #[serde(rename = "AB")]
    Ab,
    O,
}

/// Rhesus factor, transmitted as `POSITIVE` / `NEGATIVE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RhFactor {
    Positive,
    Negative,
}

/// A full blood group, displayed in the usual short form ("AB-", "O+").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BloodGroup {
    pub blood_type: BloodType,
    pub rh_factor: RhFactor,
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let blood_type = match self.blood_type {
            BloodType::A => "A",
            BloodType::B => "B",
            BloodType::Ab => "AB",
            BloodType::O => "O",
        };
        let rh_factor = match self.rh_factor {
            RhFactor::Positive => "+",
            RhFactor::Negative => "-",
        };
        write!(f, "{}{}", blood_type, rh_factor)
    }
}

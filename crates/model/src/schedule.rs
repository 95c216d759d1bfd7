use std::fmt;

use chrono::{DateTime, Local, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

use crate::{
    blood::BloodGroup,
    blood_bank::BloodBank,
    donor::Donor,
    ExampleData,
};

/// The fixed one-hour booking windows of a service day.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum TimeSlot {
    #[serde(rename = "08:00-09:00")]
    From08,
    #[serde(rename = "09:00-10:00")]
    From09,
    #[serde(rename = "10:00-11:00")]
    From10,
    #[serde(rename = "11:00-12:00")]
    From11,
    #[serde(rename = "12:00-13:00")]
    From12,
    #[serde(rename = "13:00-14:00")]
    From13,
    #[serde(rename = "14:00-15:00")]
    From14,
    #[serde(rename = "15:00-16:00")]
    From15,
    #[serde(rename = "16:00-17:00")]
    From16,
    #[serde(rename = "17:00-18:00")]
    From17,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 10] = [
        TimeSlot::From08,
        TimeSlot::From09,
        TimeSlot::From10,
        TimeSlot::From11,
        TimeSlot::From12,
        TimeSlot::From13,
        TimeSlot::From14,
        TimeSlot::From15,
        TimeSlot::From16,
        TimeSlot::From17,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimeSlot::From08 => "08:00-09:00",
            TimeSlot::From09 => "09:00-10:00",
            TimeSlot::From10 => "10:00-11:00",
            TimeSlot::From11 => "11:00-12:00",
            TimeSlot::From12 => "12:00-13:00",
            TimeSlot::From13 => "13:00-14:00",
            TimeSlot::From14 => "14:00-15:00",
            TimeSlot::From15 => "15:00-16:00",
            TimeSlot::From16 => "16:00-17:00",
            TimeSlot::From17 => "17:00-18:00",
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Scheduled,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl ScheduleStatus {
    /// Terminal states permit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScheduleStatus::Cancelled
                | ScheduleStatus::Completed
                | ScheduleStatus::NoShow
        )
    }
}

/// Reminder bookkeeping, independent of the schedule status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderStatus {
    NotSent,
    Sent,
    Failed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DonationType {
    WholeBlood,
    Plasma,
    Platelets,
    DoubleRedCells,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactMethod {
    Email,
    Sms,
    Phone,
}

/// Denormalized donor data carried on the schedule for display.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DonorRef {
    pub id: Id<Donor>,
    pub name: String,
    pub blood_group: BloodGroup,
}

/// Denormalized blood bank data carried on the schedule for display.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BloodBankRef {
    pub id: Id<BloodBank>,
    pub name: String,
    pub address: String,
}

/// Marker for completed donation records, which live outside this core.
#[derive(Debug, Clone, JsonSchema)]
pub struct Donation;

impl HasId for Donation {
    type IdType = String;
}

/// The appointment aggregate. Mutated only through the lifecycle operations
/// in `donation::lifecycle`; the status timestamps are stamped exactly once,
/// at the transition into the respective state.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DonationSchedule {
    pub donor: DonorRef,
    pub blood_bank: BloodBankRef,
    pub scheduled_date: NaiveDate,
    pub time_slot: TimeSlot,
    pub status: ScheduleStatus,
    pub reminder_status: ReminderStatus,

    pub donation_type: DonationType,
    pub purpose: Option<String>,
    pub contact_method: Option<ContactMethod>,
    pub special_instructions: Option<String>,
    pub notes: Option<String>,
    pub estimated_duration_minutes: Option<u32>,
    pub recurring: bool,
    pub recurrence_pattern: Option<String>,
    pub scheduled_by: Option<String>,
    pub send_reminders: bool,

    pub confirmed_at: Option<DateTime<Local>>,
    pub cancelled_at: Option<DateTime<Local>>,
    pub cancellation_reason: Option<String>,
    /// Set exactly when the schedule reaches `COMPLETED`.
    pub completed_donation: Option<Id<Donation>>,
}

impl DonationSchedule {
    /// Whether this schedule holds the given slot against new bookings.
    /// Terminal schedules release their slot.
    pub fn occupies(
        &self,
        blood_bank: &Id<BloodBank>,
        date: NaiveDate,
        slot: TimeSlot,
    ) -> bool {
        !self.status.is_terminal()
            && self.blood_bank.id == *blood_bank
            && self.scheduled_date == date
            && self.time_slot == slot
    }
}

impl HasId for DonationSchedule {
    type IdType = String;
}

impl ExampleData for DonationSchedule {
    fn example_data() -> Self {
        DonationSchedule {
            donor: DonorRef {
                id: Id::new("donor-1".to_owned()),
                name: "Jona Petersen".to_owned(),
                blood_group: BloodGroup {
                    blood_type: crate::blood::BloodType::O,
                    rh_factor: crate::blood::RhFactor::Negative,
                },
            },
            blood_bank: BloodBankRef {
                id: Id::new("bank-1".to_owned()),
                name: "Blutspendezentrale Kiel".to_owned(),
                address: "Hospitalstraße 42, 24105 Kiel".to_owned(),
            },
            scheduled_date: NaiveDate::from_ymd_opt(2025, 6, 10)
                .unwrap_or_default(),
            time_slot: TimeSlot::From10,
            status: ScheduleStatus::Scheduled,
            reminder_status: ReminderStatus::NotSent,
            donation_type: DonationType::WholeBlood,
            purpose: None,
            contact_method: Some(ContactMethod::Email),
            special_instructions: None,
            notes: None,
            estimated_duration_minutes: Some(45),
            recurring: false,
            recurrence_pattern: None,
            scheduled_by: Some("donor-1".to_owned()),
            send_reminders: true,
            confirmed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            completed_donation: None,
        }
    }
}

use std::{error, fmt::Debug, result};

use async_trait::async_trait;
use chrono::NaiveDate;
use model::{
    blood_bank::BloodBank, donor::Donor, institution::MedicalInstitution,
    schedule::DonationSchedule, WithId,
};
use serde::Serialize;
use utility::id::{HasId, Id};

#[derive(Debug)]
pub enum DatabaseError {
    NotFound,
    /// The `(bloodBank, scheduledDate, timeSlot)` uniqueness invariant would
    /// be violated. Checked atomically by the store; the client-side
    /// availability pre-check is only an optimization.
    SlotConflict,
    Other(Box<dyn error::Error + Send + Sync>),
}

impl std::fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseError::NotFound => write!(f, "not found"),
            DatabaseError::SlotConflict => write!(f, "time slot already booked"),
            DatabaseError::Other(why) => write!(f, "{}", why),
        }
    }
}

impl error::Error for DatabaseError {}

pub type Result<T> = result::Result<T, DatabaseError>;

#[async_trait]
pub trait Repo<T: Serialize + HasId>
where
    <T as HasId>::IdType: Debug + Clone + Serialize,
{
    async fn get(&mut self, id: Id<T>) -> Result<WithId<T>>;
    async fn get_all(&mut self) -> Result<Vec<WithId<T>>>;
    async fn insert(&mut self, element: T) -> Result<WithId<T>>;
    async fn exists(&mut self, id: Id<T>) -> Result<bool>;
}

/// Schedule storage. `insert` (from [`Repo`]) and [`ScheduleRepo::update`]
/// must reject writes that would put two non-terminal schedules into the
/// same `(bloodBank, scheduledDate, timeSlot)`, atomically with respect to
/// concurrent writers. Last-write-wins is not acceptable here.
#[async_trait]
pub trait ScheduleRepo: Repo<DonationSchedule> {
    async fn update(
        &mut self,
        schedule: WithId<DonationSchedule>,
    ) -> Result<WithId<DonationSchedule>>;

    /// All schedules for a blood bank on a date, regardless of status.
    async fn for_blood_bank_on(
        &mut self,
        blood_bank: &Id<BloodBank>,
        date: NaiveDate,
    ) -> Result<Vec<WithId<DonationSchedule>>>;
}

pub trait Database: Clone + Send + Sync + 'static {
    type Ops: Repo<Donor>
        + Repo<BloodBank>
        + Repo<MedicalInstitution>
        + ScheduleRepo
        + Send;

    fn auto(&self) -> Self::Ops;
}

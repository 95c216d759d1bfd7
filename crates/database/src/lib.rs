use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::NaiveDate;
use donation::database::{
    Database, DatabaseError, Repo, Result, ScheduleRepo,
};
use indexmap::IndexMap;
use model::{
    blood_bank::BloodBank, donor::Donor, institution::MedicalInstitution,
    schedule::DonationSchedule, WithId,
};
use utility::id::Id;

pub mod seed;

/// In-memory backing store. This is where the slot uniqueness invariant is
/// actually enforced: every schedule write checks for a conflicting
/// non-terminal schedule while holding the table lock, so of two racing
/// writes exactly one succeeds.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

// Insertion order is kept so listings come back in a stable order.
#[derive(Debug, Default)]
struct Tables {
    donors: IndexMap<String, Donor>,
    blood_banks: IndexMap<String, BloodBank>,
    institutions: IndexMap<String, MedicalInstitution>,
    schedules: IndexMap<String, DonationSchedule>,
    next_id: u64,
}

impl Tables {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn conflicting_schedule(
        &self,
        candidate: &DonationSchedule,
        exclude: Option<&str>,
    ) -> bool {
        !candidate.status.is_terminal()
            && self.schedules.iter().any(|(id, existing)| {
                Some(id.as_str()) != exclude
                    && existing.occupies(
                        &candidate.blood_bank.id,
                        candidate.scheduled_date,
                        candidate.time_slot,
                    )
            })
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Database for MemoryDatabase {
    type Ops = MemoryOps;

    fn auto(&self) -> Self::Ops {
        MemoryOps {
            database: self.clone(),
        }
    }
}

pub struct MemoryOps {
    database: MemoryDatabase,
}

macro_rules! plain_repo {
    ($entity:ty, $table:ident, $prefix:literal) => {
        #[async_trait]
        impl Repo<$entity> for MemoryOps {
            async fn get(&mut self, id: Id<$entity>) -> Result<WithId<$entity>> {
                let tables = self.database.lock();
                tables
                    .$table
                    .get(id.raw_ref::<str>())
                    .cloned()
                    .map(|content| WithId::new(id, content))
                    .ok_or(DatabaseError::NotFound)
            }

            async fn get_all(&mut self) -> Result<Vec<WithId<$entity>>> {
                let tables = self.database.lock();
                Ok(tables
                    .$table
                    .iter()
                    .map(|(id, content)| {
                        WithId::new(Id::new(id.clone()), content.clone())
                    })
                    .collect())
            }

            async fn insert(&mut self, element: $entity) -> Result<WithId<$entity>> {
                let mut tables = self.database.lock();
                let id = tables.next_id($prefix);
                tables.$table.insert(id.clone(), element.clone());
                Ok(WithId::new(Id::new(id), element))
            }

            async fn exists(&mut self, id: Id<$entity>) -> Result<bool> {
                let tables = self.database.lock();
                Ok(tables.$table.contains_key(id.raw_ref::<str>()))
            }
        }
    };
}

plain_repo!(Donor, donors, "donor");
plain_repo!(BloodBank, blood_banks, "bank");
plain_repo!(MedicalInstitution, institutions, "institution");

#[async_trait]
impl Repo<DonationSchedule> for MemoryOps {
    async fn get(
        &mut self,
        id: Id<DonationSchedule>,
    ) -> Result<WithId<DonationSchedule>> {
        let tables = self.database.lock();
        tables
            .schedules
            .get(id.raw_ref::<str>())
            .cloned()
            .map(|content| WithId::new(id, content))
            .ok_or(DatabaseError::NotFound)
    }

    async fn get_all(&mut self) -> Result<Vec<WithId<DonationSchedule>>> {
        let tables = self.database.lock();
        Ok(tables
            .schedules
            .iter()
            .map(|(id, content)| WithId::new(Id::new(id.clone()), content.clone()))
            .collect())
    }

    async fn insert(
        &mut self,
        element: DonationSchedule,
    ) -> Result<WithId<DonationSchedule>> {
        let mut tables = self.database.lock();
        if tables.conflicting_schedule(&element, None) {
            return Err(DatabaseError::SlotConflict);
        }
        let id = tables.next_id("schedule");
        tables.schedules.insert(id.clone(), element.clone());
        Ok(WithId::new(Id::new(id), element))
    }

    async fn exists(&mut self, id: Id<DonationSchedule>) -> Result<bool> {
        let tables = self.database.lock();
        Ok(tables.schedules.contains_key(id.raw_ref::<str>()))
    }
}

#[async_trait]
impl ScheduleRepo for MemoryOps {
    async fn update(
        &mut self,
        schedule: WithId<DonationSchedule>,
    ) -> Result<WithId<DonationSchedule>> {
        let mut tables = self.database.lock();
        if !tables.schedules.contains_key(schedule.id.raw_ref::<str>()) {
            return Err(DatabaseError::NotFound);
        }
        if tables
            .conflicting_schedule(&schedule.content, Some(schedule.id.raw_ref::<str>()))
        {
            return Err(DatabaseError::SlotConflict);
        }
        tables
            .schedules
            .insert(schedule.id.raw(), schedule.content.clone());
        Ok(schedule)
    }

    async fn for_blood_bank_on(
        &mut self,
        blood_bank: &Id<BloodBank>,
        date: NaiveDate,
    ) -> Result<Vec<WithId<DonationSchedule>>> {
        let tables = self.database.lock();
        Ok(tables
            .schedules
            .iter()
            .filter(|(_, schedule)| {
                schedule.blood_bank.id == *blood_bank
                    && schedule.scheduled_date == date
            })
            .map(|(id, content)| WithId::new(Id::new(id.clone()), content.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{schedule::ScheduleStatus, ExampleData};

    fn schedule() -> DonationSchedule {
        DonationSchedule::example_data()
    }

    #[tokio::test]
    async fn second_booking_of_an_occupied_slot_is_rejected() {
        let database = MemoryDatabase::new();
        let mut ops = database.auto();

        Repo::<DonationSchedule>::insert(&mut ops, schedule())
            .await
            .unwrap();
        let second = Repo::<DonationSchedule>::insert(&mut ops, schedule()).await;
        assert!(matches!(second, Err(DatabaseError::SlotConflict)));
    }

    #[tokio::test]
    async fn racing_inserts_admit_exactly_one_winner() {
        let database = MemoryDatabase::new();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let database = database.clone();
                tokio::spawn(async move {
                    Repo::<DonationSchedule>::insert(
                        &mut database.auto(),
                        schedule(),
                    )
                    .await
                })
            })
            .collect();

        let mut accepted = 0;
        let mut conflicts = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(DatabaseError::SlotConflict) => conflicts += 1,
                Err(why) => panic!("unexpected error: {why}"),
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(conflicts, 7);
    }

    #[tokio::test]
    async fn terminal_schedules_do_not_block_the_slot() {
        let database = MemoryDatabase::new();
        let mut ops = database.auto();

        let mut cancelled = schedule();
        cancelled.status = ScheduleStatus::Cancelled;
        Repo::<DonationSchedule>::insert(&mut ops, cancelled)
            .await
            .unwrap();

        // the slot is free again
        Repo::<DonationSchedule>::insert(&mut ops, schedule())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_recheck_catches_a_move_into_an_occupied_slot() {
        let database = MemoryDatabase::new();
        let mut ops = database.auto();

        let first = Repo::<DonationSchedule>::insert(&mut ops, schedule())
            .await
            .unwrap();

        let mut other = schedule();
        other.time_slot = model::schedule::TimeSlot::From14;
        let mut other = Repo::<DonationSchedule>::insert(&mut ops, other)
            .await
            .unwrap();

        // moving onto the first schedule's slot must fail
        other.content.time_slot = first.content.time_slot;
        let moved = ops.update(other.clone()).await;
        assert!(matches!(moved, Err(DatabaseError::SlotConflict)));

        // updating a schedule in place is not a conflict with itself
        other.content.time_slot = model::schedule::TimeSlot::From14;
        other.content.notes = Some("updated".to_owned());
        ops.update(other).await.unwrap();
    }
}

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use log::info;
use model::{
    blood_bank::BloodBank,
    donor::Donor,
    institution::MedicalInstitution,
    map::{EntityKind, MapPoint},
    schedule::{
        BloodBankRef, ContactMethod, Donation, DonationSchedule, DonationType,
        DonorRef, ReminderStatus, ScheduleStatus, TimeSlot,
    },
    WithDistance, WithId,
};
use schemars::JsonSchema;
use serde::Deserialize;
use utility::{
    geo::{BoundingBox, GeoPoint},
    id::Id,
};

use crate::{
    database::{Database, Repo, ScheduleRepo},
    lifecycle::{self, ScheduleEdit},
    proximity, reminder,
    reminder::ReminderDispatcher,
    slots::{self, QuerySequence, SlotAvailability},
    RequestError, RequestResult,
};

fn default_send_reminders() -> bool {
    true
}

/// Everything needed to create a schedule. Donor and blood bank are
/// referenced by id and denormalized onto the schedule on creation.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewSchedule {
    pub donor_id: Id<Donor>,
    pub blood_bank_id: Id<BloodBank>,
    pub scheduled_date: NaiveDate,
    pub time_slot: TimeSlot,
    pub donation_type: DonationType,
    pub purpose: Option<String>,
    pub contact_method: Option<ContactMethod>,
    pub special_instructions: Option<String>,
    pub notes: Option<String>,
    pub estimated_duration_minutes: Option<u32>,
    #[serde(default)]
    pub recurring: bool,
    pub recurrence_pattern: Option<String>,
    pub scheduled_by: Option<String>,
    #[serde(default = "default_send_reminders")]
    pub send_reminders: bool,
}

/// Facade over the backing store: proximity queries, map point conversion
/// and the schedule lifecycle. All outcomes are explicit `RequestResult`s.
#[derive(Clone)]
pub struct Client<D>
where
    D: Database,
{
    database: D,
    reminders: Arc<dyn ReminderDispatcher>,
}

impl<D> Client<D>
where
    D: Database,
{
    pub fn new(database: D, reminders: Arc<dyn ReminderDispatcher>) -> Self {
        Self {
            database,
            reminders,
        }
    }
}

// - entity lookup and proximity search -

impl<D> Client<D>
where
    D: Database,
{
    pub async fn get_donor(&self, id: Id<Donor>) -> RequestResult<WithId<Donor>> {
        Ok(Repo::<Donor>::get(&mut self.database.auto(), id).await?)
    }

    pub async fn get_donors(&self) -> RequestResult<Vec<WithId<Donor>>> {
        Ok(Repo::<Donor>::get_all(&mut self.database.auto()).await?)
    }

    pub async fn get_blood_bank(
        &self,
        id: Id<BloodBank>,
    ) -> RequestResult<WithId<BloodBank>> {
        Ok(Repo::<BloodBank>::get(&mut self.database.auto(), id).await?)
    }

    pub async fn get_blood_banks(&self) -> RequestResult<Vec<WithId<BloodBank>>> {
        Ok(Repo::<BloodBank>::get_all(&mut self.database.auto()).await?)
    }

    pub async fn get_institutions(
        &self,
    ) -> RequestResult<Vec<WithId<MedicalInstitution>>> {
        Ok(Repo::<MedicalInstitution>::get_all(&mut self.database.auto()).await?)
    }

    /// Donors within `radius_km` of `center`, closest first.
    pub async fn nearby_donors(
        &self,
        center: &GeoPoint,
        radius_km: f64,
    ) -> RequestResult<Vec<WithDistance<WithId<Donor>>>> {
        Ok(nearby(self.get_donors().await?, center, radius_km))
    }

    pub async fn nearby_blood_banks(
        &self,
        center: &GeoPoint,
        radius_km: f64,
    ) -> RequestResult<Vec<WithDistance<WithId<BloodBank>>>> {
        Ok(nearby(self.get_blood_banks().await?, center, radius_km))
    }

    pub async fn nearby_institutions(
        &self,
        center: &GeoPoint,
        radius_km: f64,
    ) -> RequestResult<Vec<WithDistance<WithId<MedicalInstitution>>>> {
        Ok(nearby(self.get_institutions().await?, center, radius_km))
    }

    /// Render-ready map points around `center`, plus the viewport bounds
    /// covering them and the center itself. `kind` narrows to one entity
    /// kind; `None` returns all of them.
    pub async fn map_points(
        &self,
        center: &GeoPoint,
        radius_km: f64,
        kind: Option<EntityKind>,
    ) -> RequestResult<(Vec<MapPoint>, Option<BoundingBox>)> {
        let mut points = Vec::new();

        if matches!(kind, None | Some(EntityKind::Donor)) {
            points.extend(
                self.nearby_donors(center, radius_km)
                    .await?
                    .iter()
                    .map(|donor| {
                        MapPoint::from_donor(&donor.content, Some(donor.distance_km))
                    }),
            );
        }
        if matches!(kind, None | Some(EntityKind::BloodBank)) {
            points.extend(
                self.nearby_blood_banks(center, radius_km)
                    .await?
                    .iter()
                    .map(|bank| {
                        MapPoint::from_blood_bank(
                            &bank.content,
                            Some(bank.distance_km),
                        )
                    }),
            );
        }
        if matches!(kind, None | Some(EntityKind::MedicalInstitution)) {
            points.extend(
                self.nearby_institutions(center, radius_km)
                    .await?
                    .iter()
                    .map(|institution| {
                        MapPoint::from_institution(
                            &institution.content,
                            Some(institution.distance_km),
                        )
                    }),
            );
        }

        let bounds = BoundingBox::fit(
            points.iter().filter_map(|point| point.location.as_ref()),
            Some(center),
        );
        Ok((points, bounds))
    }
}

fn nearby<T: proximity::Locate>(
    entities: Vec<T>,
    center: &GeoPoint,
    radius_km: f64,
) -> Vec<WithDistance<T>> {
    let mut within = proximity::filter_within_radius(entities, center, radius_km);
    proximity::sort_by_distance(&mut within, center);
    proximity::with_distances(within, center)
}

// - schedule lifecycle -

impl<D> Client<D>
where
    D: Database,
{
    pub async fn get_schedule(
        &self,
        id: Id<DonationSchedule>,
    ) -> RequestResult<WithId<DonationSchedule>> {
        Ok(Repo::<DonationSchedule>::get(&mut self.database.auto(), id).await?)
    }

    pub async fn schedules_for(
        &self,
        blood_bank: &Id<BloodBank>,
        date: NaiveDate,
    ) -> RequestResult<Vec<WithId<DonationSchedule>>> {
        Ok(self
            .database
            .auto()
            .for_blood_bank_on(blood_bank, date)
            .await?)
    }

    /// Free/taken state of every fixed slot for a blood bank and date.
    pub async fn slot_availability(
        &self,
        blood_bank: &Id<BloodBank>,
        date: NaiveDate,
    ) -> RequestResult<Vec<SlotAvailability>> {
        if !Repo::<BloodBank>::exists(&mut self.database.auto(), blood_bank.clone())
            .await?
        {
            return Err(RequestError::NotFound);
        }
        let schedules = self.schedules_for(blood_bank, date).await?;
        Ok(slots::availability(&schedules))
    }

    /// Availability query for callers that may re-query while an earlier
    /// request is still in flight. The response is dropped when a newer
    /// query was issued in the meantime; only the most recently issued one
    /// may be applied, regardless of completion order.
    pub async fn slot_availability_latest(
        &self,
        sequence: &QuerySequence,
        blood_bank: &Id<BloodBank>,
        date: NaiveDate,
    ) -> RequestResult<Option<Vec<SlotAvailability>>> {
        let ticket = sequence.issue();
        let slots = self.slot_availability(blood_bank, date).await?;
        Ok(sequence.accept(ticket, slots))
    }

    /// Creates a schedule in `SCHEDULED` status. The availability pre-check
    /// here is optimistic; the store re-checks atomically on insert and its
    /// verdict is authoritative.
    pub async fn create_schedule(
        &self,
        request: NewSchedule,
    ) -> RequestResult<WithId<DonationSchedule>> {
        let donor = self.get_donor(request.donor_id.clone()).await?;
        let bank = self.get_blood_bank(request.blood_bank_id.clone()).await?;

        self.ensure_slot_free(
            &request.blood_bank_id,
            request.scheduled_date,
            request.time_slot,
            None,
        )
        .await?;

        let schedule = DonationSchedule {
            donor: DonorRef {
                id: donor.id,
                name: donor.content.name,
                blood_group: donor.content.blood_group,
            },
            blood_bank: BloodBankRef {
                id: bank.id,
                name: bank.content.name,
                address: bank.content.address,
            },
            scheduled_date: request.scheduled_date,
            time_slot: request.time_slot,
            status: ScheduleStatus::Scheduled,
            reminder_status: ReminderStatus::NotSent,
            donation_type: request.donation_type,
            purpose: request.purpose,
            contact_method: request.contact_method,
            special_instructions: request.special_instructions,
            notes: request.notes,
            estimated_duration_minutes: request.estimated_duration_minutes,
            recurring: request.recurring,
            recurrence_pattern: request.recurrence_pattern,
            scheduled_by: request.scheduled_by,
            send_reminders: request.send_reminders,
            confirmed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            completed_donation: None,
        };

        let mut created =
            Repo::<DonationSchedule>::insert(&mut self.database.auto(), schedule)
                .await?;
        info!(
            "created schedule {} for {} at {} {}",
            created.id,
            created.content.donor.name,
            created.content.scheduled_date,
            created.content.time_slot
        );

        self.dispatch_reminder(&mut created).await
    }

    /// Applies field edits. A date/slot change re-runs the availability
    /// check and retriggers reminder dispatch.
    pub async fn edit_schedule(
        &self,
        id: Id<DonationSchedule>,
        edit: ScheduleEdit,
    ) -> RequestResult<WithId<DonationSchedule>> {
        let mut schedule = self.get_schedule(id).await?;
        let outcome = lifecycle::apply_edit(&mut schedule.content, edit)?;

        if outcome.slot_changed {
            self.ensure_slot_free(
                &schedule.content.blood_bank.id,
                schedule.content.scheduled_date,
                schedule.content.time_slot,
                Some(&schedule.id),
            )
            .await?;
        }

        // the reset is part of the edit itself, so it lands in the same
        // store write; dispatch afterwards records SENT/FAILED on top.
        if outcome.reminder_relevant {
            schedule.content.reminder_status = ReminderStatus::NotSent;
        }
        let mut updated = self.database.auto().update(schedule).await?;
        if outcome.reminder_relevant {
            return self.dispatch_reminder(&mut updated).await;
        }
        Ok(updated)
    }

    pub async fn confirm_schedule(
        &self,
        id: Id<DonationSchedule>,
    ) -> RequestResult<WithId<DonationSchedule>> {
        let mut schedule = self.get_schedule(id).await?;
        lifecycle::confirm(&mut schedule.content, Local::now())?;
        Ok(self.database.auto().update(schedule).await?)
    }

    pub async fn cancel_schedule(
        &self,
        id: Id<DonationSchedule>,
        reason: Option<String>,
    ) -> RequestResult<WithId<DonationSchedule>> {
        let mut schedule = self.get_schedule(id).await?;
        lifecycle::cancel(&mut schedule.content, reason, Local::now())?;
        Ok(self.database.auto().update(schedule).await?)
    }

    pub async fn complete_schedule(
        &self,
        id: Id<DonationSchedule>,
        donation: Id<Donation>,
    ) -> RequestResult<WithId<DonationSchedule>> {
        let mut schedule = self.get_schedule(id).await?;
        lifecycle::complete(&mut schedule.content, donation)?;
        Ok(self.database.auto().update(schedule).await?)
    }

    pub async fn mark_no_show(
        &self,
        id: Id<DonationSchedule>,
    ) -> RequestResult<WithId<DonationSchedule>> {
        let mut schedule = self.get_schedule(id).await?;
        lifecycle::mark_no_show(&mut schedule.content)?;
        Ok(self.database.auto().update(schedule).await?)
    }

    async fn ensure_slot_free(
        &self,
        blood_bank: &Id<BloodBank>,
        date: NaiveDate,
        slot: TimeSlot,
        exclude: Option<&Id<DonationSchedule>>,
    ) -> RequestResult<()> {
        let schedules = self.schedules_for(blood_bank, date).await?;
        let taken = schedules.iter().any(|existing| {
            Some(&existing.id) != exclude
                && existing.content.occupies(blood_bank, date, slot)
        });
        if taken {
            return Err(RequestError::precondition(format!(
                "slot {} on {} is already booked",
                slot, date
            )));
        }
        Ok(())
    }

    async fn dispatch_reminder(
        &self,
        schedule: &mut WithId<DonationSchedule>,
    ) -> RequestResult<WithId<DonationSchedule>> {
        let before = schedule.content.reminder_status;
        reminder::attempt_dispatch(self.reminders.as_ref(), schedule).await;
        if schedule.content.reminder_status != before {
            return Ok(self.database.auto().update(schedule.clone()).await?);
        }
        Ok(schedule.clone())
    }
}

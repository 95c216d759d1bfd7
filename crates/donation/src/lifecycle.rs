use chrono::{DateTime, Local, NaiveDate};
use log::debug;
use model::schedule::{
    ContactMethod, Donation, DonationSchedule, DonationType, ScheduleStatus,
    TimeSlot,
};
use schemars::JsonSchema;
use serde::Deserialize;
use utility::id::Id;

use crate::{RequestError, RequestResult};

fn guard(
    schedule: &DonationSchedule,
    operation: &str,
    allowed: &[ScheduleStatus],
) -> RequestResult<()> {
    if allowed.contains(&schedule.status) {
        Ok(())
    } else {
        debug!(
            "rejected {} from status {:?}",
            operation, schedule.status
        );
        Err(RequestError::precondition(format!(
            "cannot {} a schedule in status {:?}",
            operation, schedule.status
        )))
    }
}

/// SCHEDULED -> CONFIRMED. Stamps `confirmed_at` exactly once.
pub fn confirm(
    schedule: &mut DonationSchedule,
    now: DateTime<Local>,
) -> RequestResult<()> {
    guard(schedule, "confirm", &[ScheduleStatus::Scheduled])?;
    schedule.status = ScheduleStatus::Confirmed;
    schedule.confirmed_at = Some(now);
    Ok(())
}

/// SCHEDULED|CONFIRMED -> CANCELLED. Stamps `cancelled_at` exactly once and
/// records the optional reason.
pub fn cancel(
    schedule: &mut DonationSchedule,
    reason: Option<String>,
    now: DateTime<Local>,
) -> RequestResult<()> {
    guard(
        schedule,
        "cancel",
        &[ScheduleStatus::Scheduled, ScheduleStatus::Confirmed],
    )?;
    schedule.status = ScheduleStatus::Cancelled;
    schedule.cancelled_at = Some(now);
    schedule.cancellation_reason = reason;
    Ok(())
}

/// CONFIRMED -> COMPLETED, linking the resulting donation record.
pub fn complete(
    schedule: &mut DonationSchedule,
    donation: Id<Donation>,
) -> RequestResult<()> {
    guard(schedule, "complete", &[ScheduleStatus::Confirmed])?;
    schedule.status = ScheduleStatus::Completed;
    schedule.completed_donation = Some(donation);
    Ok(())
}

/// CONFIRMED -> NO_SHOW. No interactive path leads here, but the state is
/// part of the domain and staff tooling may set it.
pub fn mark_no_show(schedule: &mut DonationSchedule) -> RequestResult<()> {
    guard(schedule, "mark as no-show", &[ScheduleStatus::Confirmed])?;
    schedule.status = ScheduleStatus::NoShow;
    Ok(())
}

/// Field changes permitted while a schedule is still active. Absent fields
/// are left untouched.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEdit {
    pub scheduled_date: Option<NaiveDate>,
    pub time_slot: Option<TimeSlot>,
    pub donation_type: Option<DonationType>,
    pub purpose: Option<String>,
    pub contact_method: Option<ContactMethod>,
    pub special_instructions: Option<String>,
    pub notes: Option<String>,
    pub estimated_duration_minutes: Option<u32>,
    pub send_reminders: Option<bool>,
}

pub struct EditOutcome {
    /// The booked `(date, slot)` changed, so the slot conflict check has to
    /// run again before the edit is committed.
    pub slot_changed: bool,
    /// Date, slot or the reminder opt-in changed, which retriggers reminder
    /// dispatch.
    pub reminder_relevant: bool,
}

/// Applies an edit to a non-terminal schedule. The status never changes
/// here; date/slot conflicts are the caller's (and ultimately the store's)
/// concern, reported through the returned [`EditOutcome`].
pub fn apply_edit(
    schedule: &mut DonationSchedule,
    edit: ScheduleEdit,
) -> RequestResult<EditOutcome> {
    guard(
        schedule,
        "edit",
        &[ScheduleStatus::Scheduled, ScheduleStatus::Confirmed],
    )?;

    let mut slot_changed = false;
    let mut reminder_relevant = false;

    if let Some(date) = edit.scheduled_date {
        slot_changed |= date != schedule.scheduled_date;
        schedule.scheduled_date = date;
    }
    if let Some(slot) = edit.time_slot {
        slot_changed |= slot != schedule.time_slot;
        schedule.time_slot = slot;
    }
    if let Some(send_reminders) = edit.send_reminders {
        reminder_relevant |= send_reminders != schedule.send_reminders;
        schedule.send_reminders = send_reminders;
    }
    reminder_relevant |= slot_changed;

    if let Some(donation_type) = edit.donation_type {
        schedule.donation_type = donation_type;
    }
    if let Some(purpose) = edit.purpose {
        schedule.purpose = Some(purpose);
    }
    if let Some(contact_method) = edit.contact_method {
        schedule.contact_method = Some(contact_method);
    }
    if let Some(special_instructions) = edit.special_instructions {
        schedule.special_instructions = Some(special_instructions);
    }
    if let Some(notes) = edit.notes {
        schedule.notes = Some(notes);
    }
    if let Some(duration) = edit.estimated_duration_minutes {
        schedule.estimated_duration_minutes = Some(duration);
    }

    Ok(EditOutcome {
        slot_changed,
        reminder_relevant,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::ExampleData;

    fn schedule() -> DonationSchedule {
        DonationSchedule::example_data()
    }

    fn donation_id() -> Id<Donation> {
        Id::new("donation-1".to_owned())
    }

    #[test]
    fn confirm_stamps_the_timestamp_once() {
        let mut s = schedule();
        confirm(&mut s, Local::now()).unwrap();
        assert_eq!(s.status, ScheduleStatus::Confirmed);
        assert!(s.confirmed_at.is_some());

        // a second confirm is rejected, the stamp stays untouched
        let stamp = s.confirmed_at;
        assert!(matches!(
            confirm(&mut s, Local::now()),
            Err(RequestError::PreconditionFailed(_))
        ));
        assert_eq!(s.confirmed_at, stamp);
    }

    #[test]
    fn cancel_is_allowed_from_scheduled_and_confirmed() {
        let mut s = schedule();
        cancel(&mut s, Some("sick".to_owned()), Local::now()).unwrap();
        assert_eq!(s.status, ScheduleStatus::Cancelled);
        assert_eq!(s.cancellation_reason.as_deref(), Some("sick"));
        assert!(s.cancelled_at.is_some());

        let mut s = schedule();
        confirm(&mut s, Local::now()).unwrap();
        cancel(&mut s, None, Local::now()).unwrap();
        assert_eq!(s.status, ScheduleStatus::Cancelled);
    }

    #[test]
    fn complete_requires_a_confirmed_schedule() {
        let mut s = schedule();
        assert!(matches!(
            complete(&mut s, donation_id()),
            Err(RequestError::PreconditionFailed(_))
        ));

        confirm(&mut s, Local::now()).unwrap();
        complete(&mut s, donation_id()).unwrap();
        assert_eq!(s.status, ScheduleStatus::Completed);
        assert!(s.completed_donation.is_some());
    }

    #[test]
    fn terminal_states_reject_everything() {
        let mut s = schedule();
        cancel(&mut s, None, Local::now()).unwrap();

        assert!(confirm(&mut s, Local::now()).is_err());
        assert!(cancel(&mut s, None, Local::now()).is_err());
        assert!(complete(&mut s, donation_id()).is_err());
        assert!(mark_no_show(&mut s).is_err());
        assert!(apply_edit(&mut s, ScheduleEdit::default()).is_err());

        let mut s = schedule();
        confirm(&mut s, Local::now()).unwrap();
        complete(&mut s, donation_id()).unwrap();
        assert!(cancel(&mut s, None, Local::now()).is_err());
        assert!(apply_edit(&mut s, ScheduleEdit::default()).is_err());
    }

    #[test]
    fn no_show_only_from_confirmed() {
        let mut s = schedule();
        assert!(mark_no_show(&mut s).is_err());
        confirm(&mut s, Local::now()).unwrap();
        mark_no_show(&mut s).unwrap();
        assert_eq!(s.status, ScheduleStatus::NoShow);
    }

    #[test]
    fn edit_reports_slot_and_reminder_changes() {
        let mut s = schedule();

        let outcome = apply_edit(
            &mut s,
            ScheduleEdit {
                notes: Some("bring id card".to_owned()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(!outcome.slot_changed);
        assert!(!outcome.reminder_relevant);

        let outcome = apply_edit(
            &mut s,
            ScheduleEdit {
                time_slot: Some(TimeSlot::From14),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(outcome.slot_changed);
        assert!(outcome.reminder_relevant);
        assert_eq!(s.time_slot, TimeSlot::From14);
        assert_eq!(s.status, ScheduleStatus::Scheduled);

        // setting the same slot again is not a change
        let outcome = apply_edit(
            &mut s,
            ScheduleEdit {
                time_slot: Some(TimeSlot::From14),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(!outcome.slot_changed);
    }
}

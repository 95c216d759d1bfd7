use std::sync::atomic::{AtomicU64, Ordering};

use model::{
    schedule::{DonationSchedule, TimeSlot},
    WithId,
};
use schemars::JsonSchema;
use serde::Serialize;

/// Availability of one fixed booking window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    pub slot: TimeSlot,
    pub available: bool,
}

/// Evaluates every fixed slot against the given schedules. A slot is taken
/// iff at least one non-terminal schedule occupies it; the caller supplies
/// the schedules already narrowed to one `(bloodBank, date)` pair.
pub fn availability(
    schedules: &[WithId<DonationSchedule>],
) -> Vec<SlotAvailability> {
    TimeSlot::ALL
        .iter()
        .map(|slot| SlotAvailability {
            slot: *slot,
            available: !schedules.iter().any(|schedule| {
                !schedule.content.status.is_terminal()
                    && schedule.content.time_slot == *slot
            }),
        })
        .collect()
}

/// Issuance-ordered staleness guard for in-flight availability queries.
///
/// The UI may re-query while an earlier request is still outstanding. Only
/// the response to the most recently issued query may be applied; responses
/// to earlier queries are discarded even if they arrive later
/// (last-request-wins by issuance order, not completion order).
#[derive(Debug, Default)]
pub struct QuerySequence {
    issued: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket(u64);

impl QuerySequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a new query as the current one and returns its ticket.
    pub fn issue(&self) -> QueryTicket {
        QueryTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: QueryTicket) -> bool {
        self.issued.load(Ordering::SeqCst) == ticket.0
    }

    /// Passes `value` through when `ticket` is still the latest issued
    /// query, `None` when the response is stale and must be dropped.
    pub fn accept<T>(&self, ticket: QueryTicket, value: T) -> Option<T> {
        self.is_current(ticket).then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use model::{
        schedule::ScheduleStatus,
        ExampleData,
    };
    use utility::id::Id;

    fn schedule_at(slot: TimeSlot, status: ScheduleStatus) -> WithId<DonationSchedule> {
        let mut schedule = DonationSchedule::example_data();
        schedule.time_slot = slot;
        schedule.status = status;
        schedule.scheduled_date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        WithId::new(Id::new("schedule-1".to_owned()), schedule)
    }

    #[test]
    fn booked_slot_is_unavailable_all_others_open() {
        let booked = schedule_at(TimeSlot::From10, ScheduleStatus::Scheduled);
        let result = availability(&[booked]);

        assert_eq!(result.len(), 10);
        for entry in &result {
            if entry.slot == TimeSlot::From10 {
                assert!(!entry.available);
            } else {
                assert!(entry.available, "{} should be open", entry.slot);
            }
        }
    }

    #[test]
    fn confirmed_schedules_also_block_the_slot() {
        let booked = schedule_at(TimeSlot::From14, ScheduleStatus::Confirmed);
        let result = availability(&[booked]);
        let entry = result.iter().find(|e| e.slot == TimeSlot::From14).unwrap();
        assert!(!entry.available);
    }

    #[test]
    fn cancelled_schedules_release_the_slot() {
        let cancelled = schedule_at(TimeSlot::From10, ScheduleStatus::Cancelled);
        let result = availability(&[cancelled]);
        assert!(result.iter().all(|entry| entry.available));
    }

    #[test]
    fn stale_responses_are_discarded() {
        let sequence = QuerySequence::new();
        let first = sequence.issue();
        let second = sequence.issue();

        // the later-issued query responds first and wins
        assert_eq!(sequence.accept(second, "fresh"), Some("fresh"));
        // the earlier query completes afterwards and is dropped
        assert_eq!(sequence.accept(first, "stale"), None);
    }
}

use std::error::Error;

use async_trait::async_trait;
use log::{info, warn};
use model::{
    schedule::{DonationSchedule, ReminderStatus},
    WithId,
};

/// Delivery of pre-appointment notifications is an external concern; the
/// core only records the outcome.
#[async_trait]
pub trait ReminderDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        schedule: &WithId<DonationSchedule>,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// A dispatcher that only logs. Used by the demo binary, where no delivery
/// channel is configured.
pub struct LogDispatcher;

#[async_trait]
impl ReminderDispatcher for LogDispatcher {
    async fn dispatch(
        &self,
        schedule: &WithId<DonationSchedule>,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        info!(
            "reminder for schedule {} ({} at {} {})",
            schedule.id,
            schedule.content.donor.name,
            schedule.content.scheduled_date,
            schedule.content.time_slot
        );
        Ok(())
    }
}

/// Attempts a reminder dispatch and records the outcome on the schedule.
///
/// Called at creation and after edits that change date, slot or the
/// reminder opt-in. Purely informational: a failed dispatch marks the
/// schedule `FAILED` but never fails the surrounding operation.
pub async fn attempt_dispatch<R: ReminderDispatcher + ?Sized>(
    dispatcher: &R,
    schedule: &mut WithId<DonationSchedule>,
) {
    if !schedule.content.send_reminders {
        return;
    }
    match dispatcher.dispatch(schedule).await {
        Ok(()) => schedule.content.reminder_status = ReminderStatus::Sent,
        Err(why) => {
            warn!("reminder dispatch for schedule {} failed: {}", schedule.id, why);
            schedule.content.reminder_status = ReminderStatus::Failed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::ExampleData;
    use utility::id::Id;

    struct FailingDispatcher;

    #[async_trait]
    impl ReminderDispatcher for FailingDispatcher {
        async fn dispatch(
            &self,
            _schedule: &WithId<DonationSchedule>,
        ) -> Result<(), Box<dyn Error + Send + Sync>> {
            Err("smtp unreachable".into())
        }
    }

    fn schedule() -> WithId<DonationSchedule> {
        WithId::new(
            Id::new("schedule-1".to_owned()),
            DonationSchedule::example_data(),
        )
    }

    #[tokio::test]
    async fn successful_dispatch_marks_sent() {
        let mut schedule = schedule();
        attempt_dispatch(&LogDispatcher, &mut schedule).await;
        assert_eq!(schedule.content.reminder_status, ReminderStatus::Sent);
    }

    #[tokio::test]
    async fn failed_dispatch_marks_failed_without_erroring() {
        let mut schedule = schedule();
        attempt_dispatch(&FailingDispatcher, &mut schedule).await;
        assert_eq!(schedule.content.reminder_status, ReminderStatus::Failed);
    }

    #[tokio::test]
    async fn opted_out_schedules_are_left_alone() {
        let mut schedule = schedule();
        schedule.content.send_reminders = false;
        attempt_dispatch(&LogDispatcher, &mut schedule).await;
        assert_eq!(schedule.content.reminder_status, ReminderStatus::NotSent);
    }
}

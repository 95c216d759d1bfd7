use std::sync::Arc;

use chrono::NaiveDate;
use database::MemoryDatabase;
use donation::{
    client::{Client, NewSchedule},
    database::{Database, Repo},
    lifecycle::ScheduleEdit,
    reminder::LogDispatcher,
    slots::QuerySequence,
    RequestError,
};
use model::{
    blood::{BloodGroup, BloodType, RhFactor},
    blood_bank::BloodBank,
    donor::Donor,
    map::EntityKind,
    schedule::{
        DonationType, ReminderStatus, ScheduleStatus, TimeSlot,
    },
    WithId,
};
use utility::{geo::GeoPoint, id::Id};

async fn client_with_fixtures(
) -> (Client<MemoryDatabase>, WithId<Donor>, WithId<BloodBank>) {
    let database = MemoryDatabase::new();
    let mut ops = database.auto();

    let donor = Repo::<Donor>::insert(
        &mut ops,
        Donor {
            name: "Jona Petersen".to_owned(),
            blood_group: BloodGroup {
                blood_type: BloodType::O,
                rh_factor: RhFactor::Negative,
            },
            is_eligible: true,
            receive_donation_alerts: true,
            location: GeoPoint::new(10.1228, 54.3233).ok(),
            last_donation_date: None,
            phone: None,
            email: None,
        },
    )
    .await
    .unwrap();

    let bank = Repo::<BloodBank>::insert(
        &mut ops,
        BloodBank {
            name: "B1".to_owned(),
            address: "Hospitalstraße 42, 24105 Kiel".to_owned(),
            location: GeoPoint::new(10.1356, 54.3256).ok(),
            emergency_need: false,
            operating_hours: None,
            phone: None,
        },
    )
    .await
    .unwrap();

    let client = Client::new(database, Arc::new(LogDispatcher));
    (client, donor, bank)
}

fn new_schedule(
    donor: &WithId<Donor>,
    bank: &WithId<BloodBank>,
    slot: TimeSlot,
) -> NewSchedule {
    NewSchedule {
        donor_id: donor.id.clone(),
        blood_bank_id: bank.id.clone(),
        scheduled_date: date(),
        time_slot: slot,
        donation_type: DonationType::WholeBlood,
        purpose: None,
        contact_method: None,
        special_instructions: None,
        notes: None,
        estimated_duration_minutes: None,
        recurring: false,
        recurrence_pattern: None,
        scheduled_by: None,
        send_reminders: true,
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
}

#[tokio::test]
async fn booked_slot_shows_unavailable_until_cancelled() {
    let (client, donor, bank) = client_with_fixtures().await;

    let created = client
        .create_schedule(new_schedule(&donor, &bank, TimeSlot::From10))
        .await
        .unwrap();
    assert_eq!(created.content.status, ScheduleStatus::Scheduled);

    let availability = client.slot_availability(&bank.id, date()).await.unwrap();
    assert_eq!(availability.len(), 10);
    for entry in &availability {
        assert_eq!(entry.available, entry.slot != TimeSlot::From10);
    }

    client
        .cancel_schedule(created.id.clone(), Some("cannot make it".to_owned()))
        .await
        .unwrap();

    let availability = client.slot_availability(&bank.id, date()).await.unwrap();
    assert!(availability.iter().all(|entry| entry.available));
}

#[tokio::test]
async fn double_booking_fails_the_pre_check() {
    let (client, donor, bank) = client_with_fixtures().await;

    client
        .create_schedule(new_schedule(&donor, &bank, TimeSlot::From10))
        .await
        .unwrap();

    let second = client
        .create_schedule(new_schedule(&donor, &bank, TimeSlot::From10))
        .await;
    assert!(matches!(second, Err(RequestError::PreconditionFailed(_))));
}

#[tokio::test]
async fn moving_a_schedule_into_an_occupied_slot_fails() {
    let (client, donor, bank) = client_with_fixtures().await;

    client
        .create_schedule(new_schedule(&donor, &bank, TimeSlot::From10))
        .await
        .unwrap();
    let movable = client
        .create_schedule(new_schedule(&donor, &bank, TimeSlot::From14))
        .await
        .unwrap();

    let moved = client
        .edit_schedule(
            movable.id.clone(),
            ScheduleEdit {
                time_slot: Some(TimeSlot::From10),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(moved, Err(RequestError::PreconditionFailed(_))));

    // the failed move must not have been committed
    let unchanged = client.get_schedule(movable.id).await.unwrap();
    assert_eq!(unchanged.content.time_slot, TimeSlot::From14);
}

#[tokio::test]
async fn full_lifecycle_with_guards() {
    let (client, donor, bank) = client_with_fixtures().await;

    let created = client
        .create_schedule(new_schedule(&donor, &bank, TimeSlot::From10))
        .await
        .unwrap();

    // complete before confirm is rejected
    let too_early = client
        .complete_schedule(created.id.clone(), Id::new("donation-1".to_owned()))
        .await;
    assert!(matches!(too_early, Err(RequestError::PreconditionFailed(_))));

    let confirmed = client.confirm_schedule(created.id.clone()).await.unwrap();
    assert_eq!(confirmed.content.status, ScheduleStatus::Confirmed);
    assert!(confirmed.content.confirmed_at.is_some());

    let completed = client
        .complete_schedule(created.id.clone(), Id::new("donation-1".to_owned()))
        .await
        .unwrap();
    assert_eq!(completed.content.status, ScheduleStatus::Completed);

    // terminal: neither cancel nor confirm may succeed anymore
    assert!(client
        .cancel_schedule(created.id.clone(), None)
        .await
        .is_err());
    assert!(client.confirm_schedule(created.id).await.is_err());
}

#[tokio::test]
async fn reminders_are_recorded_at_creation() {
    let (client, donor, bank) = client_with_fixtures().await;

    let created = client
        .create_schedule(new_schedule(&donor, &bank, TimeSlot::From10))
        .await
        .unwrap();
    assert_eq!(created.content.reminder_status, ReminderStatus::Sent);

    let mut opted_out = new_schedule(&donor, &bank, TimeSlot::From11);
    opted_out.send_reminders = false;
    let created = client.create_schedule(opted_out).await.unwrap();
    assert_eq!(created.content.reminder_status, ReminderStatus::NotSent);
}

#[tokio::test]
async fn opting_out_of_reminders_persists_the_reset() {
    let (client, donor, bank) = client_with_fixtures().await;

    let created = client
        .create_schedule(new_schedule(&donor, &bank, TimeSlot::From10))
        .await
        .unwrap();
    assert_eq!(created.content.reminder_status, ReminderStatus::Sent);

    let edited = client
        .edit_schedule(
            created.id.clone(),
            ScheduleEdit {
                send_reminders: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.content.reminder_status, ReminderStatus::NotSent);

    // the store agrees with the response
    let fetched = client.get_schedule(created.id).await.unwrap();
    assert_eq!(fetched.content.reminder_status, ReminderStatus::NotSent);
    assert!(!fetched.content.send_reminders);
}

#[tokio::test]
async fn unknown_references_are_not_found() {
    let (client, donor, bank) = client_with_fixtures().await;

    let mut request = new_schedule(&donor, &bank, TimeSlot::From10);
    request.donor_id = Id::new("donor-unknown".to_owned());
    assert!(matches!(
        client.create_schedule(request).await,
        Err(RequestError::NotFound)
    ));

    assert!(matches!(
        client
            .slot_availability(&Id::new("bank-unknown".to_owned()), date())
            .await,
        Err(RequestError::NotFound)
    ));
}

#[tokio::test]
async fn map_points_cover_nearby_entities_with_bounds() {
    let (client, _donor, bank) = client_with_fixtures().await;
    let center = GeoPoint::new(10.13, 54.32).unwrap();

    let (points, bounds) = client.map_points(&center, 10.0, None).await.unwrap();
    assert!(points.iter().any(|p| p.kind == EntityKind::Donor));
    assert!(points.iter().any(|p| p.kind == EntityKind::BloodBank));

    let bounds = bounds.unwrap();
    assert!(bounds.contains(&center));
    for point in points.iter().filter_map(|p| p.location.as_ref()) {
        assert!(bounds.contains(point));
    }

    // narrowed to banks only
    let (points, _) = client
        .map_points(&center, 10.0, Some(EntityKind::BloodBank))
        .await
        .unwrap();
    assert!(!points.is_empty());
    assert!(points.iter().all(|p| p.kind == EntityKind::BloodBank));
    assert_eq!(points[0].id, bank.id.raw());
}

#[tokio::test]
async fn stale_availability_queries_are_discarded() {
    let (client, _, bank) = client_with_fixtures().await;
    let sequence = QuerySequence::new();

    // an earlier query is still in flight when the latest one resolves
    let superseded = sequence.issue();
    let fresh = client
        .slot_availability_latest(&sequence, &bank.id, date())
        .await
        .unwrap();
    assert!(fresh.is_some());
    assert!(sequence.accept(superseded, ()).is_none());
}

#[tokio::test]
async fn nearby_results_are_ranked_by_distance() {
    let (client, _, _) = client_with_fixtures().await;
    let center = GeoPoint::new(10.1228, 54.3233).unwrap();

    let donors = client.nearby_donors(&center, 50.0).await.unwrap();
    for pair in donors.windows(2) {
        assert!(pair[0].distance_km <= pair[1].distance_km);
    }
    // the donor without a shared location is not in the result
    assert!(donors
        .iter()
        .all(|donor| donor.content.content.location.is_some()));
}

use agenda_common::{
    ActiveBooking, BookingStatus, BookingStore, BoxFuture, BreakPeriod, BreakRecurrence,
    DateOverride, InsertOutcome, NewBooking, ScheduleAdminStore, WeeklyAvailabilityRule,
};
use agenda_db::{DbError, SqlBookingStore};
use agenda_slots::logic::AppointmentRequest;
use agenda_slots::service::{AppointmentFailure, SlotService};
use chrono::{NaiveDate, Weekday};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn request(time: chrono::NaiveTime, service_id: &str, duration: i64) -> AppointmentRequest {
    AppointmentRequest {
        provider_id: fixtures::PROVIDER.to_string(),
        client_id: "maria".to_string(),
        service_id: service_id.to_string(),
        collaborator_id: None,
        date: fixtures::monday(),
        time,
        duration_minutes: duration,
    }
}

#[tokio::test]
async fn test_booking_flow_against_sqlite() {
    let store = fixtures::seeded_store().await;
    let service = SlotService::new(Arc::clone(&store), Duration::from_secs(5));

    // Step 1: list
    let listed = service
        .get_available_slots(fixtures::PROVIDER, None, fixtures::monday(), 45)
        .await;
    assert_eq!(listed.error, None);
    assert!(listed.slots.contains(&"10:00".to_string()));

    // Step 2: book 10:00 for 45 minutes
    let id = service
        .create_appointment(&request(fixtures::time(10, 0), "corte", 45))
        .await
        .expect("booking accepted");

    // Step 3: 10:00 and 10:30 gone, 11:00 still open
    let after = service
        .get_available_slots(fixtures::PROVIDER, None, fixtures::monday(), 30)
        .await;
    assert!(!after.slots.contains(&"10:00".to_string()));
    assert!(!after.slots.contains(&"10:30".to_string()));
    assert!(after.slots.contains(&"11:00".to_string()));

    // Step 4: rebooking is refused
    assert_eq!(
        service
            .create_appointment(&request(fixtures::time(10, 0), "corte", 45))
            .await,
        Err(AppointmentFailure::SlotTaken)
    );

    // Step 5: attendance marked, slot stays occupied
    assert!(store
        .update_booking_status(&id, BookingStatus::Attended)
        .await
        .unwrap());
    let attended = service
        .get_available_slots(fixtures::PROVIDER, None, fixtures::monday(), 30)
        .await;
    assert!(!attended.slots.contains(&"10:00".to_string()));

    // Step 6: a cancellation frees it
    assert!(store
        .update_booking_status(&id, BookingStatus::Cancelled)
        .await
        .unwrap());
    let freed = service
        .get_available_slots(fixtures::PROVIDER, None, fixtures::monday(), 30)
        .await;
    assert!(freed.slots.contains(&"10:00".to_string()));
}

#[tokio::test]
async fn test_blank_collaborator_sees_bookings_stored_without_one() {
    let store = fixtures::seeded_store().await;
    let service = SlotService::new(Arc::clone(&store), Duration::from_secs(5));

    let mut blank = request(fixtures::time(10, 0), "corte", 45);
    blank.collaborator_id = Some(String::new());
    service.create_appointment(&blank).await.expect("booking accepted");

    // stored as NULL, so a blank filter must not turn into `collaborator_id = ''`
    let listed = service
        .get_available_slots(fixtures::PROVIDER, Some(""), fixtures::monday(), 30)
        .await;
    assert_eq!(listed.error, None);
    assert!(!listed.slots.contains(&"10:00".to_string()));
    assert!(listed.slots.contains(&"11:00".to_string()));

    assert_eq!(
        service.create_appointment(&blank).await,
        Err(AppointmentFailure::SlotTaken)
    );
}

#[tokio::test]
async fn test_breaks_buffer_and_override_against_sqlite() {
    let store = fixtures::seeded_store().await;
    let service = SlotService::new(Arc::clone(&store), Duration::from_secs(5));

    store
        .add_break(BreakPeriod {
            id: None,
            provider_id: fixtures::PROVIDER.to_string(),
            recurrence: BreakRecurrence::Weekly(Weekday::Mon),
            start_time: fixtures::time(12, 0),
            end_time: fixtures::time(13, 0),
        })
        .await
        .unwrap();
    store.set_buffer_minutes(fixtures::PROVIDER, 15).await.unwrap();

    let slots = service
        .get_available_slots(fixtures::PROVIDER, None, fixtures::monday(), 60)
        .await
        .slots;
    assert!(!slots.contains(&"11:30".to_string()));
    assert!(slots.contains(&"11:00".to_string()));
    assert!(slots.contains(&"13:00".to_string()));

    service
        .create_appointment(&request(fixtures::time(9, 0), "barba", 30))
        .await
        .unwrap();
    // 09:00 + 30 + 15 buffer blocks until 09:45
    let slots = service
        .get_available_slots(fixtures::PROVIDER, None, fixtures::monday(), 30)
        .await
        .slots;
    assert!(!slots.contains(&"09:30".to_string()));
    assert!(slots.contains(&"10:00".to_string()));

    store
        .upsert_date_override(DateOverride {
            provider_id: fixtures::PROVIDER.to_string(),
            date: fixtures::monday(),
            is_available: false,
            start_time: None,
            end_time: None,
        })
        .await
        .unwrap();
    let closed = service
        .get_available_slots(fixtures::PROVIDER, None, fixtures::monday(), 30)
        .await;
    assert!(closed.slots.is_empty());
    assert_eq!(closed.error, None);
}

#[tokio::test]
async fn test_closed_pool_reports_unavailable() {
    let store = fixtures::seeded_store().await;
    let service = SlotService::new(Arc::clone(&store), Duration::from_secs(5));
    store.client().close().await;

    let response = service
        .get_available_slots(fixtures::PROVIDER, None, fixtures::monday(), 30)
        .await;
    assert!(response.slots.is_empty());
    assert_eq!(response.error.as_deref(), Some("Serviço indisponível"));

    let failure = service
        .create_appointment(&request(fixtures::time(10, 0), "corte", 45))
        .await
        .unwrap_err();
    assert!(matches!(failure, AppointmentFailure::Unavailable(_)));
}

/// Delegates to the SQL store but lets a competing booking land between the
/// re-validation and the write.
struct LosingRaceStore {
    inner: Arc<SqlBookingStore>,
}

impl BookingStore for LosingRaceStore {
    type Error = DbError;

    fn get_date_override(
        &self,
        provider_id: &str,
        date: NaiveDate,
    ) -> BoxFuture<'_, Option<DateOverride>, Self::Error> {
        self.inner.get_date_override(provider_id, date)
    }

    fn get_weekly_rule(
        &self,
        provider_id: &str,
        weekday: Weekday,
    ) -> BoxFuture<'_, Option<WeeklyAvailabilityRule>, Self::Error> {
        self.inner.get_weekly_rule(provider_id, weekday)
    }

    fn list_breaks(
        &self,
        provider_id: &str,
        filter: BreakRecurrence,
    ) -> BoxFuture<'_, Vec<BreakPeriod>, Self::Error> {
        self.inner.list_breaks(provider_id, filter)
    }

    fn get_buffer_setting(&self, provider_id: &str) -> BoxFuture<'_, Option<i64>, Self::Error> {
        self.inner.get_buffer_setting(provider_id)
    }

    fn list_active_bookings(
        &self,
        provider_id: &str,
        date: NaiveDate,
        collaborator_id: Option<&str>,
    ) -> BoxFuture<'_, Vec<ActiveBooking>, Self::Error> {
        self.inner
            .list_active_bookings(provider_id, date, collaborator_id)
    }

    fn list_service_durations(
        &self,
        service_ids: &[String],
    ) -> BoxFuture<'_, HashMap<String, i64>, Self::Error> {
        self.inner.list_service_durations(service_ids)
    }

    fn insert_booking(&self, booking: NewBooking) -> BoxFuture<'_, InsertOutcome, Self::Error> {
        Box::pin(async move {
            let rival = NewBooking {
                client_id: "rival".to_string(),
                ..booking.clone()
            };
            let first = self.inner.insert_booking(rival).await?;
            assert!(matches!(first, InsertOutcome::Inserted(_)));
            self.inner.insert_booking(booking).await
        })
    }
}

#[tokio::test]
async fn test_uniqueness_constraint_settles_lost_race() {
    let inner = fixtures::seeded_store().await;
    let racing = Arc::new(LosingRaceStore {
        inner: Arc::clone(&inner),
    });
    let service = SlotService::new(racing, Duration::from_secs(5));

    let outcome = service
        .create_appointment(&request(fixtures::time(14, 0), "corte", 45))
        .await;
    assert_eq!(outcome, Err(AppointmentFailure::SlotTaken));

    let bookings = inner
        .list_bookings(fixtures::PROVIDER, fixtures::monday())
        .await
        .unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].client_id, "rival");
}

#[cfg(test)]
mod tests {
    use crate::handlers::SlotsState;
    use crate::routes::routes;
    use crate::service::mock::MemoryBookingStore;
    use agenda_common::BookingStatus;
    use agenda_config::{AppConfig, BookingConfig, ServerConfig};
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use chrono::{NaiveDate, Weekday};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn config() -> Arc<AppConfig> {
        Arc::new(AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: None,
            booking: BookingConfig::default(),
        })
    }

    fn app(store: &Arc<MemoryBookingStore>) -> Router {
        routes(Arc::new(SlotsState::new(config(), Arc::clone(store))))
    }

    fn seeded_store() -> Arc<MemoryBookingStore> {
        let store = MemoryBookingStore::new();
        store.seed_weekly_rule("p1", Weekday::Mon, "09:00", "18:00");
        store.seed_service("p1", "s45", 45);
        Arc::new(store)
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn booking_body(time: &str) -> Value {
        json!({
            "client_id": "client-1",
            "service_id": "s45",
            "collaborator_id": null,
            "date": "2025-06-02",
            "time": time,
            "duration_minutes": 45
        })
    }

    #[tokio::test]
    async fn test_get_slots() {
        let store = seeded_store();
        let (status, body) = send(
            app(&store),
            Method::GET,
            "/providers/p1/slots?date=2025-06-02&duration_minutes=60",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let slots = body["slots"].as_array().unwrap();
        assert_eq!(slots.first().unwrap(), "09:00");
        assert_eq!(slots.last().unwrap(), "17:00");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_get_slots_rejects_bad_date() {
        let store = seeded_store();
        let (status, body) = send(
            app(&store),
            Method::GET,
            "/providers/p1/slots?date=02-06-2025&duration_minutes=60",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 400);
    }

    #[tokio::test]
    async fn test_get_slots_reports_unavailable_store() {
        let store = seeded_store();
        MemoryBookingStore::fail(&store.fail_window);
        let (status, body) = send(
            app(&store),
            Method::GET,
            "/providers/p1/slots?date=2025-06-02&duration_minutes=30",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "slots": [], "error": "Serviço indisponível" }));
    }

    #[tokio::test]
    async fn test_create_appointment_then_slot_taken() {
        let store = seeded_store();

        let (status, body) = send(
            app(&store),
            Method::POST,
            "/providers/p1/appointments",
            Some(booking_body("11:00")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({ "success": true }));

        let (status, body) = send(
            app(&store),
            Method::POST,
            "/providers/p1/appointments",
            Some(booking_body("11:00")),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({ "success": false, "error": "slot_taken" }));
    }

    #[tokio::test]
    async fn test_create_appointment_malformed_input() {
        let store = seeded_store();

        let (status, body) = send(
            app(&store),
            Method::POST,
            "/providers/p1/appointments",
            Some(booking_body("eleven")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "success": false, "error": "invalid" }));

        let (status, body) = send(
            app(&store),
            Method::POST,
            "/providers/p1/appointments",
            Some(json!({ "client_id": "client-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid");
        assert!(store.bookings().is_empty());
    }

    #[tokio::test]
    async fn test_create_appointment_store_down() {
        let store = seeded_store();
        MemoryBookingStore::fail(&store.fail_window);

        let (status, body) = send(
            app(&store),
            Method::POST,
            "/providers/p1/appointments",
            Some(booking_body("11:00")),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "invalid");
    }

    #[tokio::test]
    async fn test_week_view() {
        let store = seeded_store();
        let (status, body) = send(
            app(&store),
            Method::GET,
            "/providers/p1/slots/week?start_date=2025-06-01&days=3&duration_minutes=30",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let days = body["days"].as_array().unwrap();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0]["date"], "2025-06-01");
        assert_eq!(days[0]["slots"].as_array().unwrap().len(), 0);
        assert_eq!(days[1]["slots"].as_array().unwrap().len(), 18);
    }

    #[tokio::test]
    async fn test_week_view_defaults_to_configured_days() {
        let store = seeded_store();
        let (status, body) = send(
            app(&store),
            Method::GET,
            "/providers/p1/slots/week?duration_minutes=30",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["days"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_admin_weekly_rule_shapes_slots() {
        let store = Arc::new(MemoryBookingStore::new());

        let (status, _) = send(
            app(&store),
            Method::PUT,
            "/admin/providers/p1/weekly-rules/1",
            Some(json!({ "is_available": true, "start_time": "08:00", "end_time": "10:00" })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(
            app(&store),
            Method::GET,
            "/providers/p1/slots?date=2025-06-02&duration_minutes=60",
            None,
        )
        .await;
        assert_eq!(body["slots"], json!(["08:00", "08:30", "09:00"]));

        let (status, _) = send(
            app(&store),
            Method::PUT,
            "/admin/providers/p1/weekly-rules/1",
            Some(json!({ "is_available": true, "start_time": "10:00", "end_time": "08:00" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_override_closes_day() {
        let store = seeded_store();

        let (status, _) = send(
            app(&store),
            Method::PUT,
            "/admin/providers/p1/overrides/2025-06-02",
            Some(json!({ "is_available": false })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(
            app(&store),
            Method::GET,
            "/providers/p1/slots?date=2025-06-02&duration_minutes=30",
            None,
        )
        .await;
        assert_eq!(body, json!({ "slots": [] }));
    }

    #[tokio::test]
    async fn test_admin_buffer_validation() {
        let store = seeded_store();

        let (status, _) = send(
            app(&store),
            Method::PUT,
            "/admin/providers/p1/buffer",
            Some(json!({ "buffer_minutes": -10 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            app(&store),
            Method::PUT,
            "/admin/providers/p1/buffer",
            Some(json!({ "buffer_minutes": 10 })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_admin_break_lifecycle() {
        let store = seeded_store();

        let (status, body) = send(
            app(&store),
            Method::POST,
            "/admin/providers/p1/breaks",
            Some(json!({ "day_of_week": 1, "start_time": "12:00", "end_time": "13:00" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["id"].as_str().unwrap().to_string();

        let (_, body) = send(
            app(&store),
            Method::GET,
            "/providers/p1/slots?date=2025-06-02&duration_minutes=30",
            None,
        )
        .await;
        assert!(!body["slots"].as_array().unwrap().contains(&json!("12:00")));

        let uri = format!("/admin/providers/p1/breaks/{}", id);
        let (status, _) = send(app(&store), Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(app(&store), Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], 404);
    }

    #[tokio::test]
    async fn test_admin_service_and_agenda() {
        let store = seeded_store();

        let (status, _) = send(
            app(&store),
            Method::PUT,
            "/admin/providers/p1/services/s90",
            Some(json!({ "name": "Coloração", "duration_minutes": 90, "price": 12000 })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let id = store.seed_booking("p1", "s90", None, date, "10:00", BookingStatus::Scheduled, None);
        store.seed_booking("p1", "s45", None, date, "09:00", BookingStatus::Cancelled, None);

        let (status, body) = send(
            app(&store),
            Method::GET,
            "/admin/providers/p1/bookings?date=2025-06-02",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let bookings = body["bookings"].as_array().unwrap();
        assert_eq!(bookings.len(), 2);
        assert_eq!(bookings[0]["time"], "09:00:00");
        assert_eq!(bookings[1]["status"], "scheduled");

        // 90 minutes from 10:00 blocks 11:00
        let (_, body) = send(
            app(&store),
            Method::GET,
            "/providers/p1/slots?date=2025-06-02&duration_minutes=30",
            None,
        )
        .await;
        assert!(!body["slots"].as_array().unwrap().contains(&json!("11:00")));

        let uri = format!("/admin/bookings/{}/status", id);
        let (status, _) = send(
            app(&store),
            Method::PATCH,
            &uri,
            Some(json!({ "status": "no_show" })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(
            app(&store),
            Method::GET,
            "/providers/p1/slots?date=2025-06-02&duration_minutes=30",
            None,
        )
        .await;
        assert!(body["slots"].as_array().unwrap().contains(&json!("11:00")));

        let (status, _) = send(
            app(&store),
            Method::PATCH,
            "/admin/bookings/missing/status",
            Some(json!({ "status": "attended" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_out_of_range_duration_is_rejected() {
        let store = seeded_store();

        let (status, body) = send(
            app(&store),
            Method::GET,
            "/providers/p1/slots?date=2025-06-02&duration_minutes=9223372036854775807",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["slots"], json!([]));
        assert_eq!(body["error"], "Duração inválida");

        let mut booking = booking_body("11:00");
        booking["duration_minutes"] = json!(i64::MAX);
        let (status, body) = send(
            app(&store),
            Method::POST,
            "/providers/p1/appointments",
            Some(booking),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "success": false, "error": "invalid" }));
        assert!(store.bookings().is_empty());
    }

    #[tokio::test]
    async fn test_blank_collaborator_lists_and_books_alike() {
        let store = seeded_store();
        store.seed_booking(
            "p1",
            "s45",
            None,
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            "10:00",
            BookingStatus::Scheduled,
            None,
        );

        let (_, unscoped) = send(
            app(&store),
            Method::GET,
            "/providers/p1/slots?date=2025-06-02&duration_minutes=30",
            None,
        )
        .await;
        let (status, blank) = send(
            app(&store),
            Method::GET,
            "/providers/p1/slots?date=2025-06-02&duration_minutes=30&collaborator_id=",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(blank, unscoped);
        assert!(!blank["slots"].as_array().unwrap().contains(&json!("10:00")));

        let (_, week) = send(
            app(&store),
            Method::GET,
            "/providers/p1/slots/week?start_date=2025-06-02&days=1&duration_minutes=30&collaborator_id=",
            None,
        )
        .await;
        assert_eq!(week["days"][0]["slots"], unscoped["slots"]);

        // every listed slot can be booked with the same blank collaborator
        let mut booking = booking_body("11:00");
        booking["collaborator_id"] = json!("");
        let (status, body) = send(
            app(&store),
            Method::POST,
            "/providers/p1/appointments",
            Some(booking),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(store.bookings().last().unwrap().collaborator_id, None);
    }

    #[tokio::test]
    async fn test_admin_malformed_body_is_bad_request() {
        let store = seeded_store();

        let (status, body) = send(
            app(&store),
            Method::PUT,
            "/admin/providers/p1/buffer",
            Some(json!({ "buffer_minutes": "ten" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 400);

        let (status, _) = send(
            app(&store),
            Method::PUT,
            "/admin/providers/p1/services/s1",
            Some(json!({ "name": "Corte" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            app(&store),
            Method::PUT,
            "/admin/providers/p1/services/s1",
            Some(json!({ "name": "Corte", "duration_minutes": i64::MAX })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            app(&store),
            Method::PATCH,
            "/admin/bookings/booking-1/status",
            Some(json!({ "status": "agendado" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

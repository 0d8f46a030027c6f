//! SQL implementation of the booking and schedule administration stores.
//!
//! Everything goes through the `Any` driver, which only decodes primitive
//! types, so calendar values are stored as text (`YYYY-MM-DD`, `HH:MM`) and
//! flags as integers. Nullable text columns are written with `NULLIF($n, '')`
//! to keep every bind non-optional.

use crate::error::{is_unique_violation, DbError};
use crate::DbClient;
use agenda_common::{
    format_time_of_day, parse_date, parse_time_of_day, weekday_from_index, weekday_index,
    ActiveBooking, Booking, BookingStatus, BookingStore, BoxFuture, BreakPeriod, BreakRecurrence,
    DateOverride, InsertOutcome, NewBooking, ScheduleAdminStore, Service, WeeklyAvailabilityRule,
};
use chrono::{NaiveDate, NaiveTime, Weekday};
use sqlx::any::AnyRow;
use sqlx::Row;
use std::collections::HashMap;
use tracing::{debug, error, info};
use uuid::Uuid;

const SCHEMA: [&str; 7] = [
    r#"
    CREATE TABLE IF NOT EXISTS weekly_availability (
        user_id TEXT NOT NULL,
        day_of_week INTEGER NOT NULL,
        is_available INTEGER NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT NOT NULL,
        PRIMARY KEY (user_id, day_of_week)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS availability_overrides (
        user_id TEXT NOT NULL,
        date TEXT NOT NULL,
        is_available INTEGER NOT NULL,
        start_time TEXT,
        end_time TEXT,
        PRIMARY KEY (user_id, date)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS break_periods (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        day_of_week INTEGER,
        date TEXT,
        start_time TEXT NOT NULL,
        end_time TEXT NOT NULL,
        CHECK ((day_of_week IS NULL) <> (date IS NULL))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_settings (
        user_id TEXT PRIMARY KEY,
        buffer_minutes INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS services (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        name TEXT NOT NULL,
        duration_minutes INTEGER NOT NULL,
        price INTEGER NOT NULL DEFAULT 0,
        is_active INTEGER NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS schedules (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        client_id TEXT NOT NULL,
        service_id TEXT NOT NULL,
        collaborator_id TEXT,
        scheduled_date TEXT NOT NULL,
        scheduled_time TEXT NOT NULL,
        status TEXT NOT NULL,
        buffer_minutes INTEGER
    )
    "#,
    // Two active bookings may never share a start time in the same scope.
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS schedules_active_slot
    ON schedules (user_id, coalesce(collaborator_id, ''), scheduled_date, scheduled_time)
    WHERE status IN ('scheduled', 'pending', 'attended')
    "#,
];

/// SQL-backed store used by the backend.
#[derive(Debug, Clone)]
pub struct SqlBookingStore {
    db_client: DbClient,
}

impl SqlBookingStore {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub fn client(&self) -> &DbClient {
        &self.db_client
    }

    /// Creates every table and index if missing. Safe to run on each start.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing booking schema");
        for statement in SCHEMA {
            self.db_client.execute(statement).await?;
        }
        info!("Booking schema initialized successfully");
        Ok(())
    }
}

fn date_text(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn active_status_list() -> String {
    BookingStatus::ACTIVE
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn query_failed(context: &str, e: sqlx::Error) -> DbError {
    error!("{}: {}", context, e);
    DbError::QueryError(e.to_string())
}

fn get_text(row: &AnyRow, column: &str) -> Result<String, DbError> {
    row.try_get::<String, _>(column)
        .map_err(|e| DbError::DecodeError(format!("{}: {}", column, e)))
}

fn get_opt_text(row: &AnyRow, column: &str) -> Result<Option<String>, DbError> {
    row.try_get::<Option<String>, _>(column)
        .map_err(|e| DbError::DecodeError(format!("{}: {}", column, e)))
}

fn get_int(row: &AnyRow, column: &str) -> Result<i64, DbError> {
    row.try_get::<i64, _>(column)
        .map_err(|e| DbError::DecodeError(format!("{}: {}", column, e)))
}

fn get_time(row: &AnyRow, column: &str) -> Result<NaiveTime, DbError> {
    let raw = get_text(row, column)?;
    parse_time_of_day(&raw)
        .ok_or_else(|| DbError::DecodeError(format!("{}: invalid time {:?}", column, raw)))
}

fn get_opt_time(row: &AnyRow, column: &str) -> Result<Option<NaiveTime>, DbError> {
    match get_opt_text(row, column)? {
        Some(raw) => parse_time_of_day(&raw)
            .map(Some)
            .ok_or_else(|| DbError::DecodeError(format!("{}: invalid time {:?}", column, raw))),
        None => Ok(None),
    }
}

fn get_date(row: &AnyRow, column: &str) -> Result<NaiveDate, DbError> {
    let raw = get_text(row, column)?;
    parse_date(&raw)
        .ok_or_else(|| DbError::DecodeError(format!("{}: invalid date {:?}", column, raw)))
}

fn get_status(row: &AnyRow) -> Result<BookingStatus, DbError> {
    get_text(row, "status")?
        .parse::<BookingStatus>()
        .map_err(|e| DbError::DecodeError(e.to_string()))
}

fn break_from_row(row: &AnyRow) -> Result<BreakPeriod, DbError> {
    let weekday = row
        .try_get::<Option<i64>, _>("day_of_week")
        .map_err(|e| DbError::DecodeError(format!("day_of_week: {}", e)))?;
    let recurrence = match (weekday, get_opt_text(row, "date")?) {
        (Some(index), None) => u8::try_from(index)
            .ok()
            .and_then(weekday_from_index)
            .map(BreakRecurrence::Weekly)
            .ok_or_else(|| DbError::DecodeError(format!("day_of_week: {}", index)))?,
        (None, Some(raw)) => parse_date(&raw)
            .map(BreakRecurrence::OnDate)
            .ok_or_else(|| DbError::DecodeError(format!("date: invalid date {:?}", raw)))?,
        _ => {
            return Err(DbError::DecodeError(
                "break must have exactly one of day_of_week and date".to_string(),
            ))
        }
    };

    Ok(BreakPeriod {
        id: Some(get_text(row, "id")?),
        provider_id: get_text(row, "user_id")?,
        recurrence,
        start_time: get_time(row, "start_time")?,
        end_time: get_time(row, "end_time")?,
    })
}

fn booking_from_row(row: &AnyRow) -> Result<Booking, DbError> {
    Ok(Booking {
        id: get_text(row, "id")?,
        provider_id: get_text(row, "user_id")?,
        client_id: get_text(row, "client_id")?,
        service_id: get_text(row, "service_id")?,
        collaborator_id: get_opt_text(row, "collaborator_id")?,
        date: get_date(row, "scheduled_date")?,
        time: get_time(row, "scheduled_time")?,
        status: get_status(row)?,
        buffer_override: row
            .try_get::<Option<i64>, _>("buffer_minutes")
            .map_err(|e| DbError::DecodeError(format!("buffer_minutes: {}", e)))?,
    })
}

impl BookingStore for SqlBookingStore {
    type Error = DbError;

    fn get_date_override(
        &self,
        provider_id: &str,
        date: NaiveDate,
    ) -> BoxFuture<'_, Option<DateOverride>, Self::Error> {
        let provider_id = provider_id.to_string();
        Box::pin(async move {
            let query = r#"
                SELECT user_id, date, is_available, start_time, end_time
                FROM availability_overrides
                WHERE user_id = $1 AND date = $2
            "#;

            let row = sqlx::query(query)
                .bind(&provider_id)
                .bind(date_text(date))
                .fetch_optional(self.db_client.pool())
                .await
                .map_err(|e| query_failed("Failed to load date override", e))?;

            row.map(|row| -> Result<DateOverride, DbError> {
                Ok(DateOverride {
                    provider_id: get_text(&row, "user_id")?,
                    date: get_date(&row, "date")?,
                    is_available: get_int(&row, "is_available")? != 0,
                    start_time: get_opt_time(&row, "start_time")?,
                    end_time: get_opt_time(&row, "end_time")?,
                })
            })
            .transpose()
        })
    }

    fn get_weekly_rule(
        &self,
        provider_id: &str,
        weekday: Weekday,
    ) -> BoxFuture<'_, Option<WeeklyAvailabilityRule>, Self::Error> {
        let provider_id = provider_id.to_string();
        Box::pin(async move {
            let query = r#"
                SELECT user_id, is_available, start_time, end_time
                FROM weekly_availability
                WHERE user_id = $1 AND day_of_week = $2
            "#;

            let row = sqlx::query(query)
                .bind(&provider_id)
                .bind(i64::from(weekday_index(weekday)))
                .fetch_optional(self.db_client.pool())
                .await
                .map_err(|e| query_failed("Failed to load weekly rule", e))?;

            row.map(|row| -> Result<WeeklyAvailabilityRule, DbError> {
                Ok(WeeklyAvailabilityRule {
                    provider_id: get_text(&row, "user_id")?,
                    weekday,
                    is_available: get_int(&row, "is_available")? != 0,
                    start_time: get_time(&row, "start_time")?,
                    end_time: get_time(&row, "end_time")?,
                })
            })
            .transpose()
        })
    }

    fn list_breaks(
        &self,
        provider_id: &str,
        filter: BreakRecurrence,
    ) -> BoxFuture<'_, Vec<BreakPeriod>, Self::Error> {
        let provider_id = provider_id.to_string();
        Box::pin(async move {
            let mut sql = String::from(
                "SELECT id, user_id, day_of_week, date, start_time, end_time FROM break_periods WHERE user_id = $1",
            );
            match filter {
                BreakRecurrence::Weekly(_) => {
                    sql.push_str(" AND day_of_week = $2 AND date IS NULL")
                }
                BreakRecurrence::OnDate(_) => {
                    sql.push_str(" AND date = $2 AND day_of_week IS NULL")
                }
            }
            sql.push_str(" ORDER BY start_time");

            let query = sqlx::query(&sql).bind(provider_id);
            let query = match filter {
                BreakRecurrence::Weekly(weekday) => query.bind(i64::from(weekday_index(weekday))),
                BreakRecurrence::OnDate(date) => query.bind(date_text(date)),
            };

            let rows = query
                .fetch_all(self.db_client.pool())
                .await
                .map_err(|e| query_failed("Failed to list breaks", e))?;

            rows.iter().map(break_from_row).collect::<Result<Vec<_>, _>>()
        })
    }

    fn get_buffer_setting(&self, provider_id: &str) -> BoxFuture<'_, Option<i64>, Self::Error> {
        let provider_id = provider_id.to_string();
        Box::pin(async move {
            let row = sqlx::query("SELECT buffer_minutes FROM user_settings WHERE user_id = $1")
                .bind(&provider_id)
                .fetch_optional(self.db_client.pool())
                .await
                .map_err(|e| query_failed("Failed to load buffer setting", e))?;

            row.map(|row| get_int(&row, "buffer_minutes")).transpose()
        })
    }

    fn list_active_bookings(
        &self,
        provider_id: &str,
        date: NaiveDate,
        collaborator_id: Option<&str>,
    ) -> BoxFuture<'_, Vec<ActiveBooking>, Self::Error> {
        let provider_id = provider_id.to_string();
        let collaborator_id = collaborator_id.map(str::to_string);
        Box::pin(async move {
            let mut sql = format!(
                "SELECT scheduled_time, buffer_minutes, service_id FROM schedules \
                 WHERE user_id = $1 AND scheduled_date = $2 AND status IN ({})",
                active_status_list()
            );
            if collaborator_id.is_some() {
                sql.push_str(" AND collaborator_id = $3");
            }
            sql.push_str(" ORDER BY scheduled_time");

            let mut query = sqlx::query(&sql)
                .bind(provider_id.clone())
                .bind(date_text(date));
            if let Some(collaborator_id) = &collaborator_id {
                query = query.bind(collaborator_id.clone());
            }

            let rows = query
                .fetch_all(self.db_client.pool())
                .await
                .map_err(|e| query_failed("Failed to list active bookings", e))?;

            rows.iter()
                .map(|row| -> Result<ActiveBooking, DbError> {
                    Ok(ActiveBooking {
                        start_time: get_time(row, "scheduled_time")?,
                        buffer_override: row
                            .try_get::<Option<i64>, _>("buffer_minutes")
                            .map_err(|e| DbError::DecodeError(format!("buffer_minutes: {}", e)))?,
                        service_id: get_text(row, "service_id")?,
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })
    }

    fn list_service_durations(
        &self,
        service_ids: &[String],
    ) -> BoxFuture<'_, HashMap<String, i64>, Self::Error> {
        let service_ids = service_ids.to_vec();
        Box::pin(async move {
            if service_ids.is_empty() {
                return Ok(HashMap::new());
            }

            let placeholders = (1..=service_ids.len())
                .map(|i| format!("${}", i))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "SELECT id, duration_minutes FROM services WHERE id IN ({})",
                placeholders
            );

            let mut query = sqlx::query(&sql);
            for id in &service_ids {
                query = query.bind(id.clone());
            }

            let rows = query
                .fetch_all(self.db_client.pool())
                .await
                .map_err(|e| query_failed("Failed to load service durations", e))?;

            rows.iter()
                .map(|row| -> Result<(String, i64), DbError> {
                    Ok((get_text(row, "id")?, get_int(row, "duration_minutes")?))
                })
                .collect::<Result<HashMap<_, _>, _>>()
        })
    }

    fn insert_booking(&self, booking: NewBooking) -> BoxFuture<'_, InsertOutcome, Self::Error> {
        Box::pin(async move {
            let id = Uuid::new_v4().to_string();
            let query = r#"
                INSERT INTO schedules
                    (id, user_id, client_id, service_id, collaborator_id, scheduled_date, scheduled_time, status)
                VALUES ($1, $2, $3, $4, NULLIF($5, ''), $6, $7, $8)
            "#;

            let result = sqlx::query(query)
                .bind(&id)
                .bind(&booking.provider_id)
                .bind(&booking.client_id)
                .bind(&booking.service_id)
                .bind(booking.collaborator_id.clone().unwrap_or_default())
                .bind(date_text(booking.date))
                .bind(format_time_of_day(booking.time))
                .bind(booking.status.as_str())
                .execute(self.db_client.pool())
                .await;

            match result {
                Ok(_) => {
                    info!(
                        "Booking {} written for provider {} on {} at {}",
                        id,
                        booking.provider_id,
                        booking.date,
                        format_time_of_day(booking.time)
                    );
                    Ok(InsertOutcome::Inserted(id))
                }
                Err(e) if is_unique_violation(&e) => {
                    debug!("Booking insert rejected by uniqueness constraint: {}", e);
                    Ok(InsertOutcome::Conflict)
                }
                Err(e) => Err(query_failed("Failed to insert booking", e)),
            }
        })
    }
}

impl ScheduleAdminStore for SqlBookingStore {
    type Error = DbError;

    fn upsert_weekly_rule(&self, rule: WeeklyAvailabilityRule) -> BoxFuture<'_, (), Self::Error> {
        Box::pin(async move {
            let query = r#"
                INSERT INTO weekly_availability (user_id, day_of_week, is_available, start_time, end_time)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (user_id, day_of_week) DO UPDATE SET
                    is_available = excluded.is_available,
                    start_time = excluded.start_time,
                    end_time = excluded.end_time
            "#;

            sqlx::query(query)
                .bind(&rule.provider_id)
                .bind(i64::from(weekday_index(rule.weekday)))
                .bind(i64::from(rule.is_available))
                .bind(format_time_of_day(rule.start_time))
                .bind(format_time_of_day(rule.end_time))
                .execute(self.db_client.pool())
                .await
                .map_err(|e| query_failed("Failed to save weekly rule", e))?;
            Ok(())
        })
    }

    fn upsert_date_override(
        &self,
        date_override: DateOverride,
    ) -> BoxFuture<'_, (), Self::Error> {
        Box::pin(async move {
            let query = r#"
                INSERT INTO availability_overrides (user_id, date, is_available, start_time, end_time)
                VALUES ($1, $2, $3, NULLIF($4, ''), NULLIF($5, ''))
                ON CONFLICT (user_id, date) DO UPDATE SET
                    is_available = excluded.is_available,
                    start_time = excluded.start_time,
                    end_time = excluded.end_time
            "#;

            // a closed day keeps no times
            let (start, end) = if date_override.is_available {
                (
                    date_override.start_time.map(format_time_of_day),
                    date_override.end_time.map(format_time_of_day),
                )
            } else {
                (None, None)
            };

            sqlx::query(query)
                .bind(&date_override.provider_id)
                .bind(date_text(date_override.date))
                .bind(i64::from(date_override.is_available))
                .bind(start.unwrap_or_default())
                .bind(end.unwrap_or_default())
                .execute(self.db_client.pool())
                .await
                .map_err(|e| query_failed("Failed to save date override", e))?;
            Ok(())
        })
    }

    fn set_buffer_minutes(
        &self,
        provider_id: &str,
        minutes: i64,
    ) -> BoxFuture<'_, (), Self::Error> {
        let provider_id = provider_id.to_string();
        Box::pin(async move {
            let query = r#"
                INSERT INTO user_settings (user_id, buffer_minutes)
                VALUES ($1, $2)
                ON CONFLICT (user_id) DO UPDATE SET buffer_minutes = excluded.buffer_minutes
            "#;

            sqlx::query(query)
                .bind(&provider_id)
                .bind(minutes)
                .execute(self.db_client.pool())
                .await
                .map_err(|e| query_failed("Failed to save buffer setting", e))?;
            Ok(())
        })
    }

    fn add_break(&self, break_period: BreakPeriod) -> BoxFuture<'_, String, Self::Error> {
        Box::pin(async move {
            let id = break_period
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());

            let query = match break_period.recurrence {
                BreakRecurrence::Weekly(weekday) => sqlx::query(
                    r#"
                    INSERT INTO break_periods (id, user_id, day_of_week, start_time, end_time)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(id.clone())
                .bind(break_period.provider_id.clone())
                .bind(i64::from(weekday_index(weekday))),
                BreakRecurrence::OnDate(date) => sqlx::query(
                    r#"
                    INSERT INTO break_periods (id, user_id, date, start_time, end_time)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(id.clone())
                .bind(break_period.provider_id.clone())
                .bind(date_text(date)),
            };

            query
                .bind(format_time_of_day(break_period.start_time))
                .bind(format_time_of_day(break_period.end_time))
                .execute(self.db_client.pool())
                .await
                .map_err(|e| query_failed("Failed to add break", e))?;

            debug!("Break {} added for provider {}", id, break_period.provider_id);
            Ok(id)
        })
    }

    fn delete_break(&self, provider_id: &str, break_id: &str) -> BoxFuture<'_, bool, Self::Error> {
        let provider_id = provider_id.to_string();
        let break_id = break_id.to_string();
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM break_periods WHERE id = $1 AND user_id = $2")
                .bind(&break_id)
                .bind(&provider_id)
                .execute(self.db_client.pool())
                .await
                .map_err(|e| query_failed("Failed to delete break", e))?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn upsert_service(&self, service: Service) -> BoxFuture<'_, (), Self::Error> {
        Box::pin(async move {
            let query = r#"
                INSERT INTO services (id, user_id, name, duration_minutes, price, is_active)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (id) DO UPDATE SET
                    name = excluded.name,
                    duration_minutes = excluded.duration_minutes,
                    price = excluded.price,
                    is_active = excluded.is_active
            "#;

            sqlx::query(query)
                .bind(&service.id)
                .bind(&service.provider_id)
                .bind(&service.name)
                .bind(service.duration_minutes)
                .bind(service.price)
                .bind(i64::from(service.is_active))
                .execute(self.db_client.pool())
                .await
                .map_err(|e| query_failed("Failed to save service", e))?;
            Ok(())
        })
    }

    fn list_bookings(
        &self,
        provider_id: &str,
        date: NaiveDate,
    ) -> BoxFuture<'_, Vec<Booking>, Self::Error> {
        let provider_id = provider_id.to_string();
        Box::pin(async move {
            let query = r#"
                SELECT id, user_id, client_id, service_id, collaborator_id,
                       scheduled_date, scheduled_time, status, buffer_minutes
                FROM schedules
                WHERE user_id = $1 AND scheduled_date = $2
                ORDER BY scheduled_time
            "#;

            let rows = sqlx::query(query)
                .bind(&provider_id)
                .bind(date_text(date))
                .fetch_all(self.db_client.pool())
                .await
                .map_err(|e| query_failed("Failed to list bookings", e))?;

            rows.iter().map(booking_from_row).collect::<Result<Vec<_>, _>>()
        })
    }

    fn update_booking_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
    ) -> BoxFuture<'_, bool, Self::Error> {
        let booking_id = booking_id.to_string();
        Box::pin(async move {
            let result = sqlx::query("UPDATE schedules SET status = $1 WHERE id = $2")
                .bind(status.as_str())
                .bind(&booking_id)
                .execute(self.db_client.pool())
                .await
                .map_err(|e| query_failed("Failed to update booking status", e))?;

            if result.rows_affected() > 0 {
                info!("Booking {} marked {}", booking_id, status);
                Ok(true)
            } else {
                Ok(false)
            }
        })
    }
}

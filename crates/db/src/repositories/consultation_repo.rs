//! Repository for the `consultations` table.

use atelier_core::availability;
use atelier_core::consultation::{Consultation, NewConsultation};
use atelier_core::store::ConsultationFilter;
use atelier_core::types::{DbId, Timestamp};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::consultation::ConsultationRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, client_id, designer_id, project_id, topic, notes, scheduled_start, \
     duration_minutes, scheduled_end, occupied_from, status, meeting_type, rating, \
     client_feedback, rated_at, reminder_sent, created_at, updated_at";

/// Provides persistence operations for consultations.
pub struct ConsultationRepo;

impl ConsultationRepo {
    /// Insert a new consultation, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &NewConsultation,
    ) -> Result<ConsultationRow, sqlx::Error> {
        let end = input.scheduled_end();
        let occupied = availability::occupied_interval(input.scheduled_start, end);
        let query = format!(
            "INSERT INTO consultations
                (client_id, designer_id, project_id, topic, notes, scheduled_start,
                 duration_minutes, scheduled_end, occupied_from, status, meeting_type,
                 created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ConsultationRow>(&query)
            .bind(input.client_id)
            .bind(input.designer_id)
            .bind(input.project_id)
            .bind(&input.topic)
            .bind(&input.notes)
            .bind(input.scheduled_start)
            .bind(input.duration_minutes)
            .bind(end)
            .bind(occupied.start)
            .bind(input.status.as_str())
            .bind(input.meeting_type.as_str())
            .bind(input.created_at)
            .fetch_one(pool)
            .await
    }

    /// Find a consultation by its internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ConsultationRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM consultations WHERE id = $1");
        sqlx::query_as::<_, ConsultationRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Overwrite every mutable column. Returns `false` if no row matched.
    ///
    /// A reminder flag already set for the stored start survives a save
    /// from a copy loaded before the sweep ran.
    pub async fn update(pool: &PgPool, c: &Consultation) -> Result<bool, sqlx::Error> {
        let occupied = c.occupied_interval();
        let result = sqlx::query(
            "UPDATE consultations SET
                designer_id = $2,
                project_id = $3,
                topic = $4,
                notes = $5,
                scheduled_start = $6,
                duration_minutes = $7,
                scheduled_end = $8,
                occupied_from = $9,
                status = $10,
                meeting_type = $11,
                rating = $12,
                client_feedback = $13,
                rated_at = $14,
                reminder_sent = CASE WHEN scheduled_start = $6
                    THEN reminder_sent OR $15 ELSE $15 END,
                updated_at = $16
             WHERE id = $1",
        )
        .bind(c.id)
        .bind(c.designer_id)
        .bind(c.project_id)
        .bind(&c.topic)
        .bind(&c.notes)
        .bind(c.scheduled_start)
        .bind(c.duration_minutes)
        .bind(occupied.end)
        .bind(occupied.start)
        .bind(c.status.as_str())
        .bind(c.meeting_type.as_str())
        .bind(c.rating)
        .bind(&c.client_feedback)
        .bind(c.rated_at)
        .bind(c.reminder_sent)
        .bind(c.updated_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List consultations matching `filter`, ordered by start then id.
    pub async fn query(
        pool: &PgPool,
        filter: &ConsultationFilter,
    ) -> Result<Vec<ConsultationRow>, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {COLUMNS} FROM consultations WHERE true"
        ));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY scheduled_start, id");
        builder
            .build_query_as::<ConsultationRow>()
            .fetch_all(pool)
            .await
    }

    /// Flag the reminder as sent if the row still starts at `scheduled_start`.
    pub async fn mark_reminder_sent(
        pool: &PgPool,
        id: DbId,
        scheduled_start: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE consultations SET reminder_sent = true, updated_at = NOW()
             WHERE id = $1 AND scheduled_start = $2 AND reminder_sent = false",
        )
        .bind(id)
        .bind(scheduled_start)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Append the filter's conditions as `AND ...` clauses.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ConsultationFilter) {
    if let Some(designer_id) = filter.designer_id {
        builder.push(" AND designer_id = ").push_bind(designer_id);
    }
    if let Some(client_id) = filter.client_id {
        builder.push(" AND client_id = ").push_bind(client_id);
    }
    if !filter.statuses.is_empty() {
        let statuses: Vec<String> = filter
            .statuses
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        builder.push(" AND status = ANY(").push_bind(statuses).push(")");
    }
    if let Some(window) = filter.occupied_overlaps {
        builder
            .push(" AND occupied_from < ")
            .push_bind(window.end)
            .push(" AND scheduled_end > ")
            .push_bind(window.start);
    }
    if let Some(window) = filter.scheduled_overlaps {
        builder
            .push(" AND scheduled_start < ")
            .push_bind(window.end)
            .push(" AND scheduled_end > ")
            .push_bind(window.start);
    }
    if let Some(window) = filter.starts_within {
        builder
            .push(" AND scheduled_start >= ")
            .push_bind(window.start)
            .push(" AND scheduled_start < ")
            .push_bind(window.end);
    }
    if let Some(sent) = filter.reminder_sent {
        builder.push(" AND reminder_sent = ").push_bind(sent);
    }
    if let Some(id) = filter.exclude_id {
        builder.push(" AND id <> ").push_bind(id);
    }
}

#[cfg(test)]
mod tests {
    use atelier_core::availability::TimeWindow;
    use atelier_core::consultation::ConsultationStatus;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn sql_for(filter: &ConsultationFilter) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT id FROM consultations WHERE true");
        push_filter(&mut builder, filter);
        builder.into_sql()
    }

    #[test]
    fn empty_filter_adds_no_conditions() {
        assert_eq!(
            sql_for(&ConsultationFilter::default()),
            "SELECT id FROM consultations WHERE true"
        );
    }

    #[test]
    fn occupying_designer_filter_binds_in_order() {
        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        )
        .unwrap();
        let filter = ConsultationFilter {
            occupied_overlaps: Some(window),
            ..ConsultationFilter::for_designer(4).occupying()
        }
        .excluding(Some(9));
        assert_eq!(
            sql_for(&filter),
            "SELECT id FROM consultations WHERE true AND designer_id = $1 \
             AND status = ANY($2) AND occupied_from < $3 AND scheduled_end > $4 AND id <> $5"
        );
    }

    #[test]
    fn reminder_filter() {
        let filter = ConsultationFilter {
            reminder_sent: Some(false),
            ..ConsultationFilter::default().with_statuses(&[ConsultationStatus::Confirmed])
        };
        assert_eq!(
            sql_for(&filter),
            "SELECT id FROM consultations WHERE true AND status = ANY($1) AND reminder_sent = $2"
        );
    }
}

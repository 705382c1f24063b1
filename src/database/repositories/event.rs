//! Event repository implementation
//!
//! Participant mutations are single conditional statements: the transition's
//! precondition sits in the `WHERE` clause, so a write that lost a race simply
//! matches no row.

use async_trait::async_trait;
use sqlx::PgPool;
use chrono::{DateTime, Utc};
use crate::database::store::{EventStore, InsertOutcome};
use crate::models::event::{Event, CreateEventRequest, UpdateEventRequest, EventFilter};
use crate::models::participant::{Participant, Transition};
use crate::utils::errors::Result;

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for EventRepository {
    /// Create a new event
    async fn create_event(&self, request: CreateEventRequest, created_by: i64) -> Result<Event> {
        let now = Utc::now();
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (title, organization, description, location, event_date, category, max_participants, hours, image_url, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING id, title, organization, description, location, event_date, category, status, max_participants, registered, hours, image_url, created_by, reminder_sent, created_at, updated_at
            "#
        )
        .bind(request.title)
        .bind(request.organization)
        .bind(request.description)
        .bind(request.location)
        .bind(request.event_date)
        .bind(request.category)
        .bind(request.max_participants)
        .bind(request.hours)
        .bind(request.image_url)
        .bind(created_by)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Find event by ID
    async fn find_event(&self, event_id: i64) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            "SELECT id, title, organization, description, location, event_date, category, status, max_participants, registered, hours, image_url, created_by, reminder_sent, created_at, updated_at FROM events WHERE id = $1"
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Partial update; matches nothing when the new capacity is below `registered`
    async fn update_event(&self, event_id: i64, request: UpdateEventRequest) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET title = COALESCE($2, title),
                organization = COALESCE($3, organization),
                description = COALESCE($4, description),
                location = COALESCE($5, location),
                reminder_sent = CASE
                    WHEN $6::timestamptz IS NOT NULL AND $6 <> event_date THEN FALSE
                    ELSE reminder_sent
                END,
                event_date = COALESCE($6, event_date),
                category = COALESCE($7, category),
                status = COALESCE($8, status),
                max_participants = COALESCE($9, max_participants),
                hours = COALESCE($10, hours),
                image_url = COALESCE($11, image_url),
                updated_at = $12
            WHERE id = $1 AND ($9::integer IS NULL OR $9 >= registered)
            RETURNING id, title, organization, description, location, event_date, category, status, max_participants, registered, hours, image_url, created_by, reminder_sent, created_at, updated_at
            "#
        )
        .bind(event_id)
        .bind(request.title)
        .bind(request.organization)
        .bind(request.description)
        .bind(request.location)
        .bind(request.event_date)
        .bind(request.category)
        .bind(request.status)
        .bind(request.max_participants)
        .bind(request.hours)
        .bind(request.image_url)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Delete event; participants cascade
    async fn delete_event(&self, event_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List events with filters and pagination
    async fn list_events(&self, filter: &EventFilter, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, title, organization, description, location, event_date, category, status, max_participants, registered, hours, image_url, created_by, reminder_sent, created_at, updated_at
            FROM events
            WHERE ($1::event_category IS NULL OR category = $1)
              AND ($2::event_status IS NULL OR status = $2)
              AND (NOT $3 OR (status = 'upcoming' AND event_date > $4))
              AND ($5::bigint IS NULL OR created_by = $5)
            ORDER BY event_date ASC, id ASC
            LIMIT $6 OFFSET $7
            "#
        )
        .bind(filter.category)
        .bind(filter.status)
        .bind(filter.upcoming_only)
        .bind(now)
        .bind(filter.created_by)
        .bind(filter.limit.unwrap_or(20))
        .bind(filter.offset.unwrap_or(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Get event participants in registration order
    async fn participants(&self, event_id: i64) -> Result<Vec<Participant>> {
        let participants = sqlx::query_as::<_, Participant>(
            r#"
            SELECT event_id, user_id, status, registered_at, reviewed_at, reviewed_by, checked_in, check_in_time, completed, completed_at
            FROM event_participants
            WHERE event_id = $1
            ORDER BY registered_at ASC, user_id ASC
            "#
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    async fn find_participant(&self, event_id: i64, user_id: i64) -> Result<Option<Participant>> {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            SELECT event_id, user_id, status, registered_at, reviewed_at, reviewed_by, checked_in, check_in_time, completed, completed_at
            FROM event_participants
            WHERE event_id = $1 AND user_id = $2
            "#
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }

    async fn participations_for_user(&self, user_id: i64, event_ids: &[i64]) -> Result<Vec<Participant>> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }

        let participants = sqlx::query_as::<_, Participant>(
            r#"
            SELECT event_id, user_id, status, registered_at, reviewed_at, reviewed_by, checked_in, check_in_time, completed, completed_at
            FROM event_participants
            WHERE user_id = $1 AND event_id = ANY($2)
            "#
        )
        .bind(user_id)
        .bind(event_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    async fn insert_participant(&self, event_id: i64, user_id: i64, now: DateTime<Utc>) -> Result<InsertOutcome> {
        let mut tx = self.pool.begin().await?;

        let seat = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE events
            SET registered = registered + 1, updated_at = $3
            WHERE id = $1
              AND created_by <> $2
              AND status = 'upcoming'
              AND event_date > $3
              AND registered < max_participants
            RETURNING id
            "#
        )
        .bind(event_id)
        .bind(user_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        if seat.is_none() {
            tx.rollback().await?;
            return Ok(InsertOutcome::Rejected);
        }

        let participant = sqlx::query_as::<_, Participant>(
            r#"
            INSERT INTO event_participants (event_id, user_id, status, registered_at)
            VALUES ($1, $2, 'pending', $3)
            ON CONFLICT (event_id, user_id) DO NOTHING
            RETURNING event_id, user_id, status, registered_at, reviewed_at, reviewed_by, checked_in, check_in_time, completed, completed_at
            "#
        )
        .bind(event_id)
        .bind(user_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        match participant {
            Some(participant) => {
                tx.commit().await?;
                Ok(InsertOutcome::Inserted(participant))
            }
            None => {
                tx.rollback().await?;
                Ok(InsertOutcome::Duplicate)
            }
        }
    }

    async fn remove_participant(&self, event_id: i64, user_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM event_participants WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE events SET registered = registered - 1, updated_at = $2 WHERE id = $1 AND registered > 0")
            .bind(event_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn apply_transition(
        &self,
        event_id: i64,
        user_id: i64,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<Option<Participant>> {
        let participant = match transition {
            Transition::Review { decision, reviewer } => {
                sqlx::query_as::<_, Participant>(
                    r#"
                    UPDATE event_participants
                    SET status = $3, reviewed_at = $4, reviewed_by = $5
                    WHERE event_id = $1 AND user_id = $2 AND status = 'pending'
                    RETURNING event_id, user_id, status, registered_at, reviewed_at, reviewed_by, checked_in, check_in_time, completed, completed_at
                    "#
                )
                .bind(event_id)
                .bind(user_id)
                .bind(decision.status())
                .bind(now)
                .bind(reviewer)
                .fetch_optional(&self.pool)
                .await?
            }
            Transition::CheckIn => {
                sqlx::query_as::<_, Participant>(
                    r#"
                    UPDATE event_participants
                    SET checked_in = TRUE, check_in_time = $3
                    WHERE event_id = $1 AND user_id = $2 AND status = 'approved' AND NOT checked_in
                    RETURNING event_id, user_id, status, registered_at, reviewed_at, reviewed_by, checked_in, check_in_time, completed, completed_at
                    "#
                )
                .bind(event_id)
                .bind(user_id)
                .bind(now)
                .fetch_optional(&self.pool)
                .await?
            }
            Transition::UndoCheckIn => {
                sqlx::query_as::<_, Participant>(
                    r#"
                    UPDATE event_participants
                    SET checked_in = FALSE, check_in_time = NULL
                    WHERE event_id = $1 AND user_id = $2 AND checked_in AND NOT completed
                    RETURNING event_id, user_id, status, registered_at, reviewed_at, reviewed_by, checked_in, check_in_time, completed, completed_at
                    "#
                )
                .bind(event_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?
            }
            Transition::Complete => {
                sqlx::query_as::<_, Participant>(
                    r#"
                    UPDATE event_participants
                    SET completed = TRUE, completed_at = $3
                    WHERE event_id = $1 AND user_id = $2 AND checked_in AND NOT completed
                    RETURNING event_id, user_id, status, registered_at, reviewed_at, reviewed_by, checked_in, check_in_time, completed, completed_at
                    "#
                )
                .bind(event_id)
                .bind(user_id)
                .bind(now)
                .fetch_optional(&self.pool)
                .await?
            }
            Transition::UndoComplete => {
                sqlx::query_as::<_, Participant>(
                    r#"
                    UPDATE event_participants
                    SET completed = FALSE, completed_at = NULL
                    WHERE event_id = $1 AND user_id = $2 AND completed
                    RETURNING event_id, user_id, status, registered_at, reviewed_at, reviewed_by, checked_in, check_in_time, completed, completed_at
                    "#
                )
                .bind(event_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        Ok(participant)
    }

    async fn events_due_for_reminder(&self, now: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, title, organization, description, location, event_date, category, status, max_participants, registered, hours, image_url, created_by, reminder_sent, created_at, updated_at
            FROM events
            WHERE status = 'upcoming' AND NOT reminder_sent AND event_date > $1 AND event_date <= $2
            ORDER BY event_date ASC
            "#
        )
        .bind(now)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn mark_reminder_sent(&self, event_id: i64) -> Result<()> {
        sqlx::query("UPDATE events SET reminder_sent = TRUE WHERE id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

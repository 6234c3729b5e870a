//! PostgreSQL implementation of the persistence layer.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::models::{
    ATTENDEE_COLUMNS, AttendeeRow, EVENT_COLUMNS, EventRow, LEGACY_COLUMNS,
    LegacyRegistrationRow, TICKET_COLUMNS, TicketRow, attendee_from_row, event_from_row,
    ticket_from_legacy, ticket_from_row,
};
use super::schema::SchemaVersion;
use super::{EventDirectory, TicketMutation, TicketStore};
use crate::domain::{Attendee, EventId, EventSnapshot, ScanCode, Ticket, TicketId, UserId};
use crate::error::TicketingError;

/// PostgreSQL-backed ticket store using `sqlx::PgPool`.
///
/// Per-ticket mutations run as `SELECT … FOR UPDATE` / write / commit, so
/// concurrent check-ins and cancellations on the same ticket are
/// serialized by the database across process instances.
#[derive(Debug, Clone)]
pub struct PostgresTicketStore {
    pool: PgPool,
    schema: SchemaVersion,
}

impl PostgresTicketStore {
    /// Detects the schema and, unless it is legacy, applies pending
    /// migrations when `run_migrations` is set.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::Storage`] if detection or migration fails.
    pub async fn open(pool: PgPool, run_migrations: bool) -> Result<Self, TicketingError> {
        let mut schema = SchemaVersion::detect(&pool).await?;
        match schema {
            SchemaVersion::Legacy => {
                tracing::warn!("legacy event_registrations schema detected; serving read-only");
            }
            _ if run_migrations => {
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .map_err(|e| TicketingError::Storage(e.to_string()))?;
                schema = SchemaVersion::Current;
            }
            _ => {}
        }
        tracing::info!(%schema, "ticket store ready");
        Ok(Self { pool, schema })
    }

    /// Creates a store over an already-migrated schema.
    #[must_use]
    pub fn with_schema(pool: PgPool, schema: SchemaVersion) -> Self {
        Self { pool, schema }
    }

    /// Schema detected at startup.
    #[must_use]
    pub const fn schema(&self) -> SchemaVersion {
        self.schema
    }

    fn ensure_writable(&self) -> Result<(), TicketingError> {
        if self.schema.is_writable() {
            Ok(())
        } else {
            Err(TicketingError::LegacySchemaReadOnly)
        }
    }

    async fn legacy_query(
        &self,
        filter: &str,
        bind: LegacyFilter,
    ) -> Result<Vec<Ticket>, TicketingError> {
        let sql = format!("SELECT {LEGACY_COLUMNS} FROM event_registrations WHERE {filter}");
        let query = sqlx::query_as::<_, LegacyRegistrationRow>(&sql);
        let rows = match bind {
            LegacyFilter::Id(id) => query.bind(id),
            LegacyFilter::Code(code) => query.bind(code),
        }
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ticket_from_legacy).collect()
    }
}

enum LegacyFilter {
    Id(Uuid),
    Code(String),
}

/// Maps unique-index violations to [`TicketingError::DuplicateIdentifier`].
fn map_write_error(e: sqlx::Error) -> TicketingError {
    if let sqlx::Error::Database(db) = &e
        && db.is_unique_violation()
    {
        return TicketingError::DuplicateIdentifier(
            db.constraint().unwrap_or("unique index").to_string(),
        );
    }
    TicketingError::from(e)
}

/// Loads attendees for the given tickets, grouped and in issuance order.
async fn load_attendees(
    conn: &mut PgConnection,
    ticket_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Attendee>>, TicketingError> {
    let sql = format!(
        "SELECT {ATTENDEE_COLUMNS} FROM ticket_attendees \
         WHERE ticket_id = ANY($1) ORDER BY ticket_id, position"
    );
    let rows = sqlx::query_as::<_, AttendeeRow>(&sql)
        .bind(ticket_ids)
        .fetch_all(&mut *conn)
        .await?;

    let mut grouped: HashMap<Uuid, Vec<Attendee>> = HashMap::new();
    for row in rows {
        grouped.entry(row.1).or_default().push(attendee_from_row(row));
    }
    Ok(grouped)
}

/// Joins ticket rows with their attendees.
async fn assemble(
    conn: &mut PgConnection,
    rows: Vec<TicketRow>,
) -> Result<Vec<Ticket>, TicketingError> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.0).collect();
    let mut attendees = load_attendees(conn, &ids).await?;
    rows.into_iter()
        .map(|row| {
            let own = attendees.remove(&row.0).unwrap_or_default();
            ticket_from_row(row, own)
        })
        .collect()
}

#[async_trait]
impl TicketStore for PostgresTicketStore {
    async fn insert_ticket(
        &self,
        ticket: &Ticket,
        capacity: Option<u32>,
    ) -> Result<(), TicketingError> {
        self.ensure_writable()?;
        let quantity = i32::try_from(ticket.quantity)
            .map_err(|_| TicketingError::InvalidRequest("quantity out of range".to_string()))?;

        let mut tx = self.pool.begin().await?;

        if let Some(capacity) = capacity {
            // Serializes issuance per event without locking the events table.
            sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
                .bind(ticket.event_id.to_string())
                .execute(&mut *tx)
                .await?;
            let held = sqlx::query_scalar::<_, i64>(
                "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM tickets \
                 WHERE event_id = $1 AND status NOT IN ('CANCELLED', 'REFUNDED')",
            )
            .bind(ticket.event_id.as_uuid())
            .fetch_one(&mut *tx)
            .await?;
            let remaining = capacity.saturating_sub(u32::try_from(held).unwrap_or(u32::MAX));
            if ticket.quantity > remaining {
                return Err(TicketingError::SoldOut {
                    event_id: ticket.event_id,
                    remaining,
                });
            }
        }

        sqlx::query(&format!(
            "INSERT INTO tickets ({TICKET_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        ))
        .bind(ticket.id.as_uuid())
        .bind(ticket.ticket_number.as_str())
        .bind(ticket.scan_code.as_str())
        .bind(ticket.owner_id.as_uuid())
        .bind(ticket.event_id.as_uuid())
        .bind(quantity)
        .bind(ticket.total_amount)
        .bind(ticket.payment_status.as_str())
        .bind(ticket.payment_ref.as_deref())
        .bind(ticket.status.as_str())
        .bind(ticket.purchased_at)
        .bind(ticket.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        for (position, attendee) in ticket.attendees.iter().enumerate() {
            sqlx::query(
                "INSERT INTO ticket_attendees \
                 (id, ticket_id, position, full_name, email, phone, checked_in_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(attendee.id.as_uuid())
            .bind(ticket.id.as_uuid())
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .bind(&attendee.full_name)
            .bind(&attendee.email)
            .bind(attendee.phone.as_deref())
            .bind(attendee.checked_in_at)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn ticket_by_id(&self, id: TicketId) -> Result<Option<Ticket>, TicketingError> {
        if self.schema == SchemaVersion::Legacy {
            let found = self
                .legacy_query("id = $1", LegacyFilter::Id(*id.as_uuid()))
                .await?;
            return Ok(found.into_iter().next());
        }

        let mut conn = self.pool.acquire().await?;
        let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1");
        let rows = sqlx::query_as::<_, TicketRow>(&sql)
            .bind(id.as_uuid())
            .fetch_all(&mut *conn)
            .await?;
        Ok(assemble(&mut conn, rows).await?.into_iter().next())
    }

    async fn ticket_by_scan_code(
        &self,
        code: &ScanCode,
    ) -> Result<Option<Ticket>, TicketingError> {
        if self.schema == SchemaVersion::Legacy {
            let found = self
                .legacy_query("qr_code = $1", LegacyFilter::Code(code.as_str().to_string()))
                .await?;
            return Ok(found.into_iter().next());
        }

        let mut conn = self.pool.acquire().await?;
        let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE scan_code = $1");
        let rows = sqlx::query_as::<_, TicketRow>(&sql)
            .bind(code.as_str())
            .fetch_all(&mut *conn)
            .await?;
        Ok(assemble(&mut conn, rows).await?.into_iter().next())
    }

    async fn tickets_by_owner(&self, owner: UserId) -> Result<Vec<Ticket>, TicketingError> {
        if self.schema == SchemaVersion::Legacy {
            return self
                .legacy_query(
                    "user_id = $1 ORDER BY registered_at DESC",
                    LegacyFilter::Id(*owner.as_uuid()),
                )
                .await;
        }

        let mut conn = self.pool.acquire().await?;
        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE owner_id = $1 ORDER BY purchased_at DESC"
        );
        let rows = sqlx::query_as::<_, TicketRow>(&sql)
            .bind(owner.as_uuid())
            .fetch_all(&mut *conn)
            .await?;
        assemble(&mut conn, rows).await
    }

    async fn modify_ticket(
        &self,
        id: TicketId,
        mutation: TicketMutation,
    ) -> Result<Ticket, TicketingError> {
        self.ensure_writable()?;
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1 FOR UPDATE");
        let rows = sqlx::query_as::<_, TicketRow>(&sql)
            .bind(id.as_uuid())
            .fetch_all(&mut *tx)
            .await?;
        let before = assemble(&mut tx, rows)
            .await?
            .into_iter()
            .next()
            .ok_or(TicketingError::TicketNotFound(id))?;

        // Dropping `tx` on any early return rolls back and releases the lock.
        let mut after = before.clone();
        mutation(&mut after)?;

        sqlx::query(
            "UPDATE tickets SET status = $2, payment_status = $3, payment_ref = $4, \
             updated_at = $5 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(after.status.as_str())
        .bind(after.payment_status.as_str())
        .bind(after.payment_ref.as_deref())
        .bind(after.updated_at)
        .execute(&mut *tx)
        .await?;

        for (old, new) in before.attendees.iter().zip(&after.attendees) {
            if old.checked_in_at != new.checked_in_at {
                sqlx::query(
                    "UPDATE ticket_attendees SET checked_in_at = $3 \
                     WHERE id = $1 AND ticket_id = $2",
                )
                .bind(new.id.as_uuid())
                .bind(id.as_uuid())
                .bind(new.checked_in_at)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(after)
    }

    async fn delete_tickets_for_event(&self, event_id: EventId) -> Result<u64, TicketingError> {
        self.ensure_writable()?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM ticket_attendees WHERE ticket_id IN \
             (SELECT id FROM tickets WHERE event_id = $1)",
        )
        .bind(event_id.as_uuid())
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM tickets WHERE event_id = $1")
            .bind(event_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }
}

/// Event directory reading the collaborator-owned `events` table.
#[derive(Debug, Clone)]
pub struct PostgresEventDirectory {
    pool: PgPool,
}

impl PostgresEventDirectory {
    /// Creates a directory over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventDirectory for PostgresEventDirectory {
    async fn event(&self, id: EventId) -> Result<Option<EventSnapshot>, TicketingError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(event_from_row).transpose()
    }
}

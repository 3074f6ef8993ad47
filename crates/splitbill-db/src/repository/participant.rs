//! # Participant Repository
//!
//! People sharing a bill. Insertion counts the bill's participants in the
//! same statement, so the limit holds under concurrent adds:
//!
//! ```text
//! INSERT INTO participants (...) SELECT ...
//!  WHERE (SELECT COUNT(*) FROM participants WHERE bill_id = ?) < MAX_PARTICIPANTS
//! ```
//!
//! Removal takes their assignments with them:
//!
//! ```text
//! BEGIN
//!   SELECT 1 FROM participants WHERE id = ? AND bill_id = ?   (miss → false)
//!   DELETE FROM item_assignments WHERE participant_id = ?
//!   DELETE FROM participants WHERE id = ?
//! COMMIT
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteExecutor;
use sqlx::SqlitePool;
use tracing::debug;

use splitbill_core::{
    BillId, NewParticipant, Participant, ParticipantId, DEFAULT_PAYMENT_STATUS, MAX_PARTICIPANTS,
};

use super::parse_bill_id;
use crate::error::{DbError, DbResult};

const PARTICIPANT_COLUMNS: &str = "id, bill_id, name, payment_status, \
     share_of_common_costs_cents, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ParticipantRecord {
    id: i64,
    bill_id: String,
    name: String,
    payment_status: String,
    share_of_common_costs_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ParticipantRecord> for Participant {
    type Error = DbError;

    fn try_from(record: ParticipantRecord) -> DbResult<Self> {
        Ok(Participant {
            id: record.id,
            bill_id: parse_bill_id(&record.bill_id)?,
            name: record.name,
            payment_status: record.payment_status,
            share_of_common_costs_cents: record.share_of_common_costs_cents,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

pub(crate) async fn fetch_participants<'e, E>(
    executor: E,
    bill_id: BillId,
) -> DbResult<Vec<Participant>>
where
    E: SqliteExecutor<'e>,
{
    let sql =
        format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE bill_id = ?1 ORDER BY id");
    sqlx::query_as::<_, ParticipantRecord>(&sql)
        .bind(bill_id.to_string())
        .fetch_all(executor)
        .await?
        .into_iter()
        .map(Participant::try_from)
        .collect()
}

/// Repository for participant database operations.
#[derive(Debug, Clone)]
pub struct ParticipantRepository {
    pool: SqlitePool,
}

impl ParticipantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ParticipantRepository { pool }
    }

    /// Inserts a participant with payment status `unpaid`.
    ///
    /// Returns `None` when the bill already has `MAX_PARTICIPANTS`.
    pub async fn insert(
        &self,
        bill_id: BillId,
        participant: &NewParticipant,
    ) -> DbResult<Option<Participant>> {
        debug!(bill_id = %bill_id, name = %participant.name, "Inserting participant");

        let now = Utc::now();
        let sql = format!(
            "INSERT INTO participants (bill_id, name, payment_status, \
                share_of_common_costs_cents, created_at, updated_at) \
             SELECT ?1, ?2, ?3, ?4, ?5, ?6 \
             WHERE (SELECT COUNT(*) FROM participants WHERE bill_id = ?1) < ?7 \
             RETURNING {PARTICIPANT_COLUMNS}"
        );
        sqlx::query_as::<_, ParticipantRecord>(&sql)
            .bind(bill_id.to_string())
            .bind(&participant.name)
            .bind(DEFAULT_PAYMENT_STATUS)
            .bind(participant.share_of_common_costs_cents)
            .bind(now)
            .bind(now)
            .bind(MAX_PARTICIPANTS as i64)
            .fetch_optional(&self.pool)
            .await?
            .map(Participant::try_from)
            .transpose()
    }

    pub async fn get_by_id(&self, participant_id: ParticipantId) -> DbResult<Option<Participant>> {
        let sql = format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = ?1");
        sqlx::query_as::<_, ParticipantRecord>(&sql)
            .bind(participant_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Participant::try_from)
            .transpose()
    }

    pub async fn list_for_bill(&self, bill_id: BillId) -> DbResult<Vec<Participant>> {
        fetch_participants(&self.pool, bill_id).await
    }

    /// Deletes the participant's assignments and then the participant, in
    /// one transaction. Returns `false` if the participant isn't on `bill_id`.
    pub async fn delete_cascade(
        &self,
        bill_id: BillId,
        participant_id: ParticipantId,
    ) -> DbResult<bool> {
        debug!(bill_id = %bill_id, id = participant_id, "Deleting participant");

        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM participants WHERE id = ?1 AND bill_id = ?2")
                .bind(participant_id)
                .bind(bill_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(false);
        }

        let edges = sqlx::query("DELETE FROM item_assignments WHERE participant_id = ?1")
            .bind(participant_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM participants WHERE id = ?1")
            .bind(participant_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            id = participant_id,
            assignments = edges.rows_affected(),
            "Participant deleted"
        );
        Ok(true)
    }
}

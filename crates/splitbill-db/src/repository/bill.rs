//! # Bill Repository
//!
//! Bills, their status, and the consistent snapshot the allocation reads.
//!
//! ## Guarded Status Change
//! ```text
//! UPDATE bills SET status = ?new
//!  WHERE id = ?id AND status IN (statuses allowed to move to ?new)
//!   1 row  → Applied
//!   0 rows → bill exists ? Refused(current) : BillMissing
//! ```
//! The guard and the write are one statement, so two writers racing for
//! the same move cannot both succeed.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnection, SqliteExecutor};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use splitbill_core::{Bill, BillId, BillSnapshot, BillStatus, BillUpdate, NewBill};

use super::assignment::fetch_assignments;
use super::item::fetch_items;
use super::parse_bill_id;
use super::participant::fetch_participants;
use crate::error::{DbError, DbResult};

const BILL_COLUMNS: &str = "id, name, status, tax_cents, tip_cents, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct BillRecord {
    id: String,
    name: String,
    status: BillStatus,
    tax_cents: i64,
    tip_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BillRecord> for Bill {
    type Error = DbError;

    fn try_from(record: BillRecord) -> DbResult<Self> {
        Ok(Bill {
            id: parse_bill_id(&record.id)?,
            name: record.name,
            status: record.status,
            tax_cents: record.tax_cents,
            tip_cents: record.tip_cents,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

pub(crate) async fn fetch_bill<'e, E>(executor: E, bill_id: BillId) -> DbResult<Option<Bill>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = ?1");
    sqlx::query_as::<_, BillRecord>(&sql)
        .bind(bill_id.to_string())
        .fetch_optional(executor)
        .await?
        .map(Bill::try_from)
        .transpose()
}

/// Outcome of a write guarded by the bill's status.
#[derive(Debug)]
pub enum StatusChange<T> {
    Applied(T),
    /// The bill's current status may not move to the requested one.
    Refused(BillStatus),
    BillMissing,
}

/// Moves the bill to `status` if [`BillStatus::can_transition_to`] allows it.
pub(crate) async fn transition_status(
    conn: &mut SqliteConnection,
    bill_id: BillId,
    status: BillStatus,
) -> DbResult<StatusChange<Bill>> {
    let sources = BillStatus::sources_of(status);
    let placeholders = (0..sources.len())
        .map(|i| format!("?{}", i + 4))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE bills SET status = ?1, updated_at = ?2 \
         WHERE id = ?3 AND status IN ({placeholders}) \
         RETURNING {BILL_COLUMNS}"
    );

    let mut query = sqlx::query_as::<_, BillRecord>(&sql)
        .bind(status)
        .bind(Utc::now())
        .bind(bill_id.to_string());
    for source in sources {
        query = query.bind(source);
    }

    if let Some(record) = query.fetch_optional(&mut *conn).await? {
        return Ok(StatusChange::Applied(record.try_into()?));
    }

    Ok(match fetch_bill(&mut *conn, bill_id).await? {
        Some(bill) => StatusChange::Refused(bill.status),
        None => StatusChange::BillMissing,
    })
}

/// Repository for bill database operations.
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    /// Inserts a validated bill in `pending` status.
    pub async fn insert(&self, bill: &NewBill) -> DbResult<Bill> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        debug!(id = %id, name = %bill.name, "Inserting bill");

        let sql = format!(
            "INSERT INTO bills ({BILL_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             RETURNING {BILL_COLUMNS}"
        );
        sqlx::query_as::<_, BillRecord>(&sql)
            .bind(id.to_string())
            .bind(&bill.name)
            .bind(BillStatus::Pending)
            .bind(bill.tax_cents)
            .bind(bill.tip_cents)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?
            .try_into()
    }

    pub async fn get_by_id(&self, bill_id: BillId) -> DbResult<Option<Bill>> {
        fetch_bill(&self.pool, bill_id).await
    }

    /// Applies the present fields of `update`; absent ones keep their value.
    pub async fn update_amounts(
        &self,
        bill_id: BillId,
        update: &BillUpdate,
    ) -> DbResult<Option<Bill>> {
        debug!(id = %bill_id, "Updating bill amounts");

        let sql = format!(
            "UPDATE bills SET \
                tax_cents = COALESCE(?1, tax_cents), \
                tip_cents = COALESCE(?2, tip_cents), \
                updated_at = ?3 \
             WHERE id = ?4 \
             RETURNING {BILL_COLUMNS}"
        );
        sqlx::query_as::<_, BillRecord>(&sql)
            .bind(update.tax_cents)
            .bind(update.tip_cents)
            .bind(Utc::now())
            .bind(bill_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .map(Bill::try_from)
            .transpose()
    }

    /// Guarded status change; see [`transition_status`].
    pub async fn set_status(
        &self,
        bill_id: BillId,
        status: BillStatus,
    ) -> DbResult<StatusChange<Bill>> {
        debug!(id = %bill_id, status = %status, "Setting bill status");

        let mut conn = self.pool.acquire().await?;
        transition_status(&mut *conn, bill_id, status).await
    }

    /// Reads the bill and all its rows inside one transaction, so a
    /// concurrent cascade delete is seen either entirely or not at all.
    pub async fn load_snapshot(&self, bill_id: BillId) -> DbResult<Option<BillSnapshot>> {
        let mut tx = self.pool.begin().await?;

        let Some(bill) = fetch_bill(&mut *tx, bill_id).await? else {
            return Ok(None);
        };
        let items = fetch_items(&mut *tx, bill_id).await?;
        let participants = fetch_participants(&mut *tx, bill_id).await?;
        let assignments = fetch_assignments(&mut *tx, bill_id).await?;

        tx.commit().await?;

        Ok(Some(BillSnapshot {
            bill,
            items,
            participants,
            assignments,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_bill(name: &str) -> NewBill {
        NewBill {
            name: name.to_string(),
            tax_cents: 150,
            tip_cents: 0,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = db().await;
        let bill = db.bills().insert(&new_bill("Dinner")).await.unwrap();

        assert_eq!(bill.status, BillStatus::Pending);
        assert_eq!(bill.tax_cents, 150);

        let fetched = db.bills().get_by_id(bill.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, bill.id);
        assert_eq!(fetched.name, "Dinner");
        assert!(db.bills().get_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_partial_amount_update() {
        let db = db().await;
        let bill = db.bills().insert(&new_bill("Dinner")).await.unwrap();

        let updated = db
            .bills()
            .update_amounts(
                bill.id,
                &BillUpdate {
                    tax_cents: None,
                    tip_cents: Some(400),
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.tax_cents, 150);
        assert_eq!(updated.tip_cents, 400);
    }

    #[tokio::test]
    async fn test_negative_amount_hits_check_constraint() {
        let db = db().await;
        let bill = db.bills().insert(&new_bill("Dinner")).await.unwrap();

        let err = db
            .bills()
            .update_amounts(
                bill.id,
                &BillUpdate {
                    tax_cents: Some(-1),
                    tip_cents: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_set_status() {
        let db = db().await;
        let bill = db.bills().insert(&new_bill("Dinner")).await.unwrap();

        let change = db
            .bills()
            .set_status(bill.id, BillStatus::Processing)
            .await
            .unwrap();
        let StatusChange::Applied(bill) = change else {
            panic!("expected Applied");
        };
        assert_eq!(bill.status, BillStatus::Processing);

        assert!(matches!(
            db.bills()
                .set_status(Uuid::new_v4(), BillStatus::Failed)
                .await
                .unwrap(),
            StatusChange::BillMissing
        ));
    }

    #[tokio::test]
    async fn test_status_guard_refuses_disallowed_move() {
        let db = db().await;
        let bill = db.bills().insert(&new_bill("Dinner")).await.unwrap();
        db.bills()
            .set_status(bill.id, BillStatus::Processing)
            .await
            .unwrap();

        assert!(matches!(
            db.bills()
                .set_status(bill.id, BillStatus::Processing)
                .await
                .unwrap(),
            StatusChange::Refused(BillStatus::Processing)
        ));

        db.bills()
            .set_status(bill.id, BillStatus::Completed)
            .await
            .unwrap();
        assert!(matches!(
            db.bills()
                .set_status(bill.id, BillStatus::Failed)
                .await
                .unwrap(),
            StatusChange::Refused(BillStatus::Completed)
        ));
        let bill = db.bills().get_by_id(bill.id).await.unwrap().unwrap();
        assert_eq!(bill.status, BillStatus::Completed);
    }
}

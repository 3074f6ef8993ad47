//! # Assignment Repository
//!
//! Item ↔ participant edges.
//!
//! The insert joins the item and the participant on `bill_id`, so an edge
//! across two bills is never written. The composite primary key rejects a
//! second copy of the same pair, whichever request gets there first.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteExecutor;
use sqlx::SqlitePool;
use tracing::debug;

use splitbill_core::{BillId, ItemAssignment, ItemId, ParticipantId};

use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct AssignmentRecord {
    item_id: i64,
    participant_id: i64,
    created_at: DateTime<Utc>,
}

impl From<AssignmentRecord> for ItemAssignment {
    fn from(record: AssignmentRecord) -> Self {
        ItemAssignment {
            item_id: record.item_id,
            participant_id: record.participant_id,
            created_at: record.created_at,
        }
    }
}

pub(crate) async fn fetch_assignments<'e, E>(
    executor: E,
    bill_id: BillId,
) -> DbResult<Vec<ItemAssignment>>
where
    E: SqliteExecutor<'e>,
{
    let records = sqlx::query_as::<_, AssignmentRecord>(
        r#"
        SELECT a.item_id, a.participant_id, a.created_at
        FROM item_assignments a
        JOIN items i ON i.id = a.item_id
        WHERE i.bill_id = ?1
        ORDER BY a.item_id, a.participant_id
        "#,
    )
    .bind(bill_id.to_string())
    .fetch_all(executor)
    .await?;

    Ok(records.into_iter().map(ItemAssignment::from).collect())
}

/// Repository for assignment database operations.
#[derive(Debug, Clone)]
pub struct AssignmentRepository {
    pool: SqlitePool,
}

impl AssignmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AssignmentRepository { pool }
    }

    pub async fn list_for_bill(&self, bill_id: BillId) -> DbResult<Vec<ItemAssignment>> {
        fetch_assignments(&self.pool, bill_id).await
    }

    /// Inserts the edge if the item and participant exist on the same bill.
    ///
    /// ## Returns
    /// * `Ok(Some(_))` - edge created
    /// * `Ok(None)` - item or participant missing, or on different bills
    /// * `Err(DbError::UniqueViolation)` - the pair already exists
    pub async fn insert(
        &self,
        item_id: ItemId,
        participant_id: ParticipantId,
    ) -> DbResult<Option<ItemAssignment>> {
        debug!(item_id, participant_id, "Inserting assignment");

        let record = sqlx::query_as::<_, AssignmentRecord>(
            r#"
            INSERT INTO item_assignments (item_id, participant_id, created_at)
            SELECT i.id, p.id, ?3
            FROM items i
            JOIN participants p ON p.bill_id = i.bill_id
            WHERE i.id = ?1 AND p.id = ?2
            RETURNING item_id, participant_id, created_at
            "#,
        )
        .bind(item_id)
        .bind(participant_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(ItemAssignment::from))
    }

    /// Returns `false` if the edge didn't exist.
    pub async fn delete(&self, item_id: ItemId, participant_id: ParticipantId) -> DbResult<bool> {
        debug!(item_id, participant_id, "Deleting assignment");

        let result =
            sqlx::query("DELETE FROM item_assignments WHERE item_id = ?1 AND participant_id = ?2")
                .bind(item_id)
                .bind(participant_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use crate::repository::bill::StatusChange;
    use splitbill_core::{Money, NewBill, NewItem, NewParticipant};

    /// Two bills, one item and one participant each.
    async fn seeded() -> (Database, BillId, ItemId, ParticipantId, ParticipantId) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut ids = Vec::new();
        for name in ["Dinner", "Lunch"] {
            let bill = db
                .bills()
                .insert(&NewBill {
                    name: name.into(),
                    tax_cents: 0,
                    tip_cents: 0,
                })
                .await
                .unwrap();
            let change = db
                .items()
                .ingest(
                    bill.id,
                    Money::zero(),
                    Money::zero(),
                    &[NewItem {
                        name: "Soup".into(),
                        price_cents: 900,
                        quantity: 1,
                    }],
                )
                .await
                .unwrap();
            let StatusChange::Applied(items) = change else {
                panic!("ingest refused");
            };
            let person = db
                .participants()
                .insert(
                    bill.id,
                    &NewParticipant {
                        name: "Ana".into(),
                        share_of_common_costs_cents: 0,
                    },
                )
                .await
                .unwrap()
                .unwrap();
            ids.push((bill.id, items[0].id, person.id));
        }
        (db, ids[0].0, ids[0].1, ids[0].2, ids[1].2)
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let (db, bill_id, item_id, ana, _) = seeded().await;

        let edge = db.assignments().insert(item_id, ana).await.unwrap().unwrap();
        assert_eq!(edge.item_id, item_id);
        assert_eq!(edge.participant_id, ana);

        let edges = db.assignments().list_for_bill(bill_id).await.unwrap();
        assert_eq!(edges, vec![edge]);
    }

    #[tokio::test]
    async fn test_duplicate_pair_is_unique_violation() {
        let (db, _, item_id, ana, _) = seeded().await;

        db.assignments().insert(item_id, ana).await.unwrap();
        let err = db.assignments().insert(item_id, ana).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_cross_bill_edge_is_not_written() {
        let (db, bill_id, item_id, _, stranger) = seeded().await;

        assert!(db.assignments().insert(item_id, stranger).await.unwrap().is_none());
        assert!(db.assignments().insert(9999, stranger).await.unwrap().is_none());
        assert!(db.assignments().list_for_bill(bill_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let (db, _, item_id, ana, _) = seeded().await;
        db.assignments().insert(item_id, ana).await.unwrap();

        assert!(db.assignments().delete(item_id, ana).await.unwrap());
        assert!(!db.assignments().delete(item_id, ana).await.unwrap());
    }
}

//! # Item Repository
//!
//! Receipt lines: manual corrections and bulk ingest from extraction.
//!
//! ## Extraction Ingest
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    UPDATE bills SET status = 'completed'      (guarded, see bill.rs;   │
//! │                                                 refused → ROLLBACK)    │
//! │    UPDATE bills SET tax_cents, tip_cents                               │
//! │    INSERT INTO items ... × N                  (any failure → ROLLBACK)  │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteExecutor;
use sqlx::SqlitePool;
use tracing::debug;

use splitbill_core::{BillId, BillStatus, Item, ItemId, ItemUpdate, Money, NewItem};

use super::bill::{transition_status, StatusChange};
use super::parse_bill_id;
use crate::error::{DbError, DbResult};

const ITEM_COLUMNS: &str = "id, bill_id, name, price_cents, quantity, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ItemRecord {
    id: i64,
    bill_id: String,
    name: String,
    price_cents: i64,
    quantity: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRecord> for Item {
    type Error = DbError;

    fn try_from(record: ItemRecord) -> DbResult<Self> {
        Ok(Item {
            id: record.id,
            bill_id: parse_bill_id(&record.bill_id)?,
            name: record.name,
            price_cents: record.price_cents,
            quantity: record.quantity,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

pub(crate) async fn fetch_items<'e, E>(executor: E, bill_id: BillId) -> DbResult<Vec<Item>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE bill_id = ?1 ORDER BY id");
    sqlx::query_as::<_, ItemRecord>(&sql)
        .bind(bill_id.to_string())
        .fetch_all(executor)
        .await?
        .into_iter()
        .map(Item::try_from)
        .collect()
}

async fn insert_item<'e, E>(executor: E, bill_id: BillId, item: &NewItem) -> DbResult<Item>
where
    E: SqliteExecutor<'e>,
{
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO items (bill_id, name, price_cents, quantity, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
         RETURNING {ITEM_COLUMNS}"
    );
    sqlx::query_as::<_, ItemRecord>(&sql)
        .bind(bill_id.to_string())
        .bind(&item.name)
        .bind(item.price_cents)
        .bind(item.quantity)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await?
        .try_into()
}

/// Repository for item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    pub async fn get_by_id(&self, item_id: ItemId) -> DbResult<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");
        sqlx::query_as::<_, ItemRecord>(&sql)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Item::try_from)
            .transpose()
    }

    /// Items of a bill in insertion order.
    pub async fn list_for_bill(&self, bill_id: BillId) -> DbResult<Vec<Item>> {
        fetch_items(&self.pool, bill_id).await
    }

    /// Applies the present fields of `update`.
    pub async fn update(&self, item_id: ItemId, update: &ItemUpdate) -> DbResult<Option<Item>> {
        debug!(id = item_id, "Updating item");

        let sql = format!(
            "UPDATE items SET \
                name = COALESCE(?1, name), \
                price_cents = COALESCE(?2, price_cents), \
                quantity = COALESCE(?3, quantity), \
                updated_at = ?4 \
             WHERE id = ?5 \
             RETURNING {ITEM_COLUMNS}"
        );
        sqlx::query_as::<_, ItemRecord>(&sql)
            .bind(update.name.as_deref())
            .bind(update.price_cents)
            .bind(update.quantity)
            .bind(Utc::now())
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Item::try_from)
            .transpose()
    }

    /// Marks the bill `completed`, sets its tax and tip and inserts every
    /// item, in one transaction. Nothing is written unless the bill may
    /// move to `completed`.
    pub async fn ingest(
        &self,
        bill_id: BillId,
        tax: Money,
        tip: Money,
        items: &[NewItem],
    ) -> DbResult<StatusChange<Vec<Item>>> {
        debug!(bill_id = %bill_id, count = items.len(), "Ingesting extracted items");

        let mut tx = self.pool.begin().await?;

        match transition_status(&mut *tx, bill_id, BillStatus::Completed).await? {
            StatusChange::Applied(_) => {}
            StatusChange::Refused(current) => return Ok(StatusChange::Refused(current)),
            StatusChange::BillMissing => return Ok(StatusChange::BillMissing),
        }

        sqlx::query("UPDATE bills SET tax_cents = ?1, tip_cents = ?2 WHERE id = ?3")
            .bind(tax.cents())
            .bind(tip.cents())
            .bind(bill_id.to_string())
            .execute(&mut *tx)
            .await?;

        let mut created = Vec::with_capacity(items.len());
        for item in items {
            created.push(insert_item(&mut *tx, bill_id, item).await?);
        }

        tx.commit().await?;
        Ok(StatusChange::Applied(created))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use splitbill_core::NewBill;

    async fn seeded() -> (Database, BillId) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let bill = db
            .bills()
            .insert(&NewBill {
                name: "Dinner".into(),
                tax_cents: 0,
                tip_cents: 0,
            })
            .await
            .unwrap();
        (db, bill.id)
    }

    fn applied<T: std::fmt::Debug>(change: StatusChange<T>) -> T {
        match change {
            StatusChange::Applied(value) => value,
            other => panic!("expected Applied, got {other:?}"),
        }
    }

    fn new_item(name: &str, price_cents: i64, quantity: i64) -> NewItem {
        NewItem {
            name: name.into(),
            price_cents,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_ingest_writes_amounts_and_items() {
        let (db, bill_id) = seeded().await;

        let items = applied(
            db.items()
                .ingest(
                    bill_id,
                    Money::from_cents(200),
                    Money::from_cents(300),
                    &[new_item("Ramen", 1250, 2), new_item("Tea", 250, 1)],
                )
                .await
                .unwrap(),
        );

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].bill_id, bill_id);
        assert_eq!(items[0].line_total().cents(), 2500);

        let bill = db.bills().get_by_id(bill_id).await.unwrap().unwrap();
        assert_eq!(bill.status, BillStatus::Completed);
        assert_eq!(bill.tax_cents, 200);
        assert_eq!(bill.tip_cents, 300);
        assert_eq!(db.items().list_for_bill(bill_id).await.unwrap(), items);
    }

    #[tokio::test]
    async fn test_second_ingest_is_refused() {
        let (db, bill_id) = seeded().await;
        applied(
            db.items()
                .ingest(bill_id, Money::from_cents(100), Money::zero(), &[new_item("Ramen", 1250, 1)])
                .await
                .unwrap(),
        );

        let change = db
            .items()
            .ingest(bill_id, Money::from_cents(999), Money::zero(), &[new_item("Ramen", 1250, 1)])
            .await
            .unwrap();

        assert!(matches!(change, StatusChange::Refused(BillStatus::Completed)));
        assert_eq!(db.items().list_for_bill(bill_id).await.unwrap().len(), 1);
        let bill = db.bills().get_by_id(bill_id).await.unwrap().unwrap();
        assert_eq!(bill.tax_cents, 100);
    }

    #[tokio::test]
    async fn test_ingest_rolls_back_on_bad_item() {
        let (db, bill_id) = seeded().await;

        let err = db
            .items()
            .ingest(
                bill_id,
                Money::from_cents(200),
                Money::zero(),
                &[new_item("Ramen", 1250, 1), new_item("Broken", 100, 0)],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::CheckViolation { .. }));
        assert!(db.items().list_for_bill(bill_id).await.unwrap().is_empty());
        let bill = db.bills().get_by_id(bill_id).await.unwrap().unwrap();
        assert_eq!(bill.tax_cents, 0);
        assert_eq!(bill.status, BillStatus::Pending);
    }

    #[tokio::test]
    async fn test_ingest_unknown_bill() {
        let (db, _) = seeded().await;
        let change = db
            .items()
            .ingest(uuid::Uuid::new_v4(), Money::zero(), Money::zero(), &[])
            .await
            .unwrap();
        assert!(matches!(change, StatusChange::BillMissing));
    }

    #[tokio::test]
    async fn test_partial_update() {
        let (db, bill_id) = seeded().await;
        let items = applied(
            db.items()
                .ingest(bill_id, Money::zero(), Money::zero(), &[new_item("Ramen", 1250, 1)])
                .await
                .unwrap(),
        );

        let updated = db
            .items()
            .update(
                items[0].id,
                &ItemUpdate {
                    name: Some("Tonkotsu Ramen".into()),
                    price_cents: None,
                    quantity: Some(2),
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Tonkotsu Ramen");
        assert_eq!(updated.price_cents, 1250);
        assert_eq!(updated.quantity, 2);
        assert!(db
            .items()
            .update(9999, &ItemUpdate::default())
            .await
            .unwrap()
            .is_none());
    }
}

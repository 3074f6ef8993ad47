//! # Bill Store
//!
//! The repository seam between the Store Adapter and persistence.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      BillEditor (store adapter)                         │
//! │                 validation, membership checks, logging                  │
//! └───────────────────────────────┬─────────────────────────────────────────┘
//!                                 │  dyn / generic BillStore
//!                 ┌───────────────┴────────────────┐
//!                 ▼                                ▼
//!       ┌───────────────────┐           ┌─────────────────────┐
//!       │  MemoryBillStore  │           │   SqliteBillStore   │
//!       │  (this module)    │           │   (splitbill-db)    │
//!       │  one RwLock       │           │   transactions      │
//!       └───────────────────┘           └─────────────────────┘
//! ```
//!
//! ## Contract
//! - Every method is atomic on its own.
//! - `insert_assignment` reports an existing pair as
//!   [`CoreError::DuplicateAssignment`]; the check and the insert happen
//!   under one lock (or one statement), so concurrent duplicates also fail.
//! - `insert_assignment` refuses an item and a participant from different
//!   bills.
//! - `delete_participant_cascade` removes the participant's edges and the
//!   participant together; a reader never sees one without the other.
//! - Status changes follow [`BillStatus::can_transition_to`], checked in
//!   the same atomic step as the write. A refused move is
//!   [`CoreError::InvalidStatusTransition`].
//! - `ingest_extraction` writes tax, tip, every item and the `completed`
//!   status, or nothing. A bill is ingested at most once.
//! - `create_participant` refuses a bill that already has
//!   [`MAX_PARTICIPANTS`](crate::MAX_PARTICIPANTS).
//! - `load_snapshot` reads all four tables in one consistent view.
//! - Lookups return `Ok(None)` / `Ok(false)` for missing rows; errors are
//!   reserved for constraint and storage failures.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{
    Bill, BillId, BillSnapshot, BillStatus, BillUpdate, Item, ItemAssignment, ItemId, ItemUpdate,
    NewBill, NewItem, NewParticipant, Participant, ParticipantId,
};
use crate::{DEFAULT_PAYMENT_STATUS, MAX_PARTICIPANTS};

// =============================================================================
// Repository Trait
// =============================================================================

/// Persistence for bills, items, participants and assignments.
#[async_trait]
pub trait BillStore: Send + Sync {
    // -- bills --

    async fn create_bill(&self, bill: NewBill) -> CoreResult<Bill>;

    async fn get_bill(&self, bill_id: BillId) -> CoreResult<Option<Bill>>;

    /// Applies the present fields of `update`. `None` if the bill is missing.
    async fn update_bill_amounts(
        &self,
        bill_id: BillId,
        update: BillUpdate,
    ) -> CoreResult<Option<Bill>>;

    /// Moves the bill to `status` if its current status allows it.
    /// `None` if the bill is missing.
    async fn set_bill_status(&self, bill_id: BillId, status: BillStatus)
        -> CoreResult<Option<Bill>>;

    // -- items --

    async fn get_item(&self, item_id: ItemId) -> CoreResult<Option<Item>>;

    async fn list_items(&self, bill_id: BillId) -> CoreResult<Vec<Item>>;

    async fn update_item(&self, item_id: ItemId, update: ItemUpdate) -> CoreResult<Option<Item>>;

    /// Sets tax and tip, inserts `items` and marks the bill `completed`,
    /// all or nothing.
    async fn ingest_extraction(
        &self,
        bill_id: BillId,
        tax: Money,
        tip: Money,
        items: Vec<NewItem>,
    ) -> CoreResult<Vec<Item>>;

    // -- participants --

    async fn create_participant(
        &self,
        bill_id: BillId,
        participant: NewParticipant,
    ) -> CoreResult<Participant>;

    async fn get_participant(&self, participant_id: ParticipantId)
        -> CoreResult<Option<Participant>>;

    async fn list_participants(&self, bill_id: BillId) -> CoreResult<Vec<Participant>>;

    /// Removes the participant's assignments, then the participant.
    /// `false` if no such participant exists on this bill.
    async fn delete_participant_cascade(
        &self,
        bill_id: BillId,
        participant_id: ParticipantId,
    ) -> CoreResult<bool>;

    // -- assignments --

    async fn list_assignments(&self, bill_id: BillId) -> CoreResult<Vec<ItemAssignment>>;

    async fn insert_assignment(
        &self,
        item_id: ItemId,
        participant_id: ParticipantId,
    ) -> CoreResult<ItemAssignment>;

    /// `false` if the edge did not exist.
    async fn delete_assignment(
        &self,
        item_id: ItemId,
        participant_id: ParticipantId,
    ) -> CoreResult<bool>;

    // -- snapshot --

    async fn load_snapshot(&self, bill_id: BillId) -> CoreResult<Option<BillSnapshot>>;
}

// =============================================================================
// In-Memory Store
// =============================================================================

#[derive(Debug, Default)]
struct Tables {
    bills: HashMap<BillId, Bill>,
    items: BTreeMap<ItemId, Item>,
    participants: BTreeMap<ParticipantId, Participant>,
    assignments: BTreeMap<(ItemId, ParticipantId), ItemAssignment>,
    next_item_id: ItemId,
    next_participant_id: ParticipantId,
}

impl Tables {
    fn assignments_of(&self, bill_id: BillId) -> Vec<ItemAssignment> {
        self.assignments
            .values()
            .filter(|a| {
                self.items
                    .get(&a.item_id)
                    .is_some_and(|item| item.bill_id == bill_id)
            })
            .cloned()
            .collect()
    }
}

/// A [`BillStore`] kept in process memory.
///
/// All tables sit behind one lock, so every method sees and leaves a
/// consistent state. Ids are assigned from 1 upwards like SQLite rowids.
#[derive(Debug, Default)]
pub struct MemoryBillStore {
    tables: RwLock<Tables>,
}

impl MemoryBillStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> CoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| CoreError::storage("memory store lock poisoned"))
    }

    fn write(&self) -> CoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| CoreError::storage("memory store lock poisoned"))
    }
}

/// Applies a status change the current status allows.
fn move_status(bill: &mut Bill, status: BillStatus) -> CoreResult<()> {
    if !bill.status.can_transition_to(status) {
        return Err(CoreError::InvalidStatusTransition {
            bill_id: bill.id,
            current: bill.status,
            requested: status,
        });
    }

    bill.status = status;
    bill.updated_at = Utc::now();
    Ok(())
}

#[async_trait]
impl BillStore for MemoryBillStore {
    async fn create_bill(&self, bill: NewBill) -> CoreResult<Bill> {
        let now = Utc::now();
        let bill = Bill {
            id: Uuid::new_v4(),
            name: bill.name,
            status: BillStatus::Pending,
            tax_cents: bill.tax_cents,
            tip_cents: bill.tip_cents,
            created_at: now,
            updated_at: now,
        };

        self.write()?.bills.insert(bill.id, bill.clone());
        Ok(bill)
    }

    async fn get_bill(&self, bill_id: BillId) -> CoreResult<Option<Bill>> {
        Ok(self.read()?.bills.get(&bill_id).cloned())
    }

    async fn update_bill_amounts(
        &self,
        bill_id: BillId,
        update: BillUpdate,
    ) -> CoreResult<Option<Bill>> {
        let mut tables = self.write()?;
        let Some(bill) = tables.bills.get_mut(&bill_id) else {
            return Ok(None);
        };

        if let Some(tax) = update.tax_cents {
            bill.tax_cents = tax;
        }
        if let Some(tip) = update.tip_cents {
            bill.tip_cents = tip;
        }
        bill.updated_at = Utc::now();

        Ok(Some(bill.clone()))
    }

    async fn set_bill_status(
        &self,
        bill_id: BillId,
        status: BillStatus,
    ) -> CoreResult<Option<Bill>> {
        let mut tables = self.write()?;
        let Some(bill) = tables.bills.get_mut(&bill_id) else {
            return Ok(None);
        };

        move_status(bill, status)?;

        Ok(Some(bill.clone()))
    }

    async fn get_item(&self, item_id: ItemId) -> CoreResult<Option<Item>> {
        Ok(self.read()?.items.get(&item_id).cloned())
    }

    async fn list_items(&self, bill_id: BillId) -> CoreResult<Vec<Item>> {
        Ok(self
            .read()?
            .items
            .values()
            .filter(|item| item.bill_id == bill_id)
            .cloned()
            .collect())
    }

    async fn update_item(&self, item_id: ItemId, update: ItemUpdate) -> CoreResult<Option<Item>> {
        let mut tables = self.write()?;
        let Some(item) = tables.items.get_mut(&item_id) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            item.name = name;
        }
        if let Some(price) = update.price_cents {
            item.price_cents = price;
        }
        if let Some(quantity) = update.quantity {
            item.quantity = quantity;
        }
        item.updated_at = Utc::now();

        Ok(Some(item.clone()))
    }

    async fn ingest_extraction(
        &self,
        bill_id: BillId,
        tax: Money,
        tip: Money,
        items: Vec<NewItem>,
    ) -> CoreResult<Vec<Item>> {
        let mut tables = self.write()?;
        let now = Utc::now();

        let Some(bill) = tables.bills.get_mut(&bill_id) else {
            return Err(CoreError::BillNotFound(bill_id));
        };
        move_status(bill, BillStatus::Completed)?;
        bill.tax_cents = tax.cents();
        bill.tip_cents = tip.cents();
        bill.updated_at = now;

        let mut created = Vec::with_capacity(items.len());
        for new_item in items {
            tables.next_item_id += 1;
            let item = Item {
                id: tables.next_item_id,
                bill_id,
                name: new_item.name,
                price_cents: new_item.price_cents,
                quantity: new_item.quantity,
                created_at: now,
                updated_at: now,
            };
            tables.items.insert(item.id, item.clone());
            created.push(item);
        }

        Ok(created)
    }

    async fn create_participant(
        &self,
        bill_id: BillId,
        participant: NewParticipant,
    ) -> CoreResult<Participant> {
        let mut tables = self.write()?;
        if !tables.bills.contains_key(&bill_id) {
            return Err(CoreError::BillNotFound(bill_id));
        }
        let count = tables
            .participants
            .values()
            .filter(|p| p.bill_id == bill_id)
            .count();
        if count >= MAX_PARTICIPANTS {
            return Err(ValidationError::too_many_participants().into());
        }

        let now = Utc::now();
        tables.next_participant_id += 1;
        let participant = Participant {
            id: tables.next_participant_id,
            bill_id,
            name: participant.name,
            payment_status: DEFAULT_PAYMENT_STATUS.to_string(),
            share_of_common_costs_cents: participant.share_of_common_costs_cents,
            created_at: now,
            updated_at: now,
        };
        tables
            .participants
            .insert(participant.id, participant.clone());

        Ok(participant)
    }

    async fn get_participant(
        &self,
        participant_id: ParticipantId,
    ) -> CoreResult<Option<Participant>> {
        Ok(self.read()?.participants.get(&participant_id).cloned())
    }

    async fn list_participants(&self, bill_id: BillId) -> CoreResult<Vec<Participant>> {
        Ok(self
            .read()?
            .participants
            .values()
            .filter(|p| p.bill_id == bill_id)
            .cloned()
            .collect())
    }

    async fn delete_participant_cascade(
        &self,
        bill_id: BillId,
        participant_id: ParticipantId,
    ) -> CoreResult<bool> {
        let mut tables = self.write()?;
        let on_bill = tables
            .participants
            .get(&participant_id)
            .is_some_and(|p| p.bill_id == bill_id);
        if !on_bill {
            return Ok(false);
        }

        tables
            .assignments
            .retain(|&(_, pid), _| pid != participant_id);
        tables.participants.remove(&participant_id);

        Ok(true)
    }

    async fn list_assignments(&self, bill_id: BillId) -> CoreResult<Vec<ItemAssignment>> {
        Ok(self.read()?.assignments_of(bill_id))
    }

    async fn insert_assignment(
        &self,
        item_id: ItemId,
        participant_id: ParticipantId,
    ) -> CoreResult<ItemAssignment> {
        let mut tables = self.write()?;

        let item_bill = tables
            .items
            .get(&item_id)
            .map(|item| item.bill_id)
            .ok_or(CoreError::ItemNotFound { item_id })?;
        let same_bill = tables
            .participants
            .get(&participant_id)
            .is_some_and(|p| p.bill_id == item_bill);
        if !same_bill {
            return Err(CoreError::ParticipantNotFound {
                bill_id: item_bill,
                participant_id,
            });
        }

        if tables.assignments.contains_key(&(item_id, participant_id)) {
            return Err(CoreError::DuplicateAssignment {
                item_id,
                participant_id,
            });
        }

        let assignment = ItemAssignment {
            item_id,
            participant_id,
            created_at: Utc::now(),
        };
        tables
            .assignments
            .insert((item_id, participant_id), assignment.clone());

        Ok(assignment)
    }

    async fn delete_assignment(
        &self,
        item_id: ItemId,
        participant_id: ParticipantId,
    ) -> CoreResult<bool> {
        Ok(self
            .write()?
            .assignments
            .remove(&(item_id, participant_id))
            .is_some())
    }

    async fn load_snapshot(&self, bill_id: BillId) -> CoreResult<Option<BillSnapshot>> {
        let tables = self.read()?;
        let Some(bill) = tables.bills.get(&bill_id).cloned() else {
            return Ok(None);
        };

        Ok(Some(BillSnapshot {
            bill,
            items: tables
                .items
                .values()
                .filter(|i| i.bill_id == bill_id)
                .cloned()
                .collect(),
            participants: tables
                .participants
                .values()
                .filter(|p| p.bill_id == bill_id)
                .cloned()
                .collect(),
            assignments: tables.assignments_of(bill_id),
        }))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (MemoryBillStore, Bill, Vec<Item>, Participant) {
        let store = MemoryBillStore::new();
        let bill = store
            .create_bill(NewBill {
                name: "Dinner".into(),
                tax_cents: 0,
                tip_cents: 0,
            })
            .await
            .unwrap();
        let items = store
            .ingest_extraction(
                bill.id,
                Money::from_cents(200),
                Money::from_cents(300),
                vec![
                    NewItem {
                        name: "Ramen".into(),
                        price_cents: 1200,
                        quantity: 1,
                    },
                    NewItem {
                        name: "Gyoza".into(),
                        price_cents: 800,
                        quantity: 1,
                    },
                ],
            )
            .await
            .unwrap();
        let ana = store
            .create_participant(
                bill.id,
                NewParticipant {
                    name: "Ana".into(),
                    share_of_common_costs_cents: 0,
                },
            )
            .await
            .unwrap();
        (store, bill, items, ana)
    }

    #[tokio::test]
    async fn test_ingest_sets_amounts_and_items() {
        let (store, bill, items, _) = seeded().await;

        let bill = store.get_bill(bill.id).await.unwrap().unwrap();
        assert_eq!(bill.tax_cents, 200);
        assert_eq!(bill.tip_cents, 300);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, 1);
        assert_eq!(store.list_items(bill.id).await.unwrap(), items);
    }

    #[tokio::test]
    async fn test_new_participant_is_unpaid() {
        let (_, _, _, ana) = seeded().await;
        assert_eq!(ana.payment_status, "unpaid");
    }

    #[tokio::test]
    async fn test_duplicate_assignment_is_rejected() {
        let (store, bill, items, ana) = seeded().await;

        store.insert_assignment(items[0].id, ana.id).await.unwrap();
        let err = store
            .insert_assignment(items[0].id, ana.id)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::DuplicateAssignment { .. }));
        assert_eq!(store.list_assignments(bill.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cross_bill_assignment_is_rejected() {
        let (store, _, items, _) = seeded().await;
        let other = store
            .create_bill(NewBill {
                name: "Lunch".into(),
                tax_cents: 0,
                tip_cents: 0,
            })
            .await
            .unwrap();
        let stranger = store
            .create_participant(
                other.id,
                NewParticipant {
                    name: "Zed".into(),
                    share_of_common_costs_cents: 0,
                },
            )
            .await
            .unwrap();

        let err = store
            .insert_assignment(items[0].id, stranger.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ParticipantNotFound { .. }));
    }

    #[tokio::test]
    async fn test_cascade_delete_removes_edges() {
        let (store, bill, items, ana) = seeded().await;
        store.insert_assignment(items[0].id, ana.id).await.unwrap();
        store.insert_assignment(items[1].id, ana.id).await.unwrap();

        assert!(store.delete_participant_cascade(bill.id, ana.id).await.unwrap());
        assert!(store.list_assignments(bill.id).await.unwrap().is_empty());
        assert!(store.get_participant(ana.id).await.unwrap().is_none());

        // second delete is a miss, not an error
        assert!(!store.delete_participant_cascade(bill.id, ana.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_partial_item_update() {
        let (store, _, items, _) = seeded().await;

        let updated = store
            .update_item(
                items[0].id,
                ItemUpdate {
                    quantity: Some(3),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.quantity, 3);
        assert_eq!(updated.name, "Ramen");
        assert_eq!(updated.price_cents, 1200);
        assert!(store
            .update_item(999, ItemUpdate::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_snapshot_is_scoped_to_bill() {
        let (store, bill, items, ana) = seeded().await;
        store.insert_assignment(items[0].id, ana.id).await.unwrap();
        store
            .create_bill(NewBill {
                name: "Other".into(),
                tax_cents: 0,
                tip_cents: 0,
            })
            .await
            .unwrap();

        let snapshot = store.load_snapshot(bill.id).await.unwrap().unwrap();
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.participants.len(), 1);
        assert_eq!(snapshot.assignments.len(), 1);

        assert!(store.load_snapshot(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_completed_bill_is_ingested_once() {
        let (store, bill, items, _) = seeded().await;
        assert_eq!(
            store.get_bill(bill.id).await.unwrap().unwrap().status,
            BillStatus::Completed
        );

        let err = store
            .ingest_extraction(
                bill.id,
                Money::zero(),
                Money::zero(),
                vec![NewItem {
                    name: "Ramen".into(),
                    price_cents: 1200,
                    quantity: 1,
                }],
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidStatusTransition {
                current: BillStatus::Completed,
                ..
            }
        ));

        let bill = store.get_bill(bill.id).await.unwrap().unwrap();
        assert_eq!(bill.tax_cents, 200);
        assert_eq!(store.list_items(bill.id).await.unwrap(), items);
    }

    #[tokio::test]
    async fn test_status_change_is_guarded() {
        let (store, bill, _, _) = seeded().await;

        let err = store
            .set_bill_status(bill.id, BillStatus::Failed)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidStatusTransition { .. }));
        assert!(store
            .set_bill_status(Uuid::new_v4(), BillStatus::Failed)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_participant_limit() {
        let (store, bill, _, _) = seeded().await;
        for n in 1..MAX_PARTICIPANTS {
            store
                .create_participant(
                    bill.id,
                    NewParticipant {
                        name: format!("Guest {n}"),
                        share_of_common_costs_cents: 0,
                    },
                )
                .await
                .unwrap();
        }

        let err = store
            .create_participant(
                bill.id,
                NewParticipant {
                    name: "One too many".into(),
                    share_of_common_costs_cents: 0,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
        assert_eq!(
            store.list_participants(bill.id).await.unwrap().len(),
            MAX_PARTICIPANTS
        );
    }
}

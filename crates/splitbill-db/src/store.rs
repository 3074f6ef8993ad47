//! # SQLite Bill Store
//!
//! [`BillStore`] over the repositories. Constraint failures that mean
//! something to the domain are translated here, where the ids are known:
//!
//! ```text
//! UniqueViolation     on item_assignments  → CoreError::DuplicateAssignment
//! ForeignKeyViolation on participants      → CoreError::BillNotFound
//! participant limit reached                → CoreError::Validation
//! StatusChange::Refused                    → CoreError::InvalidStatusTransition
//! StatusChange::BillMissing on ingest      → CoreError::BillNotFound
//! anything else                            → CoreError::Storage
//! ```

use async_trait::async_trait;
use tracing::debug;

use splitbill_core::{
    Bill, BillId, BillSnapshot, BillStatus, BillStore, BillUpdate, CoreError, CoreResult, Item,
    ItemAssignment, ItemId, ItemUpdate, Money, NewBill, NewItem, NewParticipant, Participant,
    ParticipantId, ValidationError,
};

use crate::error::DbError;
use crate::pool::Database;
use crate::repository::bill::StatusChange;

/// `Applied` → `Some`, `BillMissing` → `None`, `Refused` → conflict.
fn guarded<T>(
    change: StatusChange<T>,
    bill_id: BillId,
    requested: BillStatus,
) -> CoreResult<Option<T>> {
    match change {
        StatusChange::Applied(value) => Ok(Some(value)),
        StatusChange::Refused(current) => {
            debug!(bill_id = %bill_id, current = %current, requested = %requested, "Status change refused");
            Err(CoreError::InvalidStatusTransition {
                bill_id,
                current,
                requested,
            })
        }
        StatusChange::BillMissing => Ok(None),
    }
}

/// Durable [`BillStore`] backed by a [`Database`].
#[derive(Debug, Clone)]
pub struct SqliteBillStore {
    db: Database,
}

impl SqliteBillStore {
    pub fn new(db: Database) -> Self {
        SqliteBillStore { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl BillStore for SqliteBillStore {
    async fn create_bill(&self, bill: NewBill) -> CoreResult<Bill> {
        Ok(self.db.bills().insert(&bill).await?)
    }

    async fn get_bill(&self, bill_id: BillId) -> CoreResult<Option<Bill>> {
        Ok(self.db.bills().get_by_id(bill_id).await?)
    }

    async fn update_bill_amounts(
        &self,
        bill_id: BillId,
        update: BillUpdate,
    ) -> CoreResult<Option<Bill>> {
        Ok(self.db.bills().update_amounts(bill_id, &update).await?)
    }

    async fn set_bill_status(
        &self,
        bill_id: BillId,
        status: BillStatus,
    ) -> CoreResult<Option<Bill>> {
        let change = self.db.bills().set_status(bill_id, status).await?;
        guarded(change, bill_id, status)
    }

    async fn get_item(&self, item_id: ItemId) -> CoreResult<Option<Item>> {
        Ok(self.db.items().get_by_id(item_id).await?)
    }

    async fn list_items(&self, bill_id: BillId) -> CoreResult<Vec<Item>> {
        Ok(self.db.items().list_for_bill(bill_id).await?)
    }

    async fn update_item(&self, item_id: ItemId, update: ItemUpdate) -> CoreResult<Option<Item>> {
        Ok(self.db.items().update(item_id, &update).await?)
    }

    async fn ingest_extraction(
        &self,
        bill_id: BillId,
        tax: Money,
        tip: Money,
        items: Vec<NewItem>,
    ) -> CoreResult<Vec<Item>> {
        let change = self.db.items().ingest(bill_id, tax, tip, &items).await?;
        guarded(change, bill_id, BillStatus::Completed)?.ok_or(CoreError::BillNotFound(bill_id))
    }

    async fn create_participant(
        &self,
        bill_id: BillId,
        participant: NewParticipant,
    ) -> CoreResult<Participant> {
        match self.db.participants().insert(bill_id, &participant).await {
            Ok(Some(participant)) => Ok(participant),
            Ok(None) => Err(ValidationError::too_many_participants().into()),
            Err(DbError::ForeignKeyViolation { .. }) => Err(CoreError::BillNotFound(bill_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_participant(
        &self,
        participant_id: ParticipantId,
    ) -> CoreResult<Option<Participant>> {
        Ok(self.db.participants().get_by_id(participant_id).await?)
    }

    async fn list_participants(&self, bill_id: BillId) -> CoreResult<Vec<Participant>> {
        Ok(self.db.participants().list_for_bill(bill_id).await?)
    }

    async fn delete_participant_cascade(
        &self,
        bill_id: BillId,
        participant_id: ParticipantId,
    ) -> CoreResult<bool> {
        Ok(self
            .db
            .participants()
            .delete_cascade(bill_id, participant_id)
            .await?)
    }

    async fn list_assignments(&self, bill_id: BillId) -> CoreResult<Vec<ItemAssignment>> {
        Ok(self.db.assignments().list_for_bill(bill_id).await?)
    }

    async fn insert_assignment(
        &self,
        item_id: ItemId,
        participant_id: ParticipantId,
    ) -> CoreResult<ItemAssignment> {
        match self.db.assignments().insert(item_id, participant_id).await {
            Ok(Some(assignment)) => Ok(assignment),
            Ok(None) => {
                // Nothing was written: tell a missing item apart from a
                // participant that is missing or sits on another bill.
                let item = self
                    .db
                    .items()
                    .get_by_id(item_id)
                    .await?
                    .ok_or(CoreError::ItemNotFound { item_id })?;
                Err(CoreError::ParticipantNotFound {
                    bill_id: item.bill_id,
                    participant_id,
                })
            }
            Err(DbError::UniqueViolation { field }) => {
                debug!(item_id, participant_id, field = %field, "Assignment already exists");
                Err(CoreError::DuplicateAssignment {
                    item_id,
                    participant_id,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_assignment(
        &self,
        item_id: ItemId,
        participant_id: ParticipantId,
    ) -> CoreResult<bool> {
        Ok(self.db.assignments().delete(item_id, participant_id).await?)
    }

    async fn load_snapshot(&self, bill_id: BillId) -> CoreResult<Option<BillSnapshot>> {
        Ok(self.db.bills().load_snapshot(bill_id).await?)
    }
}

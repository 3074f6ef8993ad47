//! # Bill Editor
//!
//! The Store Adapter: every mutation of a bill goes through here.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  request                                                                │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  1. validate input              → ValidationError, nothing written     │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  2. check membership            → NotFound (missing, or other bill)    │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  3. one atomic store call       → Conflict on duplicate edge           │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  summary(): load snapshot → allocate()   (recomputed, never cached)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Extraction Lifecycle
//! ```text
//!  begin_extraction      complete_extraction(payload)
//!  pending ──► processing ──────────────┬──► completed (final)
//!     ▲            ▲                    │
//!     │            │  invalid payload / │
//!     │            │  fail_extraction   ▼
//!     │            └──────────────── failed
//! ```

use tracing::{debug, info, warn};

use crate::allocation::{allocate, Allocation};
use crate::error::{CoreError, CoreResult};
use crate::store::BillStore;
use crate::types::{
    Bill, BillId, BillSnapshot, BillStatus, BillUpdate, ExtractedBill, Item, ItemAssignment,
    ItemId, ItemUpdate, NewBill, NewParticipant, Participant, ParticipantId,
};
use crate::validation::{
    validate_bill_update, validate_extraction, validate_item_update, validate_new_bill,
    validate_new_participant,
};

/// Validated, membership-checked access to a [`BillStore`].
#[derive(Debug, Clone)]
pub struct BillEditor<S> {
    store: S,
}

impl<S: BillStore> BillEditor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Bills
    // =========================================================================

    /// Creates a bill in `pending` status.
    pub async fn create_bill(&self, bill: NewBill) -> CoreResult<Bill> {
        let bill = validate_new_bill(&bill)?;
        let bill = self.store.create_bill(bill).await?;
        info!(bill_id = %bill.id, name = %bill.name, "Bill created");
        Ok(bill)
    }

    pub async fn bill(&self, bill_id: BillId) -> CoreResult<Bill> {
        self.store
            .get_bill(bill_id)
            .await?
            .ok_or(CoreError::BillNotFound(bill_id))
    }

    /// Bill, items, participants and assignments in one read.
    pub async fn snapshot(&self, bill_id: BillId) -> CoreResult<BillSnapshot> {
        self.store
            .load_snapshot(bill_id)
            .await?
            .ok_or(CoreError::BillNotFound(bill_id))
    }

    /// Changes tax and/or tip. Negative values are rejected.
    pub async fn update_bill(&self, bill_id: BillId, update: BillUpdate) -> CoreResult<Bill> {
        validate_bill_update(&update)?;
        let bill = self
            .store
            .update_bill_amounts(bill_id, update)
            .await?
            .ok_or(CoreError::BillNotFound(bill_id))?;
        info!(
            bill_id = %bill_id,
            tax_cents = bill.tax_cents,
            tip_cents = bill.tip_cents,
            "Bill amounts updated"
        );
        Ok(bill)
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// Applies a partial correction to an item. Only given fields change.
    pub async fn update_item(&self, item_id: ItemId, update: ItemUpdate) -> CoreResult<Item> {
        let update = validate_item_update(&update)?;
        let item = self
            .store
            .update_item(item_id, update)
            .await?
            .ok_or(CoreError::ItemNotFound { item_id })?;
        info!(bill_id = %item.bill_id, item_id, "Item updated");
        Ok(item)
    }

    pub async fn items(&self, bill_id: BillId) -> CoreResult<Vec<Item>> {
        self.bill(bill_id).await?;
        self.store.list_items(bill_id).await
    }

    // =========================================================================
    // Participants
    // =========================================================================

    /// Adds a participant with payment status `unpaid`.
    pub async fn add_participant(
        &self,
        bill_id: BillId,
        participant: NewParticipant,
    ) -> CoreResult<Participant> {
        let participant = validate_new_participant(&participant)?;
        self.bill(bill_id).await?;
        let participant = self.store.create_participant(bill_id, participant).await?;
        info!(
            bill_id = %bill_id,
            participant_id = participant.id,
            name = %participant.name,
            "Participant added"
        );
        Ok(participant)
    }

    pub async fn participants(&self, bill_id: BillId) -> CoreResult<Vec<Participant>> {
        self.bill(bill_id).await?;
        self.store.list_participants(bill_id).await
    }

    /// Removes a participant together with all their assignments.
    pub async fn remove_participant(
        &self,
        bill_id: BillId,
        participant_id: ParticipantId,
    ) -> CoreResult<()> {
        self.bill(bill_id).await?;
        if !self
            .store
            .delete_participant_cascade(bill_id, participant_id)
            .await?
        {
            return Err(CoreError::ParticipantNotFound {
                bill_id,
                participant_id,
            });
        }
        info!(bill_id = %bill_id, participant_id, "Participant removed");
        Ok(())
    }

    // =========================================================================
    // Assignments
    // =========================================================================

    pub async fn assignments(&self, bill_id: BillId) -> CoreResult<Vec<ItemAssignment>> {
        self.bill(bill_id).await?;
        self.store.list_assignments(bill_id).await
    }

    /// Links an item to a participant of the same bill.
    ///
    /// ## Errors
    /// - `BillNotFound` / `ItemNotFound` / `ParticipantNotFound` when an id is
    ///   missing or belongs to another bill
    /// - `DuplicateAssignment` when the pair already exists
    pub async fn add_assignment(
        &self,
        bill_id: BillId,
        item_id: ItemId,
        participant_id: ParticipantId,
    ) -> CoreResult<ItemAssignment> {
        self.bill(bill_id).await?;
        self.item_on_bill(bill_id, item_id).await?;
        self.participant_on_bill(bill_id, participant_id).await?;

        match self.store.insert_assignment(item_id, participant_id).await {
            Ok(assignment) => {
                info!(bill_id = %bill_id, item_id, participant_id, "Item assigned");
                Ok(assignment)
            }
            Err(err @ CoreError::DuplicateAssignment { .. }) => {
                debug!(bill_id = %bill_id, item_id, participant_id, "Duplicate assignment");
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Unlinks an item from a participant.
    pub async fn remove_assignment(
        &self,
        bill_id: BillId,
        item_id: ItemId,
        participant_id: ParticipantId,
    ) -> CoreResult<()> {
        self.bill(bill_id).await?;
        self.item_on_bill(bill_id, item_id).await?;

        if !self.store.delete_assignment(item_id, participant_id).await? {
            return Err(CoreError::AssignmentNotFound {
                item_id,
                participant_id,
            });
        }
        info!(bill_id = %bill_id, item_id, participant_id, "Item unassigned");
        Ok(())
    }

    async fn item_on_bill(&self, bill_id: BillId, item_id: ItemId) -> CoreResult<Item> {
        match self.store.get_item(item_id).await? {
            Some(item) if item.bill_id == bill_id => Ok(item),
            _ => Err(CoreError::ItemNotFound { item_id }),
        }
    }

    async fn participant_on_bill(
        &self,
        bill_id: BillId,
        participant_id: ParticipantId,
    ) -> CoreResult<Participant> {
        match self.store.get_participant(participant_id).await? {
            Some(participant) if participant.bill_id == bill_id => Ok(participant),
            _ => Err(CoreError::ParticipantNotFound {
                bill_id,
                participant_id,
            }),
        }
    }

    // =========================================================================
    // Extraction Lifecycle
    // =========================================================================

    /// Marks the bill as handed to the extraction workflow.
    ///
    /// Refused while the bill is already `processing` or once it is
    /// `completed`.
    pub async fn begin_extraction(&self, bill_id: BillId) -> CoreResult<Bill> {
        let bill = self.set_status(bill_id, BillStatus::Processing).await?;
        info!(bill_id = %bill_id, "Extraction started");
        Ok(bill)
    }

    /// Ingests the workflow's output and marks the bill completed.
    ///
    /// An invalid payload marks the bill `failed` and returns the validation
    /// error; nothing from the payload is stored. A completed bill cannot be
    /// ingested twice: the store checks the status in the same atomic write,
    /// so of two concurrent callbacks one gets `InvalidStatusTransition`.
    pub async fn complete_extraction(
        &self,
        bill_id: BillId,
        payload: &ExtractedBill,
    ) -> CoreResult<Vec<Item>> {
        let ingest = match validate_extraction(payload) {
            Ok(ingest) => ingest,
            Err(err) => {
                warn!(bill_id = %bill_id, error = %err, "Extraction payload rejected");
                self.set_status(bill_id, BillStatus::Failed).await?;
                return Err(err.into());
            }
        };

        let items = match self
            .store
            .ingest_extraction(bill_id, ingest.tax, ingest.tip, ingest.items)
            .await
        {
            Ok(items) => items,
            Err(
                err @ (CoreError::BillNotFound(_) | CoreError::InvalidStatusTransition { .. }),
            ) => return Err(err),
            Err(err) => {
                warn!(bill_id = %bill_id, error = %err, "Extraction ingest failed");
                self.set_status(bill_id, BillStatus::Failed).await?;
                return Err(err);
            }
        };

        info!(bill_id = %bill_id, items = items.len(), "Extraction completed");
        Ok(items)
    }

    /// Records a workflow failure. Returns the error to surface to the
    /// caller: `ExtractionFailed`, or whatever prevented marking the bill.
    pub async fn fail_extraction(&self, bill_id: BillId, reason: impl Into<String>) -> CoreError {
        let reason = reason.into();
        if let Err(err) = self.set_status(bill_id, BillStatus::Failed).await {
            return err;
        }
        warn!(bill_id = %bill_id, reason = %reason, "Extraction failed");
        CoreError::ExtractionFailed { bill_id, reason }
    }

    async fn set_status(&self, bill_id: BillId, status: BillStatus) -> CoreResult<Bill> {
        let bill = self
            .store
            .set_bill_status(bill_id, status)
            .await?
            .ok_or(CoreError::BillNotFound(bill_id))?;
        debug!(bill_id = %bill_id, status = %status, "Bill status changed");
        Ok(bill)
    }

    // =========================================================================
    // Summary
    // =========================================================================

    /// Allocates the bill from its current state.
    pub async fn summary(&self, bill_id: BillId) -> CoreResult<Allocation> {
        let (_, allocation) = self.bill_summary(bill_id).await?;
        Ok(allocation)
    }

    /// Like [`summary`](Self::summary), together with the bill it was
    /// computed from.
    pub async fn bill_summary(&self, bill_id: BillId) -> CoreResult<(Bill, Allocation)> {
        let snapshot = self.snapshot(bill_id).await?;
        let allocation = allocate(&snapshot);
        debug!(
            bill_id = %bill_id,
            participants = allocation.participants.len(),
            bill_total = %allocation.bill_total,
            unassigned = %allocation.unassigned_items_total,
            "Bill allocated"
        );
        Ok((snapshot.bill, allocation))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

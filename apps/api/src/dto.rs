//! # Request and Response Bodies
//!
//! Amounts cross the HTTP boundary in major units (`12.5` means $12.50),
//! the same convention the extraction workflow uses. Everything is converted
//! to [`Money`] on the way in and back to major units on the way out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use splitbill_core::{
    Bill, BillId, BillStatus, BillSummary, BillUpdate, ExtractedBill, Item, ItemId, ItemUpdate,
    Money, NewBill, NewParticipant, Participant, ParticipantId, ValidationError,
    EXTRACTION_PAYLOAD_CODE,
};

use crate::error::ApiError;

fn cents(amount: f64, field: &str) -> Result<i64, ApiError> {
    Money::try_from_major(amount, field)
        .map(|m| m.cents())
        .map_err(|e: ValidationError| ApiError::validation(e.to_string()))
}

fn optional_cents(amount: Option<f64>, field: &str) -> Result<Option<i64>, ApiError> {
    amount.map(|a| cents(a, field)).transpose()
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateBillRequest {
    pub name: String,
    #[serde(default)]
    pub tax_amount: f64,
    #[serde(default)]
    pub tip_amount: f64,
}

impl CreateBillRequest {
    pub fn into_new_bill(self) -> Result<NewBill, ApiError> {
        Ok(NewBill {
            tax_cents: cents(self.tax_amount, "tax_amount")?,
            tip_cents: cents(self.tip_amount, "tip_amount")?,
            name: self.name,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateBillRequest {
    pub tax_amount: Option<f64>,
    pub tip_amount: Option<f64>,
}

impl UpdateBillRequest {
    pub fn into_update(self) -> Result<BillUpdate, ApiError> {
        Ok(BillUpdate {
            tax_cents: optional_cents(self.tax_amount, "tax_amount")?,
            tip_cents: optional_cents(self.tip_amount, "tip_amount")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
}

impl UpdateItemRequest {
    pub fn into_update(self) -> Result<ItemUpdate, ApiError> {
        Ok(ItemUpdate {
            name: self.name,
            price_cents: optional_cents(self.price, "price")?,
            quantity: self.quantity,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ParticipantRequest {
    pub name: String,
    #[serde(default)]
    pub share_of_common_costs: f64,
}

impl ParticipantRequest {
    pub fn into_new_participant(self) -> Result<NewParticipant, ApiError> {
        Ok(NewParticipant {
            share_of_common_costs_cents: cents(
                self.share_of_common_costs,
                "share_of_common_costs",
            )?,
            name: self.name,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignmentRequest {
    pub item_id: ItemId,
    pub participant_id: ParticipantId,
}

#[derive(Debug, Deserialize)]
pub struct ExtractionFailedRequest {
    #[serde(default = "default_failure_reason")]
    pub reason: String,
}

fn default_failure_reason() -> String {
    "extraction workflow reported a failure".to_string()
}

/// Accepts the two shapes the extraction workflow posts:
///
/// ```text
/// { "code": "API_SPLITBILL_LLMOCR", "items": [...], "tax": 1.2, "tip": 0, "total": 9.9 }
/// { "extracted_data": "{\"items\": [...], \"tax\": 1.2, ...}" }
/// ```
///
/// The error string is recorded as the failure reason.
pub fn parse_extraction_payload(body: &[u8]) -> Result<ExtractedBill, String> {
    let raw: Value = serde_json::from_slice(body).map_err(|e| format!("Invalid JSON: {e}"))?;

    if raw.get("code").and_then(Value::as_str) == Some(EXTRACTION_PAYLOAD_CODE) {
        return serde_json::from_value(raw).map_err(|e| format!("Invalid extraction payload: {e}"));
    }

    let embedded = raw
        .get("extracted_data")
        .ok_or_else(|| "Missing required field: extracted_data".to_string())?
        .as_str()
        .ok_or_else(|| "extracted_data must be a string".to_string())?;

    serde_json::from_str(embedded).map_err(|e| format!("Invalid extracted_data: {e}"))
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: ItemId,
    pub bill_id: BillId,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        ItemResponse {
            price: item.price().to_major(),
            id: item.id,
            bill_id: item.bill_id,
            name: item.name,
            quantity: item.quantity,
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ParticipantResponse {
    pub id: ParticipantId,
    pub bill_id: BillId,
    pub name: String,
    pub payment_status: String,
    pub share_of_common_costs: f64,
    pub created_at: DateTime<Utc>,
}

impl From<Participant> for ParticipantResponse {
    fn from(p: Participant) -> Self {
        ParticipantResponse {
            share_of_common_costs: p.share_of_common_costs().to_major(),
            id: p.id,
            bill_id: p.bill_id,
            name: p.name,
            payment_status: p.payment_status,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BillResponse {
    pub id: BillId,
    pub name: String,
    pub status: BillStatus,
    pub tax_amount: f64,
    pub tip_amount: f64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemResponse>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<ParticipantResponse>,
}

impl BillResponse {
    pub fn with_children(bill: Bill, items: Vec<Item>, participants: Vec<Participant>) -> Self {
        BillResponse {
            items: items.into_iter().map(ItemResponse::from).collect(),
            participants: participants
                .into_iter()
                .map(ParticipantResponse::from)
                .collect(),
            ..BillResponse::from(bill)
        }
    }
}

impl From<Bill> for BillResponse {
    fn from(bill: Bill) -> Self {
        BillResponse {
            tax_amount: bill.tax().to_major(),
            tip_amount: bill.tip().to_major(),
            id: bill.id,
            name: bill.name,
            status: bill.status,
            created_at: bill.created_at,
            items: Vec::new(),
            participants: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub bill_id: BillId,
    pub status: BillStatus,
}

impl From<&Bill> for StatusResponse {
    fn from(bill: &Bill) -> Self {
        StatusResponse {
            bill_id: bill.id,
            status: bill.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProcessDataResponse {
    pub message: String,
    pub items: Vec<ItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct ParticipantShareResponse {
    pub participant_id: ParticipantId,
    pub name: String,
    pub item_total: f64,
    pub tax_tip_share: f64,
    pub total: f64,
    pub share_of_common_costs: f64,
    pub amount_due: f64,
}

/// Allocation summary, rounded to cents, in major units.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub bill_id: BillId,
    pub tax_amount: f64,
    pub tip_amount: f64,
    pub bill_items_total: f64,
    pub total_assigned_items: f64,
    pub unassigned_items_total: f64,
    pub total_tax_tip: f64,
    pub bill_total: f64,
    pub participants: Vec<ParticipantShareResponse>,
}

impl SummaryResponse {
    pub fn new(bill: &Bill, summary: BillSummary) -> Self {
        SummaryResponse {
            bill_id: bill.id,
            tax_amount: bill.tax().to_major(),
            tip_amount: bill.tip().to_major(),
            bill_items_total: summary.bill_items_total.to_major(),
            total_assigned_items: summary.total_assigned_items.to_major(),
            unassigned_items_total: summary.unassigned_items_total.to_major(),
            total_tax_tip: summary.total_tax_tip.to_major(),
            bill_total: summary.bill_total.to_major(),
            participants: summary
                .participants
                .into_iter()
                .map(|p| ParticipantShareResponse {
                    participant_id: p.participant_id,
                    name: p.name,
                    item_total: p.item_total.to_major(),
                    tax_tip_share: p.tax_tip_share.to_major(),
                    total: p.total.to_major(),
                    share_of_common_costs: p.share_of_common_costs.to_major(),
                    amount_due: p.amount_due.to_major(),
                })
                .collect(),
        }
    }
}

//! # Validation Module
//!
//! Input validation for SplitBill mutations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP boundary (apps/api)                                     │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── Major units → cents (rejects NaN / infinity)                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Names non-empty, ≤ 255 chars                                      │
//! │  ├── 0 ≤ amounts ≤ MAX_AMOUNT_CENTS, 1 ≤ quantity ≤ 999                │
//! │  ├── At most 100 items per extraction                                  │
//! │  └── Partial updates carry at least one field                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints on amounts and quantity                         │
//! │  ├── PRIMARY KEY (item_id, participant_id)                             │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here runs before the store is touched, so a rejected request
//! never leaves a partial write behind.
//!
//! ## Usage
//! ```rust
//! use splitbill_core::validation::{normalize_name, validate_quantity};
//!
//! assert_eq!(normalize_name("name", "  Ramen ").unwrap(), "Ramen");
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{
    BillUpdate, ExtractedBill, ExtractionIngest, ItemUpdate, NewBill, NewItem, NewParticipant,
};
use crate::{MAX_AMOUNT_CENTS, MAX_BILL_ITEMS, MAX_ITEM_QUANTITY, MAX_NAME_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Trims a display name and checks it.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 255 characters
///
/// ## Example
/// ```rust
/// use splitbill_core::validation::normalize_name;
///
/// assert!(normalize_name("name", "Friday dinner").is_ok());
/// assert!(normalize_name("name", "   ").is_err());
/// assert!(normalize_name("name", &"A".repeat(256)).is_err());
/// ```
pub fn normalize_name(field: &str, name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(name.to_string())
}

/// Validates an amount in cents.
///
/// ## Rules
/// - Must be non-negative; zero is fine (free item, no tip)
/// - Must not exceed MAX_AMOUNT_CENTS ($1,000,000)
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::negative(field));
    }

    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::out_of_range(field, 0, MAX_AMOUNT_CENTS));
    }

    Ok(())
}

/// Validates an item quantity.
///
/// ## Rules
/// - Must be at least 1
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::out_of_range("quantity", 1, MAX_ITEM_QUANTITY));
    }

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

pub fn validate_new_bill(bill: &NewBill) -> ValidationResult<NewBill> {
    let name = normalize_name("name", &bill.name)?;
    validate_amount_cents("tax", bill.tax_cents)?;
    validate_amount_cents("tip", bill.tip_cents)?;

    Ok(NewBill {
        name,
        tax_cents: bill.tax_cents,
        tip_cents: bill.tip_cents,
    })
}

pub fn validate_new_participant(participant: &NewParticipant) -> ValidationResult<NewParticipant> {
    let name = normalize_name("name", &participant.name)?;
    validate_amount_cents(
        "share_of_common_costs",
        participant.share_of_common_costs_cents,
    )?;

    Ok(NewParticipant {
        name,
        share_of_common_costs_cents: participant.share_of_common_costs_cents,
    })
}

pub fn validate_new_item(item: &NewItem) -> ValidationResult<NewItem> {
    let name = normalize_name("name", &item.name)?;
    validate_amount_cents("price", item.price_cents)?;
    validate_quantity(item.quantity)?;

    Ok(NewItem {
        name,
        price_cents: item.price_cents,
        quantity: item.quantity,
    })
}

/// Validates a partial item correction. Only present fields are checked.
///
/// ## Example
/// ```rust
/// use splitbill_core::types::ItemUpdate;
/// use splitbill_core::validation::validate_item_update;
///
/// let update = ItemUpdate { price_cents: Some(-1), ..Default::default() };
/// assert!(validate_item_update(&update).is_err());
/// assert!(validate_item_update(&ItemUpdate::default()).is_err()); // nothing to update
/// ```
pub fn validate_item_update(update: &ItemUpdate) -> ValidationResult<ItemUpdate> {
    if update.is_empty() {
        return Err(ValidationError::NoChanges);
    }

    let name = update
        .name
        .as_deref()
        .map(|n| normalize_name("name", n))
        .transpose()?;
    if let Some(price) = update.price_cents {
        validate_amount_cents("price", price)?;
    }
    if let Some(quantity) = update.quantity {
        validate_quantity(quantity)?;
    }

    Ok(ItemUpdate {
        name,
        price_cents: update.price_cents,
        quantity: update.quantity,
    })
}

pub fn validate_bill_update(update: &BillUpdate) -> ValidationResult<()> {
    if update.is_empty() {
        return Err(ValidationError::NoChanges);
    }
    if let Some(tax) = update.tax_cents {
        validate_amount_cents("tax", tax)?;
    }
    if let Some(tip) = update.tip_cents {
        validate_amount_cents("tip", tip)?;
    }

    Ok(())
}

// =============================================================================
// Extraction Validator
// =============================================================================

/// Checks a workflow payload and converts it to cents.
///
/// Every item must pass; the first failure is reported with its index so
/// the whole payload is rejected and nothing is ingested.
pub fn validate_extraction(payload: &ExtractedBill) -> ValidationResult<ExtractionIngest> {
    if payload.items.len() > MAX_BILL_ITEMS {
        return Err(ValidationError::out_of_range(
            "items",
            0,
            MAX_BILL_ITEMS as i64,
        ));
    }

    let tax = Money::try_from_major(payload.tax, "tax")?;
    validate_amount_cents("tax", tax.cents())?;
    let tip = Money::try_from_major(payload.tip, "tip")?;
    validate_amount_cents("tip", tip.cents())?;

    let items = payload
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            Money::try_from_major(item.price, "price")
                .and_then(|price| {
                    validate_new_item(&NewItem {
                        name: item.name.clone(),
                        price_cents: price.cents(),
                        quantity: item.quantity,
                    })
                })
                .map_err(|source| ValidationError::InvalidItem {
                index,
                source: Box::new(source),
            })
        })
        .collect::<ValidationResult<Vec<_>>>()?;

    Ok(ExtractionIngest { tax, tip, items })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExtractedItem;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("name", " Ana ").unwrap(), "Ana");
        assert!(normalize_name("name", "").is_err());
        assert!(normalize_name("name", "\t\n").is_err());
        assert!(normalize_name("name", &"é".repeat(255)).is_ok());
        assert!(matches!(
            normalize_name("name", &"A".repeat(256)),
            Err(ValidationError::TooLong { max: 255, .. })
        ));
    }

    #[test]
    fn test_validate_amounts_and_quantity() {
        assert!(validate_amount_cents("price", 0).is_ok());
        assert!(validate_amount_cents("price", 1099).is_ok());
        assert!(validate_amount_cents("price", -1).is_err());

        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn test_amounts_and_quantity_are_bounded() {
        assert!(validate_amount_cents("price", MAX_AMOUNT_CENTS).is_ok());
        assert!(matches!(
            validate_amount_cents("price", MAX_AMOUNT_CENTS + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_amount_cents("tip", i64::MAX).is_err());

        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(matches!(
            validate_quantity(1_000_000_000),
            Err(ValidationError::OutOfRange { max: 999, .. })
        ));

        let update = ItemUpdate {
            price_cents: Some(10_000_000_000),
            quantity: Some(1_000_000_000),
            ..Default::default()
        };
        assert!(validate_item_update(&update).is_err());
    }

    #[test]
    fn test_validate_extraction_limits_item_count() {
        let item = ExtractedItem {
            name: "Gyoza".into(),
            price: 6.0,
            quantity: 1,
        };
        let mut payload = ExtractedBill {
            items: vec![item; MAX_BILL_ITEMS],
            tax: 0.0,
            tip: 0.0,
            total: None,
        };
        assert!(validate_extraction(&payload).is_ok());

        payload.items.push(payload.items[0].clone());
        assert!(matches!(
            validate_extraction(&payload),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_new_bill_trims_name() {
        let bill = validate_new_bill(&NewBill {
            name: "  Lunch ".into(),
            tax_cents: 200,
            tip_cents: 0,
        })
        .unwrap();
        assert_eq!(bill.name, "Lunch");

        assert!(validate_new_bill(&NewBill {
            name: "Lunch".into(),
            tax_cents: -1,
            tip_cents: 0,
        })
        .is_err());
    }

    #[test]
    fn test_validate_item_update() {
        let update = validate_item_update(&ItemUpdate {
            name: Some(" Miso ".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(update.name.as_deref(), Some("Miso"));

        assert!(matches!(
            validate_item_update(&ItemUpdate::default()),
            Err(ValidationError::NoChanges)
        ));
        assert!(validate_item_update(&ItemUpdate {
            name: Some(" ".into()),
            ..Default::default()
        })
        .is_err());
        assert!(validate_item_update(&ItemUpdate {
            quantity: Some(0),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_validate_bill_update() {
        assert!(validate_bill_update(&BillUpdate {
            tax_cents: Some(0),
            tip_cents: None,
        })
        .is_ok());
        assert!(validate_bill_update(&BillUpdate {
            tax_cents: None,
            tip_cents: Some(-5),
        })
        .is_err());
        assert!(matches!(
            validate_bill_update(&BillUpdate::default()),
            Err(ValidationError::NoChanges)
        ));
    }

    #[test]
    fn test_validate_extraction_converts_to_cents() {
        let payload = ExtractedBill {
            items: vec![
                ExtractedItem {
                    name: "Ramen".into(),
                    price: 12.5,
                    quantity: 2,
                },
                ExtractedItem {
                    name: "Tea".into(),
                    price: 0.0,
                    quantity: 1,
                },
            ],
            tax: 2.0,
            tip: 3.25,
            total: Some(30.25),
        };

        let ingest = validate_extraction(&payload).unwrap();
        assert_eq!(ingest.tax.cents(), 200);
        assert_eq!(ingest.tip.cents(), 325);
        assert_eq!(ingest.items.len(), 2);
        assert_eq!(ingest.items[0].price_cents, 1250);
        assert_eq!(ingest.items[0].quantity, 2);
    }

    #[test]
    fn test_validate_extraction_reports_item_index() {
        let payload = ExtractedBill {
            items: vec![
                ExtractedItem {
                    name: "Ramen".into(),
                    price: 12.5,
                    quantity: 1,
                },
                ExtractedItem {
                    name: "Refund?".into(),
                    price: -4.0,
                    quantity: 1,
                },
            ],
            tax: 0.0,
            tip: 0.0,
            total: None,
        };

        match validate_extraction(&payload) {
            Err(ValidationError::InvalidItem { index, source }) => {
                assert_eq!(index, 1);
                assert!(matches!(*source, ValidationError::Negative { .. }));
            }
            other => panic!("expected InvalidItem, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_extraction_rejects_bad_totals() {
        let payload = ExtractedBill {
            items: vec![],
            tax: f64::NAN,
            tip: 0.0,
            total: None,
        };
        assert!(matches!(
            validate_extraction(&payload),
            Err(ValidationError::InvalidFormat { .. })
        ));

        let payload = ExtractedBill {
            items: vec![],
            tax: 0.0,
            tip: -1.0,
            total: None,
        };
        assert!(matches!(
            validate_extraction(&payload),
            Err(ValidationError::Negative { .. })
        ));
    }
}

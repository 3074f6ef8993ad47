//! End-to-end bill splitting through the public API, on the in-memory store.

use splitbill_core::types::{ExtractedBill, ExtractedItem, NewBill, NewParticipant};
use splitbill_core::{BillEditor, CoreError, ErrorKind, MemoryBillStore, Money, Share};

fn extracted(items: &[(&str, f64, i64)], tax: f64, tip: f64) -> ExtractedBill {
    ExtractedBill {
        items: items
            .iter()
            .map(|&(name, price, quantity)| ExtractedItem {
                name: name.into(),
                price,
                quantity,
            })
            .collect(),
        tax,
        tip,
        total: None,
    }
}

async fn setup(
    items: &[(&str, f64, i64)],
    tax: f64,
    tip: f64,
    people: &[&str],
) -> (
    BillEditor<MemoryBillStore>,
    uuid::Uuid,
    Vec<i64>,
    Vec<i64>,
) {
    let editor = BillEditor::new(MemoryBillStore::new());
    let bill = editor
        .create_bill(NewBill {
            name: "Team dinner".into(),
            tax_cents: 0,
            tip_cents: 0,
        })
        .await
        .unwrap();
    editor.begin_extraction(bill.id).await.unwrap();
    let items = editor
        .complete_extraction(bill.id, &extracted(items, tax, tip))
        .await
        .unwrap();

    let mut participant_ids = Vec::new();
    for name in people {
        let p = editor
            .add_participant(
                bill.id,
                NewParticipant {
                    name: (*name).into(),
                    share_of_common_costs_cents: 0,
                },
            )
            .await
            .unwrap();
        participant_ids.push(p.id);
    }

    (
        editor,
        bill.id,
        items.iter().map(|i| i.id).collect(),
        participant_ids,
    )
}

#[tokio::test]
async fn scenario_a_shared_item_splits_evenly() {
    let (editor, bill_id, items, people) = setup(&[("Platter", 30.0, 1)], 0.0, 0.0, &["Ana", "Ben"]).await;
    editor.add_assignment(bill_id, items[0], people[0]).await.unwrap();
    editor.add_assignment(bill_id, items[0], people[1]).await.unwrap();

    let summary = editor.summary(bill_id).await.unwrap().summary();

    assert_eq!(summary.participants[0].item_total, Money::from_cents(1500));
    assert_eq!(summary.participants[1].item_total, Money::from_cents(1500));
}

#[tokio::test]
async fn scenario_b_single_sharer_pays_tax_and_tip() {
    let (editor, bill_id, items, people) = setup(&[("Beer", 10.0, 2)], 2.0, 3.0, &["Ana"]).await;
    editor.add_assignment(bill_id, items[0], people[0]).await.unwrap();

    let allocation = editor.summary(bill_id).await.unwrap();

    assert_eq!(allocation.participants[0].total, Share::from_cents(2500));
    assert_eq!(allocation.unassigned_items_total, Money::zero());
    assert_eq!(allocation.bill_total, Money::from_cents(2500));
}

#[tokio::test]
async fn scenario_c_unassigned_item_stays_out() {
    let (editor, bill_id, items, people) =
        setup(&[("Steak", 12.0, 1), ("Salad", 8.0, 1)], 2.0, 0.0, &["Ana"]).await;
    editor.add_assignment(bill_id, items[0], people[0]).await.unwrap();

    let allocation = editor.summary(bill_id).await.unwrap();

    assert_eq!(allocation.total_assigned_items, Money::from_cents(1200));
    assert_eq!(allocation.unassigned_items_total, Money::from_cents(800));
    assert_eq!(allocation.participants[0].tax_tip_share, Share::from_cents(200));
    assert_eq!(allocation.participants[0].total, Share::from_cents(1400));
    assert_eq!(allocation.bill_total, Money::from_cents(2200));
}

#[tokio::test]
async fn scenario_d_removed_sharer_hands_item_back() {
    let (editor, bill_id, items, people) = setup(&[("Pizza", 24.0, 1)], 0.0, 0.0, &["Ana", "Ben"]).await;
    editor.add_assignment(bill_id, items[0], people[0]).await.unwrap();
    editor.add_assignment(bill_id, items[0], people[1]).await.unwrap();

    editor.remove_participant(bill_id, people[0]).await.unwrap();

    let allocation = editor.summary(bill_id).await.unwrap();
    assert_eq!(allocation.participants.len(), 1);
    assert_eq!(allocation.participants[0].participant_id, people[1]);
    assert_eq!(allocation.participants[0].item_total, Share::from_cents(2400));
    assert!(editor
        .assignments(bill_id)
        .await
        .unwrap()
        .iter()
        .all(|a| a.participant_id != people[0]));
}

#[tokio::test]
async fn scenario_e_duplicate_assignment_conflicts() {
    let (editor, bill_id, items, people) = setup(&[("Fries", 5.0, 1)], 0.0, 0.0, &["Ana"]).await;
    editor.add_assignment(bill_id, items[0], people[0]).await.unwrap();

    let err = editor
        .add_assignment(bill_id, items[0], people[0])
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::DuplicateAssignment { .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(editor.assignments(bill_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_duplicate_assignments_yield_one_edge() {
    let (editor, bill_id, items, people) = setup(&[("Fries", 5.0, 1)], 0.0, 0.0, &["Ana"]).await;

    let (a, b) = tokio::join!(
        editor.add_assignment(bill_id, items[0], people[0]),
        editor.add_assignment(bill_id, items[0], people[0]),
    );

    assert!(a.is_ok() != b.is_ok());
    assert_eq!(editor.assignments(bill_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_completions_ingest_once() {
    let editor = BillEditor::new(MemoryBillStore::new());
    let bill = editor
        .create_bill(NewBill {
            name: "Takeout".into(),
            tax_cents: 0,
            tip_cents: 0,
        })
        .await
        .unwrap();
    editor.begin_extraction(bill.id).await.unwrap();
    let payload = extracted(&[("Curry", 12.0, 1)], 1.0, 0.0);

    let (a, b) = tokio::join!(
        editor.complete_extraction(bill.id, &payload),
        editor.complete_extraction(bill.id, &payload),
    );

    assert!(a.is_ok() != b.is_ok());
    let err = a.err().or(b.err()).unwrap();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let allocation = editor.summary(bill.id).await.unwrap();
    assert_eq!(allocation.bill_items_total, Money::from_cents(1200));
    assert_eq!(editor.items(bill.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn tax_tip_is_fully_allocated_once_anything_is_assigned() {
    let (editor, bill_id, items, people) = setup(
        &[("A", 7.77, 3), ("B", 1.01, 1), ("C", 19.99, 1)],
        3.11,
        4.44,
        &["Ana", "Ben", "Cy"],
    )
    .await;
    editor.add_assignment(bill_id, items[0], people[0]).await.unwrap();
    editor.add_assignment(bill_id, items[0], people[1]).await.unwrap();
    editor.add_assignment(bill_id, items[0], people[2]).await.unwrap();
    editor.add_assignment(bill_id, items[1], people[1]).await.unwrap();

    let allocation = editor.summary(bill_id).await.unwrap();

    let tax_tip: Share = allocation.participants.iter().map(|p| p.tax_tip_share).sum();
    let items_sum: Share = allocation.participants.iter().map(|p| p.item_total).sum();
    assert_eq!(tax_tip, Share::from_cents(755));
    assert_eq!(items_sum, Share::from(allocation.total_assigned_items));
    assert_eq!(allocation.unassigned_items_total, Money::from_cents(1999));
    assert_eq!(
        allocation.bill_total,
        allocation.bill_items_total + Money::from_cents(755)
    );
}

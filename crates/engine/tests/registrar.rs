mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use engine::{
    EngineError, ExpenseCategory, ExpenseDraft, ExpensePatch, ExpenseStatus, MoneyCents,
    ReceiptDraft, ReceiptPatch, ReviewDecision,
};

use common::{cents, engine_with_db, engine_with_file_db, register, register_admin};

#[tokio::test]
async fn expense_defaults_and_listing_order() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "alice").await;

    let first = engine
        .create_expense(alice.id, ExpenseDraft::new("  Lunch ", cents(1_250)))
        .await
        .unwrap();
    assert_eq!(first.name, "Lunch");
    assert_eq!(first.category, ExpenseCategory::Other);
    assert_eq!(first.status, ExpenseStatus::Pending);

    let second = engine
        .create_expense(
            alice.id,
            ExpenseDraft::new("Train", cents(800)).category(ExpenseCategory::Transport),
        )
        .await
        .unwrap();

    let listed = engine.list_expenses(alice.id).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn expense_validation() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "alice").await;

    assert!(matches!(
        engine
            .create_expense(alice.id, ExpenseDraft::new("   ", cents(100)))
            .await,
        Err(EngineError::Validation(_))
    ));
    assert!(matches!(
        engine
            .create_expense(alice.id, ExpenseDraft::new("Lunch", MoneyCents::ZERO))
            .await,
        Err(EngineError::InvalidAmount(_))
    ));
    assert!(engine.list_expenses(alice.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn expenses_are_owner_scoped() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "alice").await;
    let bob = register(&engine, "bob").await;

    let expense = engine
        .create_expense(alice.id, ExpenseDraft::new("Lunch", cents(1_000)))
        .await
        .unwrap();

    assert!(matches!(
        engine.expense(bob.id, expense.id).await,
        Err(EngineError::NotFoundOrUnauthorized(_))
    ));
    assert!(matches!(
        engine.delete_expense(bob.id, expense.id).await,
        Err(EngineError::NotFoundOrUnauthorized(_))
    ));
    assert_eq!(engine.clear_expenses(bob.id).await.unwrap(), 0);
    assert_eq!(engine.expense(alice.id, expense.id).await.unwrap(), expense);
}

#[tokio::test]
async fn update_only_while_pending() {
    let (engine, _db) = engine_with_db().await;
    let admin = register_admin(&engine, "root").await;
    let alice = register(&engine, "alice").await;

    let expense = engine
        .create_expense(alice.id, ExpenseDraft::new("Lunch", cents(1_000)))
        .await
        .unwrap();

    let updated = engine
        .update_expense(
            alice.id,
            expense.id,
            ExpensePatch {
                amount: Some(cents(1_500)),
                category: Some(ExpenseCategory::Food),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.amount, cents(1_500));
    assert_eq!(updated.name, "Lunch");
    assert_eq!(engine.expense(alice.id, expense.id).await.unwrap().amount, cents(1_500));

    assert!(matches!(
        engine
            .update_expense(alice.id, expense.id, ExpensePatch::default())
            .await,
        Err(EngineError::Validation(_))
    ));

    engine
        .review_expense(admin.id, expense.id, ReviewDecision::Approve)
        .await
        .unwrap();
    let err = engine
        .update_expense(
            alice.id,
            expense.id,
            ExpensePatch {
                name: Some("Dinner".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn totals_are_computed_per_owner() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "alice").await;
    let bob = register(&engine, "bob").await;

    let empty = engine.expense_totals(alice.id).await.unwrap();
    assert_eq!(empty.total_amount, MoneyCents::ZERO);
    assert_eq!(empty.total_count, 0);

    for amount in [1_000, 250, 50] {
        engine
            .create_expense(alice.id, ExpenseDraft::new("Item", cents(amount)))
            .await
            .unwrap();
    }
    engine
        .create_expense(bob.id, ExpenseDraft::new("Other", cents(9_999)))
        .await
        .unwrap();

    let totals = engine.expense_totals(alice.id).await.unwrap();
    assert_eq!(totals.total_amount, cents(1_300));
    assert_eq!(totals.total_count, 3);

    assert_eq!(engine.clear_expenses(alice.id).await.unwrap(), 3);
    assert_eq!(engine.expense_totals(alice.id).await.unwrap().total_count, 0);
    assert_eq!(engine.expense_totals(bob.id).await.unwrap().total_count, 1);
}

#[tokio::test]
async fn review_is_admin_only_and_leaves_budget_alone() {
    let (engine, _db) = engine_with_db().await;
    let admin = register_admin(&engine, "root").await;
    let alice = register(&engine, "alice").await;
    engine.deposit(alice.id, cents(10_000)).await.unwrap();

    let expense = engine
        .create_expense(alice.id, ExpenseDraft::new("Laptop", cents(5_000)))
        .await
        .unwrap();

    assert!(matches!(
        engine
            .review_expense(alice.id, expense.id, ReviewDecision::Approve)
            .await,
        Err(EngineError::Forbidden(_))
    ));
    assert!(matches!(
        engine.list_all_expenses(alice.id).await,
        Err(EngineError::Forbidden(_))
    ));

    let reviewed = engine
        .review_expense(admin.id, expense.id, ReviewDecision::Reject)
        .await
        .unwrap();
    assert_eq!(reviewed.status, ExpenseStatus::Rejected);
    assert_eq!(reviewed.reviewed_by, Some(admin.id));
    assert!(reviewed.reviewed_at.is_some());

    let budget = engine.budget(alice.id).await.unwrap();
    assert_eq!(budget.used_budget, MoneyCents::ZERO);

    assert_eq!(engine.list_all_expenses(admin.id).await.unwrap().len(), 1);
    engine
        .admin_delete_expense(admin.id, expense.id)
        .await
        .unwrap();
    assert!(engine.list_expenses(alice.id).await.unwrap().is_empty());
}

fn receipt_draft(name: &str, amount: i64) -> ReceiptDraft {
    ReceiptDraft {
        receipt_name: name.to_string(),
        amount: cents(amount),
        date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        image_url: None,
    }
}

#[tokio::test]
async fn receipt_lifecycle() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "alice").await;

    let receipt = engine
        .create_receipt(alice.id, receipt_draft(" Groceries ", 4_210))
        .await
        .unwrap();
    assert_eq!(receipt.receipt_name, "Groceries");

    let updated = engine
        .update_receipt(
            alice.id,
            receipt.id,
            ReceiptPatch {
                amount: Some(cents(4_000)),
                image_url: Some("/uploads/scan.png".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.amount, cents(4_000));
    assert_eq!(updated.receipt_name, "Groceries");
    assert_eq!(updated.image_url.as_deref(), Some("/uploads/scan.png"));

    engine
        .create_receipt(alice.id, receipt_draft("Fuel", 6_000))
        .await
        .unwrap();
    let totals = engine.receipt_totals(alice.id).await.unwrap();
    assert_eq!(totals.total_amount, cents(10_000));
    assert_eq!(totals.total_count, 2);

    let listed = engine.list_receipts(alice.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].receipt_name, "Fuel");

    engine.delete_receipt(alice.id, receipt.id).await.unwrap();
    assert!(matches!(
        engine.receipt(alice.id, receipt.id).await,
        Err(EngineError::NotFoundOrUnauthorized(_))
    ));
}

#[tokio::test]
async fn receipt_validation_and_scoping() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "alice").await;
    let bob = register(&engine, "bob").await;

    assert!(matches!(
        engine.create_receipt(alice.id, receipt_draft("", 100)).await,
        Err(EngineError::Validation(_))
    ));
    assert!(matches!(
        engine
            .create_receipt(alice.id, receipt_draft(&"x".repeat(101), 100))
            .await,
        Err(EngineError::Validation(_))
    ));
    assert!(matches!(
        engine.create_receipt(alice.id, receipt_draft("Fuel", 0)).await,
        Err(EngineError::InvalidAmount(_))
    ));

    let receipt = engine
        .create_receipt(alice.id, receipt_draft("Fuel", 100))
        .await
        .unwrap();
    assert!(matches!(
        engine
            .update_receipt(bob.id, receipt.id, ReceiptPatch::default())
            .await,
        Err(EngineError::NotFoundOrUnauthorized(_))
    ));
    assert!(matches!(
        engine.delete_receipt(bob.id, receipt.id).await,
        Err(EngineError::NotFoundOrUnauthorized(_))
    ));
}

#[tokio::test]
async fn receipt_updates_racing_a_delete_report_not_found() {
    let (engine, path) = engine_with_file_db().await;
    let alice = register(&engine, "alice").await;
    let receipt = engine
        .create_receipt(alice.id, receipt_draft("Fuel", 100))
        .await
        .unwrap();

    let engine = Arc::new(engine);
    let updates: Vec<_> = (0..6)
        .map(|i| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                let patch = ReceiptPatch {
                    amount: Some(cents(200 + i)),
                    ..Default::default()
                };
                engine.update_receipt(alice.id, receipt.id, patch).await
            })
        })
        .collect();
    engine.delete_receipt(alice.id, receipt.id).await.unwrap();

    for handle in updates {
        match handle.await.unwrap() {
            Ok(_) | Err(EngineError::NotFoundOrUnauthorized(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert!(matches!(
        engine
            .update_receipt(alice.id, receipt.id, ReceiptPatch::default())
            .await,
        Err(EngineError::NotFoundOrUnauthorized(_))
    ));
    assert!(engine.list_receipts(alice.id).await.unwrap().is_empty());

    drop(engine);
    let _ = std::fs::remove_file(path);
}

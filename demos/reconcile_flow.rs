//! End-to-end reconciliation example

use reconcile_core::utils::MemoryStore;
use reconcile_core::{
    AllocationUpdate, BatchSource, InvoiceSummary, ReceiptSummary, Reconciler, Rule,
    RuleAppliesTo, RuleMatchType,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🏦 Reconcile Core - Statement Reconciliation Example\n");

    // Create a reconciler with in-memory storage
    let storage = MemoryStore::new();
    let mut reconciler = Reconciler::new(storage, "demo-company");

    // 1. Import a bank statement
    println!("📄 Importing bank statement...");
    let statement = b"Date,Description,Amount\n\
        2024-03-01,WOOLWORTHS SANDTON,-250.00\n\
        2024-03-02,ACME CONSULTING EFT,1500.00\n\
        2024-03-03,UBER TRIP JHB,-85.50\n\
        2024-03-04,COFFEE CORNER,-35.00\n";
    let imported = reconciler.import_statement(statement).await?;
    println!("  ✓ Imported {imported} transactions\n");

    // 2. The documents on file: one processed receipt, one sent invoice
    let receipts = vec![ReceiptSummary {
        id: "r1".to_string(),
        status: "processed".to_string(),
        vendor: Some("Woolworths".to_string()),
        receipt_date: Some("2024-03-01".to_string()),
        created_at: "2024-03-01T08:00:00Z".to_string(),
        currency: "ZAR".to_string(),
        total_amount: Some(250.0),
    }];
    let invoices = vec![InvoiceSummary {
        id: "inv1".to_string(),
        workflow_status: "sent".to_string(),
        client_name: Some("Acme Consulting".to_string()),
        invoice_number: Some("INV-014".to_string()),
        invoice_date: Some("2024-03-01".to_string()),
        created_at: "2024-03-01T08:00:00Z".to_string(),
        currency: "ZAR".to_string(),
        total_amount: Some(1500.0),
    }];

    // 3. Compute and bulk-apply match suggestions
    println!("🔍 Matching transactions to documents...");
    let suggestions = reconciler.suggestions(&receipts, &invoices).await?;
    for (txn_id, suggestion) in &suggestions {
        match suggestion {
            Some(s) => println!("  ✓ {txn_id} -> {} (score {:.2})", s.label, s.score),
            None => println!("  ✗ {txn_id} -> no match"),
        }
    }
    let matched = reconciler
        .match_all_suggested(&receipts, &invoices, BatchSource::Reconciliation, 0)
        .await?;
    println!("  ✓ Applied {matched} suggestions\n");

    // 4. Rule-allocate the remainder
    println!("📋 Allocating unmatched transactions by rule...");
    let travel_rule = Rule {
        applies_to: RuleAppliesTo::Receipt,
        match_type: RuleMatchType::Contains,
        match_value: "uber".to_string(),
        set_category: "Travel".to_string(),
        set_account_code: "4500".to_string(),
        ..Rule::blank()
    };
    let allocated = reconciler
        .allocate_suggested(&[travel_rule], BatchSource::CatchUp, 0)
        .await?;
    println!("  ✓ Allocated {allocated} transactions\n");

    // 5. Touch up one allocation by hand
    let coffee_id = reconciler
        .transactions()
        .await?
        .iter()
        .find(|t| t.description.contains("COFFEE"))
        .map(|t| t.id.clone())
        .expect("coffee transaction imported above");
    reconciler
        .allocate(
            &coffee_id,
            AllocationUpdate {
                allocated: Some(true),
                category: Some("Meals".to_string()),
                ..AllocationUpdate::default()
            },
        )
        .await?;

    // 6. Report and export
    let totals = reconciler.totals(&receipts, &invoices).await?;
    println!(
        "📊 Progress: {} linked, {} suggested, {} missing ({} out • {} in)",
        totals.linked,
        totals.suggested,
        totals.missing_out + totals.missing_in,
        totals.missing_out,
        totals.missing_in
    );

    let csv = reconciler.export_allocations().await?;
    println!("\n📤 Allocation export:\n{csv}");

    let stats = reconciler.batch_stats().await?;
    println!("🗂️  Batch history ({} records, newest first):", stats.len());
    for stat in &stats {
        println!(
            "  {} {:?}/{:?} page {} -> {} applied",
            stat.created_at, stat.source, stat.action, stat.page_index, stat.applied
        );
    }

    Ok(())
}

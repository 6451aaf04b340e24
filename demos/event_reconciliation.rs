//! Event payment reconciliation example

use reconcile_core::utils::{format_money, MemoryStorage};
use reconcile_core::{filter_registrations, unclaimed_bank_entries, Session, StatusFilter};

const ROSTER: &str = "\
Player\tAmount\tNote\tTail
Alice\t1,000\t\t12345
Bob\t500\t\t99999
Carol\t500\t\t99999
Dan\t800\t\t11111
Erin\t600\t\t44444
";

const STATEMENT: &str = "\
Date\tTime\tSummary\tDebit\tCredit\tNote\tBank\tTail\tMessage
2024/03/01\t09:00\tTransfer\t\t1,000\tATM\t812\t12345\t
2024/03/01\t10:00\tTransfer\t\t1,000\t\t700\t99999\t
2024/03/02\t11:30\tTransfer\t\t700\t\t808\t11111\t
2024/03/02\t12:45\tTransfer\t\t600\t\t013\t00000\tErin registration
";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reconcile_core=info".into()),
        )
        .init();

    println!("Reconcile Core - Event Reconciliation Example\n");

    let mut session = Session::new(MemoryStorage::new());

    // 1. Import both rosters; matching runs automatically
    let regs = session.import_registrations(ROSTER).await?;
    let banks = session
        .import_bank_entries(STATEMENT, |p| {
            println!("  importing bank entries... {}%", p.percent())
        })
        .await?;
    println!("Imported {regs} registrations and {banks} bank entries\n");

    let registrations = session.registrations().await?;
    for reg in filter_registrations(&registrations, "", StatusFilter::All) {
        println!(
            "  {:<8} {:>8}  {:?}  {}",
            reg.player_name,
            format_money(&reg.total_amount),
            reg.status,
            reg.reconciliation_note.as_deref().unwrap_or("-")
        );
    }
    println!();

    // 2. Dan paid the rest in cash: record it by hand
    let dan = registrations
        .iter()
        .find(|r| r.player_name == "Dan")
        .ok_or("Dan missing")?;
    if let Some(entry) = session.inject_payment(&dan.id, "Paid in cash at check-in").await? {
        println!("Recorded manual payment {} for Dan\n", entry.id);
    }

    // 3. What is left for review
    let bank_entries = session.bank_entries().await?;
    for bank in unclaimed_bank_entries(&bank_entries, "") {
        println!(
            "  Unclaimed: {} {} {} tail {}",
            bank.date,
            bank.time,
            format_money(&bank.amount),
            bank.last_five_digits
        );
    }

    let summary = session.summary().await?;
    println!(
        "\nMatched {}, partial {}, pending {}; expected {}, received {}, difference {}",
        summary.matched,
        summary.partial,
        summary.pending,
        format_money(&summary.total_expected),
        format_money(&summary.total_received),
        format_money(&summary.difference)
    );

    Ok(())
}

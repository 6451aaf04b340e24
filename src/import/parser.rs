//! Tab-separated row parsing for registrations and bank entries
//!
//! Registration columns: player name, amount, note, tail digits.
//! Bank columns: date, time, summary, debit (ignored), amount, note,
//! counterpart bank, tail digits, message.

use bigdecimal::BigDecimal;
use csv::{ReaderBuilder, StringRecord};
use tracing::debug;
use uuid::Uuid;

use super::{ImportConfig, ImportMode};
use crate::types::*;
use crate::utils::{is_positive_amount, normalize_tail_digits, parse_amount};

/// Read data rows from pasted text, header row skipped, blank rows dropped
pub fn read_rows(text: &str) -> ReconcileResult<Vec<StringRecord>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(text.trim().as_bytes());

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(record);
    }
    Ok(rows)
}

fn column<'r>(record: &'r StringRecord, index: usize) -> &'r str {
    record.get(index).map(str::trim).unwrap_or("")
}

/// Build a registration from one row.
///
/// In strict mode rows missing a name, a positive amount or tail digits are
/// rejected. In loose mode they are kept with defaults.
pub fn registration_from_record(record: &StringRecord, mode: ImportMode) -> Option<RegistrationEntry> {
    let player_name = column(record, 0);
    let amount = parse_amount(column(record, 1));
    let full_note = record.get(2).unwrap_or("");

    let tail_source = match column(record, 3) {
        "" => column(record, 2),
        tail => tail,
    };
    let last_five_digits = normalize_tail_digits(tail_source);

    let total_amount = match (mode, amount) {
        (ImportMode::Strict, Some(amount)) if is_positive_amount(&amount) => amount,
        (ImportMode::Strict, _) => return None,
        (ImportMode::Loose, amount) => amount.unwrap_or_else(|| BigDecimal::from(0)),
    };
    if mode == ImportMode::Strict && (player_name.is_empty() || last_five_digits.is_empty()) {
        return None;
    }

    Some(RegistrationEntry::new(
        format!("reg-{}", Uuid::new_v4()),
        player_name.to_string(),
        total_amount,
        last_five_digits,
        full_note.to_string(),
    ))
}

/// Parse a pasted registration roster
pub fn parse_registrations(
    text: &str,
    config: &ImportConfig,
) -> ReconcileResult<Vec<RegistrationEntry>> {
    let rows = read_rows(text)?;
    let total = rows.len();
    let registrations: Vec<RegistrationEntry> = rows
        .iter()
        .filter_map(|record| registration_from_record(record, config.mode))
        .collect();

    debug!(
        kept = registrations.len(),
        dropped = total - registrations.len(),
        mode = ?config.mode,
        "Parsed registration rows"
    );
    Ok(registrations)
}

/// Build a bank entry from one row; missing columns become empty and an
/// unreadable amount becomes zero
pub fn bank_entry_from_record(record: &StringRecord) -> BankEntry {
    let amount = parse_amount(column(record, 4)).unwrap_or_else(|| BigDecimal::from(0));

    BankEntry {
        id: format!("bank-{}", Uuid::new_v4()),
        date: column(record, 0).to_string(),
        time: column(record, 1).to_string(),
        summary: column(record, 2).to_string(),
        amount,
        note: column(record, 5).to_string(),
        bank_info: column(record, 6).to_string(),
        last_five_digits: normalize_tail_digits(column(record, 7)),
        message: column(record, 8).to_string(),
        status: BankStatus::Available,
        matched_id: None,
        message_matched: false,
        match_source: MatchSource::Automatic,
    }
}

/// Parse a pasted bank statement in one go
pub fn parse_bank_entries(text: &str) -> ReconcileResult<Vec<BankEntry>> {
    let rows = read_rows(text)?;
    let entries: Vec<BankEntry> = rows.iter().map(bank_entry_from_record).collect();
    debug!(rows = entries.len(), "Parsed bank rows");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const ROSTER: &str = "\
Player\tAmount\tNote\tTail
Alice\tNT$1,200\tpaid by mom\t0012345678
Bob\t800\taccount 99999\t
\t500\tno name\t11111
Carol\tfree\t\t22222
Dave\t300\t\t
";

    #[test]
    fn test_strict_registration_import() {
        let regs = parse_registrations(ROSTER, &ImportConfig::default()).unwrap();
        assert_eq!(regs.len(), 2);

        assert_eq!(regs[0].player_name, "Alice");
        assert_eq!(regs[0].total_amount, BigDecimal::from(1200));
        assert_eq!(regs[0].last_five_digits, "45678");
        assert_eq!(regs[0].full_note, "paid by mom");
        assert_eq!(regs[0].status, RegistrationStatus::Pending);
        assert!(regs[0].id.starts_with("reg-"));

        // tail falls back to the note column
        assert_eq!(regs[1].player_name, "Bob");
        assert_eq!(regs[1].last_five_digits, "99999");
        assert_ne!(regs[0].id, regs[1].id);
    }

    #[test]
    fn test_loose_registration_import_keeps_defaults() {
        let config = ImportConfig::new().with_mode(ImportMode::Loose);
        let regs = parse_registrations(ROSTER, &config).unwrap();
        assert_eq!(regs.len(), 5);

        assert_eq!(regs[2].player_name, "");
        assert_eq!(regs[3].total_amount, BigDecimal::from(0));
        assert_eq!(regs[4].last_five_digits, "");
    }

    #[test]
    fn test_header_only_and_blank_lines() {
        assert!(parse_registrations("Player\tAmount", &ImportConfig::default())
            .unwrap()
            .is_empty());

        let text = "Player\tAmount\tNote\tTail\n\nAlice\t100\t\t12345\n   \n";
        assert_eq!(
            parse_registrations(text, &ImportConfig::default())
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_bank_import_columns_and_defaults() {
        let text = "\
Date\tTime\tSummary\tDebit\tCredit\tNote\tBank\tTail\tMessage
2024/03/01\t09:15\tTransfer\t\t1,500.50\tATM\t812 Taishin\t00012345\t王小明報名費
2024/03/02
";
        let banks = parse_bank_entries(text).unwrap();
        assert_eq!(banks.len(), 2);

        let first = &banks[0];
        assert_eq!(first.date, "2024/03/01");
        assert_eq!(first.time, "09:15");
        assert_eq!(first.summary, "Transfer");
        assert_eq!(first.amount, BigDecimal::from_str("1500.5").unwrap());
        assert_eq!(first.note, "ATM");
        assert_eq!(first.bank_info, "812 Taishin");
        assert_eq!(first.last_five_digits, "12345");
        assert_eq!(first.message, "王小明報名費");
        assert!(first.is_available());
        assert!(first.id.starts_with("bank-"));

        let second = &banks[1];
        assert_eq!(second.date, "2024/03/02");
        assert_eq!(second.amount, BigDecimal::from(0));
        assert_eq!(second.message, "");
    }
}

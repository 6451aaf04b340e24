//! Operator decisions that sit outside the automatic engine
//!
//! Everything here works on a caller-owned [`EntrySet`]. Entries touched by
//! an override get a manual [`MatchSource`] and are held out of every later
//! engine run by [`reconcile_preserving_manual`].

use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::reconciliation::{engine, notes};
use crate::traits::Clock;
use crate::types::*;
use crate::utils::override_reason;

/// Create a synthetic bank entry paying for a registration in full.
///
/// Returns the new bank entry, or `None` without touching anything when the
/// reason is blank, the registration does not exist, or it is already
/// matched or held by another manual decision.
pub fn inject_payment(
    set: &mut EntrySet,
    registration_id: &str,
    reason: &str,
    clock: &dyn Clock,
) -> Option<BankEntry> {
    let reason = override_reason(reason)?;
    let registration = set
        .registrations
        .iter_mut()
        .find(|r| r.id == registration_id)?;
    if registration.status == RegistrationStatus::Matched || registration.match_source.is_manual()
    {
        debug!(%registration_id, "Registration not eligible for a manual payment");
        return None;
    }

    let now = clock.now();
    let bank = BankEntry {
        id: format!("bank-manual-{}", Uuid::new_v4()),
        date: now.format("%Y/%m/%d").to_string(),
        time: now.format("%H:%M").to_string(),
        summary: MANUAL_INJECTION_MARKER.to_string(),
        amount: registration.total_amount.clone(),
        note: reason.to_string(),
        bank_info: String::new(),
        last_five_digits: registration.last_five_digits.clone(),
        message: notes::manual_injection_message(&registration.player_name),
        status: BankStatus::Matched,
        matched_id: Some(registration.id.clone()),
        message_matched: false,
        match_source: MatchSource::ManualInjection,
    };

    registration.status = RegistrationStatus::Matched;
    registration.matched_id = Some(bank.id.clone());
    registration.reconciliation_note = Some(notes::manual_injection(reason));
    registration.message_matched = false;
    registration.matched_bank_digits = None;
    registration.match_source = MatchSource::ManualInjection;

    info!(
        registration_id = %registration.id,
        bank_id = %bank.id,
        amount = %bank.amount,
        "Injected manual payment"
    );
    set.bank_entries.push(bank.clone());
    Some(bank)
}

/// Undo [`inject_payment`]: drop the synthetic bank entry and reopen the
/// registration. Returns `false` when the registration was not injected.
pub fn undo_injection(set: &mut EntrySet, registration_id: &str) -> bool {
    let Some(registration) = set
        .registrations
        .iter_mut()
        .find(|r| r.id == registration_id)
    else {
        return false;
    };
    if registration.match_source != MatchSource::ManualInjection {
        return false;
    }
    let Some(bank_id) = registration.matched_id.take() else {
        return false;
    };

    registration.status = RegistrationStatus::Pending;
    registration.reconciliation_note = None;
    registration.message_matched = false;
    registration.matched_bank_digits = None;
    registration.match_source = MatchSource::Automatic;

    set.bank_entries.retain(|b| b.id != bank_id);
    info!(%registration_id, %bank_id, "Undid manual payment");
    true
}

/// Pair an available bank entry with a registration that is not yet matched.
///
/// Returns `false` when either side is missing or not eligible.
pub fn bind(set: &mut EntrySet, bank_id: &str, registration_id: &str) -> bool {
    let Some(bank) = set.bank_entries.iter_mut().find(|b| b.id == bank_id) else {
        return false;
    };
    let Some(registration) = set
        .registrations
        .iter_mut()
        .find(|r| r.id == registration_id)
    else {
        return false;
    };
    if !bank.is_available() || registration.status == RegistrationStatus::Matched {
        return false;
    }

    let note = notes::manual_binding(registration, bank);

    registration.status = RegistrationStatus::Matched;
    registration.matched_id = Some(bank.id.clone());
    registration.reconciliation_note = Some(note);
    registration.message_matched = false;
    registration.matched_bank_digits = None;
    registration.match_source = MatchSource::ManualBinding;

    bank.status = BankStatus::Matched;
    bank.matched_id = Some(registration.id.clone());
    bank.message_matched = false;
    bank.match_source = MatchSource::ManualBinding;

    info!(%registration_id, %bank_id, "Bound bank entry to registration");
    true
}

/// Run the engine on the automatic entries only and merge the result back.
///
/// Manual entries pass through untouched and every entry keeps its position.
/// With no automatic bank entries left the engine still runs, so leftover
/// partial state is cleared. Returns `None` when there are no automatic
/// registrations or when no registration's status or note would change.
pub fn reconcile_preserving_manual(set: &EntrySet) -> Option<EntrySet> {
    let automatic_regs: Vec<RegistrationEntry> = set
        .registrations
        .iter()
        .filter(|r| !r.match_source.is_manual())
        .cloned()
        .collect();
    let automatic_banks: Vec<BankEntry> = set
        .bank_entries
        .iter()
        .filter(|b| !b.match_source.is_manual())
        .cloned()
        .collect();

    if automatic_regs.is_empty() {
        debug!("Nothing to reconcile outside manual decisions");
        return None;
    }

    let result = engine::reconcile(&automatic_regs, &automatic_banks);

    let mut updated_regs: HashMap<String, RegistrationEntry> = result
        .registrations
        .into_iter()
        .map(|r| (r.id.clone(), r))
        .collect();
    let mut updated_banks: HashMap<String, BankEntry> = result
        .bank_entries
        .into_iter()
        .map(|b| (b.id.clone(), b))
        .collect();

    let registrations: Vec<RegistrationEntry> = set
        .registrations
        .iter()
        .map(|r| {
            if r.match_source.is_manual() {
                return r.clone();
            }
            updated_regs.remove(&r.id).unwrap_or_else(|| r.clone())
        })
        .collect();
    let bank_entries: Vec<BankEntry> = set
        .bank_entries
        .iter()
        .map(|b| {
            if b.match_source.is_manual() {
                return b.clone();
            }
            updated_banks.remove(&b.id).unwrap_or_else(|| b.clone())
        })
        .collect();

    let changed = registrations
        .iter()
        .zip(&set.registrations)
        .filter(|(new, old)| {
            new.status != old.status || new.reconciliation_note != old.reconciliation_note
        })
        .count();
    if changed == 0 {
        debug!("Reconciliation produced no changes");
        return None;
    }

    debug!(changed, "Reconciliation changed registrations");
    Some(EntrySet::new(registrations, bank_entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::FixedClock;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn clock() -> FixedClock {
        FixedClock(
            NaiveDate::from_ymd_opt(2024, 3, 9)
                .unwrap()
                .and_hms_opt(14, 5, 0)
                .unwrap(),
        )
    }

    fn reg(id: &str, name: &str, amount: i64, tail: &str) -> RegistrationEntry {
        RegistrationEntry::new(
            id.to_string(),
            name.to_string(),
            BigDecimal::from(amount),
            tail.to_string(),
            String::new(),
        )
    }

    fn bank(id: &str, amount: i64, tail: &str) -> BankEntry {
        BankEntry::new(id.to_string(), BigDecimal::from(amount), tail.to_string())
    }

    fn sample_set() -> EntrySet {
        EntrySet::new(
            vec![
                reg("r1", "Alice", 1000, "12345"),
                reg("r2", "Bob", 800, "22222"),
            ],
            vec![bank("b1", 1000, "12345")],
        )
    }

    #[test]
    fn test_inject_payment_creates_traceable_entry() {
        let mut set = sample_set();
        let created = inject_payment(&mut set, "r2", "  paid cash at desk ", &clock()).unwrap();

        assert!(created.id.starts_with("bank-manual-"));
        assert_eq!(created.date, "2024/03/09");
        assert_eq!(created.time, "14:05");
        assert_eq!(created.summary, MANUAL_INJECTION_MARKER);
        assert_eq!(created.amount, BigDecimal::from(800));
        assert_eq!(created.note, "paid cash at desk");
        assert_eq!(created.last_five_digits, "22222");
        assert_eq!(created.message, "Manual entry - Bob");
        assert_eq!(created.status, BankStatus::Matched);
        assert_eq!(created.matched_id.as_deref(), Some("r2"));

        let r2 = set.registration("r2").unwrap();
        assert_eq!(r2.status, RegistrationStatus::Matched);
        assert_eq!(r2.matched_id.as_deref(), Some(created.id.as_str()));
        assert_eq!(
            r2.reconciliation_note.as_deref(),
            Some("[manual entry] paid cash at desk")
        );
        assert_eq!(r2.match_source, MatchSource::ManualInjection);
        assert_eq!(set.bank_entries.len(), 2);
    }

    #[test]
    fn test_inject_payment_noop_on_bad_input() {
        let mut set = sample_set();
        assert!(inject_payment(&mut set, "r2", "   ", &clock()).is_none());
        assert!(inject_payment(&mut set, "missing", "cash", &clock()).is_none());
        assert_eq!(set, sample_set());
    }

    #[test]
    fn test_undo_injection_round_trip() {
        let mut set = sample_set();
        let original = set.clone();
        inject_payment(&mut set, "r2", "cash", &clock()).unwrap();

        assert!(undo_injection(&mut set, "r2"));
        assert_eq!(set, original);
    }

    #[test]
    fn test_undo_injection_ignores_non_injected() {
        let mut set = sample_set();
        assert!(bind(&mut set, "b1", "r1"));
        let before = set.clone();

        assert!(!undo_injection(&mut set, "r1"));
        assert!(!undo_injection(&mut set, "r2"));
        assert!(!undo_injection(&mut set, "missing"));
        assert_eq!(set, before);
    }

    #[test]
    fn test_bind_builds_note_and_links() {
        let mut set = EntrySet::new(
            vec![reg("r1", "Alice", 1000, "12345")],
            vec![bank("b1", 900, "99999").with_timestamp("2024/03/01", "09:15")],
        );
        assert!(bind(&mut set, "b1", "r1"));

        let r1 = set.registration("r1").unwrap();
        assert_eq!(r1.status, RegistrationStatus::Matched);
        assert_eq!(r1.matched_id.as_deref(), Some("b1"));
        assert_eq!(
            r1.reconciliation_note.as_deref(),
            Some("[manual match] bank $900 (2024/03/01 09:15) shortfall $100")
        );

        let b1 = set.bank_entry("b1").unwrap();
        assert_eq!(b1.status, BankStatus::Matched);
        assert_eq!(b1.matched_id.as_deref(), Some("r1"));
        assert_eq!(b1.match_source, MatchSource::ManualBinding);
    }

    #[test]
    fn test_bind_rejects_ineligible_entries() {
        let mut set = sample_set();
        set.registrations[0].status = RegistrationStatus::Matched;
        assert!(!bind(&mut set, "b1", "r1"));

        set.bank_entries[0].status = BankStatus::Matched;
        assert!(!bind(&mut set, "b1", "r2"));
        assert!(!bind(&mut set, "missing", "r2"));
    }

    #[test]
    fn test_reconcile_preserving_manual_keeps_manual_pair() {
        let mut set = EntrySet::new(
            vec![
                reg("r1", "Alice", 1000, "12345"),
                reg("r2", "Bob", 800, "12345"),
                reg("r3", "Carol", 500, "33333"),
            ],
            vec![bank("b1", 1000, "12345"), bank("b2", 500, "33333")],
        );
        let injected = inject_payment(&mut set, "r2", "cash", &clock()).unwrap();

        let out = reconcile_preserving_manual(&set).unwrap();

        assert_eq!(out.registration("r2"), set.registration("r2"));
        assert_eq!(out.bank_entry(&injected.id), set.bank_entry(&injected.id));
        assert_eq!(
            out.registration("r1").unwrap().matched_id.as_deref(),
            Some("b1")
        );
        assert_eq!(
            out.registration("r3").unwrap().status,
            RegistrationStatus::Matched
        );

        let ids: Vec<&str> = out.registrations.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2", "r3"]);
    }

    #[test]
    fn test_reconcile_preserving_manual_reports_no_change() {
        let set = sample_set();
        let first = reconcile_preserving_manual(&set).unwrap();
        assert!(reconcile_preserving_manual(&first).is_none());
    }

    #[test]
    fn test_reconcile_preserving_manual_needs_automatic_registrations() {
        let mut set = sample_set();
        inject_payment(&mut set, "r1", "cash", &clock()).unwrap();
        inject_payment(&mut set, "r2", "cash", &clock()).unwrap();
        assert!(reconcile_preserving_manual(&set).is_none());
    }

    #[test]
    fn test_bind_of_last_bank_entry_clears_stale_partials() {
        let mut set = EntrySet::new(
            vec![
                reg("r1", "Alice", 500, "11111"),
                reg("r2", "Bob", 500, "11111"),
                reg("r3", "Carol", 700, "77777"),
            ],
            vec![bank("b1", 700, "11111")],
        );
        let set_after_run = reconcile_preserving_manual(&set).unwrap();
        assert_eq!(
            set_after_run.registration("r1").unwrap().status,
            RegistrationStatus::Partial
        );
        set = set_after_run;

        assert!(bind(&mut set, "b1", "r3"));
        let out = reconcile_preserving_manual(&set).unwrap();

        for id in ["r1", "r2"] {
            let r = out.registration(id).unwrap();
            assert_eq!(r.status, RegistrationStatus::Pending);
            assert!(r.reconciliation_note.is_none());
        }
        assert_eq!(out.registration("r3"), set.registration("r3"));
        assert_eq!(out.bank_entry("b1"), set.bank_entry("b1"));
    }

    #[test]
    fn test_inject_payment_rejects_matched_registration() {
        let mut set = sample_set();
        let original = set.clone();
        inject_payment(&mut set, "r2", "cash", &clock()).unwrap();
        let after_first = set.clone();

        assert!(inject_payment(&mut set, "r2", "cash again", &clock()).is_none());
        assert_eq!(set, after_first);

        assert!(undo_injection(&mut set, "r2"));
        assert_eq!(set, original);
    }

    #[test]
    fn test_inject_payment_rejects_bound_registration() {
        let mut set = sample_set();
        assert!(bind(&mut set, "b1", "r1"));
        let bound = set.clone();

        assert!(inject_payment(&mut set, "r1", "cash", &clock()).is_none());
        assert_eq!(set, bound);
        assert!(!undo_injection(&mut set, "r1"));

        // an automatic match is rejected too
        let mut set = reconcile_preserving_manual(&sample_set()).unwrap();
        let matched = set.clone();
        assert!(inject_payment(&mut set, "r1", "cash", &clock()).is_none());
        assert_eq!(set, matched);
    }

    #[test]
    fn test_inject_payment_accepts_partial_registration() {
        let mut set = EntrySet::new(
            vec![reg("r1", "Alice", 1000, "12345")],
            vec![bank("b1", 900, "12345")],
        );
        let mut set_after_run = reconcile_preserving_manual(&set).unwrap();
        assert_eq!(
            set_after_run.registration("r1").unwrap().status,
            RegistrationStatus::Partial
        );
        set = set_after_run.clone();

        assert!(inject_payment(&mut set, "r1", "rest paid in cash", &clock()).is_some());
        assert!(undo_injection(&mut set, "r1"));
        set_after_run.registrations[0].status = RegistrationStatus::Pending;
        set_after_run.registrations[0].reconciliation_note = None;
        assert_eq!(set, set_after_run);
    }
}

//! Four-pass matcher between expected registrations and bank entries
//!
//! Passes run from highest to lowest confidence:
//!
//! 1. exact tail digits and amount, one to one
//! 2. summed amounts of every open registration sharing a tail against the
//!    summed available bank entries with that tail
//! 3. tail digits only, amount left for a human
//! 4. player name found in the bank remittance message
//!
//! A registration resolved by a pass is never looked at again in the same
//! run. Each pass takes the previous snapshot by value and hands back the
//! next one.

use bigdecimal::BigDecimal;
use std::collections::BTreeMap;
use tracing::debug;

use crate::reconciliation::notes;
use crate::types::*;
use crate::utils::has_tail_digits;

/// Progress of one registration through a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// No pass has touched it yet
    Unprocessed,
    /// Paid, by pass 1, 2 or 4
    Matched,
    /// Tail group sums disagree
    PartialGroup,
    /// A bank entry shares the tail but the amount was not reconciled
    PartialTailOnly,
}

/// Working state handed from pass to pass
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub set: EntrySet,
    /// Parallel to `set.registrations`
    pub stages: Vec<Stage>,
}

impl Snapshot {
    /// Copy the inputs and wipe any earlier automatic decision
    pub fn prepare(registrations: &[RegistrationEntry], bank_entries: &[BankEntry]) -> Self {
        let mut registrations = registrations.to_vec();
        let mut bank_entries = bank_entries.to_vec();
        registrations
            .iter_mut()
            .for_each(RegistrationEntry::reset_automatic_state);
        bank_entries
            .iter_mut()
            .for_each(BankEntry::reset_automatic_state);

        let stages = vec![Stage::Unprocessed; registrations.len()];
        Self {
            set: EntrySet::new(registrations, bank_entries),
            stages,
        }
    }

    fn count(&self, stage: Stage) -> usize {
        self.stages.iter().filter(|s| **s == stage).count()
    }

    fn first_available_with_tail(&self, tail: &str) -> Option<usize> {
        self.set
            .bank_entries
            .iter()
            .position(|b| b.is_available() && b.last_five_digits == tail)
    }
}

/// Run every pass over copies of the inputs.
///
/// The caller is expected to have removed manually decided entries; anything
/// passed in is treated as automatic and recomputed from scratch.
pub fn reconcile(registrations: &[RegistrationEntry], bank_entries: &[BankEntry]) -> EntrySet {
    let snapshot = Snapshot::prepare(registrations, bank_entries);
    let snapshot = exact_pass(snapshot);
    let snapshot = group_sum_pass(snapshot);
    let snapshot = tail_only_pass(snapshot);
    let snapshot = message_pass(snapshot);

    debug!(
        registrations = snapshot.set.registrations.len(),
        bank_entries = snapshot.set.bank_entries.len(),
        matched = snapshot.count(Stage::Matched),
        partial = snapshot.count(Stage::PartialGroup) + snapshot.count(Stage::PartialTailOnly),
        "Reconciliation run complete"
    );
    snapshot.set
}

/// Pass 1: first available bank entry with the same tail and exact amount
pub fn exact_pass(mut snapshot: Snapshot) -> Snapshot {
    let mut resolved = 0;

    for i in 0..snapshot.set.registrations.len() {
        if snapshot.stages[i] != Stage::Unprocessed {
            continue;
        }
        let reg = &snapshot.set.registrations[i];
        if !has_tail_digits(&reg.last_five_digits) {
            continue;
        }

        let Some(j) = snapshot.set.bank_entries.iter().position(|b| {
            b.is_available()
                && b.last_five_digits == reg.last_five_digits
                && b.amount == reg.total_amount
        }) else {
            continue;
        };

        let bank = &mut snapshot.set.bank_entries[j];
        bank.status = BankStatus::Matched;
        bank.matched_id = Some(snapshot.set.registrations[i].id.clone());
        let note = notes::exact_match(bank);
        let bank_id = bank.id.clone();

        let reg = &mut snapshot.set.registrations[i];
        reg.status = RegistrationStatus::Matched;
        reg.matched_id = Some(bank_id);
        reg.reconciliation_note = Some(note);
        snapshot.stages[i] = Stage::Matched;
        resolved += 1;
    }

    debug!(resolved, "Exact pass finished");
    snapshot
}

/// Pass 2: compare tail groups by summed amount
pub fn group_sum_pass(mut snapshot: Snapshot) -> Snapshot {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, reg) in snapshot.set.registrations.iter().enumerate() {
        if snapshot.stages[i] == Stage::Matched || !has_tail_digits(&reg.last_five_digits) {
            continue;
        }
        groups
            .entry(reg.last_five_digits.clone())
            .or_default()
            .push(i);
    }

    let mut settled = 0;
    let mut disputed = 0;

    for (tail, members) in groups {
        let banks: Vec<usize> = snapshot
            .set
            .bank_entries
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_available() && b.last_five_digits == tail)
            .map(|(j, _)| j)
            .collect();
        if banks.is_empty() {
            continue;
        }

        let group_total: BigDecimal = members
            .iter()
            .map(|&i| &snapshot.set.registrations[i].total_amount)
            .sum();
        let bank_total: BigDecimal = banks
            .iter()
            .map(|&j| &snapshot.set.bank_entries[j].amount)
            .sum();
        let note = notes::group_sum(&group_total, &bank_total);

        if group_total == bank_total {
            let first_reg_id = snapshot.set.registrations[members[0]].id.clone();
            let first_bank_id = snapshot.set.bank_entries[banks[0]].id.clone();

            for &j in &banks {
                let bank = &mut snapshot.set.bank_entries[j];
                bank.status = BankStatus::Matched;
                bank.matched_id = Some(first_reg_id.clone());
            }
            for &i in &members {
                let reg = &mut snapshot.set.registrations[i];
                reg.status = RegistrationStatus::Matched;
                reg.matched_id = Some(first_bank_id.clone());
                reg.reconciliation_note = Some(note.clone());
                snapshot.stages[i] = Stage::Matched;
            }
            settled += members.len();
        } else {
            for &i in &members {
                let reg = &mut snapshot.set.registrations[i];
                reg.status = RegistrationStatus::Partial;
                reg.reconciliation_note = Some(note.clone());
                snapshot.stages[i] = Stage::PartialGroup;
            }
            disputed += members.len();
        }
    }

    debug!(settled, disputed, "Group sum pass finished");
    snapshot
}

/// Pass 3: flag registrations whose tail appears on any available bank entry
pub fn tail_only_pass(mut snapshot: Snapshot) -> Snapshot {
    let mut flagged = 0;

    for i in 0..snapshot.set.registrations.len() {
        if snapshot.stages[i] != Stage::Unprocessed {
            continue;
        }
        let reg = &snapshot.set.registrations[i];
        if !has_tail_digits(&reg.last_five_digits) {
            continue;
        }
        let Some(j) = snapshot.first_available_with_tail(&reg.last_five_digits) else {
            continue;
        };

        let note = notes::tail_only(reg, &snapshot.set.bank_entries[j]);
        let reg = &mut snapshot.set.registrations[i];
        reg.status = RegistrationStatus::Partial;
        reg.reconciliation_note = Some(note);
        snapshot.stages[i] = Stage::PartialTailOnly;
        flagged += 1;
    }

    debug!(flagged, "Tail-only pass finished");
    snapshot
}

/// Pass 4: player name inside the remittance message.
///
/// Bank entries are walked in order and each claims the first open
/// registration whose name it contains.
pub fn message_pass(mut snapshot: Snapshot) -> Snapshot {
    let mut resolved = 0;

    for j in 0..snapshot.set.bank_entries.len() {
        let bank = &snapshot.set.bank_entries[j];
        if !bank.is_available() || bank.message.is_empty() {
            continue;
        }

        let found = snapshot
            .set
            .registrations
            .iter()
            .enumerate()
            .find(|(i, reg)| {
                snapshot.stages[*i] == Stage::Unprocessed
                    && reg.status.is_open()
                    && !reg.player_name.is_empty()
                    && bank.message.contains(reg.player_name.as_str())
            })
            .map(|(i, _)| i);
        let Some(i) = found else {
            continue;
        };

        let note = notes::message_match(&snapshot.set.registrations[i], bank);
        let bank_id = bank.id.clone();
        let bank_tail = bank.last_five_digits.clone();

        let reg = &mut snapshot.set.registrations[i];
        reg.status = RegistrationStatus::Matched;
        reg.matched_id = Some(bank_id);
        reg.message_matched = true;
        reg.matched_bank_digits = Some(bank_tail);
        reg.reconciliation_note = Some(note);
        let reg_id = reg.id.clone();
        snapshot.stages[i] = Stage::Matched;

        let bank = &mut snapshot.set.bank_entries[j];
        bank.status = BankStatus::Matched;
        bank.matched_id = Some(reg_id);
        bank.message_matched = true;
        resolved += 1;
    }

    debug!(resolved, "Message pass finished");
    snapshot
}

#![allow(dead_code)]

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::aggregator;
use crate::ledger::Ledger;
use crate::types::{Campaign, ContributorInfo};

/// INV-1: Campaign goal must always be positive.
pub fn assert_goal_positive(campaign: &Campaign) {
    assert!(
        campaign.goal > Decimal::ZERO,
        "INV-1 violated: campaign {} has non-positive goal ({})",
        campaign.slug,
        campaign.goal
    );
}

/// INV-2: A campaign never ends before it starts.
pub fn assert_dates_ordered(campaign: &Campaign) {
    assert!(
        campaign.end_date >= campaign.start_date,
        "INV-2 violated: campaign {} ends {} before it starts {}",
        campaign.slug,
        campaign.end_date,
        campaign.start_date
    );
}

/// INV-3: Every ledger entry has a positive amount.
pub fn assert_amounts_positive(ledger: &Ledger) {
    for entry in ledger.entries() {
        assert!(
            entry.amount > Decimal::ZERO,
            "INV-3 violated: entry {} has non-positive amount ({})",
            entry.id,
            entry.amount
        );
    }
}

/// INV-4: Appending grows the ledger by exactly one entry, placed last, and
/// leaves the previous entries untouched.
pub fn assert_append_invariant(before: &Ledger, after: &Ledger) {
    assert_eq!(
        after.len(),
        before.len() + 1,
        "INV-4 violated: ledger grew from {} to {}",
        before.len(),
        after.len()
    );
    assert_eq!(
        &after.entries()[..before.len()],
        before.entries(),
        "INV-4 violated: existing entries changed"
    );
}

/// INV-5: Raised grows by exactly the appended amount.
pub fn assert_raised_invariant(before: &Ledger, after: &Ledger, amount: Decimal) {
    assert_eq!(
        after.raised(),
        before.raised() + amount,
        "INV-5 violated: {} + {} != {}",
        before.raised(),
        amount,
        after.raised()
    );
}

/// INV-6: No allocated unit index reaches `total_units`.
pub fn assert_allocation_bounded(allocation: &BTreeMap<u32, ContributorInfo>, total_units: u32) {
    if let Some((&last, _)) = allocation.iter().next_back() {
        assert!(
            last < total_units,
            "INV-6 violated: unit {} allocated with only {} units",
            last,
            total_units
        );
    }
}

/// INV-7: Allocated indices are contiguous from 0.
pub fn assert_allocation_contiguous(allocation: &BTreeMap<u32, ContributorInfo>) {
    for (expected, &index) in allocation.keys().enumerate() {
        assert_eq!(
            index, expected as u32,
            "INV-7 violated: expected unit {}, got {}",
            expected, index
        );
    }
}

/// INV-8: `total_raised` equals the plain sum of amounts.
pub fn assert_total_matches_sum(ledger: &Ledger) {
    let sum = ledger
        .entries()
        .iter()
        .fold(Decimal::ZERO, |acc, e| acc + e.amount);
    assert_eq!(
        aggregator::total_raised(ledger.entries()),
        sum,
        "INV-8 violated: total_raised disagrees with sum"
    );
}

/// Run all stateless campaign invariants.
pub fn assert_all_campaign_invariants(campaign: &Campaign) {
    assert_goal_positive(campaign);
    assert_dates_ordered(campaign);
}

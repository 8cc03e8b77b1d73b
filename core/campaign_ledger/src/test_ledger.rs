use std::str::FromStr;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;

use crate::aggregator::{self, allocate_units, percent_funded};
use crate::invariants::{
    assert_allocation_bounded, assert_allocation_contiguous, assert_amounts_positive,
    assert_append_invariant, assert_raised_invariant, assert_total_matches_sum,
};
use crate::types::{Campaign, DonationEntry, SeedDonation, SeedId, Visualization, MAX_DONATION};
use crate::{Catalog, Ledger, LedgerError, LedgerStore, ANONYMOUS};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn wall_campaign() -> Campaign {
    Catalog::builtin()
        .unwrap()
        .find("muro-ciencia-2024")
        .unwrap()
        .clone()
}

fn donation(campaign: &Campaign, amount: &str, name: Option<&str>) -> DonationEntry {
    DonationEntry::simulated(
        campaign.id.clone(),
        dec(amount),
        name,
        None,
        Utc.with_ymd_and_hms(2025, 1, 10, 18, 30, 0).unwrap(),
    )
}

#[test]
fn test_seeding_normalizes_optional_fields() {
    let mut campaign = wall_campaign();
    campaign.donations = vec![
        SeedDonation {
            id: Some(SeedId::Number(7)),
            name: Some("Ana".to_string()),
            amount: dec("500"),
            date: None,
            message: Some("hola".to_string()),
        },
        SeedDonation {
            id: None,
            name: None,
            amount: dec("250"),
            date: None,
            message: None,
        },
    ];
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();

    let ledger = Ledger::initialize_at(&campaign, now);

    let entries = ledger.entries();
    assert_eq!(entries[0].id, "7");
    assert_eq!(entries[0].name, "Ana");
    assert_eq!(entries[0].message, "hola");
    assert_eq!(entries[1].id, "existing-1");
    assert_eq!(entries[1].name, ANONYMOUS);
    assert_eq!(entries[1].message, "");
    assert_eq!(entries[1].timestamp, now);
    assert!(entries.iter().all(|e| e.campaign_id == campaign.id));
}

#[test]
fn test_seed_dates_are_midnight_utc() {
    let campaign = wall_campaign();
    let ledger = Ledger::initialize(&campaign);
    assert_eq!(
        ledger.entries()[0].timestamp,
        Utc.with_ymd_and_hms(2024, 11, 20, 0, 0, 0).unwrap()
    );
    assert_eq!(ledger.seeded().len(), campaign.donations.len());
    assert!(ledger.appended().is_empty());
}

#[test]
fn test_append_scenario_updates_raised_and_percent() {
    let campaign = wall_campaign();
    let ledger = Ledger::initialize(&campaign);
    assert_eq!(ledger.raised(), dec("23450"));

    let entry = donation(&campaign, "5000", Some("Test"));
    let id = entry.id.clone();
    let next = ledger.append(entry).unwrap();

    assert_append_invariant(&ledger, &next);
    assert_raised_invariant(&ledger, &next, dec("5000"));
    assert_eq!(next.raised(), dec("28450"));
    assert_eq!(percent_funded(next.raised(), campaign.goal), 57);
    assert_eq!(next.last().unwrap().id, id);
    assert_eq!(next.last().unwrap().name, "Test");
    assert_eq!(next.appended().len(), 1);
}

#[test]
fn test_append_rejects_non_positive_amounts() {
    let campaign = wall_campaign();
    let ledger = Ledger::initialize(&campaign);

    for amount in ["0", "-1", "-0.01"] {
        let err = ledger.append(donation(&campaign, amount, None)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount));
    }
    assert_eq!(ledger.len(), campaign.donations.len());
    assert_eq!(ledger.raised(), campaign.raised);
}

#[test]
fn test_append_rejects_amounts_above_ceiling() {
    let campaign = wall_campaign();
    let mut ledger = Ledger::initialize(&campaign);

    let mut entry = donation(&campaign, "1", None);
    entry.amount = Decimal::MAX;
    assert!(matches!(ledger.append(entry.clone()), Err(LedgerError::InvalidAmount)));
    assert!(matches!(ledger.commit(entry), Err(LedgerError::InvalidAmount)));

    let mut ceiling = donation(&campaign, "1", None);
    ceiling.amount = MAX_DONATION;
    ledger.commit(ceiling).unwrap();
    assert_eq!(ledger.raised(), MAX_DONATION + dec("23450"));

    let mut over = donation(&campaign, "1", None);
    over.amount = MAX_DONATION + Decimal::ONE;
    assert!(ledger.commit(over).is_err());
    assert_eq!(ledger.appended().len(), 1);
}

#[test]
fn test_continuous_fund_has_no_deadline_or_fixed_goal() {
    let campaign = Catalog::builtin()
        .unwrap()
        .find("donacion-general")
        .unwrap()
        .clone();
    let ledger = Ledger::initialize(&campaign);

    let summary = aggregator::summarize(&campaign, &ledger, Utc::now());

    assert_eq!(summary.days_remaining, None);
    assert_eq!(summary.goal_display, None);
    assert_eq!(summary.raised_display, "$45,000.00");
    assert_eq!(summary.percent_funded, 5);
}

#[test]
fn test_append_rejects_foreign_campaign() {
    let campaign = wall_campaign();
    let ledger = Ledger::initialize(&campaign);
    let mut entry = donation(&campaign, "100", None);
    entry.campaign_id = "someone-else".to_string();

    let err = ledger.append(entry).unwrap_err();
    assert!(matches!(err, LedgerError::CampaignMismatch { .. }));
}

#[test]
fn test_commit_appends_in_place() {
    let campaign = wall_campaign();
    let mut ledger = Ledger::initialize(&campaign);
    let before = ledger.clone();

    let stored = ledger
        .commit(donation(&campaign, "750", Some("Luz")))
        .unwrap()
        .clone();

    assert_append_invariant(&before, &ledger);
    assert_eq!(ledger.last(), Some(&stored));
    assert!(ledger.commit(donation(&campaign, "0", None)).is_err());
    assert_eq!(ledger.len(), before.len() + 1);
}

#[test]
fn test_ties_keep_arrival_order() {
    let campaign = wall_campaign();
    let mut ledger = Ledger::initialize(&campaign);
    for name in ["Zoe", "Ana", "Mia"] {
        ledger = ledger.append(donation(&campaign, "500", Some(name))).unwrap();
    }
    let names: Vec<&str> = ledger.appended().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["Zoe", "Ana", "Mia"]);

    let recent: Vec<&str> = ledger.recent(2).map(|e| e.name.as_str()).collect();
    assert_eq!(recent, ["Mia", "Ana"]);
}

#[test]
fn test_brick_wall_allocation_follows_ledger() {
    let campaign = wall_campaign();
    let Visualization::BrickWall {
        total_units,
        cost_per_unit,
    } = campaign.visualization.clone()
    else {
        panic!("muro-ciencia-2024 should be a brick wall");
    };

    let ledger = Ledger::initialize(&campaign);
    // 500, 1000, 2500, 500, 5000, 10000 at 500 per brick.
    let seeded = allocate_units(ledger.entries(), total_units, cost_per_unit);
    assert_eq!(seeded.len(), 39);
    assert_allocation_contiguous(&seeded);

    let next = ledger
        .append(donation(&campaign, "1200", Some("Test")))
        .unwrap();
    let allocation = allocate_units(next.entries(), total_units, cost_per_unit);
    assert_eq!(allocation.len(), 41);
    assert_eq!(allocation[&39].name, "Test");
    assert_eq!(allocation[&40].name, "Test");
    assert_allocation_bounded(&allocation, total_units);
    assert_amounts_positive(&next);
    assert_total_matches_sum(&next);
}

#[test]
fn test_overfunded_wall_stops_at_last_unit() {
    let campaign = wall_campaign();
    let mut ledger = Ledger::initialize(&campaign);
    ledger = ledger
        .append(donation(&campaign, "100000", None))
        .unwrap();

    let summary = aggregator::summarize(&campaign, &ledger, Utc::now());
    let units = summary.units.unwrap();
    assert_eq!(units.allocation.len(), 100);
    assert_eq!(units.units_placed, 100);
    assert_eq!(summary.percent_funded, 100);
    assert_allocation_bounded(&units.allocation, 100);
}

#[test]
fn test_summary_for_active_wall() {
    let campaign = wall_campaign();
    let ledger = Ledger::initialize(&campaign);
    let now = Utc.with_ymd_and_hms(2025, 1, 21, 0, 0, 0).unwrap();

    let summary = aggregator::summarize(&campaign, &ledger, now);

    assert_eq!(summary.raised_display, "$23,450.00");
    assert_eq!(summary.goal_display.as_deref(), Some("$50,000.00"));
    assert_eq!(summary.percent_funded, 47);
    assert_eq!(summary.days_remaining, Some(10));
    assert_eq!(summary.donor_count, 6);
    assert_eq!(summary.units.unwrap().units_placed, 46);
}

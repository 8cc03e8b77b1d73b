//! # Aggregator
//!
//! Pure derivations of display figures from a [`Campaign`] and its
//! [`Ledger`]. Nothing here mutates state or reads the clock; `now` is always
//! passed in.
//!
//! Two policies are deliberate and covered by tests:
//!
//! - percentages are clamped at 100, including for sentinel goals used by
//!   continuous campaigns;
//! - a donation only places `floor(amount / cost_per_unit)` units, so partial
//!   units are not drawn even though the amount counts toward the total.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::warn;

use crate::currency;
use crate::ledger::Ledger;
use crate::types::{Campaign, ContributorInfo, DonationEntry, Visualization};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Sum of all entry amounts.
/// Saturates at [`Decimal::MAX`] instead of overflowing.
pub fn total_raised(entries: &[DonationEntry]) -> Decimal {
    entries
        .iter()
        .fold(Decimal::ZERO, |acc, e| acc.saturating_add(e.amount))
}

/// `round(raised / goal * 100)`, clamped to `0..=100`.
///
/// A non-positive goal yields 0.
pub fn percent_funded(raised: Decimal, goal: Decimal) -> u8 {
    if goal <= Decimal::ZERO || raised <= Decimal::ZERO {
        return 0;
    }
    let hundred = Decimal::ONE_HUNDRED;
    // Anything at or past the goal is 100; avoids overflow on huge ratios.
    if raised >= goal {
        return 100;
    }
    (raised / goal * hundred)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .min(hundred)
        .to_u8()
        .unwrap_or(100)
}

/// Whole days until `end_date` (read as midnight UTC), rounded up and never
/// negative.
pub fn days_remaining(end_date: NaiveDate, now: DateTime<Utc>) -> u32 {
    let end = end_date.and_time(NaiveTime::MIN).and_utc();
    let millis = (end - now).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    let days = (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// Money formatting; see [`currency::format`].
pub fn format_currency(amount: Decimal, currency_code: &str) -> crate::errors::Result<String> {
    currency::format(amount, currency_code)
}

/// Format, falling back to a raw number for unsupported currencies.
pub fn display_amount(amount: Decimal, currency_code: &str) -> String {
    match format_currency(amount, currency_code) {
        Ok(s) => s,
        Err(e) => {
            warn!("{e}; showing raw amount");
            currency::format_raw(amount, currency_code)
        }
    }
}

/// Map unit index to the contributor who placed it.
///
/// Entries are walked in ledger order and each one takes
/// `floor(amount / cost_per_unit)` consecutive indices from a running cursor.
/// No index at or past `total_units` is ever assigned.
pub fn allocate_units(
    entries: &[DonationEntry],
    total_units: u32,
    cost_per_unit: Decimal,
) -> BTreeMap<u32, ContributorInfo> {
    let mut allocation = BTreeMap::new();
    if cost_per_unit <= Decimal::ZERO {
        return allocation;
    }

    let mut cursor: u32 = 0;
    for entry in entries {
        let remaining = total_units - cursor;
        if remaining == 0 {
            // Past 100%: nothing more is drawn.
            continue;
        }
        let units = whole_units(entry.amount, cost_per_unit).min(remaining);
        if units == 0 {
            continue;
        }
        let info = ContributorInfo::from(entry);
        for index in cursor..cursor + units {
            allocation.insert(index, info.clone());
        }
        cursor += units;
    }
    allocation
}

/// Headline "units placed": `floor(raised / goal * total_units)`, clamped to
/// `total_units`.
pub fn units_placed(raised: Decimal, goal: Decimal, total_units: u32) -> u32 {
    if goal <= Decimal::ZERO || raised <= Decimal::ZERO {
        return 0;
    }
    if raised >= goal {
        return total_units;
    }
    (raised / goal * Decimal::from(total_units))
        .floor()
        .to_u32()
        .unwrap_or(total_units)
        .min(total_units)
}

fn whole_units(amount: Decimal, cost_per_unit: Decimal) -> u32 {
    if amount <= Decimal::ZERO {
        return 0;
    }
    amount
        .checked_div(cost_per_unit)
        .and_then(|units| units.floor().to_u32())
        .unwrap_or(u32::MAX)
}

/// Progress-bar styling bucket.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressTier {
    Starting,
    Halfway,
    Almost,
    Funded,
}

pub fn progress_tier(percent: u8) -> ProgressTier {
    match percent {
        100..=u8::MAX => ProgressTier::Funded,
        75..=99 => ProgressTier::Almost,
        50..=74 => ProgressTier::Halfway,
        _ => ProgressTier::Starting,
    }
}

/// Brick-wall figures, present only for discretized campaigns.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnitsSummary {
    pub total_units: u32,
    pub cost_per_unit: Decimal,
    pub units_placed: u32,
    pub allocation: BTreeMap<u32, ContributorInfo>,
}

/// Everything the detail page shows about funding progress.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CampaignSummary {
    pub raised: Decimal,
    pub goal: Decimal,
    pub percent_funded: u8,
    pub tier: ProgressTier,
    /// Only shown while a fixed-goal campaign is active.
    pub days_remaining: Option<u32>,
    pub raised_display: String,
    /// `None` when the campaign hides its target.
    pub goal_display: Option<String>,
    pub donor_count: usize,
    pub units: Option<UnitsSummary>,
}

pub fn summarize(campaign: &Campaign, ledger: &Ledger, now: DateTime<Utc>) -> CampaignSummary {
    let raised = ledger.raised();
    let percent = percent_funded(raised, campaign.goal);

    let units = match &campaign.visualization {
        Visualization::BrickWall {
            total_units,
            cost_per_unit,
        } => Some(UnitsSummary {
            total_units: *total_units,
            cost_per_unit: *cost_per_unit,
            units_placed: units_placed(raised, campaign.goal, *total_units),
            allocation: allocate_units(ledger.entries(), *total_units, *cost_per_unit),
        }),
        Visualization::SimpleBar { .. } | Visualization::ProgressBar => None,
    };

    CampaignSummary {
        raised,
        goal: campaign.goal,
        percent_funded: percent,
        tier: progress_tier(percent),
        days_remaining: campaign
            .has_deadline()
            .then(|| days_remaining(campaign.end_date, now)),
        raised_display: display_amount(raised, &campaign.currency),
        goal_display: campaign
            .shows_goal()
            .then(|| display_amount(campaign.goal, &campaign.currency)),
        donor_count: ledger.len(),
        units,
    }
}

//! # Ledger
//!
//! Append-only, ordered record of the donations made to one campaign.
//!
//! | Segment    | Source                                   | Mutable |
//! |------------|------------------------------------------|---------|
//! | seeded     | the campaign's static `donations` list   | no      |
//! | appended   | donations made during this session       | append  |
//!
//! Ordering is arrival order. Entries are never edited or removed.
//!
//! The campaign's reported `raised` total is kept as the ledger's opening
//! balance. The static donation list only itemizes recent donations, so the
//! headline figure is `opening_balance + sum(appended)` rather than a sum over
//! every entry.

use chrono::{DateTime, NaiveTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use tracing::debug;

use crate::aggregator;
use crate::errors::{LedgerError, Result};
use crate::types::{donation_in_range, Campaign, DonationEntry, DonationStatus};

/// Display name used when a donor leaves the name blank.
pub const ANONYMOUS: &str = "Anonymous";

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Storage seam used by the submission flow. [`Ledger`] is the in-memory
/// implementation; a persistent store would implement the same trait.
pub trait LedgerStore {
    fn ledger(&self) -> &Ledger;

    /// Validate and append `entry`, returning the stored entry.
    fn commit(&mut self, entry: DonationEntry) -> Result<&DonationEntry>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ledger {
    campaign_id: String,
    opening_balance: Decimal,
    seeded: usize,
    entries: Vec<DonationEntry>,
}

impl Ledger {
    /// Seed a ledger from the campaign's static donation list.
    pub fn initialize(campaign: &Campaign) -> Self {
        Self::initialize_at(campaign, Utc::now())
    }

    /// Like [`Ledger::initialize`], with `now` used for seed entries that
    /// carry no date.
    pub fn initialize_at(campaign: &Campaign, now: DateTime<Utc>) -> Self {
        let entries: Vec<DonationEntry> = campaign
            .donations
            .iter()
            .enumerate()
            .map(|(idx, seed)| DonationEntry {
                id: seed
                    .id
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| format!("existing-{idx}")),
                campaign_id: campaign.id.clone(),
                amount: seed.amount,
                name: display_name(seed.name.as_deref()),
                message: seed.message.clone().unwrap_or_default(),
                timestamp: seed
                    .date
                    .map(|d| d.and_time(NaiveTime::MIN).and_utc())
                    .unwrap_or(now),
                status: DonationStatus::Completed,
            })
            .collect();

        debug!(
            campaign = %campaign.slug,
            seeded = entries.len(),
            "ledger initialized"
        );

        Self {
            campaign_id: campaign.id.clone(),
            opening_balance: campaign.raised,
            seeded: entries.len(),
            entries,
        }
    }

    /// Return a new ledger with `entry` added at the end.
    ///
    /// Amounts outside `0 < amount <= MAX_DONATION` fail with
    /// [`LedgerError::InvalidAmount`] and the receiver is left untouched.
    pub fn append(&self, entry: DonationEntry) -> Result<Ledger> {
        self.check(&entry)?;
        let mut next = self.clone();
        next.entries.push(entry);
        Ok(next)
    }

    pub fn campaign_id(&self) -> &str {
        &self.campaign_id
    }

    pub fn opening_balance(&self) -> Decimal {
        self.opening_balance
    }

    /// Headline raised figure: the reported total plus this session's donations.
    pub fn raised(&self) -> Decimal {
        self.opening_balance
            .saturating_add(aggregator::total_raised(self.appended()))
    }

    pub fn entries(&self) -> &[DonationEntry] {
        &self.entries
    }

    pub fn seeded(&self) -> &[DonationEntry] {
        &self.entries[..self.seeded]
    }

    pub fn appended(&self) -> &[DonationEntry] {
        &self.entries[self.seeded..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&DonationEntry> {
        self.entries.last()
    }

    /// The `n` most recent entries, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &DonationEntry> {
        self.entries.iter().rev().take(n)
    }

    fn check(&self, entry: &DonationEntry) -> Result<()> {
        if !donation_in_range(entry.amount) || self.raised().checked_add(entry.amount).is_none() {
            return Err(LedgerError::InvalidAmount);
        }
        if entry.campaign_id != self.campaign_id {
            return Err(LedgerError::CampaignMismatch {
                ledger: self.campaign_id.clone(),
                entry: entry.campaign_id.clone(),
            });
        }
        Ok(())
    }
}

impl LedgerStore for Ledger {
    fn ledger(&self) -> &Ledger {
        self
    }

    fn commit(&mut self, entry: DonationEntry) -> Result<&DonationEntry> {
        self.check(&entry)?;
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }
}

impl DonationEntry {
    /// Build a donation made during this session. The id is
    /// `sim-{unix_millis}-{random base36 suffix}`.
    pub fn simulated(
        campaign_id: impl Into<String>,
        amount: Decimal,
        name: Option<&str>,
        message: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_id(now),
            campaign_id: campaign_id.into(),
            amount,
            name: display_name(name),
            message: message.map(str::trim).unwrap_or_default().to_string(),
            timestamp: now,
            status: DonationStatus::Completed,
        }
    }
}

fn display_name(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => ANONYMOUS.to_string(),
    }
}

fn generate_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("sim-{}-{suffix}", now.timestamp_millis())
}

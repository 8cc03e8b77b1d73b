//! # Types
//!
//! Shared data structures used across all modules of the campaign ledger.
//!
//! ## Design decisions
//!
//! ### Record / Ledger split
//!
//! A [`Campaign`] is static configuration, written once when the bundled
//! catalog is built and never mutated. Everything that changes at runtime
//! lives in the [`crate::ledger::Ledger`] derived from it.
//!
//! ### State as a Finite-State Machine
//!
//! [`CampaignState`] describes a forward-only lifecycle:
//!
//! ```text
//! Upcoming ──► Active ──► Completed
//! ```
//!
//! Records are static, so nothing moves a campaign between states at runtime.
//! [`CampaignState::can_transition_to`] documents the order for tooling that
//! edits the data file.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency;
use crate::errors::{LedgerError, Result};

/// Largest single donation accepted, in campaign currency units.
pub const MAX_DONATION: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// `0 < amount <= MAX_DONATION`.
pub fn donation_in_range(amount: Decimal) -> bool {
    amount > Decimal::ZERO && amount <= MAX_DONATION
}

/// Lifecycle state of a campaign.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignState {
    /// Announced; not accepting donations yet.
    Upcoming,
    /// Accepting donations.
    Active,
    /// Closed; donations are shown for the record only.
    Completed,
}

impl CampaignState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Badge text shown on campaign cards.
    pub fn badge(&self) -> &'static str {
        match self {
            Self::Upcoming => "Próximamente",
            Self::Active => "Activa",
            Self::Completed => "Completada",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Self::Upcoming => Tone::Secondary,
            Self::Active => Tone::Success,
            Self::Completed => Tone::Info,
        }
    }

    /// Only forward transitions are allowed:
    ///   Upcoming -> Active | Completed
    ///   Active   -> Completed
    ///   Completed -> (none)
    pub fn can_transition_to(&self, next: CampaignState) -> bool {
        matches!(
            (self, next),
            (Self::Upcoming, Self::Active)
                | (Self::Upcoming, Self::Completed)
                | (Self::Active, Self::Completed)
        )
    }
}

impl fmt::Display for CampaignState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual tone for badges and chips.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Success,
    Info,
    Secondary,
    Warning,
    Accent,
}

/// Campaign category used for list filters and card chips.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Infrastructure,
    Education,
    Events,
    Equipment,
    /// The permanent general fund.
    General,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Infrastructure,
        Category::Education,
        Category::Events,
        Category::Equipment,
        Category::General,
    ];

    /// Display label in the site's language.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Infrastructure => "Infraestructura",
            Self::Education => "Educación",
            Self::Events => "Eventos",
            Self::Equipment => "Equipamiento",
            Self::General => "General",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Self::Infrastructure => Tone::Warning,
            Self::Education => Tone::Info,
            Self::Events => Tone::Accent,
            Self::Equipment => Tone::Secondary,
            Self::General => Tone::Success,
        }
    }
}

/// What the campaign funds.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignKind {
    General,
    Infrastructure,
    Education,
    Event,
}

/// `Continuous` campaigns have a sentinel goal and never close on their own.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingMode {
    #[default]
    Fixed,
    Continuous,
}

/// How progress is rendered on the detail page.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Visualization {
    SimpleBar {
        #[serde(default)]
        show_fixed_goal: bool,
    },
    ProgressBar,
    /// Discretized units ("bricks"), each costing `cost_per_unit`.
    BrickWall {
        total_units: u32,
        cost_per_unit: Decimal,
    },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DonationPreset {
    pub amount: Decimal,
    pub description: String,
    #[serde(default)]
    pub emoji: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CampaignUpdate {
    pub date: NaiveDate,
    pub title: String,
    pub description: String,
}

/// Seed ids in the data file are either numbers or strings.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeedId {
    Number(u64),
    Text(String),
}

impl fmt::Display for SeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A donation as authored in the static data file. Optional fields are
/// normalized when the ledger is seeded.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeedDonation {
    #[serde(default)]
    pub id: Option<SeedId>,
    #[serde(default)]
    pub name: Option<String>,
    pub amount: Decimal,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Static fundraising campaign record.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    /// Unique; used for lookup and routing.
    pub slug: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub long_description: String,
    pub kind: CampaignKind,
    pub state: CampaignState,
    pub goal: Decimal,
    /// Reported total at build time. Includes donations older than the
    /// itemized `donations` list.
    pub raised: Decimal,
    pub currency: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub image: String,
    pub category: Category,
    #[serde(default)]
    pub funding_mode: FundingMode,
    pub visualization: Visualization,
    #[serde(default)]
    pub perks: Vec<String>,
    #[serde(default)]
    pub donation_presets: Vec<DonationPreset>,
    #[serde(default)]
    pub donations: Vec<SeedDonation>,
    #[serde(default)]
    pub updates: Vec<CampaignUpdate>,
}

impl Campaign {
    /// Check the record-level invariants.
    pub fn validate(&self) -> Result<()> {
        if self.slug.trim().is_empty() {
            return Err(self.invalid("empty slug"));
        }
        if self.goal <= Decimal::ZERO {
            return Err(self.invalid(format!("non-positive goal ({})", self.goal)));
        }
        if self.end_date < self.start_date {
            return Err(self.invalid(format!(
                "end date {} precedes start date {}",
                self.end_date, self.start_date
            )));
        }
        if currency::lookup(&self.currency).is_none() {
            return Err(self.invalid(format!("unrecognized currency {}", self.currency)));
        }
        if let Visualization::BrickWall {
            total_units,
            cost_per_unit,
        } = &self.visualization
        {
            if *total_units == 0 || *cost_per_unit <= Decimal::ZERO {
                return Err(self.invalid("brick wall needs positive units and unit cost"));
            }
        }
        if self.raised < Decimal::ZERO {
            return Err(self.invalid(format!("negative raised total ({})", self.raised)));
        }
        if self.donation_presets.iter().any(|p| !donation_in_range(p.amount)) {
            return Err(self.invalid("donation preset out of range"));
        }
        if self.donations.iter().any(|d| !donation_in_range(d.amount)) {
            return Err(self.invalid("seed donation out of range"));
        }
        Ok(())
    }

    pub fn accepts_donations(&self) -> bool {
        self.state == CampaignState::Active
    }

    /// Active fixed-goal campaigns count down to their end date; continuous
    /// ones never close on their own.
    pub fn has_deadline(&self) -> bool {
        self.state == CampaignState::Active && self.funding_mode == FundingMode::Fixed
    }

    /// `false` for simple bars configured to hide the target.
    pub fn shows_goal(&self) -> bool {
        !matches!(
            self.visualization,
            Visualization::SimpleBar {
                show_fixed_goal: false
            }
        )
    }

    /// Client route of the detail page.
    pub fn path(&self) -> String {
        format!("/campanas/{}", self.slug)
    }

    fn invalid(&self, reason: impl fmt::Display) -> LedgerError {
        LedgerError::InvalidCampaign(format!("{}: {reason}", self.slug))
    }
}

/// Only `completed` is modeled; a payment provider would add pending and
/// failed states.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    #[default]
    Completed,
}

/// One immutable ledger entry.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DonationEntry {
    pub id: String,
    pub campaign_id: String,
    pub amount: Decimal,
    /// Display name; "Anonymous" when the donor gave none.
    pub name: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub status: DonationStatus,
}

/// Who placed a given unit of a brick-wall campaign.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ContributorInfo {
    pub name: String,
    pub message: String,
    pub donation_id: String,
}

impl From<&DonationEntry> for ContributorInfo {
    fn from(entry: &DonationEntry) -> Self {
        Self {
            name: entry.name.clone(),
            message: entry.message.clone(),
            donation_id: entry.id.clone(),
        }
    }
}

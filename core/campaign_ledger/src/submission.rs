//! # Donation submission flow
//!
//! ```text
//! Idle ──open──► Composing ──submit──► Submitting ──confirm──► Confirmed
//!  ▲                │                                            │
//!  └────cancel──────┘◄───────────────acknowledge─────────────────┘ (to Idle)
//! ```
//!
//! `submit` stays in `Composing` and returns [`LedgerError::InvalidAmount`]
//! unless the amount is positive and at most [`crate::types::MAX_DONATION`].
//! A preset selection and a custom amount are mutually exclusive: choosing one
//! clears the other.
//!
//! Between `submit` and `confirm` the caller runs the [`PaymentGateway`].
//! The simulated gateway always succeeds; a real provider plugs in here.
//! A declined payment goes back to `Composing` through `reject` with the
//! draft intact.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{LedgerError, Result};
use crate::ledger::LedgerStore;
use crate::types::{donation_in_range, Campaign, DonationEntry};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    #[default]
    Idle,
    Composing,
    Submitting,
    Confirmed,
}

impl FlowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Composing => "composing",
            Self::Submitting => "submitting",
            Self::Confirmed => "confirmed",
        }
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the donor has typed so far.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Draft {
    pub preset: Option<Decimal>,
    pub custom: String,
    pub name: String,
    pub message: String,
}

impl Draft {
    /// The amount to donate: the preset if one is selected, otherwise the
    /// parsed custom entry.
    pub fn amount(&self) -> Result<Decimal> {
        let amount = match self.preset {
            Some(preset) => preset,
            None => Decimal::from_str(self.custom.trim()).map_err(|_| LedgerError::InvalidAmount)?,
        };
        if !donation_in_range(amount) {
            return Err(LedgerError::InvalidAmount);
        }
        Ok(amount)
    }
}

/// Per-campaign donation state machine. Owns no ledger; the ledger is passed
/// to [`SubmissionFlow::confirm`].
#[derive(Clone, Debug)]
pub struct SubmissionFlow {
    campaign_id: String,
    slug: String,
    accepting: bool,
    state: FlowState,
    draft: Draft,
    pending: Option<DonationEntry>,
    last_confirmed: Option<DonationEntry>,
}

impl SubmissionFlow {
    pub fn new(campaign: &Campaign) -> Self {
        Self {
            campaign_id: campaign.id.clone(),
            slug: campaign.slug.clone(),
            accepting: campaign.accepts_donations(),
            state: FlowState::Idle,
            draft: Draft::default(),
            pending: None,
            last_confirmed: None,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Entry waiting for the gateway, set while `Submitting`.
    pub fn pending(&self) -> Option<&DonationEntry> {
        self.pending.as_ref()
    }

    /// Entry shown on the confirmation panel.
    pub fn last_confirmed(&self) -> Option<&DonationEntry> {
        self.last_confirmed.as_ref()
    }

    /// Idle → Composing.
    pub fn open(&mut self) -> Result<()> {
        self.expect(FlowState::Idle, "open the donation form")?;
        if !self.accepting {
            return Err(LedgerError::CampaignClosed(self.slug.clone()));
        }
        self.draft = Draft::default();
        self.state = FlowState::Composing;
        Ok(())
    }

    /// Idle → Composing with a suggested amount already selected.
    pub fn open_with_preset(&mut self, amount: Decimal) -> Result<()> {
        self.open()?;
        self.select_preset(amount)
    }

    pub fn select_preset(&mut self, amount: Decimal) -> Result<()> {
        self.expect(FlowState::Composing, "select a preset")?;
        self.draft.preset = Some(amount);
        self.draft.custom.clear();
        Ok(())
    }

    pub fn enter_custom(&mut self, text: &str) -> Result<()> {
        self.expect(FlowState::Composing, "enter an amount")?;
        self.draft.custom = text.to_string();
        self.draft.preset = None;
        Ok(())
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.expect(FlowState::Composing, "edit the name")?;
        self.draft.name = name.to_string();
        Ok(())
    }

    pub fn set_message(&mut self, message: &str) -> Result<()> {
        self.expect(FlowState::Composing, "edit the message")?;
        self.draft.message = message.to_string();
        Ok(())
    }

    /// Composing → Submitting. Builds the entry that will be recorded.
    ///
    /// Without an amount in range the flow stays in `Composing`.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<&DonationEntry> {
        self.expect(FlowState::Composing, "submit")?;
        let amount = self.draft.amount()?;
        let entry = DonationEntry::simulated(
            self.campaign_id.clone(),
            amount,
            Some(self.draft.name.as_str()),
            Some(self.draft.message.as_str()),
            now,
        );
        debug!(id = %entry.id, amount = %entry.amount, "donation submitted");
        self.state = FlowState::Submitting;
        Ok(self.pending.insert(entry))
    }

    /// Submitting → Confirmed. Appends the pending entry to `store`.
    pub fn confirm<S: LedgerStore + ?Sized>(&mut self, store: &mut S) -> Result<DonationEntry> {
        self.expect(FlowState::Submitting, "confirm")?;
        let entry = self.pending.clone().ok_or(LedgerError::InvalidTransition {
            from: self.state,
            action: "confirm",
        })?;
        let stored = store.commit(entry)?.clone();
        self.pending = None;
        info!(
            campaign = %self.slug,
            id = %stored.id,
            amount = %stored.amount,
            raised = %store.ledger().raised(),
            "donation recorded"
        );
        self.last_confirmed = Some(stored.clone());
        self.state = FlowState::Confirmed;
        Ok(stored)
    }

    /// Submitting → Composing after the gateway declined. The draft is kept so
    /// the donor can retry.
    pub fn reject(&mut self) -> Result<()> {
        self.expect(FlowState::Submitting, "reject")?;
        self.pending = None;
        self.state = FlowState::Composing;
        Ok(())
    }

    /// Confirmed → Idle, clearing every input.
    pub fn acknowledge(&mut self) -> Result<()> {
        self.expect(FlowState::Confirmed, "close the confirmation")?;
        self.reset();
        Ok(())
    }

    /// Composing → Idle, discarding the draft.
    pub fn cancel(&mut self) -> Result<()> {
        self.expect(FlowState::Composing, "cancel")?;
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.draft = Draft::default();
        self.pending = None;
        self.state = FlowState::Idle;
    }

    fn expect(&self, state: FlowState, action: &'static str) -> Result<()> {
        if self.state != state {
            return Err(LedgerError::InvalidTransition {
                from: self.state,
                action,
            });
        }
        Ok(())
    }
}

/// Proof that the gateway accepted a donation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub donation_id: String,
    pub reference: String,
    pub processed_at: DateTime<Utc>,
}

/// Boundary where a payment provider would take the money.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn process(&self, entry: &DonationEntry) -> Result<Receipt>;
}

/// Gateway that waits `latency` and approves everything.
#[derive(Clone, Debug)]
pub struct SimulatedGateway {
    latency: Duration,
}

impl SimulatedGateway {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn process(&self, entry: &DonationEntry) -> Result<Receipt> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(Receipt {
            donation_id: entry.id.clone(),
            reference: format!("simulated-{}", entry.id),
            processed_at: Utc::now(),
        })
    }
}

//! Crate-wide error type.

use thiserror::Error;

use crate::submission::FlowState;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Donation amount must be a positive number")]
    InvalidAmount,

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Campaign not found: {0}")]
    CampaignNotFound(String),

    #[error("Donation for campaign {entry} cannot be recorded in the ledger of {ledger}")]
    CampaignMismatch { ledger: String, entry: String },

    #[error("Campaign {0} is not accepting donations")]
    CampaignClosed(String),

    #[error("Cannot {action} while the donation flow is {from}")]
    InvalidTransition {
        from: FlowState,
        action: &'static str,
    },

    #[error("Invalid campaign record: {0}")]
    InvalidCampaign(String),

    #[error("Campaign data error: {0}")]
    Data(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

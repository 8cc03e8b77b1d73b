//! # Campaign Ledger
//!
//! Domain crate of the outreach site. It holds the static campaign records,
//! the per-session donation ledger, and the pure computations the campaign
//! pages display.
//!
//! | Concern        | Module           | Entry point(s)                                  |
//! |----------------|------------------|-------------------------------------------------|
//! | Records        | [`types`]        | [`Campaign`], [`DonationEntry`]                 |
//! | Catalog        | [`catalog`]      | [`Catalog::builtin`], [`Catalog::find`]         |
//! | Ledger         | [`ledger`]       | [`Ledger::initialize`], [`Ledger::append`]      |
//! | Aggregation    | [`aggregator`]   | `percent_funded`, `allocate_units`, `summarize` |
//! | Money          | [`currency`]     | `format`, `format_raw`                          |
//! | Donation flow  | [`submission`]   | [`SubmissionFlow`], [`PaymentGateway`]          |
//! | Routing        | [`routes`]       | [`Route::parse`]                                |
//!
//! ## Architecture
//!
//! Records never change at runtime. Every mutable piece of state is a
//! [`Ledger`] owned by whoever opened it (a visitor session in the site
//! service) and handed to the submission flow by `&mut`. The aggregator only
//! reads.

pub mod aggregator;
pub mod catalog;
pub mod currency;
mod errors;
pub mod ledger;
pub mod routes;
pub mod submission;
pub mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_ledger;
#[cfg(test)]
mod test_submission;

pub use aggregator::{summarize, CampaignSummary, ProgressTier, UnitsSummary};
pub use catalog::{Catalog, CampaignFilter, ImpactStats};
pub use errors::{LedgerError, Result};
pub use ledger::{Ledger, LedgerStore, ANONYMOUS};
pub use routes::Route;
pub use submission::{Draft, FlowState, PaymentGateway, Receipt, SimulatedGateway, SubmissionFlow};
pub use types::{
    Campaign, CampaignState, Category, ContributorInfo, DonationEntry, DonationStatus, Tone,
    Visualization, MAX_DONATION,
};

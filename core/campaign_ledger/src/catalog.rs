//! Bundled campaign catalog: slug lookup, list filters and impact figures.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{LedgerError, Result};
use crate::types::{Campaign, CampaignState, Category};

const BUILTIN_CAMPAIGNS: &str = include_str!("../data/campaigns.json");

/// Conjunctive list filter. `None` means "all".
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CampaignFilter {
    pub category: Option<Category>,
    pub state: Option<CampaignState>,
    /// Case-insensitive match on title or description.
    #[serde(alias = "q")]
    pub search: Option<String>,
}

impl CampaignFilter {
    pub fn matches(&self, campaign: &Campaign) -> bool {
        let category = self.category.map_or(true, |c| c == campaign.category);
        let state = self.state.map_or(true, |s| s == campaign.state);
        let search = match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                campaign.title.to_lowercase().contains(&needle)
                    || campaign.description.to_lowercase().contains(&needle)
            }
            _ => true,
        };
        category && state && search
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImpactStats {
    pub total_campaigns: usize,
    pub active_campaigns: usize,
    /// Sum of reported totals across every campaign.
    pub total_raised: Decimal,
}

#[derive(Clone, Debug)]
pub struct Catalog {
    campaigns: Vec<Campaign>,
}

impl Catalog {
    /// The campaigns shipped with the site.
    pub fn builtin() -> Result<Self> {
        let catalog = Self::from_json(BUILTIN_CAMPAIGNS)?;
        info!("Loaded {} bundled campaigns", catalog.campaigns.len());
        Ok(catalog)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let campaigns: Vec<Campaign> = serde_json::from_str(json)?;
        Self::new(campaigns)
    }

    /// Validate every record and reject duplicate slugs.
    pub fn new(campaigns: Vec<Campaign>) -> Result<Self> {
        let mut slugs = HashSet::with_capacity(campaigns.len());
        for campaign in &campaigns {
            campaign.validate()?;
            if !slugs.insert(campaign.slug.as_str()) {
                return Err(LedgerError::InvalidCampaign(format!(
                    "duplicate slug {}",
                    campaign.slug
                )));
            }
        }
        Ok(Self { campaigns })
    }

    pub fn all(&self) -> &[Campaign] {
        &self.campaigns
    }

    pub fn find(&self, slug: &str) -> Result<&Campaign> {
        self.campaigns
            .iter()
            .find(|c| c.slug == slug)
            .ok_or_else(|| LedgerError::CampaignNotFound(slug.to_string()))
    }

    pub fn filter<'a>(&'a self, filter: &'a CampaignFilter) -> impl Iterator<Item = &'a Campaign> {
        self.campaigns.iter().filter(move |c| filter.matches(c))
    }

    pub fn by_state(&self, state: CampaignState) -> impl Iterator<Item = &Campaign> {
        self.campaigns.iter().filter(move |c| c.state == state)
    }

    pub fn impact(&self) -> ImpactStats {
        ImpactStats {
            total_campaigns: self.campaigns.len(),
            active_campaigns: self.by_state(CampaignState::Active).count(),
            total_raised: self.campaigns.iter().map(|c| c.raised).sum(),
        }
    }
}

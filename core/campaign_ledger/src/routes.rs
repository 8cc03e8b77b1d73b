//! Client hash routes of the site.

use serde::Serialize;

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum Route {
    Home,
    Experiments,
    Contribute,
    About,
    Gallery,
    EventsNews,
    Campaigns,
    CampaignDetail { slug: String },
    ProposeExperiment,
    Volunteer,
    NotFound,
}

impl Route {
    /// Resolve a hash path such as `#/campanas/muro-ciencia-2024`. The leading
    /// `#` and a trailing `/` are optional; query strings are ignored.
    pub fn parse(path: &str) -> Self {
        let path = path.trim().trim_start_matches('#');
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Self::Home,
            ["experimentos"] => Self::Experiments,
            ["contribuir"] => Self::Contribute,
            ["nosotros"] => Self::About,
            ["galeria"] => Self::Gallery,
            ["eventos-noticias"] => Self::EventsNews,
            ["campanas"] => Self::Campaigns,
            ["campanas", slug] => Self::CampaignDetail {
                slug: (*slug).to_string(),
            },
            ["proponer-experimento"] => Self::ProposeExperiment,
            ["voluntariado"] => Self::Volunteer,
            _ => Self::NotFound,
        }
    }

    /// Inverse of [`Route::parse`]. `NotFound` maps to the home page.
    pub fn path(&self) -> String {
        match self {
            Self::Home | Self::NotFound => "/".to_string(),
            Self::Experiments => "/experimentos".to_string(),
            Self::Contribute => "/contribuir".to_string(),
            Self::About => "/nosotros".to_string(),
            Self::Gallery => "/galeria".to_string(),
            Self::EventsNews => "/eventos-noticias".to_string(),
            Self::Campaigns => "/campanas".to_string(),
            Self::CampaignDetail { slug } => format!("/campanas/{slug}"),
            Self::ProposeExperiment => "/proponer-experimento".to_string(),
            Self::Volunteer => "/voluntariado".to_string(),
        }
    }
}

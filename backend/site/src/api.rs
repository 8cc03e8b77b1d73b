//! Axum REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use campaign_ledger::{
    aggregator, Campaign, CampaignFilter, CampaignState, CampaignSummary, Catalog, Category,
    DonationEntry, Draft, FlowState, ImpactStats, Ledger, LedgerError, PaymentGateway, Receipt,
    Route, Tone,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::{ErrorResponse, Result};
use crate::session::{self, Session, SessionStore};

/// Donations listed in the "recent donations" panel.
const RECENT_DONATIONS: usize = 5;

#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<Catalog>,
    pub sessions: Arc<SessionStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub config: Config,
    pub shutdown: CancellationToken,
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/routes/resolve", get(resolve_route))
        .route("/campaigns", get(list_campaigns))
        .route("/campaigns/:slug", get(get_campaign))
        .route("/campaigns/:slug/sessions", post(open_session))
        .route("/sessions/:token", get(get_session).delete(close_session))
        .route("/sessions/:token/compose", post(compose))
        .route("/sessions/:token/draft", put(update_draft))
        .route("/sessions/:token/submit", post(submit))
        .route("/sessions/:token/cancel", post(cancel))
        .route("/sessions/:token/acknowledge", post(acknowledge))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub open_sessions: usize,
}

#[derive(Serialize)]
pub struct Badge {
    pub label: &'static str,
    pub tone: Tone,
}

/// One card on the campaign list page.
#[derive(Serialize)]
pub struct CampaignCard {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub category: Category,
    pub category_badge: Badge,
    pub state: CampaignState,
    pub state_badge: Badge,
    pub percent_funded: u8,
    pub raised_display: String,
    pub goal_display: Option<String>,
    pub days_remaining: Option<u32>,
    pub link: String,
}

impl CampaignCard {
    fn new(campaign: &Campaign, now: chrono::DateTime<Utc>) -> Self {
        let percent = aggregator::percent_funded(campaign.raised, campaign.goal);
        Self {
            slug: campaign.slug.clone(),
            title: campaign.title.clone(),
            description: campaign.description.clone(),
            image: campaign.image.clone(),
            category: campaign.category,
            category_badge: Badge {
                label: campaign.category.label(),
                tone: campaign.category.tone(),
            },
            state: campaign.state,
            state_badge: Badge {
                label: campaign.state.badge(),
                tone: campaign.state.tone(),
            },
            percent_funded: percent,
            raised_display: aggregator::display_amount(campaign.raised, &campaign.currency),
            goal_display: campaign
                .shows_goal()
                .then(|| aggregator::display_amount(campaign.goal, &campaign.currency)),
            days_remaining: campaign
                .has_deadline()
                .then(|| aggregator::days_remaining(campaign.end_date, now)),
            link: campaign.path(),
        }
    }
}

#[derive(Serialize)]
pub struct CampaignListResponse {
    pub impact: ImpactStats,
    pub count: usize,
    pub campaigns: Vec<CampaignCard>,
}

#[derive(Serialize)]
pub struct CampaignDetailResponse<'a> {
    pub campaign: &'a Campaign,
    pub summary: CampaignSummary,
    pub recent_donations: Vec<DonationEntry>,
}

#[derive(Serialize)]
pub struct NotFoundResponse {
    pub error: String,
    pub back_link: String,
    pub back_label: &'static str,
}

#[derive(Serialize)]
pub struct SessionView {
    pub token: Uuid,
    pub campaign: String,
    pub state: FlowState,
    pub draft: Draft,
    pub summary: CampaignSummary,
    pub recent_donations: Vec<DonationEntry>,
    pub last_confirmed: Option<DonationEntry>,
}

impl SessionView {
    fn new(token: Uuid, session: &Session) -> Self {
        Self {
            token,
            campaign: session.campaign.slug.clone(),
            state: session.flow.state(),
            draft: session.flow.draft().clone(),
            summary: aggregator::summarize(&session.campaign, &session.ledger, Utc::now()),
            recent_donations: recent(&session.ledger),
            last_confirmed: session.flow.last_confirmed().cloned(),
        }
    }
}

#[derive(Serialize)]
pub struct SubmitResponse {
    pub entry: DonationEntry,
    pub receipt: Receipt,
    pub session: SessionView,
}

// ─────────────────────────────────────────────────────────
// Request shapes
// ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub path: String,
}

#[derive(Deserialize, Default)]
pub struct ComposeRequest {
    pub preset: Option<Decimal>,
}

/// Fields left out are not touched. When both `preset` and `custom` are given
/// the custom amount wins, matching the order a donor would type them.
#[derive(Deserialize, Default)]
pub struct DraftUpdate {
    pub preset: Option<Decimal>,
    pub custom: Option<String>,
    pub name: Option<String>,
    pub message: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        open_sessions: state.sessions.len().await,
    })
}

/// `GET /routes/resolve?path=#/campanas/slug`
pub async fn resolve_route(Query(query): Query<ResolveQuery>) -> impl IntoResponse {
    Json(Route::parse(&query.path))
}

/// `GET /campaigns?category=&state=&q=`
pub async fn list_campaigns(
    State(state): State<Arc<ApiState>>,
    Query(filter): Query<CampaignFilter>,
) -> impl IntoResponse {
    let now = Utc::now();
    let campaigns: Vec<CampaignCard> = state
        .catalog
        .filter(&filter)
        .map(|c| CampaignCard::new(c, now))
        .collect();
    Json(CampaignListResponse {
        impact: state.catalog.impact(),
        count: campaigns.len(),
        campaigns,
    })
}

/// `GET /campaigns/:slug`
///
/// Unknown slugs render the not-found view with a link back to the list.
pub async fn get_campaign(
    State(state): State<Arc<ApiState>>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    match state.catalog.find(&slug) {
        Ok(campaign) => {
            let ledger = Ledger::initialize(campaign);
            (
                StatusCode::OK,
                Json(CampaignDetailResponse {
                    campaign,
                    summary: aggregator::summarize(campaign, &ledger, Utc::now()),
                    recent_donations: recent(&ledger),
                }),
            )
                .into_response()
        }
        Err(e @ LedgerError::CampaignNotFound(_)) => {
            debug!("{e}");
            (
                StatusCode::NOT_FOUND,
                Json(NotFoundResponse {
                    error: e.to_string(),
                    back_link: Route::Campaigns.path(),
                    back_label: "Ver todas las campañas",
                }),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// `POST /campaigns/:slug/sessions`
pub async fn open_session(
    State(state): State<Arc<ApiState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let campaign = state.catalog.find(&slug)?;
    let token = state.sessions.open(campaign).await?;
    let view = state
        .sessions
        .with(token, |session| Ok(SessionView::new(token, session)))
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `GET /sessions/:token`
pub async fn get_session(
    State(state): State<Arc<ApiState>>,
    Path(token): Path<Uuid>,
) -> Result<Json<SessionView>> {
    view(&state, token).await
}

/// `DELETE /sessions/:token`
pub async fn close_session(
    State(state): State<Arc<ApiState>>,
    Path(token): Path<Uuid>,
) -> Result<StatusCode> {
    state.sessions.close(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /sessions/:token/compose`
pub async fn compose(
    State(state): State<Arc<ApiState>>,
    Path(token): Path<Uuid>,
    body: Option<Json<ComposeRequest>>,
) -> Result<Json<SessionView>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    state
        .sessions
        .with(token, |session| {
            match request.preset {
                Some(amount) => session.flow.open_with_preset(amount)?,
                None => session.flow.open()?,
            }
            Ok(Json(SessionView::new(token, session)))
        })
        .await
}

/// `PUT /sessions/:token/draft`
pub async fn update_draft(
    State(state): State<Arc<ApiState>>,
    Path(token): Path<Uuid>,
    Json(update): Json<DraftUpdate>,
) -> Result<Json<SessionView>> {
    state
        .sessions
        .with(token, |session| {
            let flow = &mut session.flow;
            if let Some(amount) = update.preset {
                flow.select_preset(amount)?;
            }
            if let Some(custom) = &update.custom {
                flow.enter_custom(custom)?;
            }
            if let Some(name) = &update.name {
                flow.set_name(name)?;
            }
            if let Some(message) = &update.message {
                flow.set_message(message)?;
            }
            Ok(Json(SessionView::new(token, session)))
        })
        .await
}

/// `POST /sessions/:token/submit`
///
/// Validates the draft, hands the donation to the payment gateway without
/// holding the session lock, then records it in the session's ledger.
pub async fn submit(
    State(state): State<Arc<ApiState>>,
    Path(token): Path<Uuid>,
) -> Result<Json<SubmitResponse>> {
    let pending = state
        .sessions
        .with(token, |session| Ok(session.flow.submit(Utc::now())?.clone()))
        .await?;

    let receipt = match state.gateway.process(&pending).await {
        Ok(receipt) => receipt,
        Err(e) => {
            warn!(%token, id = %pending.id, "payment declined: {e}");
            state
                .sessions
                .with(token, |session| {
                    session.flow.reject()?;
                    Ok(())
                })
                .await?;
            return Err(e.into());
        }
    };

    let (entry, confirmation, session_view) = state
        .sessions
        .with(token, |session| {
            let entry = session.flow.confirm(&mut session.ledger)?;
            session.confirmations += 1;
            Ok((entry, session.confirmations, SessionView::new(token, session)))
        })
        .await?;

    session::schedule_acknowledge(
        state.sessions.clone(),
        token,
        confirmation,
        state.config.confirmation_display(),
        state.shutdown.child_token(),
    );

    Ok(Json(SubmitResponse {
        entry,
        receipt,
        session: session_view,
    }))
}

/// `POST /sessions/:token/cancel`
pub async fn cancel(
    State(state): State<Arc<ApiState>>,
    Path(token): Path<Uuid>,
) -> Result<Json<SessionView>> {
    state
        .sessions
        .with(token, |session| {
            session.flow.cancel()?;
            Ok(Json(SessionView::new(token, session)))
        })
        .await
}

/// `POST /sessions/:token/acknowledge`
///
/// Closes the confirmation before the display delay runs out.
pub async fn acknowledge(
    State(state): State<Arc<ApiState>>,
    Path(token): Path<Uuid>,
) -> Result<Json<SessionView>> {
    state
        .sessions
        .with(token, |session| {
            session.flow.acknowledge()?;
            Ok(Json(SessionView::new(token, session)))
        })
        .await
}

async fn view(state: &ApiState, token: Uuid) -> Result<Json<SessionView>> {
    state
        .sessions
        .with(token, |session| Ok(Json(SessionView::new(token, session))))
        .await
}

fn recent(ledger: &Ledger) -> Vec<DonationEntry> {
    ledger.recent(RECENT_DONATIONS).cloned().collect()
}

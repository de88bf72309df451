use std::sync::Arc;

use axum::extract::{FromRef, FromRequest, FromRequestParts, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{middleware, Json, Router};
use serde::{Deserialize, Serialize};
use studio_shared::error::DomainResult;
use studio_shared::repository::Repositories;
use studio_shared::{
    AccountId, BookingId, BookingStatus, DomainError, ListingId, Perspective, Role, Visibility,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::accounts::{AccountService, Credentials, Registration};
use crate::admin::AdminService;
use crate::auth::{AuthActor, JwtService, MaybeActor};
use crate::bookings::{BookingEngine, CreateBooking};
use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::listings::{DiscoveryFilter, ListingInput, ListingPatch, ListingService, ManualListing};
use crate::messaging::MessageSideEffect;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::reviews::{NewReview, ReviewService};

#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub bookings: BookingEngine,
    pub listings: ListingService,
    pub reviews: ReviewService,
    pub messages: MessageSideEffect,
    pub admin: AdminService,
    pub jwt: Arc<JwtService>,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repositories>, config: ServerConfig) -> Self {
        let jwt = Arc::new(JwtService::new(&config.jwt_secret, config.token_ttl_secs));
        let messages = MessageSideEffect::new(repo.clone());
        let bookings = BookingEngine::new(repo.clone(), messages.clone(), config.transition_policy);

        Self {
            accounts: AccountService::new(repo.clone(), jwt.clone()),
            admin: AdminService::new(repo.clone(), bookings.clone()),
            listings: ListingService::new(repo.clone()),
            reviews: ReviewService::new(repo),
            bookings,
            messages,
            jwt,
            rate_limiter: RateLimiter::from_config(&config),
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for Arc<JwtService> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

/// JSON body whose rejection renders as a 400 `{"error": ..}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Body<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Id<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Params<T>(pub T);

/// Run a synchronous service call off the async executor.
async fn run<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> DomainResult<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DomainError::Internal(format!("blocking task failed: {e}")))?;
    Ok(result?)
}

fn cors(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    match config.frontend_origin.as_deref() {
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => layer.allow_origin(AllowOrigin::exact(value)),
            Err(_) => {
                warn!(origin, "Invalid FRONTEND_ORIGIN, allowing any origin");
                layer.allow_origin(Any)
            }
        },
        None => layer.allow_origin(Any),
    }
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/bookings", post(create_booking))
        .route("/bookings/mine", get(my_bookings))
        .route("/bookings/owned", get(owned_bookings))
        .route("/bookings/:id", get(get_booking))
        .route("/bookings/:id/status", patch(update_booking_status))
        .route("/listings", get(discover_listings).post(create_listing))
        .route("/listings/mine", get(my_listings))
        .route(
            "/listings/:id",
            get(get_listing).patch(update_listing).delete(delete_listing),
        )
        .route("/listings/:id/visibility", patch(set_listing_visibility))
        .route("/locations", get(list_locations))
        .route("/reviews", get(list_reviews).post(add_review))
        .route("/messages", post(send_message))
        .route("/messages/conversations", get(conversations))
        .route("/messages/with/:other_id", get(conversation_with))
        .route("/admin/stats", get(admin_stats))
        .route("/admin/bookings", get(admin_bookings))
        .route("/admin/accounts", get(admin_accounts).post(admin_create_account))
        .route("/admin/listings", get(admin_listings).post(admin_create_listing))
        .route("/admin/listings/pending", get(admin_pending_listings))
        .route("/admin/listings/:id/approve", post(admin_approve_listing))
        .route("/admin/listings/:id/reject", post(admin_reject_listing));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Deserialize)]
struct StatusUpdate {
    status: BookingStatus,
}

#[derive(Deserialize)]
struct VisibilityUpdate {
    #[serde(alias = "target")]
    visibility: Visibility,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessage {
    receiver_id: AccountId,
    content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewFilter {
    listing_id: Option<ListingId>,
}

#[derive(Deserialize)]
struct AccountFilter {
    role: Option<Role>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn register(
    State(state): State<AppState>,
    Body(input): Body<Registration>,
) -> Result<impl IntoResponse, ApiError> {
    let session = run(move || state.accounts.register(input)).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn login(
    State(state): State<AppState>,
    Body(input): Body<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(run(move || state.accounts.login(input)).await?))
}

async fn me(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(run(move || state.accounts.me(&actor)).await?))
}

async fn create_booking(
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
    Body(input): Body<CreateBooking>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = run(move || state.bookings.create_booking(input, actor.as_ref())).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn my_bookings(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
) -> Result<impl IntoResponse, ApiError> {
    let bookings = run(move || {
        state
            .bookings
            .list_bookings_for_requester(Some(&actor), Perspective::AsBooker)
    })
    .await?;
    Ok(Json(bookings))
}

async fn owned_bookings(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
) -> Result<impl IntoResponse, ApiError> {
    let bookings = run(move || {
        state
            .bookings
            .list_bookings_for_requester(Some(&actor), Perspective::AsOwner)
    })
    .await?;
    Ok(Json(bookings))
}

async fn get_booking(
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
    Id(id): Id<BookingId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        run(move || state.bookings.get_booking(id, actor.as_ref())).await?,
    ))
}

async fn update_booking_status(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Id(id): Id<BookingId>,
    Body(update): Body<StatusUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    if update.status == BookingStatus::Pending {
        return Err(ApiError::BadRequest(
            "Status must be CONFIRMED, CANCELLED or COMPLETED".into(),
        ));
    }
    let booking = run(move || state.bookings.update_status(id, update.status, &actor)).await?;
    Ok(Json(booking))
}

async fn discover_listings(
    State(state): State<AppState>,
    Params(filter): Params<DiscoveryFilter>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(run(move || state.listings.discover(filter)).await?))
}

async fn list_locations(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(run(move || state.listings.locations()).await?))
}

async fn create_listing(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Body(input): Body<ListingInput>,
) -> Result<impl IntoResponse, ApiError> {
    let listing = run(move || state.listings.create(&actor, input)).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

async fn my_listings(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(run(move || state.listings.mine(&actor)).await?))
}

async fn get_listing(
    State(state): State<AppState>,
    Id(id): Id<ListingId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(run(move || state.listings.get(id)).await?))
}

async fn update_listing(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Id(id): Id<ListingId>,
    Body(patch): Body<ListingPatch>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        run(move || state.listings.update(&actor, id, patch)).await?,
    ))
}

async fn delete_listing(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Id(id): Id<ListingId>,
) -> Result<impl IntoResponse, ApiError> {
    run(move || state.listings.delete(&actor, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_listing_visibility(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Id(id): Id<ListingId>,
    Body(update): Body<VisibilityUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let listing =
        run(move || state.listings.set_visibility(id, update.visibility, &actor)).await?;
    Ok(Json(listing))
}

async fn add_review(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Body(input): Body<NewReview>,
) -> Result<impl IntoResponse, ApiError> {
    let review = run(move || state.reviews.add(&actor, input)).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

async fn list_reviews(
    State(state): State<AppState>,
    Params(filter): Params<ReviewFilter>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        run(move || state.reviews.list(filter.listing_id)).await?,
    ))
}

async fn send_message(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Body(input): Body<SendMessage>,
) -> Result<impl IntoResponse, ApiError> {
    let message =
        run(move || state.messages.send(&actor, input.receiver_id, &input.content)).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn conversations(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        run(move || state.messages.conversation_summaries(&actor)).await?,
    ))
}

async fn conversation_with(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Id(other): Id<AccountId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        run(move || state.messages.conversation(&actor, other)).await?,
    ))
}

async fn admin_stats(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(run(move || state.admin.stats(&actor)).await?))
}

async fn admin_bookings(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(run(move || state.admin.bookings(&actor)).await?))
}

async fn admin_accounts(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Params(filter): Params<AccountFilter>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        run(move || state.admin.accounts(&actor, filter.role)).await?,
    ))
}

async fn admin_create_account(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Body(input): Body<Registration>,
) -> Result<impl IntoResponse, ApiError> {
    let account = run(move || state.accounts.create_manual(&actor, input)).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn admin_listings(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(run(move || state.listings.all(&actor)).await?))
}

async fn admin_pending_listings(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(run(move || state.listings.pending(&actor)).await?))
}

async fn admin_create_listing(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Body(input): Body<ManualListing>,
) -> Result<impl IntoResponse, ApiError> {
    let listing = run(move || state.listings.create_manual(&actor, input)).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

async fn admin_approve_listing(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Id(id): Id<ListingId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(run(move || state.listings.approve(id, &actor)).await?))
}

async fn admin_reject_listing(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Id(id): Id<ListingId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(run(move || state.listings.reject(id, &actor)).await?))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

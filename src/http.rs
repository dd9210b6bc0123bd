use crate::backend::{BackendError, BookingBackend};
use crate::configuration::Configuration;
use crate::mailer::Notifier;
use crate::slots::{available_times, default_windows};
use crate::types::{NewBooking, TimeRange};
use axum::extract::{Query, Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_valid::Valid;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;
use validator::Validate;

lazy_static! {
    static ref DATE_FORMAT: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    static ref TIME_SLOT: Regex = Regex::new(r"^([01]\d|2[0-3]):00$").unwrap();
}

#[derive(Clone)]
pub struct AppState<B: BookingBackend, C: Configuration> {
    backend: B,
    notifier: Notifier,
    configuration: C,
}

#[derive(Debug, Error)]
enum ApiError {
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("invalid date, expected YYYY-MM-DD")]
    InvalidDate,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MissingParameter(_) | ApiError::InvalidDate => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Backend(BackendError::SlotTaken) => {
                (StatusCode::CONFLICT, String::from("slot already taken"))
            }
            ApiError::Backend(BackendError::Database(err)) => {
                error!(%err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from("internal server error"),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct AvailabilityParams {
    date: Option<String>,
    view: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeSlotsResponse {
    time_slots: Vec<TimeRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailableTimesResponse {
    available_times: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertAvailabilityRequest {
    date: String,
    time_slots: Vec<TimeRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
struct CreateBookingRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    name: String,
    #[validate(email(message = "invalid email address"))]
    email: String,
    #[validate(regex(path = *DATE_FORMAT, message = "expected YYYY-MM-DD"))]
    date: String,
    #[validate(regex(path = *TIME_SLOT, message = "expected a full hour like 09:00"))]
    time: String,
}

pub fn create_app<B: BookingBackend, C: Configuration>(
    backend: B,
    notifier: Notifier,
    configuration: C,
) -> Router {
    let state = AppState {
        backend,
        notifier,
        configuration,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/availability", get(get_availability::<B, C>))
        .route(
            "/bookings",
            get(list_bookings::<B, C>).post(create_booking::<B, C>),
        );

    let admin = Router::new()
        .route("/availability", post(upsert_availability::<B, C>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth::<B, C>,
        ));

    Router::new()
        .merge(public)
        .merge(admin)
        .with_state(state)
        .layer(cors)
}

async fn admin_auth<B: BookingBackend, C: Configuration>(
    State(state): State<AppState<B, C>>,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    match request.headers().get("x-admin-password") {
        Some(header) if header.to_str().unwrap_or("") == state.configuration.admin_password() => {
            Ok(next.run(request).await)
        }
        Some(_) => Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string())),
        None => Err((StatusCode::UNAUTHORIZED, "Missing credentials".to_string())),
    }
}

fn parse_date(raw: Option<&str>) -> Result<NaiveDate, ApiError> {
    let raw = raw.ok_or(ApiError::MissingParameter("date"))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ApiError::InvalidDate)
}

async fn get_availability<B: BookingBackend, C: Configuration>(
    State(state): State<AppState<B, C>>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Response, ApiError> {
    let date = parse_date(params.date.as_deref())?;
    let configured = state.backend.availability(date)?;

    if params.view.as_deref() == Some("admin") {
        let time_slots = configured.map(|a| a.time_slots).unwrap_or_default();
        return Ok(Json(TimeSlotsResponse { time_slots }).into_response());
    }

    let windows = configured
        .map(|a| a.time_slots)
        .unwrap_or_else(default_windows);
    let booked: Vec<String> = state
        .backend
        .bookings_on(date)?
        .into_iter()
        .map(|booking| booking.time)
        .collect();
    Ok(Json(AvailableTimesResponse {
        available_times: available_times(&windows, &booked),
    })
    .into_response())
}

async fn upsert_availability<B: BookingBackend, C: Configuration>(
    State(state): State<AppState<B, C>>,
    Json(request): Json<UpsertAvailabilityRequest>,
) -> Result<Json<TimeSlotsResponse>, ApiError> {
    let date = parse_date(Some(&request.date))?;
    let stored = state.backend.upsert_availability(date, request.time_slots)?;
    Ok(Json(TimeSlotsResponse {
        time_slots: stored.time_slots,
    }))
}

async fn create_booking<B: BookingBackend, C: Configuration>(
    State(state): State<AppState<B, C>>,
    Valid(Json(request)): Valid<Json<CreateBookingRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let date = parse_date(Some(&request.date))?;
    let booking = state.backend.create_booking(NewBooking {
        name: request.name,
        email: request.email,
        date,
        time: request.time,
    })?;

    // off the request path; delivery failures are retried by the worker and
    // never turn an already persisted booking into an error response
    state.notifier.enqueue(booking.clone());

    Ok((StatusCode::CREATED, Json(booking)))
}

async fn list_bookings<B: BookingBackend, C: Configuration>(
    State(state): State<AppState<B, C>>,
) -> Result<Response, ApiError> {
    Ok(Json(state.backend.bookings()?).into_response())
}

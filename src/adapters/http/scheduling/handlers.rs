//! Route handlers for availability and booking endpoints.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::dto::{
    BookingListQuery, BookingResponse, BreakRequest, CancelRequest, CreateBookingRequest, RescheduleRequest,
    RuleRequest, SlotsQuery, SlotsResponse,
};
use crate::adapters::http::extract::{ValidJson, ValidQuery};
use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::Tenant;
use crate::adapters::http::query::PageQuery;
use crate::adapters::http::state::AppState;
use crate::application::handlers::scheduling::{BookingTransition, CreateBookingCommand, RescheduleBookingCommand};
use crate::domain::foundation::{AvailabilityRuleId, BookingId, BreakId, PageRequest, Timestamp};
use crate::domain::identity::TenantContext;
use crate::ports::{BookingFilter, BookingWindow};

// ─── availability ───────────────────────────────────────────────────────────

/// GET /availability-rules
pub async fn list_rules(State(state): State<AppState>, Tenant(ctx): Tenant) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.availability_handler().list_rules(&ctx).await?))
}

/// POST /availability-rules
pub async fn create_rule(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidJson(req): ValidJson<RuleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rule = state.availability_handler().create_rule(&ctx, req.to_input()?).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

/// PUT /availability-rules/:id
pub async fn update_rule(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<AvailabilityRuleId>,
    ValidJson(req): ValidJson<RuleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rule = state
        .availability_handler()
        .update_rule(&ctx, id, req.to_input()?, req.is_active)
        .await?;
    Ok(Json(rule))
}

/// DELETE /availability-rules/:id
pub async fn delete_rule(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<AvailabilityRuleId>,
) -> Result<StatusCode, ApiError> {
    state.availability_handler().delete_rule(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /breaks
pub async fn list_breaks(State(state): State<AppState>, Tenant(ctx): Tenant) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.availability_handler().list_breaks(&ctx).await?))
}

/// POST /breaks
pub async fn create_break(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidJson(req): ValidJson<BreakRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let period = state
        .availability_handler()
        .create_break(&ctx, req.start_dt, req.end_dt, req.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(period)))
}

/// DELETE /breaks/:id
pub async fn delete_break(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<BreakId>,
) -> Result<StatusCode, ApiError> {
    state.availability_handler().delete_break(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /availability-slots/available-slots
pub async fn available_slots(
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<SlotsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let slots = state
        .available_slots_handler()
        .handle(q.trainer_id, q.start_date, q.end_date, q.duration)
        .await?;
    Ok(Json(SlotsResponse::from(slots)))
}

// ─── bookings ───────────────────────────────────────────────────────────────

async fn list_with_window(
    state: &AppState,
    ctx: &TenantContext,
    q: BookingListQuery,
    window: BookingWindow,
) -> Result<impl IntoResponse, ApiError> {
    let filter = BookingFilter {
        status: q.status,
        client_id: q.client_id,
        from: q.from,
        to: q.to,
        window,
    };
    let page = PageRequest::from(PageQuery {
        offset: q.offset,
        limit: q.limit,
    });
    let bookings = state.list_bookings_handler().list(ctx, &filter, page).await?;
    Ok(Json(bookings.map(BookingResponse::from)))
}

/// GET /bookings
pub async fn list_bookings(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidQuery(q): ValidQuery<BookingListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_with_window(&state, &ctx, q, BookingWindow::All).await
}

/// GET /bookings/upcoming
pub async fn upcoming_bookings(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidQuery(q): ValidQuery<BookingListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_with_window(&state, &ctx, q, BookingWindow::Upcoming(Timestamp::now())).await
}

/// GET /bookings/past
pub async fn past_bookings(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidQuery(q): ValidQuery<BookingListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_with_window(&state, &ctx, q, BookingWindow::Past(Timestamp::now())).await
}

/// POST /bookings
pub async fn create_booking(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidJson(req): ValidJson<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CreateBookingCommand {
        client_id: req.client_id,
        start: req.start_time,
        end: req.end_time,
        notes: req.notes,
        location: req.location,
    };
    let booking = state.create_booking_handler().handle(&ctx, cmd).await?;
    Ok((StatusCode::CREATED, Json(BookingResponse::from(booking))))
}

/// GET /bookings/:id
pub async fn get_booking(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<BookingId>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state.list_bookings_handler().get(&ctx, id).await?;
    Ok(Json(BookingResponse::from(booking)))
}

/// PATCH /bookings/:id
pub async fn reschedule_booking(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<BookingId>,
    ValidJson(req): ValidJson<RescheduleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = RescheduleBookingCommand {
        start: req.start_time,
        end: req.end_time,
        notes: req.notes,
        location: req.location,
    };
    let booking = state.reschedule_booking_handler().handle(&ctx, id, cmd).await?;
    Ok(Json(BookingResponse::from(booking)))
}

async fn transition(
    state: &AppState,
    ctx: &TenantContext,
    id: BookingId,
    transition: BookingTransition,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = state.transition_booking_handler().handle(ctx, id, transition).await?;
    Ok(Json(BookingResponse::from(booking)))
}

/// POST /bookings/:id/confirm
pub async fn confirm_booking(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<BookingId>,
) -> Result<Json<BookingResponse>, ApiError> {
    transition(&state, &ctx, id, BookingTransition::Confirm).await
}

/// POST /bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<BookingId>,
    body: Option<Json<CancelRequest>>,
) -> Result<Json<BookingResponse>, ApiError> {
    let reason = body.and_then(|Json(req)| req.reason);
    transition(&state, &ctx, id, BookingTransition::Cancel { reason }).await
}

/// POST /bookings/:id/mark-completed
pub async fn complete_booking(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<BookingId>,
) -> Result<Json<BookingResponse>, ApiError> {
    transition(&state, &ctx, id, BookingTransition::Complete).await
}

/// POST /bookings/:id/mark-no-show
pub async fn no_show_booking(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<BookingId>,
) -> Result<Json<BookingResponse>, ApiError> {
    transition(&state, &ctx, id, BookingTransition::NoShow).await
}

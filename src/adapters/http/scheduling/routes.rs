//! Router for availability and booking endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use super::handlers::{
    available_slots, cancel_booking, complete_booking, confirm_booking, create_booking, create_break, create_rule,
    delete_break, delete_rule, get_booking, list_bookings, list_breaks, list_rules, no_show_booking,
    past_bookings, reschedule_booking, upcoming_bookings, update_rule,
};
use crate::adapters::http::state::AppState;

pub fn scheduling_routes() -> Router<AppState> {
    Router::new()
        .route("/availability-rules", get(list_rules).post(create_rule))
        .route("/availability-rules/:id", put(update_rule).delete(delete_rule))
        .route("/breaks", get(list_breaks).post(create_break))
        .route("/breaks/:id", delete(delete_break))
        .route("/availability-slots/available-slots", get(available_slots))
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/upcoming", get(upcoming_bookings))
        .route("/bookings/past", get(past_bookings))
        .route("/bookings/:id", get(get_booking).patch(reschedule_booking))
        .route("/bookings/:id/confirm", post(confirm_booking))
        .route("/bookings/:id/cancel", post(cancel_booking))
        .route("/bookings/:id/mark-completed", post(complete_booking))
        .route("/bookings/:id/mark-no-show", post(no_show_booking))
}

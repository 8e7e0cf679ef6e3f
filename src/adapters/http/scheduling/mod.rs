//! HTTP adapter for availability and bookings.
//!
//! - `GET|POST /availability-rules`, `PUT|DELETE /availability-rules/:id`
//! - `GET|POST /breaks`, `DELETE /breaks/:id`
//! - `GET /availability-slots/available-slots` (public)
//! - `GET|POST /bookings`, `GET /bookings/upcoming`, `GET /bookings/past`
//! - `GET|PATCH /bookings/:id`
//! - `POST /bookings/:id/{confirm,cancel,mark-completed,mark-no-show}`

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::scheduling_routes;

//! Tenant events that drive workflow automation.
//!
//! Every event carries the owning trainer, a flat attribute map that
//! templates and conditions read from, and an optional schedule reference
//! (the booking start for booking events) that negative delays anchor on.

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::clients::{Client, ManualPayment, Package, PackagePurchase};
use crate::domain::foundation::{
    format_cents, AttributeMap, DomainEvent, EventId, Scalar, Timestamp, TrainerId,
    ValidationError,
};
use crate::domain::identity::Trainer;
use crate::domain::scheduling::Booking;

/// Kinds of event published on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    BookingCreated,
    BookingConfirmed,
    BookingCancelled,
    BookingCompleted,
    ClientCreated,
    PaymentReceived,
    PackagePurchased,
    /// Platform event; never a workflow trigger.
    TenantDeleted,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::BookingCreated,
        EventKind::BookingConfirmed,
        EventKind::BookingCancelled,
        EventKind::BookingCompleted,
        EventKind::ClientCreated,
        EventKind::PaymentReceived,
        EventKind::PackagePurchased,
        EventKind::TenantDeleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::BookingCreated => "booking_created",
            EventKind::BookingConfirmed => "booking_confirmed",
            EventKind::BookingCancelled => "booking_cancelled",
            EventKind::BookingCompleted => "booking_completed",
            EventKind::ClientCreated => "client_created",
            EventKind::PaymentReceived => "payment_received",
            EventKind::PackagePurchased => "package_purchased",
            EventKind::TenantDeleted => "tenant_deleted",
        }
    }

    /// Whether workflows may subscribe to this kind.
    pub fn is_trigger(&self) -> bool {
        !matches!(self, EventKind::TenantDeleted)
    }

    /// Whether events of this kind carry a schedule reference usable as
    /// the anchor for a negative delay.
    pub fn carries_schedule_reference(&self) -> bool {
        matches!(self, EventKind::BookingCreated | EventKind::BookingConfirmed)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::invalid_format("event_type", format!("unknown event type '{}'", s)))
    }
}

/// An event scoped to one trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantEvent {
    pub event_id: EventId,
    pub trainer_id: TrainerId,
    pub kind: EventKind,
    pub data: AttributeMap,
    pub schedule_reference: Option<Timestamp>,
    pub occurred_at: Timestamp,
}

impl DomainEvent for TenantEvent {
    fn event_type(&self) -> &str {
        self.kind.as_str()
    }

    fn tenant(&self) -> TrainerId {
        self.trainer_id
    }

    fn occurred_at(&self) -> Timestamp {
        self.occurred_at
    }

    fn event_id(&self) -> EventId {
        self.event_id
    }
}

impl TenantEvent {
    pub fn new(trainer_id: TrainerId, kind: EventKind, data: AttributeMap, now: Timestamp) -> Self {
        Self {
            event_id: EventId::new(),
            trainer_id,
            kind,
            data,
            schedule_reference: None,
            occurred_at: now,
        }
    }

    pub fn with_schedule_reference(mut self, at: Timestamp) -> Self {
        self.schedule_reference = Some(at);
        self
    }

    /// Reads a field; missing fields are null.
    pub fn field(&self, name: &str) -> &Scalar {
        static NULL: Scalar = Scalar::Null;
        self.data.get(name).unwrap_or(&NULL)
    }

    /// Booking lifecycle events. Dates and times are rendered in the
    /// trainer's zone.
    pub fn for_booking(kind: EventKind, booking: &Booking, client: &Client, trainer: &Trainer, now: Timestamp) -> Self {
        let mut data = trainer_data(trainer);
        data.extend(client_data(client));
        data.extend(booking_data(booking, trainer.timezone));
        let event = Self::new(trainer.id, kind, data, now);
        if kind.carries_schedule_reference() {
            event.with_schedule_reference(booking.start)
        } else {
            event
        }
    }

    pub fn client_created(client: &Client, trainer: &Trainer, now: Timestamp) -> Self {
        let mut data = trainer_data(trainer);
        data.extend(client_data(client));
        Self::new(trainer.id, EventKind::ClientCreated, data, now)
    }

    /// Payment recorded manually by the trainer.
    pub fn manual_payment_received(payment: &ManualPayment, client: &Client, trainer: &Trainer, now: Timestamp) -> Self {
        let mut data = trainer_data(trainer);
        data.extend(client_data(client));
        data.insert("payment_amount".into(), format_cents(payment.amount_cents).into());
        data.insert("payment_currency".into(), payment.currency.clone().into());
        data.insert("payment_method".into(), payment.method.as_str().into());
        data.insert("payment_date".into(), date_string(payment.payment_date).into());
        Self::new(trainer.id, EventKind::PaymentReceived, data, now)
    }

    /// Subscription payment settled by the billing provider.
    pub fn provider_payment_received(trainer: &Trainer, amount_cents: i64, currency: &str, now: Timestamp) -> Self {
        let mut data = trainer_data(trainer);
        data.insert("payment_amount".into(), format_cents(amount_cents).into());
        data.insert("payment_currency".into(), currency.into());
        data.insert("payment_method".into(), "paddle".into());
        Self::new(trainer.id, EventKind::PaymentReceived, data, now)
    }

    pub fn package_purchased(
        purchase: &PackagePurchase,
        package: &Package,
        client: &Client,
        trainer: &Trainer,
        now: Timestamp,
    ) -> Self {
        let mut data = trainer_data(trainer);
        data.extend(client_data(client));
        data.insert("package_name".into(), package.name.clone().into());
        data.insert("package_price".into(), package.price_display().into());
        data.insert("sessions_included".into(), package.sessions_count.into());
        data.insert("sessions_remaining".into(), purchase.sessions_remaining.into());
        data.insert("expiry_date".into(), purchase.expiry_date.map(date_string).into());
        Self::new(trainer.id, EventKind::PackagePurchased, data, now)
    }

    pub fn tenant_deleted(trainer_id: TrainerId, now: Timestamp) -> Self {
        let mut data = AttributeMap::new();
        data.insert("trainer_id".into(), trainer_id.to_string().into());
        Self::new(trainer_id, EventKind::TenantDeleted, data, now)
    }
}

fn trainer_data(trainer: &Trainer) -> AttributeMap {
    let mut data = AttributeMap::new();
    data.insert("trainer_id".into(), trainer.id.to_string().into());
    data.insert("trainer_name".into(), trainer.business_name.clone().into());
    data
}

fn client_data(client: &Client) -> AttributeMap {
    let mut data = AttributeMap::new();
    data.insert("client_id".into(), client.id.to_string().into());
    data.insert("client_name".into(), client.name.clone().into());
    data.insert("client_email".into(), client.email.clone().into());
    data.insert("client_phone".into(), client.phone.clone().into());
    data.insert("fitness_level".into(), client.fitness_level.as_str().into());
    data
}

fn booking_data(booking: &Booking, tz: Tz) -> AttributeMap {
    let local_start = booking.start.as_datetime().with_timezone(&tz);
    let mut data = AttributeMap::new();
    data.insert("booking_id".into(), booking.id.to_string().into());
    data.insert("booking_date".into(), local_start.format("%Y-%m-%d").to_string().into());
    data.insert("booking_time".into(), local_start.format("%H:%M").to_string().into());
    data.insert("booking_duration".into(), booking.duration_minutes().into());
    data.insert("booking_location".into(), booking.location.clone().into());
    data.insert("booking_status".into(), booking.status.as_str().into());
    data
}

fn date_string(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clients::ClientDetails;
    use crate::domain::foundation::ClientId;
    use crate::domain::identity::{Principal, PrincipalProfile};
    use chrono::{TimeZone, Utc};

    fn trainer(tz: Tz) -> Trainer {
        let principal = Principal::new_trainer(
            "coach@x.io".into(),
            "hash".into(),
            PrincipalProfile::default(),
            Timestamp::now(),
        );
        let mut trainer = Trainer::for_principal(&principal, Timestamp::now());
        trainer.timezone = tz;
        trainer
    }

    fn client(trainer: &Trainer) -> Client {
        Client::new(
            trainer.id,
            ClientDetails {
                name: "Casey".into(),
                email: "c@y.io".into(),
                ..Default::default()
            },
            Timestamp::now(),
        )
        .unwrap()
    }

    #[test]
    fn booking_events_render_local_time_and_carry_reference() {
        let trainer = trainer(chrono_tz::America::New_York);
        let client = client(&trainer);
        let start = Timestamp::from_datetime(Utc.with_ymd_and_hms(2030, 1, 7, 15, 0, 0).unwrap());
        let booking = Booking {
            id: crate::domain::foundation::BookingId::new(),
            trainer_id: trainer.id,
            client_id: ClientId::new(),
            start,
            end: start.plus_minutes(60),
            status: crate::domain::scheduling::BookingStatus::Pending,
            notes: String::new(),
            cancellation_reason: None,
            location: Some("Gym".into()),
            reminder_sent_at: None,
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        };

        let event = TenantEvent::for_booking(EventKind::BookingCreated, &booking, &client, &trainer, Timestamp::now());
        assert_eq!(event.field("booking_date"), &Scalar::from("2030-01-07"));
        assert_eq!(event.field("booking_time"), &Scalar::from("10:00"));
        assert_eq!(event.field("client_email"), &Scalar::from("c@y.io"));
        assert_eq!(event.schedule_reference, Some(start));

        let cancelled = TenantEvent::for_booking(EventKind::BookingCancelled, &booking, &client, &trainer, Timestamp::now());
        assert!(cancelled.schedule_reference.is_none());
    }

    #[test]
    fn missing_fields_read_as_null() {
        let event = TenantEvent::tenant_deleted(TrainerId::new(), Timestamp::now());
        assert!(event.field("client_email").is_null());
        assert!(!event.kind.is_trigger());
    }

    #[test]
    fn kinds_round_trip_through_strings() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
    }
}

//! Booking confirmation and reminder messages.
//!
//! Both run from jobs. Confirmation sends are deduplicated so a retried
//! job does not message the client twice; reminders are guarded by the
//! booking's `reminder_sent_at`.

use std::sync::Arc;

use super::dispatcher::{MessageRequest, NotificationDispatcher};
use crate::domain::clients::Client;
use crate::domain::foundation::{BookingId, DomainError, Timestamp};
use crate::domain::identity::Trainer;
use crate::domain::scheduling::{Booking, BookingStatus};
use crate::domain::workflow::{template, EventKind, TenantEvent};
use crate::ports::{BookingRepository, ClientRepository, TrainerRepository};

const CONFIRMATION_SUBJECT: &str = "Your session with {{trainer_name}} is confirmed";
const CONFIRMATION_BODY: &str = "Hi {{client_name}},\n\nYour session on {{booking_date}} at {{booking_time}} is confirmed.\n\n{{trainer_name}}";
const REMINDER_SUBJECT: &str = "Reminder: session with {{trainer_name}} tomorrow";
const REMINDER_BODY: &str = "Hi {{client_name}},\n\nA reminder of your session on {{booking_date}} at {{booking_time}}.\n\n{{trainer_name}}";
const REMINDER_SMS: &str = "Reminder: session with {{trainer_name}} on {{booking_date}} at {{booking_time}}.";

/// How far ahead the reminder scan looks.
pub const REMINDER_WINDOW_MINUTES: i64 = 24 * 60;
const REMINDER_BATCH: u32 = 200;

pub struct BookingMessenger {
    bookings: Arc<dyn BookingRepository>,
    clients: Arc<dyn ClientRepository>,
    trainers: Arc<dyn TrainerRepository>,
    dispatcher: NotificationDispatcher,
}

impl BookingMessenger {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        clients: Arc<dyn ClientRepository>,
        trainers: Arc<dyn TrainerRepository>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            bookings,
            clients,
            trainers,
            dispatcher,
        }
    }

    /// Emails the client that the booking is confirmed. Does nothing if the
    /// booking has since left the confirmed state.
    pub async fn send_confirmation(&self, booking_id: BookingId) -> Result<(), DomainError> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("booking"))?;
        if booking.status != BookingStatus::Confirmed {
            tracing::debug!(booking_id = %booking.id, status = booking.status.as_str(), "confirmation skipped");
            return Ok(());
        }
        let Some((client, trainer)) = self.parties(&booking).await? else {
            return Ok(());
        };

        let data = TenantEvent::for_booking(EventKind::BookingConfirmed, &booking, &client, &trainer, Timestamp::now()).data;
        let request = MessageRequest::email(
            trainer.id,
            &client.email,
            &template::render(CONFIRMATION_SUBJECT, &data),
            template::render(CONFIRMATION_BODY, &data),
        )
        .from_name(&trainer.business_name)
        .deduplicated();
        self.dispatcher.send(request).await?;
        Ok(())
    }

    /// Reminds clients of confirmed bookings starting within the next day.
    /// Returns how many bookings were handled.
    pub async fn scan_reminders(&self, now: Timestamp) -> Result<usize, DomainError> {
        let due = self
            .bookings
            .list_due_for_reminder(now, now.plus_minutes(REMINDER_WINDOW_MINUTES), REMINDER_BATCH)
            .await?;

        let mut handled = 0;
        for mut booking in due {
            if let Some((client, trainer)) = self.parties(&booking).await? {
                self.remind(&booking, &client, &trainer).await?;
            }
            booking.reminder_sent_at = Some(now);
            self.bookings.update(&booking, false).await?;
            handled += 1;
        }
        if handled > 0 {
            tracing::info!(count = handled, "booking reminders sent");
        }
        Ok(handled)
    }

    async fn remind(&self, booking: &Booking, client: &Client, trainer: &Trainer) -> Result<(), DomainError> {
        let data = TenantEvent::for_booking(EventKind::BookingConfirmed, booking, client, trainer, Timestamp::now()).data;
        if !client.email.is_empty() {
            let request = MessageRequest::email(
                trainer.id,
                &client.email,
                &template::render(REMINDER_SUBJECT, &data),
                template::render(REMINDER_BODY, &data),
            )
            .from_name(&trainer.business_name);
            self.dispatcher.send(request).await?;
        }
        if let Some(phone) = client.phone.as_deref().filter(|p| !p.is_empty()) {
            self.dispatcher
                .send(MessageRequest::sms(trainer.id, phone, template::render(REMINDER_SMS, &data)))
                .await?;
        }
        Ok(())
    }

    async fn parties(&self, booking: &Booking) -> Result<Option<(Client, Trainer)>, DomainError> {
        let client = self.clients.find(booking.trainer_id, booking.client_id).await?;
        let trainer = self.trainers.find_by_id(booking.trainer_id).await?;
        match (client, trainer) {
            (Some(client), Some(trainer)) => Ok(Some((client, trainer))),
            _ => {
                tracing::warn!(booking_id = %booking.id, "booking has no client or trainer; message skipped");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::notifications::RecordingTransport;
    use crate::application::handlers::test_support::Fixture;
    use crate::domain::entitlement::Plan;
    use crate::domain::foundation::PageRequest;
    use crate::domain::notification::Channel;
    use crate::ports::NotificationRepository;

    struct Setup {
        fx: Fixture,
        email: RecordingTransport,
        sms: RecordingTransport,
        messenger: BookingMessenger,
    }

    async fn setup() -> Setup {
        let fx = Fixture::new(Plan::Free).await;
        let email = RecordingTransport::new();
        let sms = RecordingTransport::new();
        let store = Arc::new(fx.store.clone());
        let dispatcher = NotificationDispatcher::new(store.clone(), Arc::new(email.clone()), Arc::new(sms.clone()));
        let messenger = BookingMessenger::new(store.clone(), store.clone(), store, dispatcher);
        Setup { fx, email, sms, messenger }
    }

    async fn booking(setup: &Setup, starts_in_minutes: i64, confirmed: bool) -> Booking {
        let client = setup.fx.client("Ari", "ari@example.com").await;
        let now = Timestamp::now();
        let start = now.plus_minutes(starts_in_minutes);
        let mut booking =
            Booking::schedule(setup.fx.ctx.trainer_id, client.id, start, start.plus_minutes(60), None, None, now).unwrap();
        if confirmed {
            booking.confirm(now).unwrap();
        }
        setup.fx.store.insert_checked(&booking).await.unwrap();
        booking
    }

    #[tokio::test]
    async fn confirmation_is_sent_once() {
        let setup = setup().await;
        let booking = booking(&setup, 120, true).await;

        setup.messenger.send_confirmation(booking.id).await.unwrap();
        setup.messenger.send_confirmation(booking.id).await.unwrap();

        let sent = setup.email.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "ari@example.com");
        assert!(sent[0].subject.as_deref().unwrap().contains("confirmed"));
    }

    #[tokio::test]
    async fn confirmation_skips_unconfirmed_bookings() {
        let setup = setup().await;
        let booking = booking(&setup, 120, false).await;
        setup.messenger.send_confirmation(booking.id).await.unwrap();
        assert!(setup.email.sent().is_empty());
    }

    #[tokio::test]
    async fn reminders_go_out_once_per_booking() {
        let setup = setup().await;
        booking(&setup, 180, true).await;
        let now = Timestamp::now();

        assert_eq!(setup.messenger.scan_reminders(now).await.unwrap(), 1);
        assert_eq!(setup.messenger.scan_reminders(now).await.unwrap(), 0);
        assert_eq!(setup.email.sent().len(), 1);
        assert_eq!(setup.sms.sent().len(), 1);

        let log = NotificationRepository::list(&setup.fx.store, setup.fx.ctx.trainer_id, Some(Channel::Sms), None, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(log.total, 1);
    }

    #[tokio::test]
    async fn bookings_beyond_the_window_wait() {
        let setup = setup().await;
        booking(&setup, REMINDER_WINDOW_MINUTES + 120, true).await;
        assert_eq!(setup.messenger.scan_reminders(Timestamp::now()).await.unwrap(), 0);
    }
}

use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::errors::NotificationError;
use crate::models::{Booking, SlotSchedule, TimeSlot};
use crate::services::calendar::generate_ics;
use crate::services::mail::{EmailAttachment, Mailer, OutgoingEmail};
use crate::services::messaging::MessagingProvider;

/// Hand-off point between the commit path and notification delivery.
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::UnboundedSender<Booking>,
}

impl NotificationQueue {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Booking>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn enqueue(&self, booking: &Booking) {
        if self.tx.send(booking.clone()).is_err() {
            tracing::warn!(booking_id = booking.id, "notification worker gone, dropping notification");
        }
    }
}

pub struct Notifier {
    mailer: Box<dyn Mailer>,
    sms: Option<Box<dyn MessagingProvider>>,
    schedule: SlotSchedule,
    service_name: String,
    service_email: String,
    owner_phone: String,
}

impl Notifier {
    pub fn new(
        mailer: Box<dyn Mailer>,
        sms: Option<Box<dyn MessagingProvider>>,
        schedule: SlotSchedule,
        config: &AppConfig,
    ) -> Self {
        Self {
            mailer,
            sms,
            schedule,
            service_name: config.service_name.clone(),
            service_email: config.service_email.clone(),
            owner_phone: config.owner_phone.clone(),
        }
    }

    /// Sends the client confirmation and the operator alerts. Each channel is
    /// attempted independently; the failures are returned for logging.
    pub async fn deliver(&self, booking: &Booking) -> Vec<NotificationError> {
        let mut errors = vec![];

        if let Err(e) = self.mailer.send(self.confirmation_email(booking)).await {
            errors.push(NotificationError::Mail(e));
        }

        if self.service_email.is_empty() {
            tracing::warn!(booking_id = booking.id, "SERVICE_EMAIL not set, skipping operator email");
        } else if let Err(e) = self.mailer.send(self.operator_email(booking)).await {
            errors.push(NotificationError::Mail(e));
        }

        if let Some(sms) = &self.sms {
            if let Err(e) = sms.send_message(&self.owner_phone, &operator_sms(booking)).await {
                errors.push(NotificationError::Sms(e));
            }
        }

        errors
    }

    fn confirmation_email(&self, booking: &Booking) -> OutgoingEmail {
        let slot = self
            .schedule
            .find(&booking.time_slot)
            .copied()
            .or_else(|| TimeSlot::parse(&booking.time_slot).ok());

        let attachment = slot.map(|slot| EmailAttachment {
            filename: "booking.ics".to_string(),
            content_type: "text/calendar".to_string(),
            content: generate_ics(
                booking,
                &slot,
                &self.service_name,
                &uuid::Uuid::new_v4().to_string(),
            ),
        });

        let text = format!(
            "Hello, {name}!\n\n\
             Your booking has been registered.\n\n\
             Service: {service}\n\
             Date: {date}\n\
             Time: {slot}\n\
             Address: {address}\n\n\
             Thank you,\n{biz}\n",
            name = booking.name,
            service = booking.service_type.as_str(),
            date = booking.date,
            slot = booking.time_slot,
            address = booking.address,
            biz = self.service_name,
        );

        let html = format!(
            "<div style=\"font-family:sans-serif; padding:16px;\">\
             <h2>{biz} - Booking confirmation</h2>\
             <p>Hello, <strong>{name}</strong>!</p>\
             <p>Your booking has been registered.</p>\
             <ul>\
             <li><strong>Service:</strong> {service}</li>\
             <li><strong>Date:</strong> {date}</li>\
             <li><strong>Time:</strong> {slot}</li>\
             <li><strong>Address:</strong> {address}</li>\
             </ul>\
             <p>Thank you,<br>{biz}</p>\
             </div>",
            biz = escape_html(&self.service_name),
            name = escape_html(&booking.name),
            service = booking.service_type.as_str(),
            date = booking.date,
            slot = escape_html(&booking.time_slot),
            address = escape_html(&booking.address),
        );

        OutgoingEmail {
            to: booking.email.clone(),
            subject: "Booking confirmation".to_string(),
            text,
            html: Some(html),
            attachment,
        }
    }

    fn operator_email(&self, booking: &Booking) -> OutgoingEmail {
        let notes = if booking.notes.is_empty() {
            "-"
        } else {
            booking.notes.as_str()
        };
        let text = format!(
            "Name: {}\nPhone: {}\nEmail: {}\nDate: {}\nTime: {}\nService: {}\nAddress: {}\nNotes: {}\n",
            booking.name,
            booking.phone,
            booking.email,
            booking.date,
            booking.time_slot,
            booking.service_type.as_str(),
            booking.address,
            notes,
        );

        OutgoingEmail {
            to: self.service_email.clone(),
            subject: format!("New booking - {}", booking.service_type.as_str()),
            text,
            html: None,
            attachment: None,
        }
    }
}

fn operator_sms(booking: &Booking) -> String {
    format!(
        "New booking #{}: {} {} {} ({}, {})",
        booking.id,
        booking.service_type.as_str(),
        booking.date,
        booking.time_slot,
        booking.name,
        booking.phone,
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Starts the background worker that drains the queue.
pub fn spawn_worker(notifier: Notifier) -> NotificationQueue {
    let (queue, mut rx) = NotificationQueue::channel();

    tokio::spawn(async move {
        while let Some(booking) = rx.recv().await {
            let errors = notifier.deliver(&booking).await;
            if errors.is_empty() {
                tracing::info!(booking_id = booking.id, "booking notifications sent");
            }
            for e in errors {
                tracing::warn!(booking_id = booking.id, error = %e, "booking notification failed");
            }
        }
        tracing::info!("notification worker stopped");
    });

    queue
}

use std::sync::{Arc, Mutex};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cleanride::config::AppConfig;
use cleanride::db;
use cleanride::handlers;
use cleanride::models::SlotSchedule;
use cleanride::services::booking::BookingEngine;
use cleanride::services::mail::{LogMailer, Mailer, SmtpMailer};
use cleanride::services::messaging::twilio::TwilioSmsProvider;
use cleanride::services::messaging::MessagingProvider;
use cleanride::services::notifications::{spawn_worker, Notifier};
use cleanride::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let schedule = match config.booking_slots.as_deref() {
        Some(list) => SlotSchedule::from_list(list).context("invalid BOOKING_SLOTS")?,
        None => SlotSchedule::default(),
    };
    tracing::info!(slots = ?schedule.labels(), "slot schedule loaded");

    let conn = db::init_db(&config.database_url)?;
    let db = Arc::new(Mutex::new(conn));

    let mailer: Box<dyn Mailer> = if config.smtp_host.is_empty() {
        tracing::warn!("SMTP_HOST not set, emails will only be logged");
        Box::new(LogMailer)
    } else {
        tracing::info!("using SMTP mailer (host: {})", config.smtp_host);
        Box::new(SmtpMailer::new(
            config.smtp_host.clone(),
            config.smtp_port,
            config.smtp_username.clone(),
            config.smtp_password.clone(),
            &config.service_name,
            &config.service_email,
        )?)
    };
    let sms: Option<Box<dyn MessagingProvider>> = if config.sms_configured() {
        tracing::info!("operator SMS alerts enabled");
        Some(Box::new(TwilioSmsProvider::from_config(&config)))
    } else {
        None
    };

    let notifications = spawn_worker(Notifier::new(mailer, sms, schedule.clone(), &config));
    let engine = BookingEngine::new(Arc::clone(&db), schedule, notifications);

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        engine,
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

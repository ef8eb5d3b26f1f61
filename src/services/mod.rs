pub mod auth;
pub mod booking;
pub mod calendar;
pub mod export;
pub mod mail;
pub mod messaging;
pub mod notifications;

pub mod api;
pub mod assets;
pub mod cache;
pub mod config;
pub mod connection_test;
pub mod error;
pub mod http;
pub mod i18n;
pub mod lifecycle;
pub mod message;
pub mod model;
pub mod notify;
pub mod overlay;
pub mod preferences;
pub mod session;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use crate::{
    config::ConsoleConfig,
    error::Failure,
    http::{HttpClient, ReqwestClient},
    lifecycle::{Control, Outcome},
    message::LocalizedMessage,
    model::{Tunnel, TunnelInput},
    notify::{Severity, Toast},
    preferences::Preferences,
    session::Session,
    validation::ValidationError,
};

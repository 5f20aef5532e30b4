use serde::{Deserialize, Serialize};

use crate::message::LocalizedMessage;

/// A tunnel as last acknowledged by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tunnel {
    pub id: String,
    pub name: String,
    pub local_port: u16,
    pub target_host: String,
    pub target_port: u16,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_id: Option<String>,
}

/// Body of a create or update response: the full record plus an optional
/// non-fatal advisory.
#[derive(Clone, Debug, Deserialize)]
pub struct TunnelResponse {
    #[serde(flatten)]
    pub tunnel: Tunnel,
    #[serde(default)]
    pub warning: Option<LocalizedMessage>,
}

/// Raw form contents before validation. Ports are `None` when the text
/// did not parse as an integer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TunnelInput {
    pub name: String,
    pub local_port: Option<i64>,
    pub target_host: String,
    pub target_port: Option<i64>,
    pub enabled: bool,
}

impl TunnelInput {
    pub fn from_text(
        name: &str,
        local_port: &str,
        target_host: &str,
        target_port: &str,
        enabled: bool,
    ) -> Self {
        Self {
            name: name.trim().to_string(),
            local_port: parse_port(local_port),
            target_host: target_host.trim().to_string(),
            target_port: parse_port(target_port),
            enabled,
        }
    }

    pub fn from_tunnel(tunnel: &Tunnel) -> Self {
        Self {
            name: tunnel.name.clone(),
            local_port: Some(i64::from(tunnel.local_port)),
            target_host: tunnel.target_host.clone(),
            target_port: Some(i64::from(tunnel.target_port)),
            enabled: tunnel.enabled,
        }
    }
}

fn parse_port(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

/// Validated create/update body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TunnelFields {
    pub name: String,
    pub local_port: u16,
    pub target_host: String,
    pub target_port: u16,
    pub enabled: bool,
}

/// Partial update body; absent fields are left untouched by the backend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TunnelPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl TunnelPatch {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }
}

impl From<TunnelFields> for TunnelPatch {
    fn from(fields: TunnelFields) -> Self {
        Self {
            name: Some(fields.name),
            local_port: Some(fields.local_port),
            target_host: Some(fields.target_host),
            target_port: Some(fields.target_port),
            enabled: Some(fields.enabled),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TestRequest<'a> {
    pub target_host: &'a str,
    pub target_port: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TestResult {
    pub success: bool,
    #[serde(default)]
    pub log: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Read-only template used to pre-fill the create form.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub target_host: String,
    pub target_port: u16,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LanguageDescriptor {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub flag: String,
}

impl LanguageDescriptor {
    pub fn english() -> Self {
        Self {
            code: "en".into(),
            name: "English".into(),
            flag: "🇺🇸".into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TunnelStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
}

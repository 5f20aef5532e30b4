use crate::model::{TunnelFields, TunnelInput};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationError {
    NameRequired,
    TargetHostRequired,
    LocalPortRange,
    TargetPortRange,
}

impl ValidationError {
    pub fn message_id(self) -> &'static str {
        match self {
            Self::NameRequired => "validation.nameRequired",
            Self::TargetHostRequired => "validation.targetHostRequired",
            Self::LocalPortRange => "validation.localPortRange",
            Self::TargetPortRange => "validation.targetPortRange",
        }
    }
}

/// Checks rules in a fixed order and stops at the first violation.
pub fn validate(input: &TunnelInput) -> Result<TunnelFields, ValidationError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    let target_host = input.target_host.trim();
    if target_host.is_empty() {
        return Err(ValidationError::TargetHostRequired);
    }
    let local_port = port(input.local_port).ok_or(ValidationError::LocalPortRange)?;
    let target_port = port(input.target_port).ok_or(ValidationError::TargetPortRange)?;

    Ok(TunnelFields {
        name: name.to_string(),
        local_port,
        target_host: target_host.to_string(),
        target_port,
        enabled: input.enabled,
    })
}

fn port(value: Option<i64>) -> Option<u16> {
    value
        .and_then(|value| u16::try_from(value).ok())
        .filter(|port| *port != 0)
}

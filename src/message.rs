use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

pub type Params = BTreeMap<String, String>;

pub fn params<I, K, V>(pairs: I) -> Params
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: ToString,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.to_string()))
        .collect()
}

/// Text coming back from the backend, either ready to display or as a
/// string-table key with interpolation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawMessage")]
pub enum LocalizedMessage {
    Plain(String),
    Localized { id: String, params: Params },
}

impl LocalizedMessage {
    pub fn localized(id: impl Into<String>, params: Params) -> Self {
        Self::Localized {
            id: id.into(),
            params,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMessage {
    Plain(String),
    Structured {
        id: String,
        #[serde(default)]
        params: serde_json::Map<String, Value>,
    },
}

impl From<RawMessage> for LocalizedMessage {
    fn from(raw: RawMessage) -> Self {
        match raw {
            RawMessage::Plain(text) => Self::Plain(text),
            RawMessage::Structured { id, params } => Self::Localized {
                id,
                params: params
                    .into_iter()
                    .map(|(key, value)| (key, coerce(value)))
                    .collect(),
            },
        }
    }
}

fn coerce(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

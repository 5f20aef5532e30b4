use std::rc::Rc;

use serde::de::DeserializeOwned;

use crate::{
    error::Failure,
    http::{HttpClient, HttpRequest},
};

/// Fetches static JSON files served next to the API (language index,
/// string tables, suggestions).
#[derive(Clone)]
pub struct AssetLoader {
    client: Rc<dyn HttpClient>,
    base_url: String,
}

impl AssetLoader {
    pub fn new(client: Rc<dyn HttpClient>, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, Failure> {
        let url = format!("{}{path}", self.base_url);
        log::debug!("[assets] GET {url}");

        let response = self.client.send(HttpRequest::get(url)).await?;
        if !response.is_success() {
            return Err(Failure::Status(response.status));
        }
        serde_json::from_slice(&response.body)
            .map_err(|error| Failure::Malformed(format!("Failed to parse {path}: {error}")))
    }
}

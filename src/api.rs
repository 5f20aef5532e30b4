use std::rc::Rc;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    error::Failure,
    http::{HttpClient, HttpRequest, Method},
    i18n::Localizer,
    message::LocalizedMessage,
    model::{ServerConfig, TestRequest, TestResult, Tunnel, TunnelFields, TunnelPatch, TunnelResponse},
};

/// The only path to the REST backend. Calls are issued exactly once; any
/// retry policy belongs to the caller.
pub struct ApiGateway {
    client: Rc<dyn HttpClient>,
    base_url: String,
    localizer: Rc<Localizer>,
}

impl ApiGateway {
    pub fn new(client: Rc<dyn HttpClient>, base_url: &str, localizer: Rc<Localizer>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            localizer,
        }
    }

    /// Returns the decoded body, `Value::Null` for 204 or an empty body.
    pub async fn call(&self, path: &str, method: Method, body: Option<Value>) -> Result<Value, Failure> {
        let mut request = HttpRequest::new(method, format!("{}{path}", self.base_url));
        if let Some(body) = body {
            request = request.json_body(body.to_string().into_bytes());
        }

        let response = match self.client.send(request).await {
            Ok(response) => response,
            Err(error) => {
                log::warn!("[api] {} {path} failed: {error}", method.as_str());
                return Err(error.into());
            }
        };
        log::debug!("[api] {} {path} -> {}", method.as_str(), response.status);

        if response.status == 204 {
            return Ok(Value::Null);
        }

        let decoded = if response.body.iter().all(u8::is_ascii_whitespace) {
            Ok(Value::Null)
        } else {
            serde_json::from_slice::<Value>(&response.body)
        };

        if !response.is_success() {
            let message = decoded
                .ok()
                .and_then(|mut body| body.get_mut("error").map(Value::take))
                .and_then(|error| serde_json::from_value::<LocalizedMessage>(error).ok())
                .map(|message| self.localizer.resolve_message(&message));
            return Err(match message {
                Some(message) => Failure::Backend {
                    status: response.status,
                    message,
                },
                None => Failure::Status(response.status),
            });
        }

        decoded.map_err(|error| Failure::Malformed(format!("Invalid response from {path}: {error}")))
    }

    async fn call_as<T: DeserializeOwned>(
        &self,
        path: &str,
        method: Method,
        body: Option<Value>,
    ) -> Result<T, Failure> {
        let value = self.call(path, method, body).await?;
        serde_json::from_value(value)
            .map_err(|error| Failure::Malformed(format!("Unexpected response from {path}: {error}")))
    }

    pub async fn list_tunnels(&self) -> Result<Vec<Tunnel>, Failure> {
        self.call_as("/tunnels", Method::Get, None).await
    }

    pub async fn create_tunnel(&self, fields: &TunnelFields) -> Result<TunnelResponse, Failure> {
        self.call_as("/tunnels", Method::Post, Some(encode(fields)?)).await
    }

    pub async fn update_tunnel(&self, id: &str, patch: &TunnelPatch) -> Result<TunnelResponse, Failure> {
        self.call_as(&tunnel_path(id), Method::Put, Some(encode(patch)?))
            .await
    }

    pub async fn delete_tunnel(&self, id: &str) -> Result<(), Failure> {
        self.call(&tunnel_path(id), Method::Delete, None)
            .await
            .map(|_| ())
    }

    pub async fn test_connection(&self, host: &str, port: u16) -> Result<TestResult, Failure> {
        let request = TestRequest {
            target_host: host,
            target_port: port,
        };
        self.call_as("/test", Method::Post, Some(encode(&request)?))
            .await
    }

    pub async fn config(&self) -> Result<ServerConfig, Failure> {
        self.call_as("/config", Method::Get, None).await
    }
}

/// Ids are opaque to the client, so they go out as a single escaped segment.
fn tunnel_path(id: &str) -> String {
    format!("/tunnels/{}", urlencoding::encode(id))
}

fn encode<T: Serialize>(body: &T) -> Result<Value, Failure> {
    serde_json::to_value(body).map_err(|error| Failure::Malformed(format!("Failed to encode request: {error}")))
}

use std::{cell::RefCell, collections::VecDeque};

use futures::{
    FutureExt,
    channel::oneshot,
    future::{self, LocalBoxFuture},
};

use crate::{
    http::{HttpClient, HttpRequest, HttpResponse, Method, TransportError},
    model::Tunnel,
};

pub(crate) type Reply = Result<HttpResponse, TransportError>;

enum Scripted {
    Ready(Reply),
    Deferred(oneshot::Receiver<Reply>),
}

/// Answers requests in the order the replies were scripted and records
/// every request it saw.
pub(crate) struct FakeClient {
    replies: RefCell<VecDeque<Scripted>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl FakeClient {
    pub(crate) fn new() -> Self {
        Self {
            replies: RefCell::new(VecDeque::new()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn respond_raw(&self, status: u16, body: &str) {
        self.replies
            .borrow_mut()
            .push_back(Scripted::Ready(Ok(HttpResponse {
                status,
                body: body.as_bytes().to_vec(),
            })));
    }

    pub(crate) fn respond_json(&self, status: u16, body: serde_json::Value) {
        self.respond_raw(status, &body.to_string());
    }

    pub(crate) fn respond_no_content(&self) {
        self.respond_raw(204, "");
    }

    pub(crate) fn fail(&self, message: &str) {
        self.replies
            .borrow_mut()
            .push_back(Scripted::Ready(Err(TransportError(message.to_string()))));
    }

    /// The matching request stays pending until the returned sender fires.
    pub(crate) fn defer(&self) -> oneshot::Sender<Reply> {
        let (sender, receiver) = oneshot::channel();
        self.replies
            .borrow_mut()
            .push_back(Scripted::Deferred(receiver));
        sender
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub(crate) fn count(&self, method: Method, path_suffix: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|request| request.method == method && request.url.ends_with(path_suffix))
            .count()
    }

    pub(crate) fn body_of(&self, index: usize) -> serde_json::Value {
        self.requests.borrow()[index]
            .body
            .as_deref()
            .map(|body| serde_json::from_slice(body).unwrap_or(serde_json::Value::Null))
            .unwrap_or(serde_json::Value::Null)
    }
}

impl HttpClient for FakeClient {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'static, Reply> {
        let description = format!("{} {}", request.method.as_str(), request.url);
        self.requests.borrow_mut().push(request);

        match self.replies.borrow_mut().pop_front() {
            Some(Scripted::Ready(reply)) => future::ready(reply).boxed_local(),
            Some(Scripted::Deferred(receiver)) => async move {
                receiver
                    .await
                    .unwrap_or_else(|_| Err(TransportError("request abandoned".into())))
            }
            .boxed_local(),
            None => future::ready(Err(TransportError(format!(
                "no scripted reply for {description}"
            ))))
            .boxed_local(),
        }
    }
}

pub(crate) fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

pub(crate) fn ok_json(body: serde_json::Value) -> Reply {
    Ok(HttpResponse {
        status: 200,
        body: body.to_string().into_bytes(),
    })
}

pub(crate) fn tunnel(id: &str, name: &str, enabled: bool) -> Tunnel {
    Tunnel {
        id: id.into(),
        name: name.into(),
        local_port: 5432,
        target_host: "10.0.0.5".into(),
        target_port: 5432,
        enabled,
        connection_url: None,
        warning_id: None,
    }
}

pub(crate) fn tunnel_json(tunnel: &Tunnel) -> serde_json::Value {
    serde_json::to_value(tunnel).unwrap_or(serde_json::Value::Null)
}

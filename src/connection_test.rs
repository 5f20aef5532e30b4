use crate::{
    lifecycle::{Control, Outcome},
    message::params,
    model::Tunnel,
    notify::Severity,
    overlay::TestPhase,
    session::Session,
};

impl Session {
    /// Runs an on-demand reachability check and renders it into the test
    /// modal. Never touches the tunnel cache.
    pub async fn test_connection(&self, host: &str, port: u16) -> Outcome {
        let Some(_guard) = self.in_flight.acquire(Control::Test {
            host: host.to_string(),
            port,
        }) else {
            return Outcome::Busy;
        };

        let ticket = self.overlays.borrow_mut().open_test(host, port);
        log::info!("[test] checking {host}:{port}");

        let (phase, outcome) = match self.api.test_connection(host, port).await {
            Ok(result) if result.success => (TestPhase::Succeeded { log: result.log }, Outcome::Applied),
            Ok(result) => (TestPhase::Failed { output: result.log }, Outcome::Applied),
            Err(failure) => (
                TestPhase::Failed {
                    output: failure.to_string(),
                },
                Outcome::Failed(failure),
            ),
        };

        if self.overlays.borrow_mut().complete_test(ticket, phase) {
            outcome
        } else {
            log::debug!("[test] modal for {host}:{port} was closed, dropping result");
            Outcome::Discarded
        }
    }

    /// Best-effort check after creating an enabled tunnel. The result is
    /// only ever a notice; failures are warnings.
    pub(crate) async fn auto_test(&self, tunnel: &Tunnel) -> Outcome {
        let host = tunnel.target_host.as_str();
        let port = tunnel.target_port;
        log::info!("[test] auto-testing '{}' at {host}:{port}", tunnel.name);

        let reachable = match self.api.test_connection(host, port).await {
            Ok(result) => result.success,
            Err(error) => {
                log::warn!("[test] auto-test for '{}' failed: {error}", tunnel.name);
                false
            }
        };

        if !self.cache.borrow().contains(&tunnel.id) {
            log::debug!("[test] '{}' is gone, dropping auto-test result", tunnel.name);
            return Outcome::Discarded;
        }

        if reachable {
            self.notify(
                Severity::Success,
                self.t("test.auto.success", &params([("name", tunnel.name.as_str())])),
            );
        } else {
            self.notify(
                Severity::Warning,
                self.t(
                    "test.auto.failure",
                    &params([
                        ("name", tunnel.name.clone()),
                        ("host", host.to_string()),
                        ("port", port.to_string()),
                    ]),
                ),
            );
        }
        Outcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::{
        config::ConsoleConfig,
        error::Failure,
        i18n::StringTable,
        overlay::{ClickTarget, Overlay},
        test_support::{FakeClient, ok_json, tunnel, tunnel_json},
    };
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    fn session(client: &Rc<FakeClient>) -> Session {
        Session::new(ConsoleConfig::default(), client.clone())
    }

    #[test]
    fn successful_test_fills_the_modal() {
        let client = Rc::new(FakeClient::new());
        client.respond_json(200, serde_json::json!({ "success": true, "log": "connected in 3ms" }));
        let session = session(&client);

        assert_eq!(block_on(session.test_connection("10.0.0.5", 5432)), Outcome::Applied);

        let overlays = session.overlays();
        let modal = overlays.test_modal().unwrap();
        assert_eq!(
            modal.phase,
            TestPhase::Succeeded {
                log: "connected in 3ms".into()
            }
        );
        assert_eq!(modal.phase.status_id(), Some("test.status.success"));
        assert!(overlays.scroll_locked());
        assert!(session.toasts().is_empty());
    }

    #[test]
    fn unreachable_target_is_a_failed_result() {
        let client = Rc::new(FakeClient::new());
        client.respond_json(200, serde_json::json!({ "success": false, "log": "timeout" }));
        client.fail("connection refused");
        let session = session(&client);

        block_on(session.test_connection("10.0.0.5", 5432));
        assert_eq!(
            session.overlays().test_modal().unwrap().phase,
            TestPhase::Failed {
                output: "timeout".into()
            }
        );

        assert_eq!(
            block_on(session.test_connection("10.0.0.5", 5432)),
            Outcome::Failed(Failure::Transport("connection refused".into()))
        );
        assert_eq!(
            session.overlays().test_modal().unwrap().phase,
            TestPhase::Failed {
                output: "connection refused".into()
            }
        );
    }

    #[test]
    fn modal_title_follows_phase() {
        let client = Rc::new(FakeClient::new());
        let session = session(&client);
        session.localizer().install(
            "en",
            StringTable::from([
                ("test.modal.testing".to_string(), "Testing {host}:{port}".to_string()),
                ("test.modal.result".to_string(), "Result for {host}:{port}".to_string()),
            ]),
        );
        let reply = client.defer();

        block_on(async {
            futures::join!(session.test_connection("db", 5432), async {
                let title = session
                    .overlays()
                    .test_modal()
                    .map(|modal| modal.title(session.localizer()));
                assert_eq!(title.as_deref(), Some("Testing db:5432"));
                let _ = reply.send(ok_json(serde_json::json!({ "success": true, "log": "" })));
            })
        });

        let overlays = session.overlays();
        let modal = overlays.test_modal().unwrap();
        assert_eq!(modal.title(session.localizer()), "Result for db:5432");
    }

    #[test]
    fn reopening_resets_to_loading() {
        let client = Rc::new(FakeClient::new());
        client.respond_json(200, serde_json::json!({ "success": false, "log": "refused" }));
        let session = session(&client);
        block_on(session.test_connection("a", 1));
        let reply = client.defer();

        block_on(async {
            futures::join!(session.test_connection("b", 2), async {
                let overlays = session.overlays();
                let modal = overlays.test_modal().unwrap();
                assert!(modal.phase.is_loading());
                assert_eq!((modal.host.as_str(), modal.port), ("b", 2));
                drop(overlays);
                let _ = reply.send(ok_json(serde_json::json!({ "success": true, "log": "" })));
            })
        });
    }

    #[test]
    fn closing_the_modal_discards_the_late_result() {
        let client = Rc::new(FakeClient::new());
        let session = session(&client);
        let reply = client.defer();

        let (outcome, ()) = block_on(async {
            futures::join!(session.test_connection("10.0.0.5", 5432), async {
                session.click_overlay(Overlay::TestResult, ClickTarget::Backdrop);
                let _ = reply.send(ok_json(serde_json::json!({ "success": true, "log": "late" })));
            })
        });

        assert_eq!(outcome, Outcome::Discarded);
        assert!(!session.overlays().is_visible(Overlay::TestResult));
        assert!(!session.overlays().scroll_locked());
        assert!(!session.is_busy(&Control::Test {
            host: "10.0.0.5".into(),
            port: 5432
        }));
    }

    #[test]
    fn auto_test_for_deleted_tunnel_is_silent() {
        let client = Rc::new(FakeClient::new());
        client.respond_json(200, serde_json::json!([tunnel_json(&tunnel("abc", "db", true))]));
        let session = session(&client);
        block_on(session.load_tunnels());
        let reply = client.defer();
        client.respond_no_content();

        let target = tunnel("abc", "db", true);
        let (outcome, ()) = block_on(async {
            futures::join!(session.auto_test(&target), async {
                assert_eq!(session.delete("abc", |_| true).await, Outcome::Applied);
                let _ = reply.send(ok_json(serde_json::json!({ "success": true, "log": "" })));
            })
        });

        assert_eq!(outcome, Outcome::Discarded);
        let toasts = session.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].message, "toast.tunnel.deleted");
    }

    #[test]
    fn auto_test_failure_names_the_target() {
        let client = Rc::new(FakeClient::new());
        client.respond_json(200, serde_json::json!([tunnel_json(&tunnel("abc", "db", true))]));
        client.respond_json(200, serde_json::json!({ "success": false, "log": "refused" }));
        let session = session(&client);
        session.localizer().install(
            "en",
            StringTable::from([(
                "test.auto.failure".to_string(),
                "{name} cannot reach {host}:{port}".to_string(),
            )]),
        );
        block_on(session.load_tunnels());

        assert_eq!(
            block_on(session.auto_test(&tunnel("abc", "db", true))),
            Outcome::Applied
        );
        let toasts = session.toasts();
        assert_eq!(toasts[0].severity, Severity::Warning);
        assert_eq!(toasts[0].message, "db cannot reach 10.0.0.5:5432");
        assert!(!session.overlays().is_visible(Overlay::TestResult));
    }
}

use std::{cell::RefCell, collections::HashSet};

use crate::{
    cache::Upsert,
    error::Failure,
    message::{LocalizedMessage, params},
    model::{Tunnel, TunnelInput, TunnelPatch, TunnelResponse},
    notify::Severity,
    overlay::EditForm,
    session::Session,
    validation::{ValidationError, validate},
};

/// A user-facing trigger that can have at most one request outstanding.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Control {
    Refresh,
    CreateSubmit,
    EditSubmit,
    Toggle(String),
    Delete(String),
    Test { host: String, port: u16 },
}

#[derive(Debug, Default)]
pub struct InFlight {
    held: RefCell<HashSet<Control>>,
}

impl InFlight {
    pub fn is_held(&self, control: &Control) -> bool {
        self.held.borrow().contains(control)
    }

    /// `None` while the control already has a request outstanding.
    pub fn acquire(&self, control: Control) -> Option<InFlightGuard<'_>> {
        if !self.held.borrow_mut().insert(control.clone()) {
            log::debug!("[lifecycle] {control:?} is busy, ignoring");
            return None;
        }
        Some(InFlightGuard {
            owner: self,
            control,
        })
    }
}

/// Releases its control when dropped, whichever way the lifecycle exits.
pub struct InFlightGuard<'a> {
    owner: &'a InFlight,
    control: Control,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.owner.held.borrow_mut().remove(&self.control);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Invalid(ValidationError),
    Failed(Failure),
    Busy,
    Declined,
    NotFound,
    Discarded,
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

impl Session {
    pub async fn load_tunnels(&self) -> Outcome {
        let Some(_guard) = self.in_flight.acquire(Control::Refresh) else {
            return Outcome::Busy;
        };

        match self.api.list_tunnels().await {
            Ok(tunnels) => {
                let mut cache = self.cache.borrow_mut();
                cache.replace_all(tunnels);
                log::info!("[tunnels] loaded {} tunnel(s)", cache.len());
                Outcome::Applied
            }
            Err(failure) => self.report_failure("toast.tunnel.loadFail", failure),
        }
    }

    pub async fn create(&self, input: &TunnelInput) -> Outcome {
        let fields = match validate(input) {
            Ok(fields) => fields,
            Err(error) => return self.reject(error),
        };

        let created = {
            let Some(_guard) = self.in_flight.acquire(Control::CreateSubmit) else {
                return Outcome::Busy;
            };
            log::info!(
                "[tunnels] creating '{}' {} -> {}:{}",
                fields.name,
                fields.local_port,
                fields.target_host,
                fields.target_port
            );
            match self.api.create_tunnel(&fields).await {
                Ok(response) => self.reconcile(response, "toast.tunnel.created"),
                Err(failure) => return self.report_failure("toast.tunnel.createFail", failure),
            }
        };

        if created.enabled {
            self.auto_test(&created).await;
        }
        Outcome::Applied
    }

    pub fn open_edit(&self, id: &str) -> bool {
        let Some(tunnel) = self.tunnel(id) else {
            return false;
        };
        self.overlays.borrow_mut().open_edit(EditForm {
            id: tunnel.id.clone(),
            input: TunnelInput::from_tunnel(&tunnel),
        });
        true
    }

    pub fn set_edit_input(&self, input: TunnelInput) -> bool {
        self.overlays.borrow_mut().set_edit_input(input)
    }

    /// Submits the open edit form; the modal closes only when the backend
    /// accepted the change and the same tunnel's form is still open.
    pub async fn submit_edit(&self) -> Outcome {
        let Some(form) = self.overlays.borrow().edit_form().cloned() else {
            return Outcome::NotFound;
        };
        let outcome = self.update(&form.id, &form.input).await;
        if outcome.is_applied() {
            self.overlays.borrow_mut().close_edit_of(&form.id);
        }
        outcome
    }

    pub async fn update(&self, id: &str, input: &TunnelInput) -> Outcome {
        let fields = match validate(input) {
            Ok(fields) => fields,
            Err(error) => return self.reject(error),
        };
        let Some(_guard) = self.in_flight.acquire(Control::EditSubmit) else {
            return Outcome::Busy;
        };

        log::info!("[tunnels] updating {id}");
        match self.api.update_tunnel(id, &TunnelPatch::from(fields)).await {
            Ok(response) => {
                self.reconcile(response, "toast.tunnel.updated");
                Outcome::Applied
            }
            Err(failure) => self.report_failure("toast.tunnel.updateFail", failure),
        }
    }

    /// Flips `enabled` with a single-field update; other fields are neither
    /// sent nor re-validated.
    pub async fn toggle(&self, id: &str) -> Outcome {
        let Some(current) = self.tunnel(id) else {
            return Outcome::NotFound;
        };
        let Some(_guard) = self.in_flight.acquire(Control::Toggle(id.to_string())) else {
            return Outcome::Busy;
        };

        let enabled = !current.enabled;
        log::info!("[tunnels] setting {id} enabled={enabled}");
        match self.api.update_tunnel(id, &TunnelPatch::enabled(enabled)).await {
            Ok(response) => {
                let notice = if response.tunnel.enabled {
                    "toast.tunnel.enabled"
                } else {
                    "toast.tunnel.disabled"
                };
                self.reconcile(response, notice);
                Outcome::Applied
            }
            Err(failure) => self.report_failure("toast.tunnel.toggleFail", failure),
        }
    }

    /// `confirm` receives the localized question and gates the whole
    /// lifecycle; declining has no side effects.
    pub async fn delete(&self, id: &str, confirm: impl FnOnce(&str) -> bool) -> Outcome {
        let name = self
            .tunnel(id)
            .map(|tunnel| tunnel.name)
            .unwrap_or_else(|| id.to_string());

        let question = self.t("confirm.delete", &params([("name", name.as_str())]));
        if !confirm(&question) {
            log::debug!("[tunnels] delete of {id} declined");
            return Outcome::Declined;
        }
        let Some(_guard) = self.in_flight.acquire(Control::Delete(id.to_string())) else {
            return Outcome::Busy;
        };

        log::info!("[tunnels] deleting {id}");
        match self.api.delete_tunnel(id).await {
            Ok(()) => {
                self.cache.borrow_mut().remove(id);
                self.notify(
                    Severity::Success,
                    self.t("toast.tunnel.deleted", &params([("name", name.as_str())])),
                );
                Outcome::Applied
            }
            Err(failure) => self.report_failure("toast.tunnel.deleteFail", failure),
        }
    }

    fn reconcile(&self, response: TunnelResponse, notice: &str) -> Tunnel {
        let TunnelResponse { tunnel, warning } = response;
        match self.cache.borrow_mut().upsert(tunnel.clone()) {
            Upsert::Inserted => log::debug!("[cache] inserted {}", tunnel.id),
            Upsert::Replaced(index) => log::debug!("[cache] replaced {} at {index}", tunnel.id),
        }
        self.notify(
            Severity::Success,
            self.t(notice, &params([("name", tunnel.name.as_str())])),
        );
        if let Some(warning) = warning {
            self.notify_warning(&warning);
        }
        tunnel
    }

    fn notify_warning(&self, warning: &LocalizedMessage) {
        let text = self.localizer.resolve_message(warning);
        self.notify(Severity::Warning, text);
    }

    fn reject(&self, error: ValidationError) -> Outcome {
        self.notify(Severity::Error, self.localizer.text(error.message_id()));
        Outcome::Invalid(error)
    }

    fn report_failure(&self, notice: &str, failure: Failure) -> Outcome {
        let error = failure.to_string();
        if let Some(status) = failure.status() {
            log::debug!("[tunnels] {notice} after HTTP {status}");
        }
        self.notify(
            Severity::Error,
            self.t(notice, &params([("error", error.as_str())])),
        );
        Outcome::Failed(failure)
    }
}

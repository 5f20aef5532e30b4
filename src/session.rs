use std::{
    cell::{Ref, RefCell},
    path::PathBuf,
    rc::Rc,
};

use chrono::Utc;

use crate::{
    api::ApiGateway,
    assets::AssetLoader,
    cache::TunnelCache,
    config::ConsoleConfig,
    http::HttpClient,
    i18n::{Localizer, detect_language},
    lifecycle::{Control, InFlight},
    message::{Params, params},
    model::{LanguageDescriptor, Suggestion, Tunnel, TunnelInput, TunnelStats},
    notify::{Severity, Toast, ToastQueue},
    overlay::{ClickTarget, Overlay, Overlays},
    preferences::Preferences,
};

/// Everything one running client owns: the tunnel cache, notices,
/// overlays, language state and the backend gateway. All of it lives on a
/// single thread and is only touched between suspension points.
pub struct Session {
    pub(crate) config: ConsoleConfig,
    pub(crate) api: ApiGateway,
    pub(crate) assets: AssetLoader,
    pub(crate) localizer: Rc<Localizer>,
    pub(crate) cache: RefCell<TunnelCache>,
    pub(crate) toasts: RefCell<ToastQueue>,
    pub(crate) overlays: RefCell<Overlays>,
    pub(crate) in_flight: InFlight,
    suggestions: RefCell<Vec<Suggestion>>,
    hostname: RefCell<String>,
    preferences: RefCell<Preferences>,
    preferences_path: Option<PathBuf>,
}

impl Session {
    pub fn new(config: ConsoleConfig, client: Rc<dyn HttpClient>) -> Self {
        let assets = AssetLoader::new(client.clone(), &config.server_url);
        let localizer = Rc::new(Localizer::new(assets.clone(), &config.default_language));
        let api = ApiGateway::new(client, &config.api_base(), localizer.clone());
        let toasts = ToastQueue::new(config.toast_lifetime());
        let hostname = config.fallback_hostname.clone();

        Self {
            config,
            api,
            assets,
            localizer,
            cache: RefCell::new(TunnelCache::default()),
            toasts: RefCell::new(toasts),
            overlays: RefCell::new(Overlays::default()),
            in_flight: InFlight::default(),
            suggestions: RefCell::new(Vec::new()),
            hostname: RefCell::new(hostname),
            preferences: RefCell::new(Preferences::default()),
            preferences_path: None,
        }
    }

    pub fn with_preferences(mut self, preferences: Preferences, path: Option<PathBuf>) -> Self {
        self.preferences = RefCell::new(preferences);
        self.preferences_path = path;
        self
    }

    /// Startup sequence: languages first so that every later notice is
    /// already translated, then config, suggestions and tunnels together.
    pub async fn init(&self, system_languages: &[String]) {
        self.localizer.load_index().await;

        let stored = self.preferences.borrow().language().map(str::to_string);
        let code = match stored {
            Some(code) if self.localizer.is_listed(&code) => code,
            _ => detect_language(
                system_languages,
                &self.localizer.languages(),
                &self.config.default_language,
            ),
        };
        self.set_language(&code).await;

        futures::join!(self.load_config(), self.load_suggestions(), self.load_tunnels());
    }

    pub async fn set_language(&self, code: &str) {
        match self.localizer.set_language(code).await {
            Ok(active) => {
                let mut preferences = self.preferences.borrow_mut();
                preferences.set_language(&active);
                if let Some(path) = &self.preferences_path {
                    preferences.save(path);
                }
            }
            Err(error) => {
                log::warn!("[session] no string table available, showing raw ids: {error}");
            }
        }
        self.overlays.borrow_mut().close_language_menu();
    }

    pub async fn load_config(&self) {
        match self.api.config().await {
            Ok(config) => {
                if let Some(hostname) = config.hostname.filter(|hostname| !hostname.is_empty()) {
                    log::info!("[config] server hostname: {hostname}");
                    *self.hostname.borrow_mut() = hostname;
                }
                if let Some(version) = config.version {
                    log::info!("[config] server version: {version}");
                }
            }
            Err(error) => log::warn!("[config] could not load config: {error}"),
        }
    }

    pub async fn load_suggestions(&self) {
        let suggestions = match self.assets.fetch::<Vec<Suggestion>>("/suggestions.json").await {
            Ok(suggestions) => suggestions,
            Err(error) => {
                log::warn!("[suggestions] could not load suggestions.json: {error}");
                Vec::new()
            }
        };
        *self.suggestions.borrow_mut() = suggestions;
    }

    pub fn localizer(&self) -> &Localizer {
        &self.localizer
    }

    pub fn t(&self, id: &str, values: &Params) -> String {
        self.localizer.resolve(id, values)
    }

    pub fn tunnels(&self) -> Vec<Tunnel> {
        self.cache.borrow().snapshot()
    }

    pub fn tunnel(&self, id: &str) -> Option<Tunnel> {
        self.cache.borrow().get(id).cloned()
    }

    pub fn stats(&self) -> TunnelStats {
        self.cache.borrow().stats()
    }

    pub fn connection_url(&self, tunnel: &Tunnel) -> Option<String> {
        if let Some(url) = &tunnel.connection_url {
            return Some(url.clone());
        }
        tunnel
            .enabled
            .then(|| format!("{}:{}", self.hostname.borrow(), tunnel.local_port))
    }

    pub fn warning_text(&self, tunnel: &Tunnel) -> Option<String> {
        let id = tunnel.warning_id.as_deref()?;
        Some(self.t(
            id,
            &params([
                ("host", tunnel.target_host.clone()),
                ("port", tunnel.target_port.to_string()),
            ]),
        ))
    }

    pub fn suggestions(&self) -> Vec<Suggestion> {
        self.suggestions.borrow().clone()
    }

    pub fn show_suggestions(&self) -> bool {
        !self.suggestions.borrow().is_empty()
    }

    /// Pre-fills a create form from a suggestion; the local port starts out
    /// equal to the target port.
    pub fn apply_suggestion(&self, index: usize) -> Option<TunnelInput> {
        let suggestion = self.suggestions.borrow().get(index).cloned()?;
        self.notify(
            Severity::Info,
            self.t(
                "toast.suggestion.applied",
                &params([("name", suggestion.name.as_str())]),
            ),
        );
        Some(TunnelInput {
            name: suggestion.name,
            local_port: Some(i64::from(suggestion.target_port)),
            target_host: suggestion.target_host,
            target_port: Some(i64::from(suggestion.target_port)),
            enabled: true,
        })
    }

    pub fn languages(&self) -> Vec<LanguageDescriptor> {
        self.localizer.languages()
    }

    pub fn current_language(&self) -> Option<LanguageDescriptor> {
        self.localizer.current_descriptor()
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences.borrow().clone()
    }

    /// Notices still on screen; expired ones are never returned.
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.borrow().visible(Utc::now())
    }

    pub fn overlays(&self) -> Ref<'_, Overlays> {
        self.overlays.borrow()
    }

    pub fn close_overlay(&self, overlay: Overlay) {
        self.overlays.borrow_mut().close(overlay);
    }

    pub fn click_overlay(&self, overlay: Overlay, target: ClickTarget) {
        self.overlays.borrow_mut().click(overlay, target);
    }

    pub fn toggle_language_menu(&self) {
        self.overlays.borrow_mut().toggle_language_menu();
    }

    pub fn escape(&self) {
        self.overlays.borrow_mut().escape();
    }

    pub fn is_busy(&self, control: &Control) -> bool {
        self.in_flight.is_held(control)
    }

    pub(crate) fn notify(&self, severity: Severity, message: String) {
        match severity {
            Severity::Success | Severity::Info => log::info!("[notice] {message}"),
            Severity::Warning | Severity::Error => log::warn!("[notice] {message}"),
        }
        self.toasts.borrow_mut().push(severity, message);
    }
}

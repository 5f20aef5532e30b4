use std::{cell::RefCell, collections::HashMap};

use serde::Deserialize;

use crate::{
    assets::AssetLoader,
    error::Failure,
    message::{LocalizedMessage, Params},
    model::LanguageDescriptor,
};

pub type StringTable = HashMap<String, String>;

#[derive(Deserialize)]
struct LanguageIndex {
    #[serde(default)]
    languages: Vec<LanguageDescriptor>,
}

struct LocaleState {
    languages: Vec<LanguageDescriptor>,
    current: String,
    strings: StringTable,
}

/// Resolves message ids against the active string table. Lookups never
/// fail: an unknown id comes back verbatim.
pub struct Localizer {
    assets: AssetLoader,
    default_language: String,
    state: RefCell<LocaleState>,
}

impl Localizer {
    pub fn new(assets: AssetLoader, default_language: &str) -> Self {
        Self {
            assets,
            default_language: default_language.to_string(),
            state: RefCell::new(LocaleState {
                languages: vec![LanguageDescriptor::english()],
                current: default_language.to_string(),
                strings: StringTable::new(),
            }),
        }
    }

    pub fn resolve(&self, id: &str, params: &Params) -> String {
        let state = self.state.borrow();
        let template = state
            .strings
            .get(id)
            .filter(|text| !text.is_empty())
            .map(String::as_str)
            .unwrap_or(id);
        interpolate(template, params)
    }

    pub fn text(&self, id: &str) -> String {
        self.resolve(id, &Params::new())
    }

    pub fn resolve_message(&self, message: &LocalizedMessage) -> String {
        match message {
            LocalizedMessage::Plain(text) => text.clone(),
            LocalizedMessage::Localized { id, params } => self.resolve(id, params),
        }
    }

    pub fn current_language(&self) -> String {
        self.state.borrow().current.clone()
    }

    pub fn current_descriptor(&self) -> Option<LanguageDescriptor> {
        let state = self.state.borrow();
        state
            .languages
            .iter()
            .find(|language| language.code == state.current)
            .cloned()
    }

    pub fn languages(&self) -> Vec<LanguageDescriptor> {
        self.state.borrow().languages.clone()
    }

    pub fn is_listed(&self, code: &str) -> bool {
        self.state
            .borrow()
            .languages
            .iter()
            .any(|language| language.code == code)
    }

    pub fn install(&self, code: &str, strings: StringTable) {
        let mut state = self.state.borrow_mut();
        state.current = code.to_string();
        state.strings = strings;
    }

    pub async fn load_index(&self) {
        let languages = match self.assets.fetch::<LanguageIndex>("/i18n/index.json").await {
            Ok(index) => index.languages,
            Err(error) => {
                log::warn!("[i18n] could not load language index: {error}");
                vec![LanguageDescriptor::english()]
            }
        };
        log::info!("[i18n] {} language(s) available", languages.len());
        self.state.borrow_mut().languages = languages;
    }

    /// Loads `code`, retrying once with the default language. On success
    /// returns the code that is now active; if both loads fail the table is
    /// emptied and lookups pass ids through.
    pub async fn set_language(&self, code: &str) -> Result<String, Failure> {
        match self.fetch_table(code).await {
            Ok(strings) => {
                self.install(code, strings);
                log::info!("[i18n] active language: {code}");
                return Ok(code.to_string());
            }
            Err(error) => {
                log::warn!(
                    "[i18n] could not load {code}, falling back to {}: {error}",
                    self.default_language
                );
                if code == self.default_language {
                    self.state.borrow_mut().strings.clear();
                    return Err(error);
                }
            }
        }

        let fallback = self.default_language.clone();
        match self.fetch_table(&fallback).await {
            Ok(strings) => {
                self.install(&fallback, strings);
                log::info!("[i18n] active language: {fallback}");
                Ok(fallback)
            }
            Err(error) => {
                log::warn!("[i18n] could not load {fallback}: {error}");
                self.state.borrow_mut().strings.clear();
                Err(error)
            }
        }
    }

    async fn fetch_table(&self, code: &str) -> Result<StringTable, Failure> {
        self.assets.fetch(&format!("/i18n/{code}.json")).await
    }
}

/// Replaces each `{name}` with its parameter in a single left-to-right
/// pass. Unknown placeholders and substituted text are left as they are.
pub fn interpolate(template: &str, params: &Params) -> String {
    if params.is_empty() {
        return template.to_string();
    }

    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if !after[..close].contains('{') => {
                let name = &after[..close];
                match params.get(name) {
                    Some(value) => output.push_str(value),
                    None => {
                        output.push('{');
                        output.push_str(name);
                        output.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                output.push('{');
                rest = after;
            }
        }
    }
    output.push_str(rest);
    output
}

/// Picks the first listed language matching the preferred list, exactly
/// first and then by primary subtag.
pub fn detect_language(
    preferred: &[String],
    languages: &[LanguageDescriptor],
    default_language: &str,
) -> String {
    for wanted in preferred {
        let wanted_lower = wanted.to_lowercase();
        if let Some(exact) = languages
            .iter()
            .find(|language| language.code.to_lowercase() == wanted_lower)
        {
            return exact.code.clone();
        }

        let prefix = wanted_lower.split('-').next().unwrap_or_default();
        if prefix.is_empty() {
            continue;
        }
        if let Some(partial) = languages
            .iter()
            .find(|language| language.code.to_lowercase().starts_with(prefix))
        {
            return partial.code.clone();
        }
    }
    default_language.to_string()
}

/// Preferred languages from the POSIX locale environment, most specific
/// source first.
pub fn system_languages() -> Vec<String> {
    let mut languages = Vec::new();
    if let Ok(list) = std::env::var("LANGUAGE") {
        languages.extend(list.split(':').filter_map(normalize_locale));
    }
    for variable in ["LC_ALL", "LC_MESSAGES", "LANG"] {
        if let Ok(value) = std::env::var(variable)
            && let Some(language) = normalize_locale(&value)
            && !languages.contains(&language)
        {
            languages.push(language);
        }
    }
    languages
}

/// `de_DE.UTF-8@euro` → `de-DE`; `C` and `POSIX` carry no language.
pub fn normalize_locale(value: &str) -> Option<String> {
    let base = value
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}

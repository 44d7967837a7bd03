//! Persisted user selections: UI language and display currency.
//!
//! # Design
//! Both services are constructed once at startup and passed to whoever needs
//! them. Each restores its value from a `PreferenceStore` under a fixed key,
//! falls back to a default when the stored value is missing or no longer
//! valid, and publishes changes on a `StateStream`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::config::PreferencesConfig;
use crate::error::PreferenceError;
use crate::repository::FlightRepository;
use crate::stream::{StateStream, Subscription, TeardownSignal};
use crate::types::Currency;

pub const LANGUAGE_KEY: &str = "selected-language";
pub const CURRENCY_KEY: &str = "selectedCurrency";

pub const SUPPORTED_LANGUAGES: [&str; 2] = ["es", "en"];

/// Key/value persistence for small string settings.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Values,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

type Values = Mutex<BTreeMap<String, String>>;

/// Every write is a single insert, so a poisoned map is still consistent.
fn entries(values: &Values) -> MutexGuard<'_, BTreeMap<String, String>> {
    values.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        entries(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        entries(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A flat JSON object on disk, rewritten on every `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Values,
}

impl FileStore {
    /// A missing file starts empty; a malformed one is an error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PreferenceError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        entries(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let snapshot = {
            let mut values = entries(&self.values);
            values.insert(key.to_string(), value.to_string());
            values.clone()
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&snapshot)?)?;
        Ok(())
    }
}

/// Open the store named by the configuration, in memory when no path is set.
pub fn open_store(config: &PreferencesConfig) -> Result<Arc<dyn PreferenceStore>, PreferenceError> {
    match &config.path {
        Some(path) => Ok(Arc::new(FileStore::open(path)?)),
        None => Ok(Arc::new(MemoryStore::new())),
    }
}

pub struct LanguageService {
    store: Arc<dyn PreferenceStore>,
    current: StateStream<String>,
}

impl LanguageService {
    pub fn new(store: Arc<dyn PreferenceStore>, default_language: &str) -> Self {
        let fallback = if is_supported_language(default_language) {
            default_language
        } else {
            SUPPORTED_LANGUAGES[0]
        };
        let restored = store
            .get(LANGUAGE_KEY)
            .filter(|saved| is_supported_language(saved))
            .unwrap_or_else(|| fallback.to_string());
        debug!(language = %restored, "language restored");
        Self {
            store,
            current: StateStream::new(restored),
        }
    }

    pub fn current(&self) -> String {
        self.current.current()
    }

    /// Unsupported codes are ignored and return `Ok(false)`.
    pub fn set_language(&self, code: &str) -> Result<bool, PreferenceError> {
        if !is_supported_language(code) {
            warn!(code, "ignoring unsupported language");
            return Ok(false);
        }
        self.store.set(LANGUAGE_KEY, code)?;
        self.current.publish(code.to_string());
        Ok(true)
    }

    pub fn watch(&self, signal: &TeardownSignal) -> Subscription<String> {
        self.current.subscribe(signal)
    }
}

pub fn is_supported_language(code: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&code)
}

pub struct CurrencyService {
    store: Arc<dyn PreferenceStore>,
    currencies: Vec<Currency>,
    selected: StateStream<String>,
}

impl CurrencyService {
    /// Load the currency list and restore the saved selection.
    pub fn load(
        repo: &dyn FlightRepository,
        store: Arc<dyn PreferenceStore>,
        default_currency: &str,
    ) -> Self {
        let mut currencies = repo.get_currencies();
        if currencies.is_empty() {
            warn!("currency list unavailable, using built-in fallback");
            currencies = fallback_currencies();
        }
        let selected = initial_selection(&currencies, store.get(CURRENCY_KEY), default_currency);
        debug!(currency = %selected, "currency restored");
        Self {
            store,
            currencies,
            selected: StateStream::new(selected),
        }
    }

    pub fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    pub fn selected(&self) -> String {
        self.selected.current()
    }

    pub fn selected_currency(&self) -> Option<&Currency> {
        let code = self.selected();
        self.currencies.iter().find(|c| c.name == code)
    }

    /// Only codes present in the loaded list are accepted.
    pub fn set_currency(&self, code: &str) -> Result<bool, PreferenceError> {
        if !self.currencies.iter().any(|c| c.name == code) {
            warn!(code, "ignoring unknown currency");
            return Ok(false);
        }
        self.store.set(CURRENCY_KEY, code)?;
        self.selected.publish(code.to_string());
        Ok(true)
    }

    pub fn watch(&self, signal: &TeardownSignal) -> Subscription<String> {
        self.selected.subscribe(signal)
    }
}

fn initial_selection(currencies: &[Currency], saved: Option<String>, default: &str) -> String {
    let listed = |code: &str| currencies.iter().any(|c| c.name == code);
    match saved {
        Some(code) if listed(&code) => code,
        _ if listed(default) => default.to_string(),
        _ => currencies
            .first()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| default.to_string()),
    }
}

fn fallback_currencies() -> Vec<Currency> {
    [("USD", "$"), ("EUR", "€"), ("COP", "$")]
        .iter()
        .zip(1..)
        .map(|((name, symbol), id)| Currency {
            id,
            name: (*name).to_string(),
            symbol: (*symbol).to_string(),
        })
        .collect()
}

//! # Provider Adapters
//!
//! One adapter per data source (weather, crypto ticker, local sensors).
//! Each adapter builds a request from its service configuration, parses the
//! response, runs every configured field through the value extractor, and
//! returns a flat field mapping, or `None` when the source produced nothing
//! usable. Transport failures and malformed payloads are logged and mapped
//! to `None`; a per-field failure only omits that field. Partial success is
//! expected and normal.

pub mod crypto;
pub mod sensors;
pub mod weather;

use crate::{
    config::{Config, FieldSpec},
    extract, Category, FieldMap,
};
use reqwest::Client;
use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Per-request timeout. No retries: a slow or dead provider simply yields
/// no data for this run and defers to the cache.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw per-category fetch results for one pass. `None` means the whole
/// fetch failed (as opposed to an empty-but-successful mapping).
#[derive(Debug, Default)]
pub struct Fetched {
    pub weather: Option<FieldMap>,
    pub crypto: Option<FieldMap>,
    pub sensors: Option<FieldMap>,
}

impl Fetched {
    pub fn get(&self, category: Category) -> Option<&FieldMap> {
        match category {
            Category::Weather => self.weather.as_ref(),
            Category::Crypto => self.crypto.as_ref(),
            Category::Sensors => self.sensors.as_ref(),
        }
    }
}

/// Fetch every configured provider, sequentially.
///
/// Providers run one after another on purpose: one pass per invocation,
/// no shared state, and a slow provider only costs its own timeout.
pub async fn fetch_all(config: &Config) -> Fetched {
    let client = match Client::builder().timeout(FETCH_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            log::error!("failed to build HTTP client: {}", e);
            return Fetched::default();
        }
    };

    log::info!("loading data from all sources");
    Fetched {
        weather: weather::fetch(&client, config).await,
        crypto: crypto::fetch(&client, config).await,
        sensors: sensors::fetch_all_sensors(&client, config).await,
    }
}

/// Substitute environment variables into a templated parameter value.
///
/// Recognized forms are `env.NAME` and `${NAME}`; an unset variable falls
/// back to the literal template text so a missing key is visible in logs
/// rather than silently blank.
pub(crate) fn resolve_param(value: &str) -> String {
    if let Some(name) = value.strip_prefix("env.") {
        return env::var(name).unwrap_or_else(|_| value.to_string());
    }
    if value.starts_with("${") && value.ends_with('}') && value.len() > 3 {
        let name = &value[2..value.len() - 1];
        return env::var(name).unwrap_or_else(|_| value.to_string());
    }
    value.to_string()
}

/// Resolved query parameters for a service request.
pub(crate) fn resolved_params(params: &HashMap<String, String>) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(key, value)| (key.clone(), resolve_param(value)))
        .collect()
}

/// Run every configured field spec against a JSON document. Extraction
/// failures are warned about and the field omitted; they never fail the
/// enclosing fetch.
pub(crate) fn extract_fields(
    doc: &serde_json::Value,
    fields: &HashMap<String, FieldSpec>,
    source: &str,
) -> FieldMap {
    let mut out = FieldMap::new();
    for (name, spec) in fields {
        match extract::extract_field(doc, name, spec) {
            Ok(value) => {
                out.insert(name.clone(), value);
            }
            Err(e) => {
                log::warn!("{}: failed to extract {}: {}", source, name, e);
            }
        }
    }
    out
}

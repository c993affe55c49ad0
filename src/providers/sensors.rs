//! Local sensor adapter. Sensor endpoints answer either with a single
//! `key:value;key:value` text line or with JSON; every configured service
//! whose key starts with `sensors` is fetched and the results merged into
//! one category mapping.

use super::{extract_fields, resolved_params};
use crate::{
    config::{Config, FieldSpec, ResponseType, ServiceConfig},
    extract, FieldMap,
};
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;

/// Fetch and merge every configured sensor service.
///
/// Returns `None` only when no sensor service produced data at all; a
/// single dead endpoint just thins the mapping.
pub async fn fetch_all_sensors(client: &Client, config: &Config) -> Option<FieldMap> {
    let services = config.sensor_services();
    if services.is_empty() {
        log::debug!("no sensor services configured");
        return None;
    }

    let mut merged = FieldMap::new();
    let mut any_success = false;
    for (key, service) in services {
        if let Some(fields) = fetch_one(client, key, service).await {
            any_success = true;
            merged.extend(fields);
        }
    }

    if any_success {
        log::info!("sensors: received {} fields", merged.len());
        Some(merged)
    } else {
        None
    }
}

async fn fetch_one(client: &Client, key: &str, service: &ServiceConfig) -> Option<FieldMap> {
    let params = resolved_params(&service.params);
    let response = client.get(&service.url).query(&params).send().await;
    let response = match response.and_then(|r| r.error_for_status()) {
        Ok(response) => response,
        Err(e) => {
            log::error!("{}: fetch failed: {}", key, e);
            return None;
        }
    };

    // Sensor endpoints historically speak the text line format.
    match service.response_type.unwrap_or(ResponseType::Text) {
        ResponseType::Text => match response.text().await {
            Ok(body) => Some(parse_text(&body, &service.data, key)),
            Err(e) => {
                log::error!("{}: failed to read body: {}", key, e);
                None
            }
        },
        ResponseType::Json => match response.json::<Value>().await {
            Ok(doc) => Some(extract_fields(&doc, &service.data, key)),
            Err(e) => {
                log::error!("{}: malformed payload: {}", key, e);
                None
            }
        },
    }
}

/// Split a `key1:value1;key2:value2` line into raw string pairs.
pub fn parse_text_line(text: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for pair in text.trim().split(';') {
        if let Some((key, value)) = pair.split_once(':') {
            out.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    out
}

/// Extract the configured fields from a text line response. Keys present
/// in the response but not in the configuration are ignored; a configured
/// field missing from the response, or one that fails coercion, is
/// omitted.
pub fn parse_text(body: &str, fields: &HashMap<String, FieldSpec>, source: &str) -> FieldMap {
    let parsed = parse_text_line(body);

    let mut out = FieldMap::new();
    for (name, spec) in fields {
        let path = spec.path.as_deref().unwrap_or(name);
        let Some(raw) = parsed.get(path) else {
            log::debug!("{}: {} absent from response", source, name);
            continue;
        };
        match extract::coerce(&Value::String(raw.clone()), spec) {
            Ok(value) => {
                out.insert(name.clone(), value);
            }
            Err(e) => {
                log::warn!("{}: failed to coerce {}: {}", source, name, e);
            }
        }
    }
    out
}

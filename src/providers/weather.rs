//! Weather adapter: a single JSON endpoint (OpenWeatherMap-shaped) with
//! per-field dotted-path extraction rules from the configuration.

use super::{extract_fields, resolved_params};
use crate::{config::Config, FieldMap};
use reqwest::Client;
use serde_json::Value;

/// Fetch and extract the configured weather fields.
///
/// Returns `None` on transport failure, a non-2xx status, or a malformed
/// top-level payload; individual field failures only omit those fields.
pub async fn fetch(client: &Client, config: &Config) -> Option<FieldMap> {
    let service = match config.weather_service() {
        Some(service) => service,
        None => {
            log::debug!("no weather service configured");
            return None;
        }
    };

    let params = resolved_params(&service.params);
    let response = client.get(&service.url).query(&params).send().await;
    let doc: Value = match response.and_then(|r| r.error_for_status()) {
        Ok(response) => match response.json().await {
            Ok(doc) => doc,
            Err(e) => {
                log::error!("weather: malformed payload: {}", e);
                return None;
            }
        },
        Err(e) => {
            log::error!("weather: fetch failed: {}", e);
            return None;
        }
    };

    let fields = extract_fields(&doc, &service.data, "weather");
    log::info!("weather: received {} fields", fields.len());
    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldSpec, ValueType};
    use crate::FieldValue;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn configured_fields_are_extracted_and_typed() {
        let doc = json!({
            "main": { "temp": 21.54, "humidity": 68 },
            "wind": { "deg": 270 },
            "weather": [ { "description": "overcast clouds" } ],
            "sys": { "sunrise": 1700000000i64, "sunset": 1700040000i64 }
        });

        let mut fields = HashMap::new();
        fields.insert(
            "temp".to_string(),
            FieldSpec {
                path: Some("main.temp".to_string()),
                value_type: ValueType::Float,
                round: Some(1),
            },
        );
        fields.insert(
            "description".to_string(),
            FieldSpec {
                path: Some("weather[0].description".to_string()),
                ..Default::default()
            },
        );
        fields.insert(
            "sunrise".to_string(),
            FieldSpec {
                path: Some("sys.sunrise".to_string()),
                value_type: ValueType::Int,
                round: None,
            },
        );

        let out = extract_fields(&doc, &fields, "weather");
        assert_eq!(out["temp"], FieldValue::Float(21.5));
        assert_eq!(
            out["description"],
            FieldValue::Text("overcast clouds".into())
        );
        assert_eq!(out["sunrise"], FieldValue::Int(1700000000));
    }
}

//! Crypto ticker adapter (KuCoin `allTickers`-shaped): filters the
//! top-level ticker list down to the configured trading pairs and, besides
//! each pair's configured price field, always captures `change_rate` and
//! `change_price` as numbers for downstream colour-coding.

use crate::{
    config::{Config, ServiceConfig},
    extract, FieldMap, FieldValue,
};
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;

/// Fetch the ticker list and reduce it to the configured pairs.
pub async fn fetch(client: &Client, config: &Config) -> Option<FieldMap> {
    let service = match config.crypto_service() {
        Some(service) => service,
        None => {
            log::debug!("no crypto service configured");
            return None;
        }
    };

    let response = client.get(&service.url).send().await;
    let doc: Value = match response.and_then(|r| r.error_for_status()) {
        Ok(response) => match response.json().await {
            Ok(doc) => doc,
            Err(e) => {
                log::error!("crypto: malformed payload: {}", e);
                return None;
            }
        },
        Err(e) => {
            log::error!("crypto: fetch failed: {}", e);
            return None;
        }
    };

    parse(&doc, service)
}

/// Reduce a ticker payload to the configured pairs.
///
/// The exchange wraps errors in a 2xx response with a non-`200000` code, so
/// that is checked before anything else. Each kept pair contributes its
/// price under the pair name plus flattened `<pair>.change_rate` and
/// `<pair>.change_price` numbers (absent change data counts as zero, the
/// exchange omits it for quiet markets).
pub fn parse(doc: &Value, service: &ServiceConfig) -> Option<FieldMap> {
    let code = doc.get("code").and_then(Value::as_str);
    if code != Some("200000") {
        let msg = doc
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        log::error!("crypto: API error: {}", msg);
        return None;
    }

    let tickers = match doc.pointer("/data/ticker").and_then(Value::as_array) {
        Some(tickers) => tickers,
        None => {
            log::error!("crypto: payload has no data.ticker list");
            return None;
        }
    };

    let by_symbol: HashMap<&str, &Value> = tickers
        .iter()
        .filter_map(|t| t.get("symbol").and_then(Value::as_str).map(|s| (s, t)))
        .collect();

    let mut out = FieldMap::new();
    for pair in &service.pairs {
        let Some(ticker) = by_symbol.get(pair.as_str()) else {
            log::warn!("crypto: pair {} absent from ticker list", pair);
            continue;
        };

        let spec = service.data.get(pair).cloned().unwrap_or_default();
        let path = spec.path.clone().unwrap_or_else(|| "last".to_string());
        match extract::extract(ticker, &path).and_then(|raw| extract::coerce(raw, &spec)) {
            Ok(price) => {
                out.insert(pair.clone(), price);
            }
            Err(e) => {
                log::warn!("crypto: failed to extract {}: {}", pair, e);
                continue;
            }
        }

        out.insert(
            format!("{}.change_rate", pair),
            FieldValue::Float(change_number(ticker, "changeRate")),
        );
        out.insert(
            format!("{}.change_price", pair),
            FieldValue::Float(change_number(ticker, "changePrice")),
        );
    }

    log::info!("crypto: kept {} of {} pairs", out.len() / 3, service.pairs.len());
    Some(out)
}

fn change_number(ticker: &Value, key: &str) -> f64 {
    match ticker.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

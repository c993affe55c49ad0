//! # E-Paper Dashboard Core Library
//!
//! This library implements the data-freshness and rendering pipeline for a
//! small colour e-paper status dashboard (clock, weather, crypto tickers,
//! local sensors). It is designed for a single pass per invocation on
//! Pi-class hardware: fetch every configured provider once, merge the
//! results with the last persisted snapshot, and compose one frame.
//!
//! ## Data Flow
//!
//! 1. **Configure**: [`config::Config`] is loaded once from a JSON document
//!    and stays immutable for the run.
//! 2. **Fetch**: the [`providers`] adapters pull weather, ticker and sensor
//!    data; a failed fetch yields "no data", never an abort.
//! 3. **Reconcile**: [`freshness`] merges fresh values with the persisted
//!    [`cache`] snapshot field by field, flagging every cache-sourced value
//!    as stale.
//! 4. **Render**: [`layout`] walks the declarative line/item description and
//!    draws into a [`frame::Frame`], which is handed to a [`display::Epd`]
//!    driver.
//!
//! Every category degrades independently: a dead provider shows cached
//! values in the stale colour, a field with no history shows `N/A`. Only a
//! configuration error blanks the whole run.

use serde::{Deserialize, Serialize};

// Module declarations
pub mod cache;
pub mod config;
pub mod display;
pub mod epd2in15g;
pub mod extract;
pub mod frame;
pub mod freshness;
pub mod layout;
pub mod providers;

use std::collections::HashMap;
use std::fmt;

/// Flat mapping from field name to value within one category.
pub type FieldMap = HashMap<String, FieldValue>;

/// Per-field staleness flags: `true` means the value came from cache.
pub type AgeMap = HashMap<String, bool>;

/// A data domain shown on the dashboard.
///
/// The set is fixed for dispatch purposes, but cache snapshots are keyed by
/// the string names so a hand-edited cache with foreign keys still loads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Weather,
    Crypto,
    Sensors,
}

impl Category {
    /// All categories, in fetch order.
    pub const ALL: [Category; 3] = [Category::Weather, Category::Crypto, Category::Sensors];

    /// Snapshot / configuration key for this category.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Weather => "weather",
            Category::Crypto => "crypto",
            Category::Sensors => "sensors",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single scalar value attached to a dashboard field.
///
/// Values round-trip through JSON untagged: numbers with a fractional part
/// become [`FieldValue::Float`], whole JSON integers become
/// [`FieldValue::Int`], everything else is text.
///
/// # Example
/// ```
/// use epd_dashboard::FieldValue;
///
/// assert!(FieldValue::Float(21.5).is_valid());
/// assert!(!FieldValue::Text("ERR".into()).is_valid());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Whether this value is showable data.
    ///
    /// Sentinel strings (`"ERR"`, `"N/A"`) and blank text are syntactically
    /// present but semantically invalid; they must never be rendered as data
    /// or written into the cache snapshot.
    pub fn is_valid(&self) -> bool {
        match self {
            FieldValue::Int(_) | FieldValue::Float(_) => true,
            FieldValue::Text(s) => {
                let t = s.trim();
                !t.is_empty() && t != "ERR" && t != "N/A"
            }
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Integer view of the value, truncating floats.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            FieldValue::Float(f) => Some(*f as i64),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        }
    }
}

/// The four-colour palette of the supported panels.
///
/// Doubles as the pixel colour of [`frame::Frame`]; the stale-data colour
/// and per-item colour choices in the configuration name these variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Colour {
    Black,
    White,
    Red,
    Yellow,
}

impl Colour {
    /// Parse a configuration colour name. Unknown names map to black, the
    /// same lenient default the display colour table has always had.
    pub fn from_name(name: &str) -> Colour {
        match name.trim().to_ascii_uppercase().as_str() {
            "WHITE" => Colour::White,
            "RED" => Colour::Red,
            "YELLOW" => Colour::Yellow,
            _ => Colour::Black,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_values_are_invalid() {
        assert!(!FieldValue::Text("".into()).is_valid());
        assert!(!FieldValue::Text("   ".into()).is_valid());
        assert!(!FieldValue::Text("ERR".into()).is_valid());
        assert!(!FieldValue::Text(" N/A ".into()).is_valid());
        assert!(FieldValue::Text("21.5".into()).is_valid());
        assert!(FieldValue::Int(0).is_valid());
        assert!(FieldValue::Float(0.0).is_valid());
    }

    #[test]
    fn untagged_json_roundtrip_keeps_variants() {
        let v: FieldValue = serde_json::from_str("21.5").unwrap();
        assert_eq!(v, FieldValue::Float(21.5));
        let v: FieldValue = serde_json::from_str("1013").unwrap();
        assert_eq!(v, FieldValue::Int(1013));
        let v: FieldValue = serde_json::from_str("\"ERR\"").unwrap();
        assert_eq!(v, FieldValue::Text("ERR".into()));
    }

    #[test]
    fn numeric_views() {
        assert_eq!(FieldValue::Text("42.5".into()).as_f64(), Some(42.5));
        assert_eq!(FieldValue::Float(42.9).as_i64(), Some(42));
        assert_eq!(FieldValue::Text("abc".into()).as_f64(), None);
    }

    #[test]
    fn colour_names_parse_leniently() {
        assert_eq!(Colour::from_name("yellow"), Colour::Yellow);
        assert_eq!(Colour::from_name(" RED "), Colour::Red);
        assert_eq!(Colour::from_name("mauve"), Colour::Black);
    }
}

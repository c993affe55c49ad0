//! # Declarative Layout Rendering
//!
//! Interprets the `dashboard.lines` description: a vertical cursor walks
//! the lines, a horizontal cursor walks each line's items, and every item
//! resolves to a formatted text run drawn in a font and colour chosen from
//! the configuration. Staleness drives colour: any field whose value came
//! from cache renders in the dashboard-wide stale colour, overriding the
//! item's own choice.
//!
//! Item types form a closed vocabulary: `datetime` (always live),
//! `sunrise`/`sunset` (epoch timestamps from the weather category),
//! `wind_direction` (degrees mapped to an 8-way compass label), any
//! configured weather or sensor field, and any configured crypto pair
//! (currency-prefixed, alternate colour on negative change).

use crate::{
    config::{Config, ConfigError, ItemConfig},
    display,
    frame::Frame,
    freshness::DashboardData,
    Category, Colour, FieldValue,
};
use chrono::{DateTime, Local, TimeZone};
use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10, FONT_7X13, FONT_9X15, FONT_9X18},
        MonoFont, MonoTextStyle,
    },
    prelude::*,
    text::{Baseline, Text},
};

/// Rows reserved at the bottom of the addressable area; no line may start
/// below it.
const BOTTOM_MARGIN: i32 = 30;

/// 8-way compass labels, index = `round(degrees / 45) mod 8`.
const COMPASS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

const DEFAULT_FONT: &str = "font18";
const DEFAULT_FONT_SIZE: u32 = 18;
const DEFAULT_DATETIME_FORMAT: &str = "%a - %d %b - %H:%M";
const DEFAULT_SUN_FORMAT: &str = "%H:%M";

/// The closed set of item types, resolved from the configured identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    /// Current date/time from the local clock; never stale.
    Datetime,
    Sunrise,
    Sunset,
    /// Weather `wind_deg` mapped to a compass label.
    WindDirection,
    Weather(String),
    Crypto(String),
    Sensor(String),
}

impl ItemKind {
    /// Classify a raw item type string against the configuration: the
    /// special identifiers first, then configured crypto pairs, then
    /// configured weather fields, and sensors as the default category.
    pub fn resolve(raw: &str, config: &Config) -> ItemKind {
        match raw {
            "datetime" => ItemKind::Datetime,
            "sunrise" => ItemKind::Sunrise,
            "sunset" => ItemKind::Sunset,
            "wind_direction" => ItemKind::WindDirection,
            _ => {
                if config
                    .crypto_service()
                    .is_some_and(|s| s.pairs.iter().any(|p| p == raw))
                {
                    ItemKind::Crypto(raw.to_string())
                } else if config
                    .weather_service()
                    .is_some_and(|s| s.data.contains_key(raw))
                {
                    ItemKind::Weather(raw.to_string())
                } else {
                    ItemKind::Sensor(raw.to_string())
                }
            }
        }
    }
}

/// Map wind degrees to one of the 8 compass labels. Rounds half up, so
/// 22.5° already reads as NE, and wraps (360° is N again).
pub fn wind_direction(degrees: f64) -> &'static str {
    let index = ((degrees / 45.0) + 0.5).floor() as i64;
    COMPASS[index.rem_euclid(8) as usize]
}

/// One text run ready to draw: what to say and in which colour.
struct Resolved {
    text: String,
    colour: Colour,
}

/// Layout renderer for one configuration.
///
/// Holds the logical drawing dimensions (native panel size, transposed
/// when a 90°/270° rotation is configured) and walks the line/item
/// description each [`render`](Renderer::render) call.
pub struct Renderer<'a> {
    config: &'a Config,
    width: u32,
    height: u32,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a Config) -> Result<Self, ConfigError> {
        let (native_w, native_h) = display::native_size(&config.display.epd_display_type)
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "unknown display type: {}",
                    config.display.epd_display_type
                ))
            })?;

        // Layout happens in logical coordinates; the frame is rotated to
        // native orientation at the end.
        let (width, height) = match config.display.epd_display_rotation {
            90 | 270 => (native_h, native_w),
            _ => (native_w, native_h),
        };

        Ok(Renderer {
            config,
            width,
            height,
        })
    }

    /// Compose one frame from the reconciled data and the current clock.
    pub fn render(&self, data: &DashboardData, now: DateTime<Local>) -> Frame {
        let mut frame = Frame::new(self.width, self.height, Colour::White);
        let layout = &self.config.layout;
        let mut y = 0i32;

        for line in &self.config.dashboard.lines {
            if let Some(start_y) = line.start_y {
                if start_y >= 0 {
                    y = start_y;
                }
            }

            let line_x = line.start_x.unwrap_or(layout.start_x);
            let mut x = line_x;

            for item in &line.items {
                if item.offset_x > 0 {
                    x = line_x + item.offset_x;
                }

                let resolved = self.resolve_item(item, data, now);
                let font = self.font_for_item(item);
                let style = MonoTextStyle::new(font, resolved.colour);
                Text::with_baseline(&resolved.text, Point::new(x, y), style, Baseline::Top)
                    .draw(&mut frame)
                    .ok();

                x += text_width(font, &resolved.text) + item.after_x;
            }

            y += line.after_y.unwrap_or(layout.line_height);
            if y > self.height as i32 - BOTTOM_MARGIN {
                break;
            }
        }

        let rotation = self.config.display.epd_display_rotation;
        if rotation != 0 {
            frame.rotated(rotation)
        } else {
            frame
        }
    }

    /// Resolve one item to its display text and colour.
    fn resolve_item(&self, item: &ItemConfig, data: &DashboardData, now: DateTime<Local>) -> Resolved {
        let base = self
            .config
            .display_colour(item.colour.as_deref().unwrap_or("BLACK"));

        match ItemKind::resolve(&item.kind, self.config) {
            ItemKind::Datetime => {
                let format = item.format.as_deref().unwrap_or(DEFAULT_DATETIME_FORMAT);
                Resolved {
                    text: decorate(&now.format(format).to_string(), item),
                    colour: base,
                }
            }
            ItemKind::Sunrise => self.sun_item("sunrise", item, data),
            ItemKind::Sunset => self.sun_item("sunset", item, data),
            ItemKind::WindDirection => {
                let value = data.value(Category::Weather, "wind_deg");
                let stale = data.is_stale(Category::Weather, "wind_deg");
                let text = match value.filter(|v| v.is_valid()).and_then(FieldValue::as_f64) {
                    Some(degrees) => decorate(wind_direction(degrees), item),
                    None => not_available(item),
                };
                Resolved {
                    text,
                    colour: self.paint(base, stale),
                }
            }
            ItemKind::Weather(field) => self.plain_item(Category::Weather, &field, item, data),
            ItemKind::Sensor(field) => self.plain_item(Category::Sensors, &field, item, data),
            ItemKind::Crypto(pair) => self.crypto_item(&pair, item, data),
        }
    }

    /// Direct (category, field) lookup with standard formatting.
    fn plain_item(
        &self,
        category: Category,
        field: &str,
        item: &ItemConfig,
        data: &DashboardData,
    ) -> Resolved {
        let base = self
            .config
            .display_colour(item.colour.as_deref().unwrap_or("BLACK"));
        let stale = data.is_stale(category, field);
        let text = match data.value(category, field).filter(|v| v.is_valid()) {
            Some(value) => decorate(&scalar_text(value), item),
            None => not_available(item),
        };
        Resolved {
            text,
            colour: self.paint(base, stale),
        }
    }

    /// Sunrise/sunset: epoch seconds converted to a local time-of-day
    /// string. Staleness is inherited from the raw timestamp field.
    fn sun_item(&self, field: &str, item: &ItemConfig, data: &DashboardData) -> Resolved {
        let base = self
            .config
            .display_colour(item.colour.as_deref().unwrap_or("BLACK"));
        let stale = data.is_stale(Category::Weather, field);
        let timestamp = data
            .value(Category::Weather, field)
            .filter(|v| v.is_valid())
            .and_then(FieldValue::as_i64);

        let text = match timestamp.and_then(|ts| Local.timestamp_opt(ts, 0).single()) {
            Some(when) => {
                let format = item.format.as_deref().unwrap_or(DEFAULT_SUN_FORMAT);
                decorate(&when.format(format).to_string(), item)
            }
            None => not_available(item),
        };
        Resolved {
            text,
            colour: self.paint(base, stale),
        }
    }

    /// Crypto pair: currency prefix when numeric, alternate colour when
    /// the captured change rate is negative. Stale colour still wins.
    fn crypto_item(&self, pair: &str, item: &ItemConfig, data: &DashboardData) -> Resolved {
        let base = self
            .config
            .display_colour(item.colour.as_deref().unwrap_or("BLACK"));
        let stale = data.is_stale(Category::Crypto, pair);
        let value = data.value(Category::Crypto, pair).filter(|v| v.is_valid());

        let text = match value {
            Some(value) => match value.as_f64() {
                Some(_) => decorate(&format!("${}", scalar_text(value)), item),
                None => decorate(&scalar_text(value), item),
            },
            None => not_available(item),
        };

        let change = data
            .value(Category::Crypto, &format!("{}.change_rate", pair))
            .and_then(FieldValue::as_f64);
        let colour = if change.is_some_and(|rate| rate < 0.0) {
            Colour::Red
        } else {
            base
        };

        Resolved {
            text,
            colour: self.paint(colour, stale),
        }
    }

    fn paint(&self, base: Colour, stale: bool) -> Colour {
        if stale {
            self.config.stale_colour()
        } else {
            base
        }
    }

    fn font_for_item(&self, item: &ItemConfig) -> &'static MonoFont<'static> {
        let name = item.font.as_deref().unwrap_or(DEFAULT_FONT);
        let size = self
            .config
            .fonts
            .get(name)
            .or_else(|| self.config.fonts.get(DEFAULT_FONT))
            .map(|f| f.size())
            .unwrap_or(DEFAULT_FONT_SIZE);
        builtin_font(size)
    }
}

/// Nearest builtin mono font for a configured point size.
fn builtin_font(size: u32) -> &'static MonoFont<'static> {
    match size {
        0..=11 => &FONT_6X10,
        12..=14 => &FONT_7X13,
        15..=17 => &FONT_9X15,
        18..=21 => &FONT_9X18,
        _ => &FONT_10X20,
    }
}

/// Measured pixel width of a text run in a mono font.
fn text_width(font: &MonoFont<'_>, text: &str) -> i32 {
    let advance = font.character_size.width + font.character_spacing;
    (advance * text.chars().count() as u32) as i32
}

/// Scalar display form: whole floats lose the decimals, fractional floats
/// get two places, everything else renders as-is.
fn scalar_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Int(i) => i.to_string(),
        FieldValue::Float(f) => {
            if f.fract() == 0.0 {
                format!("{:.0}", f)
            } else {
                format!("{:.2}", f)
            }
        }
        FieldValue::Text(s) => s.clone(),
    }
}

fn decorate(text: &str, item: &ItemConfig) -> String {
    format!("{}{}{}", item.prefix, text, item.suffix)
        .trim()
        .to_string()
}

/// Absent or invalid value: configured prefix + `N/A`.
fn not_available(item: &ItemConfig) -> String {
    format!("{}N/A", item.prefix).trim().to_string()
}

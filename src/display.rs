//! # Display Boundary
//!
//! The [`Epd`] trait is the seam between the render pipeline and panel
//! hardware: one lifecycle (`init`, `clear`, `show`, `sleep`) that the
//! real driver and the development preview both implement. Everything
//! above this module works in [`Frame`]s and never touches SPI.

use crate::{frame::Frame, Colour};
use std::fmt;

/// Native addressable size (width, height) for a supported panel type,
/// or `None` for an unrecognized one. Configuration validation rejects
/// anything this table does not know.
pub fn native_size(display_type: &str) -> Option<(u32, u32)> {
    match display_type {
        "epd2in15g" => Some((160, 296)),
        "epd2in13" => Some((122, 250)),
        "epd4in2" => Some((400, 300)),
        _ => None,
    }
}

#[derive(Debug)]
pub struct EpdError(pub String);

impl fmt::Display for EpdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPD error: {}", self.0)
    }
}

impl std::error::Error for EpdError {}

/// One full panel lifecycle. `sleep` must always be reachable: e-paper
/// left powered after a refresh degrades, so callers guarantee it runs
/// even when `show` fails.
pub trait Epd {
    fn init(&mut self) -> Result<(), EpdError>;
    fn clear(&mut self) -> Result<(), EpdError>;
    fn show(&mut self, frame: &Frame) -> Result<(), EpdError>;
    fn sleep(&mut self) -> Result<(), EpdError>;
    /// Native (width, height) of the panel this driver addresses.
    fn size(&self) -> (u32, u32);
}

/// Development preview: prints the frame to stdout, one character per
/// pixel, instead of driving a panel.
pub struct AsciiEpd {
    width: u32,
    height: u32,
}

impl AsciiEpd {
    pub fn new(width: u32, height: u32) -> Self {
        AsciiEpd { width, height }
    }
}

fn glyph(colour: Colour) -> char {
    match colour {
        Colour::Black => '#',
        Colour::White => ' ',
        Colour::Red => 'R',
        Colour::Yellow => 'Y',
    }
}

impl Epd for AsciiEpd {
    fn init(&mut self) -> Result<(), EpdError> {
        Ok(())
    }

    fn clear(&mut self) -> Result<(), EpdError> {
        Ok(())
    }

    fn show(&mut self, frame: &Frame) -> Result<(), EpdError> {
        let mut out = String::with_capacity(((frame.width() + 3) * frame.height()) as usize);
        out.push('+');
        out.push_str(&"-".repeat(frame.width() as usize));
        out.push_str("+\n");
        for y in 0..frame.height() {
            out.push('|');
            for x in 0..frame.width() {
                out.push(glyph(frame.get(x, y).unwrap_or(Colour::White)));
            }
            out.push_str("|\n");
        }
        out.push('+');
        out.push_str(&"-".repeat(frame.width() as usize));
        out.push('+');
        println!("{}", out);
        Ok(())
    }

    fn sleep(&mut self) -> Result<(), EpdError> {
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

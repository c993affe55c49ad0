//! # In-Memory Render Frame
//!
//! One frame of palette pixels, sized to the display's addressable area
//! (or transposed for 90/270 rotation). The frame is an
//! `embedded-graphics` draw target, so the layout renderer can use the
//! ordinary text primitives; its lifetime is a single render call.

use crate::Colour;
use core::convert::Infallible;
use embedded_graphics::{pixelcolor::raw::RawU2, prelude::*, Pixel};

impl PixelColor for Colour {
    type Raw = RawU2;
}

/// A width × height grid of palette pixels.
#[derive(Clone, Debug)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<Colour>,
}

impl Frame {
    /// New frame filled with `fill` (normally the panel's white).
    pub fn new(width: u32, height: u32, fill: Colour) -> Self {
        Frame {
            width,
            height,
            pixels: vec![fill; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Colour> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    /// Set a pixel; coordinates outside the frame are ignored, matching
    /// how text that runs off a panel edge is simply clipped.
    pub fn set(&mut self, x: i32, y: i32, colour: Colour) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.width || y >= self.height {
            return;
        }
        self.pixels[(y * self.width + x) as usize] = colour;
    }

    /// Copy of this frame rotated clockwise by 0/90/180/270 degrees.
    /// For 90 and 270 the output dimensions are swapped.
    pub fn rotated(&self, degrees: u16) -> Frame {
        match degrees % 360 {
            90 => {
                let mut out = Frame::new(self.height, self.width, Colour::White);
                for y in 0..self.height {
                    for x in 0..self.width {
                        let colour = self.pixels[(y * self.width + x) as usize];
                        out.set((self.height - 1 - y) as i32, x as i32, colour);
                    }
                }
                out
            }
            180 => {
                let mut out = Frame::new(self.width, self.height, Colour::White);
                for y in 0..self.height {
                    for x in 0..self.width {
                        let colour = self.pixels[(y * self.width + x) as usize];
                        out.set(
                            (self.width - 1 - x) as i32,
                            (self.height - 1 - y) as i32,
                            colour,
                        );
                    }
                }
                out
            }
            270 => {
                let mut out = Frame::new(self.height, self.width, Colour::White);
                for y in 0..self.height {
                    for x in 0..self.width {
                        let colour = self.pixels[(y * self.width + x) as usize];
                        out.set(y as i32, (self.width - 1 - x) as i32, colour);
                    }
                }
                out
            }
            _ => self.clone(),
        }
    }

    /// Count of pixels not matching `background`; handy for tests.
    pub fn ink_count(&self, background: Colour) -> usize {
        self.pixels.iter().filter(|&&p| p != background).count()
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Frame {
    type Color = Colour;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, colour) in pixels {
            self.set(point.x, point.y, colour);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::{
        mono_font::{ascii::FONT_6X10, MonoTextStyle},
        text::{Baseline, Text},
    };

    #[test]
    fn out_of_bounds_writes_are_clipped() {
        let mut frame = Frame::new(4, 4, Colour::White);
        frame.set(-1, 0, Colour::Black);
        frame.set(4, 0, Colour::Black);
        frame.set(0, 4, Colour::Black);
        assert_eq!(frame.ink_count(Colour::White), 0);
    }

    #[test]
    fn text_draws_through_the_draw_target() {
        let mut frame = Frame::new(60, 20, Colour::White);
        let style = MonoTextStyle::new(&FONT_6X10, Colour::Black);
        Text::with_baseline("Hi", Point::new(0, 0), style, Baseline::Top)
            .draw(&mut frame)
            .unwrap();
        assert!(frame.ink_count(Colour::White) > 0);
    }

    #[test]
    fn rotation_90_maps_corners_clockwise() {
        // 3 wide, 2 tall; mark the top-left corner.
        let mut frame = Frame::new(3, 2, Colour::White);
        frame.set(0, 0, Colour::Black);
        frame.set(2, 0, Colour::Red);

        let rotated = frame.rotated(90);
        assert_eq!(rotated.width(), 2);
        assert_eq!(rotated.height(), 3);
        // Top-left goes to top-right; top-right goes to bottom-right.
        assert_eq!(rotated.get(1, 0), Some(Colour::Black));
        assert_eq!(rotated.get(1, 2), Some(Colour::Red));
    }

    #[test]
    fn rotation_180_flips_both_axes() {
        let mut frame = Frame::new(3, 2, Colour::White);
        frame.set(0, 0, Colour::Yellow);

        let rotated = frame.rotated(180);
        assert_eq!(rotated.get(2, 1), Some(Colour::Yellow));
    }

    #[test]
    fn rotation_270_is_the_inverse_of_90() {
        let mut frame = Frame::new(5, 3, Colour::White);
        frame.set(4, 0, Colour::Red);
        frame.set(1, 2, Colour::Black);

        let there_and_back = frame.rotated(90).rotated(270);
        assert_eq!(there_and_back.get(4, 0), Some(Colour::Red));
        assert_eq!(there_and_back.get(1, 2), Some(Colour::Black));
        assert_eq!(there_and_back.ink_count(Colour::White), 2);
    }

    #[test]
    fn rotation_0_is_identity() {
        let mut frame = Frame::new(2, 2, Colour::White);
        frame.set(1, 0, Colour::Black);
        let same = frame.rotated(0);
        assert_eq!(same.get(1, 0), Some(Colour::Black));
    }
}

//! Driver for the Waveshare 2.15" G panel (160x296, black/white/yellow/red).
//!
//! Follows the vendor's reference sequence for the G-series controllers.
//! The SPI bus and control pins are abstracted behind small crate-local
//! traits so the driver itself has no platform dependencies and can be
//! exercised against mocks.

use crate::{
    display::{Epd, EpdError},
    frame::Frame,
    Colour,
};
use std::thread;
use std::time::Duration;

pub const EPD_WIDTH: u32 = 160;
pub const EPD_HEIGHT: u32 = 296;

/// Write-only SPI byte interface.
pub trait SoftwareSpi {
    fn write_byte(&mut self, data: u8) -> Result<(), EpdError>;
}

/// Output control pin (CS, DC, RST).
pub trait OutputPin {
    fn set_high(&mut self) -> Result<(), EpdError>;
    fn set_low(&mut self) -> Result<(), EpdError>;
}

/// Input pin (BUSY).
pub trait ReadPin {
    fn is_high(&self) -> Result<bool, EpdError>;
}

/// 2-bit palette code for one pixel, four pixels per buffer byte.
fn palette(colour: Colour) -> u8 {
    match colour {
        Colour::Black => 0b00,
        Colour::White => 0b01,
        Colour::Yellow => 0b10,
        Colour::Red => 0b11,
    }
}

/// Pack a frame into the controller's 2bpp buffer layout: four pixels
/// per byte, most significant pair first, rows padded to whole bytes
/// with white.
pub fn pack(frame: &Frame) -> Vec<u8> {
    let bytes_per_row = frame.width().div_ceil(4);
    let mut out = Vec::with_capacity((bytes_per_row * frame.height()) as usize);
    for y in 0..frame.height() {
        for byte_x in 0..bytes_per_row {
            let mut byte = 0u8;
            for bit in 0..4 {
                let x = byte_x * 4 + bit;
                let code = frame
                    .get(x, y)
                    .map(palette)
                    .unwrap_or(palette(Colour::White));
                byte |= code << (6 - bit * 2);
            }
            out.push(byte);
        }
    }
    out
}

pub struct Epd2in15g<SPI, CS, DC, RST, BUSY> {
    spi: SPI,
    cs_pin: CS,
    dc_pin: DC,
    rst_pin: RST,
    busy_pin: BUSY,
    width: u32,
    height: u32,
}

impl<SPI, CS, DC, RST, BUSY> Epd2in15g<SPI, CS, DC, RST, BUSY>
where
    SPI: SoftwareSpi,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: ReadPin,
{
    pub fn new(spi: SPI, cs_pin: CS, dc_pin: DC, rst_pin: RST, busy_pin: BUSY) -> Self {
        Self {
            spi,
            cs_pin,
            dc_pin,
            rst_pin,
            busy_pin,
            width: EPD_WIDTH,
            height: EPD_HEIGHT,
        }
    }

    fn reset(&mut self) -> Result<(), EpdError> {
        self.rst_pin.set_high()?;
        thread::sleep(Duration::from_millis(20));
        self.rst_pin.set_low()?;
        thread::sleep(Duration::from_millis(2));
        self.rst_pin.set_high()?;
        thread::sleep(Duration::from_millis(20));
        Ok(())
    }

    fn send_command(&mut self, command: u8) -> Result<(), EpdError> {
        self.dc_pin.set_low()?;
        self.cs_pin.set_low()?;
        self.spi.write_byte(command)?;
        self.cs_pin.set_high()?;
        Ok(())
    }

    fn send_data(&mut self, data: u8) -> Result<(), EpdError> {
        self.dc_pin.set_high()?;
        self.cs_pin.set_low()?;
        self.spi.write_byte(data)?;
        self.cs_pin.set_high()?;
        Ok(())
    }

    /// G-series controllers hold BUSY low while working.
    fn read_busy(&mut self) -> Result<(), EpdError> {
        let mut count = 0;
        while !self.busy_pin.is_high()? {
            thread::sleep(Duration::from_millis(10));
            count += 1;
            if count > 3000 {
                log::warn!("BUSY timeout after 30 seconds, continuing anyway");
                break;
            }
        }
        Ok(())
    }

    /// Power on, refresh, power off, waiting out BUSY between steps.
    fn refresh(&mut self) -> Result<(), EpdError> {
        self.send_command(0x04)?; // PON
        self.read_busy()?;

        self.send_command(0x12)?; // DRF
        self.send_data(0x00)?;
        self.read_busy()?;

        self.send_command(0x02)?; // POF
        self.send_data(0x00)?;
        self.read_busy()?;
        Ok(())
    }

    fn send_buffer(&mut self, buffer: &[u8]) -> Result<(), EpdError> {
        self.send_command(0x10)?; // DTM
        for &byte in buffer {
            self.send_data(byte)?;
        }
        Ok(())
    }
}

impl<SPI, CS, DC, RST, BUSY> Epd for Epd2in15g<SPI, CS, DC, RST, BUSY>
where
    SPI: SoftwareSpi,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: ReadPin,
{
    fn init(&mut self) -> Result<(), EpdError> {
        self.reset()?;
        self.read_busy()?;

        self.send_command(0x4D)?;
        self.send_data(0x78)?;

        self.send_command(0x00)?; // PSR
        self.send_data(0x0F)?;
        self.send_data(0x29)?;

        self.send_command(0x01)?; // PWR
        self.send_data(0x07)?;
        self.send_data(0x00)?;

        self.send_command(0x03)?; // POFS
        self.send_data(0x10)?;
        self.send_data(0x54)?;
        self.send_data(0x44)?;

        self.send_command(0x06)?; // BTST
        self.send_data(0x05)?;
        self.send_data(0x00)?;
        self.send_data(0x3F)?;
        self.send_data(0x0A)?;
        self.send_data(0x25)?;
        self.send_data(0x12)?;
        self.send_data(0x1A)?;

        self.send_command(0x50)?; // CDI
        self.send_data(0x37)?;

        self.send_command(0x60)?; // TCON
        self.send_data(0x02)?;
        self.send_data(0x02)?;

        self.send_command(0x61)?; // TRES
        self.send_data((self.width >> 8) as u8)?;
        self.send_data((self.width & 0xFF) as u8)?;
        self.send_data((self.height >> 8) as u8)?;
        self.send_data((self.height & 0xFF) as u8)?;

        self.send_command(0xE7)?;
        self.send_data(0x1C)?;

        self.send_command(0xE3)?;
        self.send_data(0x22)?;

        log::debug!("panel initialized");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), EpdError> {
        let white = palette(Colour::White);
        let byte = white << 6 | white << 4 | white << 2 | white;
        let len = (self.width.div_ceil(4) * self.height) as usize;
        self.send_buffer(&vec![byte; len])?;
        self.refresh()
    }

    fn show(&mut self, frame: &Frame) -> Result<(), EpdError> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(EpdError(format!(
                "frame is {}x{}, panel is {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        self.send_buffer(&pack(frame))?;
        self.refresh()
    }

    fn sleep(&mut self) -> Result<(), EpdError> {
        self.send_command(0x07)?; // DSLP
        self.send_data(0xA5)?;
        thread::sleep(Duration::from_millis(100));
        log::debug!("panel sleeping");
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Event {
        Command(u8),
        Data(u8),
    }

    #[derive(Default)]
    struct Wire {
        log: Vec<Event>,
        dc_high: bool,
    }

    #[derive(Clone)]
    struct MockSpi(Rc<RefCell<Wire>>);
    impl SoftwareSpi for MockSpi {
        fn write_byte(&mut self, data: u8) -> Result<(), EpdError> {
            let mut wire = self.0.borrow_mut();
            let event = if wire.dc_high {
                Event::Data(data)
            } else {
                Event::Command(data)
            };
            wire.log.push(event);
            Ok(())
        }
    }

    #[derive(Clone)]
    struct MockDc(Rc<RefCell<Wire>>);
    impl OutputPin for MockDc {
        fn set_high(&mut self) -> Result<(), EpdError> {
            self.0.borrow_mut().dc_high = true;
            Ok(())
        }
        fn set_low(&mut self) -> Result<(), EpdError> {
            self.0.borrow_mut().dc_high = false;
            Ok(())
        }
    }

    struct NullPin;
    impl OutputPin for NullPin {
        fn set_high(&mut self) -> Result<(), EpdError> {
            Ok(())
        }
        fn set_low(&mut self) -> Result<(), EpdError> {
            Ok(())
        }
    }

    struct IdleBusy;
    impl ReadPin for IdleBusy {
        fn is_high(&self) -> Result<bool, EpdError> {
            Ok(true)
        }
    }

    fn driver(
        wire: &Rc<RefCell<Wire>>,
    ) -> Epd2in15g<MockSpi, NullPin, MockDc, NullPin, IdleBusy> {
        Epd2in15g::new(
            MockSpi(wire.clone()),
            NullPin,
            MockDc(wire.clone()),
            NullPin,
            IdleBusy,
        )
    }

    #[test]
    fn packing_is_two_bits_per_pixel_msb_first() {
        let mut frame = Frame::new(4, 1, Colour::White);
        frame.set(0, 0, Colour::Black);
        frame.set(1, 0, Colour::White);
        frame.set(2, 0, Colour::Yellow);
        frame.set(3, 0, Colour::Red);
        assert_eq!(pack(&frame), vec![0b00_01_10_11]);
    }

    #[test]
    fn packing_pads_short_rows_with_white() {
        let frame = Frame::new(5, 2, Colour::Black);
        let packed = pack(&frame);
        // 5 pixels round up to 2 bytes per row.
        assert_eq!(packed.len(), 4);
        assert_eq!(packed[0], 0b00_00_00_00);
        assert_eq!(packed[1], 0b00_01_01_01); // one black pixel, three pad
    }

    #[test]
    fn packed_buffer_covers_the_native_panel() {
        let frame = Frame::new(EPD_WIDTH, EPD_HEIGHT, Colour::White);
        assert_eq!(pack(&frame).len(), (EPD_WIDTH / 4 * EPD_HEIGHT) as usize);
    }

    #[test]
    fn show_streams_the_frame_after_one_data_command() {
        let wire = Rc::new(RefCell::new(Wire::default()));
        let mut epd = driver(&wire);
        let frame = Frame::new(EPD_WIDTH, EPD_HEIGHT, Colour::White);
        epd.show(&frame).unwrap();

        let log = &wire.borrow().log;
        let dtm = log
            .iter()
            .position(|&e| e == Event::Command(0x10))
            .expect("data transmission command");
        let pixel_bytes = log[dtm + 1..]
            .iter()
            .take_while(|e| matches!(e, Event::Data(_)))
            .count();
        assert_eq!(pixel_bytes, (EPD_WIDTH / 4 * EPD_HEIGHT) as usize);
        // Refresh follows the buffer.
        assert!(log[dtm + 1 + pixel_bytes..].contains(&Event::Command(0x12)));
    }

    #[test]
    fn show_rejects_a_mismatched_frame() {
        let wire = Rc::new(RefCell::new(Wire::default()));
        let mut epd = driver(&wire);
        let frame = Frame::new(10, 10, Colour::White);
        assert!(epd.show(&frame).is_err());
        assert!(wire.borrow().log.is_empty());
    }

    #[test]
    fn sleep_ends_with_deep_sleep() {
        let wire = Rc::new(RefCell::new(Wire::default()));
        let mut epd = driver(&wire);
        epd.init().unwrap();
        epd.clear().unwrap();
        epd.sleep().unwrap();

        let log = &wire.borrow().log;
        let len = log.len();
        assert_eq!(log[len - 2], Event::Command(0x07));
        assert_eq!(log[len - 1], Event::Data(0xA5));
    }
}

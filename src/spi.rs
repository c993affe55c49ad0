//! Kernel SPI device glue for the panel's data bus.

use epd_dashboard::display::EpdError;
use epd_dashboard::epd2in15g::SoftwareSpi;
use spidev::{SpiModeFlags, Spidev, SpidevOptions};
use std::io::Write;

pub struct SpidevBus {
    dev: Spidev,
}

impl SpidevBus {
    pub fn new() -> Result<Self, EpdError> {
        let mut dev = Spidev::open("/dev/spidev0.0").map_err(|e| EpdError(e.to_string()))?;
        let opts = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(8_000_000)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        dev.configure(&opts).map_err(|e| EpdError(e.to_string()))?;
        Ok(Self { dev })
    }
}

impl SoftwareSpi for SpidevBus {
    fn write_byte(&mut self, data: u8) -> Result<(), EpdError> {
        self.dev
            .write(&[data])
            .map(|_| ())
            .map_err(|e| EpdError(e.to_string()))
    }
}

//! Character-device GPIO glue for the panel's control pins.

use epd_dashboard::display::EpdError;
use epd_dashboard::epd2in15g::{OutputPin, ReadPin};
use gpio_cdev::{Chip, LineRequestFlags};

pub struct CdevOutputPin {
    line: gpio_cdev::LineHandle,
}

pub struct CdevInputPin {
    line: gpio_cdev::LineHandle,
}

impl CdevOutputPin {
    pub fn new(chip: &mut Chip, offset: u32) -> Result<Self, EpdError> {
        let line = chip
            .get_line(offset)
            .map_err(|e| EpdError(e.to_string()))?
            .request(LineRequestFlags::OUTPUT, 0, "epd-dashboard")
            .map_err(|e| EpdError(e.to_string()))?;
        Ok(Self { line })
    }
}

impl CdevInputPin {
    pub fn new(chip: &mut Chip, offset: u32) -> Result<Self, EpdError> {
        let line = chip
            .get_line(offset)
            .map_err(|e| EpdError(e.to_string()))?
            .request(LineRequestFlags::INPUT, 0, "epd-dashboard")
            .map_err(|e| EpdError(e.to_string()))?;
        Ok(Self { line })
    }
}

impl OutputPin for CdevOutputPin {
    fn set_high(&mut self) -> Result<(), EpdError> {
        self.line.set_value(1).map_err(|e| EpdError(e.to_string()))
    }
    fn set_low(&mut self) -> Result<(), EpdError> {
        self.line.set_value(0).map_err(|e| EpdError(e.to_string()))
    }
}

impl ReadPin for CdevInputPin {
    fn is_high(&self) -> Result<bool, EpdError> {
        Ok(self.line.get_value().map_err(|e| EpdError(e.to_string()))? == 1)
    }
}

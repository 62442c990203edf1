use crate::lcd::hd44780::{LcdInterface, LcdPin};
use crate::{GpioOutput, GpioResult};
use std::thread::sleep;
use std::time::Duration;

/// [LcdInterface] over individual GPIO output pins.
///
/// The R/W pin of the display must be tied to GND, the driver never reads from the controller.
/// Delays use [sleep], which may overshoot but never undershoots the requested time.
#[derive(Debug)]
pub struct PinInterface<'a> {
    pin_e: &'a dyn GpioOutput,
    pin_rs: &'a dyn GpioOutput,
    data_bus: [&'a dyn GpioOutput; 4],
}

impl<'a> PinInterface<'a> {
    /// Creates a new PinInterface.
    ///
    /// # Parameters
    ///
    /// - `pin_e`: Enable output pin.
    /// - `pin_rs`: Register select output pin.
    /// - `data_bus`: D4 to D7 output pins, in that order.
    pub fn new(
        pin_e: &'a dyn GpioOutput,
        pin_rs: &'a dyn GpioOutput,
        data_bus: [&'a dyn GpioOutput; 4],
    ) -> Self {
        PinInterface {
            pin_e,
            pin_rs,
            data_bus,
        }
    }

    fn pin(&self, pin: LcdPin) -> &'a dyn GpioOutput {
        match pin {
            LcdPin::D4 => self.data_bus[0],
            LcdPin::D5 => self.data_bus[1],
            LcdPin::D6 => self.data_bus[2],
            LcdPin::D7 => self.data_bus[3],
            LcdPin::E => self.pin_e,
            LcdPin::Rs => self.pin_rs,
        }
    }
}

impl LcdInterface for PinInterface<'_> {
    fn write_pin(&mut self, pin: LcdPin, level: bool) -> GpioResult<()> {
        self.pin(pin).write(level)
    }

    fn delay_us(&mut self, us: u32) {
        if us > 0 {
            sleep(Duration::from_micros(us as u64));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug)]
    struct SharedPin<'a> {
        name: &'static str,
        log: &'a RefCell<Vec<(&'static str, bool)>>,
    }

    impl GpioOutput for SharedPin<'_> {
        fn write(&self, value: bool) -> GpioResult<()> {
            self.log.borrow_mut().push((self.name, value));
            Ok(())
        }
    }

    #[test]
    fn routes_each_lcd_pin_to_its_output() {
        let log = RefCell::new(Vec::new());
        let pin = |name| SharedPin { name, log: &log };
        let (e, rs) = (pin("e"), pin("rs"));
        let (d4, d5, d6, d7) = (pin("d4"), pin("d5"), pin("d6"), pin("d7"));

        let mut interface = PinInterface::new(&e, &rs, [&d4, &d5, &d6, &d7]);
        for p in LcdPin::ALL {
            interface.write_pin(p, true).unwrap();
        }
        interface.delay_us(0);

        assert_eq!(*log.borrow(), vec![
            ("d4", true),
            ("d5", true),
            ("d6", true),
            ("d7", true),
            ("e", true),
            ("rs", true),
        ]);
    }
}

use crate::GpioResult;
use crate::lcd::hd44780::LcdPin;
use std::fmt::{Debug, Formatter};

/// Hardware access needed by the [Hd44780Lcd](super::Hd44780Lcd) sequencer.
pub trait LcdInterface {
    /// Drives one line of the 4-bit bus to the given level.
    fn write_pin(&mut self, pin: LcdPin, level: bool) -> GpioResult<()>;

    /// Blocks for at least `us` microseconds.
    fn delay_us(&mut self, us: u32);
}

impl<T: LcdInterface + ?Sized> LcdInterface for &mut T {
    fn write_pin(&mut self, pin: LcdPin, level: bool) -> GpioResult<()> {
        (**self).write_pin(pin, level)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

/// Interface made of two plain functions: a pin write taking the pin index and level, and a
/// microsecond delay.
///
/// Useful on targets where the pins are already wrapped by existing code:
///
/// ```
/// use charlcd_gpio::lcd::hd44780::{FnInterface, Hd44780Lcd};
///
/// let mut levels = [false; 6];
/// let interface = FnInterface::new(
///     |pin, level| levels[pin as usize] = level,
///     |_us| {},
/// );
/// let mut lcd = Hd44780Lcd::init(interface, 2, 16).unwrap();
/// lcd.print("Hello").unwrap();
/// ```
pub struct FnInterface<W, D>
where
    W: FnMut(u8, bool),
    D: FnMut(u32),
{
    pin_write: W,
    delay_us: D,
}

impl<W, D> FnInterface<W, D>
where
    W: FnMut(u8, bool),
    D: FnMut(u32),
{
    pub fn new(pin_write: W, delay_us: D) -> Self {
        FnInterface { pin_write, delay_us }
    }
}

impl<W, D> Debug for FnInterface<W, D>
where
    W: FnMut(u8, bool),
    D: FnMut(u32),
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "FnInterface")
    }
}

impl<W, D> LcdInterface for FnInterface<W, D>
where
    W: FnMut(u8, bool),
    D: FnMut(u32),
{
    fn write_pin(&mut self, pin: LcdPin, level: bool) -> GpioResult<()> {
        (self.pin_write)(pin.index(), level);
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        (self.delay_us)(us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fn_interface_forwards_indices_and_delays() {
        let mut writes = Vec::new();
        let mut delays = Vec::new();
        {
            let mut interface = FnInterface::new(
                |pin, level| writes.push((pin, level)),
                |us| delays.push(us),
            );
            interface.write_pin(LcdPin::Rs, true).unwrap();
            interface.write_pin(LcdPin::D6, false).unwrap();
            interface.delay_us(40);
        }
        assert_eq!(writes, vec![(5, true), (2, false)]);
        assert_eq!(delays, vec![40]);
    }
}

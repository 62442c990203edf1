//! Interfaces that don't need a display: one that records everything for inspection and one that
//! only logs.
use crate::lcd::hd44780::{LcdInterface, LcdPin};
use crate::{GpioError, GpioResult};
use log::trace;

/// Something the sequencer asked the interface to do.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Event {
    Pin(LcdPin, bool),
    Delay(u32),
}

/// Nibble latched by the controller on a falling edge of E.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Transfer {
    pub rs: bool,
    pub nibble: u8,
}

/// Levels of all six lines, replayed from the event log.
#[derive(Copy, Clone, Debug, Default)]
struct BusState {
    levels: [bool; 6],
}

impl BusState {
    /// Applies a pin write and returns the latched transfer if it was a falling edge of E.
    fn apply(&mut self, pin: LcdPin, level: bool) -> Option<Transfer> {
        let previous = self.levels[pin.index() as usize];
        self.levels[pin.index() as usize] = level;

        if pin == LcdPin::E && previous && !level {
            Some(Transfer {
                rs: self.levels[LcdPin::Rs.index() as usize],
                nibble: self.nibble(),
            })
        } else {
            None
        }
    }

    fn nibble(&self) -> u8 {
        LcdPin::DATA
            .iter()
            .enumerate()
            .filter(|(_, pin)| self.levels[pin.index() as usize])
            .fold(0, |acc, (bit, _)| acc | (1 << bit))
    }
}

/// Records pin writes and delays.
///
/// Bus state carries over [Self::clear_events], so transfers decoded afterwards stay correct.
#[derive(Debug, Default)]
pub struct RecordingInterface {
    events: Vec<Event>,
    start_state: BusState,
    pin_writes: usize,
    fail_after: Option<usize>,
}

impl RecordingInterface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every pin write after the first `writes` ones fail with `GpioError::Other`.
    pub fn failing_after(writes: usize) -> Self {
        RecordingInterface {
            fail_after: Some(writes),
            ..Self::default()
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Forgets the recorded events, keeping the current pin levels.
    pub fn clear_events(&mut self) {
        self.start_state = self.replay(|_| {});
        self.events.clear();
    }

    fn replay(&self, mut on_transfer: impl FnMut(Transfer)) -> BusState {
        let mut state = self.start_state;
        for event in &self.events {
            if let Event::Pin(pin, level) = *event {
                if let Some(transfer) = state.apply(pin, level) {
                    on_transfer(transfer);
                }
            }
        }
        state
    }

    /// Gets the current level of a pin.
    pub fn level(&self, pin: LcdPin) -> bool {
        self.replay(|_| {}).levels[pin.index() as usize]
    }

    /// Gets the nibbles latched by the controller, in order.
    pub fn transfers(&self) -> Vec<Transfer> {
        let mut transfers = Vec::new();
        self.replay(|t| transfers.push(t));
        transfers
    }

    /// Pairs latched nibbles into `(rs, byte)`, high nibble first.
    ///
    /// Only meaningful once the controller is in 4-bit mode. A trailing unpaired nibble is
    /// dropped.
    pub fn sent_bytes(&self) -> Vec<(bool, u8)> {
        self.transfers()
            .chunks_exact(2)
            .map(|pair| (pair[0].rs, (pair[0].nibble << 4) | pair[1].nibble))
            .collect()
    }

    /// Gets the requested delays, in order.
    pub fn delays(&self) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Delay(us) => Some(*us),
                Event::Pin(..) => None,
            })
            .collect()
    }
}

impl LcdInterface for RecordingInterface {
    fn write_pin(&mut self, pin: LcdPin, level: bool) -> GpioResult<()> {
        if self.fail_after.is_some_and(|n| self.pin_writes >= n) {
            return Err(GpioError::Other(format!("{:?} write refused", pin)));
        }
        self.pin_writes += 1;
        self.events.push(Event::Pin(pin, level));
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        self.events.push(Event::Delay(us));
    }
}

/// Logs the bus activity at trace level instead of driving hardware.
#[derive(Debug, Default)]
pub struct TraceInterface {
    state: BusState,
}

impl TraceInterface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LcdInterface for TraceInterface {
    fn write_pin(&mut self, pin: LcdPin, level: bool) -> GpioResult<()> {
        trace!("{:?} <- {}", pin, level as u8);
        if let Some(transfer) = self.state.apply(pin, level) {
            trace!("Latched {:04b}, RS: {}", transfer.nibble, transfer.rs);
        }
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        if us > 0 {
            trace!("Delay {} us", us);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latches_on_falling_edge_only() {
        let mut rec = RecordingInterface::new();
        rec.write_pin(LcdPin::Rs, true).unwrap();
        rec.write_pin(LcdPin::D5, true).unwrap();
        rec.write_pin(LcdPin::E, false).unwrap();
        rec.write_pin(LcdPin::E, true).unwrap();
        assert!(rec.transfers().is_empty());

        rec.write_pin(LcdPin::E, false).unwrap();
        assert_eq!(rec.transfers(), vec![Transfer { rs: true, nibble: 0b0010 }]);
    }

    #[test]
    fn clearing_keeps_pin_levels() {
        let mut rec = RecordingInterface::new();
        rec.write_pin(LcdPin::E, true).unwrap();
        rec.write_pin(LcdPin::D7, true).unwrap();
        rec.delay_us(5);
        rec.clear_events();

        assert!(rec.events().is_empty());
        assert!(rec.level(LcdPin::E));
        rec.write_pin(LcdPin::E, false).unwrap();
        assert_eq!(rec.transfers(), vec![Transfer { rs: false, nibble: 0b1000 }]);
    }

    #[test]
    fn failing_interface_refuses_late_writes() {
        let mut rec = RecordingInterface::failing_after(1);
        assert!(rec.write_pin(LcdPin::D4, true).is_ok());
        assert!(matches!(rec.write_pin(LcdPin::D5, true), Err(GpioError::Other(_))));
        assert_eq!(rec.events().len(), 1);
    }
}

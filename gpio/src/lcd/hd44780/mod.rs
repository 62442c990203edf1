//! HD44780 LCD module.
//!
//! Drives HD44780-compatible character displays over a write-only 4-bit bus. The controller gives
//! no acknowledgement, so every operation is a fixed sequence of pin writes and delays taken from
//! the datasheet timing. The hardware access is injected through [LcdInterface], which makes the
//! sequencer usable with real GPIO lines ([PinInterface]), plain closures ([FnInterface]) or the
//! recording and tracing interfaces in [sim].

pub mod driver;
pub mod interface;
pub mod sim;

pub use driver::*;
pub use interface::*;

/// Command bytes and flags of the HD44780 instruction set.
pub mod command {
    pub const CLEAR: u8 = 0b00000001;
    pub const HOME: u8 = 0b00000010;

    pub const ENTRY_MODE: u8 = 0b00000100;
    pub const ENTRY_INCREMENT: u8 = 0b00000010;
    pub const ENTRY_SHIFT: u8 = 0b00000001;

    pub const DISPLAY_CONTROL: u8 = 0b00001000;
    pub const DISPLAY_ON: u8 = 0b00000100;
    pub const CURSOR_ON: u8 = 0b00000010;
    pub const BLINK_ON: u8 = 0b00000001;

    pub const CURSOR_SHIFT: u8 = 0b00010000;
    pub const SHIFT_DISPLAY: u8 = 0b00001000;
    pub const SHIFT_RIGHT: u8 = 0b00000100;

    /// Function set: 4-bit bus, 2 lines, 5x8 font.
    pub const FUNCTION_SET_4BIT_2LINE: u8 = 0b00101000;

    pub const SET_CGRAM_ADDRESS: u8 = 0b01000000;

    pub const LINE0: u8 = 0x80;
    pub const LINE1: u8 = 0xC0;
    pub const LINE2: u8 = 0x94;
    pub const LINE3: u8 = 0xD4;
}

/// Delays in microseconds.
pub mod timing {
    /// Waited before every transfer.
    pub const COMMAND_SETUP_US: u32 = 0;
    /// Extra time added to every step of the power-on reset sequence.
    pub const INIT_EXTRA_US: u32 = 0;
    pub const POWER_ON_US: u32 = 15000;
    pub const SYNC_LONG_US: u32 = 4100;
    pub const SYNC_SHORT_US: u32 = 100;
    /// Execution time of most instructions and data writes.
    pub const SHORT_US: u32 = 40;
    /// Execution time of clear and home.
    pub const LONG_US: u32 = 1640;
}

/// Lines of the 4-bit bus, numbered the way [LcdInterface::write_pin] receives them.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LcdPin {
    D4 = 0,
    D5 = 1,
    D6 = 2,
    D7 = 3,
    E = 4,
    Rs = 5,
}

impl LcdPin {
    /// All pins in index order.
    pub const ALL: [LcdPin; 6] = [
        LcdPin::D4,
        LcdPin::D5,
        LcdPin::D6,
        LcdPin::D7,
        LcdPin::E,
        LcdPin::Rs,
    ];

    /// Data pins, least significant bit first.
    pub const DATA: [LcdPin; 4] = [LcdPin::D4, LcdPin::D5, LcdPin::D6, LcdPin::D7];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<LcdPin> {
        Self::ALL.get(index as usize).copied()
    }
}

/// How line numbers map to DDRAM start addresses.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum LineAddressing {
    /// Lines 2 and 3 continue lines 0 and 1 after `columns` characters.
    ///
    /// This is how 16x4 panels are wired, and it coincides with [LineAddressing::FourLine] on
    /// 20-column panels.
    #[default]
    Wrap,
    /// Fixed 0x80, 0xC0, 0x94, 0xD4 table of 20x4 panels.
    FourLine,
}

impl LineAddressing {
    /// Gets the "set DDRAM address" command for the start of a line.
    ///
    /// Lines above 3 fall back to line 0.
    pub fn line_base(self, line: u8, columns: u8) -> u8 {
        use command::*;

        match (self, line) {
            (_, 0) => LINE0,
            (_, 1) => LINE1,
            (LineAddressing::Wrap, 2) => LINE0.wrapping_add(columns),
            (LineAddressing::Wrap, 3) => LINE1.wrapping_add(columns),
            (LineAddressing::FourLine, 2) => LINE2,
            (LineAddressing::FourLine, 3) => LINE3,
            _ => LINE0,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing data.
    Left,
    /// Moves the cursor to the right after writing data.
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pins_round_trip_through_their_index() {
        for pin in LcdPin::ALL {
            assert_eq!(LcdPin::from_index(pin.index()), Some(pin));
        }
        assert_eq!(LcdPin::from_index(6), None);
    }

    #[test]
    fn wrap_addressing_continues_after_columns() {
        let wrap = LineAddressing::Wrap;
        assert_eq!(wrap.line_base(0, 16), 0x80);
        assert_eq!(wrap.line_base(1, 16), 0xC0);
        assert_eq!(wrap.line_base(2, 16), 0x90);
        assert_eq!(wrap.line_base(3, 16), 0xD0);
        assert_eq!(wrap.line_base(4, 16), 0x80);
    }

    #[test]
    fn four_line_table_ignores_columns() {
        let four = LineAddressing::FourLine;
        assert_eq!(four.line_base(2, 16), 0x94);
        assert_eq!(four.line_base(3, 16), 0xD4);
        assert_eq!(four.line_base(200, 16), 0x80);
    }

    #[test]
    fn variants_agree_on_20_columns() {
        for line in 0..4 {
            assert_eq!(
                LineAddressing::Wrap.line_base(line, 20),
                LineAddressing::FourLine.line_base(line, 20)
            );
        }
    }
}

mod gpio;

use crate::lcd::hd44780::command::*;
use crate::lcd::hd44780::timing::*;
use crate::lcd::hd44780::{CursorDirection, LcdInterface, LcdPin, LineAddressing};
use crate::{GpioError, GpioResult};
use log::{debug, trace, warn};
use std::fmt::Arguments;
pub use gpio::*;

/// HD44780 command sequencer for a write-only 4-bit bus.
///
/// Owns the injected [LcdInterface] together with the only state the controller cannot report
/// back: the display control flags and the panel geometry.
#[derive(Debug)]
pub struct Hd44780Lcd<I: LcdInterface> {
    interface: I,
    display_control: u8,
    lines: u8,
    columns: u8,
    addressing: LineAddressing,
}

impl<I: LcdInterface> Hd44780Lcd<I> {
    /// Runs the power-on reset sequence with [LineAddressing::Wrap] and returns the ready display.
    ///
    /// The display ends up cleared, turned on, with the cursor and blinking off.
    pub fn init(interface: I, lines: u8, columns: u8) -> GpioResult<Self> {
        Self::init_with(interface, lines, columns, LineAddressing::default())
    }

    /// Runs the power-on reset sequence using the given line addressing.
    pub fn init_with(
        interface: I,
        lines: u8,
        columns: u8,
        addressing: LineAddressing,
    ) -> GpioResult<Self> {
        let mut lcd = Hd44780Lcd {
            interface,
            display_control: DISPLAY_CONTROL,
            lines,
            columns,
            addressing,
        };
        lcd.reset()?;
        Ok(lcd)
    }

    fn reset(&mut self) -> GpioResult<()> {
        debug!(
            "Initializing {}x{} display ({:?} addressing)",
            self.columns, self.lines, self.addressing
        );

        self.display_control = DISPLAY_CONTROL;

        // Park the bus in a known state before the controller finishes its own reset
        self.set_rs(true)?;
        self.write_nibble(0x0F)?;
        self.set_e(true)?;
        self.interface.delay_us(INIT_EXTRA_US + POWER_ON_US);

        // Synchronize: three times "8-bit mode", then switch to 4-bit mode
        self.command_4bit(0x03)?;
        self.interface.delay_us(INIT_EXTRA_US + SYNC_LONG_US);

        self.command_4bit(0x03)?;
        self.interface.delay_us(INIT_EXTRA_US + SYNC_SHORT_US);

        self.command_4bit(0x03)?;
        self.interface.delay_us(INIT_EXTRA_US + SYNC_LONG_US);

        self.command_4bit(0x02)?;
        self.interface.delay_us(SHORT_US);

        self.command(FUNCTION_SET_4BIT_2LINE)?;

        self.no_display()?;
        self.clear()?;
        self.set_entry_mode(CursorDirection::Right, false)?;
        self.display()?;

        Ok(())
    }

    fn set_rs(&mut self, level: bool) -> GpioResult<()> {
        self.interface.write_pin(LcdPin::Rs, level)
    }

    fn set_e(&mut self, level: bool) -> GpioResult<()> {
        self.interface.write_pin(LcdPin::E, level)
    }

    fn write_nibble(&mut self, nibble: u8) -> GpioResult<()> {
        for (bit, pin) in LcdPin::DATA.into_iter().enumerate() {
            self.interface.write_pin(pin, nibble & (1 << bit) != 0)?;
        }
        Ok(())
    }

    fn clock_e(&mut self) -> GpioResult<()> {
        self.set_e(false)?;
        self.set_e(true)
    }

    /// Sends only the low nibble of `command`, as the controller expects while it still
    /// believes the bus is 8 bits wide.
    fn command_4bit(&mut self, command: u8) -> GpioResult<()> {
        trace!("Sending 4-bit command: {:04b}", command & 0x0F);

        self.interface.delay_us(COMMAND_SETUP_US);
        self.set_rs(false)?;
        self.write_nibble(command & 0x0F)?;
        self.clock_e()
    }

    fn send(&mut self, byte: u8, rs: bool) -> GpioResult<()> {
        trace!("Sending data: {:08b}, RS: {}", byte, rs);

        self.interface.delay_us(COMMAND_SETUP_US);
        self.set_rs(rs)?;

        self.write_nibble((byte >> 4) & 0x0F)?;
        self.clock_e()?;

        self.write_nibble(byte & 0x0F)?;
        self.clock_e()
    }

    /// Sends an instruction byte (RS low), high nibble first.
    ///
    /// Does not wait for the instruction to finish.
    pub fn command(&mut self, command: u8) -> GpioResult<()> {
        self.send(command, false)
    }

    /// Sends a data byte (RS high), high nibble first.
    ///
    /// Does not wait for the write to finish.
    pub fn data(&mut self, data: u8) -> GpioResult<()> {
        self.send(data, true)
    }

    fn command_and_wait(&mut self, command: u8, us: u32) -> GpioResult<()> {
        self.command(command)?;
        self.interface.delay_us(us);
        Ok(())
    }

    /// Clears the display and sets the cursor to the home position.
    pub fn clear(&mut self) -> GpioResult<()> {
        self.command_and_wait(CLEAR, LONG_US)
    }

    /// Sets the cursor to the home position and undoes any display shift.
    pub fn home(&mut self) -> GpioResult<()> {
        self.command_and_wait(HOME, LONG_US)
    }

    /// Moves the cursor to `column` of `line`.
    ///
    /// Nothing is validated: lines the addressing does not know start at line 0, and the column
    /// is added to the line start as-is.
    pub fn set_cursor(&mut self, line: u8, column: u8) -> GpioResult<()> {
        let address = self
            .addressing
            .line_base(line, self.columns)
            .wrapping_add(column);
        self.command_and_wait(address, SHORT_US)
    }

    fn update_display_control(&mut self, flag: u8, on: bool) -> GpioResult<()> {
        if on {
            self.display_control |= flag;
        } else {
            self.display_control &= !flag;
        }
        self.command_and_wait(self.display_control, SHORT_US)
    }

    /// Turns the display on. DDRAM contents are kept while it is off.
    pub fn display(&mut self) -> GpioResult<()> {
        self.update_display_control(DISPLAY_ON, true)
    }

    pub fn no_display(&mut self) -> GpioResult<()> {
        self.update_display_control(DISPLAY_ON, false)
    }

    /// Shows the underline cursor.
    pub fn cursor(&mut self) -> GpioResult<()> {
        self.update_display_control(CURSOR_ON, true)
    }

    pub fn no_cursor(&mut self) -> GpioResult<()> {
        self.update_display_control(CURSOR_ON, false)
    }

    /// Blinks the character cell under the cursor.
    pub fn blink(&mut self) -> GpioResult<()> {
        self.update_display_control(BLINK_ON, true)
    }

    pub fn no_blink(&mut self) -> GpioResult<()> {
        self.update_display_control(BLINK_ON, false)
    }

    /// Sets the cursor move direction and whether the display shifts on every write.
    pub fn set_entry_mode(&mut self, direction: CursorDirection, shift: bool) -> GpioResult<()> {
        let mut command = ENTRY_MODE;
        if direction == CursorDirection::Right {
            command |= ENTRY_INCREMENT;
        }
        if shift {
            command |= ENTRY_SHIFT;
        }
        self.command_and_wait(command, SHORT_US)
    }

    /// Shifts the whole display one position to the left without changing DDRAM.
    pub fn scroll_display_left(&mut self) -> GpioResult<()> {
        self.command_and_wait(CURSOR_SHIFT | SHIFT_DISPLAY, SHORT_US)
    }

    /// Shifts the whole display one position to the right without changing DDRAM.
    pub fn scroll_display_right(&mut self) -> GpioResult<()> {
        self.command_and_wait(CURSOR_SHIFT | SHIFT_DISPLAY | SHIFT_RIGHT, SHORT_US)
    }

    /// Stores a 5x8 glyph in CGRAM slot `location`, printable afterwards as character code
    /// `location`.
    ///
    /// Leaves the address counter in CGRAM, so call [Self::set_cursor] or [Self::home] before
    /// writing text again.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if `location` is above 7.
    pub fn create_char(&mut self, location: u8, pattern: [u8; 8]) -> GpioResult<()> {
        if location > 7 {
            return Err(GpioError::InvalidArgument);
        }
        self.command_and_wait(SET_CGRAM_ADDRESS | (location << 3), SHORT_US)?;
        for row in pattern {
            self.write_byte(row & 0b00011111)?;
        }
        Ok(())
    }

    /// Writes a single character code at the cursor.
    pub fn write_byte(&mut self, byte: u8) -> GpioResult<()> {
        self.data(byte)?;
        self.interface.delay_us(SHORT_US);
        Ok(())
    }

    /// Writes bytes up to the first zero byte, or the whole slice if it has none.
    pub fn write(&mut self, bytes: &[u8]) -> GpioResult<()> {
        for &byte in bytes.iter().take_while(|&&b| b != 0) {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Writes every byte of the buffer, zeros included.
    pub fn write_buff(&mut self, buff: &[u8]) -> GpioResult<()> {
        for &byte in buff {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Writes a string, replacing characters outside ASCII with `?`.
    pub fn print(&mut self, s: &str) -> GpioResult<()> {
        for c in s.chars() {
            if c.is_ascii() {
                self.write_byte(c as u8)?;
            } else {
                warn!("Non-ASCII character: {}", c);
                self.write_byte(b'?')?;
            }
        }
        Ok(())
    }

    /// Formats and writes the arguments, see [Self::print].
    ///
    /// ```
    /// # use charlcd_gpio::lcd::hd44780::{Hd44780Lcd, sim::RecordingInterface};
    /// let mut lcd = Hd44780Lcd::init(RecordingInterface::new(), 2, 16).unwrap();
    /// lcd.print_fmt(format_args!("{:02}:{:02}", 9, 5)).unwrap();
    /// ```
    pub fn print_fmt(&mut self, args: Arguments<'_>) -> GpioResult<()> {
        match args.as_str() {
            Some(s) => self.print(s),
            None => self.print(&args.to_string()),
        }
    }

    /// Gets the display control byte, including the command bit.
    pub fn display_control(&self) -> u8 {
        self.display_control
    }

    pub fn lines(&self) -> u8 {
        self.lines
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    pub fn addressing(&self) -> LineAddressing {
        self.addressing
    }

    pub fn interface(&self) -> &I {
        &self.interface
    }

    pub fn interface_mut(&mut self) -> &mut I {
        &mut self.interface
    }

    /// Gives the interface back. The display keeps showing its contents.
    pub fn release(self) -> I {
        self.interface
    }
}

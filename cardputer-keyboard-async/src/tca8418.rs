//! Core implementation of the TCA8418 keypad scanner driver used on the Cardputer ADV.
//!
//! The chip scans the key matrix itself and queues every press and release in a
//! ten-entry FIFO. The driver configures the scan lines once, drains whatever was
//! queued before power-up and then pulls one event per [`KeypadController::poll`].

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use log::{debug, trace, warn};

use crate::config::{wait, Timings, TCA8418_ADDRESS};
use crate::error::{I2cError, InitError};
use crate::event::{KeyEvent, Transition};

// --- Register Addresses ---
pub const REG_CFG: u8 = 0x01;
pub const REG_KEY_LCK_EC: u8 = 0x02;
pub const REG_KEY_EVENT_A: u8 = 0x03;
/// Interrupt status. The driver polls `REG_KEY_LCK_EC` instead.
pub const REG_INT_STAT: u8 = 0x0B;
pub const REG_KP_GPIO1: u8 = 0x1D;
pub const REG_KP_GPIO2: u8 = 0x1E;
pub const REG_KP_GPIO3: u8 = 0x1F;

// --- Configuration values ---
/// ROW0-ROW7 in key-scan mode.
pub const KP_GPIO1_ROWS: u8 = 0xFF;
/// COL0-COL6 in key-scan mode; COL7 stays GPIO.
pub const KP_GPIO2_COLS: u8 = 0x7F;
/// COL8-COL9 are not wired.
pub const KP_GPIO3_COLS: u8 = 0x00;
/// KE_IEN: report key events through the FIFO.
pub const CFG_KE_IEN: u8 = 0x01;

// --- Bitmasks ---
/// Low bit of `REG_KEY_LCK_EC`: at least one event is queued.
pub const KEY_EVENT_PENDING: u8 = 0b0000_0001;
const EVENT_COUNT_MASK: u8 = 0b0000_1111;
const EVENT_PRESSED: u8 = 0b1000_0000;
const EVENT_KEY_MASK: u8 = 0b0111_1111;

/// Events the chip can hold in its FIFO.
pub const FIFO_DEPTH: usize = 10;

/// Configuration writes in the order the chip expects them.
const INIT_SEQUENCE: [(u8, u8); 4] = [
    (REG_KP_GPIO1, KP_GPIO1_ROWS),
    (REG_KP_GPIO2, KP_GPIO2_COLS),
    (REG_KP_GPIO3, KP_GPIO3_COLS),
    (REG_CFG, CFG_KE_IEN),
];

/// Lifecycle of the controller. Only `Ready` allows polling, and no state
/// leads back to an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Constructed, nothing written yet.
    Uninitialized,
    /// Writing the scan-line and configuration registers.
    Configuring,
    /// Discarding events queued before initialization.
    Flushing,
    /// Polling is allowed.
    Ready,
    /// The chip became unreadable during initialization.
    Halted,
}

/// Decodes one byte of `REG_KEY_EVENT_A`.
///
/// Bits 0-6 carry the key index, bit 7 is set for a press and clear for a release.
pub fn decode_event(byte: u8) -> KeyEvent {
    let transition = if byte & EVENT_PRESSED != 0 {
        Transition::Pressed
    } else {
        Transition::Released
    };
    KeyEvent::keypad(byte & EVENT_KEY_MASK, transition)
}

/// A controller for the TCA8418 keypad scanner.
pub struct KeypadController<
    I2cType: I2c<SevenBitAddress, Error = ErrorType>,
    ErrorType: embedded_hal_async::i2c::Error,
    D: DelayNs,
> {
    i2c: I2cType,
    delay: D,
    timings: Timings,
    state: ControllerState,
}

impl<
        I2cType: I2c<SevenBitAddress, Error = ErrorType>,
        ErrorType: embedded_hal_async::i2c::Error,
        D: DelayNs,
    > KeypadController<I2cType, ErrorType, D>
{
    /// Creates a new `KeypadController`.
    ///
    /// # Arguments
    ///
    /// * `i2c` - An I2C peripheral that implements `embedded-hal-async::i2c::I2c`.
    /// * `delay` - Delay provider used for the register settle and poll intervals.
    /// * `timings` - Settle and poll intervals.
    pub fn new(i2c: I2cType, delay: D, timings: Timings) -> Self {
        Self {
            i2c,
            delay,
            timings,
            state: ControllerState::Uninitialized,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    /// Gives back the bus and the delay provider.
    pub fn release(self) -> (I2cType, D) {
        (self.i2c, self.delay)
    }

    /// Configures the keypad matrix and drains the event FIFO.
    ///
    /// Configuration writes are not checked: a failed write is logged and the
    /// sequence goes on. The chip is considered lost only if its event count
    /// register cannot be read once configuration is done, in which case the
    /// controller moves to [`ControllerState::Halted`].
    ///
    /// Returns the number of stale events discarded.
    pub async fn init(&mut self) -> Result<usize, InitError<ErrorType>> {
        if self.state != ControllerState::Uninitialized {
            return Err(InitError::InvalidState(self.state));
        }

        self.state = ControllerState::Configuring;
        debug!("tca8418: configuring keypad matrix");
        for (register, value) in INIT_SEQUENCE {
            if let Err(err) = self.write_register(register, value).await {
                warn!("tca8418: configuration write failed: {err:?}");
            }
            wait(&mut self.delay, self.timings.register_settle).await;
        }

        self.state = ControllerState::Flushing;
        debug!("tca8418: flushing FIFO");
        match self.flush_fifo().await {
            Ok(discarded) => {
                self.state = ControllerState::Ready;
                debug!("tca8418: ready, {discarded} stale events discarded");
                Ok(discarded)
            }
            Err(err) => {
                self.state = ControllerState::Halted;
                Err(err)
            }
        }
    }

    /// Reads and discards events until the pending bit clears.
    ///
    /// A failing status read ends the flush, unless it is the very first one.
    /// At most [`FIFO_DEPTH`] events are discarded, so a stuck pending bit
    /// cannot hold up initialization.
    async fn flush_fifo(&mut self) -> Result<usize, InitError<ErrorType>> {
        let mut discarded = 0;
        let mut readable = false;

        loop {
            let status = match self.read_register(REG_KEY_LCK_EC).await {
                Ok(status) => status,
                Err(err) if !readable => return Err(InitError::Unreadable(err)),
                Err(err) => {
                    warn!("tca8418: flush stopped early: {err:?}");
                    break;
                }
            };
            readable = true;

            if status & KEY_EVENT_PENDING == 0 {
                break;
            }
            if discarded == FIFO_DEPTH {
                warn!("tca8418: pending bit still set after {FIFO_DEPTH} discards");
                break;
            }

            match self.read_register(REG_KEY_EVENT_A).await {
                Ok(byte) => trace!("tca8418: discarding {:?}", decode_event(byte)),
                Err(err) => warn!("tca8418: discard read failed: {err:?}"),
            }
            discarded += 1;
        }

        Ok(discarded)
    }

    /// Pulls at most one event from the FIFO.
    ///
    /// Bus errors are logged and reported as "no event"; the next poll retries.
    /// Returns `None` unless the controller is [`ControllerState::Ready`].
    pub async fn poll(&mut self) -> Option<KeyEvent> {
        if self.state != ControllerState::Ready {
            return None;
        }

        let status = self
            .read_register(REG_KEY_LCK_EC)
            .await
            .map_err(|err| warn!("tca8418: status read failed: {err:?}"))
            .ok()?;

        if status & KEY_EVENT_PENDING == 0 {
            return None;
        }

        let byte = self
            .read_register(REG_KEY_EVENT_A)
            .await
            .map_err(|err| warn!("tca8418: event read failed: {err:?}"))
            .ok()?;

        Some(decode_event(byte))
    }

    /// Number of queued events, from the low nibble of `REG_KEY_LCK_EC`.
    pub async fn pending_events(&mut self) -> Result<u8, I2cError<ErrorType>> {
        Ok(self.read_register(REG_KEY_LCK_EC).await? & EVENT_COUNT_MASK)
    }

    /// Sleeps for the poll interval between two [`Self::poll`] calls.
    pub async fn pause(&mut self) {
        wait(&mut self.delay, self.timings.poll_interval).await;
    }

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), I2cError<ErrorType>> {
        trace!("tca8418: write 0x{register:02X} = 0x{value:02X}");
        self.i2c
            .write(TCA8418_ADDRESS, &[register, value])
            .await
            .map_err(|source| I2cError::Write { register, source })
    }

    async fn read_register(&mut self, register: u8) -> Result<u8, I2cError<ErrorType>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(TCA8418_ADDRESS, &[register], &mut buf)
            .await
            .map_err(|source| I2cError::Read { register, source })?;
        Ok(buf[0])
    }
}

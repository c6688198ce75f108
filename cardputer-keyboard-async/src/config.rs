//! Bus constants and the named intervals every scanner waits on.

use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::SevenBitAddress;

/// Fixed 7-bit I2C address of the TCA8418 keypad scanner.
pub const TCA8418_ADDRESS: SevenBitAddress = 0x34;

/// Bus clock the TCA8418 is driven at.
pub const I2C_FREQUENCY_KHZ: u32 = 400;

/// Physical rows behind the legacy 1-of-8 decoder.
pub const ROW_COUNT: usize = 8;

/// Binary-encoded row-select outputs feeding the decoder.
pub const ROW_SELECT_LINES: usize = 3;

/// Column inputs wired on the legacy matrix.
pub const COLUMN_COUNT: usize = 7;

/// How the legacy matrix scanner turns column levels into events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Report every key found low as a press, once per debounce window while held.
    #[default]
    Level,
    /// Track the previous level of each key and report presses and releases.
    Edge,
}

/// Settle, debounce and polling intervals.
///
/// The defaults match the timing the keyboard hardware was characterised with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Wait after bringing up the I2C bus, before probing for the TCA8418.
    pub bus_settle: Duration,
    /// Quiet period the TCA8418 needs after each configuration write.
    pub register_settle: Duration,
    /// Sleep between two polls of the TCA8418 event FIFO.
    pub poll_interval: Duration,
    /// Wait after selecting a matrix row, before sampling the columns.
    pub row_settle: Duration,
    /// Block after a legacy key press is reported.
    pub debounce: Duration,
    /// Idle period of a halted keyboard between two poll calls.
    pub halt_idle: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            bus_settle: Duration::from_millis(100),
            register_settle: Duration::from_millis(5),
            poll_interval: Duration::from_millis(50),
            row_settle: Duration::from_micros(50),
            debounce: Duration::from_millis(200),
            halt_idle: Duration::from_secs(1),
        }
    }
}

impl Timings {
    pub fn with_bus_settle(mut self, bus_settle: Duration) -> Self {
        self.bus_settle = bus_settle;
        self
    }

    pub fn with_register_settle(mut self, register_settle: Duration) -> Self {
        self.register_settle = register_settle;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_row_settle(mut self, row_settle: Duration) -> Self {
        self.row_settle = row_settle;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_halt_idle(mut self, halt_idle: Duration) -> Self {
        self.halt_idle = halt_idle;
        self
    }
}

/// Sleeps for `duration` on the injected delay provider.
pub(crate) async fn wait<D: DelayNs>(delay: &mut D, duration: Duration) {
    let micros = u32::try_from(duration.as_micros()).unwrap_or(u32::MAX);
    delay.delay_us(micros).await;
}

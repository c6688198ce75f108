//! Tells the two hardware revisions apart.
//!
//! The Cardputer ADV has a TCA8418 at a fixed address; the original board has
//! nothing on those pins. One unacknowledged probe is enough to fall back to the
//! GPIO matrix: there are no retries.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use log::info;

use crate::config::{wait, Timings, TCA8418_ADDRESS};
use crate::error::I2cError;

/// The keyboard hardware found at startup. Fixed for the lifetime of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    /// Cardputer V1.1: GPIO row/column matrix behind a 74HC138.
    LegacyMatrix,
    /// Cardputer ADV: TCA8418 keypad scanner on I2C.
    AdvancedKeypad,
}

/// Sends a zero-length write to `address` and reports whether it was acknowledged.
pub async fn probe<I2cType, ErrorType>(
    i2c: &mut I2cType,
    address: SevenBitAddress,
) -> Result<(), I2cError<ErrorType>>
where
    I2cType: I2c<SevenBitAddress, Error = ErrorType>,
    ErrorType: embedded_hal_async::i2c::Error,
{
    i2c.write(address, &[]).await.map_err(I2cError::Probe)
}

/// Waits for the freshly opened bus to settle, then probes for the TCA8418.
///
/// The bus must already be running at [`crate::config::I2C_FREQUENCY_KHZ`].
/// A missing acknowledge, whatever its cause, selects [`DeviceMode::LegacyMatrix`].
pub async fn detect<I2cType, ErrorType, D>(
    i2c: &mut I2cType,
    delay: &mut D,
    timings: &Timings,
) -> DeviceMode
where
    I2cType: I2c<SevenBitAddress, Error = ErrorType>,
    ErrorType: embedded_hal_async::i2c::Error,
    D: DelayNs,
{
    wait(delay, timings.bus_settle).await;

    match probe(i2c, TCA8418_ADDRESS).await {
        Ok(()) => {
            info!("TCA8418 Detected");
            DeviceMode::AdvancedKeypad
        }
        Err(err) => {
            info!("TCA8418 Not Detected ({err:?})");
            DeviceMode::LegacyMatrix
        }
    }
}

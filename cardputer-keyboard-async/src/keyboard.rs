//! Startup and the poll loop.
//!
//! [`Keyboard::start`] runs detection once and keeps whichever scanner matches the
//! hardware. A TCA8418 that stops answering during initialization leaves the
//! keyboard in the terminal [`Keyboard::Halted`] state.

use embassy_time::Duration;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use log::{error, info, warn};

use crate::config::{wait, Timings};
use crate::detect::{detect, DeviceMode};
use crate::event::KeyEvent;
use crate::matrix::MatrixScanner;
use crate::tca8418::KeypadController;

/// What the keyboard is doing, as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardStatus {
    /// Scanning with the detected hardware.
    Running(DeviceMode),
    /// Initialization failed; no events will ever be produced.
    Halted,
}

/// The active scanner, chosen once at startup.
pub enum Keyboard<I2cType, ErrorType, RowPin, ColPin, D, const N: usize>
where
    I2cType: I2c<SevenBitAddress, Error = ErrorType>,
    ErrorType: embedded_hal_async::i2c::Error,
    D: DelayNs,
{
    /// Cardputer ADV.
    Advanced(KeypadController<I2cType, ErrorType, D>),
    /// Cardputer V1.1.
    Legacy(MatrixScanner<RowPin, ColPin, D, N>),
    /// The TCA8418 was lost during initialization. Requires a reset.
    Halted { delay: D, idle: Duration },
}

impl<I2cType, ErrorType, RowPin, ColPin, D, PinErr, const N: usize>
    Keyboard<I2cType, ErrorType, RowPin, ColPin, D, N>
where
    I2cType: I2c<SevenBitAddress, Error = ErrorType>,
    ErrorType: embedded_hal_async::i2c::Error,
    PinErr: core::fmt::Debug,
    RowPin: OutputPin<Error = PinErr>,
    ColPin: InputPin<Error = PinErr>,
    D: DelayNs,
{
    /// Detects the hardware revision and initializes the matching scanner.
    ///
    /// `build_matrix` is only called when no TCA8418 answers. It receives the bus and
    /// the delay provider so the firmware can release the shared pins before
    /// building the matrix scanner on them.
    pub async fn start<F>(
        mut i2c: I2cType,
        mut delay: D,
        timings: Timings,
        build_matrix: F,
    ) -> Self
    where
        F: FnOnce(I2cType, D) -> MatrixScanner<RowPin, ColPin, D, N>,
    {
        match detect(&mut i2c, &mut delay, &timings).await {
            DeviceMode::AdvancedKeypad => {
                Self::advanced(KeypadController::new(i2c, delay, timings)).await
            }
            DeviceMode::LegacyMatrix => Self::legacy(build_matrix(i2c, delay)),
        }
    }

    /// Initializes a detected TCA8418, halting if it cannot be read.
    pub async fn advanced(mut controller: KeypadController<I2cType, ErrorType, D>) -> Self {
        match controller.init().await {
            Ok(_) => {
                info!("Initialization complete.");
                Self::Advanced(controller)
            }
            Err(err) => {
                error!("Failed to initialize keyboard: {err:?}");
                let idle = controller.timings().halt_idle;
                let (_, delay) = controller.release();
                Self::Halted { delay, idle }
            }
        }
    }

    /// Prepares the GPIO matrix scanner.
    pub fn legacy(mut scanner: MatrixScanner<RowPin, ColPin, D, N>) -> Self {
        if let Err(err) = scanner.init() {
            warn!("matrix: failed to select initial row: {err:?}");
        }
        info!("Detected Cardputer (V1.1)");
        Self::Legacy(scanner)
    }

    pub fn status(&self) -> KeyboardStatus {
        match self {
            Self::Advanced(_) => KeyboardStatus::Running(DeviceMode::AdvancedKeypad),
            Self::Legacy(_) => KeyboardStatus::Running(DeviceMode::LegacyMatrix),
            Self::Halted { .. } => KeyboardStatus::Halted,
        }
    }

    /// One iteration of the poll loop.
    ///
    /// The TCA8418 yields at most one event and then sleeps for the poll interval.
    /// The matrix runs a full scan, its settle and debounce delays being the only
    /// pacing. A halted keyboard only idles.
    ///
    /// Returns the number of events handed to `sink`.
    pub async fn poll_once<F>(&mut self, mut sink: F) -> usize
    where
        F: FnMut(KeyEvent),
    {
        match self {
            Self::Advanced(controller) => {
                let reported = match controller.poll().await {
                    Some(event) => {
                        sink(event);
                        1
                    }
                    None => 0,
                };
                controller.pause().await;
                reported
            }
            Self::Legacy(scanner) => {
                // A failed pass still counts what reached the sink before the error.
                let mut reported = 0;
                let result = scanner
                    .scan(|event| {
                        reported += 1;
                        sink(event);
                    })
                    .await;
                if let Err(err) = result {
                    warn!("matrix: scan failed after {reported} events: {err:?}");
                }
                reported
            }
            Self::Halted { delay, idle } => {
                wait(delay, *idle).await;
                0
            }
        }
    }

    /// Polls forever, logging every event.
    pub async fn run(&mut self) {
        loop {
            self.poll_once(|event| info!("{event}")).await;
        }
    }
}

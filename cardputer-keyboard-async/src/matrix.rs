//! GPIO matrix scanner for the original Cardputer (V1.1).
//!
//! Three outputs drive the A0-A2 inputs of a 74HC138 decoder, which pulls exactly
//! one of the eight rows low. Each column is a pulled-up input, so a closed key
//! reads low while its row is selected.

use embedded_hal::digital::{InputPin, OutputPin, PinState};
use embedded_hal_async::delay::DelayNs;
use log::{debug, trace};

use crate::config::{wait, ScanMode, Timings, ROW_COUNT, ROW_SELECT_LINES};
use crate::error::{PinError, ScanError};
use crate::event::{KeyEvent, Transition};

/// Scans an 8-row matrix with `N` column inputs.
pub struct MatrixScanner<RowPin, ColPin, D, const N: usize> {
    rows: [RowPin; ROW_SELECT_LINES],
    cols: [ColPin; N],
    delay: D,
    timings: Timings,
    mode: ScanMode,
    held: [[bool; N]; ROW_COUNT],
}

impl<RowPin, ColPin, D, PinErr, const N: usize> MatrixScanner<RowPin, ColPin, D, N>
where
    PinErr: core::fmt::Debug,
    RowPin: OutputPin<Error = PinErr>,
    ColPin: InputPin<Error = PinErr>,
    D: DelayNs,
{
    /// Creates a new `MatrixScanner` in [`ScanMode::Level`].
    ///
    /// # Arguments
    ///
    /// * `rows` - Row-select outputs, least significant bit (A0) first.
    /// * `cols` - Column inputs, already configured with a pull-up.
    /// * `delay` - Delay provider for the row settle and debounce intervals.
    /// * `timings` - Settle and debounce intervals.
    pub fn new(
        rows: [RowPin; ROW_SELECT_LINES],
        cols: [ColPin; N],
        delay: D,
        timings: Timings,
    ) -> Self {
        Self {
            rows,
            cols,
            delay,
            timings,
            mode: ScanMode::Level,
            held: [[false; N]; ROW_COUNT],
        }
    }

    pub fn with_mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    /// Gives back the pins and the delay provider.
    pub fn release(self) -> ([RowPin; ROW_SELECT_LINES], [ColPin; N], D) {
        (self.rows, self.cols, self.delay)
    }

    /// Drives the decoder to a known row before the first scan.
    pub fn init(&mut self) -> Result<(), ScanError<PinErr>> {
        debug!("matrix: {} rows x {} columns, {:?} mode", ROW_COUNT, N, self.mode);
        self.select_row(0)
    }

    /// Writes `row` in binary onto the row-select lines, A0 first.
    pub fn select_row(&mut self, row: u8) -> Result<(), ScanError<PinErr>> {
        if usize::from(row) >= ROW_COUNT {
            return Err(ScanError::InvalidRow(row));
        }

        for (line, pin) in self.rows.iter_mut().enumerate() {
            let state = PinState::from((row >> line) & 1 == 1);
            pin.set_state(state)
                .map_err(|source| PinError::RowSelect { line, source })?;
        }
        Ok(())
    }

    /// Runs one pass over all rows and columns, handing each event to `sink`.
    ///
    /// Every reported event is followed by the debounce delay before the pass
    /// continues. In [`ScanMode::Level`] a held key is reported as a press on
    /// every pass; [`ScanMode::Edge`] reports only changes.
    ///
    /// Returns the number of events reported.
    pub async fn scan<F>(&mut self, mut sink: F) -> Result<usize, ScanError<PinErr>>
    where
        F: FnMut(KeyEvent),
    {
        let mut reported = 0;

        for row in 0..ROW_COUNT as u8 {
            self.select_row(row)?;
            wait(&mut self.delay, self.timings.row_settle).await;

            for col in 0..N {
                let low = self.cols[col]
                    .is_low()
                    .map_err(|source| PinError::Column { column: col, source })?;

                let transition = match self.mode {
                    ScanMode::Level => low.then_some(Transition::Pressed),
                    ScanMode::Edge => {
                        let held = &mut self.held[usize::from(row)][col];
                        if low == *held {
                            None
                        } else {
                            *held = low;
                            Some(if low {
                                Transition::Pressed
                            } else {
                                Transition::Released
                            })
                        }
                    }
                };

                if let Some(transition) = transition {
                    let event = KeyEvent::matrix(row, col as u8, transition);
                    trace!("matrix: {event:?}");
                    sink(event);
                    reported += 1;
                    wait(&mut self.delay, self.timings.debounce).await;
                }
            }
        }

        Ok(reported)
    }
}

//! Error types for the keyboard driver.
//!
//! Most transport failures never reach the caller: polling swallows them and
//! reports "no event". These types cover the places where a failure is
//! surfaced, and the log lines of the places where it is not.

use core::fmt::{self, Debug};

use crate::tca8418::ControllerState;

/// An error talking to the TCA8418.
pub enum I2cError<E> {
    /// The zero-length probe transaction was not acknowledged.
    Probe(E),
    /// Writing `register` failed.
    Write { register: u8, source: E },
    /// Reading `register` failed.
    Read { register: u8, source: E },
}

impl<E: Debug> Debug for I2cError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Probe(err) => write!(f, "Probe({err:?})"),
            Self::Write { register, source } => write!(f, "Write(0x{register:02X}, {source:?})"),
            Self::Read { register, source } => write!(f, "Read(0x{register:02X}, {source:?})"),
        }
    }
}

/// Why the TCA8418 could not be brought to its ready state.
pub enum InitError<E> {
    /// The chip acknowledged detection but its status register cannot be read.
    Unreadable(I2cError<E>),
    /// Initialization was attempted from a state other than `Uninitialized`.
    InvalidState(ControllerState),
}

impl<E: Debug> Debug for InitError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable(err) => write!(f, "Unreadable({err:?})"),
            Self::InvalidState(state) => write!(f, "InvalidState({state:?})"),
        }
    }
}

impl<E> From<I2cError<E>> for InitError<E> {
    fn from(err: I2cError<E>) -> Self {
        InitError::Unreadable(err)
    }
}

/// An error related to the matrix GPIO lines.
pub enum PinError<E> {
    /// Driving one of the three row-select outputs failed.
    RowSelect { line: usize, source: E },
    /// Sampling a column input failed.
    Column { column: usize, source: E },
}

impl<E: Debug> Debug for PinError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowSelect { line, source } => write!(f, "RowSelect({line}, {source:?})"),
            Self::Column { column, source } => write!(f, "Column({column}, {source:?})"),
        }
    }
}

/// An error raised while scanning the legacy matrix.
pub enum ScanError<E> {
    /// A GPIO operation failed.
    Pin(PinError<E>),
    /// The requested row does not exist behind the decoder.
    InvalidRow(u8),
}

impl<E: Debug> Debug for ScanError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pin(err) => write!(f, "Pin({err:?})"),
            Self::InvalidRow(row) => write!(f, "InvalidRow({row})"),
        }
    }
}

impl<E> From<PinError<E>> for ScanError<E> {
    fn from(err: PinError<E>) -> Self {
        ScanError::Pin(err)
    }
}

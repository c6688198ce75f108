//! Key events produced by both scanners.

use core::fmt;

/// Position of a key on the legacy row/column matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatrixCoordinate {
    /// Row selected through the decoder (0-7).
    pub row: u8,
    /// Index into the configured column pins.
    pub col: u8,
}

/// Internal key index reported by the TCA8418 (0-127).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeypadId(pub u8);

/// The key an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySource {
    /// A key on the GPIO-scanned matrix.
    Matrix(MatrixCoordinate),
    /// A key reported by the keypad controller.
    Keypad(KeypadId),
}

/// Direction of a key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// The key went down.
    Pressed,
    /// The key came back up.
    Released,
}

/// A single key press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// Which key changed.
    pub source: KeySource,
    /// How it changed.
    pub transition: Transition,
}

impl KeyEvent {
    /// Creates an event for a key on the legacy matrix.
    pub const fn matrix(row: u8, col: u8, transition: Transition) -> Self {
        Self {
            source: KeySource::Matrix(MatrixCoordinate { row, col }),
            transition,
        }
    }

    /// Creates an event for a TCA8418 key index.
    pub const fn keypad(id: u8, transition: Transition) -> Self {
        Self {
            source: KeySource::Keypad(KeypadId(id)),
            transition,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.transition == Transition::Pressed
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.source, self.transition) {
            (KeySource::Keypad(KeypadId(id)), Transition::Pressed) => {
                write!(f, "Key ID: {id} pressed")
            }
            (KeySource::Keypad(KeypadId(id)), Transition::Released) => {
                write!(f, "Key ID: {id} released")
            }
            (KeySource::Matrix(MatrixCoordinate { row, col }), Transition::Pressed) => {
                write!(f, "Key Pressed: Row={row}, Col={col}")
            }
            (KeySource::Matrix(MatrixCoordinate { row, col }), Transition::Released) => {
                write!(f, "Key Released: Row={row}, Col={col}")
            }
        }
    }
}

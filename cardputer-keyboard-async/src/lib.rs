//! An asynchronous, `no_std` keyboard driver for both Cardputer hardware revisions.
//!
//! The original Cardputer (V1.1) wires its keys as an 8x7 matrix: three GPIO lines
//! feed a 74HC138 1-of-8 row decoder and seven pulled-up GPIO inputs read the
//! columns. The Cardputer ADV replaces this with a TCA8418 I2C keypad scanner that
//! queues key transitions in an on-chip FIFO.
//!
//! [`keyboard::Keyboard::start`] probes the I2C bus once, picks the matching
//! scanner for the lifetime of the device and then [`keyboard::Keyboard::run`]
//! logs every key event through the `log` facade.
//!
//! # Usage
//!
//! The driver only needs `embedded-hal` pins, an `embedded-hal-async` I2C bus and a
//! `DelayNs` provider, so the pin map stays with the firmware.
//!
//! ```ignore
//! use cardputer_keyboard_async::config::{Timings, I2C_FREQUENCY_KHZ};
//! use cardputer_keyboard_async::keyboard::Keyboard;
//! use cardputer_keyboard_async::matrix::MatrixScanner;
//! use embassy_time::Delay;
//! use esp_hal::i2c::master::I2c;
//! use esp_hal::time::Rate;
//!
//! #[esp_hal_embassy::main]
//! async fn main(_spawner: Spawner) {
//!     let peripherals = esp_hal::init(esp_hal::Config::default());
//!     let config = esp_hal::i2c::master::Config::default()
//!         .with_frequency(Rate::from_khz(I2C_FREQUENCY_KHZ));
//!     let i2c = I2c::new(peripherals.I2C0, config)
//!         .unwrap()
//!         .with_sda(peripherals.GPIO8)
//!         .with_scl(peripherals.GPIO9)
//!         .into_async();
//!
//!     let mut keyboard = Keyboard::start(i2c, Delay, Timings::default(), |i2c, delay| {
//!         // The legacy board has no TCA8418: release the bus and build the
//!         // row-select outputs and pulled-up column inputs instead.
//!         drop(i2c);
//!         MatrixScanner::new(rows, cols, delay, Timings::default())
//!     })
//!     .await;
//!
//!     keyboard.run().await;
//! }
//! ```

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod detect;
pub mod error;
pub mod event;
pub mod keyboard;
pub mod matrix;
pub mod tca8418;

#[cfg(test)]
mod mock;

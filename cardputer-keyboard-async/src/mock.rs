//! Simulated transports for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{self, I2c, Operation, SevenBitAddress};

use crate::config::ROW_SELECT_LINES;

/// One transaction seen on the simulated bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transaction {
    Probe(SevenBitAddress),
    Write { register: u8, value: u8 },
    Read { register: u8 },
}

#[derive(Default)]
struct Bus {
    present: bool,
    // `None` entries fail the read.
    reads: HashMap<u8, VecDeque<Option<u8>>>,
    log: Vec<Transaction>,
}

/// A scripted TCA8418. Reads of registers with an empty queue return zero.
#[derive(Clone, Default)]
pub struct MockI2c {
    bus: Rc<RefCell<Bus>>,
}

impl MockI2c {
    pub fn present() -> Self {
        let mock = Self::default();
        mock.bus.borrow_mut().present = true;
        mock
    }

    pub fn absent() -> Self {
        Self::default()
    }

    pub fn queue_read(&self, register: u8, value: u8) {
        self.push(register, Some(value));
    }

    pub fn queue_read_error(&self, register: u8) {
        self.push(register, None);
    }

    fn push(&self, register: u8, value: Option<u8>) {
        self.bus
            .borrow_mut()
            .reads
            .entry(register)
            .or_default()
            .push_back(value);
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.bus.borrow().log.clone()
    }

    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.transactions()
            .into_iter()
            .filter_map(|t| match t {
                Transaction::Write { register, value } => Some((register, value)),
                _ => None,
            })
            .collect()
    }

    pub fn reads_of(&self, register: u8) -> usize {
        self.transactions()
            .into_iter()
            .filter(|t| *t == Transaction::Read { register })
            .count()
    }
}

impl i2c::ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    async fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut bus = self.bus.borrow_mut();
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);

        match operations {
            [Operation::Write(bytes)] if bytes.is_empty() => {
                bus.log.push(Transaction::Probe(address));
                if !bus.present {
                    return Err(nack);
                }
            }
            [Operation::Write(bytes)] if bytes.len() == 2 => {
                bus.log.push(Transaction::Write {
                    register: bytes[0],
                    value: bytes[1],
                });
                if !bus.present {
                    return Err(nack);
                }
            }
            [Operation::Write(reg), Operation::Read(buf)] if reg.len() == 1 && buf.len() == 1 => {
                let register = reg[0];
                bus.log.push(Transaction::Read { register });
                if !bus.present {
                    return Err(nack);
                }
                match bus.reads.get_mut(&register).and_then(|q| q.pop_front()) {
                    Some(Some(value)) => buf[0] = value,
                    Some(None) => return Err(ErrorKind::Other),
                    None => buf[0] = 0,
                }
            }
            _ => panic!("unexpected I2C transaction"),
        }
        Ok(())
    }
}

/// A delay provider that advances a virtual clock instead of sleeping.
#[derive(Clone, Default)]
pub struct MockDelay {
    now_us: Rc<Cell<u64>>,
    waits_us: Rc<RefCell<Vec<u64>>>,
}

impl MockDelay {
    pub fn now_us(&self) -> u64 {
        self.now_us.get()
    }

    pub fn waits_us(&self) -> Vec<u64> {
        self.waits_us.borrow().clone()
    }

    fn advance(&self, us: u64) {
        self.now_us.set(self.now_us.get() + us);
        self.waits_us.borrow_mut().push(us);
    }
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.advance(u64::from(ns) / 1_000);
    }

    async fn delay_us(&mut self, us: u32) {
        self.advance(u64::from(us));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.advance(u64::from(ms) * 1_000);
    }
}

#[derive(Default)]
struct Matrix {
    select: [bool; ROW_SELECT_LINES],
    pressed: HashSet<(u8, u8)>,
    failing_columns: HashSet<(u8, u8)>,
    failing_lines: HashSet<usize>,
}

/// Error returned by a failing mock pin.
pub const PIN_FAULT: digital::ErrorKind = digital::ErrorKind::Other;

/// A key matrix behind a 3-to-8 decoder. Columns of the selected row read low
/// when their key is held. Pins can be made to fail.
#[derive(Clone, Default)]
pub struct MockMatrix {
    inner: Rc<RefCell<Matrix>>,
}

impl MockMatrix {
    pub fn press(&self, row: u8, col: u8) {
        self.inner.borrow_mut().pressed.insert((row, col));
    }

    pub fn release(&self, row: u8, col: u8) {
        self.inner.borrow_mut().pressed.remove(&(row, col));
    }

    /// Makes reading `col` fail while `row` is selected.
    pub fn fail_column(&self, row: u8, col: u8) {
        self.inner.borrow_mut().failing_columns.insert((row, col));
    }

    /// Makes driving row-select `line` fail.
    pub fn fail_line(&self, line: usize) {
        self.inner.borrow_mut().failing_lines.insert(line);
    }

    pub fn repair(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.failing_columns.clear();
        inner.failing_lines.clear();
    }

    pub fn select_lines(&self) -> [bool; ROW_SELECT_LINES] {
        self.inner.borrow().select
    }

    pub fn row_pins(&self) -> [MockRowPin; ROW_SELECT_LINES] {
        core::array::from_fn(|line| MockRowPin {
            line,
            matrix: self.clone(),
        })
    }

    pub fn column_pins<const N: usize>(&self) -> [MockColumnPin; N] {
        core::array::from_fn(|col| MockColumnPin {
            col: col as u8,
            matrix: self.clone(),
        })
    }

    fn selected_row(&self) -> u8 {
        self.select_lines()
            .iter()
            .enumerate()
            .fold(0, |row, (line, high)| row | (u8::from(*high) << line))
    }
}

pub struct MockRowPin {
    line: usize,
    matrix: MockMatrix,
}

impl digital::ErrorType for MockRowPin {
    type Error = digital::ErrorKind;
}

impl MockRowPin {
    fn drive(&mut self, high: bool) -> Result<(), digital::ErrorKind> {
        let mut inner = self.matrix.inner.borrow_mut();
        if inner.failing_lines.contains(&self.line) {
            return Err(PIN_FAULT);
        }
        inner.select[self.line] = high;
        Ok(())
    }
}

impl OutputPin for MockRowPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

pub struct MockColumnPin {
    col: u8,
    matrix: MockMatrix,
}

impl digital::ErrorType for MockColumnPin {
    type Error = digital::ErrorKind;
}

impl InputPin for MockColumnPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_low()?)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        let row = self.matrix.selected_row();
        let inner = self.matrix.inner.borrow();
        if inner.failing_columns.contains(&(row, self.col)) {
            return Err(PIN_FAULT);
        }
        Ok(inner.pressed.contains(&(row, self.col)))
    }
}

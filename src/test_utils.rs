//! Testing utilities and mock implementations
//!
//! This module provides host-side doubles for the W5500 and its bus pins.
//!
//! - [`MockChip`]: register-level model of the chip behind [`ChipBus`]
//! - [`PinLog`] / [`MockPin`]: recording GPIO pins for the bus backends
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::vec::Vec;

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};

use crate::driver::error::BusResult;
use crate::hal::ChipBus;
use crate::register::common::{CHIP_VERSION, SIR, VERSIONR};
use crate::register::socket::{
    SN_CR, SN_CR_CLOSE, SN_CR_CONNECT, SN_CR_DISCON, SN_CR_LISTEN, SN_CR_OPEN, SN_CR_RECV,
    SN_CR_SEND, SN_CR_SEND_MAC, SN_IR, SN_MR, SN_MR_MACRAW, SN_MR_TCP, SN_MR_UDP, SN_RX_RD,
    SN_RX_RSR, SN_RX_WR, SN_SR, SN_TX_FSR, SN_TX_RD, SN_TX_WR, SOCK_CLOSED, SOCK_ESTABLISHED,
    SOCK_INIT, SOCK_LISTEN, SOCK_MACRAW, SOCK_UDP,
};
use crate::register::{
    Block, CONTROL_RWB, RegisterAddress, SOCKET_BUFFER_SIZE, SOCKET_COUNT, SocketId,
};

// =============================================================================
// Mock W5500
// =============================================================================

/// Memory key: control byte without RWB and mode bits, plus offset
type Key = (u8, u16);

fn key(addr: RegisterAddress) -> Key {
    (addr.control(), addr.offset())
}

fn slot(index: u8) -> SocketId {
    SocketId::new(index).unwrap_or(SocketId::S0)
}

/// Chip-select window in progress
#[derive(Debug, Default)]
struct Frame {
    header: Vec<u8>,
    start: Option<RegisterAddress>,
    write: bool,
    cursor: u16,
    data: Vec<u8>,
    /// Bytes returned instead of memory for this read
    injected: Vec<u8>,
}

#[derive(Debug, Default)]
struct ChipState {
    memory: HashMap<Key, u8>,
    selected: bool,
    transactions: usize,
    frame: Frame,
    /// (start, data) of every completed write
    writes: Vec<(Key, Vec<u8>)>,
    /// (socket, command) in issue order
    commands: Vec<(u8, u8)>,
    scripts: HashMap<Key, VecDeque<u16>>,
    frozen: HashMap<u8, u8>,
    reads: HashMap<Key, usize>,
    connects_on_listen: [bool; SOCKET_COUNT],
}

impl ChipState {
    fn reset() -> Self {
        let mut state = Self::default();
        state.poke(RegisterAddress::common(VERSIONR), CHIP_VERSION);
        for index in 0..SOCKET_COUNT as u8 {
            state.poke_u16(RegisterAddress::socket(slot(index), SN_TX_FSR), SOCKET_BUFFER_SIZE);
        }
        state
    }

    fn wrap(addr: RegisterAddress) -> RegisterAddress {
        match addr.block() {
            Block::TxBuffer | Block::RxBuffer => RegisterAddress::new(
                addr.block(),
                addr.offset() & (SOCKET_BUFFER_SIZE - 1),
            )
            .with_socket(slot(addr.socket_index())),
            _ => addr,
        }
    }

    fn peek(&self, addr: RegisterAddress) -> u8 {
        self.memory
            .get(&key(Self::wrap(addr)))
            .copied()
            .unwrap_or(0)
    }

    fn poke(&mut self, addr: RegisterAddress, value: u8) {
        self.memory.insert(key(Self::wrap(addr)), value);
    }

    fn peek_u16(&self, addr: RegisterAddress) -> u16 {
        u16::from_be_bytes([self.peek(addr), self.peek(addr.add(1))])
    }

    fn poke_u16(&mut self, addr: RegisterAddress, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.poke(addr, hi);
        self.poke(addr.add(1), lo);
    }

    fn begin_data_phase(&mut self) {
        let [hi, lo, control] = [
            self.frame.header[0],
            self.frame.header[1],
            self.frame.header[2],
        ];
        let offset = u16::from_be_bytes([hi, lo]);
        // drop RWB and the operation mode bits
        let base = control & !(CONTROL_RWB | 0b11);
        let addr = RegisterAddress::new(Block::from_control(base), offset)
            .with_socket(slot(base >> 5));
        self.frame.start = Some(addr);
        self.frame.write = control & CONTROL_RWB != 0;
        self.frame.cursor = 0;

        if self.frame.write {
            return;
        }
        *self.reads.entry(key(addr)).or_insert(0) += 1;
        if let Some(value) = self
            .scripts
            .get_mut(&key(addr))
            .and_then(VecDeque::pop_front)
        {
            self.frame.injected = value.to_be_bytes().to_vec();
        } else if addr.block() == Block::SocketRegisters && addr.offset() == SN_SR {
            if let Some(&raw) = self.frozen.get(&addr.socket_index()) {
                self.frame.injected = std::vec![raw];
            }
        }
    }

    fn data_byte(&mut self, byte: u8) -> u8 {
        let Some(start) = self.frame.start else {
            return 0;
        };
        let addr = start.add(self.frame.cursor);
        let index = self.frame.cursor as usize;
        self.frame.cursor = self.frame.cursor.wrapping_add(1);

        if !self.frame.write {
            return match self.frame.injected.get(index) {
                Some(&value) => value,
                None => self.peek(addr),
            };
        }

        self.frame.data.push(byte);
        if addr.block() == Block::SocketRegisters && addr.offset() == SN_IR {
            // write one to clear
            let remaining = self.peek(addr) & !byte;
            self.poke(addr, remaining);
            if remaining == 0 {
                let sir = RegisterAddress::common(SIR);
                let cleared = self.peek(sir) & !(1 << addr.socket_index());
                self.poke(sir, cleared);
            }
        } else {
            self.poke(addr, byte);
        }
        0
    }

    fn end_frame(&mut self) {
        let frame = core::mem::take(&mut self.frame);
        let Some(start) = frame.start else {
            return;
        };
        if !frame.write {
            return;
        }
        if start.block() == Block::SocketRegisters && start.offset() == SN_CR {
            if let Some(&command) = frame.data.first() {
                self.apply_command(slot(start.socket_index()), command);
            }
        }
        self.writes.push((key(start), frame.data));
    }

    fn apply_command(&mut self, id: SocketId, command: u8) {
        self.commands.push((id.index(), command));
        let reg = |offset| RegisterAddress::socket(id, offset);
        let status = match command {
            SN_CR_OPEN => Some(match self.peek(reg(SN_MR)) & 0x0F {
                SN_MR_TCP => SOCK_INIT,
                SN_MR_UDP => SOCK_UDP,
                SN_MR_MACRAW => SOCK_MACRAW,
                _ => SOCK_CLOSED,
            }),
            SN_CR_LISTEN if self.connects_on_listen[id.as_usize()] => Some(SOCK_ESTABLISHED),
            SN_CR_LISTEN => Some(SOCK_LISTEN),
            SN_CR_CONNECT => Some(SOCK_ESTABLISHED),
            SN_CR_DISCON | SN_CR_CLOSE => Some(SOCK_CLOSED),
            SN_CR_SEND | SN_CR_SEND_MAC => {
                let written = self.peek_u16(reg(SN_TX_WR));
                self.poke_u16(reg(SN_TX_RD), written);
                None
            }
            SN_CR_RECV => {
                let pending = self
                    .peek_u16(reg(SN_RX_WR))
                    .wrapping_sub(self.peek_u16(reg(SN_RX_RD)));
                self.poke_u16(reg(SN_RX_RSR), pending);
                None
            }
            _ => None,
        };
        if let Some(status) = status {
            self.poke(reg(SN_SR), status);
        }
        // command register self-clears
        self.poke(reg(SN_CR), 0);
    }
}

/// Register-level model of a W5500
///
/// Decodes transaction headers, auto-increments through memory, wraps the
/// 2 KiB buffer blocks, applies socket command side effects when chip-select
/// rises and treats Sn_IR as write-one-to-clear.
///
/// Helpers poke and inspect memory without counting as transactions.
///
/// # Example
///
/// ```ignore
/// let chip = MockChip::new();
/// let mut dev = W5500::new(&chip, NetConfig::new());
/// dev.init().unwrap();
/// assert_eq!(chip.common_bytes(SIPR, 4), vec![192, 168, 0, 15]);
/// ```
#[derive(Debug)]
pub struct MockChip {
    state: RefCell<ChipState>,
}

impl Default for MockChip {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChip {
    /// Chip in its power-on state: version 4, every TX ring empty
    pub fn new() -> Self {
        Self {
            state: RefCell::new(ChipState::reset()),
        }
    }

    // -- common block ---------------------------------------------------------

    pub fn set_common_reg(&self, reg: u16, value: u8) {
        self.state
            .borrow_mut()
            .poke(RegisterAddress::common(reg), value);
    }

    pub fn common_reg(&self, reg: u16) -> u8 {
        self.state.borrow().peek(RegisterAddress::common(reg))
    }

    pub fn set_common_bytes(&self, reg: u16, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        let base = RegisterAddress::common(reg);
        for (i, &byte) in bytes.iter().enumerate() {
            state.poke(base.add(i as u16), byte);
        }
    }

    pub fn common_bytes(&self, reg: u16, len: usize) -> Vec<u8> {
        let state = self.state.borrow();
        let base = RegisterAddress::common(reg);
        (0..len).map(|i| state.peek(base.add(i as u16))).collect()
    }

    /// First data byte of every write transaction that started at `reg`
    pub fn common_writes(&self, reg: u16) -> Vec<u8> {
        let wanted = key(RegisterAddress::common(reg));
        self.state
            .borrow()
            .writes
            .iter()
            .filter(|(start, _)| *start == wanted)
            .filter_map(|(_, data)| data.first().copied())
            .collect()
    }

    // -- socket registers -----------------------------------------------------

    pub fn set_socket_reg(&self, id: SocketId, reg: u16, value: u8) {
        self.state
            .borrow_mut()
            .poke(RegisterAddress::socket(id, reg), value);
    }

    pub fn socket_reg(&self, id: SocketId, reg: u16) -> u8 {
        self.state.borrow().peek(RegisterAddress::socket(id, reg))
    }

    pub fn set_socket_u16(&self, id: SocketId, reg: u16, value: u16) {
        self.state
            .borrow_mut()
            .poke_u16(RegisterAddress::socket(id, reg), value);
    }

    pub fn socket_u16(&self, id: SocketId, reg: u16) -> u16 {
        self.state.borrow().peek_u16(RegisterAddress::socket(id, reg))
    }

    pub fn set_socket_bytes(&self, id: SocketId, reg: u16, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        let base = RegisterAddress::socket(id, reg);
        for (i, &byte) in bytes.iter().enumerate() {
            state.poke(base.add(i as u16), byte);
        }
    }

    /// Answer successive read transactions of a 16-bit register from a script
    ///
    /// Memory is used again once the script runs out.
    pub fn script_socket_u16(&self, id: SocketId, reg: u16, values: &[u16]) {
        self.state
            .borrow_mut()
            .scripts
            .entry(key(RegisterAddress::socket(id, reg)))
            .or_default()
            .extend(values.iter().copied());
    }

    /// Make Sn_SR read `raw` no matter what commands are issued
    pub fn freeze_status(&self, id: SocketId, raw: u8) {
        self.state.borrow_mut().frozen.insert(id.index(), raw);
    }

    /// Number of read transactions that started at a socket register
    pub fn reads_of(&self, id: SocketId, reg: u16) -> usize {
        self.state
            .borrow()
            .reads
            .get(&key(RegisterAddress::socket(id, reg)))
            .copied()
            .unwrap_or(0)
    }

    /// LISTEN goes straight to ESTABLISHED, as if a client was waiting
    pub fn listen_connects_immediately(&self, id: SocketId) {
        self.state.borrow_mut().connects_on_listen[id.as_usize()] = true;
    }

    // -- interrupts and buffers -------------------------------------------------

    /// Latch interrupt sources on a socket and flag it in SIR
    pub fn raise_interrupt(&self, id: SocketId, bits: u8) {
        let mut state = self.state.borrow_mut();
        let ir = RegisterAddress::socket(id, SN_IR);
        let latched = state.peek(ir) | bits;
        state.poke(ir, latched);
        let sir = RegisterAddress::common(SIR);
        let flagged = state.peek(sir) | id.bit();
        state.poke(sir, flagged);
    }

    /// Contents of a socket's TX ring, wrapping at the ring end
    pub fn tx_bytes(&self, id: SocketId, start: u16, len: usize) -> Vec<u8> {
        let state = self.state.borrow();
        let base = RegisterAddress::tx_buffer(id, start);
        (0..len).map(|i| state.peek(base.add(i as u16))).collect()
    }

    /// Deliver bytes into a socket's RX ring after anything still pending
    ///
    /// Advances RSR and RX_WR as the chip would on reception.
    pub fn push_rx_bytes(&self, id: SocketId, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        let reg = |offset| RegisterAddress::socket(id, offset);
        let read = state.peek_u16(reg(SN_RX_RD));
        let pending = state.peek_u16(reg(SN_RX_RSR));
        let base = RegisterAddress::rx_buffer(id, read.wrapping_add(pending));
        for (i, &byte) in bytes.iter().enumerate() {
            state.poke(base.add(i as u16), byte);
        }
        let pending = pending.wrapping_add(bytes.len() as u16);
        state.poke_u16(reg(SN_RX_RSR), pending);
        state.poke_u16(reg(SN_RX_WR), read.wrapping_add(pending));
    }

    /// Deliver a MACRAW frame with its two byte length prefix
    pub fn push_rx_frame(&self, id: SocketId, frame: &[u8]) {
        let mut bytes = ((frame.len() + 2) as u16).to_be_bytes().to_vec();
        bytes.extend_from_slice(frame);
        self.push_rx_bytes(id, &bytes);
    }

    // -- logs -----------------------------------------------------------------

    /// Every socket command issued, as (socket, command)
    pub fn commands(&self) -> Vec<(u8, u8)> {
        self.state.borrow().commands.clone()
    }

    /// Number of chip-select windows opened
    pub fn transactions(&self) -> usize {
        self.state.borrow().transactions
    }

    pub fn is_selected(&self) -> bool {
        self.state.borrow().selected
    }
}

impl ChipBus for &MockChip {
    fn select(&mut self) -> BusResult<()> {
        let mut state = self.state.borrow_mut();
        state.selected = true;
        state.transactions += 1;
        state.frame = Frame::default();
        Ok(())
    }

    fn deselect(&mut self) -> BusResult<()> {
        let mut state = self.state.borrow_mut();
        state.end_frame();
        state.selected = false;
        Ok(())
    }

    fn transfer(&mut self, byte: u8) -> BusResult<u8> {
        let mut state = self.state.borrow_mut();
        if state.frame.header.len() < 3 {
            state.frame.header.push(byte);
            if state.frame.header.len() == 3 {
                state.begin_data_phase();
            }
            return Ok(0);
        }
        Ok(state.data_byte(byte))
    }
}

// =============================================================================
// Mock GPIO Pins
// =============================================================================

/// Bus line a [`MockPin`] stands in for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Line {
    Clk,
    Mosi,
    Miso,
    Cs,
}

#[derive(Debug, Default)]
struct PinState {
    /// Output level changes in order
    levels: Vec<(Line, bool)>,
    miso: VecDeque<bool>,
    failing: Option<Line>,
}

/// Shared record of everything the mock pins saw
#[derive(Debug, Default)]
pub struct PinLog {
    state: RefCell<PinState>,
}

impl PinLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin bound to `line` that records into this log
    pub fn pin(&self, line: Line) -> MockPin<'_> {
        MockPin { log: self, line }
    }

    /// Queue eight MISO bits, most significant first
    pub fn queue_miso_byte(&self, byte: u8) {
        let mut state = self.state.borrow_mut();
        for bit in (0..8).rev() {
            state.miso.push_back(byte & (1 << bit) != 0);
        }
    }

    /// Make every level change on `line` fail
    pub fn fail_line(&self, line: Line) {
        self.state.borrow_mut().failing = Some(line);
    }

    pub fn first_level(&self, line: Line) -> Option<bool> {
        self.levels_of(line).first().copied()
    }

    pub fn last_level(&self, line: Line) -> Option<bool> {
        self.levels_of(line).last().copied()
    }

    /// Number of low-to-high clock transitions
    pub fn rising_edges(&self) -> usize {
        self.mosi_at_rising_edges().len()
    }

    /// MOSI level latched at each rising clock edge
    pub fn mosi_at_rising_edges(&self) -> Vec<u8> {
        let state = self.state.borrow();
        let mut clk = false;
        let mut mosi = false;
        let mut sampled = Vec::new();
        for &(line, level) in &state.levels {
            match line {
                Line::Clk => {
                    if level && !clk {
                        sampled.push(mosi as u8);
                    }
                    clk = level;
                }
                Line::Mosi => mosi = level,
                _ => {}
            }
        }
        sampled
    }

    fn levels_of(&self, line: Line) -> Vec<bool> {
        self.state
            .borrow()
            .levels
            .iter()
            .filter(|(l, _)| *l == line)
            .map(|&(_, level)| level)
            .collect()
    }

    fn drive(&self, line: Line, level: bool) -> Result<(), MockPinError> {
        let mut state = self.state.borrow_mut();
        if state.failing == Some(line) {
            return Err(MockPinError);
        }
        state.levels.push((line, level));
        Ok(())
    }

    fn sample(&self, line: Line) -> Result<bool, MockPinError> {
        let mut state = self.state.borrow_mut();
        if state.failing == Some(line) {
            return Err(MockPinError);
        }
        Ok(state.miso.pop_front().unwrap_or(false))
    }
}

/// Pin failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPinError;

impl digital::Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// GPIO pin recording into a [`PinLog`]
#[derive(Debug)]
pub struct MockPin<'a> {
    log: &'a PinLog,
    line: Line,
}

impl ErrorType for MockPin<'_> {
    type Error = MockPinError;
}

impl OutputPin for MockPin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.drive(self.line, false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.drive(self.line, true)
    }
}

impl InputPin for MockPin<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.log.sample(self.line)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.log.sample(self.line).map(|high| !high)
    }
}

// =============================================================================
// Self Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::transport::Transport;

    #[test]
    fn command_side_effects_apply_on_release() {
        let chip = MockChip::new();
        let id = SocketId::S1;
        chip.set_socket_reg(id, SN_MR, SN_MR_UDP);
        let mut t = Transport::new(&chip);

        t.write_u8(RegisterAddress::socket(id, SN_CR), SN_CR_OPEN)
            .unwrap();

        assert_eq!(chip.socket_reg(id, SN_SR), SOCK_UDP);
        assert_eq!(chip.socket_reg(id, SN_CR), 0);
        assert_eq!(chip.commands(), std::vec![(1, SN_CR_OPEN)]);
    }

    #[test]
    fn interrupt_register_clears_on_write_one() {
        let chip = MockChip::new();
        let id = SocketId::S0;
        chip.raise_interrupt(id, 0b0000_0101);
        let mut t = Transport::new(&chip);

        t.write_u8(RegisterAddress::socket(id, SN_IR), 0b0000_0001)
            .unwrap();
        assert_eq!(chip.socket_reg(id, SN_IR), 0b0000_0100);
        assert_eq!(chip.common_reg(SIR), 1);

        t.write_u8(RegisterAddress::socket(id, SN_IR), 0b0000_0100)
            .unwrap();
        assert_eq!(chip.common_reg(SIR), 0);
    }

    #[test]
    fn rx_push_tracks_pending_bytes() {
        let chip = MockChip::new();
        let id = SocketId::S0;
        chip.set_socket_u16(id, SN_RX_RD, 0x07FF);

        chip.push_rx_frame(id, &[0xAA, 0xBB]);

        assert_eq!(chip.socket_u16(id, SN_RX_RSR), 4);
        assert_eq!(chip.socket_u16(id, SN_RX_WR), 0x07FF + 4);
        let mut t = Transport::new(&chip);
        let mut prefix = [0u8; 4];
        t.read(RegisterAddress::rx_buffer(id, 0x07FF), &mut prefix, 4)
            .unwrap();
        assert_eq!(prefix, [0x00, 0x04, 0xAA, 0xBB]);
    }
}

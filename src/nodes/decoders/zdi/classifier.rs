//! Transaction classifier
//!
//! Maps a decoded [`Transaction`] to an [`Action`] by looking up a handler
//! keyed on `(address, direction)`. Handlers may update the
//! [`SessionState`]. Pairs with no handler produce no action.

use super::session::{ByteLane, CpuRegister, SessionState};
use crate::nodes::decoders::types::{Action, Direction, Transaction};
use tracing::trace;

/// Handler for one ZDI register access
pub type Handler = fn(&Transaction, &mut SessionState) -> Option<Action>;

/// Letters for `ZDI_BRK_CTL` bits 7 down to 0
const BREAK_FLAGS: [&str; 8] = ["BN", "B3", "B2", "B1", "B0", "I1", "I0", "S"];

/// `ZDI_STAT` bits and their set/clear letters, in display order
const STATUS_FLAGS: [(u8, char, char); 5] = [
    (7, 'Z', 'z'),
    (5, 'H', 'h'),
    (4, 'A', 'a'),
    (3, 'M', 'm'),
    (2, 'I', 'i'),
];

/// Find the handler for a register access
pub fn lookup(address: u8, direction: Direction) -> Option<Handler> {
    let handler: Handler = match (direction, address) {
        (Direction::Write, 0x00..=0x0e) if address % 4 != 3 => write_address_match,
        (Direction::Write, 0x10) => write_break_control,
        (Direction::Write, 0x13..=0x15) => write_data,
        (Direction::Write, 0x16) => write_rw_control,
        (Direction::Write, 0x21..=0x25) => write_instruction_store,
        (Direction::Read, 0x03) => read_status,
        (Direction::Read, 0x10..=0x12) => read_data,
        (Direction::Read, 0x20) => read_memory,
        _ => return None,
    };
    Some(handler)
}

/// Classify a transaction, applying any session side effects
pub fn classify(tx: &Transaction, state: &mut SessionState) -> Option<Action> {
    let action = lookup(tx.address, tx.direction).and_then(|handler| handler(tx, state));
    if action.is_none() {
        trace!("No action for {}", tx);
    }
    action
}

fn hex(value: impl std::fmt::LowerHex) -> String {
    format!("{:#x}", value)
}

fn named_value(name: &str, value: u8) -> Action {
    Action::new(format!("{}={}", name, hex(value)), hex(value))
}

/// Lane addressed by the low two bits of a register address
fn lane_of(address: u8, base: u8) -> Option<ByteLane> {
    ByteLane::ALL.get(usize::from(address.wrapping_sub(base) & 0x03)).copied()
}

/// Breakpoint flag string for a `ZDI_BRK_CTL` value
pub fn break_flags(value: u8) -> String {
    BREAK_FLAGS
        .iter()
        .enumerate()
        .filter(|(i, _)| value & (0x80u8 >> i) != 0)
        .map(|(_, letters)| *letters)
        .collect()
}

/// Fixed-length status string for a `ZDI_STAT` value
pub fn status_flags(value: u8) -> String {
    STATUS_FLAGS
        .iter()
        .map(|&(bit, set, clear)| if value & (1u8 << bit) != 0 { set } else { clear })
        .collect()
}

fn write_address_match(tx: &Transaction, _state: &mut SessionState) -> Option<Action> {
    let bank = tx.address / 4;
    let lane = lane_of(tx.address, bank * 4)?;
    Some(named_value(
        &format!("ZDI_ADDR{}_{}", bank, lane.suffix()),
        tx.value,
    ))
}

fn write_break_control(tx: &Transaction, _state: &mut SessionState) -> Option<Action> {
    let flags = break_flags(tx.value);
    Some(Action::new(format!("ZDI_BRK_CTL={}", flags), flags))
}

fn write_data(tx: &Transaction, state: &mut SessionState) -> Option<Action> {
    let lane = lane_of(tx.address, 0x13)?;
    state.load_write_byte(lane, tx.value);
    Some(named_value(&format!("ZDI_WR_{}", lane.suffix()), tx.value))
}

fn write_rw_control(tx: &Transaction, state: &mut SessionState) -> Option<Action> {
    let operation = match tx.value {
        0x00..=0x07 => {
            let register = CpuRegister::from_index(tx.value)?;
            state.select_register(register);
            format!("Read {}", register.name())
        }
        0x08 => "Set ADL".to_string(),
        0x09 => "Reset ADL".to_string(),
        0x80..=0x87 => {
            let register = CpuRegister::from_index(tx.value & 0x07)?;
            format!(
                "Write {}={}",
                register.name(),
                hex(state.pending_write_value())
            )
        }
        _ => return None,
    };
    Some(Action::new(format!("ZDI_RW_CTL:{}", operation), operation))
}

fn write_instruction_store(tx: &Transaction, _state: &mut SessionState) -> Option<Action> {
    let index = 0x25 - tx.address;
    Some(named_value(&format!("ZDI_IS{}", index), tx.value))
}

fn read_status(tx: &Transaction, _state: &mut SessionState) -> Option<Action> {
    let flags = status_flags(tx.value);
    Some(Action::new(format!("ZDI_STAT={}", flags), flags))
}

fn read_data(tx: &Transaction, state: &mut SessionState) -> Option<Action> {
    let lane = lane_of(tx.address, 0x10)?;
    state.record_read(lane, tx.value);
    Some(named_value(&format!("ZDI_RD_{}", lane.suffix()), tx.value))
}

fn read_memory(tx: &Transaction, _state: &mut SessionState) -> Option<Action> {
    Some(named_value("ZDI_RD_MEM", tx.value))
}

//! Cycle-counting emulator of the NES (Ricoh 2A03) flavor of MOS 6502

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod addressing;
mod cpu;
mod devices;
mod handlers;
mod interrupts;
mod memory;
mod opcodes;
mod status;
pub mod trace;

mod tests;

pub use crate::addressing::AddressMode;
pub use crate::cpu::*;
pub use crate::devices::*;
pub use crate::interrupts::*;
pub use crate::memory::*;
pub use crate::opcodes::*;
pub use crate::status::Registers;
pub use crate::status::Status;

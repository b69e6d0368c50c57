//! Memory devices

use alloc::vec;
use alloc::vec::Vec;

use crate::Mountable;

/// Size of the console's internal RAM
pub const INTERNAL_RAM_SIZE: usize = 0x0800;

/// The console's 2 KiB work RAM. Mounted over `$0000-$1FFF`, the 2 KiB
/// repeat four times because only 11 address lines reach the chip.
#[derive(Debug, Clone)]
pub struct InternalRam {
    cells: Vec<u8>,
}

impl InternalRam {
    pub fn new() -> Self {
        Self {
            cells: vec![0; INTERNAL_RAM_SIZE],
        }
    }

    #[inline]
    fn mirror(addr: u16) -> usize {
        (addr & 0x07FF) as usize
    }
}

impl Default for InternalRam {
    fn default() -> Self {
        InternalRam::new()
    }
}

impl Mountable for InternalRam {
    fn read(&mut self, addr: u16) -> u8 {
        self.cells[Self::mirror(addr)]
    }

    fn write(&mut self, value: u8, addr: u16) {
        self.cells[Self::mirror(addr)] = value;
    }

    fn peek(&self, addr: u16) -> Option<u8> {
        Some(self.cells[Self::mirror(addr)])
    }
}

/// Plain RAM, e.g. cartridge work RAM or a test bench's whole address
/// space. Accesses past the end wrap around.
#[derive(Debug, Clone)]
pub struct Ram {
    cells: Vec<u8>,
}

impl Ram {
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "RAM must have at least one cell");
        Self {
            cells: vec![0; size],
        }
    }

    #[inline]
    fn index(&self, addr: u16) -> usize {
        addr as usize % self.cells.len()
    }
}

impl Mountable for Ram {
    fn read(&mut self, addr: u16) -> u8 {
        self.cells[self.index(addr)]
    }

    fn write(&mut self, value: u8, addr: u16) {
        let i = self.index(addr);
        self.cells[i] = value;
    }

    fn peek(&self, addr: u16) -> Option<u8> {
        Some(self.cells[self.index(addr)])
    }
}

/// Read-only program memory. An image smaller than its mount repeats
/// across it, like a 16 KiB NROM board in the 32 KiB program window.
/// Writes are dropped: without a mapper there is nothing to receive them.
#[derive(Debug, Clone)]
pub struct Rom {
    bytes: Vec<u8>,
}

impl Rom {
    pub fn new(bytes: Vec<u8>) -> Self {
        assert!(!bytes.is_empty(), "ROM image is empty");
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    fn index(&self, addr: u16) -> usize {
        addr as usize % self.bytes.len()
    }
}

impl Mountable for Rom {
    fn read(&mut self, addr: u16) -> u8 {
        self.bytes[self.index(addr)]
    }

    fn write(&mut self, value: u8, addr: u16) {
        log::warn!("dropped a write of ${value:02X} to ROM offset ${addr:04X}");
    }

    fn peek(&self, addr: u16) -> Option<u8> {
        Some(self.bytes[self.index(addr)])
    }
}

//! Addressing modes
//!
//! Every mode expects the program counter to point just past the opcode
//! and leaves it past the operand bytes.

use crate::Cpu;
use crate::MemoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    /// `#$nn`
    Immediate,
    /// `$nn`
    ZeroPage,
    /// `$nn,X`, wraps within page zero
    ZeroPageX,
    /// `$nn,Y`, wraps within page zero
    ZeroPageY,
    /// `$nnnn`
    Absolute,
    /// `$nnnn,X`
    AbsoluteX,
    /// `$nnnn,Y`
    AbsoluteY,
    /// `($nnnn)`, JMP only
    Indirect,
    /// `($nn,X)`
    IndexedIndirect,
    /// `($nn),Y`
    IndirectIndexed,
    /// Signed offset for branches
    Relative,
}

impl AddressMode {
    /// Bus cycles spent computing the effective address, excluding the
    /// page crossing penalty.
    pub const fn cycles(self) -> u8 {
        match self {
            AddressMode::Immediate => 0,
            AddressMode::ZeroPage | AddressMode::Relative => 1,
            AddressMode::ZeroPageX | AddressMode::ZeroPageY => 2,
            AddressMode::Absolute | AddressMode::AbsoluteX | AddressMode::AbsoluteY => 2,
            AddressMode::IndirectIndexed => 3,
            AddressMode::Indirect | AddressMode::IndexedIndirect => 4,
        }
    }

    /// Operand bytes following the opcode
    pub const fn operand_len(self) -> u16 {
        match self {
            AddressMode::Absolute
            | AddressMode::AbsoluteX
            | AddressMode::AbsoluteY
            | AddressMode::Indirect => 2,
            _ => 1,
        }
    }
}

/// Effective address of an operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub addr: u16,
    /// Indexing carried into the high byte
    pub crossed: bool,
}

impl Resolved {
    #[inline]
    fn direct(addr: u16) -> Self {
        Self {
            addr,
            crossed: false,
        }
    }

    #[inline]
    fn indexed(base: u16, index: u8) -> Self {
        let addr = base.wrapping_add(index.into());
        Self {
            addr,
            crossed: page(base) != page(addr),
        }
    }
}

#[inline]
pub(crate) fn page(addr: u16) -> u16 {
    addr & 0xFF00
}

impl Cpu {
    /// Computes the effective address and charges the mode's cycles.
    pub(crate) fn resolve(&mut self, mode: AddressMode) -> Result<Resolved, MemoryError> {
        let resolved = match mode {
            AddressMode::Immediate => {
                let ea = self.regs.pc;
                self.regs.pc = ea.wrapping_add(1);

                Resolved::direct(ea)
            }
            AddressMode::ZeroPage => Resolved::direct(self.fetch_u8()?.into()),
            AddressMode::ZeroPageX => {
                Resolved::direct(self.fetch_u8()?.wrapping_add(self.regs.x).into())
            }
            AddressMode::ZeroPageY => {
                Resolved::direct(self.fetch_u8()?.wrapping_add(self.regs.y).into())
            }
            AddressMode::Absolute => Resolved::direct(self.fetch_u16()?),
            AddressMode::AbsoluteX => {
                let base = self.fetch_u16()?;
                Resolved::indexed(base, self.regs.x)
            }
            AddressMode::AbsoluteY => {
                let base = self.fetch_u16()?;
                Resolved::indexed(base, self.regs.y)
            }
            AddressMode::Indirect => {
                let ptr = self.fetch_u16()?;
                // The pointer's high byte is fetched without carrying into
                // the page: JMP ($02FF) reads $02FF and $0200.
                let lo = self.read_u8(ptr)?;
                let hi = self.read_u8(page(ptr) | (ptr.wrapping_add(1) & 0x00FF))?;

                Resolved::direct(u16::from_le_bytes([lo, hi]))
            }
            AddressMode::IndexedIndirect => {
                let ptr = self.fetch_u8()?.wrapping_add(self.regs.x);
                Resolved::direct(self.read_zero_page_u16(ptr)?)
            }
            AddressMode::IndirectIndexed => {
                let ptr = self.fetch_u8()?;
                let base = self.read_zero_page_u16(ptr)?;
                Resolved::indexed(base, self.regs.y)
            }
            AddressMode::Relative => {
                let offset = self.fetch_u8()? as i8;
                // PC already points at the following instruction
                Resolved::direct(self.regs.pc.wrapping_add(offset as u16))
            }
        };

        self.charge(mode.cycles().into());

        Ok(resolved)
    }

    /// Little-endian pointer in page zero; the high byte wraps to `$00`.
    fn read_zero_page_u16(&mut self, ptr: u8) -> Result<u16, MemoryError> {
        let lo = self.read_u8(ptr.into())?;
        let hi = self.read_u8(ptr.wrapping_add(1).into())?;

        Ok(u16::from_le_bytes([lo, hi]))
    }
}

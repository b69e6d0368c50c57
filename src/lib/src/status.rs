//! Register file
//!
//! The 2A03 core has four 8-bit registers, the 8-bit status register
//! and the 16-bit program counter.

use core::fmt::Debug;

use bitflags::bitflags;

bitflags! {
    /// SR Flags (bit 7 to bit 0)
    pub struct Status : u8 {
        /// N	Negative
        const NEGATIVE = 0x80;
        /// V	Overflow
        const OVERFLOW = 0x40;
        /// -   Unused (no storage in the register, reads back as `1`
        ///            whenever the register is pushed)
        const UNUSED = 0x20;
        /// B	Break (no storage either, only present in the value
        ///            pushed by BRK and PHP)
        const BREAK = 0x10;
        /// D	Decimal. Stored, but the NES variant has no BCD unit,
        ///            so it has no effect on arithmetic
        const DECIMAL = 0x08;
        /// I	Interrupt (IRQ) disable
        const INTERRUPT_DISABLE = 0x04;
        /// Z	Zero
        const ZERO = 0x02;
        /// C	Carry
        const CARRY = 0x01;
    }
}

impl Status {
    /// Value of the status register at power-on.
    pub const POWER_ON: Status = Status::from_bits_truncate(0x24);

    /// The byte PHP and BRK push: both phantom bits read as `1`.
    #[inline]
    pub fn pushed_by_software(self) -> u8 {
        (self | Status::BREAK | Status::UNUSED).bits()
    }

    /// The byte NMI and IRQ push: the break bit reads as `0`.
    #[inline]
    pub fn pushed_by_hardware(self) -> u8 {
        ((self - Status::BREAK) | Status::UNUSED).bits()
    }

    /// Status as restored by PLP and RTI. The stored value of the
    /// phantom bits is ignored.
    #[inline]
    pub fn pulled(value: u8) -> Status {
        (Status::from_bits_truncate(value) | Status::UNUSED) - Status::BREAK
    }
}

/// True when adding `first` and `second` produced `result` with a sign
/// that neither operand can explain: two positives giving a negative or
/// two negatives giving a positive.
#[inline]
pub fn add_overflowed(first: u8, second: u8, result: u8) -> bool {
    let sign = |v: u8| v & 0x80;
    sign(first) == sign(second) && sign(result) != sign(first)
}

/// True when subtracting `second` from `first` produced `result` with the
/// wrong sign: positive minus negative giving a negative, or negative
/// minus positive giving a positive.
#[inline]
pub fn subtract_overflowed(first: u8, second: u8, result: u8) -> bool {
    let sign = |v: u8| v & 0x80;
    sign(first) != sign(second) && sign(result) == sign(second)
}

/// Register snapshot
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    /// Program counter
    pub pc: u16,
    /// Accumulator
    pub a: u8,
    /// X index register
    pub x: u8,
    /// Y index register
    pub y: u8,
    /// Stack pointer. The stack grows top-down in page 1
    pub sp: u8,
    /// Status register [NV-BDIZC]
    pub p: Status,
}

impl Registers {
    /// Power-on state. The program counter is left for the caller
    /// to load from the reset vector.
    pub fn new() -> Self {
        Self {
            pc: 0,
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            p: Status::POWER_ON,
        }
    }

    pub fn reset(&mut self) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        self.p = Status::POWER_ON;
    }

    #[inline]
    pub fn flag_set(&self, flag: Status) -> bool {
        self.p.contains(flag)
    }
}

impl Default for Registers {
    fn default() -> Self {
        Registers::new()
    }
}

impl Debug for Registers {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "PC:{:04X} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}",
            self.pc,
            self.a,
            self.x,
            self.y,
            self.p.bits(),
            self.sp
        )
    }
}

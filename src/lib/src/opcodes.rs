//! Instruction data
//!
//! One entry per 8-bit opcode. The cycle counts are the totals of the
//! instruction without the page crossing and taken branch penalties.
//! Undocumented opcodes have their mnemonic prefixed with `*`.

use crate::addressing::AddressMode;
use crate::handlers;
use crate::handlers::Handler;

/// What the instruction operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Implied,
    Accumulator,
    Addressed(AddressMode),
}

impl Operand {
    /// Bytes following the opcode
    pub const fn len(self) -> u16 {
        match self {
            Operand::Implied | Operand::Accumulator => 0,
            Operand::Addressed(mode) => mode.operand_len(),
        }
    }
}

#[derive(Clone, Copy)]
pub struct Opcode {
    pub name: &'static str,
    pub(crate) handler: Handler,
    pub operand: Operand,
    pub cycles: u8,
    /// Takes an extra cycle when indexing crosses a page
    pub page_penalty: bool,
}

impl Opcode {
    /// Mnemonic without the undocumented marker
    pub fn mnemonic(&self) -> &'static str {
        self.name.trim_start_matches('*')
    }

    pub fn is_documented(&self) -> bool {
        !self.name.starts_with('*')
    }

    /// Instruction bytes, opcode included
    pub const fn len(&self) -> u16 {
        1 + self.operand.len()
    }

    /// Cycles left after the opcode fetch and the address computation.
    pub(crate) fn base_cycles(&self) -> u8 {
        let addressing = match self.operand {
            Operand::Addressed(mode) => mode.cycles(),
            _ => 0,
        };
        self.cycles - 1 - addressing
    }
}

impl core::fmt::Debug for Opcode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Opcode")
            .field("name", &self.name)
            .field("operand", &self.operand)
            .field("cycles", &self.cycles)
            .field("page_penalty", &self.page_penalty)
            .finish()
    }
}

macro_rules! implied {
    ($name:literal, $handler:ident, $cycles:literal) => {
        Opcode {
            name: $name,
            handler: handlers::$handler,
            operand: Operand::Implied,
            cycles: $cycles,
            page_penalty: false,
        }
    };
}

macro_rules! accumulator {
    ($name:literal, $handler:ident) => {
        Opcode {
            name: $name,
            handler: handlers::$handler,
            operand: Operand::Accumulator,
            cycles: 2,
            page_penalty: false,
        }
    };
}

macro_rules! addressed {
    ($name:literal, $handler:ident, $mode:ident, $cycles:literal) => {
        Opcode {
            name: $name,
            handler: handlers::$handler,
            operand: Operand::Addressed(AddressMode::$mode),
            cycles: $cycles,
            page_penalty: false,
        }
    };
    ($name:literal, $handler:ident, $mode:ident, $cycles:literal, +1) => {
        Opcode {
            name: $name,
            handler: handlers::$handler,
            operand: Operand::Addressed(AddressMode::$mode),
            cycles: $cycles,
            page_penalty: true,
        }
    };
}

pub static OPCODES: [Opcode; 256] = [
    // Mnemonic, handler, mode, cycles                      Opcode
    implied!("BRK", brk, 7),                                // 0x00
    addressed!("ORA", ora, IndexedIndirect, 6),             // 0x01
    implied!("*JAM", jam, 2),                               // 0x02
    addressed!("*SLO", slo, IndexedIndirect, 8),            // 0x03
    addressed!("*NOP", nop, ZeroPage, 3),                   // 0x04
    addressed!("ORA", ora, ZeroPage, 3),                    // 0x05
    addressed!("ASL", asl, ZeroPage, 5),                    // 0x06
    addressed!("*SLO", slo, ZeroPage, 5),                   // 0x07
    implied!("PHP", php, 3),                                // 0x08
    addressed!("ORA", ora, Immediate, 2),                   // 0x09
    accumulator!("ASL", asl),                               // 0x0a
    addressed!("*ANC", anc, Immediate, 2),                  // 0x0b
    addressed!("*NOP", nop, Absolute, 4),                   // 0x0c
    addressed!("ORA", ora, Absolute, 4),                    // 0x0d
    addressed!("ASL", asl, Absolute, 6),                    // 0x0e
    addressed!("*SLO", slo, Absolute, 6),                   // 0x0f
    addressed!("BPL", bpl, Relative, 2),                    // 0x10
    addressed!("ORA", ora, IndirectIndexed, 5, +1),         // 0x11
    implied!("*JAM", jam, 2),                               // 0x12
    addressed!("*SLO", slo, IndirectIndexed, 8),            // 0x13
    addressed!("*NOP", nop, ZeroPageX, 4),                  // 0x14
    addressed!("ORA", ora, ZeroPageX, 4),                   // 0x15
    addressed!("ASL", asl, ZeroPageX, 6),                   // 0x16
    addressed!("*SLO", slo, ZeroPageX, 6),                  // 0x17
    implied!("CLC", clc, 2),                                // 0x18
    addressed!("ORA", ora, AbsoluteY, 4, +1),               // 0x19
    implied!("*NOP", nop, 2),                               // 0x1a
    addressed!("*SLO", slo, AbsoluteY, 7),                  // 0x1b
    addressed!("*NOP", nop, AbsoluteX, 4, +1),              // 0x1c
    addressed!("ORA", ora, AbsoluteX, 4, +1),               // 0x1d
    addressed!("ASL", asl, AbsoluteX, 7),                   // 0x1e
    addressed!("*SLO", slo, AbsoluteX, 7),                  // 0x1f
    addressed!("JSR", jsr, Absolute, 6),                    // 0x20
    addressed!("AND", and, IndexedIndirect, 6),             // 0x21
    implied!("*JAM", jam, 2),                               // 0x22
    addressed!("*RLA", rla, IndexedIndirect, 8),            // 0x23
    addressed!("BIT", bit, ZeroPage, 3),                    // 0x24
    addressed!("AND", and, ZeroPage, 3),                    // 0x25
    addressed!("ROL", rol, ZeroPage, 5),                    // 0x26
    addressed!("*RLA", rla, ZeroPage, 5),                   // 0x27
    implied!("PLP", plp, 4),                                // 0x28
    addressed!("AND", and, Immediate, 2),                   // 0x29
    accumulator!("ROL", rol),                               // 0x2a
    addressed!("*ANC", anc, Immediate, 2),                  // 0x2b
    addressed!("BIT", bit, Absolute, 4),                    // 0x2c
    addressed!("AND", and, Absolute, 4),                    // 0x2d
    addressed!("ROL", rol, Absolute, 6),                    // 0x2e
    addressed!("*RLA", rla, Absolute, 6),                   // 0x2f
    addressed!("BMI", bmi, Relative, 2),                    // 0x30
    addressed!("AND", and, IndirectIndexed, 5, +1),         // 0x31
    implied!("*JAM", jam, 2),                               // 0x32
    addressed!("*RLA", rla, IndirectIndexed, 8),            // 0x33
    addressed!("*NOP", nop, ZeroPageX, 4),                  // 0x34
    addressed!("AND", and, ZeroPageX, 4),                   // 0x35
    addressed!("ROL", rol, ZeroPageX, 6),                   // 0x36
    addressed!("*RLA", rla, ZeroPageX, 6),                  // 0x37
    implied!("SEC", sec, 2),                                // 0x38
    addressed!("AND", and, AbsoluteY, 4, +1),               // 0x39
    implied!("*NOP", nop, 2),                               // 0x3a
    addressed!("*RLA", rla, AbsoluteY, 7),                  // 0x3b
    addressed!("*NOP", nop, AbsoluteX, 4, +1),              // 0x3c
    addressed!("AND", and, AbsoluteX, 4, +1),               // 0x3d
    addressed!("ROL", rol, AbsoluteX, 7),                   // 0x3e
    addressed!("*RLA", rla, AbsoluteX, 7),                  // 0x3f
    implied!("RTI", rti, 6),                                // 0x40
    addressed!("EOR", eor, IndexedIndirect, 6),             // 0x41
    implied!("*JAM", jam, 2),                               // 0x42
    addressed!("*SRE", sre, IndexedIndirect, 8),            // 0x43
    addressed!("*NOP", nop, ZeroPage, 3),                   // 0x44
    addressed!("EOR", eor, ZeroPage, 3),                    // 0x45
    addressed!("LSR", lsr, ZeroPage, 5),                    // 0x46
    addressed!("*SRE", sre, ZeroPage, 5),                   // 0x47
    implied!("PHA", pha, 3),                                // 0x48
    addressed!("EOR", eor, Immediate, 2),                   // 0x49
    accumulator!("LSR", lsr),                               // 0x4a
    addressed!("*ALR", alr, Immediate, 2),                  // 0x4b
    addressed!("JMP", jmp, Absolute, 3),                    // 0x4c
    addressed!("EOR", eor, Absolute, 4),                    // 0x4d
    addressed!("LSR", lsr, Absolute, 6),                    // 0x4e
    addressed!("*SRE", sre, Absolute, 6),                   // 0x4f
    addressed!("BVC", bvc, Relative, 2),                    // 0x50
    addressed!("EOR", eor, IndirectIndexed, 5, +1),         // 0x51
    implied!("*JAM", jam, 2),                               // 0x52
    addressed!("*SRE", sre, IndirectIndexed, 8),            // 0x53
    addressed!("*NOP", nop, ZeroPageX, 4),                  // 0x54
    addressed!("EOR", eor, ZeroPageX, 4),                   // 0x55
    addressed!("LSR", lsr, ZeroPageX, 6),                   // 0x56
    addressed!("*SRE", sre, ZeroPageX, 6),                  // 0x57
    implied!("CLI", cli, 2),                                // 0x58
    addressed!("EOR", eor, AbsoluteY, 4, +1),               // 0x59
    implied!("*NOP", nop, 2),                               // 0x5a
    addressed!("*SRE", sre, AbsoluteY, 7),                  // 0x5b
    addressed!("*NOP", nop, AbsoluteX, 4, +1),              // 0x5c
    addressed!("EOR", eor, AbsoluteX, 4, +1),               // 0x5d
    addressed!("LSR", lsr, AbsoluteX, 7),                   // 0x5e
    addressed!("*SRE", sre, AbsoluteX, 7),                  // 0x5f
    implied!("RTS", rts, 6),                                // 0x60
    addressed!("ADC", adc, IndexedIndirect, 6),             // 0x61
    implied!("*JAM", jam, 2),                               // 0x62
    addressed!("*RRA", rra, IndexedIndirect, 8),            // 0x63
    addressed!("*NOP", nop, ZeroPage, 3),                   // 0x64
    addressed!("ADC", adc, ZeroPage, 3),                    // 0x65
    addressed!("ROR", ror, ZeroPage, 5),                    // 0x66
    addressed!("*RRA", rra, ZeroPage, 5),                   // 0x67
    implied!("PLA", pla, 4),                                // 0x68
    addressed!("ADC", adc, Immediate, 2),                   // 0x69
    accumulator!("ROR", ror),                               // 0x6a
    addressed!("*ARR", arr, Immediate, 2),                  // 0x6b
    addressed!("JMP", jmp, Indirect, 5),                    // 0x6c
    addressed!("ADC", adc, Absolute, 4),                    // 0x6d
    addressed!("ROR", ror, Absolute, 6),                    // 0x6e
    addressed!("*RRA", rra, Absolute, 6),                   // 0x6f
    addressed!("BVS", bvs, Relative, 2),                    // 0x70
    addressed!("ADC", adc, IndirectIndexed, 5, +1),         // 0x71
    implied!("*JAM", jam, 2),                               // 0x72
    addressed!("*RRA", rra, IndirectIndexed, 8),            // 0x73
    addressed!("*NOP", nop, ZeroPageX, 4),                  // 0x74
    addressed!("ADC", adc, ZeroPageX, 4),                   // 0x75
    addressed!("ROR", ror, ZeroPageX, 6),                   // 0x76
    addressed!("*RRA", rra, ZeroPageX, 6),                  // 0x77
    implied!("SEI", sei, 2),                                // 0x78
    addressed!("ADC", adc, AbsoluteY, 4, +1),               // 0x79
    implied!("*NOP", nop, 2),                               // 0x7a
    addressed!("*RRA", rra, AbsoluteY, 7),                  // 0x7b
    addressed!("*NOP", nop, AbsoluteX, 4, +1),              // 0x7c
    addressed!("ADC", adc, AbsoluteX, 4, +1),               // 0x7d
    addressed!("ROR", ror, AbsoluteX, 7),                   // 0x7e
    addressed!("*RRA", rra, AbsoluteX, 7),                  // 0x7f
    addressed!("*NOP", nop, Immediate, 2),                  // 0x80
    addressed!("STA", sta, IndexedIndirect, 6),             // 0x81
    addressed!("*NOP", nop, Immediate, 2),                  // 0x82
    addressed!("*SAX", sax, IndexedIndirect, 6),            // 0x83
    addressed!("STY", sty, ZeroPage, 3),                    // 0x84
    addressed!("STA", sta, ZeroPage, 3),                    // 0x85
    addressed!("STX", stx, ZeroPage, 3),                    // 0x86
    addressed!("*SAX", sax, ZeroPage, 3),                   // 0x87
    implied!("DEY", dey, 2),                                // 0x88
    addressed!("*NOP", nop, Immediate, 2),                  // 0x89
    implied!("TXA", txa, 2),                                // 0x8a
    addressed!("*XAA", xaa, Immediate, 2),                  // 0x8b
    addressed!("STY", sty, Absolute, 4),                    // 0x8c
    addressed!("STA", sta, Absolute, 4),                    // 0x8d
    addressed!("STX", stx, Absolute, 4),                    // 0x8e
    addressed!("*SAX", sax, Absolute, 4),                   // 0x8f
    addressed!("BCC", bcc, Relative, 2),                    // 0x90
    addressed!("STA", sta, IndirectIndexed, 6),             // 0x91
    implied!("*JAM", jam, 2),                               // 0x92
    addressed!("*SHA", sha, IndirectIndexed, 6),            // 0x93
    addressed!("STY", sty, ZeroPageX, 4),                   // 0x94
    addressed!("STA", sta, ZeroPageX, 4),                   // 0x95
    addressed!("STX", stx, ZeroPageY, 4),                   // 0x96
    addressed!("*SAX", sax, ZeroPageY, 4),                  // 0x97
    implied!("TYA", tya, 2),                                // 0x98
    addressed!("STA", sta, AbsoluteY, 5),                   // 0x99
    implied!("TXS", txs, 2),                                // 0x9a
    addressed!("*TAS", tas, AbsoluteY, 5),                  // 0x9b
    addressed!("*SHY", shy, AbsoluteX, 5),                  // 0x9c
    addressed!("STA", sta, AbsoluteX, 5),                   // 0x9d
    addressed!("*SHX", shx, AbsoluteY, 5),                  // 0x9e
    addressed!("*SHA", sha, AbsoluteY, 5),                  // 0x9f
    addressed!("LDY", ldy, Immediate, 2),                   // 0xa0
    addressed!("LDA", lda, IndexedIndirect, 6),             // 0xa1
    addressed!("LDX", ldx, Immediate, 2),                   // 0xa2
    addressed!("*LAX", lax, IndexedIndirect, 6),            // 0xa3
    addressed!("LDY", ldy, ZeroPage, 3),                    // 0xa4
    addressed!("LDA", lda, ZeroPage, 3),                    // 0xa5
    addressed!("LDX", ldx, ZeroPage, 3),                    // 0xa6
    addressed!("*LAX", lax, ZeroPage, 3),                   // 0xa7
    implied!("TAY", tay, 2),                                // 0xa8
    addressed!("LDA", lda, Immediate, 2),                   // 0xa9
    implied!("TAX", tax, 2),                                // 0xaa
    addressed!("*LXA", lxa, Immediate, 2),                  // 0xab
    addressed!("LDY", ldy, Absolute, 4),                    // 0xac
    addressed!("LDA", lda, Absolute, 4),                    // 0xad
    addressed!("LDX", ldx, Absolute, 4),                    // 0xae
    addressed!("*LAX", lax, Absolute, 4),                   // 0xaf
    addressed!("BCS", bcs, Relative, 2),                    // 0xb0
    addressed!("LDA", lda, IndirectIndexed, 5, +1),         // 0xb1
    implied!("*JAM", jam, 2),                               // 0xb2
    addressed!("*LAX", lax, IndirectIndexed, 5, +1),        // 0xb3
    addressed!("LDY", ldy, ZeroPageX, 4),                   // 0xb4
    addressed!("LDA", lda, ZeroPageX, 4),                   // 0xb5
    addressed!("LDX", ldx, ZeroPageY, 4),                   // 0xb6
    addressed!("*LAX", lax, ZeroPageY, 4),                  // 0xb7
    implied!("CLV", clv, 2),                                // 0xb8
    addressed!("LDA", lda, AbsoluteY, 4, +1),               // 0xb9
    implied!("TSX", tsx, 2),                                // 0xba
    addressed!("*LAS", las, AbsoluteY, 4, +1),              // 0xbb
    addressed!("LDY", ldy, AbsoluteX, 4, +1),               // 0xbc
    addressed!("LDA", lda, AbsoluteX, 4, +1),               // 0xbd
    addressed!("LDX", ldx, AbsoluteY, 4, +1),               // 0xbe
    addressed!("*LAX", lax, AbsoluteY, 4, +1),              // 0xbf
    addressed!("CPY", cpy, Immediate, 2),                   // 0xc0
    addressed!("CMP", cmp, IndexedIndirect, 6),             // 0xc1
    addressed!("*NOP", nop, Immediate, 2),                  // 0xc2
    addressed!("*DCP", dcp, IndexedIndirect, 8),            // 0xc3
    addressed!("CPY", cpy, ZeroPage, 3),                    // 0xc4
    addressed!("CMP", cmp, ZeroPage, 3),                    // 0xc5
    addressed!("DEC", dec, ZeroPage, 5),                    // 0xc6
    addressed!("*DCP", dcp, ZeroPage, 5),                   // 0xc7
    implied!("INY", iny, 2),                                // 0xc8
    addressed!("CMP", cmp, Immediate, 2),                   // 0xc9
    implied!("DEX", dex, 2),                                // 0xca
    addressed!("*AXS", axs, Immediate, 2),                  // 0xcb
    addressed!("CPY", cpy, Absolute, 4),                    // 0xcc
    addressed!("CMP", cmp, Absolute, 4),                    // 0xcd
    addressed!("DEC", dec, Absolute, 6),                    // 0xce
    addressed!("*DCP", dcp, Absolute, 6),                   // 0xcf
    addressed!("BNE", bne, Relative, 2),                    // 0xd0
    addressed!("CMP", cmp, IndirectIndexed, 5, +1),         // 0xd1
    implied!("*JAM", jam, 2),                               // 0xd2
    addressed!("*DCP", dcp, IndirectIndexed, 8),            // 0xd3
    addressed!("*NOP", nop, ZeroPageX, 4),                  // 0xd4
    addressed!("CMP", cmp, ZeroPageX, 4),                   // 0xd5
    addressed!("DEC", dec, ZeroPageX, 6),                   // 0xd6
    addressed!("*DCP", dcp, ZeroPageX, 6),                  // 0xd7
    implied!("CLD", cld, 2),                                // 0xd8
    addressed!("CMP", cmp, AbsoluteY, 4, +1),               // 0xd9
    implied!("*NOP", nop, 2),                               // 0xda
    addressed!("*DCP", dcp, AbsoluteY, 7),                  // 0xdb
    addressed!("*NOP", nop, AbsoluteX, 4, +1),              // 0xdc
    addressed!("CMP", cmp, AbsoluteX, 4, +1),               // 0xdd
    addressed!("DEC", dec, AbsoluteX, 7),                   // 0xde
    addressed!("*DCP", dcp, AbsoluteX, 7),                  // 0xdf
    addressed!("CPX", cpx, Immediate, 2),                   // 0xe0
    addressed!("SBC", sbc, IndexedIndirect, 6),             // 0xe1
    addressed!("*NOP", nop, Immediate, 2),                  // 0xe2
    addressed!("*ISB", isb, IndexedIndirect, 8),            // 0xe3
    addressed!("CPX", cpx, ZeroPage, 3),                    // 0xe4
    addressed!("SBC", sbc, ZeroPage, 3),                    // 0xe5
    addressed!("INC", inc, ZeroPage, 5),                    // 0xe6
    addressed!("*ISB", isb, ZeroPage, 5),                   // 0xe7
    implied!("INX", inx, 2),                                // 0xe8
    addressed!("SBC", sbc, Immediate, 2),                   // 0xe9
    implied!("NOP", nop, 2),                                // 0xea
    addressed!("*SBC", sbc, Immediate, 2),                  // 0xeb
    addressed!("CPX", cpx, Absolute, 4),                    // 0xec
    addressed!("SBC", sbc, Absolute, 4),                    // 0xed
    addressed!("INC", inc, Absolute, 6),                    // 0xee
    addressed!("*ISB", isb, Absolute, 6),                   // 0xef
    addressed!("BEQ", beq, Relative, 2),                    // 0xf0
    addressed!("SBC", sbc, IndirectIndexed, 5, +1),         // 0xf1
    implied!("*JAM", jam, 2),                               // 0xf2
    addressed!("*ISB", isb, IndirectIndexed, 8),            // 0xf3
    addressed!("*NOP", nop, ZeroPageX, 4),                  // 0xf4
    addressed!("SBC", sbc, ZeroPageX, 4),                   // 0xf5
    addressed!("INC", inc, ZeroPageX, 6),                   // 0xf6
    addressed!("*ISB", isb, ZeroPageX, 6),                  // 0xf7
    implied!("SED", sed, 2),                                // 0xf8
    addressed!("SBC", sbc, AbsoluteY, 4, +1),               // 0xf9
    implied!("*NOP", nop, 2),                               // 0xfa
    addressed!("*ISB", isb, AbsoluteY, 7),                  // 0xfb
    addressed!("*NOP", nop, AbsoluteX, 4, +1),              // 0xfc
    addressed!("SBC", sbc, AbsoluteX, 4, +1),               // 0xfd
    addressed!("INC", inc, AbsoluteX, 7),                   // 0xfe
    addressed!("*ISB", isb, AbsoluteX, 7),                  // 0xff
];

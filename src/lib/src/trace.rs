//! Execution trace in the format of the well-known `nestest.log`:
//!
//! ```text
//! C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD CYC:7
//! ```
//!
//! The line is built from side-effect-free reads only, bytes that
//! cannot be peeked are shown as `??`.

use alloc::format;
use alloc::string::String;

use crate::addressing::AddressMode;
use crate::opcodes::Operand;
use crate::opcodes::OPCODES;
use crate::Cpu;

struct Byte(Option<u8>);

impl core::fmt::Display for Byte {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.0 {
            Some(b) => write!(f, "{b:02X}"),
            None => f.write_str("??"),
        }
    }
}

/// Renders the operand the way an assembler would accept it.
fn operand_text(operand: Operand, pc: u16, lo: Byte, hi: Byte) -> String {
    match operand {
        Operand::Implied => String::new(),
        Operand::Accumulator => String::from("A"),
        Operand::Addressed(mode) => match mode {
            AddressMode::Immediate => format!("#${lo}"),
            AddressMode::ZeroPage => format!("${lo}"),
            AddressMode::ZeroPageX => format!("${lo},X"),
            AddressMode::ZeroPageY => format!("${lo},Y"),
            AddressMode::Absolute => format!("${hi}{lo}"),
            AddressMode::AbsoluteX => format!("${hi}{lo},X"),
            AddressMode::AbsoluteY => format!("${hi}{lo},Y"),
            AddressMode::Indirect => format!("(${hi}{lo})"),
            AddressMode::IndexedIndirect => format!("(${lo},X)"),
            AddressMode::IndirectIndexed => format!("(${lo}),Y"),
            AddressMode::Relative => match lo.0 {
                Some(offset) => {
                    let target = pc.wrapping_add(2).wrapping_add(offset as i8 as u16);
                    format!("${target:04X}")
                }
                None => String::from("$????"),
            },
        },
    }
}

/// One trace line for the instruction about to execute.
pub fn trace_line(cpu: &Cpu) -> String {
    let regs = cpu.registers();
    let memory = cpu.memory();
    let pc = regs.pc;

    let (bytes, text) = match memory.peek(pc) {
        Some(opcode) => {
            let insn = &OPCODES[opcode as usize];
            let lo = || Byte(memory.peek(pc.wrapping_add(1)));
            let hi = || Byte(memory.peek(pc.wrapping_add(2)));

            let bytes = match insn.len() {
                1 => format!("{opcode:02X}"),
                2 => format!("{opcode:02X} {}", lo()),
                _ => format!("{opcode:02X} {} {}", lo(), hi()),
            };
            let text = format!(
                "{:>4} {}",
                insn.name,
                operand_text(insn.operand, pc, lo(), hi())
            );

            (bytes, text)
        }
        None => (String::from("??"), String::from(" ???")),
    };

    format!(
        "{pc:04X}  {bytes:<8} {text:<32} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
        regs.a,
        regs.x,
        regs.y,
        regs.p.bits(),
        regs.sp,
        cpu.cycles()
    )
}

//! Instruction handlers
//!
//! Every handler receives the operand location resolved by the
//! addressing mode and returns after the last bus access of the
//! instruction. The cycles are charged by the caller from the opcode
//! table, handlers only add the branch penalties.

use crate::addressing::page;
use crate::interrupts::IRQ_BRK_VECTOR;
use crate::status::add_overflowed;
use crate::status::subtract_overflowed;
use crate::Cpu;
use crate::MemoryError;
use crate::Status;

/// Where the operand lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// No operand
    Implied,
    /// The accumulator
    Accumulator,
    /// Effective address on the bus
    Memory(u16),
}

pub(crate) type Handler = fn(&mut Cpu, Location) -> Result<(), MemoryError>;

type Insn = Result<(), MemoryError>;

impl Cpu {
    fn read_operand(&mut self, loc: Location) -> Result<u8, MemoryError> {
        match loc {
            Location::Accumulator => Ok(self.regs.a),
            Location::Memory(addr) => self.read_u8(addr),
            Location::Implied => unreachable!("implied instructions have no operand"),
        }
    }

    fn write_operand(&mut self, value: u8, loc: Location) -> Result<(), MemoryError> {
        match loc {
            Location::Accumulator => self.regs.a = value,
            Location::Memory(addr) => self.write_u8(value, addr)?,
            Location::Implied => unreachable!("implied instructions have no operand"),
        }

        Ok(())
    }

    /// Read-modify-write. The old value goes back to the bus before the
    /// new one, as the hardware does.
    fn modify(&mut self, loc: Location, op: fn(&mut Cpu, u8) -> u8) -> Result<u8, MemoryError> {
        let value = self.read_operand(loc)?;
        if let Location::Memory(addr) = loc {
            self.write_u8(value, addr)?;
        }
        let result = op(self, value);
        self.write_operand(result, loc)?;

        Ok(result)
    }

    fn target(loc: Location) -> u16 {
        match loc {
            Location::Memory(addr) => addr,
            _ => unreachable!("instruction needs an address"),
        }
    }

    fn add(&mut self, value: u8) {
        let a = self.regs.a;
        let sum = a as u16 + value as u16 + self.flag(Status::CARRY) as u16;
        let result = sum as u8;

        self.set_flag(Status::CARRY, sum > 0xFF);
        self.set_flag(Status::OVERFLOW, add_overflowed(a, value, result));
        self.regs.a = result;
        self.set_nz(result);
    }

    fn subtract(&mut self, value: u8) {
        let a = self.regs.a;
        let borrow = !self.flag(Status::CARRY) as u16;
        let diff = (a as u16).wrapping_sub(value as u16).wrapping_sub(borrow);
        let result = diff as u8;

        self.set_flag(Status::CARRY, diff <= 0xFF);
        self.set_flag(Status::OVERFLOW, subtract_overflowed(a, value, result));
        self.regs.a = result;
        self.set_nz(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.set_flag(Status::CARRY, register >= value);
        self.set_nz(register.wrapping_sub(value));
    }

    fn load_a(&mut self, value: u8) {
        self.regs.a = value;
        self.set_nz(value);
    }

    fn load_x(&mut self, value: u8) {
        self.regs.x = value;
        self.set_nz(value);
    }

    fn load_y(&mut self, value: u8) {
        self.regs.y = value;
        self.set_nz(value);
    }

    fn shift_left(&mut self, value: u8) -> u8 {
        self.set_flag(Status::CARRY, value & 0x80 != 0);
        let result = value << 1;
        self.set_nz(result);
        result
    }

    fn shift_right(&mut self, value: u8) -> u8 {
        self.set_flag(Status::CARRY, value & 0x01 != 0);
        let result = value >> 1;
        self.set_nz(result);
        result
    }

    fn rotate_left(&mut self, value: u8) -> u8 {
        let carry_in = self.flag(Status::CARRY) as u8;
        self.set_flag(Status::CARRY, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.set_nz(result);
        result
    }

    fn rotate_right(&mut self, value: u8) -> u8 {
        let carry_in = (self.flag(Status::CARRY) as u8) << 7;
        self.set_flag(Status::CARRY, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.set_nz(result);
        result
    }

    fn increment(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.set_nz(result);
        result
    }

    fn decrement(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.set_nz(result);
        result
    }

    fn branch(&mut self, loc: Location, taken: bool) -> Insn {
        if taken {
            let target = Cpu::target(loc);
            self.charge(1);
            if page(target) != page(self.regs.pc) {
                self.charge(1);
            }
            self.regs.pc = target;
        }

        Ok(())
    }

    /// The SHA/SHX/SHY/TAS family: stores `value & (H + 1)` where `H` is
    /// the high byte of the unindexed address. When indexing crossed a
    /// page the stored value also replaces the high byte of the target.
    fn store_high_and(&mut self, loc: Location, value: u8, index: u8) -> Insn {
        let addr = Cpu::target(loc);
        let base = addr.wrapping_sub(index.into());
        let data = value & ((base >> 8) as u8).wrapping_add(1);
        let addr = if page(base) != page(addr) {
            (u16::from(data) << 8) | (addr & 0x00FF)
        } else {
            addr
        };

        self.write_u8(data, addr)
    }
}

// Loads and stores

pub(crate) fn lda(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.read_operand(loc)?;
    cpu.load_a(value);
    Ok(())
}

pub(crate) fn ldx(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.read_operand(loc)?;
    cpu.load_x(value);
    Ok(())
}

pub(crate) fn ldy(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.read_operand(loc)?;
    cpu.load_y(value);
    Ok(())
}

pub(crate) fn sta(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.write_operand(cpu.regs.a, loc)
}

pub(crate) fn stx(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.write_operand(cpu.regs.x, loc)
}

pub(crate) fn sty(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.write_operand(cpu.regs.y, loc)
}

// Transfers

pub(crate) fn tax(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.load_x(cpu.regs.a);
    Ok(())
}

pub(crate) fn tay(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.load_y(cpu.regs.a);
    Ok(())
}

pub(crate) fn txa(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.load_a(cpu.regs.x);
    Ok(())
}

pub(crate) fn tya(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.load_a(cpu.regs.y);
    Ok(())
}

pub(crate) fn tsx(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.load_x(cpu.regs.sp);
    Ok(())
}

/// The only transfer that leaves the flags alone
pub(crate) fn txs(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.regs.sp = cpu.regs.x;
    Ok(())
}

// Stack

pub(crate) fn pha(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.push_u8(cpu.regs.a)
}

pub(crate) fn php(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.push_u8(cpu.regs.p.pushed_by_software())
}

pub(crate) fn pla(cpu: &mut Cpu, _: Location) -> Insn {
    let value = cpu.pull_u8()?;
    cpu.load_a(value);
    Ok(())
}

pub(crate) fn plp(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.regs.p = Status::pulled(cpu.pull_u8()?);
    Ok(())
}

// Logic and arithmetic

pub(crate) fn and(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.read_operand(loc)?;
    cpu.load_a(cpu.regs.a & value);
    Ok(())
}

pub(crate) fn ora(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.read_operand(loc)?;
    cpu.load_a(cpu.regs.a | value);
    Ok(())
}

pub(crate) fn eor(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.read_operand(loc)?;
    cpu.load_a(cpu.regs.a ^ value);
    Ok(())
}

pub(crate) fn bit(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.read_operand(loc)?;
    cpu.set_flag(Status::ZERO, cpu.regs.a & value == 0);
    cpu.set_flag(Status::NEGATIVE, value & 0x80 != 0);
    cpu.set_flag(Status::OVERFLOW, value & 0x40 != 0);
    Ok(())
}

pub(crate) fn adc(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.read_operand(loc)?;
    cpu.add(value);
    Ok(())
}

pub(crate) fn sbc(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.read_operand(loc)?;
    cpu.subtract(value);
    Ok(())
}

pub(crate) fn cmp(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.read_operand(loc)?;
    cpu.compare(cpu.regs.a, value);
    Ok(())
}

pub(crate) fn cpx(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.read_operand(loc)?;
    cpu.compare(cpu.regs.x, value);
    Ok(())
}

pub(crate) fn cpy(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.read_operand(loc)?;
    cpu.compare(cpu.regs.y, value);
    Ok(())
}

// Increments, decrements, shifts

pub(crate) fn inc(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.modify(loc, Cpu::increment).map(drop)
}

pub(crate) fn dec(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.modify(loc, Cpu::decrement).map(drop)
}

pub(crate) fn inx(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.regs.x = cpu.increment(cpu.regs.x);
    Ok(())
}

pub(crate) fn iny(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.regs.y = cpu.increment(cpu.regs.y);
    Ok(())
}

pub(crate) fn dex(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.regs.x = cpu.decrement(cpu.regs.x);
    Ok(())
}

pub(crate) fn dey(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.regs.y = cpu.decrement(cpu.regs.y);
    Ok(())
}

pub(crate) fn asl(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.modify(loc, Cpu::shift_left).map(drop)
}

pub(crate) fn lsr(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.modify(loc, Cpu::shift_right).map(drop)
}

pub(crate) fn rol(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.modify(loc, Cpu::rotate_left).map(drop)
}

pub(crate) fn ror(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.modify(loc, Cpu::rotate_right).map(drop)
}

// Jumps and calls

pub(crate) fn jmp(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.regs.pc = Cpu::target(loc);
    Ok(())
}

/// Pushes the address of its own last byte
pub(crate) fn jsr(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.push_u16(cpu.regs.pc.wrapping_sub(1))?;
    cpu.regs.pc = Cpu::target(loc);
    Ok(())
}

pub(crate) fn rts(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.regs.pc = cpu.pull_u16()?.wrapping_add(1);
    Ok(())
}

pub(crate) fn rti(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.regs.p = Status::pulled(cpu.pull_u8()?);
    cpu.regs.pc = cpu.pull_u16()?;
    Ok(())
}

/// Software interrupt. The byte after the opcode is skipped, so the
/// handler returns two bytes past BRK.
pub(crate) fn brk(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.push_u16(cpu.regs.pc.wrapping_add(1))?;
    cpu.push_u8(cpu.regs.p.pushed_by_software())?;
    cpu.set_flag(Status::INTERRUPT_DISABLE, true);
    cpu.regs.pc = cpu.read_u16(IRQ_BRK_VECTOR)?;
    Ok(())
}

// Branches

pub(crate) fn bcc(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.branch(loc, !cpu.flag(Status::CARRY))
}

pub(crate) fn bcs(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.branch(loc, cpu.flag(Status::CARRY))
}

pub(crate) fn bne(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.branch(loc, !cpu.flag(Status::ZERO))
}

pub(crate) fn beq(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.branch(loc, cpu.flag(Status::ZERO))
}

pub(crate) fn bpl(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.branch(loc, !cpu.flag(Status::NEGATIVE))
}

pub(crate) fn bmi(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.branch(loc, cpu.flag(Status::NEGATIVE))
}

pub(crate) fn bvc(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.branch(loc, !cpu.flag(Status::OVERFLOW))
}

pub(crate) fn bvs(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.branch(loc, cpu.flag(Status::OVERFLOW))
}

// Flags

pub(crate) fn clc(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.set_flag(Status::CARRY, false);
    Ok(())
}

pub(crate) fn sec(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.set_flag(Status::CARRY, true);
    Ok(())
}

pub(crate) fn cli(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.set_flag(Status::INTERRUPT_DISABLE, false);
    Ok(())
}

pub(crate) fn sei(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.set_flag(Status::INTERRUPT_DISABLE, true);
    Ok(())
}

pub(crate) fn cld(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.set_flag(Status::DECIMAL, false);
    Ok(())
}

pub(crate) fn sed(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.set_flag(Status::DECIMAL, true);
    Ok(())
}

pub(crate) fn clv(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.set_flag(Status::OVERFLOW, false);
    Ok(())
}

/// Addressed forms still read their operand
pub(crate) fn nop(cpu: &mut Cpu, loc: Location) -> Insn {
    if let Location::Memory(addr) = loc {
        cpu.read_u8(addr)?;
    }
    Ok(())
}

// Undocumented, combined read-modify-write

pub(crate) fn slo(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.modify(loc, Cpu::shift_left)?;
    cpu.load_a(cpu.regs.a | value);
    Ok(())
}

pub(crate) fn rla(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.modify(loc, Cpu::rotate_left)?;
    cpu.load_a(cpu.regs.a & value);
    Ok(())
}

pub(crate) fn sre(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.modify(loc, Cpu::shift_right)?;
    cpu.load_a(cpu.regs.a ^ value);
    Ok(())
}

pub(crate) fn rra(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.modify(loc, Cpu::rotate_right)?;
    cpu.add(value);
    Ok(())
}

pub(crate) fn dcp(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.modify(loc, Cpu::decrement)?;
    cpu.compare(cpu.regs.a, value);
    Ok(())
}

pub(crate) fn isb(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.modify(loc, Cpu::increment)?;
    cpu.subtract(value);
    Ok(())
}

// Undocumented loads and stores

pub(crate) fn lax(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.read_operand(loc)?;
    cpu.load_a(value);
    cpu.load_x(value);
    Ok(())
}

pub(crate) fn sax(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.write_operand(cpu.regs.a & cpu.regs.x, loc)
}

pub(crate) fn las(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.read_operand(loc)? & cpu.regs.sp;
    cpu.regs.sp = value;
    cpu.load_a(value);
    cpu.load_x(value);
    Ok(())
}

pub(crate) fn sha(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.store_high_and(loc, cpu.regs.a & cpu.regs.x, cpu.regs.y)
}

pub(crate) fn shx(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.store_high_and(loc, cpu.regs.x, cpu.regs.y)
}

pub(crate) fn shy(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.store_high_and(loc, cpu.regs.y, cpu.regs.x)
}

pub(crate) fn tas(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.regs.sp = cpu.regs.a & cpu.regs.x;
    cpu.store_high_and(loc, cpu.regs.sp, cpu.regs.y)
}

// Undocumented immediates

pub(crate) fn anc(cpu: &mut Cpu, loc: Location) -> Insn {
    and(cpu, loc)?;
    cpu.set_flag(Status::CARRY, cpu.flag(Status::NEGATIVE));
    Ok(())
}

pub(crate) fn alr(cpu: &mut Cpu, loc: Location) -> Insn {
    and(cpu, loc)?;
    cpu.regs.a = cpu.shift_right(cpu.regs.a);
    Ok(())
}

pub(crate) fn arr(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.read_operand(loc)?;
    let carry_in = (cpu.flag(Status::CARRY) as u8) << 7;
    let result = ((cpu.regs.a & value) >> 1) | carry_in;

    cpu.load_a(result);
    cpu.set_flag(Status::CARRY, result & 0x40 != 0);
    cpu.set_flag(Status::OVERFLOW, ((result >> 6) ^ (result >> 5)) & 0x01 != 0);
    Ok(())
}

pub(crate) fn axs(cpu: &mut Cpu, loc: Location) -> Insn {
    let value = cpu.read_operand(loc)?;
    let masked = cpu.regs.a & cpu.regs.x;
    cpu.compare(masked, value);
    cpu.regs.x = masked.wrapping_sub(value);
    Ok(())
}

/// Unstable on hardware, modelled with the magic constant `$FF`
pub(crate) fn lxa(cpu: &mut Cpu, loc: Location) -> Insn {
    lda(cpu, loc)?;
    cpu.load_x(cpu.regs.a);
    Ok(())
}

/// Unstable on hardware, modelled with the magic constant `$FF`
pub(crate) fn xaa(cpu: &mut Cpu, loc: Location) -> Insn {
    cpu.regs.a = cpu.regs.x;
    and(cpu, loc)
}

/// Locks the processor up. PC is left at the opcode.
pub(crate) fn jam(cpu: &mut Cpu, _: Location) -> Insn {
    cpu.regs.pc = cpu.regs.pc.wrapping_sub(1);
    cpu.jam();
    Ok(())
}

#![cfg(test)]

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::*;

const TEST_START: u16 = 0x0200;
const ABSOLUTE_START: u16 = 0x1200;

/// Whole address space of plain RAM, the program at `TEST_START`.
fn test_cpu(program: &[u8]) -> Cpu {
    let mut memory = Memory::new();
    memory.mount(Ram::new(0x10000), 0x0000, 0xFFFF).unwrap();
    memory.copy(program, TEST_START).unwrap();

    let mut regs = Registers::default();
    regs.pc = TEST_START;

    Cpu::with_registers(memory, regs)
}

fn encode(name: &str, operand: Operand) -> u8 {
    OPCODES
        .iter()
        .position(|o| o.name == name && o.operand == operand)
        .unwrap() as u8
}

fn insn(name: &str, mode: AddressMode) -> u8 {
    encode(name, Operand::Addressed(mode))
}

fn implied(name: &str) -> u8 {
    encode(name, Operand::Implied)
}

fn accumulator(name: &str) -> u8 {
    encode(name, Operand::Accumulator)
}

fn peek(cpu: &Cpu, addr: u16) -> u8 {
    cpu.memory().peek(addr).unwrap()
}

fn poke(cpu: &mut Cpu, addr: u16, value: u8) {
    cpu.memory_mut().write(value, addr).unwrap();
}

/// Records every access and otherwise behaves as RAM
struct Probe {
    cells: Vec<u8>,
    log: Rc<RefCell<Vec<(bool, u16, u8)>>>,
}

impl Probe {
    fn new(size: usize) -> Self {
        Self {
            cells: vec![0; size],
            log: Rc::default(),
        }
    }
}

impl Mountable for Probe {
    fn read(&mut self, addr: u16) -> u8 {
        let value = self.cells[addr as usize];
        self.log.borrow_mut().push((false, addr, value));
        value
    }

    fn write(&mut self, value: u8, addr: u16) {
        self.cells[addr as usize] = value;
        self.log.borrow_mut().push((true, addr, value));
    }
}

#[test]
fn test_loads() {
    let program = [
        insn("LDA", AddressMode::Immediate),
        0x12,
        insn("LDA", AddressMode::Immediate),
        0x00,
        insn("LDA", AddressMode::Immediate),
        0xF2,
        insn("LDX", AddressMode::Immediate),
        0x13,
        insn("LDY", AddressMode::Immediate),
        0xF4,
        insn("LDA", AddressMode::Absolute),
        ABSOLUTE_START as u8,
        (ABSOLUTE_START >> 8) as u8,
        insn("LDA", AddressMode::AbsoluteX),
        ABSOLUTE_START as u8,
        (ABSOLUTE_START >> 8) as u8,
        insn("LDA", AddressMode::AbsoluteY),
        ABSOLUTE_START as u8,
        (ABSOLUTE_START >> 8) as u8,
        insn("LDA", AddressMode::IndexedIndirect),
        0x1C,
        insn("LDA", AddressMode::IndirectIndexed),
        0x43,
        insn("LDA", AddressMode::ZeroPage),
        0x43,
        insn("LDX", AddressMode::ZeroPageY),
        0x43,
    ];

    let mut cpu = test_cpu(&program);

    // Some data in the memory
    poke(&mut cpu, ABSOLUTE_START, 0xAB);
    poke(&mut cpu, ABSOLUTE_START + 0x13, 0xAC);
    poke(&mut cpu, ABSOLUTE_START + 0xF4, 0xAD);

    // Some data on the zero page
    poke(&mut cpu, 0x43, 0xBD);
    poke(&mut cpu, 0x44, 0xBE);
    poke(&mut cpu, 0x37, 0xCC);

    // Data pointed to with X-indirect and indirect-Y addressing
    poke(&mut cpu, 0xBBBA, 0x77);
    poke(&mut cpu, 0xBEBD + 0xF4, 0x78);

    assert!(cpu.step().unwrap().opcode == 0xA9);
    assert!(!cpu.registers().flag_set(Status::ZERO));
    assert!(!cpu.registers().flag_set(Status::NEGATIVE));
    assert!(cpu.registers().a == 0x12);

    cpu.step().unwrap();
    assert!(cpu.registers().flag_set(Status::ZERO));
    assert!(!cpu.registers().flag_set(Status::NEGATIVE));
    assert!(cpu.registers().a == 0);

    cpu.step().unwrap();
    assert!(!cpu.registers().flag_set(Status::ZERO));
    assert!(cpu.registers().flag_set(Status::NEGATIVE));
    assert!(cpu.registers().a == 0xF2);

    cpu.step().unwrap();
    assert!(cpu.registers().x == 0x13);
    assert!(!cpu.registers().flag_set(Status::NEGATIVE));

    cpu.step().unwrap();
    assert!(cpu.registers().y == 0xF4);
    assert!(cpu.registers().flag_set(Status::NEGATIVE));

    cpu.step().unwrap();
    assert!(cpu.registers().a == 0xAB);

    cpu.step().unwrap();
    assert!(cpu.registers().a == 0xAC);

    cpu.step().unwrap();
    assert!(cpu.registers().a == 0xAD);

    // X is still $13, the pointer is at $1C + $13 = $2F
    poke(&mut cpu, 0x2F, 0xBA);
    poke(&mut cpu, 0x30, 0xBB);
    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x77);
    assert!(!cpu.registers().flag_set(Status::NEGATIVE));

    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x78);

    cpu.step().unwrap();
    assert!(cpu.registers().a == 0xBD);
    assert!(cpu.registers().flag_set(Status::NEGATIVE));

    // $43 + $F4 wraps to $37
    cpu.step().unwrap();
    assert!(cpu.registers().x == 0xCC);

    assert!(cpu.registers().pc == TEST_START + program.len() as u16);
}

#[test]
fn test_indexed_indirect_wraps_in_page_zero() {
    let mut cpu = test_cpu(&[insn("LDA", AddressMode::IndexedIndirect), 0xF0]);
    cpu.registers_mut().x = 0x0F;

    // The pointer sits at $FF and its high byte comes from $00
    poke(&mut cpu, 0xFF, 0x34);
    poke(&mut cpu, 0x00, 0x12);
    poke(&mut cpu, 0x1234, 0x5A);

    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x5A);
}

#[test]
fn test_stores() {
    let program = [
        insn("STA", AddressMode::Absolute),
        ABSOLUTE_START as u8,
        (ABSOLUTE_START >> 8) as u8,
        insn("STA", AddressMode::AbsoluteX),
        ABSOLUTE_START as u8,
        (ABSOLUTE_START >> 8) as u8,
        insn("STA", AddressMode::AbsoluteY),
        ABSOLUTE_START as u8,
        (ABSOLUTE_START >> 8) as u8,
        insn("STX", AddressMode::ZeroPage),
        0x20,
        insn("STY", AddressMode::ZeroPageX),
        0x20,
    ];

    let mut cpu = test_cpu(&program);
    cpu.registers_mut().a = 0xAF;
    cpu.registers_mut().x = 0x1B;
    cpu.registers_mut().y = 0x2C;
    let p = cpu.registers().p;

    for _ in 0..5 {
        cpu.step().unwrap();
    }

    assert!(peek(&cpu, ABSOLUTE_START) == 0xAF);
    assert!(peek(&cpu, ABSOLUTE_START + 0x1B) == 0xAF);
    assert!(peek(&cpu, ABSOLUTE_START + 0x2C) == 0xAF);
    assert!(peek(&cpu, 0x20) == 0x1B);
    assert!(peek(&cpu, 0x3B) == 0x2C);

    // Stores leave the flags alone
    assert!(cpu.registers().p == p);
}

#[test]
fn test_alu() {
    let program = [
        insn("LDA", AddressMode::Immediate),
        0x00,
        insn("STA", AddressMode::ZeroPage),
        0x12,
        implied("CLC"),
        implied("CLD"),
        insn("LDA", AddressMode::Immediate),
        0x90,
        insn("ADC", AddressMode::ZeroPage),
        0x12,
        insn("SBC", AddressMode::ZeroPage),
        0x12,
        implied("CLC"),
        implied("SED"),
        insn("LDA", AddressMode::Immediate),
        0x90,
        insn("ADC", AddressMode::ZeroPage),
        0x12,
        insn("SBC", AddressMode::ZeroPage),
        0x12,
    ];

    let mut cpu = test_cpu(&program);

    cpu.step().unwrap();
    assert!(cpu.registers().flag_set(Status::ZERO));
    assert!(cpu.registers().a == 0);

    cpu.step().unwrap();

    cpu.step().unwrap();
    assert!(!cpu.registers().flag_set(Status::CARRY));
    cpu.step().unwrap();
    assert!(!cpu.registers().flag_set(Status::DECIMAL));
    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x90);

    cpu.step().unwrap();
    assert!(!cpu.registers().flag_set(Status::ZERO));
    assert!(!cpu.registers().flag_set(Status::CARRY));
    assert!(cpu.registers().flag_set(Status::NEGATIVE));
    assert!(cpu.registers().a == 0x90);

    // Carry clear means borrow
    cpu.step().unwrap();
    assert!(cpu.registers().flag_set(Status::CARRY));
    assert!(cpu.registers().flag_set(Status::NEGATIVE));
    assert!(cpu.registers().a == 0x8F);

    cpu.step().unwrap();
    cpu.step().unwrap();
    assert!(cpu.registers().flag_set(Status::DECIMAL));
    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x90);

    // The decimal flag has no effect on arithmetic
    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x90);
    cpu.step().unwrap();
    assert!(cpu.registers().flag_set(Status::CARRY));
    assert!(cpu.registers().a == 0x8F);
}

#[test]
fn test_adc_sbc_flags() {
    let program = [
        insn("ADC", AddressMode::Immediate),
        0x50,
        insn("ADC", AddressMode::Immediate),
        0x60,
        insn("SBC", AddressMode::Immediate),
        0x0F,
        insn("SBC", AddressMode::Immediate),
        0x01,
    ];

    let mut cpu = test_cpu(&program);
    cpu.registers_mut().a = 0x50;

    // $50 + $50: two positives giving a negative
    cpu.step().unwrap();
    assert!(cpu.registers().a == 0xA0);
    assert!(cpu.registers().flag_set(Status::OVERFLOW));
    assert!(!cpu.registers().flag_set(Status::CARRY));

    // $A0 + $60 = $100
    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x00);
    assert!(cpu.registers().flag_set(Status::CARRY));
    assert!(cpu.registers().flag_set(Status::ZERO));
    assert!(!cpu.registers().flag_set(Status::OVERFLOW));

    // 0 - $0F, no borrow in
    cpu.step().unwrap();
    assert!(cpu.registers().a == 0xF1);
    assert!(!cpu.registers().flag_set(Status::CARRY));
    assert!(!cpu.registers().flag_set(Status::OVERFLOW));

    // $F1 - 1 - borrow
    cpu.step().unwrap();
    assert!(cpu.registers().a == 0xEF);
    assert!(cpu.registers().flag_set(Status::CARRY));

    // $80 - $0F overflows
    let mut cpu = test_cpu(&[insn("SBC", AddressMode::Immediate), 0x0F]);
    cpu.registers_mut().a = 0x80;
    cpu.registers_mut().p.insert(Status::CARRY);
    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x71);
    assert!(cpu.registers().flag_set(Status::OVERFLOW));
    assert!(cpu.registers().flag_set(Status::CARRY));
}

#[test]
fn test_compare_and_bit() {
    let program = [
        insn("CMP", AddressMode::Immediate),
        0x40,
        insn("CPX", AddressMode::Immediate),
        0x41,
        insn("CPY", AddressMode::Immediate),
        0x10,
        insn("BIT", AddressMode::ZeroPage),
        0x80,
    ];

    let mut cpu = test_cpu(&program);
    cpu.registers_mut().a = 0x40;
    cpu.registers_mut().x = 0x40;
    cpu.registers_mut().y = 0x20;
    poke(&mut cpu, 0x80, 0xC0);

    cpu.step().unwrap();
    assert!(cpu.registers().flag_set(Status::ZERO));
    assert!(cpu.registers().flag_set(Status::CARRY));

    cpu.step().unwrap();
    assert!(!cpu.registers().flag_set(Status::ZERO));
    assert!(!cpu.registers().flag_set(Status::CARRY));
    assert!(cpu.registers().flag_set(Status::NEGATIVE));

    cpu.step().unwrap();
    assert!(cpu.registers().flag_set(Status::CARRY));
    assert!(!cpu.registers().flag_set(Status::NEGATIVE));

    // $40 & $C0 is not zero; N and V come from the operand
    cpu.step().unwrap();
    assert!(!cpu.registers().flag_set(Status::ZERO));
    assert!(cpu.registers().flag_set(Status::NEGATIVE));
    assert!(cpu.registers().flag_set(Status::OVERFLOW));
    assert!(cpu.registers().a == 0x40);
}

#[test]
fn test_shifts_and_rotates() {
    let program = [
        accumulator("ASL"),
        accumulator("ROL"),
        accumulator("LSR"),
        accumulator("ROR"),
        insn("ROR", AddressMode::ZeroPage),
        0x30,
        insn("INC", AddressMode::ZeroPage),
        0x31,
        insn("DEC", AddressMode::Absolute),
        0x32,
        0x00,
    ];

    let mut cpu = test_cpu(&program);
    cpu.registers_mut().a = 0x81;
    poke(&mut cpu, 0x30, 0x01);
    poke(&mut cpu, 0x31, 0xFF);
    poke(&mut cpu, 0x32, 0x00);

    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x02);
    assert!(cpu.registers().flag_set(Status::CARRY));

    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x05);
    assert!(!cpu.registers().flag_set(Status::CARRY));

    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x02);
    assert!(cpu.registers().flag_set(Status::CARRY));

    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x81);
    assert!(!cpu.registers().flag_set(Status::CARRY));
    assert!(cpu.registers().flag_set(Status::NEGATIVE));

    cpu.step().unwrap();
    assert!(peek(&cpu, 0x30) == 0x00);
    assert!(cpu.registers().flag_set(Status::CARRY));
    assert!(cpu.registers().flag_set(Status::ZERO));

    cpu.step().unwrap();
    assert!(peek(&cpu, 0x31) == 0x00);
    assert!(cpu.registers().flag_set(Status::ZERO));

    cpu.step().unwrap();
    assert!(peek(&cpu, 0x32) == 0xFF);
    assert!(cpu.registers().flag_set(Status::NEGATIVE));
}

#[test]
fn test_read_modify_write_writes_twice() {
    let probe = Probe::new(0x100);
    let log = probe.log.clone();

    let mut memory = Memory::new();
    memory.mount(probe, 0x0000, 0x00FF).unwrap();
    memory.mount(Ram::new(0x100), 0x0200, 0x02FF).unwrap();
    memory
        .copy(&[insn("INC", AddressMode::ZeroPage), 0x40], TEST_START)
        .unwrap();
    memory.write(0x7F, 0x40).unwrap();
    log.borrow_mut().clear();

    let mut regs = Registers::default();
    regs.pc = TEST_START;
    let mut cpu = Cpu::with_registers(memory, regs);
    cpu.step().unwrap();

    // Read, the old value written back, then the new one
    assert!(*log.borrow() == [(false, 0x40, 0x7F), (true, 0x40, 0x7F), (true, 0x40, 0x80)]);
}

#[test]
fn test_transfers() {
    let program = [
        implied("TAX"),
        implied("TAY"),
        implied("TSX"),
        implied("TXS"),
        implied("INX"),
        implied("TXA"),
        implied("DEY"),
        implied("TYA"),
    ];

    let mut cpu = test_cpu(&program);
    cpu.registers_mut().a = 0x80;

    cpu.step().unwrap();
    assert!(cpu.registers().x == 0x80);
    cpu.step().unwrap();
    assert!(cpu.registers().y == 0x80);
    cpu.step().unwrap();
    assert!(cpu.registers().x == 0xFD);
    assert!(cpu.registers().flag_set(Status::NEGATIVE));

    // TXS leaves the flags alone
    cpu.registers_mut().x = 0x00;
    let p = cpu.registers().p;
    cpu.step().unwrap();
    assert!(cpu.registers().sp == 0x00);
    assert!(cpu.registers().p == p);

    cpu.step().unwrap();
    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x01);
    cpu.step().unwrap();
    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x7F);
}

#[test]
fn test_stack() {
    let program = [
        insn("LDA", AddressMode::Immediate),
        0x42,
        implied("PHA"),
        insn("LDA", AddressMode::Immediate),
        0x00,
        implied("PLA"),
        implied("PHP"),
        implied("PLP"),
    ];

    let mut cpu = test_cpu(&program);

    cpu.step().unwrap();
    cpu.step().unwrap();
    assert!(cpu.registers().sp == 0xFC);
    assert!(peek(&cpu, 0x01FD) == 0x42);

    cpu.step().unwrap();
    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x42);
    assert!(cpu.registers().sp == 0xFD);
    assert!(!cpu.registers().flag_set(Status::ZERO));

    // PHP pushes the break bit set, PLP drops it
    cpu.step().unwrap();
    assert!(peek(&cpu, 0x01FD) == 0x34);
    poke(&mut cpu, 0x01FD, 0xFF);
    cpu.step().unwrap();
    assert!(cpu.registers().p.bits() == 0xEF);
}

#[test]
fn test_stack_wraps_in_page_one() {
    let mut cpu = test_cpu(&[implied("PHA"), implied("PLA")]);
    cpu.registers_mut().sp = 0x00;
    cpu.registers_mut().a = 0x99;

    cpu.step().unwrap();
    assert!(peek(&cpu, 0x0100) == 0x99);
    assert!(cpu.registers().sp == 0xFF);

    cpu.registers_mut().a = 0;
    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x99);
    assert!(cpu.registers().sp == 0x00);
}

#[test]
fn test_jsr_rts() {
    let program = [
        insn("JSR", AddressMode::Absolute),
        0x00,
        0x03,
        implied("INX"),
    ];

    let mut cpu = test_cpu(&program);
    poke(&mut cpu, 0x0300, implied("RTS"));

    cpu.step().unwrap();
    assert!(cpu.registers().pc == 0x0300);
    // Address of the last byte of JSR
    assert!(peek(&cpu, 0x01FD) == 0x02);
    assert!(peek(&cpu, 0x01FC) == 0x02);

    cpu.step().unwrap();
    assert!(cpu.registers().pc == 0x0203);
    cpu.step().unwrap();
    assert!(cpu.registers().x == 1);
}

#[test]
fn test_brk_rti() {
    let mut cpu = test_cpu(&[implied("BRK"), 0xEA, implied("INY")]);
    poke(&mut cpu, 0xFFFE, 0x00);
    poke(&mut cpu, 0xFFFF, 0x04);
    poke(&mut cpu, 0x0400, implied("RTI"));
    cpu.registers_mut().p.insert(Status::CARRY);

    let step = cpu.step().unwrap();
    assert!(step.cycles == 7);
    assert!(step.serviced.is_none());
    assert!(cpu.registers().pc == 0x0400);
    assert!(cpu.registers().flag_set(Status::INTERRUPT_DISABLE));
    assert!(peek(&cpu, 0x01FD) == 0x02);
    assert!(peek(&cpu, 0x01FC) == 0x02);
    assert!(peek(&cpu, 0x01FB) == 0x35);

    // RTI returns past the padding byte, no +1
    let step = cpu.step().unwrap();
    assert!(step.cycles == 6);
    assert!(cpu.registers().pc == 0x0202);
    assert!(cpu.registers().p.bits() == 0x25);

    cpu.step().unwrap();
    assert!(cpu.registers().y == 1);
}

#[test]
fn test_jmp_indirect_page_wrap() {
    let mut cpu = test_cpu(&[insn("JMP", AddressMode::Indirect), 0xFF, 0x02]);
    poke(&mut cpu, 0x02FF, 0x34);
    poke(&mut cpu, 0x0200 + 0x100, 0x99);

    // The high byte comes from $0200, the JMP opcode itself
    cpu.step().unwrap();
    assert!(cpu.registers().pc == 0x6C34);
}

#[test]
fn test_branches() {
    let program = [
        insn("BEQ", AddressMode::Relative),
        0x10,
        insn("BNE", AddressMode::Relative),
        0xFC,
    ];

    let mut cpu = test_cpu(&program);

    // Not taken
    cpu.step().unwrap();
    assert!(cpu.registers().pc == 0x0202);

    // Taken backwards to $0200
    cpu.step().unwrap();
    assert!(cpu.registers().pc == 0x0200);
}

#[test]
fn test_flag_instructions() {
    let program = [
        implied("SEC"),
        implied("SEI"),
        implied("SED"),
        implied("CLC"),
        implied("CLI"),
        implied("CLD"),
        implied("CLV"),
    ];

    let mut cpu = test_cpu(&program);
    cpu.registers_mut().p.insert(Status::OVERFLOW);

    for _ in 0..3 {
        cpu.step().unwrap();
    }
    assert!(cpu.registers().p.bits() == 0x6D);

    for _ in 0..4 {
        cpu.step().unwrap();
    }
    assert!(cpu.registers().p.bits() == 0x20);
}

#[test]
fn test_undocumented_combined() {
    let program = [
        insn("*LAX", AddressMode::ZeroPage),
        0x10,
        insn("*SAX", AddressMode::ZeroPage),
        0x11,
        insn("*SLO", AddressMode::ZeroPage),
        0x12,
        insn("*DCP", AddressMode::ZeroPage),
        0x13,
        insn("*ISB", AddressMode::ZeroPage),
        0x14,
    ];

    let mut cpu = test_cpu(&program);
    poke(&mut cpu, 0x10, 0x80);
    poke(&mut cpu, 0x12, 0x81);
    poke(&mut cpu, 0x13, 0x83);
    poke(&mut cpu, 0x14, 0x0F);

    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x80);
    assert!(cpu.registers().x == 0x80);
    assert!(cpu.registers().flag_set(Status::NEGATIVE));

    cpu.registers_mut().a = 0xF0;
    cpu.registers_mut().x = 0x3C;
    cpu.step().unwrap();
    assert!(peek(&cpu, 0x11) == 0x30);

    cpu.registers_mut().a = 0x01;
    cpu.step().unwrap();
    assert!(peek(&cpu, 0x12) == 0x02);
    assert!(cpu.registers().flag_set(Status::CARRY));
    assert!(cpu.registers().a == 0x03);

    cpu.registers_mut().a = 0x82;
    cpu.step().unwrap();
    assert!(peek(&cpu, 0x13) == 0x82);
    assert!(cpu.registers().flag_set(Status::ZERO));
    assert!(cpu.registers().flag_set(Status::CARRY));

    cpu.registers_mut().a = 0x20;
    cpu.step().unwrap();
    assert!(peek(&cpu, 0x14) == 0x10);
    assert!(cpu.registers().a == 0x10);
    assert!(cpu.registers().flag_set(Status::CARRY));
}

#[test]
fn test_undocumented_immediates() {
    let program = [
        insn("*ANC", AddressMode::Immediate),
        0x80,
        insn("*ALR", AddressMode::Immediate),
        0x03,
        insn("*ARR", AddressMode::Immediate),
        0xFF,
        insn("*AXS", AddressMode::Immediate),
        0x02,
        insn("*SBC", AddressMode::Immediate),
        0x01,
    ];

    let mut cpu = test_cpu(&program);

    cpu.registers_mut().a = 0xFF;
    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x80);
    assert!(cpu.registers().flag_set(Status::CARRY));
    assert!(cpu.registers().flag_set(Status::NEGATIVE));

    cpu.registers_mut().a = 0x03;
    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x01);
    assert!(cpu.registers().flag_set(Status::CARRY));

    cpu.registers_mut().a = 0xC0;
    cpu.registers_mut().p.remove(Status::CARRY);
    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x60);
    assert!(cpu.registers().flag_set(Status::CARRY));
    assert!(!cpu.registers().flag_set(Status::OVERFLOW));

    cpu.registers_mut().a = 0x0F;
    cpu.registers_mut().x = 0x07;
    cpu.step().unwrap();
    assert!(cpu.registers().x == 0x05);
    assert!(cpu.registers().a == 0x0F);
    assert!(cpu.registers().flag_set(Status::CARRY));

    // $EB is a plain SBC
    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x0E);
}

#[test]
fn test_undocumented_high_byte_stores() {
    let program = [
        insn("*SHX", AddressMode::AbsoluteY),
        0x10,
        0x06,
        insn("*SHX", AddressMode::AbsoluteY),
        0xF0,
        0x06,
        insn("*LAS", AddressMode::AbsoluteY),
        0x00,
        0x07,
    ];

    let mut cpu = test_cpu(&program);
    cpu.registers_mut().x = 0xFF;
    cpu.registers_mut().y = 0x01;

    // X & ($06 + 1)
    cpu.step().unwrap();
    assert!(peek(&cpu, 0x0611) == 0x07);

    // Crossing into $0710 puts the value into the high byte
    cpu.registers_mut().x = 0x05;
    cpu.registers_mut().y = 0x20;
    cpu.step().unwrap();
    assert!(peek(&cpu, 0x0510) == 0x05);
    assert!(peek(&cpu, 0x0710) == 0x00);

    poke(&mut cpu, 0x0720, 0xF0);
    cpu.step().unwrap();
    assert!(cpu.registers().a == 0xF0);
    assert!(cpu.registers().x == 0xF0);
    assert!(cpu.registers().sp == 0xF0);
}

#[test]
fn test_nops_read_and_skip() {
    let program = [
        insn("*NOP", AddressMode::Immediate),
        0xFF,
        insn("*NOP", AddressMode::AbsoluteX),
        0x00,
        0x12,
        implied("NOP"),
        implied("*NOP"),
    ];

    let mut cpu = test_cpu(&program);
    let regs = *cpu.registers();

    for _ in 0..4 {
        cpu.step().unwrap();
    }

    assert!(cpu.registers().pc == TEST_START + program.len() as u16);
    assert!(cpu.registers().a == regs.a);
    assert!(cpu.registers().p == regs.p);
}

#[test]
fn test_jam() {
    let mut cpu = test_cpu(&[implied("*JAM"), implied("INX")]);

    cpu.step().unwrap();
    assert!(cpu.is_jammed());
    assert!(cpu.registers().pc == TEST_START);

    // Stuck until reset, even with an NMI pending
    cpu.interrupt(Interrupt::Nmi);
    for _ in 0..4 {
        let step = cpu.step().unwrap();
        assert!(step.cycles == 1);
        assert!(step.serviced.is_none());
    }
    assert!(cpu.registers().pc == TEST_START);
    assert!(cpu.registers().x == 0);

    cpu.reset();
    assert!(!cpu.is_jammed());
}

#[test]
fn test_unmapped_access_faults() {
    let mut memory = Memory::new();
    memory.mount(Ram::new(0x8000), 0x0000, 0x7FFF).unwrap();
    memory
        .copy(
            &[
                insn("LDX", AddressMode::Immediate),
                0x05,
                insn("LDA", AddressMode::Absolute),
                0x00,
                0x90,
            ],
            TEST_START,
        )
        .unwrap();

    let mut regs = Registers::default();
    regs.pc = TEST_START;
    let mut cpu = Cpu::with_registers(memory, regs);

    cpu.step().unwrap();
    let fault = cpu.step().unwrap_err();
    assert!(
        fault.error
            == RunError::MemoryAccess {
                opcode: 0xAD,
                error: MemoryError::UnmappedRead(0x9000)
            }
    );
    assert!(fault.registers.pc == TEST_START + 2);
    assert!(fault.registers.x == 0x05);

    // Latched until reset
    assert!(cpu.step().unwrap_err() == fault);
    assert!(cpu.fault() == Some(&fault));
    assert!(cpu.registers().pc == TEST_START + 2);

    cpu.reset();
    assert!(cpu.fault().is_none());

    cpu.registers_mut().pc = 0x8000;
    let fault = cpu.step().unwrap_err();
    assert!(fault.error == RunError::CannotFetchInstruction(MemoryError::UnmappedRead(0x8000)));
}

#[test]
fn test_unmapped_write_faults() {
    let mut memory = Memory::new();
    memory.mount(Ram::new(0x0800), 0x0000, 0x07FF).unwrap();
    memory
        .copy(&[insn("STA", AddressMode::Absolute), 0x00, 0x20], TEST_START)
        .unwrap();

    let mut regs = Registers::default();
    regs.pc = TEST_START;
    regs.a = 0x66;
    let mut cpu = Cpu::with_registers(memory, regs);

    let fault = cpu.step().unwrap_err();
    assert!(
        fault.error
            == RunError::MemoryAccess {
                opcode: 0x8D,
                error: MemoryError::UnmappedWrite(0x2000, 0x66)
            }
    );
}

#[test]
fn test_mount_rejects_overlap() {
    let mut memory = Memory::new();
    memory.mount(InternalRam::new(), 0x0000, 0x1FFF).unwrap();
    memory.mount(Ram::new(0x2000), 0x6000, 0x7FFF).unwrap();

    assert!(
        memory.mount(Ram::new(0x10), 0x1FF0, 0x2000)
            == Err(MountError::Overlap {
                from: 0x1FF0,
                to: 0x2000,
                existing_from: 0x0000,
                existing_to: 0x1FFF
            })
    );
    assert!(memory.mount(Ram::new(0x10), 0x5000, 0x4000) == Err(MountError::Inverted { from: 0x5000, to: 0x4000 }));
    assert!(memory.mounts().count() == 2);

    // Adjacent is fine
    memory.mount(Ram::new(0x10), 0x2000, 0x200F).unwrap();
    assert!(memory.mounts().count() == 3);
}

#[test]
fn test_internal_ram_mirrors() {
    let mut memory = Memory::new();
    memory.mount(InternalRam::new(), 0x0000, 0x1FFF).unwrap();

    memory.write(0xA5, 0x0012).unwrap();
    assert!(memory.read(0x0812).unwrap() == 0xA5);
    assert!(memory.read(0x1012).unwrap() == 0xA5);
    assert!(memory.read(0x1812).unwrap() == 0xA5);

    memory.write(0x5A, 0x1FFF).unwrap();
    assert!(memory.read(0x07FF).unwrap() == 0x5A);
    assert!(memory.read(0x2000) == Err(MemoryError::UnmappedRead(0x2000)));
}

#[test]
fn test_devices_see_relative_addresses() {
    let probe = Probe::new(0x10);
    let log = probe.log.clone();

    let mut memory = Memory::new();
    memory.mount(probe, 0x4010, 0x401F).unwrap();
    memory.write(0x11, 0x4013).unwrap();
    memory.read(0x401F).unwrap();

    assert!(*log.borrow() == [(true, 0x03, 0x11), (false, 0x0F, 0x00)]);
}

#[test]
fn test_rom_mirrors_and_drops_writes() {
    let mut memory = Memory::new();
    memory.mount(Rom::new(vec![0x11; 0x4000]), 0x8000, 0xFFFF).unwrap();

    memory.write(0x22, 0xC000).unwrap();
    assert!(memory.read(0x8000).unwrap() == 0x11);
    assert!(memory.read(0xC000).unwrap() == 0x11);
    assert!(memory.range(0xBFFE, 0xC002).unwrap() == [0x11; 4]);
}

#[test]
fn test_shared_device() {
    let ram = Rc::new(RefCell::new(Ram::new(0x100)));

    let mut memory = Memory::new();
    memory.mount(ram.clone(), 0x6000, 0x60FF).unwrap();
    memory.write(0x42, 0x6010).unwrap();

    assert!(ram.borrow_mut().read(0x10) == 0x42);
    assert!(memory.peek(0x6010) == Some(0x42));
}

#[test]
fn test_reset() {
    let mut cpu = test_cpu(&[implied("SEC"), implied("PHA")]);
    poke(&mut cpu, 0xFFFC, 0x00);
    poke(&mut cpu, 0xFFFD, 0x80);

    cpu.registers_mut().a = 0x12;
    cpu.step().unwrap();
    cpu.step().unwrap();
    cpu.interrupt(Interrupt::Irq);

    cpu.reset();
    assert!(cpu.registers().a == 0);
    assert!(cpu.registers().x == 0);
    assert!(cpu.registers().y == 0);
    assert!(cpu.registers().sp == 0xFD);
    assert!(cpu.registers().p.bits() == 0x24);
    assert!(cpu.cycles() == 0);
    assert!(!cpu.signals().pending(Interrupt::Irq));
    // Reset does not move the program counter by itself
    assert!(cpu.registers().pc == TEST_START + 2);

    cpu.jump_to_reset_vector().unwrap();
    assert!(cpu.registers().pc == 0x8000);
}

#[test]
fn test_status_bytes() {
    let p = Status::CARRY | Status::UNUSED;
    assert!(p.pushed_by_software() == 0x31);
    assert!((p | Status::BREAK).pushed_by_hardware() == 0x21);
    assert!(Status::pulled(0x10) == Status::UNUSED);
    assert!(Status::pulled(0xFF).bits() == 0xEF);
    assert!(Status::POWER_ON.bits() == 0x24);
}

#[test]
fn test_opcode_table() {
    assert!(OPCODES.iter().filter(|o| o.is_documented()).count() == 151);
    assert!(OPCODES.iter().filter(|o| o.mnemonic() == "JAM").count() == 12);

    for (opcode, insn) in OPCODES.iter().enumerate() {
        let addressing = match insn.operand {
            Operand::Addressed(mode) => mode.cycles(),
            _ => 0,
        };
        assert!(insn.cycles >= 1 + addressing, "${opcode:02X} {insn:?}");

        if insn.page_penalty {
            assert!(
                matches!(
                    insn.operand,
                    Operand::Addressed(AddressMode::AbsoluteX)
                        | Operand::Addressed(AddressMode::AbsoluteY)
                        | Operand::Addressed(AddressMode::IndirectIndexed)
                ),
                "${opcode:02X} {insn:?}"
            );
        }
    }

    assert!(OPCODES[0x4C].name == "JMP");
    assert!(OPCODES[0x4C].len() == 3);
    assert!(OPCODES[0xEB].mnemonic() == "SBC");
    assert!(!OPCODES[0xEB].is_documented());
}

#[test]
fn test_trace_line() {
    let mut cpu = test_cpu(&[]);
    cpu.registers_mut().pc = 0xC000;
    poke(&mut cpu, 0xC000, 0x4C);
    poke(&mut cpu, 0xC001, 0xF5);
    poke(&mut cpu, 0xC002, 0xC5);

    let line = trace::trace_line(&cpu);
    assert!(line.starts_with("C000  4C F5 C5  JMP $C5F5 "), "{line}");
    assert!(line.ends_with("A:00 X:00 Y:00 P:24 SP:FD CYC:0"), "{line}");

    cpu.registers_mut().pc = 0xC010;
    poke(&mut cpu, 0xC010, 0xD0);
    poke(&mut cpu, 0xC011, 0xFE);
    let line = trace::trace_line(&cpu);
    assert!(line.starts_with("C010  D0 FE     BNE $C010 "), "{line}");

    cpu.registers_mut().pc = 0xC020;
    poke(&mut cpu, 0xC020, 0xB3);
    poke(&mut cpu, 0xC021, 0x33);
    let line = trace::trace_line(&cpu);
    assert!(line.starts_with("C020  B3 33    *LAX ($33),Y "), "{line}");
}

#[test]
fn test_trace_line_unpeekable() {
    let memory = Memory::new();
    let cpu = Cpu::new(memory);

    let line = trace::trace_line(&cpu);
    assert!(line.starts_with("0000  ??"), "{line}");
}

#[test]
fn test_adc_sbc_exhaustive() {
    let mut cpu = test_cpu(&[
        insn("ADC", AddressMode::Immediate),
        0x00,
        insn("SBC", AddressMode::Immediate),
        0x00,
    ]);

    for a in 0..=0xFF_u8 {
        for b in 0..=0xFF_u8 {
            for c in 0..=1_u8 {
                poke(&mut cpu, TEST_START + 1, b);
                poke(&mut cpu, TEST_START + 3, b);

                cpu.registers_mut().pc = TEST_START;
                cpu.registers_mut().a = a;
                cpu.registers_mut().p.set(Status::CARRY, c == 1);
                cpu.step().unwrap();

                let sum = a as u16 + b as u16 + c as u16;
                assert!(cpu.registers().a == sum as u8);
                assert!(cpu.registers().flag_set(Status::CARRY) == (sum > 0xFF));
                assert!(cpu.registers().flag_set(Status::ZERO) == (sum as u8 == 0));

                cpu.registers_mut().a = a;
                cpu.registers_mut().p.set(Status::CARRY, c == 1);
                cpu.step().unwrap();

                let borrow = 1 - c as i16;
                let diff = a as i16 - b as i16 - borrow;
                assert!(cpu.registers().a == diff as u8);
                assert!(cpu.registers().flag_set(Status::CARRY) == (diff >= 0));
                assert!(cpu.registers().flag_set(Status::NEGATIVE) == (diff as u8 & 0x80 != 0));
            }
        }
    }
}

#[test]
fn test_php_plp_round_trip() {
    let mut cpu = test_cpu(&[implied("PHP"), implied("PLP")]);

    for bits in 0..=0xFF_u8 {
        cpu.registers_mut().pc = TEST_START;
        cpu.registers_mut().p = Status::from_bits_truncate(bits);

        cpu.step().unwrap();
        assert!(peek(&cpu, 0x01FD) == bits | 0x30);
        cpu.step().unwrap();

        assert!(cpu.registers().p.bits() == (bits | 0x20) & !0x10);
        assert!(cpu.registers().sp == 0xFD);
    }
}

#[test]
fn test_stack_lifo() {
    let program = [
        insn("LDA", AddressMode::Immediate),
        0x11,
        implied("PHA"),
        insn("LDA", AddressMode::Immediate),
        0x22,
        implied("PHA"),
        insn("LDA", AddressMode::Immediate),
        0x33,
        implied("PHA"),
        implied("PLA"),
        implied("TAX"),
        implied("PLA"),
        implied("TAY"),
        implied("PLA"),
    ];

    let mut cpu = test_cpu(&program);
    let sp = cpu.registers().sp;

    for _ in 0..11 {
        cpu.step().unwrap();
    }

    assert!(cpu.registers().x == 0x33);
    assert!(cpu.registers().y == 0x22);
    assert!(cpu.registers().a == 0x11);
    assert!(cpu.registers().sp == sp);
}

#[test]
fn test_end_to_end() {
    let mut cpu = test_cpu(&[insn("ADC", AddressMode::Immediate), 0x01]);
    cpu.registers_mut().a = 0xFF;
    cpu.step().unwrap();
    assert!(cpu.registers().a == 0x00);
    assert!(cpu.registers().flag_set(Status::CARRY));
    assert!(cpu.registers().flag_set(Status::ZERO));
    assert!(!cpu.registers().flag_set(Status::OVERFLOW));
    assert!(!cpu.registers().flag_set(Status::NEGATIVE));

    let mut cpu = test_cpu(&[0x4C, 0xEF, 0xBE]);
    cpu.step().unwrap();
    assert!(cpu.registers().pc == 0xBEEF);
}

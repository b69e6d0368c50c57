//! Cycle-counting emulator of the NES flavored MOS 6502
//!
//! Instructions are executed whole: nothing is observable between the
//! bus accesses of one instruction except through the bus access hook.
//! Cycles are charged as the opcode is fetched, as the operand address is
//! computed and when the instruction retires, so a peripheral raising an
//! interrupt from the hook always sees a clock past the instruction start.
//!
//! Emulated microarch side effects:
//! * all 256 opcodes, including the undocumented ones and the jams,
//! * page crossing and taken branch penalties,
//! * the dummy write of the old value by read-modify-write instructions,
//! * the indirect JMP page wrap.
//!
//! Not emulated: decimal mode (the 2A03 has no BCD unit), dummy reads on
//! page crossing, interrupt hijacking.
//!
//! An access to an unmapped address faults the processor. The fault is
//! latched, and the processor refuses to run until reset.

use core::fmt::Debug;

use crate::handlers::Location;
use crate::interrupts::Interrupt;
use crate::interrupts::InterruptLine;
use crate::interrupts::Signals;
use crate::interrupts::INTERRUPT_CYCLES;
use crate::interrupts::RESET_VECTOR;
use crate::opcodes::Opcode;
use crate::opcodes::Operand;
use crate::opcodes::OPCODES;
use crate::Memory;
use crate::MemoryError;
use crate::Registers;
use crate::Status;

/// Bottom of the stack
pub const STACK_BOTTOM: u16 = 0x0100;

/// Retired instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Opcode of the instruction
    pub opcode: u8,
    /// Cycles spent, including the interrupt entry if one was taken
    pub cycles: u32,
    /// Interrupt entered after the instruction
    pub serviced: Option<Interrupt>,
}

/// Run error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunError {
    /// Could not fetch the next instruction from the address
    CannotFetchInstruction(MemoryError),
    /// Error occured when the instruction accessed the memory
    MemoryAccess { opcode: u8, error: MemoryError },
}

impl core::fmt::Display for RunError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RunError::CannotFetchInstruction(error) => {
                write!(f, "cannot fetch the instruction: {error}")
            }
            RunError::MemoryAccess { opcode, error } => {
                write!(f, "opcode ${opcode:02X} ({}): {error}", OPCODES[*opcode as usize].name)
            }
        }
    }
}

/// The processor halted. Registers are rolled back to the start of the
/// faulting instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault {
    pub error: RunError,
    pub registers: Registers,
    pub cycles: u64,
}

impl core::fmt::Display for Fault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} at {:?} CYC:{}", self.error, self.registers, self.cycles)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Fault {}

/// NES CPU core
pub struct Cpu {
    pub(crate) regs: Registers,
    pub(crate) memory: Memory,
    signals: Signals,
    // Halted on an unmapped access, only reset will help
    fault: Option<Fault>,
    // Executed a JAM opcode, only reset will help
    jammed: bool,
}

impl Cpu {
    pub fn new(memory: Memory) -> Self {
        Self::with_registers(memory, Registers::default())
    }

    pub fn with_registers(memory: Memory, regs: Registers) -> Self {
        Self {
            regs,
            memory,
            signals: Signals::new(),
            fault: None,
            jammed: false,
        }
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Interrupt lines to hand to peripherals
    pub fn signals(&self) -> &Signals {
        &self.signals
    }

    pub fn cycles(&self) -> u64 {
        self.signals.cycles()
    }

    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    pub fn is_jammed(&self) -> bool {
        self.jammed
    }

    /// Power-on/reset register state. The program counter is not touched,
    /// see [`Cpu::jump_to_reset_vector`].
    pub fn reset(&mut self) {
        self.regs.reset();
        self.signals.reset();
        self.fault = None;
        self.jammed = false;
    }

    pub fn jump_to_reset_vector(&mut self) -> Result<(), MemoryError> {
        self.regs.pc = self.read_u16(RESET_VECTOR)?;

        Ok(())
    }

    /// Executes one instruction, then enters a due interrupt.
    pub fn step(&mut self) -> Result<Step, Fault> {
        // If the processor faulted, refuse to run.
        if let Some(f) = self.fault {
            return Err(f);
        }

        let started_at = self.cycles();

        if self.jammed {
            // The bus is stuck re-reading the jam opcode; interrupts
            // are not recognized either.
            self.charge(1);
            return Ok(Step {
                opcode: self.memory.peek(self.regs.pc).unwrap_or(0x02),
                cycles: 1,
                serviced: None,
            });
        }

        if log::log_enabled!(log::Level::Trace) {
            log::trace!("{}", crate::trace::trace_line(self));
        }

        // The register state is rolled back on an instruction fault
        let registers = self.regs;
        let result = self
            .execute()
            .and_then(|opcode| Ok((opcode, self.poll_interrupts(started_at, opcode)?)));

        match result {
            Ok((opcode, serviced)) => Ok(Step {
                opcode,
                cycles: (self.cycles() - started_at) as u32,
                serviced,
            }),
            Err(error) => {
                let fault = Fault {
                    error,
                    registers,
                    cycles: self.cycles(),
                };
                log::error!("processor halted: {fault}");
                self.regs = registers;
                self.fault = Some(fault);
                Err(fault)
            }
        }
    }

    fn execute(&mut self) -> Result<u8, RunError> {
        // Fetch instruction
        self.charge(1);
        let opcode = self.fetch_u8().map_err(RunError::CannotFetchInstruction)?;

        // Decode and execute
        let insn = &OPCODES[opcode as usize];
        self.dispatch(insn)
            .map_err(|error| RunError::MemoryAccess { opcode, error })?;

        if self.jammed {
            log::warn!(
                "jammed by opcode ${opcode:02X} at ${:04X}",
                self.regs.pc
            );
        }

        Ok(opcode)
    }

    fn dispatch(&mut self, insn: &Opcode) -> Result<(), MemoryError> {
        let location = match insn.operand {
            Operand::Implied => Location::Implied,
            Operand::Accumulator => Location::Accumulator,
            Operand::Addressed(mode) => {
                let resolved = self.resolve(mode)?;
                if resolved.crossed && insn.page_penalty {
                    self.charge(1);
                }
                Location::Memory(resolved.addr)
            }
        };

        (insn.handler)(self, location)?;
        self.charge(insn.base_cycles().into());

        Ok(())
    }

    fn poll_interrupts(
        &mut self,
        started_at: u64,
        opcode: u8,
    ) -> Result<Option<Interrupt>, RunError> {
        let kind = if self.jammed {
            return Ok(None);
        } else if self.signals.due(Interrupt::Nmi, started_at) {
            Interrupt::Nmi
        } else if !self.flag(Status::INTERRUPT_DISABLE)
            && self.signals.due(Interrupt::Irq, started_at)
        {
            Interrupt::Irq
        } else {
            return Ok(None);
        };

        self.enter_interrupt(kind)
            .map_err(|error| RunError::MemoryAccess { opcode, error })?;

        Ok(Some(kind))
    }

    fn enter_interrupt(&mut self, kind: Interrupt) -> Result<(), MemoryError> {
        // Two reads of the next opcode that are thrown away
        self.read_u8(self.regs.pc)?;
        self.read_u8(self.regs.pc)?;

        self.push_u16(self.regs.pc)?;
        self.push_u8(self.regs.p.pushed_by_hardware())?;
        self.set_flag(Status::INTERRUPT_DISABLE, true);
        self.regs.pc = self.read_u16(kind.vector())?;

        self.signals.cancel(kind);
        self.charge(INTERRUPT_CYCLES.into());
        log::debug!("entered {kind:?} handler at ${:04X}", self.regs.pc);

        Ok(())
    }

    #[inline]
    pub(crate) fn charge(&self, cycles: u64) {
        self.signals.advance(cycles);
    }

    #[inline]
    pub(crate) fn jam(&mut self) {
        self.jammed = true;
    }

    #[inline]
    pub(crate) fn read_u8(&mut self, addr: u16) -> Result<u8, MemoryError> {
        self.memory.read(addr)
    }

    #[inline]
    pub(crate) fn write_u8(&mut self, value: u8, addr: u16) -> Result<(), MemoryError> {
        self.memory.write(value, addr)
    }

    pub(crate) fn read_u16(&mut self, addr: u16) -> Result<u16, MemoryError> {
        let lo = self.read_u8(addr)?;
        let hi = self.read_u8(addr.wrapping_add(1))?;

        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// Reads the byte at PC and advances past it.
    #[inline]
    pub(crate) fn fetch_u8(&mut self) -> Result<u8, MemoryError> {
        let value = self.read_u8(self.regs.pc)?;
        self.regs.pc = self.regs.pc.wrapping_add(1);

        Ok(value)
    }

    pub(crate) fn fetch_u16(&mut self) -> Result<u16, MemoryError> {
        let lo = self.fetch_u8()?;
        let hi = self.fetch_u8()?;

        Ok(u16::from_le_bytes([lo, hi]))
    }

    #[inline]
    pub(crate) fn push_u8(&mut self, value: u8) -> Result<(), MemoryError> {
        self.write_u8(value, STACK_BOTTOM | self.regs.sp as u16)?;
        self.regs.sp = self.regs.sp.wrapping_sub(1);

        Ok(())
    }

    #[inline]
    pub(crate) fn pull_u8(&mut self) -> Result<u8, MemoryError> {
        self.regs.sp = self.regs.sp.wrapping_add(1);
        self.read_u8(STACK_BOTTOM | self.regs.sp as u16)
    }

    /// High byte first, so the word sits little-endian in memory.
    pub(crate) fn push_u16(&mut self, value: u16) -> Result<(), MemoryError> {
        let [lo, hi] = value.to_le_bytes();
        self.push_u8(hi)?;
        self.push_u8(lo)?;

        Ok(())
    }

    pub(crate) fn pull_u16(&mut self) -> Result<u16, MemoryError> {
        let lo = self.pull_u8()?;
        let hi = self.pull_u8()?;

        Ok(u16::from_le_bytes([lo, hi]))
    }

    #[inline]
    pub(crate) fn flag(&self, flag: Status) -> bool {
        self.regs.flag_set(flag)
    }

    /// The only way flags change: always sets or clears.
    #[inline]
    pub(crate) fn set_flag(&mut self, flag: Status, value: bool) {
        self.regs.p.set(flag, value);
    }

    #[inline]
    pub(crate) fn set_nz(&mut self, value: u8) {
        self.set_flag(Status::NEGATIVE, value & 0x80 != 0);
        self.set_flag(Status::ZERO, value == 0);
    }
}

impl InterruptLine for Cpu {
    fn interrupt(&self, kind: Interrupt) {
        self.signals.interrupt(kind);
    }

    fn cancel(&self, kind: Interrupt) {
        self.signals.cancel(kind);
    }
}

impl Debug for Cpu {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cpu")
            .field("registers", &self.regs)
            .field("cycles", &self.cycles())
            .field("memory", &self.memory)
            .field("fault", &self.fault)
            .field("jammed", &self.jammed)
            .finish()
    }
}

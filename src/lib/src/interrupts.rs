//! Interrupt lines
//!
//! Peripherals get a clone of [`Signals`] when the machine is assembled
//! and raise or withdraw interrupts through [`InterruptLine`]. The CPU
//! holds its own handle and checks it between instructions. A signal is
//! serviced only once a whole instruction boundary separates it from
//! the instruction that just retired, so a signal raised while an
//! instruction runs is taken after the *next* one.

use alloc::rc::Rc;
use core::cell::Cell;

/// When an interrupt is signaled (hardware or the software via BRK),
/// the low and the high 8 bits of the program counter are loaded
/// from a word at this address.
pub const IRQ_BRK_VECTOR: u16 = 0xFFFE;

/// When a reset is requested, the low and the high
/// 8 bits of the program counter are loaded
/// from a word at this address.
pub const RESET_VECTOR: u16 = 0xFFFC;

/// When an non-maskable interrupt is signaled,
/// the low and the high 8 bits of the program counter
/// from a word at this address.
pub const NMI_VECTOR: u16 = 0xFFFA;

/// Cycles taken to push the state and fetch the vector
pub const INTERRUPT_CYCLES: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Non-maskable, raised by the PPU at vertical blank
    Nmi,
    /// Maskable, raised by the APU frame counter or a mapper
    Irq,
}

impl Interrupt {
    pub fn vector(self) -> u16 {
        match self {
            Interrupt::Nmi => NMI_VECTOR,
            Interrupt::Irq => IRQ_BRK_VECTOR,
        }
    }
}

/// State of one interrupt input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Latch {
    #[default]
    Idle,
    Pending {
        raised_at: u64,
    },
}

/// The capability handed to peripherals
pub trait InterruptLine {
    fn interrupt(&self, kind: Interrupt);
    fn cancel(&self, kind: Interrupt);
}

#[derive(Debug, Default)]
struct Lines {
    cycles: Cell<u64>,
    nmi: Cell<Latch>,
    irq: Cell<Latch>,
}

/// Shared CPU clock and interrupt latches
#[derive(Debug, Clone, Default)]
pub struct Signals {
    lines: Rc<Lines>,
}

impl Signals {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn cycles(&self) -> u64 {
        self.lines.cycles.get()
    }

    #[inline]
    pub(crate) fn advance(&self, cycles: u64) {
        self.lines.cycles.set(self.lines.cycles.get() + cycles);
    }

    fn latch(&self, kind: Interrupt) -> &Cell<Latch> {
        match kind {
            Interrupt::Nmi => &self.lines.nmi,
            Interrupt::Irq => &self.lines.irq,
        }
    }

    pub fn state(&self, kind: Interrupt) -> Latch {
        self.latch(kind).get()
    }

    pub fn pending(&self, kind: Interrupt) -> bool {
        matches!(self.state(kind), Latch::Pending { .. })
    }

    /// True if `kind` was raised at or before `boundary`, the cycle the
    /// retiring instruction started on.
    pub(crate) fn due(&self, kind: Interrupt, boundary: u64) -> bool {
        match self.state(kind) {
            Latch::Idle => false,
            Latch::Pending { raised_at } => raised_at <= boundary,
        }
    }

    /// Drops every pending signal and restarts the clock.
    pub(crate) fn reset(&self) {
        self.lines.cycles.set(0);
        self.lines.nmi.set(Latch::Idle);
        self.lines.irq.set(Latch::Idle);
    }
}

impl InterruptLine for Signals {
    fn interrupt(&self, kind: Interrupt) {
        let latch = self.latch(kind);
        // A second edge before servicing is the same interrupt
        if latch.get() == Latch::Idle {
            latch.set(Latch::Pending {
                raised_at: self.cycles(),
            });
        }
    }

    fn cancel(&self, kind: Interrupt) {
        self.latch(kind).set(Latch::Idle);
    }
}

//! Memory bus
//!
//! The CPU sees a single 16-bit address space assembled from devices
//! mounted over non-overlapping address ranges. A device only ever sees
//! addresses relative to the start of its mount and is responsible for
//! its own mirroring.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt::Debug;

/// A device that can be mounted on the bus.
///
/// Reads take `&mut self`: reading a peripheral register may have side
/// effects (acknowledging a status flag, advancing an address latch).
pub trait Mountable {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, value: u8, addr: u16);

    /// Side-effect-free read for observers such as the tracer.
    /// Devices with read side effects should keep the default.
    fn peek(&self, _addr: u16) -> Option<u8> {
        None
    }
}

impl<T: Mountable> Mountable for Rc<RefCell<T>> {
    fn read(&mut self, addr: u16) -> u8 {
        self.borrow_mut().read(addr)
    }

    fn write(&mut self, value: u8, addr: u16) {
        self.borrow_mut().write(value, addr)
    }

    fn peek(&self, addr: u16) -> Option<u8> {
        self.try_borrow().ok().and_then(|d| d.peek(addr))
    }
}

/// Memory errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// No device is mounted at the address
    UnmappedRead(u16),
    /// No device is mounted at the address the value was written to
    UnmappedWrite(u16, u8),
}

impl core::fmt::Display for MemoryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MemoryError::UnmappedRead(addr) => {
                write!(f, "read from an unmapped address ${addr:04X}")
            }
            MemoryError::UnmappedWrite(addr, value) => {
                write!(f, "write of ${value:02X} to an unmapped address ${addr:04X}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MemoryError {}

/// Errors assembling the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountError {
    /// The requested range intersects a range that is already mounted
    Overlap {
        from: u16,
        to: u16,
        existing_from: u16,
        existing_to: u16,
    },
    /// The range ends before it starts
    Inverted { from: u16, to: u16 },
}

impl core::fmt::Display for MountError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MountError::Overlap {
                from,
                to,
                existing_from,
                existing_to,
            } => write!(
                f,
                "${from:04X}-${to:04X} overlaps the device mounted at ${existing_from:04X}-${existing_to:04X}"
            ),
            MountError::Inverted { from, to } => {
                write!(f, "mount range ${from:04X}-${to:04X} is inverted")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MountError {}

/// Called after every bus access, e.g. to advance the PPU in lockstep.
pub type AccessHook = Box<dyn FnMut()>;

/// A device bound to an inclusive address range
pub struct Mount {
    pub from: u16,
    pub to: u16,
    device: Box<dyn Mountable>,
}

impl Mount {
    #[inline]
    fn covers(&self, addr: u16) -> bool {
        self.from <= addr && addr <= self.to
    }

    #[inline]
    fn intersects(&self, from: u16, to: u16) -> bool {
        self.from <= to && from <= self.to
    }
}

impl Debug for Mount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "${:04X}-${:04X}", self.from, self.to)
    }
}

/// The CPU address space
#[derive(Default)]
pub struct Memory {
    mounts: Vec<Mount>,
    hook: Option<AccessHook>,
}

impl Memory {
    pub fn new() -> Self {
        Self {
            // A NES has RAM, the PPU and APU register blocks and the
            // cartridge windows. Few more than that is expected.
            mounts: Vec::with_capacity(8),
            hook: None,
        }
    }

    /// Mounts `device` over `from..=to`. The bus is left untouched when
    /// the range is rejected.
    pub fn mount<D>(&mut self, device: D, from: u16, to: u16) -> Result<(), MountError>
    where
        D: Mountable + 'static,
    {
        if from > to {
            return Err(MountError::Inverted { from, to });
        }

        if let Some(other) = self.mounts.iter().find(|m| m.intersects(from, to)) {
            return Err(MountError::Overlap {
                from,
                to,
                existing_from: other.from,
                existing_to: other.to,
            });
        }

        log::debug!("mounted a device at ${from:04X}-${to:04X}");
        self.mounts.push(Mount {
            from,
            to,
            device: Box::new(device),
        });

        Ok(())
    }

    pub fn mounts(&self) -> impl Iterator<Item = &Mount> {
        self.mounts.iter()
    }

    /// Installs the per-access callback, replacing the previous one.
    pub fn set_access_hook(&mut self, hook: AccessHook) {
        self.hook = Some(hook);
    }

    pub fn clear_access_hook(&mut self) {
        self.hook = None;
    }

    #[inline]
    fn find_mount(&mut self, addr: u16) -> Option<&mut Mount> {
        self.mounts.iter_mut().find(|m| m.covers(addr))
    }

    #[inline]
    fn accessed(&mut self) {
        if let Some(hook) = self.hook.as_mut() {
            hook();
        }
    }

    pub fn read(&mut self, addr: u16) -> Result<u8, MemoryError> {
        let mount = self
            .find_mount(addr)
            .ok_or(MemoryError::UnmappedRead(addr))?;
        let value = mount.device.read(addr - mount.from);
        self.accessed();

        Ok(value)
    }

    pub fn write(&mut self, value: u8, addr: u16) -> Result<(), MemoryError> {
        let mount = self
            .find_mount(addr)
            .ok_or(MemoryError::UnmappedWrite(addr, value))?;
        mount.device.write(value, addr - mount.from);
        self.accessed();

        Ok(())
    }

    /// Reads without side effects. `None` for unmapped addresses and for
    /// devices that cannot be observed passively.
    pub fn peek(&self, addr: u16) -> Option<u8> {
        self.mounts
            .iter()
            .find(|m| m.covers(addr))
            .and_then(|m| m.device.peek(addr - m.from))
    }

    /// Writes `data` starting at `at`, wrapping around the address space.
    pub fn copy(&mut self, data: &[u8], at: u16) -> Result<(), MemoryError> {
        for (i, &b) in data.iter().enumerate() {
            self.write(b, at.wrapping_add(i as u16))?;
        }

        Ok(())
    }

    /// Reads `from..to`.
    pub fn range(&mut self, from: u16, to: u16) -> Result<Vec<u8>, MemoryError> {
        (from..to).map(|addr| self.read(addr)).collect()
    }
}

impl Debug for Memory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Memory")
            .field("mounts", &self.mounts)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

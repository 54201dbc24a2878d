//! Register access.
//!
//! Everything the driver does to the hardware goes through [`Bus`], so the
//! same code drives the real peripherals through [`Mmio`] and a simulated bus
//! in the host tests.

use core::ptr::{with_exposed_provenance, with_exposed_provenance_mut};
use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::NVIC;

/// Word-wide access to memory-mapped peripheral registers.
pub trait Bus {
    /// Reads the 32-bit register at `addr`.
    ///
    /// Takes `&mut self` because reads have side effects on some registers
    /// (the UART data register pops the receive FIFO).
    ///
    /// # Safety
    ///
    /// `addr` must be a valid, clocked peripheral register.
    unsafe fn read(&mut self, addr: usize) -> u32;

    /// Writes the 32-bit register at `addr`.
    ///
    /// # Safety
    ///
    /// `addr` must be a valid, clocked peripheral register.
    unsafe fn write(&mut self, addr: usize, value: u32);

    /// Enables interrupt line `irq` in the NVIC.
    ///
    /// # Safety
    ///
    /// Unmasking can break critical sections that rely on this line staying
    /// masked; a handler must be ready to run.
    unsafe fn unmask(&mut self, irq: u16);

    /// Read-modify-write: sets `bits` in the register at `addr`.
    ///
    /// # Safety
    ///
    /// See [`Bus::read`] and [`Bus::write`].
    #[inline]
    unsafe fn set_bits(&mut self, addr: usize, bits: u32) {
        // SAFETY: Forwarded from the caller.
        unsafe {
            let v = self.read(addr);
            self.write(addr, v | bits);
        }
    }

    /// Read-modify-write: clears `bits` in the register at `addr`.
    ///
    /// # Safety
    ///
    /// See [`Bus::read`] and [`Bus::write`].
    #[inline]
    unsafe fn clear_bits(&mut self, addr: usize, bits: u32) {
        // SAFETY: Forwarded from the caller.
        unsafe {
            let v = self.read(addr);
            self.write(addr, v & !bits);
        }
    }
}

/// The real hardware: volatile accesses to the TM4C123 peripheral space.
#[derive(Debug)]
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Creates the hardware bus.
    ///
    /// # Safety
    ///
    /// Only one [`Mmio`] may exist, and nothing else may access the SYSCTL,
    /// GPIO, and UART registers this crate drives.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

#[derive(Clone, Copy)]
struct Irq(u16);

// SAFETY: `Irq` only ever carries a UART line number from `UartId::irq`, all
// of which are valid interrupts on the TM4C123.
unsafe impl InterruptNumber for Irq {
    fn number(self) -> u16 {
        self.0
    }
}

impl Bus for Mmio {
    #[inline]
    unsafe fn read(&mut self, addr: usize) -> u32 {
        let reg = with_exposed_provenance::<u32>(addr);
        // SAFETY: The caller guarantees `addr` is a valid register.
        unsafe { reg.read_volatile() }
    }

    #[inline]
    unsafe fn write(&mut self, addr: usize, value: u32) {
        let reg = with_exposed_provenance_mut::<u32>(addr);
        // SAFETY: The caller guarantees `addr` is a valid register.
        unsafe { reg.write_volatile(value) }
    }

    unsafe fn unmask(&mut self, irq: u16) {
        // SAFETY: The caller guarantees a handler is in place.
        unsafe { NVIC::unmask(Irq(irq)) }
    }
}

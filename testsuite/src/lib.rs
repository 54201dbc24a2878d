//! Shared support for the QEMU examples.
//!
//! QEMU's `lm3s6965evb` places its UARTs, GPIO ports and system control block
//! at the same addresses as the TM4C123, so `mil-hal` runs on it unchanged.
//! Only UART0 and UART1 exist on the emulated part.
//!
//! Serial port mapping: the first `-serial` argument is UART0, the second
//! UART1. The defmt log goes to semihosting stdout, leaving both UARTs free
//! for the code under test.

#![no_std]

mod logger;

use core::sync::atomic::{AtomicBool, Ordering};
use cortex_m_semihosting::debug::{self, EXIT_FAILURE, EXIT_SUCCESS};
use mil_hal::{Mmio, Uarts, use_internal_16mhz};

pub use cortex_m_rt::entry;

pub fn exit_success() -> ! {
    debug::exit(EXIT_SUCCESS);
    #[allow(clippy::empty_loop)]
    loop {}
}

pub fn exit_failure() -> ! {
    debug::exit(EXIT_FAILURE);
    #[allow(clippy::empty_loop)]
    loop {}
}

static TAKEN: AtomicBool = AtomicBool::new(false);

/// Brings up the system clock and returns the UART driver.
///
/// # Panics
///
/// If called more than once.
pub fn take_uarts() -> Uarts<Mmio> {
    assert!(!TAKEN.swap(true, Ordering::AcqRel), "UARTs already taken");

    // SAFETY: Guarded by `TAKEN`, this is the only `Mmio` in the program.
    let mut bus = unsafe { Mmio::new() };
    let clocks = use_internal_16mhz(&mut bus);
    defmt::debug!("system clock at {=u32} Hz", clocks.sysclk_hz());
    Uarts::new(bus, clocks)
}

//! System clock selection.
//!
//! The Launchpad is run straight from the precision internal oscillator: no
//! crystal, no PLL. The UART baud divisors are computed from the frequency
//! recorded in [`Clocks`], so clock setup has to happen before any UART is
//! initialized. [`Uarts::new`](crate::Uarts::new) takes a [`Clocks`] to make
//! that ordering impossible to get wrong.

use crate::backend::Bus;
use crate::regs::sysctl::{self, rcc, rcc2};

/// Frequency of the precision internal oscillator.
pub const PIOSC_HZ: u32 = 16_000_000;

/// Proof that the system clock has been configured, and at what frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Clocks {
    sysclk_hz: u32,
}

impl Clocks {
    /// The current system clock frequency in Hz.
    #[inline]
    pub const fn sysclk_hz(&self) -> u32 {
        self.sysclk_hz
    }
}

/// Runs the system clock directly from the 16 MHz internal oscillator.
///
/// Selects PIOSC as the oscillator source, bypasses and powers down the PLL,
/// disables the system divider, and hands control back to `RCC` by clearing
/// `RCC2.USERCC2`.
pub fn use_internal_16mhz<B: Bus>(bus: &mut B) -> Clocks {
    let rcc_addr = sysctl::BASE + sysctl::RCC;
    let rcc2_addr = sysctl::BASE + sysctl::RCC2;

    // SAFETY: RCC and RCC2 are always clocked and valid.
    unsafe {
        // Bypass first so the core never runs from a PLL being reconfigured.
        bus.set_bits(rcc_addr, rcc::BYPASS);

        let mut v = bus.read(rcc_addr);
        v &= !(rcc::OSCSRC_MASK | rcc::USESYSDIV);
        v |= rcc::OSCSRC_PIOSC | rcc::BYPASS | rcc::PWRDN;
        bus.write(rcc_addr, v);

        bus.clear_bits(rcc2_addr, rcc2::USERCC2);
    }

    Clocks {
        sysclk_hz: PIOSC_HZ,
    }
}

#[cfg(test)]
impl Clocks {
    pub(crate) const fn from_hz(sysclk_hz: u32) -> Self {
        Self { sysclk_hz }
    }
}

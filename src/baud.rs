//! Baud rates and the divisor arithmetic behind them.
//!
//! The UART divides its clock by `16 * (IBRD + FBRD / 64)`, or by
//! `8 * (IBRD + FBRD / 64)` in high-speed mode.

use crate::regs::uart;

/// The baud rate every MIL device talks at unless there is a reason not to.
pub const DEFAULT: u32 = 115_200;
/// Alias of [`DEFAULT`].
pub const BAUD_115200: u32 = DEFAULT;
#[allow(missing_docs)]
pub const BAUD_57600: u32 = 57_600;
#[allow(missing_docs)]
pub const BAUD_38400: u32 = 38_400;
#[allow(missing_docs)]
pub const BAUD_19200: u32 = 19_200;
#[allow(missing_docs)]
pub const BAUD_9600: u32 = 9_600;
/// Nonstandard preset, both ends must agree on it.
pub const BAUD_69420: u32 = 69_420;
/// Nonstandard preset, both ends must agree on it.
pub const BAUD_37000: u32 = 37_000;

/// Largest accepted deviation between requested and achieved rate, in
/// thousandths of the requested rate.
pub const MAX_ERROR_PERMILLE: u64 = 20;

/// Divisor register values for one baud rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Divisor {
    /// Integer part (`IBRD`).
    pub integer: u32,
    /// Fractional part in 64ths (`FBRD`).
    pub fraction: u32,
    /// Whether high-speed mode (`CTL.HSE`) is needed.
    pub high_speed: bool,
}

impl Divisor {
    /// Computes the divisor for `baud` from a UART clock of `clock_hz`.
    ///
    /// Returns `None` when the rate cannot be produced: zero, faster than the
    /// clock allows even in high-speed mode, outside the range of the divisor
    /// registers, or off by more than [`MAX_ERROR_PERMILLE`].
    pub fn compute(clock_hz: u32, baud: u32) -> Option<Self> {
        if baud == 0 || u64::from(baud) * 8 > u64::from(clock_hz) {
            return None;
        }

        let high_speed = u64::from(baud) * 16 > u64::from(clock_hz);
        let effective = if high_speed { baud / 2 } else { baud };

        // Divisor in 64ths, rounded to nearest.
        let div = (u64::from(clock_hz) * 8 / u64::from(effective) + 1) / 2;
        let integer = div >> uart::FBRD_BITS;
        if integer == 0 || integer > u64::from(uart::IBRD_MAX) {
            return None;
        }

        let divisor = Self {
            integer: integer as u32,
            fraction: (div & ((1 << uart::FBRD_BITS) - 1)) as u32,
            high_speed,
        };

        let actual = u64::from(divisor.baud_rate(clock_hz));
        if actual.abs_diff(u64::from(baud)) * 1000 > u64::from(baud) * MAX_ERROR_PERMILLE {
            return None;
        }

        Some(divisor)
    }

    /// The rate this divisor produces from a UART clock of `clock_hz`.
    pub fn baud_rate(&self, clock_hz: u32) -> u32 {
        let div = (u64::from(self.integer) << uart::FBRD_BITS) | u64::from(self.fraction);
        if div == 0 {
            return 0;
        }
        // clock / (16 * div / 64), doubled in high-speed mode.
        let per_div = if self.high_speed { 8 } else { 4 };
        (u64::from(clock_hz) * per_div / div) as u32
    }
}

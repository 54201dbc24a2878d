//! Errors returned by the driver.
//!
//! Nothing in this crate logs: every failure is handed back to the caller.

use crate::id::UartId;
use core::error::Error;
use core::fmt::{self, Display, Formatter};

/// A raw index does not name one of the eight UARTs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnknownInstance(pub u8);

impl Display for UnknownInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "there is no UART{}, valid instances are 0 to 7", self.0)
    }
}

impl Error for UnknownInstance {}

/// Error returned by [`Uarts::init`](crate::Uarts::init).
///
/// The peripheral is left untouched whenever this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    /// The instance was already initialized.
    AlreadyInitialized(UartId),
    /// The baud rate cannot be produced from the current system clock.
    BaudUnrepresentable {
        /// Requested rate in bits per second.
        baud: u32,
        /// System clock the divisor would be derived from.
        sysclk_hz: u32,
    },
}

impl Display for InitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInitialized(id) => write!(f, "{id:?} is already initialized"),
            Self::BaudUnrepresentable { baud, sysclk_hz } => write!(
                f,
                "{baud} baud cannot be derived from a {sysclk_hz} Hz system clock"
            ),
        }
    }
}

impl Error for InitError {}

/// The instance has not been initialized with [`Uarts::init`](crate::Uarts::init).
///
/// The rejected call has no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NotInitialized(pub UartId);

impl Display for NotInitialized {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} has not been initialized", self.0)
    }
}

impl Error for NotInitialized {}

//! `core::fmt` output on a UART.

use crate::backend::Bus;
use crate::id::UartId;
use crate::Uarts;
use core::fmt;

/// Carriage return.
pub const CR: u8 = 0x0D;
/// Line feed.
pub const LF: u8 = 0x0A;
/// Backspace.
pub const BS: u8 = 0x08;

/// What a [`Writer`] does with line feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NewlineMode {
    /// Bytes go out unchanged.
    Binary,
    /// Every `\n` goes out as `\r\n`, for terminals.
    SwapLFtoCRLF,
}

/// Formatted output on one UART, blocking per byte.
///
/// Created by [`Uarts::writer`].
pub struct Writer<'a, B: Bus> {
    uarts: &'a mut Uarts<B>,
    id: UartId,
    mode: NewlineMode,
}

impl<'a, B: Bus> Writer<'a, B> {
    /// `id` must be live.
    pub(crate) fn new(uarts: &'a mut Uarts<B>, id: UartId, mode: NewlineMode) -> Self {
        Self { uarts, id, mode }
    }

    /// The instance written to.
    pub fn id(&self) -> UartId {
        self.id
    }
}

impl<B: Bus> fmt::Write for Writer<'_, B> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for &byte in s.as_bytes() {
            if byte == LF && self.mode == NewlineMode::SwapLFtoCRLF {
                self.uarts.put(self.id, CR);
            }
            self.uarts.put(self.id, byte);
        }
        Ok(())
    }
}

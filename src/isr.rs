//! Interrupt masks and handler dispatch.
//!
//! Handlers are kept in a static table keyed on [`UartId`]. The application
//! routes the UART vectors (or its `DefaultHandler`) to [`on_interrupt`] or
//! [`dispatch`], which call whatever [`Uarts::install_isr`] registered.
//!
//! One handler serves every flag enabled for an instance. It demultiplexes by
//! reading [`Uarts::interrupt_status`]. Receive flags clear as the receive
//! path is drained. Other flags are cleared with [`Uarts::interrupt_clear`]
//! *before* servicing them: a clear written after the drain can swallow the
//! flag of a byte that arrived in between, and with the FIFO off no further
//! byte (and no further interrupt) comes until that one is read.
//!
//! [`Uarts::install_isr`]: crate::Uarts::install_isr
//! [`Uarts::interrupt_status`]: crate::Uarts::interrupt_status
//! [`Uarts::interrupt_clear`]: crate::Uarts::interrupt_clear

use crate::id::UartId;
use bitflags::bitflags;
use core::cell::Cell;
use critical_section::Mutex;

bitflags! {
    /// UART interrupt sources, laid out as in the `IM`, `RIS`, `MIS` and `ICR`
    /// registers.
    ///
    /// Bits not named here are carried through untouched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InterruptMask: u32 {
        /// Receive FIFO at or above its watermark (one byte with FIFO off).
        const RX_READY = 1 << 4;
        /// Transmit FIFO at or below its watermark (empty with FIFO off).
        const TX_READY = 1 << 5;
        /// Receive FIFO not empty and the line idle for 32 bit periods.
        const RX_TIMEOUT = 1 << 6;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for InterruptMask {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "InterruptMask({=u32:#x})", self.bits());
    }
}

/// An interrupt service routine.
///
/// Runs in interrupt context: keep it short and do not block on the UART it
/// serves.
pub type Handler = fn();

static HANDLERS: [Mutex<Cell<Option<Handler>>>; 8] =
    [const { Mutex::new(Cell::new(None)) }; 8];

pub(crate) fn register(id: UartId, handler: Handler) {
    critical_section::with(|cs| HANDLERS[id.index()].borrow(cs).set(Some(handler)));
}

/// The handler currently registered for `id`.
pub fn handler(id: UartId) -> Option<Handler> {
    critical_section::with(|cs| HANDLERS[id.index()].borrow(cs).get())
}

/// Runs the handler registered for `id`.
///
/// Returns `false` if nothing is registered. The handler runs outside of any
/// critical section.
pub fn dispatch(id: UartId) -> bool {
    match handler(id) {
        Some(h) => {
            h();
            true
        }
        None => false,
    }
}

/// Dispatches by interrupt number, as passed to a cortex-m-rt
/// `DefaultHandler`.
///
/// Returns `false` for lines that are not UARTs or have no handler.
pub fn on_interrupt(irqn: i16) -> bool {
    u16::try_from(irqn)
        .ok()
        .and_then(UartId::from_irq)
        .is_some_and(dispatch)
}

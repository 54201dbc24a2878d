//! Static pin routing for the eight UARTs.
//!
//! | UART | RX  | TX  |
//! |------|-----|-----|
//! | 0    | PA0 | PA1 |
//! | 1    | PB0 | PB1 |
//! | 2    | PD6 | PD7 |
//! | 3    | PC6 | PC7 |
//! | 4    | PC4 | PC5 |
//! | 5    | PE4 | PE5 |
//! | 6    | PD4 | PD5 |
//! | 7    | PE0 | PE1 |
//!
//! UART1 can also be routed to PC4/PC5, but those pins belong to UART4 in this
//! table, so that pin-set is not offered.

use crate::id::UartId;
use crate::regs::gpio;

/// A GPIO port carrying UART pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Port {
    /// Base address of the port's register block.
    pub const fn base(self) -> usize {
        match self {
            Port::A => gpio::PORTA_BASE,
            Port::B => gpio::PORTB_BASE,
            Port::C => gpio::PORTC_BASE,
            Port::D => gpio::PORTD_BASE,
            Port::E => gpio::PORTE_BASE,
            Port::F => gpio::PORTF_BASE,
        }
    }

    /// Bit of the port in `RCGCGPIO`.
    pub const fn clock_gate(self) -> u32 {
        1 << (self as u32)
    }
}

/// A single pin on a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin {
    /// Port the pin lives on.
    pub port: Port,
    /// Pin number within the port, `0..=7`.
    pub number: u8,
}

impl Pin {
    const fn new(port: Port, number: u8) -> Self {
        Self { port, number }
    }

    /// The pin's bit in the per-port registers.
    #[inline]
    pub const fn mask(self) -> u32 {
        1 << self.number
    }

    /// Pins guarded by the commit register (NMI and JTAG pins on port C, D, F).
    ///
    /// Their alternate-function selection only sticks after the port has been
    /// unlocked and the pin committed.
    pub const fn is_locked(self) -> bool {
        matches!(
            (self.port, self.number),
            (Port::C, 0..=3) | (Port::D, 7) | (Port::F, 0)
        )
    }
}

/// Everything needed to route one UART to its pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartPinout {
    /// Receive pin.
    pub rx: Pin,
    /// Transmit pin.
    pub tx: Pin,
    /// Bit to set in `RCGCGPIO` for the port carrying both pins.
    pub gpio_gate: u32,
    /// Bit to set in `RCGCUART` for the UART itself.
    pub uart_gate: u32,
    /// Port-control (`PCTL`) selector routing the RX pin to the UART.
    pub rx_function: u8,
    /// Port-control (`PCTL`) selector routing the TX pin to the UART.
    pub tx_function: u8,
}

impl UartPinout {
    /// The port both pins live on.
    #[inline]
    pub const fn port(&self) -> Port {
        self.rx.port
    }

    /// Combined pin mask of RX and TX.
    #[inline]
    pub const fn pin_mask(&self) -> u32 {
        self.rx.mask() | self.tx.mask()
    }
}

/// Port-control selector of the UART function on every pin in the table.
const UART_FUNCTION: u8 = 1;

const fn entry(id: UartId, port: Port, rx: u8, tx: u8) -> UartPinout {
    UartPinout {
        rx: Pin::new(port, rx),
        tx: Pin::new(port, tx),
        gpio_gate: port.clock_gate(),
        uart_gate: 1 << id.index(),
        rx_function: UART_FUNCTION,
        tx_function: UART_FUNCTION,
    }
}

/// Returns the pin routing of `id`.
pub const fn pinout_of(id: UartId) -> UartPinout {
    match id {
        UartId::Uart0 => entry(id, Port::A, 0, 1),
        UartId::Uart1 => entry(id, Port::B, 0, 1),
        UartId::Uart2 => entry(id, Port::D, 6, 7),
        UartId::Uart3 => entry(id, Port::C, 6, 7),
        UartId::Uart4 => entry(id, Port::C, 4, 5),
        UartId::Uart5 => entry(id, Port::E, 4, 5),
        UartId::Uart6 => entry(id, Port::D, 4, 5),
        UartId::Uart7 => entry(id, Port::E, 0, 1),
    }
}

//! Typed identity of the eight UART instances.

use crate::error::UnknownInstance;
use crate::regs::uart;

/// One of the eight UART peripherals of the TM4C123.
///
/// The set is closed: an identifier outside `0..=7` cannot be constructed, so
/// no operation can be aimed at an unknown base address. Use
/// [`UartId::try_from`] to convert from a raw index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum UartId {
    Uart0 = 0,
    Uart1 = 1,
    Uart2 = 2,
    Uart3 = 3,
    Uart4 = 4,
    Uart5 = 5,
    Uart6 = 6,
    Uart7 = 7,
}

impl UartId {
    /// All identifiers, in index order.
    pub const ALL: [UartId; 8] = [
        UartId::Uart0,
        UartId::Uart1,
        UartId::Uart2,
        UartId::Uart3,
        UartId::Uart4,
        UartId::Uart5,
        UartId::Uart6,
        UartId::Uart7,
    ];

    /// Numeric index of the instance, `0..=7`.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Base address of the instance's register block.
    #[inline]
    pub const fn base(self) -> usize {
        uart::UART0_BASE + self.index() * uart::STRIDE
    }

    /// Interrupt number of the instance in the NVIC.
    pub const fn irq(self) -> u16 {
        match self {
            UartId::Uart0 => 5,
            UartId::Uart1 => 6,
            UartId::Uart2 => 33,
            UartId::Uart3 => 59,
            UartId::Uart4 => 60,
            UartId::Uart5 => 61,
            UartId::Uart6 => 62,
            UartId::Uart7 => 63,
        }
    }

    /// Reverse of [`UartId::irq`].
    pub const fn from_irq(irq: u16) -> Option<UartId> {
        match irq {
            5 => Some(UartId::Uart0),
            6 => Some(UartId::Uart1),
            33 => Some(UartId::Uart2),
            59 => Some(UartId::Uart3),
            60 => Some(UartId::Uart4),
            61 => Some(UartId::Uart5),
            62 => Some(UartId::Uart6),
            63 => Some(UartId::Uart7),
            _ => None,
        }
    }
}

impl TryFrom<u8> for UartId {
    type Error = UnknownInstance;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        UartId::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(UnknownInstance(value))
    }
}

impl From<UartId> for u8 {
    fn from(id: UartId) -> u8 {
        id as u8
    }
}

//! Register map of the TM4C123 blocks this crate touches.
//!
//! Offsets and bit positions follow the TM4C123GH6PM datasheet. Only the
//! registers needed for clock selection, pin routing, and the UARTs are listed.

#![allow(missing_docs)]

/// System control block.
pub mod sysctl {
    /// Base address of the system control block.
    pub const BASE: usize = 0x400F_E000;

    pub const RCC: usize = 0x060; // Run-Mode Clock Configuration
    pub const RCC2: usize = 0x070; // Run-Mode Clock Configuration 2
    pub const RCGCGPIO: usize = 0x608; // GPIO Run Mode Clock Gating Control
    pub const RCGCUART: usize = 0x618; // UART Run Mode Clock Gating Control

    /// RCC fields.
    pub mod rcc {
        pub const OSCSRC_MASK: u32 = 0x3 << 4;
        /// Precision internal oscillator selected as clock source.
        pub const OSCSRC_PIOSC: u32 = 0x1 << 4;
        pub const BYPASS: u32 = 1 << 11;
        pub const PWRDN: u32 = 1 << 13;
        pub const USESYSDIV: u32 = 1 << 22;
    }

    /// RCC2 fields.
    pub mod rcc2 {
        pub const USERCC2: u32 = 1 << 31;
    }
}

/// GPIO ports (APB aperture).
pub mod gpio {
    pub const PORTA_BASE: usize = 0x4000_4000;
    pub const PORTB_BASE: usize = 0x4000_5000;
    pub const PORTC_BASE: usize = 0x4000_6000;
    pub const PORTD_BASE: usize = 0x4000_7000;
    pub const PORTE_BASE: usize = 0x4002_4000;
    pub const PORTF_BASE: usize = 0x4002_5000;

    pub const AFSEL: usize = 0x420; // Alternate Function Select
    pub const DR2R: usize = 0x500; // 2-mA Drive Select
    pub const DR4R: usize = 0x504; // 4-mA Drive Select
    pub const DR8R: usize = 0x508; // 8-mA Drive Select
    pub const ODR: usize = 0x50C; // Open Drain Select
    pub const PUR: usize = 0x510; // Pull-Up Select
    pub const PDR: usize = 0x514; // Pull-Down Select
    pub const SLR: usize = 0x518; // Slew Rate Control Select
    pub const DEN: usize = 0x51C; // Digital Enable
    pub const LOCK: usize = 0x520; // Lock
    pub const CR: usize = 0x524; // Commit
    pub const AMSEL: usize = 0x528; // Analog Mode Select
    pub const PCTL: usize = 0x52C; // Port Control

    /// Value written to [`LOCK`] to unlock the commit register.
    pub const LOCK_KEY: u32 = 0x4C4F_434B;
}

/// UART blocks.
pub mod uart {
    /// Base address of UART0. UARTn lives at `UART0_BASE + n * STRIDE`.
    pub const UART0_BASE: usize = 0x4000_C000;
    pub const STRIDE: usize = 0x1000;

    pub const DR: usize = 0x000; // Data Register
    pub const FR: usize = 0x018; // Flag Register
    pub const IBRD: usize = 0x024; // Integer Baud-Rate Divisor
    pub const FBRD: usize = 0x028; // Fractional Baud-Rate Divisor
    pub const LCRH: usize = 0x02C; // Line Control
    pub const CTL: usize = 0x030; // Control
    pub const IFLS: usize = 0x034; // Interrupt FIFO Level Select
    pub const IM: usize = 0x038; // Interrupt Mask
    pub const RIS: usize = 0x03C; // Raw Interrupt Status
    pub const MIS: usize = 0x040; // Masked Interrupt Status
    pub const ICR: usize = 0x044; // Interrupt Clear

    /// Flag register bits.
    pub mod fr {
        pub const BUSY: u32 = 1 << 3; // Transmitting
        pub const RXFE: u32 = 1 << 4; // Receive FIFO Empty
        pub const TXFF: u32 = 1 << 5; // Transmit FIFO Full
        pub const TXFE: u32 = 1 << 7;
    }

    /// Line control bits.
    pub mod lcrh {
        pub const PEN: u32 = 1 << 1; // Parity Enable
        pub const STP2: u32 = 1 << 3; // Two Stop Bits
        pub const FEN: u32 = 1 << 4; // FIFO Enable
        /// Word length field: `data bits - 5`.
        pub const WLEN_SHIFT: u32 = 5;
        pub const WLEN_8: u32 = 0x3 << WLEN_SHIFT;
    }

    /// Control bits.
    pub mod ctl {
        pub const UARTEN: u32 = 1 << 0;
        pub const HSE: u32 = 1 << 5; // High-Speed Enable (clock divided by 8)
        pub const TXE: u32 = 1 << 8;
        pub const RXE: u32 = 1 << 9;
    }

    /// Interrupt FIFO level select fields.
    pub mod ifls {
        pub const TX_SHIFT: u32 = 0;
        pub const RX_SHIFT: u32 = 3;
        pub const FIELD_MASK: u32 = 0x7;
    }

    /// Largest value the integer divisor register holds.
    pub const IBRD_MAX: u32 = 0xFFFF;
    /// The fractional divisor has 6 bits.
    pub const FBRD_BITS: u32 = 6;
}

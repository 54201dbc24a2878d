//! FIFO interrupt watermarks.

use crate::regs::uart::ifls;

/// Depth of the hardware transmit and receive FIFOs, in bytes.
pub const FIFO_DEPTH: u8 = 8;

/// Fill level at which the FIFO raises its interrupt.
///
/// The receive interrupt fires when the RX FIFO fills past the level, the
/// transmit interrupt when the TX FIFO drains below it. These five levels are
/// the only ones the hardware supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum WatermarkLevel {
    /// 1/8 full (1 byte).
    OneEighth = 0,
    /// 2/8 full (2 bytes).
    TwoEighths = 1,
    /// 4/8 full (4 bytes).
    FourEighths = 2,
    /// 6/8 full (6 bytes).
    SixEighths = 3,
    /// 7/8 full (7 bytes).
    SevenEighths = 4,
}

impl WatermarkLevel {
    /// Quantizes a requested interrupt depth in bytes to a supported level.
    ///
    /// | depth  | level |
    /// |--------|-------|
    /// | 0, 1   | 1/8   |
    /// | 2      | 2/8   |
    /// | 3, 4   | 4/8   |
    /// | 5, 6   | 6/8   |
    /// | 7..    | 7/8   |
    ///
    /// Out-of-range requests are clamped rather than rejected.
    pub const fn from_depth(depth: u8) -> Self {
        match depth {
            0..=1 => WatermarkLevel::OneEighth,
            2 => WatermarkLevel::TwoEighths,
            3..=4 => WatermarkLevel::FourEighths,
            5..=6 => WatermarkLevel::SixEighths,
            _ => WatermarkLevel::SevenEighths,
        }
    }

    /// Fill level in bytes.
    pub const fn bytes(self) -> u8 {
        match self {
            WatermarkLevel::OneEighth => 1,
            WatermarkLevel::TwoEighths => 2,
            WatermarkLevel::FourEighths => 4,
            WatermarkLevel::SixEighths => 6,
            WatermarkLevel::SevenEighths => 7,
        }
    }

    /// The 3-bit `IFLS` field encoding.
    #[inline]
    pub const fn bits(self) -> u32 {
        self as u32
    }

    /// Decodes an `IFLS` field. Reserved encodings yield `None`.
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0 => Some(WatermarkLevel::OneEighth),
            1 => Some(WatermarkLevel::TwoEighths),
            2 => Some(WatermarkLevel::FourEighths),
            3 => Some(WatermarkLevel::SixEighths),
            4 => Some(WatermarkLevel::SevenEighths),
            _ => None,
        }
    }

    /// `IFLS` value with this level on both the receive and transmit side.
    #[inline]
    pub const fn ifls(self) -> u32 {
        (self.bits() << ifls::RX_SHIFT) | (self.bits() << ifls::TX_SHIFT)
    }
}

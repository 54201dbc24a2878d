//! FIFO watermarks are quantized to the five hardware levels.

#![no_std]
#![no_main]

use mil_hal::{UartId, WatermarkLevel, baud};
use testsuite::{entry, exit_success, take_uarts};

#[entry]
fn main() -> ! {
    let mut uarts = take_uarts();
    let id = UartId::Uart1;
    uarts.init(id, baud::DEFAULT).unwrap();

    for (depth, expected) in [
        (3, WatermarkLevel::FourEighths),
        (7, WatermarkLevel::SevenEighths),
        (100, WatermarkLevel::SevenEighths),
        (0, WatermarkLevel::OneEighth),
    ] {
        let level = uarts.fifo_enable(id, depth).unwrap();
        defmt::info!("depth {=u8} -> {}", depth, level);
        assert_eq!(level, expected);
        assert!(uarts.is_fifo_enabled(id).unwrap());
        assert_eq!(uarts.watermarks(id).unwrap(), (Some(expected), Some(expected)));
    }

    uarts.fifo_disable(id).unwrap();
    assert!(!uarts.is_fifo_enabled(id).unwrap());
    assert!(uarts.is_enabled(id).unwrap());

    exit_success();
}

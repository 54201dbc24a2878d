//! @test-mode: echo
//!
//! Echoes 256 bytes on UART1 by polling.

#![no_std]
#![no_main]

use mil_hal::{UartId, baud};
use testsuite::{entry, exit_success, take_uarts};

#[entry]
fn main() -> ! {
    let mut uarts = take_uarts();
    let id = UartId::Uart1;
    uarts.init(id, baud::DEFAULT).unwrap();
    defmt::info!("echoing on {}", id);

    for _ in 0..256 {
        let byte = uarts.char_get(id).unwrap();
        uarts.char_put(id, byte).unwrap();
    }

    defmt::info!("echoed 256 bytes");
    exit_success();
}

//! "Hi" goes out on UART0 with its terminator.

#![no_std]
#![no_main]

use mil_hal::{UartId, baud};
use testsuite::{entry, exit_success, take_uarts};

#[entry]
fn main() -> ! {
    let mut uarts = take_uarts();
    uarts.init(UartId::Uart0, baud::DEFAULT).unwrap();

    uarts.tx_cstring(UartId::Uart0, c"Hi").unwrap();
    defmt::info!("sent");

    exit_success();
}

//! Zero bytes are ordinary data for `tx_array`.

#![no_std]
#![no_main]

use mil_hal::{UartId, baud};
use testsuite::{entry, exit_success, take_uarts};

#[entry]
fn main() -> ! {
    let mut uarts = take_uarts();
    let id = UartId::Uart0;
    uarts.init(id, baud::DEFAULT).unwrap();

    uarts.tx_array(id, &[]).unwrap();
    uarts.tx_array(id, &[0x00, 0x00, 0x00]).unwrap();
    defmt::info!("sent 3 bytes");

    exit_success();
}

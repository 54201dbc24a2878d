//! UART1 at 115200 baud comes up enabled, FIFO off, no interrupts armed.

#![no_std]
#![no_main]

use mil_hal::{InitError, NotInitialized, UartId, baud};
use testsuite::{entry, exit_success, take_uarts};

#[entry]
fn main() -> ! {
    let mut uarts = take_uarts();
    let id = UartId::Uart1;

    uarts.init(id, baud::DEFAULT).unwrap();
    defmt::info!("{} initialized", id);

    assert!(uarts.is_enabled(id).unwrap());
    assert!(!uarts.is_fifo_enabled(id).unwrap());
    assert!(uarts.interrupt_mask(id).unwrap().is_empty());

    let actual = uarts.baud_rate(id).unwrap();
    defmt::info!("requested {=u32} baud, programmed {=u32}", baud::DEFAULT, actual);
    assert!(actual.abs_diff(baud::DEFAULT) * 100 <= baud::DEFAULT);

    assert_eq!(
        uarts.init(id, baud::BAUD_9600),
        Err(InitError::AlreadyInitialized(id))
    );
    assert!(uarts.baud_rate(id).unwrap() > 100_000);

    let err = uarts.init(UartId::Uart0, 3_000_000).unwrap_err();
    defmt::info!("rejected: {}", err);
    assert!(!uarts.is_initialized(UartId::Uart0));
    assert_eq!(
        uarts.tx_array(UartId::Uart0, b"x"),
        Err(NotInitialized(UartId::Uart0))
    );

    exit_success();
}

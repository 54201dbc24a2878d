//! Formatted output, with and without newline translation.

#![no_std]
#![no_main]

use core::fmt::Write;
use mil_hal::{NewlineMode, UartId, baud};
use testsuite::{entry, exit_success, take_uarts};

#[entry]
fn main() -> ! {
    let mut uarts = take_uarts();
    let id = UartId::Uart0;
    uarts.init(id, baud::DEFAULT).unwrap();

    let mut term = uarts.writer(id, NewlineMode::SwapLFtoCRLF).unwrap();
    writeln!(term, "uart{}", 0).unwrap();

    let mut raw = uarts.writer(id, NewlineMode::Binary).unwrap();
    write!(raw, "x\n").unwrap();

    exit_success();
}

//! @test-mode: echo
//!
//! Echoes 256 bytes on UART1 from its receive interrupt, one byte per
//! interrupt with the FIFO off.

#![no_std]
#![no_main]

use core::cell::RefCell;
use core::sync::atomic::{AtomicUsize, Ordering};
use cortex_m_rt::exception;
use critical_section::Mutex;
use mil_hal::{InterruptMask, Mmio, UartId, Uarts, baud, isr};
use testsuite::{entry, exit_success, take_uarts};

const ID: UartId = UartId::Uart1;
const BYTES: usize = 256;

static UARTS: Mutex<RefCell<Option<Uarts<Mmio>>>> = Mutex::new(RefCell::new(None));
static ENTRIES: AtomicUsize = AtomicUsize::new(0);
static ECHOED: AtomicUsize = AtomicUsize::new(0);

fn on_uart1() {
    ENTRIES.fetch_add(1, Ordering::Relaxed);
    critical_section::with(|cs| {
        let mut uarts = UARTS.borrow_ref_mut(cs);
        let Some(uarts) = uarts.as_mut() else {
            return;
        };
        // Reading the byte drops RX_READY; nothing to clear by hand.
        if let Ok(Some(byte)) = uarts.char_get_non_blocking(ID) {
            uarts.char_put(ID, byte).unwrap();
            ECHOED.fetch_add(1, Ordering::Relaxed);
        }
    });
}

#[exception]
unsafe fn DefaultHandler(irqn: i16) {
    if !isr::on_interrupt(irqn) {
        panic!("unexpected interrupt {}", irqn);
    }
}

#[entry]
fn main() -> ! {
    let mut uarts = take_uarts();
    uarts.init(ID, baud::DEFAULT).unwrap();

    // Input is already waiting: the handler must find the driver in place the
    // moment the line is unmasked.
    critical_section::with(|cs| {
        uarts
            .install_isr(ID, InterruptMask::RX_READY, on_uart1)
            .unwrap();
        UARTS.borrow(cs).replace(Some(uarts));
    });
    defmt::info!("echoing on {} from its interrupt", ID);

    while ECHOED.load(Ordering::Relaxed) < BYTES {
        core::hint::spin_loop();
    }

    let entries = ENTRIES.load(Ordering::Relaxed);
    defmt::info!("{=usize} handler entries for {=usize} bytes", entries, BYTES);
    assert_eq!(entries, BYTES);
    assert_eq!(ECHOED.load(Ordering::Relaxed), BYTES);

    exit_success();
}

#![no_std]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

#[cfg(test)]
extern crate std;

use core::ffi::CStr;

pub use backend::{Bus, Mmio};
pub use baud::Divisor;
pub use clock::{Clocks, use_internal_16mhz};
pub use error::{InitError, NotInitialized, UnknownInstance};
pub use fifo::WatermarkLevel;
pub use id::UartId;
pub use isr::{Handler, InterruptMask};
pub use pinmux::{Pin, Port, UartPinout, pinout_of};
pub use writer::{BS, CR, LF, NewlineMode, Writer};

pub mod backend;
pub mod baud;
pub mod clock;
mod error;
pub mod fifo;
mod id;
pub mod isr;
pub mod pinmux;
pub mod regs;
#[cfg(test)]
mod sim;
mod writer;

use regs::{gpio, sysctl, uart};

/// Line format on the wire. Fixed, not configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameFormat {
    /// Data bits per character.
    pub data_bits: u8,
    /// Stop bits per character.
    pub stop_bits: u8,
    /// Whether a parity bit is sent.
    pub parity: bool,
}

impl FrameFormat {
    /// The line control (`LCRH`) value for this format, FIFO off.
    ///
    /// Data bits are clamped to the 5 to 8 the hardware supports. More than
    /// one stop bit selects two. Parity, when enabled, is odd.
    pub const fn lcrh(self) -> u32 {
        let data_bits = if self.data_bits < 5 {
            5
        } else if self.data_bits > 8 {
            8
        } else {
            self.data_bits
        };
        let mut lcrh = ((data_bits - 5) as u32) << uart::lcrh::WLEN_SHIFT;
        if self.stop_bits > 1 {
            lcrh |= uart::lcrh::STP2;
        }
        if self.parity {
            lcrh |= uart::lcrh::PEN;
        }
        lcrh
    }
}

/// 8 data bits, 1 stop bit, no parity.
pub const FRAME: FrameFormat = FrameFormat {
    data_bits: 8,
    stop_bits: 1,
    parity: false,
};

/// Driver for the eight UARTs.
///
/// Owns the register bus and tracks which instances have been initialized.
/// Every instance goes through the same lifecycle:
///
/// ```text
/// uninitialized --init()--> live, FIFO off --fifo_enable()--> live, FIFO on
///                                  <----------fifo_disable()--
/// ```
///
/// Interrupt arming with [`Uarts::install_isr`] is orthogonal to the FIFO
/// state. Transmit and receive work in both live states.
///
/// Calls on an instance that has not been initialized are rejected with
/// [`NotInitialized`]: its clock gate is still closed and any register access
/// would fault.
///
/// None of the methods are reentrant. If an interrupt handler touches the same
/// instance as the main loop, keep the driver in a
/// `critical_section::Mutex<RefCell<_>>` or mask the line around task-level
/// access.
#[derive(Debug)]
pub struct Uarts<B: Bus> {
    bus: B,
    clocks: Clocks,
    live: [bool; 8],
}

impl<B: Bus> Uarts<B> {
    /// Creates the driver with every instance uninitialized.
    ///
    /// Taking [`Clocks`] ensures the system clock is configured before any
    /// baud divisor is derived from it.
    pub const fn new(bus: B, clocks: Clocks) -> Self {
        Self {
            bus,
            clocks,
            live: [false; 8],
        }
    }

    /// The clock configuration baud divisors are derived from.
    #[inline]
    pub const fn clocks(&self) -> Clocks {
        self.clocks
    }

    /// Gives the bus back.
    pub fn free(self) -> B {
        self.bus
    }

    /// Whether `id` has been initialized.
    #[inline]
    pub const fn is_initialized(&self, id: UartId) -> bool {
        self.live[id.index()]
    }

    /* ----- Init, FIFO, interrupts ----------------------------------------- */

    /// Brings `id` up at `baud` with the fixed [`FRAME`] format.
    ///
    /// In order:
    /// 1. open the UART clock gate,
    /// 2. open the GPIO port clock gate,
    /// 3. select the UART function for both pins in the port control register,
    /// 4. hand both pins to the alternate function with digital pads enabled,
    /// 5. program the baud divisor,
    /// 6. program the 8-N-1 line format,
    /// 7. enable the UART with transmitter and receiver,
    /// 8. disable the FIFO.
    ///
    /// On return the instance is live with its FIFO off: every byte received
    /// raises the receive interrupt and a single-byte transmit is accepted
    /// immediately. No interrupts are enabled.
    ///
    /// # Errors
    ///
    /// - [`InitError::AlreadyInitialized`]: `id` is already live.
    /// - [`InitError::BaudUnrepresentable`]: no divisor produces `baud` from
    ///   the system clock within [`baud::MAX_ERROR_PERMILLE`].
    ///
    /// Both are detected before any register is written.
    pub fn init(&mut self, id: UartId, baud: u32) -> Result<(), InitError> {
        if self.is_initialized(id) {
            return Err(InitError::AlreadyInitialized(id));
        }
        let sysclk_hz = self.clocks.sysclk_hz();
        let divisor =
            Divisor::compute(sysclk_hz, baud).ok_or(InitError::BaudUnrepresentable {
                baud,
                sysclk_hz,
            })?;

        let pinout = pinout_of(id);
        let port = pinout.port().base();
        let pins = pinout.pin_mask();
        let ubase = id.base();

        // SAFETY: SYSCTL is always clocked. GPIO and UART registers are only
        // touched after their gates are opened, and only at offsets from the
        // register map.
        unsafe {
            self.bus
                .set_bits(sysctl::BASE + sysctl::RCGCUART, pinout.uart_gate);
            self.bus
                .set_bits(sysctl::BASE + sysctl::RCGCGPIO, pinout.gpio_gate);
            // The gate takes a few cycles to open; the read-back covers them.
            let _ = self.bus.read(sysctl::BASE + sysctl::RCGCGPIO);

            let locked = pinout.rx.is_locked() || pinout.tx.is_locked();
            if locked {
                self.bus.write(port + gpio::LOCK, gpio::LOCK_KEY);
                self.bus.set_bits(port + gpio::CR, pins);
            }

            let mut pctl = self.bus.read(port + gpio::PCTL);
            for (pin, function) in [
                (pinout.rx, pinout.rx_function),
                (pinout.tx, pinout.tx_function),
            ] {
                let shift = 4 * u32::from(pin.number);
                pctl &= !(0xF << shift);
                pctl |= u32::from(function) << shift;
            }
            self.bus.write(port + gpio::PCTL, pctl);

            self.bus.set_bits(port + gpio::AFSEL, pins);
            self.bus.set_bits(port + gpio::DR2R, pins);
            self.bus.clear_bits(port + gpio::DR4R, pins);
            self.bus.clear_bits(port + gpio::DR8R, pins);
            self.bus.clear_bits(port + gpio::SLR, pins);
            self.bus.clear_bits(port + gpio::ODR, pins);
            self.bus.clear_bits(port + gpio::PUR, pins);
            self.bus.clear_bits(port + gpio::PDR, pins);
            self.bus.set_bits(port + gpio::DEN, pins);
            self.bus.clear_bits(port + gpio::AMSEL, pins);

            if locked {
                self.bus.write(port + gpio::LOCK, 0);
            }

            // Quiesce the UART while its divisor changes: let a frame in
            // flight finish, then drop the FIFO and the enables.
            while self.bus.read(ubase + uart::FR) & uart::fr::BUSY != 0 {}
            self.bus.clear_bits(ubase + uart::LCRH, uart::lcrh::FEN);
            self.bus.clear_bits(
                ubase + uart::CTL,
                uart::ctl::UARTEN | uart::ctl::TXE | uart::ctl::RXE,
            );
            self.bus.write(ubase + uart::IM, 0);
            if divisor.high_speed {
                self.bus.set_bits(ubase + uart::CTL, uart::ctl::HSE);
            } else {
                self.bus.clear_bits(ubase + uart::CTL, uart::ctl::HSE);
            }
            self.bus.write(ubase + uart::IBRD, divisor.integer);
            self.bus.write(ubase + uart::FBRD, divisor.fraction);

            self.bus.write(ubase + uart::LCRH, FRAME.lcrh());

            self.bus.set_bits(
                ubase + uart::CTL,
                uart::ctl::UARTEN | uart::ctl::TXE | uart::ctl::RXE,
            );

            self.bus.clear_bits(ubase + uart::LCRH, uart::lcrh::FEN);
        }

        self.live[id.index()] = true;
        Ok(())
    }

    /// Enables the FIFO with both interrupt watermarks at the level nearest
    /// to `depth` bytes.
    ///
    /// `depth` is quantized by [`WatermarkLevel::from_depth`]; out-of-range
    /// requests are clamped, never rejected. Returns the programmed level.
    pub fn fifo_enable(&mut self, id: UartId, depth: u8) -> Result<WatermarkLevel, NotInitialized> {
        self.check(id)?;
        let level = WatermarkLevel::from_depth(depth);
        // SAFETY: `id` is live.
        unsafe {
            self.bus.write(id.base() + uart::IFLS, level.ifls());
            self.bus.set_bits(id.base() + uart::LCRH, uart::lcrh::FEN);
        }
        Ok(level)
    }

    /// Turns the FIFO back off. Watermarks are kept for the next enable.
    pub fn fifo_disable(&mut self, id: UartId) -> Result<(), NotInitialized> {
        self.check(id)?;
        // SAFETY: `id` is live.
        unsafe { self.bus.clear_bits(id.base() + uart::LCRH, uart::lcrh::FEN) };
        Ok(())
    }

    /// Enables the interrupt sources in `mask` and installs `handler` for the
    /// instance's interrupt line.
    ///
    /// The peripheral enables are written before the handler is stored, and
    /// the NVIC line is unmasked last. If several sources are enabled the
    /// handler has to tell them apart with [`Uarts::interrupt_status`].
    ///
    /// The handler only runs if the application routes the vector to
    /// [`isr::on_interrupt`] or [`isr::dispatch`].
    pub fn install_isr(
        &mut self,
        id: UartId,
        mask: InterruptMask,
        handler: Handler,
    ) -> Result<(), NotInitialized> {
        self.check(id)?;
        // SAFETY: `id` is live.
        unsafe { self.bus.set_bits(id.base() + uart::IM, mask.bits()) };
        isr::register(id, handler);
        // SAFETY: A handler is registered for the line.
        unsafe { self.bus.unmask(id.irq()) };
        Ok(())
    }

    /// Disables the interrupt sources in `mask`. The handler stays installed.
    pub fn disable_interrupts(&mut self, id: UartId, mask: InterruptMask) -> Result<(), NotInitialized> {
        self.check(id)?;
        // SAFETY: `id` is live.
        unsafe { self.bus.clear_bits(id.base() + uart::IM, mask.bits()) };
        Ok(())
    }

    /// Pending interrupt sources: only enabled ones if `masked`, all raw
    /// sources otherwise.
    pub fn interrupt_status(&mut self, id: UartId, masked: bool) -> Result<InterruptMask, NotInitialized> {
        self.check(id)?;
        let reg = if masked { uart::MIS } else { uart::RIS };
        // SAFETY: `id` is live.
        let bits = unsafe { self.bus.read(id.base() + reg) };
        Ok(InterruptMask::from_bits_retain(bits))
    }

    /// Acknowledges the interrupt sources in `mask`.
    pub fn interrupt_clear(&mut self, id: UartId, mask: InterruptMask) -> Result<(), NotInitialized> {
        self.check(id)?;
        // SAFETY: `id` is live.
        unsafe { self.bus.write(id.base() + uart::ICR, mask.bits()) };
        Ok(())
    }

    /* ----- Transmit ------------------------------------------------------- */

    /// Transmits every byte of `bytes`, in order, blocking while the transmit
    /// path is full.
    ///
    /// Returns once the last byte has been accepted by the peripheral, which
    /// is not necessarily when it has left the wire.
    pub fn tx_array(&mut self, id: UartId, bytes: &[u8]) -> Result<(), NotInitialized> {
        self.check(id)?;
        for &byte in bytes {
            self.put(id, byte);
        }
        Ok(())
    }

    /// Transmits a NUL-terminated string, terminator included.
    ///
    /// The trailing `0x00` goes out on the wire, so receivers can use it as a
    /// frame delimiter. An empty string transmits exactly one `0x00`.
    pub fn tx_cstring(&mut self, id: UartId, s: &CStr) -> Result<(), NotInitialized> {
        self.tx_array(id, s.to_bytes_with_nul())
    }

    /// Like [`Uarts::tx_array`] but never blocks.
    ///
    /// Stops at the first byte the peripheral cannot take and returns how
    /// many bytes were accepted.
    pub fn tx_array_non_blocking(&mut self, id: UartId, bytes: &[u8]) -> Result<usize, NotInitialized> {
        self.check(id)?;
        Ok(bytes
            .iter()
            .take_while(|&&byte| self.try_put(id, byte))
            .count())
    }

    /// Transmits one byte, blocking while the transmit path is full.
    pub fn char_put(&mut self, id: UartId, byte: u8) -> Result<(), NotInitialized> {
        self.check(id)?;
        self.put(id, byte);
        Ok(())
    }

    /// Transmits one byte if there is room. Returns whether it was accepted.
    pub fn char_put_non_blocking(&mut self, id: UartId, byte: u8) -> Result<bool, NotInitialized> {
        self.check(id)?;
        Ok(self.try_put(id, byte))
    }

    /* ----- Receive -------------------------------------------------------- */

    /// Whether at least one received byte is waiting.
    pub fn chars_available(&mut self, id: UartId) -> Result<bool, NotInitialized> {
        self.check(id)?;
        Ok(!self.flag(id, uart::fr::RXFE))
    }

    /// Receives one byte, blocking until one arrives.
    pub fn char_get(&mut self, id: UartId) -> Result<u8, NotInitialized> {
        self.check(id)?;
        while self.flag(id, uart::fr::RXFE) {}
        Ok(self.take(id))
    }

    /// Receives one byte if one is waiting.
    pub fn char_get_non_blocking(&mut self, id: UartId) -> Result<Option<u8>, NotInitialized> {
        self.check(id)?;
        if self.flag(id, uart::fr::RXFE) {
            Ok(None)
        } else {
            Ok(Some(self.take(id)))
        }
    }

    /// A [`core::fmt::Write`] adapter transmitting on `id`.
    pub fn writer(&mut self, id: UartId, mode: NewlineMode) -> Result<Writer<'_, B>, NotInitialized> {
        self.check(id)?;
        Ok(Writer::new(self, id, mode))
    }

    /* ----- Readback ------------------------------------------------------- */

    /// Whether the peripheral's enable bit is set.
    pub fn is_enabled(&mut self, id: UartId) -> Result<bool, NotInitialized> {
        Ok(self.read(id, uart::CTL)? & uart::ctl::UARTEN != 0)
    }

    /// Whether the FIFO is enabled.
    pub fn is_fifo_enabled(&mut self, id: UartId) -> Result<bool, NotInitialized> {
        Ok(self.read(id, uart::LCRH)? & uart::lcrh::FEN != 0)
    }

    /// The programmed `(receive, transmit)` watermarks. `None` for a reserved
    /// encoding.
    pub fn watermarks(
        &mut self,
        id: UartId,
    ) -> Result<(Option<WatermarkLevel>, Option<WatermarkLevel>), NotInitialized> {
        let ifls = self.read(id, uart::IFLS)?;
        let field = |shift: u32| WatermarkLevel::from_bits((ifls >> shift) & uart::ifls::FIELD_MASK);
        Ok((field(uart::ifls::RX_SHIFT), field(uart::ifls::TX_SHIFT)))
    }

    /// The baud rate the programmed divisor produces.
    pub fn baud_rate(&mut self, id: UartId) -> Result<u32, NotInitialized> {
        let divisor = Divisor {
            integer: self.read(id, uart::IBRD)?,
            fraction: self.read(id, uart::FBRD)?,
            high_speed: self.read(id, uart::CTL)? & uart::ctl::HSE != 0,
        };
        Ok(divisor.baud_rate(self.clocks.sysclk_hz()))
    }

    /// The enabled interrupt sources.
    pub fn interrupt_mask(&mut self, id: UartId) -> Result<InterruptMask, NotInitialized> {
        Ok(InterruptMask::from_bits_retain(self.read(id, uart::IM)?))
    }

    /* ----- Internals ------------------------------------------------------ */

    #[inline]
    fn check(&self, id: UartId) -> Result<(), NotInitialized> {
        if self.is_initialized(id) {
            Ok(())
        } else {
            Err(NotInitialized(id))
        }
    }

    fn read(&mut self, id: UartId, offset: usize) -> Result<u32, NotInitialized> {
        self.check(id)?;
        // SAFETY: `id` is live and `offset` comes from the register map.
        Ok(unsafe { self.bus.read(id.base() + offset) })
    }

    /// Tests a flag register bit. `id` must be live.
    #[inline]
    fn flag(&mut self, id: UartId, bit: u32) -> bool {
        // SAFETY: Callers checked that `id` is live.
        unsafe { self.bus.read(id.base() + uart::FR) & bit != 0 }
    }

    /// `id` must be live.
    fn put(&mut self, id: UartId, byte: u8) {
        while self.flag(id, uart::fr::TXFF) {}
        // SAFETY: Callers checked that `id` is live.
        unsafe { self.bus.write(id.base() + uart::DR, u32::from(byte)) };
    }

    /// `id` must be live.
    fn try_put(&mut self, id: UartId, byte: u8) -> bool {
        if self.flag(id, uart::fr::TXFF) {
            return false;
        }
        // SAFETY: Callers checked that `id` is live.
        unsafe { self.bus.write(id.base() + uart::DR, u32::from(byte)) };
        true
    }

    /// `id` must be live and have a byte waiting.
    fn take(&mut self, id: UartId) -> u8 {
        // SAFETY: Callers checked that `id` is live. The upper bits carry
        // error flags, which are not reported.
        (unsafe { self.bus.read(id.base() + uart::DR) } & 0xFF) as u8
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{Access, SimBus};
    use core::sync::atomic::{AtomicUsize, Ordering};

    const CLK: Clocks = Clocks::from_hz(16_000_000);

    fn uarts() -> Uarts<SimBus> {
        Uarts::new(SimBus::new(), CLK)
    }

    fn live(id: UartId, baud: u32) -> Uarts<SimBus> {
        let mut u = uarts();
        u.init(id, baud).unwrap();
        u
    }

    #[test]
    fn init_leaves_peripheral_live_without_fifo() {
        for id in UartId::ALL {
            let mut u = live(id, baud::DEFAULT);
            assert!(u.is_enabled(id).unwrap(), "{id:?}");
            assert!(!u.is_fifo_enabled(id).unwrap(), "{id:?}");
            assert!(u.interrupt_mask(id).unwrap().is_empty(), "{id:?}");

            let bus = u.free();
            let ctl = bus.uart_reg(id, uart::CTL);
            assert_ne!(ctl & uart::ctl::TXE, 0);
            assert_ne!(ctl & uart::ctl::RXE, 0);
            assert_eq!(bus.uart_reg(id, uart::LCRH), uart::lcrh::WLEN_8);
            assert!(bus.unmasked.is_empty());
        }
    }

    #[test]
    fn baud_reads_back_within_one_percent() {
        for id in UartId::ALL {
            for b in [9600, 19200, 38400, 57600, 115200] {
                let mut u = live(id, b);
                let actual = u.baud_rate(id).unwrap();
                assert!(actual.abs_diff(b) * 100 <= b, "{id:?} {b} -> {actual}");
            }
        }
    }

    #[test]
    fn init_programs_pins() {
        for id in UartId::ALL {
            let bus = live(id, baud::DEFAULT).free();
            let p = pinout_of(id);
            let port = p.port().base();
            let pins = p.pin_mask();

            assert_eq!(bus.reg(sysctl::BASE + sysctl::RCGCUART), p.uart_gate);
            assert_eq!(bus.reg(sysctl::BASE + sysctl::RCGCGPIO), p.gpio_gate);
            assert_eq!(bus.reg(port + gpio::AFSEL), pins);
            assert_eq!(bus.reg(port + gpio::DEN), pins);
            assert_eq!(bus.reg(port + gpio::AMSEL), 0);
            assert_eq!(bus.reg(port + gpio::DR2R), pins);

            let pctl = bus.reg(port + gpio::PCTL);
            for pin in [p.rx, p.tx] {
                assert_eq!((pctl >> (4 * pin.number)) & 0xF, 1, "{id:?} {pin:?}");
            }
        }
    }

    #[test]
    fn init_resets_pad_drive_left_by_earlier_software() {
        let id = UartId::Uart5;
        let port = Port::E.base();
        let mut bus = SimBus::new();
        // PE4/PE5 at 8 mA with slew control, plus an unrelated pin.
        bus.set_reg(port + gpio::DR8R, 0b0011_0100);
        bus.set_reg(port + gpio::DR4R, 0b0011_0000);
        bus.set_reg(port + gpio::SLR, 0b0011_0000);

        let mut u = Uarts::new(bus, CLK);
        u.init(id, baud::DEFAULT).unwrap();
        let bus = u.free();

        assert_eq!(bus.reg(port + gpio::DR2R), 0b0011_0000);
        assert_eq!(bus.reg(port + gpio::DR4R), 0);
        assert_eq!(bus.reg(port + gpio::DR8R), 0b0000_0100);
        assert_eq!(bus.reg(port + gpio::SLR), 0);
    }

    #[test]
    fn frame_format_line_control() {
        assert_eq!(FRAME.lcrh(), uart::lcrh::WLEN_8);

        let seven_e2 = FrameFormat {
            data_bits: 7,
            stop_bits: 2,
            parity: true,
        };
        assert_eq!(
            seven_e2.lcrh(),
            (2 << uart::lcrh::WLEN_SHIFT) | uart::lcrh::STP2 | uart::lcrh::PEN
        );

        let clamped = FrameFormat {
            data_bits: 3,
            stop_bits: 1,
            parity: false,
        };
        assert_eq!(clamped.lcrh(), 0);
    }

    #[test]
    fn init_step_order() {
        let id = UartId::Uart1;
        let bus = live(id, baud::DEFAULT).free();
        let p = pinout_of(id);
        let port = p.port().base();
        let ubase = id.base();

        let uart_gate = bus.first_write_to(sysctl::BASE + sysctl::RCGCUART).unwrap();
        let gpio_gate = bus.first_write_to(sysctl::BASE + sysctl::RCGCGPIO).unwrap();
        let pctl = bus.first_write_to(port + gpio::PCTL).unwrap();
        let afsel = bus.first_write_to(port + gpio::AFSEL).unwrap();
        let den = bus.first_write_to(port + gpio::DEN).unwrap();
        let ibrd = bus.first_write_to(ubase + uart::IBRD).unwrap();
        let fbrd = bus.first_write_to(ubase + uart::FBRD).unwrap();
        let lcrh = bus
            .writes
            .iter()
            .position(|&w| w == (ubase + uart::LCRH, FRAME.lcrh()))
            .unwrap();
        let enable = bus.last_write_to(ubase + uart::CTL).unwrap();
        let fifo_off = bus.last_write_to(ubase + uart::LCRH).unwrap();

        assert_eq!(uart_gate, 0, "UART gate must be the very first access");
        assert!(uart_gate < gpio_gate);
        assert!(gpio_gate < pctl);
        assert!(pctl < afsel && afsel < den);
        assert!(den < ibrd && ibrd < fbrd);
        let fifo_dropped = bus.first_write_to(ubase + uart::LCRH).unwrap();
        assert!(fifo_dropped < ibrd, "FIFO must be off while the divisor changes");
        assert_eq!(bus.writes[fifo_dropped].1 & uart::lcrh::FEN, 0);
        assert!(fbrd < lcrh);
        assert!(lcrh < enable);
        assert!(enable < fifo_off);
        assert_eq!(bus.writes[fifo_off].1 & uart::lcrh::FEN, 0);
    }

    #[test]
    fn init_unlocks_commit_guarded_pin() {
        let id = UartId::Uart2;
        let bus = live(id, baud::DEFAULT).free();
        let port = Port::D.base();

        let unlock = bus.first_write_to(port + gpio::LOCK).unwrap();
        let afsel = bus.first_write_to(port + gpio::AFSEL).unwrap();
        assert_eq!(bus.writes[unlock].1, gpio::LOCK_KEY);
        assert!(unlock < afsel);
        assert_eq!(bus.reg(port + gpio::CR) & (1 << 7), 1 << 7);
        // Relocked afterwards.
        assert_eq!(bus.reg(port + gpio::LOCK), 0);

        let other = live(UartId::Uart6, baud::DEFAULT).free();
        assert_eq!(other.first_write_to(port + gpio::LOCK), None);
    }

    #[test]
    fn high_speed_rates_set_hse() {
        let mut u = live(UartId::Uart3, 2_000_000);
        assert_eq!(u.baud_rate(UartId::Uart3).unwrap(), 2_000_000);
        let bus = u.free();
        assert_ne!(bus.uart_reg(UartId::Uart3, uart::CTL) & uart::ctl::HSE, 0);
    }

    #[test]
    fn failed_init_touches_nothing() {
        let mut u = uarts();
        assert_eq!(
            u.init(UartId::Uart1, 3_000_000),
            Err(InitError::BaudUnrepresentable {
                baud: 3_000_000,
                sysclk_hz: 16_000_000
            })
        );
        assert_eq!(
            u.init(UartId::Uart1, 0),
            Err(InitError::BaudUnrepresentable {
                baud: 0,
                sysclk_hz: 16_000_000
            })
        );
        assert!(!u.is_initialized(UartId::Uart1));
        assert!(u.free().writes.is_empty());
    }

    #[test]
    fn second_init_is_rejected() {
        let mut u = live(UartId::Uart1, baud::DEFAULT);
        let before = u.bus.writes.len();
        assert_eq!(
            u.init(UartId::Uart1, baud::BAUD_9600),
            Err(InitError::AlreadyInitialized(UartId::Uart1))
        );
        assert_eq!(u.bus.writes.len(), before);
        assert_eq!(u.baud_rate(UartId::Uart1).unwrap(), 115_107);
    }

    #[test]
    fn instances_are_independent() {
        let mut u = live(UartId::Uart0, baud::DEFAULT);
        u.init(UartId::Uart5, baud::BAUD_9600).unwrap();
        u.fifo_enable(UartId::Uart5, 7).unwrap();

        assert!(!u.is_fifo_enabled(UartId::Uart0).unwrap());
        assert!(u.is_fifo_enabled(UartId::Uart5).unwrap());
        assert!(u.baud_rate(UartId::Uart0).unwrap() > 115_000);
        assert!(u.baud_rate(UartId::Uart5).unwrap() < 9_700);
        assert!(!u.is_initialized(UartId::Uart3));
    }

    #[test]
    fn fifo_watermarks_follow_quantization() {
        let id = UartId::Uart1;
        let mut u = live(id, baud::DEFAULT);
        for depth in 0..=10u8 {
            let level = u.fifo_enable(id, depth).unwrap();
            assert_eq!(level, WatermarkLevel::from_depth(depth));
            assert_eq!(u.watermarks(id).unwrap(), (Some(level), Some(level)));
            assert!(u.is_fifo_enabled(id).unwrap());
        }
    }

    #[test]
    fn fifo_enable_depth_3_gives_half() {
        let id = UartId::Uart1;
        let mut u = live(id, baud::DEFAULT);
        assert_eq!(u.fifo_enable(id, 3), Ok(WatermarkLevel::FourEighths));
        assert!(u.is_fifo_enabled(id).unwrap());
        let half = Some(WatermarkLevel::FourEighths);
        assert_eq!(u.watermarks(id).unwrap(), (half, half));
    }

    #[test]
    fn fifo_enable_clamps_large_depths() {
        let id = UartId::Uart1;
        let mut u = live(id, baud::DEFAULT);
        let top = Some(WatermarkLevel::SevenEighths);
        u.fifo_enable(id, 7).unwrap();
        assert_eq!(u.watermarks(id).unwrap(), (top, top));
        u.fifo_enable(id, 100).unwrap();
        assert_eq!(u.watermarks(id).unwrap(), (top, top));
    }

    #[test]
    fn fifo_disable_returns_to_single_byte_mode() {
        let id = UartId::Uart4;
        let mut u = live(id, baud::DEFAULT);
        u.fifo_enable(id, 4).unwrap();
        u.fifo_disable(id).unwrap();
        assert!(!u.is_fifo_enabled(id).unwrap());
        assert!(u.is_enabled(id).unwrap());
    }

    #[test]
    fn uninitialized_calls_are_rejected_without_effect() {
        static NEVER: AtomicUsize = AtomicUsize::new(0);
        fn never() {
            NEVER.fetch_add(1, Ordering::Relaxed);
        }

        let id = UartId::Uart2;
        let mut u = uarts();
        let err = Err(NotInitialized(id));

        assert_eq!(u.fifo_enable(id, 4), Err(NotInitialized(id)));
        assert_eq!(u.install_isr(id, InterruptMask::RX_READY, never), err);
        assert_eq!(u.tx_array(id, b"x"), err);
        assert_eq!(u.tx_cstring(id, c"x"), err);
        assert_eq!(u.char_put(id, 0), err);
        assert_eq!(u.char_get(id), Err(NotInitialized(id)));
        assert_eq!(u.chars_available(id), Err(NotInitialized(id)));
        assert_eq!(u.is_enabled(id), Err(NotInitialized(id)));
        assert!(u.writer(id, NewlineMode::Binary).is_err());

        assert!(isr::handler(id).is_none());
        let bus = u.free();
        assert!(bus.writes.is_empty());
        assert!(bus.unmasked.is_empty());
    }

    static RX_HITS: AtomicUsize = AtomicUsize::new(0);

    fn count_rx() {
        RX_HITS.fetch_add(1, Ordering::Relaxed);
    }

    #[test]
    fn install_isr_arms_and_dispatches() {
        let id = UartId::Uart1;
        let mut u = live(id, baud::DEFAULT);
        u.install_isr(id, InterruptMask::RX_READY, count_rx).unwrap();

        assert_eq!(u.interrupt_mask(id).unwrap(), InterruptMask::RX_READY);
        assert_eq!(u.bus.unmasked, [id.irq()]);
        assert!(isr::on_interrupt(6));
        assert_eq!(RX_HITS.load(Ordering::Relaxed), 1);

        u.disable_interrupts(id, InterruptMask::RX_READY).unwrap();
        assert!(u.interrupt_mask(id).unwrap().is_empty());
        assert!(isr::handler(id).is_some());
    }

    static UART4_HITS: AtomicUsize = AtomicUsize::new(0);

    fn count_uart4() {
        UART4_HITS.fetch_add(1, Ordering::Relaxed);
    }

    #[test]
    fn install_isr_enables_before_handler_and_unmasks_last() {
        let id = UartId::Uart4;
        let mut u = live(id, baud::DEFAULT);
        let start = u.bus.log.len();
        u.install_isr(id, InterruptMask::RX_READY, count_uart4).unwrap();
        let log = &u.bus.log[start..];

        let im = id.base() + uart::IM;
        let enable = log
            .iter()
            .position(|a| matches!(a, Access::Write { addr, .. } if *addr == im))
            .unwrap();
        assert_eq!(
            log[enable],
            Access::Write {
                addr: im,
                value: InterruptMask::RX_READY.bits(),
                handler: false,
            }
        );
        assert_eq!(
            log.last(),
            Some(&Access::Unmask {
                irq: id.irq(),
                handler: true,
            })
        );
        assert_eq!(
            log.iter()
                .filter(|a| matches!(a, Access::Unmask { .. }))
                .count(),
            1
        );
    }

    static UART5_HITS: AtomicUsize = AtomicUsize::new(0);

    fn count_uart5() {
        UART5_HITS.fetch_add(1, Ordering::Relaxed);
    }

    #[test]
    fn receive_handler_runs_once_per_byte_without_fifo() {
        let id = UartId::Uart5;
        let mut u = live(id, baud::DEFAULT);
        u.install_isr(id, InterruptMask::RX_READY, count_uart5).unwrap();

        // Timeouts are not armed and must not reach the handler.
        u.bus.raise(id, InterruptMask::RX_TIMEOUT.bits());
        assert!(u.interrupt_status(id, true).unwrap().is_empty());

        for byte in *b"hello" {
            u.bus.receive(id, &[byte]);
            u.bus.raise(id, InterruptMask::RX_READY.bits());
            if !u.interrupt_status(id, true).unwrap().is_empty() {
                assert!(isr::on_interrupt(61));
            }
            assert_eq!(u.char_get_non_blocking(id), Ok(Some(byte)));
            assert!(u.interrupt_status(id, false).unwrap().contains(InterruptMask::RX_TIMEOUT));
            assert!(!u.interrupt_status(id, false).unwrap().contains(InterruptMask::RX_READY));
        }

        assert_eq!(UART5_HITS.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn interrupt_status_and_clear() {
        let id = UartId::Uart3;
        let mut u = live(id, baud::DEFAULT);
        u.install_isr(id, InterruptMask::RX_READY | InterruptMask::TX_READY, || {})
            .unwrap();
        u.bus.raise(id, (InterruptMask::RX_READY | InterruptMask::RX_TIMEOUT).bits());

        assert_eq!(
            u.interrupt_status(id, true).unwrap(),
            InterruptMask::RX_READY
        );
        assert_eq!(
            u.interrupt_status(id, false).unwrap(),
            InterruptMask::RX_READY | InterruptMask::RX_TIMEOUT
        );
        u.interrupt_clear(id, InterruptMask::RX_READY).unwrap();
        assert_eq!(
            u.interrupt_status(id, false).unwrap(),
            InterruptMask::RX_TIMEOUT
        );
    }

    #[test]
    fn tx_array_puts_each_byte_in_order() {
        let id = UartId::Uart1;
        let mut u = live(id, baud::DEFAULT);
        let start = u.bus.writes.len();

        u.tx_array(id, &[0x00, 0x00, 0x00]).unwrap();
        u.tx_array(id, b"abc").unwrap();

        let bus = u.free();
        assert_eq!(bus.transmitted(id), [0, 0, 0, b'a', b'b', b'c']);
        let dr_writes = bus.writes[start..]
            .iter()
            .filter(|&&(a, _)| a == id.base() + uart::DR)
            .count();
        assert_eq!(dr_writes, 6);
    }

    #[test]
    fn tx_cstring_includes_terminator() {
        let id = UartId::Uart1;
        let mut u = live(id, baud::DEFAULT);
        u.tx_cstring(id, c"Hi").unwrap();
        assert_eq!(u.bus.transmitted(id), [0x48, 0x69, 0x00]);
    }

    #[test]
    fn tx_cstring_stops_at_first_nul() {
        let id = UartId::Uart1;
        let mut u = live(id, baud::DEFAULT);
        let s = CStr::from_bytes_until_nul(b"ab\0cd\0").unwrap();
        u.tx_cstring(id, s).unwrap();
        assert_eq!(u.bus.transmitted(id), b"ab\0");
    }

    #[test]
    fn tx_cstring_of_empty_string_sends_one_nul() {
        let id = UartId::Uart7;
        let mut u = live(id, baud::DEFAULT);
        u.tx_cstring(id, c"").unwrap();
        assert_eq!(u.bus.transmitted(id), [0x00]);
    }

    #[test]
    fn non_blocking_tx_reports_accepted_count() {
        let id = UartId::Uart0;
        let mut u = live(id, baud::DEFAULT);
        u.bus.tx_room = Some(2);

        assert_eq!(u.tx_array_non_blocking(id, b"hello"), Ok(2));
        assert_eq!(u.char_put_non_blocking(id, b'!'), Ok(false));
        assert_eq!(u.bus.transmitted(id), b"he");

        u.bus.tx_room = Some(8);
        assert_eq!(u.tx_array_non_blocking(id, b"llo"), Ok(3));
        assert_eq!(u.bus.transmitted(id), b"hello");
    }

    #[test]
    fn polled_echo_round_trips_every_byte() {
        let id = UartId::Uart1;
        let mut u = live(id, baud::DEFAULT);
        let input: std::vec::Vec<u8> = (0..=u8::MAX).collect();
        u.bus.receive(id, &input);

        while u.chars_available(id).unwrap() {
            let byte = u.char_get(id).unwrap();
            u.char_put(id, byte).unwrap();
        }

        assert_eq!(u.char_get_non_blocking(id), Ok(None));
        assert_eq!(u.bus.transmitted(id), input.as_slice());
    }
}

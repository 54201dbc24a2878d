//! Simulated register bus for host tests.
//!
//! Plain registers behave like memory. The UART data, flag, and interrupt
//! status registers are modelled closely enough for the driver: data writes
//! land in a per-UART transmit log, data reads pop a per-UART receive queue.

use crate::backend::Bus;
use crate::id::UartId;
use crate::isr;
use crate::regs::uart;
use std::collections::{BTreeMap, VecDeque};
use std::vec::Vec;

/// One bus access, with whether the UART it targets had a handler registered
/// at that moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Write { addr: usize, value: u32, handler: bool },
    Unmask { irq: u16, handler: bool },
}

#[derive(Debug, Default)]
pub(crate) struct SimBus {
    regs: BTreeMap<usize, u32>,
    /// Every register write, in order (data register writes included).
    pub writes: Vec<(usize, u32)>,
    /// Bytes written to each UART's data register.
    tx: BTreeMap<usize, Vec<u8>>,
    rx: BTreeMap<usize, VecDeque<u8>>,
    /// Data register writes accepted before the transmit FIFO reports full.
    /// `None` never fills up.
    pub tx_room: Option<usize>,
    /// NVIC lines unmasked, in order.
    pub unmasked: Vec<u16>,
    /// Writes and unmasks, interleaved in order.
    pub log: Vec<Access>,
}

const RX_READY: u32 = 1 << 4;

fn has_handler(id: Option<UartId>) -> bool {
    id.and_then(isr::handler).is_some()
}

fn uart_of(base: usize) -> Option<UartId> {
    u8::try_from((base - uart::UART0_BASE) / uart::STRIDE)
        .ok()
        .and_then(|n| UartId::try_from(n).ok())
}

fn split(addr: usize) -> Option<(usize, usize)> {
    let end = uart::UART0_BASE + 8 * uart::STRIDE;
    if (uart::UART0_BASE..end).contains(&addr) {
        let offset = (addr - uart::UART0_BASE) % uart::STRIDE;
        Some((addr - offset, offset))
    } else {
        None
    }
}

impl SimBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a plain register.
    pub fn reg(&self, addr: usize) -> u32 {
        self.regs.get(&addr).copied().unwrap_or(0)
    }

    pub fn uart_reg(&self, id: UartId, offset: usize) -> u32 {
        self.reg(id.base() + offset)
    }

    /// Bytes transmitted on `id` so far.
    pub fn transmitted(&self, id: UartId) -> &[u8] {
        self.tx.get(&id.base()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Queues bytes as if they had arrived on `id`'s receive line.
    pub fn receive(&mut self, id: UartId, bytes: &[u8]) {
        self.rx.entry(id.base()).or_default().extend(bytes);
    }

    /// Presets a plain register, as if left behind by earlier software.
    pub fn set_reg(&mut self, addr: usize, value: u32) {
        self.regs.insert(addr, value);
    }

    /// Sets raw interrupt status bits on `id`.
    pub fn raise(&mut self, id: UartId, bits: u32) {
        *self.regs.entry(id.base() + uart::RIS).or_default() |= bits;
    }

    /// Position of the first write to `addr` in [`SimBus::writes`].
    pub fn first_write_to(&self, addr: usize) -> Option<usize> {
        self.writes.iter().position(|&(a, _)| a == addr)
    }

    /// Position of the last write to `addr` in [`SimBus::writes`].
    pub fn last_write_to(&self, addr: usize) -> Option<usize> {
        self.writes.iter().rposition(|&(a, _)| a == addr)
    }
}

impl Bus for SimBus {
    unsafe fn read(&mut self, addr: usize) -> u32 {
        match split(addr) {
            Some((base, uart::DR)) => {
                let rx = self.rx.entry(base).or_default();
                let byte = rx.pop_front().map_or(0, u32::from);
                if rx.is_empty() {
                    // Draining the receive path drops its ready flag.
                    *self.regs.entry(base + uart::RIS).or_default() &= !RX_READY;
                }
                byte
            }
            Some((base, uart::FR)) => {
                let mut fr = 0;
                if self.rx.get(&base).is_none_or(VecDeque::is_empty) {
                    fr |= uart::fr::RXFE;
                }
                if self.tx_room == Some(0) {
                    fr |= uart::fr::TXFF;
                } else {
                    fr |= uart::fr::TXFE;
                }
                fr
            }
            Some((base, uart::MIS)) => self.reg(base + uart::RIS) & self.reg(base + uart::IM),
            _ => self.reg(addr),
        }
    }

    unsafe fn write(&mut self, addr: usize, value: u32) {
        self.writes.push((addr, value));
        let handler = has_handler(split(addr).and_then(|(base, _)| uart_of(base)));
        self.log.push(Access::Write {
            addr,
            value,
            handler,
        });
        match split(addr) {
            Some((base, uart::DR)) => {
                if let Some(room) = self.tx_room.as_mut() {
                    assert!(*room > 0, "write to a full transmit FIFO");
                    *room -= 1;
                }
                self.tx.entry(base).or_default().push(value as u8);
            }
            Some((base, uart::ICR)) => {
                *self.regs.entry(base + uart::RIS).or_default() &= !value;
            }
            _ => {
                self.regs.insert(addr, value);
            }
        }
    }

    unsafe fn unmask(&mut self, irq: u16) {
        self.unmasked.push(irq);
        self.log.push(Access::Unmask {
            irq,
            handler: has_handler(UartId::from_irq(irq)),
        });
    }
}

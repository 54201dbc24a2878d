//! defmt logger writing encoded frames to semihosting stdout.
//!
//! The test runner captures QEMU's stdout and decodes the frames against the
//! example's ELF.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering, compiler_fence};
use cortex_m_semihosting::hio::{self, HostStream};
use critical_section::RestoreState;
use defmt::Encoder;

#[defmt::global_logger]
struct Logger;

struct LoggerState {
    stdout: UnsafeCell<Option<HostStream>>,
    cs_state: UnsafeCell<RestoreState>,
    encoder: UnsafeCell<Encoder>,
    /// 0 = idle, 1 = logging, 2+ = reentrant call (dropped).
    depth: AtomicUsize,
}

// SAFETY: `stdout`, `cs_state` and `encoder` are only touched while the
// critical section taken in `acquire` is held.
unsafe impl Sync for LoggerState {}

static STATE: LoggerState = LoggerState {
    stdout: UnsafeCell::new(None),
    cs_state: UnsafeCell::new(RestoreState::invalid()),
    encoder: UnsafeCell::new(Encoder::new()),
    depth: AtomicUsize::new(0),
};

/// # Safety
///
/// Must be called from within a critical section.
unsafe fn write_stdout(bytes: &[u8]) {
    // SAFETY: Caller guarantees we're in a critical section.
    let handle = unsafe { &mut *STATE.stdout.get() };

    // Opened once: reopening truncates the capture.
    if handle.is_none() {
        *handle = hio::hstdout().ok();
    }

    if let Some(stdout) = handle {
        let _ = stdout.write_all(bytes);
    }
}

// SAFETY: `acquire` enters a critical section that `release` leaves, and all
// shared state is accessed in between. Reentrant calls are dropped.
unsafe impl defmt::Logger for Logger {
    fn acquire() {
        if STATE.depth.fetch_add(1, Ordering::Acquire) > 0 {
            return;
        }

        // SAFETY: Released in `release`, defmt balances the calls.
        let restore = unsafe { critical_section::acquire() };
        compiler_fence(Ordering::SeqCst);

        // SAFETY: In the critical section.
        unsafe {
            STATE.cs_state.get().write(restore);
            (*STATE.encoder.get()).start_frame(|b| write_stdout(b));
        }
    }

    unsafe fn flush() {}

    unsafe fn release() {
        if STATE.depth.fetch_sub(1, Ordering::Release) != 1 {
            return;
        }

        // SAFETY: Still in the critical section from `acquire`.
        unsafe { (*STATE.encoder.get()).end_frame(|b| write_stdout(b)) };
        compiler_fence(Ordering::SeqCst);

        // SAFETY: Restores the state saved in `acquire`.
        unsafe { critical_section::release(STATE.cs_state.get().read()) };
    }

    unsafe fn write(bytes: &[u8]) {
        if STATE.depth.load(Ordering::Relaxed) != 1 {
            return;
        }

        // SAFETY: defmt only calls this between `acquire` and `release`.
        unsafe { (*STATE.encoder.get()).write(bytes, |b| write_stdout(b)) };
    }
}

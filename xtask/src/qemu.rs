//! QEMU runner for Cortex-M3 emulation.
//!
//! `lm3s6965evb` maps the first `-serial` to UART0 and the second to UART1.
//! UART0 is always captured to a file. UART1 is either discarded or, when
//! input is given, wired to a file chardev that feeds the input to the
//! firmware and captures what it sends back.

use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tempfile::NamedTempFile;

/// Longest a single example may run. A firmware hang fails the test instead of
/// stalling the run.
const TIMEOUT: Duration = Duration::from_secs(30);
const POLL: Duration = Duration::from_millis(20);

/// Output from running QEMU.
pub struct QemuOutput {
    /// defmt frames written to semihosting stdout.
    pub semihosting: Vec<u8>,
    /// Raw bytes transmitted on UART0.
    pub uart0: Vec<u8>,
    /// Raw bytes transmitted on UART1.
    pub uart1: Vec<u8>,
}

/// Run an ELF in QEMU, optionally feeding `uart1_input` into UART1.
pub fn run_qemu(elf_path: &Path, uart1_input: Option<&[u8]>) -> Result<QemuOutput> {
    let uart0_file = NamedTempFile::new().context("Failed to create temp file for UART0")?;
    let uart0_path = uart0_file.path();
    let uart1_file = NamedTempFile::new().context("Failed to create temp file for UART1")?;
    let uart1_path = uart1_file.path();
    let input_file = NamedTempFile::new().context("Failed to create temp file for UART1 input")?;

    let mut cmd = Command::new("qemu-system-arm");
    cmd.arg("-cpu")
        .arg("cortex-m3")
        .arg("-machine")
        .arg("lm3s6965evb")
        .arg("-nographic")
        .arg("-monitor")
        .arg("none")
        .arg("-semihosting-config")
        .arg("enable=on,target=native")
        .arg("-serial")
        .arg(format!("file:{}", uart0_path.display()));

    match uart1_input {
        Some(input) => {
            fs::write(input_file.path(), input).context("Failed to write UART1 input")?;
            cmd.arg("-chardev")
                .arg(format!(
                    "file,id=uart1,path={},input-path={}",
                    uart1_path.display(),
                    input_file.path().display()
                ))
                .arg("-serial")
                .arg("chardev:uart1");
        }
        None => {
            cmd.arg("-serial")
                .arg(format!("file:{}", uart1_path.display()));
        }
    }

    let stdout_file = NamedTempFile::new().context("Failed to create temp file for stdout")?;
    let stderr_file = NamedTempFile::new().context("Failed to create temp file for stderr")?;

    cmd.arg("-kernel").arg(elf_path);
    cmd.stdin(Stdio::null())
        .stdout(stdout_file.reopen()?)
        .stderr(stderr_file.reopen()?);

    let mut child = cmd.spawn().context("Failed to run QEMU")?;
    let deadline = Instant::now() + TIMEOUT;
    let status = loop {
        if let Some(status) = child.try_wait().context("Failed to wait for QEMU")? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            bail!("QEMU did not exit within {}s", TIMEOUT.as_secs());
        }
        thread::sleep(POLL);
    };

    if !status.success() {
        let stderr = fs::read(stderr_file.path()).unwrap_or_default();
        bail!(
            "QEMU exited with error: {:?}\n{}",
            status.code(),
            String::from_utf8_lossy(&stderr)
        );
    }

    let semihosting = fs::read(stdout_file.path()).context("Failed to read QEMU stdout")?;

    let uart0 = fs::read(uart0_path).unwrap_or_default();
    let uart1 = fs::read(uart1_path).unwrap_or_default();

    Ok(QemuOutput {
        semihosting,
        uart0,
        uart1,
    })
}

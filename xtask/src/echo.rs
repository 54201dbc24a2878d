//! Echo test runner: feed every byte value into UART1 and expect it back.

use std::path::Path;

use anyhow::Result;

use crate::defmt;
use crate::qemu::run_qemu;
use crate::runner::RunOptions;
use crate::standard::to_hex;

/// Bytes fed to the firmware: `0x00..=0xFF`, once each, in order.
pub fn echo_input() -> Vec<u8> {
    (0..=u8::MAX).collect()
}

/// Run an echo test.
pub fn run_echo(elf_path: &Path, opts: &RunOptions) -> Result<bool> {
    let input = echo_input();

    println!("Running in QEMU with {} bytes on UART1...", input.len());
    let output = run_qemu(elf_path, Some(&input))?;
    let log = defmt::decode_output(elf_path, &output.semihosting)?;

    if opts.verbose {
        print!("{log}");
        println!("--- QEMU run end ---");
    }

    if output.uart1 == input {
        println!("  PASS");
        return Ok(true);
    }

    let first_diff = output
        .uart1
        .iter()
        .zip(&input)
        .position(|(a, b)| a != b)
        .unwrap_or(output.uart1.len().min(input.len()));
    println!(
        "  FAIL: echoed {} of {} bytes, first difference at offset {first_diff}",
        output.uart1.len(),
        input.len()
    );
    println!("--- uart1 ---");
    print!("{}", to_hex(&output.uart1));
    if !opts.verbose {
        println!("--- log ---");
        print!("{log}");
    }
    Ok(false)
}

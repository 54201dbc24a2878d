//! Standard test runner: single run, compare the UART0 capture against an
//! expected file.
//!
//! Expected captures live in `testsuite/expected/<example>.uart.hex` as
//! whitespace-separated hex bytes. Examples without one pass on a clean exit
//! alone; a failed assertion exits QEMU with an error.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::build::project_root;
use crate::defmt;
use crate::qemu::run_qemu;
use crate::runner::RunOptions;

/// Formats bytes as lowercase hex, 16 per line.
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::new();
    for line in bytes.chunks(16) {
        let line: Vec<_> = line.iter().map(|b| format!("{b:02x}")).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

/// Parses the output of [`to_hex`], ignoring layout and `#` comments.
pub fn from_hex(text: &str) -> Result<Vec<u8>> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or_default())
        .flat_map(str::split_whitespace)
        .map(|b| u8::from_str_radix(b, 16).with_context(|| format!("Bad hex byte '{b}'")))
        .collect()
}

/// Run a standard test.
pub fn run_standard(example: &str, elf_path: &Path, opts: &RunOptions) -> Result<bool> {
    println!("Running in QEMU...");
    let output = run_qemu(elf_path, None)?;
    let log = defmt::decode_output(elf_path, &output.semihosting)?;

    if opts.verbose {
        print!("{log}");
        println!("--- QEMU run end ---");
        if !output.uart0.is_empty() {
            println!("--- uart0 ---");
            print!("{}", to_hex(&output.uart0));
        }
        return Ok(true);
    }

    let expected_path = project_root()?
        .join("testsuite")
        .join("expected")
        .join(format!("{example}.uart.hex"));

    if opts.bless {
        if output.uart0.is_empty() {
            println!("  Nothing on UART0, no capture written");
            return Ok(true);
        }
        let actual = to_hex(&output.uart0);
        let status = if expected_path.exists() {
            if fs::read_to_string(&expected_path)? == actual {
                "No change"
            } else {
                fs::write(&expected_path, &actual)?;
                "Updated"
            }
        } else {
            if let Some(dir) = expected_path.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(&expected_path, &actual)?;
            "Created"
        };
        println!("  {example}.uart.hex: {status}");
        Ok(true)
    } else if expected_path.exists() {
        let expected = from_hex(&fs::read_to_string(&expected_path)?)?;
        if output.uart0 == expected {
            println!("  PASS");
            Ok(true)
        } else {
            println!("  FAIL: UART0 output differs from expected");
            println!("--- expected ---");
            print!("{}", to_hex(&expected));
            println!("--- uart0 ---");
            print!("{}", to_hex(&output.uart0));
            println!("--- log ---");
            print!("{log}");
            Ok(false)
        }
    } else {
        println!("  PASS");
        Ok(true)
    }
}

//! Test runner dispatch and common types.

use std::fs;
use std::path::Path;

use anyhow::Result;

use crate::build::{build_example, example_source};
use crate::echo::run_echo;
use crate::standard::run_standard;

/// Test mode detected from file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestMode {
    /// Single run, pass on clean exit and matching UART0 capture.
    Standard,
    /// Every byte value is fed into UART1 and must come back unchanged.
    Echo,
}

/// Options for running an example.
pub struct RunOptions {
    /// Print verbose output (for `qemu` command).
    pub verbose: bool,
    /// Update expected files instead of comparing (for `test --bless`).
    pub bless: bool,
    /// Build in release mode.
    pub release: bool,
}

/// Detect test mode from file header.
///
/// Looks for `@test-mode: <mode>` in the first few lines.
fn detect_test_mode(example_path: &Path) -> TestMode {
    if let Ok(content) = fs::read_to_string(example_path) {
        for line in content.lines().take(10) {
            if let Some(mode) = line.strip_prefix("//! @test-mode:") {
                if mode.trim() == "echo" {
                    return TestMode::Echo;
                }
            }
        }
    }
    TestMode::Standard
}

/// Run an example with the given options.
///
/// Returns `Ok(true)` if the test passed, `Ok(false)` if it failed.
pub fn run_example(example: &str, opts: &RunOptions) -> Result<bool> {
    let test_mode = detect_test_mode(&example_source(example)?);

    println!("Building '{example}'...");
    let elf_path = build_example(example, opts.release)?;

    match test_mode {
        TestMode::Standard => run_standard(example, &elf_path, opts),
        TestMode::Echo => run_echo(&elf_path, opts),
    }
}

//! `squd` binary: runs the broker until a termination signal arrives.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match squd::run_broker() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let mut stderr = io::stderr().lock();
            let _ = writeln!(stderr, "squd: {error}");
            ExitCode::FAILURE
        }
    }
}

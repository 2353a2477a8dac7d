#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

use std::{io, process::ExitCode};

use tracing_subscriber::EnvFilter;

mod app;
mod reporters;

use app::{
    options::{get_command, Options},
    runtime::Config,
};

/// Exit status when the receipt is valid
const EXIT_VALID: u8 = 0;
/// Exit status when the receipt was checked and rejected
const EXIT_INVALID: u8 = 1;
/// Exit status when the receipt could not be checked at all
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    // Diagnostics go to stderr so they never mix with the report
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    // Get args from command line
    let args = get_command().get_matches();

    // Create application options
    let options = match Options::from_args(&args) {
        Ok(options) => options,
        Err(why) => {
            eprintln!("{why}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    // Create app state and start
    let app = match Config::new(options) {
        Ok(app) => app,
        Err(why) => {
            eprintln!("Unable to launch: {why}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let report = app.run();
    println!("{}", app.render(&report).trim_end());

    if report.valid {
        ExitCode::from(EXIT_VALID)
    } else {
        ExitCode::from(EXIT_INVALID)
    }
}

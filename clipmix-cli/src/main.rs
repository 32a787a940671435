//! # clipmix
//!
//! A command line soundboard: keys trigger sound clips that are mixed into
//! the live microphone feed and sent to an output device.

use log::error;

mod cli;
mod controls;
mod logging;
mod runner;

fn main() {
    logging::init();
    let args = cli::args::build_cli().get_matches();

    let result = runner::run(&args);
    let code = match result {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err.to_string().to_lowercase());
            1
        }
    };

    std::process::exit(code);
}

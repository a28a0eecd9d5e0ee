//! Provides the main entry point to the program.
use ::log::error;
use human_panic::{metadata, setup_panic};
use ocaes::cli::run_cli;
use ocaes::log::is_logger_initialised;

fn main() {
    setup_panic!(metadata!().homepage("https://github.com/ocaes/ocaes"));

    if let Err(err) = run_cli() {
        if is_logger_initialised() {
            error!("{err:?}");
        } else {
            eprintln!("Error: {err:?}");
        }

        // Terminate program, signalling an error
        std::process::exit(1);
    }
}

use std::process::ExitCode;

fn main() -> ExitCode {
    match gcode_postprocess::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // RUST_LOG can still silence the logger
            if log::log_enabled!(log::Level::Error) {
                log::error!("{:#}", e);
            } else {
                eprintln!("error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

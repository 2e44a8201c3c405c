mod platform;

use std::process::ExitCode;

fn main() -> ExitCode {
    match platform::run_app() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("digest_app: {err:#}");
            ExitCode::FAILURE
        }
    }
}

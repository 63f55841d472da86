use spd_cli::{command, execute, init_tracing, EXIT_CONFIG};
use std::process::ExitCode;

fn main() -> ExitCode {
    let matches = command().get_matches();
    init_tracing(matches.get_flag("verbose"), matches.get_flag("log-json"));

    match execute(&matches) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_CONFIG)
        }
    }
}

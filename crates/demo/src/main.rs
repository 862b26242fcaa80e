use std::process::ExitCode;

use tracing::error;

mod app;

fn main() -> ExitCode {
    let wiring = match app::bootstrap::build_app() {
        Ok(wiring) => wiring,
        Err(error) => {
            error!(error = %error, "startup_failed");
            return ExitCode::FAILURE;
        }
    };
    app::loop_runner::run(wiring)
}

use std::process::ExitCode;

fn main() -> ExitCode {
    balloonbot_cli::run()
}

use std::process::ExitCode;

fn main() -> ExitCode {
    courtside_cli::run()
}

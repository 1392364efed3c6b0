use std::process::ExitCode;

fn main() -> ExitCode {
    stratamap::cli::run()
}

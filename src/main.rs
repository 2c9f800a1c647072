use clap::Parser;
use quantifi::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}

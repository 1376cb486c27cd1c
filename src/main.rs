mod build;
mod cli;
mod config;
mod fetch;
mod logging;
mod patch;
mod process;
mod release;
mod runner;
mod usage;
mod util;

use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let invocation = cli::parse();
    let verbose = match &invocation {
        cli::Invocation::Run(cli) => cli.verbose,
        cli::Invocation::Unrecognized(_) => 0,
    };
    logging::init(verbose);
    runner::run(invocation).map(ExitCode::from)
}

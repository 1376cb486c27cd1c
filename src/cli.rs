use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Args, Parser, Subcommand};

use crate::release::RevisionSelector;

/// Top-level CLI definition. `help` is handled by [`Command::Help`] rather than clap's built-in
/// help subcommand so that per-subcommand usage and the shared fallback stay in one place.
#[derive(Parser, Debug)]
#[command(
    name = "tspatch",
    version,
    about = "Fetch, patch, build, and publish a fork of the TypeScript compiler",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Directory the TypeScript checkout lives in (defaults to the current directory).
    #[arg(short = 'C', long = "chdir", global = true)]
    pub chdir: Option<PathBuf>,
    /// Settings file (defaults to `tspatch.toml` in the root when present).
    #[arg(short = 'f', long = "file", global = true)]
    pub file: Option<PathBuf>,
    #[arg(short = 'n', long = "dry-run", global = true)]
    pub dry_run: bool,
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(flatten)]
    Operation(Operation),
    /// Show subcommand usage.
    Help {
        #[arg(value_name = "SUBCOMMAND")]
        topic: Option<String>,
        /// Tokens after the topic are accepted and ignored.
        #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
        ignored: Vec<String>,
    },
}

/// Subcommands that act on the workspace.
#[derive(Subcommand, Debug)]
pub enum Operation {
    /// Clone the remote TypeScript repository.
    Fetch(FetchArgs),
    /// Patch the cloned TypeScript repository.
    Patch(PatchArgs),
    /// Build the patched TypeScript.
    Build(BuildArgs),
    /// Publish the patched TypeScript package to NPM.
    Publish(PublishArgs),
    /// Delete the TypeScript folder.
    Clean,
}

#[derive(Args, Debug, Default, Clone)]
pub struct FetchArgs {
    /// Clone a specific branch or tag of the repository.
    #[arg(long = "branch", value_name = "BRANCH")]
    pub branch: Option<String>,
    /// Clone the latest stable release (default).
    #[arg(long = "stable")]
    pub stable: bool,
    /// Clone the latest release, stable or not.
    #[arg(long = "prerelease")]
    pub prerelease: bool,
    /// Clone the latest commit on the default branch.
    #[arg(long = "dev")]
    pub dev: bool,
}

impl FetchArgs {
    /// Collapse the flag set into a single selector. `--branch` beats `--stable`, which beats
    /// `--prerelease`, which beats `--dev`.
    pub fn selector(&self) -> RevisionSelector {
        if let Some(branch) = &self.branch {
            RevisionSelector::Branch(branch.clone())
        } else if self.stable {
            RevisionSelector::LatestStable
        } else if self.prerelease {
            RevisionSelector::LatestPrerelease
        } else if self.dev {
            RevisionSelector::LatestDev
        } else {
            RevisionSelector::default()
        }
    }
}

#[derive(Args, Debug, Default, Clone)]
pub struct PatchArgs {
    /// Set the name in package.json; necessary before publishing.
    #[arg(long = "package-name", value_name = "NAME")]
    pub package_name: Option<String>,
    /// Make the package public to avoid NPM error 402.
    #[arg(long = "package-make-public")]
    pub package_make_public: bool,
    /// Patch the maximum type instantiation depth.
    #[arg(
        long = "type-depth",
        value_name = "DEPTH",
        num_args = 0..=1,
        default_missing_value = "1000"
    )]
    pub type_depth: Option<u32>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct BuildArgs {
    /// Configure the project as a nightly; necessary for a non-release version.
    #[arg(long = "dev")]
    pub dev: bool,
}

#[derive(Args, Debug, Default, Clone)]
pub struct PublishArgs {
    /// One-time password for NPM two-factor auth.
    #[arg(long = "otp", value_name = "OTP")]
    pub otp: Option<String>,
}

/// Result of argument parsing that the dispatcher has to act on.
#[derive(Debug)]
pub enum Invocation {
    Run(Cli),
    /// The first positional token named no known subcommand.
    Unrecognized(String),
}

/// Parse the process arguments, exiting through clap for flag errors, `--help` and `--version`.
pub fn parse() -> Invocation {
    match parse_from(std::env::args_os()) {
        Ok(invocation) => invocation,
        Err(err) => err.exit(),
    }
}

pub fn parse_from<I, T>(args: I) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(Invocation::Run(cli)),
        Err(err) if err.kind() == ErrorKind::InvalidSubcommand => {
            let name = match err.get(ContextKind::InvalidSubcommand) {
                Some(ContextValue::String(name)) => name.clone(),
                _ => String::new(),
            };
            Ok(Invocation::Unrecognized(name))
        }
        Err(err) => Err(err),
    }
}

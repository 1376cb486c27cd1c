use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::debug;

use crate::cli::{
    BuildArgs, Cli, Command, FetchArgs, Invocation, Operation, PatchArgs, PublishArgs,
};
use crate::config::Workspace;
use crate::process::SystemRunner;
use crate::release::GithubReleases;
use crate::{build, fetch, patch, usage};

/// How the process should exit once the dispatcher returns without error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Exit {
    Success,
    /// Usage was shown because no runnable subcommand was given.
    Usage,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        match exit {
            Exit::Success => ExitCode::SUCCESS,
            Exit::Usage => ExitCode::FAILURE,
        }
    }
}

pub fn run(invocation: Invocation) -> Result<Exit> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with(invocation, &mut out)
}

/// Dispatch one invocation, writing usage text to `out`.
pub fn run_with(invocation: Invocation, out: &mut dyn Write) -> Result<Exit> {
    let cli = match invocation {
        Invocation::Run(cli) => cli,
        Invocation::Unrecognized(name) => {
            debug!("unrecognized subcommand `{}`", name);
            return show(out, &usage::full(), Exit::Usage);
        }
    };

    let Cli {
        chdir,
        file,
        dry_run,
        command,
        ..
    } = cli;

    let operation = match command {
        None => return show(out, &usage::full(), Exit::Usage),
        Some(Command::Help { topic, .. }) => {
            return show(out, &usage::help(topic.as_deref()), Exit::Success);
        }
        Some(Command::Operation(operation)) => operation,
    };

    let ctx = AppContext {
        workspace: Workspace::discover(chdir.as_deref(), file.as_deref())?,
        runner: SystemRunner::new(dry_run),
        dry_run,
    };
    debug!("workspace root: {}", ctx.workspace.root());

    match operation {
        Operation::Fetch(args) => handle_fetch(&ctx, &args),
        Operation::Patch(args) => handle_patch(&ctx, &args),
        Operation::Build(args) => handle_build(&ctx, &args),
        Operation::Publish(args) => handle_publish(&ctx, &args),
        Operation::Clean => handle_clean(&ctx),
    }?;
    Ok(Exit::Success)
}

struct AppContext {
    workspace: Workspace,
    runner: SystemRunner,
    dry_run: bool,
}

fn show(out: &mut dyn Write, text: &str, exit: Exit) -> Result<Exit> {
    out.write_all(text.as_bytes()).context("writing usage")?;
    out.flush().context("flushing usage")?;
    Ok(exit)
}

fn handle_fetch(ctx: &AppContext, args: &FetchArgs) -> Result<()> {
    let settings = ctx.workspace.settings();
    let source = GithubReleases::new(&settings.releases_api, settings.http_timeout())?;
    fetch::fetch(&ctx.workspace, &args.selector(), &source, &ctx.runner)
}

fn handle_patch(ctx: &AppContext, args: &PatchArgs) -> Result<()> {
    patch::run(&ctx.workspace, args, ctx.dry_run)
}

fn handle_build(ctx: &AppContext, args: &BuildArgs) -> Result<()> {
    build::build(&ctx.workspace, args.dev, &ctx.runner)
}

fn handle_publish(ctx: &AppContext, args: &PublishArgs) -> Result<()> {
    build::publish(&ctx.workspace, args.otp.as_deref(), &ctx.runner)
}

fn handle_clean(ctx: &AppContext) -> Result<()> {
    fetch::clean(&ctx.workspace, ctx.dry_run)
}

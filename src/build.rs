use anyhow::{Result, bail};
use tracing::info;

use crate::config::Workspace;
use crate::process::{CommandRunner, argv};

/// Steps run from inside the cloned tree, in order.
pub fn build_steps(dev: bool) -> Vec<Vec<String>> {
    let mut steps = vec![argv(["corepack", "npm", "ci"])];
    if dev {
        steps.push(argv(["corepack", "npx", "hereby", "configure-nightly"]));
    }
    steps.push(argv(["corepack", "npx", "hereby", "LKG"]));
    steps
}

pub fn publish_command(otp: Option<&str>) -> Vec<String> {
    let mut command = argv(["corepack", "npm", "publish"]);
    if let Some(otp) = otp {
        command.push("--otp".to_string());
        command.push(otp.to_string());
    }
    command
}

/// Install dependencies, optionally configure a nightly, then build the LKG compiler.
/// The first failing step stops the chain.
pub fn build(ws: &Workspace, dev: bool, runner: &dyn CommandRunner) -> Result<()> {
    let tree = ws.clone_dir();
    if !tree.is_dir() {
        bail!("{} does not exist; run `fetch` first", tree);
    }

    let steps = build_steps(dev);
    let total = steps.len();
    for (idx, step) in steps.iter().enumerate() {
        info!("[{}/{}] {}", idx + 1, total, step.join(" "));
        runner.run(&tree, step)?;
    }
    info!("Build finished in {}", tree);
    Ok(())
}

/// Publish the built package. Never retried: a second attempt could collide with a version the
/// registry already accepted.
pub fn publish(ws: &Workspace, otp: Option<&str>, runner: &dyn CommandRunner) -> Result<()> {
    let tree = ws.clone_dir();
    if !tree.is_dir() {
        bail!("{} does not exist; run `fetch` first", tree);
    }

    info!("Publishing from {}", tree);
    runner.run(&tree, &publish_command(otp))
}

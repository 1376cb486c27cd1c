use anyhow::{Context, Result};
use tracing::info;

use crate::config::{Settings, Workspace};
use crate::process::CommandRunner;
use crate::release::{self, ReleaseSource, RevisionSelector};
use crate::util;

/// Resolve the selector and shallow-clone the upstream repository into the workspace.
pub fn fetch(
    ws: &Workspace,
    selector: &RevisionSelector,
    source: &dyn ReleaseSource,
    runner: &dyn CommandRunner,
) -> Result<()> {
    let revision = release::resolve(selector, source)?;
    match &revision {
        Some(rev) => info!("Will clone TypeScript version: {}", rev),
        None => info!("Will clone the latest commit."),
    }

    let argv = clone_command(ws.settings(), revision.as_deref());
    runner.run(ws.root(), &argv)
}

/// `git clone --depth=1 [--branch <rev>] <repository> <clone_dir>`
pub fn clone_command(settings: &Settings, revision: Option<&str>) -> Vec<String> {
    let mut argv = vec![
        "git".to_string(),
        "clone".to_string(),
        "--depth=1".to_string(),
    ];
    if let Some(rev) = revision {
        argv.push("--branch".to_string());
        argv.push(rev.to_string());
    }
    argv.push(settings.repository.clone());
    argv.push(settings.clone_dir.clone());
    argv
}

/// Delete the cloned tree.
pub fn clean(ws: &Workspace, dry_run: bool) -> Result<()> {
    let target = ws.clone_dir();
    if dry_run {
        info!("[dry-run] would remove {}", target);
        return Ok(());
    }

    let removed = util::fs::remove_tree(target.as_std_path())
        .with_context(|| format!("removing {}", target))?;
    if removed {
        info!("Removed {}", target);
    } else {
        info!("Nothing to clean at {}", target);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use anyhow::bail;
    use camino::{Utf8Path, Utf8PathBuf};

    use super::*;
    use crate::process::tests::RecordingRunner;
    use crate::release::tests::StubReleases;

    fn workspace() -> (tempfile::TempDir, Workspace) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, Workspace::new(root, Settings::default()))
    }

    fn releases() -> StubReleases {
        StubReleases {
            latest: Some("v5.4.5"),
            all: vec!["v5.5.0-rc", "v5.4.5"],
            ..StubReleases::default()
        }
    }

    fn clone_args(selector: RevisionSelector) -> Vec<String> {
        let (_guard, ws) = workspace();
        let runner = RecordingRunner::default();
        fetch(&ws, &selector, &releases(), &runner).unwrap();
        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.as_path(), ws.root());
        calls[0].1.clone()
    }

    const REPO: &str = "https://github.com/microsoft/TypeScript.git";

    #[test]
    fn each_selector_maps_to_its_branch_argument() {
        assert_eq!(
            clone_args(RevisionSelector::Branch("v4.9.5".into())),
            ["git", "clone", "--depth=1", "--branch", "v4.9.5", REPO, "TypeScript"]
        );
        assert_eq!(
            clone_args(RevisionSelector::LatestStable),
            ["git", "clone", "--depth=1", "--branch", "v5.4.5", REPO, "TypeScript"]
        );
        assert_eq!(
            clone_args(RevisionSelector::LatestPrerelease),
            ["git", "clone", "--depth=1", "--branch", "v5.5.0-rc", REPO, "TypeScript"]
        );
        assert_eq!(
            clone_args(RevisionSelector::LatestDev),
            ["git", "clone", "--depth=1", REPO, "TypeScript"]
        );
    }

    #[test]
    fn resolution_failure_skips_clone() {
        let (_guard, ws) = workspace();
        let runner = RecordingRunner::default();
        let err = fetch(
            &ws,
            &RevisionSelector::LatestStable,
            &StubReleases::default(),
            &runner,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("latest stable"));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn clone_command_honours_custom_settings() {
        let settings = Settings {
            repository: "https://example.com/fork.git".into(),
            clone_dir: "ts".into(),
            ..Settings::default()
        };
        assert_eq!(
            clone_command(&settings, None),
            ["git", "clone", "--depth=1", "https://example.com/fork.git", "ts"]
        );
    }

    /// Mimics `git clone`: refuses a non-empty target, otherwise writes a fresh checkout.
    struct FakeGit;

    impl CommandRunner for FakeGit {
        fn run(&self, cwd: &Utf8Path, argv: &[String]) -> Result<()> {
            let target = cwd.join(argv.last().unwrap());
            if target.exists() && fs::read_dir(&target)?.next().is_some() {
                bail!("fatal: destination path '{}' already exists and is not an empty directory", target);
            }
            fs::create_dir_all(target.join("src"))?;
            fs::write(target.join("package.json"), "{}\n")?;
            Ok(())
        }
    }

    #[test]
    fn clean_then_fetch_leaves_no_residue() {
        let (_guard, ws) = workspace();
        let tree = ws.clone_dir();
        fs::create_dir_all(tree.join("built")).unwrap();
        fs::write(tree.join("built").join("stale.js"), "old").unwrap();

        let err = fetch(&ws, &RevisionSelector::LatestDev, &releases(), &FakeGit).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        clean(&ws, false).unwrap();
        assert!(!tree.exists());

        fetch(&ws, &RevisionSelector::LatestDev, &releases(), &FakeGit).unwrap();
        assert!(tree.join("package.json").exists());
        assert!(!tree.join("built").exists());
    }

    #[test]
    fn clean_without_tree_succeeds() {
        let (_guard, ws) = workspace();
        clean(&ws, false).unwrap();
    }

    #[test]
    fn dry_run_clean_keeps_tree() {
        let (_guard, ws) = workspace();
        fs::create_dir_all(ws.clone_dir()).unwrap();
        clean(&ws, true).unwrap();
        assert!(ws.clone_dir().exists());
    }
}

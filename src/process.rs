use std::process::Command as ProcessCommand;

use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use tracing::info;

/// Runs an external command to completion. Output goes straight to the terminal; only the exit
/// status is inspected.
pub trait CommandRunner {
    fn run(&self, cwd: &Utf8Path, argv: &[String]) -> Result<()>;
}

/// Spawns real child processes with inherited stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner {
    pub dry_run: bool,
}

impl SystemRunner {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, cwd: &Utf8Path, argv: &[String]) -> Result<()> {
        let Some((program, args)) = argv.split_first() else {
            bail!("invalid command: empty argv");
        };

        let render = format_command(argv);
        if self.dry_run {
            info!("[dry-run] ({}) {}", cwd, render);
            return Ok(());
        }

        info!("-> {}", render);
        let status = ProcessCommand::new(program)
            .args(args)
            .current_dir(cwd)
            .status()
            .with_context(|| format!("executing `{}` in {}", render, cwd))?;

        if !status.success() {
            bail!("command `{}` failed with exit code {:?}", render, status.code());
        }
        Ok(())
    }
}

pub fn format_command(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| {
            if arg.is_empty() || arg.chars().any(|c| c.is_whitespace()) {
                let escaped = arg.replace('"', "\\\"");
                format!("\"{}\"", escaped)
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build an owned argv from string literals and runtime values.
pub fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;

    use anyhow::anyhow;
    use camino::Utf8PathBuf;

    use super::*;

    /// Records every invocation; optionally fails when a command's argv contains a marker.
    #[derive(Default)]
    pub(crate) struct RecordingRunner {
        pub calls: RefCell<Vec<(Utf8PathBuf, Vec<String>)>>,
        pub fail_on: Option<&'static str>,
    }

    impl RecordingRunner {
        pub fn failing_on(marker: &'static str) -> Self {
            Self {
                fail_on: Some(marker),
                ..Self::default()
            }
        }

        pub fn commands(&self) -> Vec<String> {
            self.calls
                .borrow()
                .iter()
                .map(|(_, argv)| argv.join(" "))
                .collect()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, cwd: &Utf8Path, argv: &[String]) -> Result<()> {
            self.calls
                .borrow_mut()
                .push((cwd.to_owned(), argv.to_vec()));
            if let Some(marker) = self.fail_on
                && argv.iter().any(|arg| arg == marker)
            {
                return Err(anyhow!("`{}` exited with status 1", argv.join(" ")));
            }
            Ok(())
        }
    }

    #[test]
    fn format_command_quotes_whitespace() {
        let rendered = format_command(&argv(["npm", "publish", "--otp", "12 34", ""]));
        assert_eq!(rendered, "npm publish --otp \"12 34\" \"\"");
    }

    #[test]
    fn empty_argv_is_rejected() {
        let runner = SystemRunner::new(false);
        let err = runner.run(Utf8Path::new("."), &[]).unwrap_err();
        assert!(err.to_string().contains("empty argv"));
    }

    #[test]
    fn dry_run_does_not_spawn() {
        let runner = SystemRunner::new(true);
        runner
            .run(
                Utf8Path::new("/definitely/not/a/dir"),
                &argv(["definitely-not-a-binary", "--flag"]),
            )
            .unwrap();
    }

    #[test]
    fn missing_program_surfaces_spawn_error() {
        let runner = SystemRunner::new(false);
        let err = runner
            .run(Utf8Path::new("."), &argv(["tspatch-no-such-program-xyz"]))
            .unwrap_err();
        assert!(err.to_string().contains("executing `tspatch-no-such-program-xyz`"));
    }
}

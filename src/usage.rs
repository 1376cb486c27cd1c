//! Hand-written usage text for `help` and for the fallback shown on a missing or unknown
//! subcommand.

use std::fmt::Write as _;

const BIN: &str = "tspatch";

/// Subcommand name, one-line synopsis, and option descriptions.
struct Topic {
    name: &'static str,
    synopsis: &'static str,
    summary: &'static str,
    options: &'static [(&'static str, &'static str)],
}

const TOPICS: &[Topic] = &[
    Topic {
        name: "fetch",
        synopsis: "fetch [--stable | --prerelease | --dev | --branch=<branch>]",
        summary: "clone remote TS repository",
        options: &[
            ("--stable", "clone the latest stable release (default)"),
            (
                "--prerelease",
                "clone the latest release (regardless whether it is stable)",
            ),
            ("--dev", "clone the latest commit in the main branch"),
            (
                "--branch=<branch>",
                "clone a specific branch or tag of the repository",
            ),
        ],
    },
    Topic {
        name: "patch",
        synopsis: "patch [--type-depth | --type-depth=<depth>] [--package-name=<name>] [--package-make-public]",
        summary: "patch the cloned TS repo",
        options: &[
            (
                "--type-depth",
                "patches the maximum type instantiation depth, the default is 1000",
            ),
            (
                "--package-name",
                "set the name in package.json; necessary before publishing",
            ),
            (
                "--package-make-public",
                "make the package public to avoid NPM error 402",
            ),
        ],
    },
    Topic {
        name: "build",
        synopsis: "build [--dev]",
        summary: "build the patched TypeScript",
        options: &[(
            "--dev",
            "configure project; necessary for a non-release version",
        )],
    },
    Topic {
        name: "publish",
        synopsis: "publish [--otp=<otp>]",
        summary: "publish the patched TS package to NPM",
        options: &[(
            "--otp=<otp>",
            "the one time password for NPM, required for two-factor auth",
        )],
    },
    Topic {
        name: "clean",
        synopsis: "clean",
        summary: "delete the TypeScript folder",
        options: &[],
    },
];

const GLOBAL_OPTIONS: &[(&str, &str)] = &[
    ("-C, --chdir <dir>", "directory holding the TypeScript checkout"),
    ("-f, --file <path>", "settings file (default: tspatch.toml in the root)"),
    ("-n, --dry-run", "print commands and writes instead of performing them"),
    ("-v, --verbose", "more log output; repeat for trace"),
];

/// Usage for a single subcommand, or `None` if `name` is not one.
pub fn subcommand(name: &str) -> Option<String> {
    let topic = TOPICS.iter().find(|topic| topic.name == name)?;

    let mut out = String::new();
    let _ = writeln!(out, "Subcommand usage:");
    let _ = writeln!(out, "  {} {} – {}", BIN, topic.synopsis, topic.summary);
    let _ = writeln!(out);
    if !topic.options.is_empty() {
        let _ = writeln!(out, "Options:");
        write_options(&mut out, topic.options);
        let _ = writeln!(out);
    }
    Some(out)
}

/// Overview of every subcommand.
pub fn full() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Usage:");
    for topic in TOPICS {
        let _ = writeln!(out, "  {} {} – {}", BIN, topic.synopsis, topic.summary);
    }
    let _ = writeln!(out, "  {} help <subcommand> – show subcommand usage", BIN);
    let _ = writeln!(out);
    let _ = writeln!(out, "Global options:");
    write_options(&mut out, GLOBAL_OPTIONS);
    let _ = writeln!(out);
    out
}

/// Usage for `topic`, falling back to the overview when it is missing or unknown.
pub fn help(topic: Option<&str>) -> String {
    topic.and_then(subcommand).unwrap_or_else(full)
}

fn write_options(out: &mut String, options: &[(&str, &str)]) {
    for (flag, description) in options {
        let _ = writeln!(out, "  {} – {}", flag, description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_usage_lists_every_subcommand() {
        let text = full();
        assert!(text.starts_with("Usage:\n"));
        for name in ["fetch", "patch", "build", "publish", "clean", "help <subcommand>"] {
            assert!(
                text.contains(&format!("  tspatch {name}")),
                "missing {name} in:\n{text}"
            );
        }
    }

    #[test]
    fn every_subcommand_has_its_own_help() {
        for name in ["fetch", "patch", "build", "publish", "clean"] {
            let text = subcommand(name).unwrap();
            assert!(text.starts_with("Subcommand usage:\n"));
            assert!(text.contains(&format!("tspatch {name}")));
        }
    }

    #[test]
    fn subcommand_help_lists_options() {
        let text = subcommand("fetch").unwrap();
        assert!(text.contains("Options:\n"));
        assert!(text.contains("--prerelease – clone the latest release"));
        assert!(!subcommand("clean").unwrap().contains("Options:"));
    }

    #[test]
    fn unknown_topic_falls_back_to_full_usage() {
        assert!(subcommand("deploy").is_none());
        assert_eq!(help(Some("deploy")), full());
        assert_eq!(help(None), full());
        assert_eq!(help(Some("build")), subcommand("build").unwrap());
    }
}

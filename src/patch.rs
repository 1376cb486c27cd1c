use std::fs;

use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use regex::{NoExpand, Regex};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::cli::PatchArgs;
use crate::config::Workspace;

/// `instantiationDepth === <n>` not preceded by an ASCII word character.
const DEPTH_PATTERN: &str = r"(?-u:\b)instantiationDepth ===\s+\d+";

const DESCRIPTOR_INDENT: &[u8] = b"    ";

/// Changes requested for the package descriptor.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DescriptorPatch {
    pub name: Option<String>,
    pub make_public: bool,
}

impl DescriptorPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && !self.make_public
    }
}

impl From<&PatchArgs> for DescriptorPatch {
    fn from(args: &PatchArgs) -> Self {
        Self {
            name: args.package_name.clone(),
            make_public: args.package_make_public,
        }
    }
}

/// Apply every patch requested on the command line. The descriptor goes first, then the depth.
pub fn run(ws: &Workspace, args: &PatchArgs, dry_run: bool) -> Result<()> {
    let descriptor = DescriptorPatch::from(args);
    if descriptor.is_empty() && args.type_depth.is_none() {
        info!("Nothing to patch; pass --package-name, --package-make-public or --type-depth.");
        return Ok(());
    }

    if !descriptor.is_empty() {
        if let Some(name) = &descriptor.name {
            info!("Changing package name to: {}", name);
        }
        if descriptor.make_public {
            info!("Making package public.");
        }
        patch_descriptor(&ws.descriptor_path(), &descriptor, dry_run)?;
    }

    if let Some(depth) = args.type_depth {
        info!("Changing maximum instantiation depth to: {}", depth);
        let replaced = patch_type_depth(&ws.checker_path(), depth, dry_run)?;
        if replaced == 0 {
            warn!(
                "no `instantiationDepth ===` comparison found in {}; the checker may have changed upstream",
                ws.checker_path()
            );
        } else {
            info!("Patched {} occurrence(s)", replaced);
        }
    }

    Ok(())
}

/// Rewrite the checker source in full with every depth comparison set to `depth`.
/// Returns the number of comparisons replaced.
pub fn patch_type_depth(path: &Utf8Path, depth: u32, dry_run: bool) -> Result<usize> {
    let source = fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    let (patched, replaced) = apply_depth_patch(&source, depth)?;

    if dry_run {
        info!("[dry-run] would rewrite {}", path);
    } else {
        fs::write(path, patched).with_context(|| format!("writing {}", path))?;
    }
    Ok(replaced)
}

pub fn apply_depth_patch(source: &str, depth: u32) -> Result<(String, usize)> {
    let pattern = Regex::new(DEPTH_PATTERN).context("compiling instantiation depth pattern")?;
    let replaced = pattern.find_iter(source).count();
    let replacement = format!("instantiationDepth === {}", depth);
    let patched = pattern.replace_all(source, NoExpand(&replacement));
    Ok((patched.into_owned(), replaced))
}

/// Read, patch and rewrite the package descriptor.
pub fn patch_descriptor(path: &Utf8Path, patch: &DescriptorPatch, dry_run: bool) -> Result<()> {
    let contents = fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    let patched =
        apply_descriptor_patch(&contents, patch).with_context(|| format!("patching {}", path))?;

    if dry_run {
        info!("[dry-run] would rewrite {}", path);
        return Ok(());
    }
    fs::write(path, patched).with_context(|| format!("writing {}", path))
}

/// Apply `patch` to descriptor JSON and render it with 4-space indentation and one trailing
/// newline. Key order is preserved; keys that do not exist yet are appended.
pub fn apply_descriptor_patch(contents: &str, patch: &DescriptorPatch) -> Result<String> {
    let mut descriptor: Value =
        serde_json::from_str(contents).context("parsing package descriptor")?;
    let Some(fields) = descriptor.as_object_mut() else {
        bail!("package descriptor is not a JSON object");
    };

    if let Some(name) = &patch.name {
        fields.insert("name".to_string(), Value::String(name.clone()));
    }

    if patch.make_public {
        let publish_config = fields
            .entry("publishConfig")
            .or_insert_with(|| Value::Object(Map::new()));
        if !publish_config.is_object() {
            *publish_config = Value::Object(Map::new());
        }
        if let Value::Object(config) = publish_config {
            config.insert("access".to_string(), Value::String("public".to_string()));
        }
    }

    integral_floats_to_integers(&mut descriptor);
    render_descriptor(&descriptor)
}

/// Largest magnitude below which every whole `f64` is exactly representable as an integer.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Rewrite whole-valued floats such as `1.0` as integers so they render as `1`, the way a
/// JavaScript runtime prints them back out.
fn integral_floats_to_integers(value: &mut Value) {
    match value {
        Value::Number(number) if number.is_f64() => {
            let float = number.as_f64().unwrap_or(f64::NAN);
            if float.fract() == 0.0 && float.abs() < MAX_SAFE_INTEGER {
                *number = (float as i64).into();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(integral_floats_to_integers),
        Value::Object(fields) => fields.values_mut().for_each(integral_floats_to_integers),
        _ => {}
    }
}

fn render_descriptor(descriptor: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(DESCRIPTOR_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    descriptor
        .serialize(&mut serializer)
        .context("serializing package descriptor")?;

    let mut rendered = String::from_utf8(buf).context("package descriptor is not UTF-8")?;
    rendered.push('\n');
    Ok(rendered)
}

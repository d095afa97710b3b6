//! Reading extension definitions from disk into a [`Registry`].

use crate::registry::Registry;
use crate::schema;
use anyhow::{Context, Result};
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Admitted extensions plus one message per problem with the rejected ones.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub registry: Registry,
    pub diagnostics: Vec<String>,
}

/// Validates already-parsed definitions, admitting only the clean ones.
///
/// `source` names where each tree came from and prefixes its messages.
pub fn admit_all<I>(trees: I) -> LoadReport
where
    I: IntoIterator<Item = (String, Value)>,
{
    let mut report = LoadReport::default();
    for (source, tree) in trees {
        if !tree.is_mapping() {
            report
                .diagnostics
                .push(format!("Error in {source}: file must contain a YAML mapping"));
            continue;
        }
        match schema::admit(&tree, &source) {
            Ok(extension) => {
                tracing::debug!(name = %extension.name, %source, "extension admitted");
                report.registry.insert(extension);
            }
            Err(errors) => {
                tracing::warn!(%source, errors = errors.len(), "extension rejected");
                report.diagnostics.extend(errors);
            }
        }
    }
    report
}

/// Loads every `*.yml` / `*.yaml` file in `dir`, in file-name order.
pub fn load_dir(dir: &Path) -> Result<LoadReport> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("can't read extensions directory {}", dir.display()))?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_yaml(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut diagnostics = Vec::new();
    let mut trees = Vec::new();
    for path in paths {
        let source = path.display().to_string();
        match read_tree(&path) {
            Ok(tree) => trees.push((source, tree)),
            Err(err) => diagnostics.push(format!("Error parsing {source}: {err:#}")),
        }
    }

    let mut report = admit_all(trees);
    diagnostics.append(&mut report.diagnostics);
    report.diagnostics = diagnostics;
    Ok(report)
}

fn read_tree(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&text)?)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml" | "yaml")
    )
}

//! Hierarchical workspace tree (spec §4.6 "Hierarchical workspace tree").

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

use super::resolver::GzConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum WorkspaceType {
    Forge,
    Git,
    Config,
}

/// A named workspace entry as written under a project config's `workspaces` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSpec {
    pub path: PathBuf,
    #[serde(default)]
    pub r#type: Option<WorkspaceType>,
    #[serde(default)]
    pub profile: Option<String>,
    /// Presence alone implies `type=forge` when `type` is omitted.
    #[serde(default)]
    pub source: Option<String>,
}

/// One resolved node in the workspace tree: a workspace's own config merged
/// over its parent's, plus its children.
#[derive(Debug, Clone)]
pub struct WorkspaceNode {
    pub name: String,
    pub path: PathBuf,
    pub kind: WorkspaceType,
    pub profile: Option<String>,
    pub config: GzConfig,
    pub children: Vec<WorkspaceNode>,
}

/// Resolve `spec`'s type: explicit `type` wins; else `source` present implies
/// `forge`; else a nested project config at `spec.path` implies `config`;
/// else `git`.
fn infer_type(spec: &WorkspaceSpec, nested_config_exists: bool) -> WorkspaceType {
    if let Some(kind) = spec.r#type {
        return kind;
    }
    if spec.source.is_some() {
        WorkspaceType::Forge
    } else if nested_config_exists {
        WorkspaceType::Config
    } else {
        WorkspaceType::Git
    }
}

/// Load the nested `.gz-git.yaml` at `path`, if one exists.
fn load_nested_config(path: &Path) -> Result<Option<GzConfig>, CoreError> {
    let candidate = path.join(".gz-git.yaml");
    if !candidate.is_file() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&candidate)
        .map_err(|e| CoreError::ConfigInvalid(format!("could not read {}: {e}", candidate.display())))?;
    let config: GzConfig = serde_yaml::from_str(&raw)
        .map_err(|e| CoreError::ConfigInvalid(format!("{}: {e}", candidate.display())))?;
    Ok(Some(config))
}

/// Deep-merge `overlay`'s set fields over `base`; `overlay`'s `Some` wins.
fn merge_config(base: &GzConfig, overlay: &GzConfig) -> GzConfig {
    GzConfig {
        parallel: overlay.parallel.or(base.parallel),
        scan_root: overlay.scan_root.clone().or_else(|| base.scan_root.clone()),
        include: overlay.include.clone().or_else(|| base.include.clone()),
        exclude: overlay.exclude.clone().or_else(|| base.exclude.clone()),
        max_depth: overlay.max_depth.or(base.max_depth),
        token: overlay.token.clone().or_else(|| base.token.clone()),
        protect_patterns: overlay.protect_patterns.clone().or_else(|| base.protect_patterns.clone()),
        stale_days: overlay.stale_days.or(base.stale_days),
        workspaces: overlay.workspaces.clone().or_else(|| base.workspaces.clone()),
        extra: overlay.extra.clone(),
    }
}

/// Build the workspace tree rooted at `root_path` with `root_config` as the
/// root's already-resolved configuration. Cycle detection is by canonical
/// path; a revisit is `ConfigInvalid` (spec §4.6).
pub fn build_tree(root_path: &Path, root_config: &GzConfig) -> Result<WorkspaceNode, CoreError> {
    let mut visited = HashSet::new();
    build_node("<root>".to_string(), root_path, root_config, &mut visited)
}

fn build_node(
    name: String,
    path: &Path,
    config: &GzConfig,
    visited: &mut HashSet<PathBuf>,
) -> Result<WorkspaceNode, CoreError> {
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical.clone()) {
        return Err(CoreError::ConfigInvalid(format!(
            "workspace cycle detected at {}",
            path.display()
        )));
    }

    let mut children = Vec::new();
    if let Some(specs) = &config.workspaces {
        for (child_name, spec) in specs {
            let child_path = if spec.path.is_absolute() {
                spec.path.clone()
            } else {
                path.join(&spec.path)
            };
            let nested = load_nested_config(&child_path)?;
            let kind = infer_type(spec, nested.is_some());
            let child_own_config = nested.unwrap_or_default();
            let child_config = merge_config(config, &child_own_config);
            let child = build_node(child_name.clone(), &child_path, &child_config, visited)?;
            children.push(WorkspaceNode {
                kind,
                profile: spec.profile.clone(),
                ..child
            });
        }
    }

    Ok(WorkspaceNode {
        name,
        path: path.to_path_buf(),
        kind: WorkspaceType::Git,
        profile: None,
        config: config.clone(),
        children,
    })
}

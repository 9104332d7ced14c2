//! Clone plan compiler: parse → validate → compile (spec §4.5).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use normalize_path::NormalizePath;
use serde::Deserialize;

use crate::error::CoreError;
use crate::model::{CloneSpec, CloneStrategy, CloneStructure, GroupSpec, Hooks, PlannedClone, RawGroupSpec, RepoEntry};

/// The flat-form wire shape, deserialized directly when a top-level
/// `repositories` key is present (spec §4.5 "Parse").
#[derive(Deserialize)]
struct FlatWire {
    target: PathBuf,
    #[serde(default)]
    structure: Option<CloneStructure>,
    #[serde(default)]
    strategy: Option<CloneStrategy>,
    #[serde(default)]
    hooks: crate::model::RawHooks,
    repositories: Vec<RepoEntry>,
}

/// Reserved document-level keys in a grouped plan; every other top-level key
/// is a group name (spec §4.5 line 93: `{ parallel, strategy, structure,
/// groups: Map<GroupName, Group> }` — `groups` here is notional, the actual
/// wire form has no `groups:` wrapper, each map key directly names a group).
const RESERVED_DOC_KEYS: &[&str] = &["parallel", "strategy", "structure"];

fn is_reserved_doc_key(name: &str) -> bool {
    RESERVED_DOC_KEYS.contains(&name)
}

/// Parse a plan document, detecting flat vs grouped form by the presence of
/// a top-level `repositories` key (spec §4.5 "Parse"). Grouped documents have
/// no `repositories` key; instead one or more map-valued keys each contain
/// their own `repositories` list, and the map key itself is the group's name.
pub fn parse_clone_spec(yaml: &str) -> Result<CloneSpec, CoreError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| CoreError::ConfigInvalid(format!("malformed YAML: {e}")))?;

    if value.get("repositories").is_some() {
        let wire: FlatWire =
            serde_yaml::from_value(value).map_err(|e| CoreError::ConfigInvalid(format!("malformed clone plan: {e}")))?;
        return Ok(CloneSpec::Flat {
            target: wire.target,
            structure: wire.structure,
            strategy: wire.strategy,
            hooks: wire.hooks,
            repositories: wire.repositories,
        });
    }

    let mapping = value
        .as_mapping()
        .ok_or_else(|| CoreError::ConfigInvalid("plan is neither a flat repository list (`repositories:`) nor a grouped document".into()))?;

    let mut doc_strategy = None;
    let mut doc_structure = None;
    let mut groups = Vec::new();

    for (key, val) in mapping {
        let Some(name) = key.as_str() else {
            return Err(CoreError::ConfigInvalid("clone plan keys must be strings".into()));
        };
        if name == "strategy" {
            doc_strategy = Some(
                serde_yaml::from_value::<CloneStrategy>(val.clone())
                    .map_err(|e| CoreError::ConfigInvalid(format!("invalid top-level strategy: {e}")))?,
            );
            continue;
        }
        if name == "structure" {
            doc_structure = Some(
                serde_yaml::from_value::<CloneStructure>(val.clone())
                    .map_err(|e| CoreError::ConfigInvalid(format!("invalid top-level structure: {e}")))?,
            );
            continue;
        }
        if is_reserved_doc_key(name) {
            continue; // e.g. `parallel`: validated by the CLI/runtime layer, not the compiler
        }
        let is_group_like = val.as_mapping().map(|m| m.contains_key("repositories")).unwrap_or(false);
        if !is_group_like {
            return Err(CoreError::ConfigInvalid(format!(
                "`{name}` looks like a group but has no `repositories` list"
            )));
        }
        let raw: RawGroupSpec = serde_yaml::from_value(val.clone())
            .map_err(|e| CoreError::ConfigInvalid(format!("malformed group `{name}`: {e}")))?;
        groups.push(GroupSpec::from_raw(name.to_string(), raw));
    }

    if groups.is_empty() {
        return Err(CoreError::ConfigInvalid(
            "plan is neither a flat repository list (`repositories:`) nor a grouped document".into(),
        ));
    }

    Ok(CloneSpec::Grouped {
        strategy: doc_strategy,
        structure: doc_structure,
        groups,
    })
}

fn effective_name(entry: &RepoEntry) -> String {
    entry.name.clone().unwrap_or_else(|| {
        entry
            .url
            .trim_end_matches('/')
            .trim_end_matches(".git")
            .rsplit('/')
            .next()
            .unwrap_or(&entry.url)
            .to_string()
    })
}

/// The path segment immediately before the repository name in a clone URL
/// (owner/org for `https://host/owner/repo.git`, the same for scp-like
/// `git@host:owner/repo.git`) — backs `structure: user` (spec §4.5, §8
/// validate "structure ... is flat or user").
fn url_owner(url: &str) -> Option<String> {
    let trimmed = url.trim_end_matches('/').trim_end_matches(".git");
    let after_scheme = trimmed.rsplit_once(':').map(|(_, rest)| rest).unwrap_or(trimmed);
    let mut segments: Vec<&str> = after_scheme.split('/').filter(|s| !s.is_empty()).collect();
    segments.pop()?;
    segments.pop().map(|s| s.to_string())
}

fn effective_destination(entry: &RepoEntry, structure: CloneStructure) -> PathBuf {
    let name = effective_name(entry);
    let leaf = match structure {
        CloneStructure::Flat => PathBuf::from(name),
        CloneStructure::User => match url_owner(&entry.url) {
            Some(owner) => PathBuf::from(owner).join(name),
            None => PathBuf::from(name),
        },
    };
    match &entry.path {
        Some(path) => path.join(leaf),
        None => leaf,
    }
}

/// Validate every repo entry and group; reject duplicate effective
/// destinations within a repository list (spec §4.5 "Validate").
pub fn validate(spec: &CloneSpec) -> Result<(), CoreError> {
    let structure = match spec {
        CloneSpec::Flat { structure, .. } => structure.unwrap_or(CloneStructure::Flat),
        CloneSpec::Grouped { structure, .. } => structure.unwrap_or(CloneStructure::Flat),
    };

    let entry_lists: Vec<&[RepoEntry]> = match spec {
        CloneSpec::Flat { repositories, .. } => vec![repositories.as_slice()],
        CloneSpec::Grouped { groups, .. } => groups.iter().map(|g| g.repositories.as_slice()).collect(),
    };

    if let CloneSpec::Grouped { groups, .. } = spec {
        for group in groups {
            if group.target.as_os_str().is_empty() {
                return Err(CoreError::ConfigInvalid(format!("group `{}` has an empty target", group.name)));
            }
        }
    }

    for entries in entry_lists {
        let mut seen = HashSet::new();
        for entry in entries {
            if entry.url.trim().is_empty() {
                return Err(CoreError::ConfigInvalid("a repository entry has an empty url".into()));
            }
            let dest = effective_destination(entry, structure);
            if !seen.insert(dest.clone()) {
                return Err(CoreError::ConfigInvalid(format!(
                    "duplicate clone destination: {}",
                    dest.display()
                )));
            }
        }
    }
    Ok(())
}

/// Compile a validated [`CloneSpec`] into a flat sequence of [`PlannedClone`],
/// cascading branch/depth/strategy/hooks and resolving destinations relative
/// to `cli_dir` (spec §4.5 "Compile"). `cli_strategy` is the highest-priority
/// strategy override (a `--strategy` flag), if any.
pub fn compile_clone_plan(
    spec: &CloneSpec,
    cli_dir: &Path,
    cli_strategy: Option<CloneStrategy>,
) -> Result<Vec<PlannedClone>, CoreError> {
    validate(spec)?;

    let mut planned = Vec::new();
    match spec {
        CloneSpec::Flat {
            target,
            structure,
            strategy,
            hooks,
            repositories,
        } => {
            let structure = structure.unwrap_or(CloneStructure::Flat);
            let base = resolve_relative(cli_dir, target);
            let group_hooks = hooks.split().map_err(CoreError::ConfigInvalid)?;
            for entry in repositories {
                planned.push(compile_entry(entry, &base, structure, None, *strategy, cli_strategy, &group_hooks)?);
            }
        }
        CloneSpec::Grouped {
            strategy: doc_strategy,
            structure,
            groups,
        } => {
            let structure = structure.unwrap_or(CloneStructure::Flat);
            for group in groups {
                let base = resolve_relative(cli_dir, &group.target);
                let group_hooks = group.hooks.split().map_err(CoreError::ConfigInvalid)?;
                for entry in &group.repositories {
                    planned.push(compile_entry(
                        entry,
                        &base,
                        structure,
                        Some(group),
                        *doc_strategy,
                        cli_strategy,
                        &group_hooks,
                    )?);
                }
            }
        }
    }
    Ok(planned)
}

fn resolve_relative(base: &Path, target: &Path) -> PathBuf {
    if target.is_absolute() {
        target.normalize()
    } else {
        base.join(target).normalize()
    }
}

#[allow(clippy::too_many_arguments)]
fn compile_entry(
    entry: &RepoEntry,
    base: &Path,
    structure: CloneStructure,
    group: Option<&GroupSpec>,
    doc_strategy: Option<CloneStrategy>,
    cli_strategy: Option<CloneStrategy>,
    group_hooks: &Hooks,
) -> Result<PlannedClone, CoreError> {
    let destination = base.join(effective_destination(entry, structure));
    let strategy = cli_strategy
        .or(entry.strategy)
        .or(group.and_then(|g| g.strategy))
        .or(doc_strategy)
        .unwrap_or(CloneStrategy::Skip);
    let branch = entry.branch.clone().or_else(|| group.and_then(|g| g.branch.clone()));
    let depth = entry.depth.or_else(|| group.and_then(|g| g.depth));
    let entry_hooks = entry.hooks.split().map_err(CoreError::ConfigInvalid)?;
    let hooks = Hooks::merge(group_hooks, &entry_hooks);

    Ok(PlannedClone {
        url: entry.url.clone(),
        destination,
        branch,
        depth,
        strategy,
        hooks,
    })
}

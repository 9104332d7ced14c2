//! Clone plan types produced by [`crate::config::plan`] (spec §4.5).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Hook commands run before/after a single repository clone, already
/// argv-split (no shell interpretation; spec §4.5, §9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hooks {
    #[serde(default)]
    pub before: Vec<Vec<String>>,
    #[serde(default)]
    pub after: Vec<Vec<String>>,
}

impl Hooks {
    pub fn merge(base: &Hooks, overlay: &Hooks) -> Hooks {
        let mut before = base.before.clone();
        before.extend(overlay.before.iter().cloned());
        let mut after = base.after.clone();
        after.extend(overlay.after.iter().cloned());
        Hooks { before, after }
    }
}

/// Hook commands as written in a plan file: plain shell-like strings, one per
/// command (`"echo hi"`), not yet argv-split. [`RawHooks::split`] turns these
/// into [`Hooks`] at compile time (spec §4.5 "no shell interpretation").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawHooks {
    #[serde(default)]
    pub before: Vec<String>,
    #[serde(default)]
    pub after: Vec<String>,
}

impl RawHooks {
    pub fn split(&self) -> Result<Hooks, String> {
        let before = self
            .before
            .iter()
            .map(|cmd| shell_words::split(cmd).map_err(|e| format!("invalid hook command `{cmd}`: {e}")))
            .collect::<Result<Vec<_>, _>>()?;
        let after = self
            .after
            .iter()
            .map(|cmd| shell_words::split(cmd).map_err(|e| format!("invalid hook command `{cmd}`: {e}")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Hooks { before, after })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CloneStrategy {
    Skip,
    Pull,
    Reset,
    Rebase,
    Fetch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CloneStructure {
    Flat,
    User,
}

/// One repository entry as written in a plan file, before defaults cascade in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoEntry {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub depth: Option<u32>,
    #[serde(default)]
    pub strategy: Option<CloneStrategy>,
    #[serde(default)]
    pub hooks: RawHooks,
}

/// A single group's fields exactly as written under its map key in a grouped
/// plan document (spec §4.5: `Group = { target, branch?, depth?, strategy?,
/// repositories, hooks? }`). The group's name is the YAML map key, not a
/// field of the group itself — see [`GroupSpec`] for the name-attached form
/// [`crate::config::plan::parse_clone_spec`] builds from this plus its key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawGroupSpec {
    pub target: PathBuf,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub depth: Option<u32>,
    #[serde(default)]
    pub strategy: Option<CloneStrategy>,
    #[serde(default)]
    pub hooks: RawHooks,
    pub repositories: Vec<RepoEntry>,
}

/// A named group of repositories sharing a destination root and defaults,
/// with the name resolved from its YAML map key (spec §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    pub target: PathBuf,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub depth: Option<u32>,
    #[serde(default)]
    pub strategy: Option<CloneStrategy>,
    #[serde(default)]
    pub hooks: RawHooks,
    pub repositories: Vec<RepoEntry>,
}

impl GroupSpec {
    pub fn from_raw(name: String, raw: RawGroupSpec) -> Self {
        Self {
            name,
            target: raw.target,
            branch: raw.branch,
            depth: raw.depth,
            strategy: raw.strategy,
            hooks: raw.hooks,
            repositories: raw.repositories,
        }
    }
}

/// A parsed, not-yet-compiled clone plan document — either a flat list of
/// repositories or repositories organized into groups (spec §4.5). `strategy`
/// and `structure` are document-level and cascade into every group/entry;
/// groups carry no `structure` override of their own (spec §4.5's grammar).
#[derive(Debug, Clone)]
pub enum CloneSpec {
    Flat {
        target: PathBuf,
        structure: Option<CloneStructure>,
        strategy: Option<CloneStrategy>,
        hooks: RawHooks,
        repositories: Vec<RepoEntry>,
    },
    Grouped {
        strategy: Option<CloneStrategy>,
        structure: Option<CloneStructure>,
        groups: Vec<GroupSpec>,
    },
}

/// A single, fully-cascaded clone instruction ready for the operation runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedClone {
    pub url: String,
    pub destination: PathBuf,
    pub branch: Option<String>,
    pub depth: Option<u32>,
    pub strategy: CloneStrategy,
    pub hooks: Hooks,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hooks_merge_preserves_order_base_then_overlay() {
        let base = Hooks {
            before: vec![vec!["echo".into(), "base".into()]],
            after: vec![],
        };
        let overlay = Hooks {
            before: vec![vec!["echo".into(), "overlay".into()]],
            after: vec![],
        };
        let merged = Hooks::merge(&base, &overlay);
        assert_eq!(merged.before.len(), 2);
        assert_eq!(merged.before[0], vec!["echo", "base"]);
        assert_eq!(merged.before[1], vec!["echo", "overlay"]);
    }

    #[test]
    fn raw_hooks_split_preserves_quoted_substrings() {
        let raw = RawHooks {
            before: vec!["echo \"hello world\"".into()],
            after: vec![],
        };
        let split = raw.split().unwrap();
        assert_eq!(split.before[0], vec!["echo", "hello world"]);
    }

    #[test]
    fn raw_hooks_split_rejects_unterminated_quotes() {
        let raw = RawHooks {
            before: vec!["echo \"unterminated".into()],
            after: vec![],
        };
        assert!(raw.split().is_err());
    }

    #[test]
    fn group_spec_from_raw_attaches_the_map_key_as_its_name() {
        let raw = RawGroupSpec {
            target: PathBuf::from("work"),
            branch: None,
            depth: None,
            strategy: None,
            hooks: RawHooks::default(),
            repositories: vec![RepoEntry {
                url: "https://example.com/a.git".into(),
                name: None,
                path: None,
                branch: None,
                depth: None,
                strategy: None,
                hooks: RawHooks::default(),
            }],
        };
        let group = GroupSpec::from_raw("work".into(), raw);
        assert_eq!(group.name, "work");
        assert_eq!(group.repositories.len(), 1);
    }
}

//! Layered resolution: flags > project > profile > global > env > default
//! (spec §4.6, plus the ambient `GZ_<FIELD>` overlay documented in
//! `SPEC_FULL.md` 4.6).

use std::collections::HashMap;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::workspace::WorkspaceSpec;

/// Clone transport a bare `owner/repo` clone-plan entry resolves against
/// (spec.md:96 "clone protocol"). Plan entries that already spell out a full
/// URL ignore this; it only matters for the shorthand forms `--clone-protocol`
/// governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CloneProtocol {
    Https,
    Ssh,
}

/// One layer of configuration as read from disk or built from CLI flags.
/// Every field is optional: an absent field means "this layer has no
/// opinion", not "zero"; unknown keys round-trip via `extra` so a `set`
/// operation never drops fields this binary doesn't know about (spec §6.3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GzConfig {
    #[serde(default)]
    pub parallel: Option<usize>,
    #[serde(default)]
    pub scan_root: Option<PathBuf>,
    #[serde(default)]
    pub include: Option<String>,
    #[serde(default)]
    pub exclude: Option<String>,
    #[serde(default)]
    pub max_depth: Option<u32>,
    /// May contain `${NAME}` environment references; expanded at read time
    /// and never logged unsanitized.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub protect_patterns: Option<Vec<String>>,
    #[serde(default)]
    pub stale_days: Option<u64>,
    #[serde(default)]
    pub workspaces: Option<IndexMap<String, WorkspaceSpec>>,
    /// Forge identity (`"github"`, `"gitlab"`, a self-hosted name) a bare
    /// `owner/repo` clone-plan shorthand resolves against.
    #[serde(default)]
    pub provider: Option<String>,
    /// Base URL for the configured provider, e.g. `https://gitlab.example.com`.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub clone_protocol: Option<CloneProtocol>,
    #[serde(default)]
    pub ssh_port: Option<u16>,
    /// GitLab-style subgroup path prefixed onto a bare shorthand before the
    /// repo name, e.g. `team/backend`.
    #[serde(default)]
    pub subgroup: Option<String>,

    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum FieldSource {
    Flag,
    Project,
    Profile,
    Global,
    Env,
    Default,
}

/// The four on-disk/flag layers, highest priority first.
#[derive(Debug, Clone, Default)]
pub struct ConfigLayer {
    pub flag: Option<GzConfig>,
    pub project: Option<GzConfig>,
    pub profile: Option<GzConfig>,
    pub global: Option<GzConfig>,
}

#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub parallel: usize,
    pub scan_root: Option<PathBuf>,
    pub include: Option<String>,
    pub exclude: Option<String>,
    pub max_depth: u32,
    pub token: Option<String>,
    pub protect_patterns: Vec<String>,
    pub stale_days: u64,
    pub workspaces: IndexMap<String, WorkspaceSpec>,
    pub provider: Option<String>,
    pub base_url: Option<String>,
    pub clone_protocol: Option<CloneProtocol>,
    pub ssh_port: Option<u16>,
    pub subgroup: Option<String>,
    pub source_map: HashMap<&'static str, FieldSource>,
}

const DEFAULT_PARALLEL_FALLBACK: usize = 4;
const DEFAULT_MAX_DEPTH: u32 = 3;
const DEFAULT_STALE_DAYS: u64 = 90;

macro_rules! resolve_field {
    ($layers:expr, $env:expr, $field:ident, $source_map:expr, $default:expr) => {{
        let mut picked = None;
        for (value, source) in [
            ($layers.flag.as_ref().and_then(|c| c.$field.clone()), FieldSource::Flag),
            ($layers.project.as_ref().and_then(|c| c.$field.clone()), FieldSource::Project),
            ($layers.profile.as_ref().and_then(|c| c.$field.clone()), FieldSource::Profile),
            ($layers.global.as_ref().and_then(|c| c.$field.clone()), FieldSource::Global),
            ($env.$field.clone(), FieldSource::Env),
        ] {
            if let Some(value) = value {
                picked = Some((value, source));
                break;
            }
        }
        match picked {
            Some((value, source)) => {
                $source_map.insert(stringify!($field), source);
                value
            }
            None => {
                $source_map.insert(stringify!($field), FieldSource::Default);
                $default
            }
        }
    }};
}

pub fn resolve(layers: &ConfigLayer, env: &GzConfig) -> EffectiveConfig {
    let mut source_map = HashMap::new();

    let parallel = resolve_field!(layers, env, parallel, source_map, crate::runner::default_parallelism().max(1));
    let scan_root = resolve_field!(layers, env, scan_root, source_map, None::<PathBuf>);
    let include = resolve_field!(layers, env, include, source_map, None::<String>);
    let exclude = resolve_field!(layers, env, exclude, source_map, None::<String>);
    let max_depth = resolve_field!(layers, env, max_depth, source_map, DEFAULT_MAX_DEPTH);
    let protect_patterns = resolve_field!(layers, env, protect_patterns, source_map, Vec::new());
    let stale_days = resolve_field!(layers, env, stale_days, source_map, DEFAULT_STALE_DAYS);
    let workspaces = resolve_field!(layers, env, workspaces, source_map, IndexMap::new());
    let provider = resolve_field!(layers, env, provider, source_map, None::<String>);
    let base_url = resolve_field!(layers, env, base_url, source_map, None::<String>);
    let clone_protocol = resolve_field!(layers, env, clone_protocol, source_map, None::<CloneProtocol>);
    let ssh_port = resolve_field!(layers, env, ssh_port, source_map, None::<u16>);
    let subgroup = resolve_field!(layers, env, subgroup, source_map, None::<String>);

    let token = resolve_field!(layers, env, token, source_map, None::<String>).map(|t| expand_token(&t));

    let parallel = if parallel == 0 { DEFAULT_PARALLEL_FALLBACK } else { parallel };

    EffectiveConfig {
        parallel,
        scan_root,
        include,
        exclude,
        max_depth,
        token,
        protect_patterns,
        stale_days,
        workspaces,
        provider,
        base_url,
        clone_protocol,
        ssh_port,
        subgroup,
        source_map,
    }
}

/// Expand `${NAME}` references against the process environment; an
/// unresolvable reference is left verbatim (a formatter surfaces that as a
/// warning, not this layer's job).
fn expand_token(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '$' && raw[i + 1..].starts_with('{') {
            if let Some(end) = raw[i + 2..].find('}') {
                let name = &raw[i + 2..i + 2 + end];
                if let Ok(value) = std::env::var(name) {
                    out.push_str(&value);
                } else {
                    out.push_str(&raw[i..i + 3 + end]);
                }
                for _ in 0..(end + 2) {
                    chars.next();
                }
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Sanitize a token for display: never log the full expanded value (spec §4.6).
pub fn sanitize_token(token: &str) -> String {
    if token.len() <= 8 {
        "x".repeat(token.len().max(4))
    } else {
        "xxxx…xxxx".to_string()
    }
}

/// Read the ambient `GZ_<FIELD>` environment overlay, the lowest-precedence
/// layer above built-in defaults.
pub fn env_overlay() -> GzConfig {
    GzConfig {
        parallel: std::env::var("GZ_PARALLEL").ok().and_then(|v| v.parse().ok()),
        scan_root: std::env::var("GZ_SCAN_ROOT").ok().map(PathBuf::from),
        include: std::env::var("GZ_INCLUDE").ok(),
        exclude: std::env::var("GZ_EXCLUDE").ok(),
        max_depth: std::env::var("GZ_MAX_DEPTH").ok().and_then(|v| v.parse().ok()),
        token: std::env::var("GZ_TOKEN").ok(),
        protect_patterns: None,
        stale_days: std::env::var("GZ_STALE_DAYS").ok().and_then(|v| v.parse().ok()),
        workspaces: None,
        provider: std::env::var("GZ_PROVIDER").ok(),
        base_url: std::env::var("GZ_BASE_URL").ok(),
        clone_protocol: std::env::var("GZ_CLONE_PROTOCOL").ok().and_then(|v| v.parse().ok()),
        ssh_port: std::env::var("GZ_SSH_PORT").ok().and_then(|v| v.parse().ok()),
        subgroup: std::env::var("GZ_SUBGROUP").ok(),
        extra: serde_yaml::Mapping::new(),
    }
}

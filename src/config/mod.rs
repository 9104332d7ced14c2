//! Layered configuration, the hierarchical workspace tree, and the clone-plan
//! compiler (spec §4.5, §4.6).
//!
//! The wire format is YAML (`.gz-git.yaml` / `config.yaml` / `profiles/<name>.yaml`,
//! spec §6.3), unlike the teacher's TOML — resolution itself is hand-rolled
//! rather than built on the `config` crate's environment-merging builder, so
//! each field's winning layer can be tracked in [`resolver::EffectiveConfig::source_map`],
//! which that crate does not expose.

pub mod persistence;
pub mod plan;
pub mod resolver;
pub mod workspace;

pub use persistence::{config_dir, write_atomic};
pub use plan::{compile_clone_plan, parse_clone_spec, validate as validate_clone_spec};
pub use resolver::{CloneProtocol, ConfigLayer, EffectiveConfig, FieldSource, GzConfig};
pub use workspace::{WorkspaceNode, WorkspaceType};

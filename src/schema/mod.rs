//! TOML schema files.
//!
//! A schema names the groups of one native API and, optionally, the target
//! they should be laid out for:
//!
//! ```toml
//! [target]
//! triple = "x86_64-unknown-linux-gnu"
//!
//! [[group]]
//! name = "point"
//! kind = "struct"
//! fields = [
//!   { name = "x", type = "int" },
//!   { padding = 4 },
//!   { name = "tag", type = "bytes", len = 4 },
//! ]
//! ```

pub mod builtin;

use std::path::Path;

use anyhow::{Context, Result};
use miette::{NamedSource, SourceSpan};
use serde::Deserialize;

use crate::core::abi::AbiRules;
use crate::core::types::{FieldSpec, FieldType, GroupKind, Member, Primitive};
use crate::error::LayoutError;
use crate::layout::LayoutRegistry;
use crate::util::config::Config;
use crate::util::diagnostic::{suggestions, InvalidTargetError, SchemaSyntaxError};

/// Prefix selecting an embedded schema instead of a file.
pub const BUILTIN_PREFIX: &str = "builtin:";

/// Raw schema file as deserialized.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchema {
    target: Option<RawTarget>,
    #[serde(default, rename = "group")]
    groups: Vec<RawGroup>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTarget {
    triple: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGroup {
    name: String,
    #[serde(default)]
    kind: GroupKind,
    fields: Vec<RawMember>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawMember {
    Padding(RawPadding),
    Field(RawField),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPadding {
    padding: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    ty: Option<String>,
    count: Option<usize>,
    len: Option<usize>,
    group: Option<String>,
}

/// A parsed schema, not yet laid out.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    raw: RawSchema,
}

impl Schema {
    /// Load a schema from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read schema: {}", path.display()))?;

        Self::parse(&path.display().to_string(), &content)
    }

    /// Parse schema content; `name` labels diagnostics.
    pub fn parse(name: &str, content: &str) -> Result<Self> {
        let raw: RawSchema = toml::from_str(content).map_err(|err| SchemaSyntaxError {
            name: name.to_string(),
            message: err.message().to_string(),
            src: NamedSource::new(name, content.to_string()),
            span: err.span().map(SourceSpan::from),
        })?;

        if raw.groups.is_empty() {
            tracing::warn!("schema `{}` declares no groups", name);
        }

        Ok(Schema {
            name: name.to_string(),
            raw,
        })
    }

    /// Resolve a schema argument: `builtin:NAME`, a path, or a bare name
    /// searched in the configured schema paths.
    pub fn locate(arg: &str, config: &Config) -> Result<Self> {
        if let Some(name) = arg.strip_prefix(BUILTIN_PREFIX) {
            return builtin::load(name);
        }

        match config.find_schema(arg) {
            Some(path) => {
                tracing::debug!("using schema {}", path.display());
                Self::load(&path)
            }
            None => anyhow::bail!(
                "schema `{}` not found\n{}",
                arg,
                suggestions::SCHEMA_NOT_FOUND
            ),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target triple declared by the schema, if any.
    pub fn target(&self) -> Option<&str> {
        self.raw.target.as_ref().map(|t| t.triple.as_str())
    }

    /// Group names in declaration order.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.raw.groups.iter().map(|g| g.name.as_str())
    }

    /// Pick the ABI rules to lay the schema out with.
    ///
    /// Precedence: explicit override, then the schema's `[target]`, then the
    /// configured default, then the host.
    pub fn resolve_abi(&self, cli: Option<&str>, config: &Config) -> Result<AbiRules> {
        let chosen = cli
            .or_else(|| self.target())
            .or(config.target.as_deref());

        match chosen {
            Some(triple) => AbiRules::parse(triple).ok_or_else(|| {
                InvalidTargetError {
                    triple: triple.to_string(),
                }
                .into()
            }),
            None => Ok(AbiRules::host()),
        }
    }

    /// Lay out every group, in declaration order.
    pub fn build(&self, abi: &AbiRules) -> Result<LayoutRegistry, LayoutError> {
        let mut registry = LayoutRegistry::new(abi.clone());
        for group in &self.raw.groups {
            let members = group
                .fields
                .iter()
                .map(|member| convert_member(&group.name, member, &registry))
                .collect::<Result<Vec<_>, _>>()?;
            registry.register_members(&group.name, group.kind, &members)?;
        }
        tracing::debug!(
            "laid out {} groups of `{}` for {}",
            registry.len(),
            self.name,
            abi.describe()
        );
        Ok(registry)
    }
}

fn convert_member(
    group: &str,
    member: &RawMember,
    registry: &LayoutRegistry,
) -> Result<Member, LayoutError> {
    let field = match member {
        RawMember::Padding(p) => return Ok(Member::Padding(p.padding)),
        RawMember::Field(field) => field,
    };
    let invalid = |reason: &str| LayoutError::InvalidDeclaration {
        group: group.to_string(),
        field: field.name.clone(),
        reason: reason.to_string(),
    };

    let field_type = match (&field.group, field.ty.as_deref()) {
        (Some(_), Some(_)) => return Err(invalid("`type` and `group` are exclusive")),
        (Some(name), None) => {
            if field.count.is_some() || field.len.is_some() {
                return Err(invalid("nested groups cannot be repeated"));
            }
            FieldType::Group(registry.require(name)?)
        }
        (None, Some("bytes")) => match (field.len, field.count) {
            (Some(n), None) | (None, Some(n)) => FieldType::Bytes(n),
            (Some(_), Some(_)) => return Err(invalid("use either `len` or `count`")),
            (None, None) => return Err(invalid("`bytes` needs a `len`")),
        },
        (None, Some(name)) => {
            if field.len.is_some() {
                return Err(invalid("`len` only applies to `bytes`"));
            }
            let primitive =
                Primitive::parse(name, registry.abi()).ok_or_else(|| LayoutError::UnknownType {
                    field: field.name.clone(),
                    type_name: name.to_string(),
                })?;
            match field.count {
                Some(n) => FieldType::Array(primitive, n),
                None => FieldType::Scalar(primitive),
            }
        }
        (None, None) => return Err(invalid("needs a `type` or a `group`")),
    };

    Ok(Member::Field(FieldSpec::new(field.name.clone(), field_type)))
}

//! Named collection of computed layouts for one target.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::abi::AbiRules;
use crate::core::types::{GroupKind, Member};
use crate::error::LayoutError;
use crate::layout::compute::{compute_layout, GroupBuilder};
use crate::layout::group::GroupLayout;

/// Registry of group layouts, all computed under the same [`AbiRules`].
///
/// Groups are registered in dependency order: a group may only embed groups
/// that are already registered.
#[derive(Debug, Clone)]
pub struct LayoutRegistry {
    abi: AbiRules,
    groups: Vec<Arc<GroupLayout>>,
    index: HashMap<String, usize>,
}

impl LayoutRegistry {
    /// Create an empty registry for a target.
    pub fn new(abi: AbiRules) -> Self {
        LayoutRegistry {
            abi,
            groups: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Rules every layout in this registry was computed with.
    pub fn abi(&self) -> &AbiRules {
        &self.abi
    }

    /// Compute and register a group.
    pub fn register_members(
        &mut self,
        name: &str,
        kind: GroupKind,
        members: &[Member],
    ) -> Result<Arc<GroupLayout>, LayoutError> {
        if self.index.contains_key(name) {
            return Err(LayoutError::DuplicateGroup {
                group: name.to_string(),
            });
        }

        let layout = Arc::new(compute_layout(name, kind, members, &self.abi)?);
        self.index.insert(name.to_string(), self.groups.len());
        self.groups.push(Arc::clone(&layout));
        Ok(layout)
    }

    /// Compute and register the group described by a builder.
    pub fn register(&mut self, builder: &GroupBuilder) -> Result<Arc<GroupLayout>, LayoutError> {
        self.register_members(builder.name(), builder.kind(), builder.members())
    }

    /// Look up a group by name.
    pub fn get(&self, name: &str) -> Option<Arc<GroupLayout>> {
        self.index.get(name).map(|&i| Arc::clone(&self.groups[i]))
    }

    /// Look up a group that must exist.
    pub fn require(&self, name: &str) -> Result<Arc<GroupLayout>, LayoutError> {
        self.get(name).ok_or_else(|| LayoutError::UnknownGroup {
            group: name.to_string(),
        })
    }

    /// Groups in registration order.
    pub fn groups(&self) -> impl Iterator<Item = &Arc<GroupLayout>> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

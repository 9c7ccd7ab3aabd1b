//! Group hierarchy trees and the traversals the query engine needs.

use std::collections::{BTreeMap, VecDeque};

/// Children of one node, keyed by group code.
pub type GroupForest = BTreeMap<String, GroupTree>;

/// One group node: its free-form type tag and its child groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupTree {
    pub group_type: String,
    pub children: GroupForest,
}

impl GroupTree {
    pub fn new(group_type: impl Into<String>) -> Self {
        Self {
            group_type: group_type.into(),
            children: GroupForest::new(),
        }
    }

    pub fn with_child(mut self, code: impl Into<String>, child: GroupTree) -> Self {
        self.children.insert(code.into(), child);
        self
    }
}

/// The chain(s) of ancestors above a group, shaped as a tree whose leaves are
/// the target's direct parents. The target itself is not included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AncestorTree(BTreeMap<String, AncestorTree>);

impl AncestorTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, code: impl Into<String>, above: AncestorTree) -> Self {
        self.0.insert(code.into(), above);
        self
    }

    pub fn get(&self, code: &str) -> Option<&AncestorTree> {
        self.0.get(code)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every ancestor code at any depth.
    pub fn codes(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_codes(&mut out);
        out
    }

    fn collect_codes(&self, out: &mut Vec<String>) {
        for (code, above) in &self.0 {
            out.push(code.clone());
            above.collect_codes(out);
        }
    }
}

pub(crate) fn collect_of_type(forest: &GroupForest, group_type: &str, out: &mut Vec<String>) {
    for (code, node) in forest {
        if node.group_type == group_type {
            out.push(code.clone());
        }
        collect_of_type(&node.children, group_type, out);
    }
}

/// Breadth-first walk bucketing every visited code by its type.
pub(crate) fn bucket_by_type(forest: &GroupForest, out: &mut BTreeMap<String, Vec<String>>) {
    let mut queue: VecDeque<&GroupForest> = VecDeque::from([forest]);
    while let Some(level) = queue.pop_front() {
        for (code, node) in level {
            out.entry(node.group_type.clone())
                .or_default()
                .push(code.clone());
            queue.push_back(&node.children);
        }
    }
}

/// Ancestors of `group` within `forest`, or `None` if it never appears.
///
/// If the group sits at this level its ancestors are exactly the caller's
/// path, so an empty tree is returned. Otherwise every child branch that
/// contains the group contributes its own chain.
pub(crate) fn ancestors_of(forest: &GroupForest, group: &str) -> Option<AncestorTree> {
    if forest.contains_key(group) {
        return Some(AncestorTree::new());
    }

    let mut found = AncestorTree::new();
    for (code, node) in forest {
        if let Some(above) = ancestors_of(&node.children, group) {
            found.0.insert(code.clone(), above);
        }
    }

    (!found.is_empty()).then_some(found)
}

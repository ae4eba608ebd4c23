// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Flat tree builder for self-referencing tables.
//!
//! Rows of a self-referencing table (every row carries its own id and the id
//! of its parent) arrive in no particular parent/child order. [`FlatTree`]
//! assembles them into a tree in one pass:
//!
//! - a row whose parent has not been seen yet is attached to a *pseudo-node*,
//!   an empty placeholder registered under the parent id;
//! - when the parent row arrives later its payload is patched into the
//!   placeholder in place, so already linked children stay attached.
//!
//! Nodes live in a [`SlotMap`] arena; the id index only holds container nodes
//! and the root, because a leaf can never be looked up as a parent.
//!
//! ## Example
//!
//! ```
//! use citydb_core::tree::{FlatTree, TreePayload};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Part(&'static str);
//!
//! impl TreePayload for Part {
//!     fn is_leaf(&self) -> bool {
//!         false
//!     }
//! }
//!
//! let mut tree = FlatTree::new();
//! tree.insert(2, Part("child"), Some(1));
//! tree.insert(1, Part("root"), None);
//!
//! let root = tree.into_root().unwrap();
//! assert_eq!(root.payload, Some(Part("root")));
//! assert_eq!(root.children[0].id, 2);
//! ```

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Arena key of a tree node.
    pub struct NodeKey;
}

/// Row payload stored in a [`FlatTree`].
pub trait TreePayload {
    /// Returns `true` if the payload is an inline leaf that can never have
    /// children of its own.
    fn is_leaf(&self) -> bool;
}

/// A node inside the arena.
#[derive(Debug, Clone)]
pub struct ArenaNode<T> {
    pub id: i64,
    /// `None` while the node is an unpatched pseudo-node.
    pub payload: Option<T>,
    /// Child keys in row arrival order.
    pub children: Vec<NodeKey>,
}

/// An owned node produced by [`FlatTree::into_root`].
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode<T> {
    pub id: i64,
    pub payload: Option<T>,
    pub children: Vec<TreeNode<T>>,
}

impl<T> TreeNode<T> {
    /// Returns `true` if this node never received a row of its own.
    pub fn is_pseudo(&self) -> bool {
        self.payload.is_none()
    }

    /// Number of nodes in this subtree, including this node.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(TreeNode::subtree_len).sum::<usize>()
    }

    /// Visits this subtree depth-first, parents before children.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a TreeNode<T>)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Tree assembled from rows arriving in arbitrary order.
#[derive(Debug)]
pub struct FlatTree<T> {
    nodes: SlotMap<NodeKey, ArenaNode<T>>,
    index: FxHashMap<i64, NodeKey>,
    root: Option<NodeKey>,
}

impl<T> Default for FlatTree<T> {
    fn default() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            index: FxHashMap::default(),
            root: None,
        }
    }
}

impl<T: TreePayload> FlatTree<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row under `parent_id`; `None` marks the root of the subtree.
    ///
    /// Returns the arena key of the node now holding the payload.
    pub fn insert(&mut self, id: i64, payload: T, parent_id: Option<i64>) -> NodeKey {
        let is_leaf = payload.is_leaf();

        let key = match self.index.get(&id).copied() {
            Some(existing) => {
                let node = &mut self.nodes[existing];
                if node.payload.is_some() {
                    tracing::warn!(id, "duplicate row id, keeping the last row");
                }
                if is_leaf && !node.children.is_empty() {
                    tracing::warn!(
                        id,
                        children = node.children.len(),
                        "leaf row patched into a node that already has children"
                    );
                }
                node.payload = Some(payload);
                existing
            }
            None => {
                let key = self.nodes.insert(ArenaNode {
                    id,
                    payload: Some(payload),
                    children: Vec::new(),
                });
                if !is_leaf || parent_id.is_none() {
                    self.index.insert(id, key);
                }
                key
            }
        };

        match parent_id {
            None => self.root = Some(key),
            Some(parent_id) => {
                let parent = match self.index.get(&parent_id).copied() {
                    Some(parent) => parent,
                    None => {
                        let pseudo = self.nodes.insert(ArenaNode {
                            id: parent_id,
                            payload: None,
                            children: Vec::new(),
                        });
                        self.index.insert(parent_id, pseudo);
                        pseudo
                    }
                };
                self.nodes[parent].children.push(key);
            }
        }

        key
    }
}

impl<T> FlatTree<T> {
    /// Returns the indexed node with the given row id.
    pub fn get(&self, id: i64) -> Option<&ArenaNode<T>> {
        self.index.get(&id).and_then(|&key| self.nodes.get(key))
    }

    /// Returns the node stored under an arena key.
    pub fn node(&self, key: NodeKey) -> Option<&ArenaNode<T>> {
        self.nodes.get(key)
    }

    /// Returns the root node, if a root row has been inserted.
    pub fn root(&self) -> Option<&ArenaNode<T>> {
        self.root.and_then(|key| self.nodes.get(key))
    }

    pub fn root_key(&self) -> Option<NodeKey> {
        self.root
    }

    /// Returns the children of a node in arrival order.
    pub fn children(&self, key: NodeKey) -> impl Iterator<Item = &ArenaNode<T>> + '_ {
        self.nodes
            .get(key)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(move |&child| self.nodes.get(child))
    }

    /// Number of nodes in the arena, pseudo-nodes included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes in the id index.
    pub fn indexed_len(&self) -> usize {
        self.index.len()
    }

    /// Number of placeholders that never received their row.
    pub fn pseudo_count(&self) -> usize {
        self.nodes.values().filter(|n| n.payload.is_none()).count()
    }

    /// Consumes the arena and returns the owned tree below the root.
    ///
    /// Nodes that are not reachable from the root are dropped.
    pub fn into_root(mut self) -> Option<TreeNode<T>> {
        let root = self.root?;
        Self::detach(&mut self.nodes, root)
    }

    fn detach(nodes: &mut SlotMap<NodeKey, ArenaNode<T>>, key: NodeKey) -> Option<TreeNode<T>> {
        // Removed before recursing, so a malformed parent cycle ends here.
        let node = nodes.remove(key)?;
        let children = node
            .children
            .into_iter()
            .filter_map(|child| Self::detach(nodes, child))
            .collect();
        Some(TreeNode {
            id: node.id,
            payload: node.payload,
            children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: &'static str,
        leaf: bool,
    }

    impl TreePayload for Row {
        fn is_leaf(&self) -> bool {
            self.leaf
        }
    }

    fn container(name: &'static str) -> Row {
        Row { name, leaf: false }
    }

    fn leaf(name: &'static str) -> Row {
        Row { name, leaf: true }
    }

    #[test]
    fn parent_before_child() {
        let mut tree = FlatTree::new();
        tree.insert(1, container("root"), None);
        tree.insert(2, leaf("a"), Some(1));
        tree.insert(3, leaf("b"), Some(1));

        let root = tree.root().unwrap();
        assert_eq!(root.id, 1);
        let names: Vec<_> = tree
            .children(tree.root_key().unwrap())
            .map(|n| n.payload.as_ref().unwrap().name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(tree.pseudo_count(), 0);
    }

    #[test]
    fn child_before_parent_patches_pseudo_node() {
        let mut tree = FlatTree::new();
        tree.insert(3, leaf("a"), Some(2));
        assert_eq!(tree.pseudo_count(), 1);
        assert!(tree.get(2).unwrap().payload.is_none());

        tree.insert(2, container("shell"), Some(1));
        tree.insert(1, container("solid"), None);
        assert_eq!(tree.pseudo_count(), 0);

        let root = tree.into_root().unwrap();
        assert_eq!(root.payload.as_ref().unwrap().name, "solid");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].payload.as_ref().unwrap().name, "shell");
        assert_eq!(root.children[0].children[0].id, 3);
    }

    #[test]
    fn leaves_below_root_are_not_indexed() {
        let mut tree = FlatTree::new();
        tree.insert(1, container("root"), None);
        tree.insert(2, leaf("a"), Some(1));
        assert!(tree.get(2).is_none());
        assert_eq!(tree.indexed_len(), 1);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn leaf_root_is_indexed() {
        let mut tree = FlatTree::new();
        tree.insert(7, leaf("polygon"), None);
        assert_eq!(tree.get(7).unwrap().id, 7);
        assert_eq!(tree.into_root().unwrap().subtree_len(), 1);
    }

    #[test]
    fn duplicate_row_keeps_last_payload() {
        let mut tree = FlatTree::new();
        tree.insert(1, container("first"), None);
        tree.insert(1, container("second"), None);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root().unwrap().payload.as_ref().unwrap().name, "second");
    }

    #[test]
    fn nodes_outside_the_root_subtree_are_dropped() {
        let mut tree = FlatTree::new();
        tree.insert(1, container("root"), None);
        tree.insert(3, leaf("a"), Some(2));
        tree.insert(2, container("never"), Some(9));

        // 2 hangs below pseudo-node 9 which is not part of the root subtree.
        let root = tree.into_root().unwrap();
        assert!(root.children.is_empty());
    }

    #[test]
    fn no_root_yields_none() {
        let mut tree = FlatTree::new();
        tree.insert(2, leaf("a"), Some(1));
        assert!(tree.into_root().is_none());
    }
}

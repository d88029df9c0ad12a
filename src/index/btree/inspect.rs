//! Structural introspection.
//!
//! - [`Layout`] - owned nested snapshot of the tree, comparable with `==`
//! - [`BPlusTree::check_invariants`] - full structural audit

use std::fmt;

use crate::common::{Error, NodeId, Result};

use super::node::{NodeBody, NodeRole};
use super::tree::BPlusTree;

/// Owned snapshot of a subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    Leaf {
        role: NodeRole,
        keys: Vec<String>,
    },
    Branch {
        role: NodeRole,
        separators: Vec<String>,
        children: Vec<Layout>,
    },
}

impl Layout {
    pub fn role(&self) -> NodeRole {
        match self {
            Layout::Leaf { role, .. } | Layout::Branch { role, .. } => *role,
        }
    }

    /// Keys of a leaf or separators of a branch.
    pub fn keys(&self) -> &[String] {
        match self {
            Layout::Leaf { keys, .. } => keys,
            Layout::Branch { separators, .. } => separators,
        }
    }

    pub fn children(&self) -> &[Layout] {
        match self {
            Layout::Leaf { .. } => &[],
            Layout::Branch { children, .. } => children,
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(f, "{:indent$}{} {:?}", "", self.role(), self.keys(), indent = depth * 2)?;
        for child in self.children() {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// Summary returned by a successful invariant check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeShape {
    /// Levels from root to leaves, inclusive.
    pub height: usize,
    /// Leaf nodes (including a lone `RootLeaf`).
    pub leaves: usize,
    /// Branch nodes (`Root` and `Internal`).
    pub branches: usize,
    /// Records across all leaves.
    pub records: usize,
}

/// Exclusive upper / inclusive lower key bounds inherited from ancestors.
#[derive(Clone, Copy)]
struct Bounds<'a> {
    lower: Option<&'a str>,
    upper: Option<&'a str>,
}

impl<'a> Bounds<'a> {
    fn admits(&self, key: &str) -> bool {
        self.lower.map_or(true, |lo| key >= lo) && self.upper.map_or(true, |hi| key < hi)
    }
}

struct Audit {
    leaves_in_order: Vec<NodeId>,
    leaf_depth: Option<usize>,
    branches: usize,
    records: usize,
}

impl BPlusTree {
    /// Snapshot the current structure.
    pub fn layout(&self) -> Result<Layout> {
        self.layout_of(self.root)
    }

    fn layout_of(&self, id: NodeId) -> Result<Layout> {
        let node = self.arena.get(id)?;
        Ok(match node.body() {
            NodeBody::Leaf { records, .. } => Layout::Leaf {
                role: node.role(),
                keys: records.iter().map(|r| r.key().to_string()).collect(),
            },
            NodeBody::Branch {
                separators,
                children,
            } => Layout::Branch {
                role: node.role(),
                separators: separators.clone(),
                children: children
                    .iter()
                    .map(|&child| self.layout_of(child))
                    .collect::<Result<Vec<_>>>()?,
            },
        })
    }

    /// Audit every structural property of the tree.
    ///
    /// Checks, for every node: role consistency, `children == entries + 1`,
    /// capacity, strictly ascending entries, keys within the range their
    /// ancestors route to them, and that ancestor resolution finds the real
    /// parent. Globally: all leaves at one depth, the sibling chain visits
    /// every leaf left to right, and the record count matches `len()`.
    ///
    /// # Errors
    /// `Error::InvariantViolation` describing the first broken property.
    pub fn check_invariants(&self) -> Result<TreeShape> {
        let root_role = self.arena.get(self.root)?.role();
        if !root_role.is_root() {
            return Err(Error::corrupt(format!(
                "root {} has non-root role {}",
                self.root, root_role
            )));
        }

        let mut audit = Audit {
            leaves_in_order: Vec::new(),
            leaf_depth: None,
            branches: 0,
            records: 0,
        };
        let unbounded = Bounds {
            lower: None,
            upper: None,
        };
        self.audit_node(self.root, None, 1, unbounded, &mut audit)?;

        let height = audit.leaf_depth.unwrap_or(1);
        if height != self.height {
            return Err(Error::corrupt(format!(
                "leaves at depth {} but height is {}",
                height, self.height
            )));
        }
        if audit.records != self.len {
            return Err(Error::corrupt(format!(
                "{} records stored but len() is {}",
                audit.records, self.len
            )));
        }
        self.audit_leaf_chain(&audit.leaves_in_order)?;

        Ok(TreeShape {
            height,
            leaves: audit.leaves_in_order.len(),
            branches: audit.branches,
            records: audit.records,
        })
    }

    fn audit_node(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
        depth: usize,
        bounds: Bounds<'_>,
        audit: &mut Audit,
    ) -> Result<()> {
        let node = self.arena.get(id)?;
        let role = node.role();

        if parent.is_some() && role.is_root() {
            return Err(Error::corrupt(format!("non-root {} has role {}", id, role)));
        }
        if node.entry_count() > self.config.max_entries() {
            return Err(Error::corrupt(format!(
                "{} holds {} entries, capacity is {}",
                id,
                node.entry_count(),
                self.config.max_entries()
            )));
        }
        if parent.is_some() && self.find_parent(id)? != parent {
            return Err(Error::corrupt(format!(
                "ancestor resolution disagrees with structure for {}",
                id
            )));
        }

        match node.body() {
            NodeBody::Leaf { records, .. } => {
                if !role.is_leaf() {
                    return Err(Error::corrupt(format!("{} holds records but is {}", id, role)));
                }
                let keys: Vec<&str> = records.iter().map(|r| r.key()).collect();
                check_entries(id, &keys, bounds)?;

                match audit.leaf_depth {
                    None => audit.leaf_depth = Some(depth),
                    Some(d) if d != depth => {
                        return Err(Error::corrupt(format!(
                            "leaf {} at depth {}, expected {}",
                            id, depth, d
                        )))
                    }
                    Some(_) => {}
                }
                audit.leaves_in_order.push(id);
                audit.records += records.len();
            }
            NodeBody::Branch {
                separators,
                children,
            } => {
                if role.is_leaf() {
                    return Err(Error::corrupt(format!("{} has children but is {}", id, role)));
                }
                if children.len() != separators.len() + 1 {
                    return Err(Error::corrupt(format!(
                        "{} has {} separators and {} children",
                        id,
                        separators.len(),
                        children.len()
                    )));
                }
                let keys: Vec<&str> = separators.iter().map(String::as_str).collect();
                check_entries(id, &keys, bounds)?;
                audit.branches += 1;

                for (i, &child) in children.iter().enumerate() {
                    let child_bounds = Bounds {
                        lower: if i == 0 { bounds.lower } else { Some(keys[i - 1]) },
                        upper: keys.get(i).copied().or(bounds.upper),
                    };
                    self.audit_node(child, Some(id), depth + 1, child_bounds, audit)?;
                }
            }
        }
        Ok(())
    }

    fn audit_leaf_chain(&self, leaves_in_order: &[NodeId]) -> Result<()> {
        let mut expected = leaves_in_order.iter();
        let mut current = Some(self.leftmost_leaf()?);

        while let Some(id) = current {
            match expected.next() {
                Some(&want) if want == id => {}
                Some(&want) => {
                    return Err(Error::corrupt(format!(
                        "leaf chain reached {}, expected {}",
                        id, want
                    )))
                }
                None => {
                    return Err(Error::corrupt(format!(
                        "leaf chain continues past the last leaf to {}",
                        id
                    )))
                }
            }
            current = self.next_leaf(id)?;
        }

        match expected.next() {
            None => Ok(()),
            Some(missed) => Err(Error::corrupt(format!(
                "leaf chain ends before reaching {}",
                missed
            ))),
        }
    }
}

/// Entries must be strictly ascending and inside the inherited bounds.
fn check_entries(id: NodeId, keys: &[&str], bounds: Bounds<'_>) -> Result<()> {
    if let Some(pair) = keys.windows(2).find(|w| w[0] >= w[1]) {
        return Err(Error::corrupt(format!(
            "{} entries out of order: {:?} before {:?}",
            id, pair[0], pair[1]
        )));
    }
    if let Some(stray) = keys.iter().find(|k| !bounds.admits(k)) {
        return Err(Error::corrupt(format!(
            "{} holds {:?} outside its routed range",
            id, stray
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TreeConfig;
    use crate::index::btree::node::{Node, Record};

    fn strings(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_empty_tree_shape() {
        let tree = BPlusTree::new();
        let shape = tree.check_invariants().unwrap();
        assert_eq!(
            shape,
            TreeShape {
                height: 1,
                leaves: 1,
                branches: 0,
                records: 0
            }
        );
        assert_eq!(
            tree.layout().unwrap(),
            Layout::Leaf {
                role: NodeRole::RootLeaf,
                keys: Vec::new()
            }
        );
    }

    #[test]
    fn test_layout_after_first_split() {
        let mut tree = BPlusTree::new();
        for k in ["b", "a", "c", "d", "e", "f"] {
            tree.insert(k, k).unwrap();
        }

        let expected = Layout::Branch {
            role: NodeRole::Root,
            separators: strings(&["d"]),
            children: vec![
                Layout::Leaf {
                    role: NodeRole::Leaf,
                    keys: strings(&["a", "b", "c"]),
                },
                Layout::Leaf {
                    role: NodeRole::Leaf,
                    keys: strings(&["d", "e", "f"]),
                },
            ],
        };
        assert_eq!(tree.layout().unwrap(), expected);
        assert_eq!(tree.layout().unwrap().to_string(), "root [\"d\"]\n  leaf [\"a\", \"b\", \"c\"]\n  leaf [\"d\", \"e\", \"f\"]\n");
    }

    #[test]
    fn test_invariants_hold_across_capacities() {
        for cap in 3..=8 {
            let mut tree = BPlusTree::with_config(TreeConfig::new(cap).unwrap());
            for i in 0..300u32 {
                tree.insert(format!("{:05}", (i * 7919) % 300), "v").unwrap();
            }
            let shape = tree.check_invariants().unwrap();
            assert_eq!(shape.records, 300);
            assert_eq!(shape.height, tree.height());
        }
    }

    #[test]
    fn test_detects_unsorted_leaf() {
        let mut tree = BPlusTree::new();
        tree.insert("a", "1").unwrap();
        tree.insert("b", "2").unwrap();

        let root = tree.root_id();
        if let NodeBody::Leaf { records, .. } = tree.arena.get_mut(root).unwrap().body_mut() {
            records.swap(0, 1);
        }
        assert!(matches!(
            tree.check_invariants(),
            Err(Error::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_detects_broken_leaf_chain() {
        let mut tree = BPlusTree::new();
        for k in ["a", "b", "c", "d", "e", "f"] {
            tree.insert(k, k).unwrap();
        }

        let first = tree.leftmost_leaf().unwrap();
        if let NodeBody::Leaf { next, .. } = tree.arena.get_mut(first).unwrap().body_mut() {
            *next = None;
        }
        let err = tree.check_invariants().unwrap_err();
        assert!(err.to_string().contains("leaf chain"), "{}", err);
    }

    #[test]
    fn test_detects_key_outside_routed_range() {
        let mut tree = BPlusTree::new();
        for k in ["a", "b", "c", "d", "e", "f"] {
            tree.insert(k, k).unwrap();
        }

        // "z" belongs right of separator "d" but is planted in the left leaf.
        let first = tree.leftmost_leaf().unwrap();
        if let NodeBody::Leaf { records, .. } = tree.arena.get_mut(first).unwrap().body_mut() {
            records.push(Record::new("z", "z"));
        }
        tree.len += 1;
        assert!(tree.check_invariants().is_err());
    }

    #[test]
    fn test_detects_non_root_role_at_root() {
        let mut tree = BPlusTree::new();
        let leaf = tree.arena.alloc(Node::leaf(Vec::new(), None));
        tree.root = leaf;
        assert!(tree.check_invariants().is_err());
    }
}

//! Column-oriented decision tree storage.
//!
//! A [`Tree`] is an arena of dense, index-addressed parallel arrays rather
//! than a pointer graph: children are `i32` indices into the same arrays,
//! which removes cycle risk by construction everywhere except the one place
//! a malicious or buggy caller can still build one (the builder's raw
//! `add_children` wiring), and makes serialization a sequence of array
//! copies.

use crate::error::{Error, Result};
use crate::typeinfo::{LeafOutputType, NodeType, Operator, ThresholdType};
use serde::{Deserialize, Serialize};

/// One node's optional statistic: a value plus a "present" bit.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct OptionalStat<T> {
    pub value: T,
    pub present: bool,
}

impl<T: Default> OptionalStat<T> {
    fn unset() -> Self {
        OptionalStat {
            value: T::default(),
            present: false,
        }
    }
}

/// The maximum legal feature index: one bit of `split_feature_index` is
/// reserved, so `feature_index < 2^31 - 1`.
pub const MAX_FEATURE_INDEX: u32 = (1u32 << 31) - 2;

/// A single decision tree over `ThresholdT = T`, `LeafOutputT = L`.
///
/// All fields are dense arrays indexed by the internal node id
/// `0..num_nodes`. Node 0 is always the root.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tree<T, L> {
    node_type: Vec<NodeType>,
    left_child: Vec<i32>,
    right_child: Vec<i32>,
    split_feature_index: Vec<u32>,
    default_left: Vec<bool>,
    threshold: Vec<T>,
    comparison_op: Vec<Operator>,
    category_list_right_child: Vec<bool>,
    leaf_value: Vec<L>,

    leaf_vector: Vec<L>,
    leaf_vector_begin: Vec<u32>,
    leaf_vector_end: Vec<u32>,

    category_list: Vec<u32>,
    category_list_begin: Vec<u32>,
    category_list_end: Vec<u32>,

    data_count: Vec<OptionalStat<u64>>,
    sum_hess: Vec<OptionalStat<f64>>,
    gain: Vec<OptionalStat<f64>>,

    has_categorical_split: bool,
}

impl<T: ThresholdType, L: LeafOutputType> Default for Tree<T, L> {
    fn default() -> Self {
        let mut tree = Tree {
            node_type: Vec::new(),
            left_child: Vec::new(),
            right_child: Vec::new(),
            split_feature_index: Vec::new(),
            default_left: Vec::new(),
            threshold: Vec::new(),
            comparison_op: Vec::new(),
            category_list_right_child: Vec::new(),
            leaf_value: Vec::new(),
            leaf_vector: Vec::new(),
            leaf_vector_begin: Vec::new(),
            leaf_vector_end: Vec::new(),
            category_list: Vec::new(),
            category_list_begin: Vec::new(),
            category_list_end: Vec::new(),
            data_count: Vec::new(),
            sum_hess: Vec::new(),
            gain: Vec::new(),
            has_categorical_split: false,
        };
        tree.init();
        tree
    }
}

impl<T: ThresholdType, L: LeafOutputType> Tree<T, L> {
    /// Construct a one-node tree: the root is a leaf with value zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to a one-root tree, the root set as a leaf of value zero.
    pub fn init(&mut self) {
        self.node_type.clear();
        self.left_child.clear();
        self.right_child.clear();
        self.split_feature_index.clear();
        self.default_left.clear();
        self.threshold.clear();
        self.comparison_op.clear();
        self.category_list_right_child.clear();
        self.leaf_value.clear();
        self.leaf_vector.clear();
        self.leaf_vector_begin.clear();
        self.leaf_vector_end.clear();
        self.category_list.clear();
        self.category_list_begin.clear();
        self.category_list_end.clear();
        self.data_count.clear();
        self.sum_hess.clear();
        self.gain.clear();
        self.has_categorical_split = false;
        self.alloc_node();
        self.set_leaf(0, L::default());
    }

    pub fn num_nodes(&self) -> usize {
        self.node_type.len()
    }

    pub fn has_categorical_split(&self) -> bool {
        self.has_categorical_split
    }

    /// Append a default-initialized node (a leaf of value zero) and return
    /// its id.
    pub fn alloc_node(&mut self) -> usize {
        let id = self.node_type.len();
        self.node_type.push(NodeType::LeafNode);
        self.left_child.push(-1);
        self.right_child.push(-1);
        self.split_feature_index.push(0);
        self.default_left.push(false);
        self.threshold.push(T::default());
        self.comparison_op.push(Operator::LT);
        self.category_list_right_child.push(false);
        self.leaf_value.push(L::default());

        let pool_end = self.leaf_vector.len() as u32;
        self.leaf_vector_begin.push(pool_end);
        self.leaf_vector_end.push(pool_end);

        let cat_end = self.category_list.len() as u32;
        self.category_list_begin.push(cat_end);
        self.category_list_end.push(cat_end);

        self.data_count.push(OptionalStat::unset());
        self.sum_hess.push(OptionalStat::unset());
        self.gain.push(OptionalStat::unset());

        id
    }

    /// Allocate two children of `nid` and wire them in. Fails if `nid` is
    /// out of range.
    pub fn add_children(&mut self, nid: usize) -> Result<(usize, usize)> {
        self.check_nid(nid)?;
        let left = self.alloc_node();
        let right = self.alloc_node();
        self.left_child[nid] = left as i32;
        self.right_child[nid] = right as i32;
        Ok((left, right))
    }

    fn check_nid(&self, nid: usize) -> Result<()> {
        if nid >= self.num_nodes() {
            return Err(Error::Structural(format!(
                "node id {} is out of range (num_nodes = {})",
                nid,
                self.num_nodes()
            )));
        }
        Ok(())
    }

    pub fn node_type_at(&self, nid: usize) -> NodeType {
        self.node_type[nid]
    }

    pub fn left_child(&self, nid: usize) -> i32 {
        self.left_child[nid]
    }

    pub fn right_child(&self, nid: usize) -> i32 {
        self.right_child[nid]
    }

    pub fn is_leaf(&self, nid: usize) -> bool {
        self.node_type[nid] == NodeType::LeafNode
    }

    pub fn split_feature_index(&self, nid: usize) -> u32 {
        self.split_feature_index[nid]
    }

    pub fn default_left(&self, nid: usize) -> bool {
        self.default_left[nid]
    }

    pub fn threshold(&self, nid: usize) -> T {
        self.threshold[nid]
    }

    pub fn comparison_op(&self, nid: usize) -> Operator {
        self.comparison_op[nid]
    }

    pub fn category_list_right_child(&self, nid: usize) -> bool {
        self.category_list_right_child[nid]
    }

    pub fn leaf_value(&self, nid: usize) -> L {
        self.leaf_value[nid]
    }

    pub fn has_leaf_vector(&self, nid: usize) -> bool {
        self.leaf_vector_begin[nid] != self.leaf_vector_end[nid]
    }

    pub fn leaf_vector(&self, nid: usize) -> &[L] {
        let begin = self.leaf_vector_begin[nid] as usize;
        let end = self.leaf_vector_end[nid] as usize;
        &self.leaf_vector[begin..end]
    }

    pub fn category_list(&self, nid: usize) -> &[u32] {
        let begin = self.category_list_begin[nid] as usize;
        let end = self.category_list_end[nid] as usize;
        &self.category_list[begin..end]
    }

    pub fn data_count(&self, nid: usize) -> Option<u64> {
        self.data_count[nid].present.then_some(self.data_count[nid].value)
    }

    pub fn sum_hess(&self, nid: usize) -> Option<f64> {
        self.sum_hess[nid].present.then_some(self.sum_hess[nid].value)
    }

    pub fn gain(&self, nid: usize) -> Option<f64> {
        self.gain[nid].present.then_some(self.gain[nid].value)
    }

    /// Turn `nid` into a `NumericalTestNode`. Fails if `feature >=
    /// 2^31 - 1`, or if `nid` does not already have two children wired
    /// (via [`Tree::add_children`]).
    pub fn set_numerical_split(
        &mut self,
        nid: usize,
        feature: u32,
        threshold: T,
        default_left: bool,
        op: Operator,
    ) -> Result<()> {
        self.check_nid(nid)?;
        if feature > MAX_FEATURE_INDEX {
            return Err(Error::Validation(format!(
                "feature index {} exceeds the maximum of {}",
                feature, MAX_FEATURE_INDEX
            )));
        }
        self.require_children(nid)?;
        self.node_type[nid] = NodeType::NumericalTestNode;
        self.split_feature_index[nid] = feature;
        self.default_left[nid] = default_left;
        self.threshold[nid] = threshold;
        self.comparison_op[nid] = op;
        Ok(())
    }

    /// Turn `nid` into a `CategoricalTestNode`. `categories` is copied into
    /// the tree's category-list pool, sorted ascending and deduplicated;
    /// `list_is_right_child` selects which branch the matching categories
    /// take. Fails if `feature >= 2^31 - 1` or `nid` has no wired children.
    pub fn set_categorical_split(
        &mut self,
        nid: usize,
        feature: u32,
        default_left: bool,
        mut categories: Vec<u32>,
        list_is_right_child: bool,
    ) -> Result<()> {
        self.check_nid(nid)?;
        if feature > MAX_FEATURE_INDEX {
            return Err(Error::Validation(format!(
                "feature index {} exceeds the maximum of {}",
                feature, MAX_FEATURE_INDEX
            )));
        }
        self.require_children(nid)?;
        categories.sort_unstable();
        categories.dedup();

        let begin = self.category_list.len() as u32;
        self.category_list.extend_from_slice(&categories);
        let end = self.category_list.len() as u32;
        self.category_list_begin[nid] = begin;
        self.category_list_end[nid] = end;

        self.node_type[nid] = NodeType::CategoricalTestNode;
        self.split_feature_index[nid] = feature;
        self.default_left[nid] = default_left;
        self.category_list_right_child[nid] = list_is_right_child;
        self.has_categorical_split = true;
        Ok(())
    }

    /// Wire `nid`'s children directly to already-resolved internal ids,
    /// bypassing [`Tree::add_children`]. Used by the builder, which only
    /// learns the resolved ids at `end_tree` time.
    pub(crate) fn wire_children_raw(&mut self, nid: usize, left: usize, right: usize) {
        self.left_child[nid] = left as i32;
        self.right_child[nid] = right as i32;
    }

    fn require_children(&self, nid: usize) -> Result<()> {
        if self.left_child[nid] < 0 || self.right_child[nid] < 0 {
            return Err(Error::Structural(format!(
                "node {} has no children wired; call add_children first",
                nid
            )));
        }
        Ok(())
    }

    /// Demote `nid` to a `LeafNode` with scalar value `value`, clearing any
    /// children it had.
    pub fn set_leaf(&mut self, nid: usize, value: L) -> Result<()> {
        self.check_nid(nid)?;
        self.node_type[nid] = NodeType::LeafNode;
        self.left_child[nid] = -1;
        self.right_child[nid] = -1;
        self.leaf_value[nid] = value;
        Ok(())
    }

    /// Demote `nid` to a `LeafNode` carrying a vector output. Appends
    /// `values` to the leaf-vector pool.
    pub fn set_leaf_vector(&mut self, nid: usize, values: &[L]) -> Result<()> {
        self.check_nid(nid)?;
        self.node_type[nid] = NodeType::LeafNode;
        self.left_child[nid] = -1;
        self.right_child[nid] = -1;

        let begin = self.leaf_vector.len() as u32;
        self.leaf_vector.extend_from_slice(values);
        let end = self.leaf_vector.len() as u32;
        self.leaf_vector_begin[nid] = begin;
        self.leaf_vector_end[nid] = end;
        Ok(())
    }

    pub fn set_gain(&mut self, nid: usize, gain: f64) -> Result<()> {
        self.check_nid(nid)?;
        self.gain[nid] = OptionalStat {
            value: gain,
            present: true,
        };
        Ok(())
    }

    pub fn set_data_count(&mut self, nid: usize, count: u64) -> Result<()> {
        self.check_nid(nid)?;
        self.data_count[nid] = OptionalStat {
            value: count,
            present: true,
        };
        Ok(())
    }

    pub fn set_sum_hess(&mut self, nid: usize, sum_hess: f64) -> Result<()> {
        self.check_nid(nid)?;
        self.sum_hess[nid] = OptionalStat {
            value: sum_hess,
            present: true,
        };
        Ok(())
    }

    /// Verify the tree's structural invariants: every node is reachable
    /// from the root exactly once (no orphans, no cycles, no shared
    /// parents), leaves have no children, internal nodes have two in-range
    /// children, and pool offsets are monotonic and in range.
    pub fn validate_structure(&self) -> Result<()> {
        let n = self.num_nodes();
        if n == 0 {
            return Err(Error::Structural("tree has no nodes".into()));
        }

        let mut visited = vec![false; n];
        let mut parent_count = vec![0u32; n];
        let mut stack = vec![0usize];
        let mut order = Vec::with_capacity(n);
        while let Some(nid) = stack.pop() {
            if visited[nid] {
                return Err(Error::Structural(format!(
                    "node {} is reachable via more than one path (cycle or shared parent)",
                    nid
                )));
            }
            visited[nid] = true;
            order.push(nid);

            if self.is_leaf(nid) {
                if self.left_child[nid] != -1 || self.right_child[nid] != -1 {
                    return Err(Error::Structural(format!(
                        "leaf node {} has a non-(-1) child",
                        nid
                    )));
                }
            } else {
                let l = self.left_child[nid];
                let r = self.right_child[nid];
                if l < 0 || r < 0 || l as usize >= n || r as usize >= n {
                    return Err(Error::Structural(format!(
                        "internal node {} has an out-of-range child ({}, {})",
                        nid, l, r
                    )));
                }
                parent_count[l as usize] += 1;
                parent_count[r as usize] += 1;
                stack.push(l as usize);
                stack.push(r as usize);
            }
        }

        if order.len() != n {
            let orphans: Vec<usize> = (0..n).filter(|&i| !visited[i]).collect();
            return Err(Error::Structural(format!(
                "tree has {} orphaned node(s) unreachable from the root: {:?}",
                orphans.len(),
                orphans
            )));
        }
        if parent_count[0] != 0 {
            return Err(Error::Structural(
                "root node is referenced as a child of another node".into(),
            ));
        }
        for (nid, &count) in parent_count.iter().enumerate().skip(1) {
            if count != 1 {
                return Err(Error::Structural(format!(
                    "node {} has {} parents, expected exactly 1",
                    nid, count
                )));
            }
        }

        for nid in 0..n {
            let (b, e) = (self.leaf_vector_begin[nid], self.leaf_vector_end[nid]);
            if e < b || e as usize > self.leaf_vector.len() {
                return Err(Error::Structural(format!(
                    "node {} has an invalid leaf-vector pool extent [{}, {})",
                    nid, b, e
                )));
            }
            let (b, e) = (self.category_list_begin[nid], self.category_list_end[nid]);
            if e < b || e as usize > self.category_list.len() {
                return Err(Error::Structural(format!(
                    "node {} has an invalid category-list pool extent [{}, {})",
                    nid, b, e
                )));
            }
        }

        Ok(())
    }

    // -- accessors used by the serializer and JSON dump (column views) --

    pub(crate) fn node_type_col(&self) -> &[NodeType] {
        &self.node_type
    }
    pub(crate) fn left_child_col(&self) -> &[i32] {
        &self.left_child
    }
    pub(crate) fn right_child_col(&self) -> &[i32] {
        &self.right_child
    }
    pub(crate) fn split_feature_index_col(&self) -> &[u32] {
        &self.split_feature_index
    }
    pub(crate) fn default_left_col(&self) -> &[bool] {
        &self.default_left
    }
    pub(crate) fn threshold_col(&self) -> &[T] {
        &self.threshold
    }
    pub(crate) fn comparison_op_col(&self) -> &[Operator] {
        &self.comparison_op
    }
    pub(crate) fn category_list_right_child_col(&self) -> &[bool] {
        &self.category_list_right_child
    }
    pub(crate) fn leaf_value_col(&self) -> &[L] {
        &self.leaf_value
    }
    pub(crate) fn leaf_vector_pool(&self) -> (&[L], &[u32], &[u32]) {
        (&self.leaf_vector, &self.leaf_vector_begin, &self.leaf_vector_end)
    }
    pub(crate) fn category_list_pool(&self) -> (&[u32], &[u32], &[u32]) {
        (&self.category_list, &self.category_list_begin, &self.category_list_end)
    }
    pub(crate) fn stat_cols(
        &self,
    ) -> (&[OptionalStat<u64>], &[OptionalStat<f64>], &[OptionalStat<f64>]) {
        (&self.data_count, &self.sum_hess, &self.gain)
    }

    /// Reconstruct a tree directly from its columns (used by the
    /// deserializer). No validation is performed here; callers must run
    /// [`Tree::validate_structure`] afterwards.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_columns(
        node_type: Vec<NodeType>,
        left_child: Vec<i32>,
        right_child: Vec<i32>,
        split_feature_index: Vec<u32>,
        default_left: Vec<bool>,
        threshold: Vec<T>,
        comparison_op: Vec<Operator>,
        category_list_right_child: Vec<bool>,
        leaf_value: Vec<L>,
        leaf_vector: Vec<L>,
        leaf_vector_begin: Vec<u32>,
        leaf_vector_end: Vec<u32>,
        category_list: Vec<u32>,
        category_list_begin: Vec<u32>,
        category_list_end: Vec<u32>,
        data_count: Vec<OptionalStat<u64>>,
        sum_hess: Vec<OptionalStat<f64>>,
        gain: Vec<OptionalStat<f64>>,
        has_categorical_split: bool,
    ) -> Self {
        Tree {
            node_type,
            left_child,
            right_child,
            split_feature_index,
            default_left,
            threshold,
            comparison_op,
            category_list_right_child,
            leaf_value,
            leaf_vector,
            leaf_vector_begin,
            leaf_vector_end,
            category_list,
            category_list_begin,
            category_list_end,
            data_count,
            sum_hess,
            gain,
            has_categorical_split,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tree_is_a_single_leaf() {
        let tree: Tree<f32, f32> = Tree::new();
        assert_eq!(tree.num_nodes(), 1);
        assert!(tree.is_leaf(0));
        assert_eq!(tree.leaf_value(0), 0.0);
        tree.validate_structure().unwrap();
    }

    #[test]
    fn add_children_then_numerical_split() {
        let mut tree: Tree<f32, f32> = Tree::new();
        let (l, r) = tree.add_children(0).unwrap();
        tree.set_numerical_split(0, 3, 0.5, true, Operator::LT).unwrap();
        tree.set_leaf(l, 1.0).unwrap();
        tree.set_leaf(r, 2.0).unwrap();
        tree.validate_structure().unwrap();
        assert_eq!(tree.split_feature_index(0), 3);
        assert_eq!(tree.left_child(0), l as i32);
        assert_eq!(tree.right_child(0), r as i32);
    }

    #[test]
    fn categorical_split_sorts_and_dedups() {
        let mut tree: Tree<f32, f32> = Tree::new();
        let (l, r) = tree.add_children(0).unwrap();
        tree.set_categorical_split(0, 0, false, vec![5, 2, 7, 2], true)
            .unwrap();
        tree.set_leaf(l, 0.0).unwrap();
        tree.set_leaf(r, 1.0).unwrap();
        assert_eq!(tree.category_list(0), &[2, 5, 7]);
        assert!(tree.has_categorical_split());
    }

    #[test]
    fn orphan_node_fails_validation() {
        let mut tree: Tree<f32, f32> = Tree::new();
        // Allocate an extra node but never wire it in.
        tree.alloc_node();
        assert!(tree.validate_structure().is_err());
    }

    #[test]
    fn out_of_range_feature_index_is_rejected() {
        let mut tree: Tree<f32, f32> = Tree::new();
        tree.add_children(0).unwrap();
        let err = tree
            .set_numerical_split(0, MAX_FEATURE_INDEX + 1, 0.0, true, Operator::LT)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn leaf_vector_defaults_to_empty() {
        let tree: Tree<f32, f32> = Tree::new();
        assert!(!tree.has_leaf_vector(0));
        assert!(tree.leaf_vector(0).is_empty());
    }
}

//! The model-builder state machine.
//!
//! `ModelBuilder<T, L>` is the statically-typed engine: Rust's generics
//! already give the strongest possible form of type discipline
//! (`leaf_vector(Vec<f32>)` on an `f64` builder is a compile error, not
//! a runtime check). [`Builder`] is the dynamically-typed entry point a
//! front-end loader uses when the `(ThresholdT, LeafOutputT)` pair is only
//! known at runtime (from a `TypeInfo` tag read out of a file); it performs
//! the "mismatched pairs fail at construction time" check and then
//! delegates to a `ModelBuilder`.
//!
//! User-chosen node identifiers (`NodeKey`) are mapped to internal dense
//! ids: children are recorded by key while a tree is open and rewritten to
//! `[0, num_nodes)` ids in [`ModelBuilder::end_tree`].

use crate::error::{Error, Result};
use crate::model::{Model, ModelData, ModelParam};
use crate::tree::Tree;
use crate::typeinfo::{LeafOutputType, Operator, TaskType, ThresholdType, TypeInfo};
use hashbrown::HashMap;
use serde::Deserialize;

/// A caller-chosen node identifier. May be sparse and in any order.
pub type NodeKey = i64;

/// Ensemble-wide metadata validated before any tree is built.
#[derive(Clone, Debug)]
pub struct ModelMetadata {
    pub num_feature: i32,
    pub task_type: TaskType,
    pub average_tree_output: bool,
    pub num_target: u32,
    pub num_class: Vec<u32>,
    pub leaf_vector_shape: [u32; 2],
    pub postprocessor: String,
    /// `{"sigmoid_alpha": f32}` or `{"ratio_c": f32}`, or `None`.
    pub postprocessor_config: Option<serde_json::Value>,
    pub base_scores: Vec<f64>,
    pub attributes: String,
}

#[derive(Deserialize)]
struct SigmoidConfig {
    sigmoid_alpha: Option<f32>,
}

#[derive(Deserialize)]
struct RatioConfig {
    ratio_c: Option<f32>,
}

fn validate_metadata(meta: &ModelMetadata) -> Result<(f32, f32)> {
    if meta.num_target == 0 {
        return Err(Error::Validation("num_target must be >= 1".into()));
    }
    if meta.num_class.len() != meta.num_target as usize {
        return Err(Error::Validation(format!(
            "num_class has length {} but num_target is {}",
            meta.num_class.len(),
            meta.num_target
        )));
    }
    if meta.num_class.iter().any(|&c| c == 0) {
        return Err(Error::Validation("every num_class entry must be >= 1".into()));
    }
    let max_num_class = meta.num_class.iter().copied().max().unwrap();

    let [shape0, shape1] = meta.leaf_vector_shape;
    if shape0 != 1 && shape0 != meta.num_target {
        return Err(Error::Validation(format!(
            "leaf_vector_shape[0] = {} must be 1 or num_target ({})",
            shape0, meta.num_target
        )));
    }
    if shape1 != 1 && shape1 != max_num_class {
        return Err(Error::Validation(format!(
            "leaf_vector_shape[1] = {} must be 1 or max(num_class) ({})",
            shape1, max_num_class
        )));
    }

    let expected_base_scores = if max_num_class == 1 {
        meta.num_target as usize
    } else {
        meta.num_target as usize * max_num_class as usize
    };
    if meta.base_scores.len() != expected_base_scores {
        return Err(Error::Validation(format!(
            "base_scores has length {} but expected {}",
            meta.base_scores.len(),
            expected_base_scores
        )));
    }

    let mut sigmoid_alpha = 1.0f32;
    let mut ratio_c = 1.0f32;
    if let Some(cfg) = &meta.postprocessor_config {
        match meta.postprocessor.as_str() {
            "sigmoid" => {
                let parsed: SigmoidConfig = serde_json::from_value(cfg.clone())?;
                if let Some(a) = parsed.sigmoid_alpha {
                    sigmoid_alpha = a;
                }
            }
            "exponential_standard_ratio" => {
                let parsed: RatioConfig = serde_json::from_value(cfg.clone())?;
                if let Some(c) = parsed.ratio_c {
                    ratio_c = c;
                }
            }
            _ => {}
        }
    }

    crate::postprocess::lookup(&meta.postprocessor)
        .ok_or_else(|| Error::UnknownIdentifier(format!("unknown postprocessor '{}'", meta.postprocessor)))?;

    Ok((sigmoid_alpha, ratio_c))
}

fn validate_tree_annotation(
    meta: &ModelMetadata,
    target_id: i32,
    class_id: i32,
) -> Result<()> {
    if target_id != -1 && (target_id < 0 || target_id as u32 >= meta.num_target) {
        return Err(Error::Validation(format!(
            "target_id {} out of range [0, {})",
            target_id, meta.num_target
        )));
    }
    if class_id != -1 {
        if class_id < 0 {
            return Err(Error::Validation(format!("class_id {} is negative", class_id)));
        }
        if target_id >= 0 {
            let num_class = meta.num_class[target_id as usize];
            if class_id as u32 >= num_class {
                return Err(Error::Validation(format!(
                    "class_id {} out of range [0, {}) for target {}",
                    class_id, num_class, target_id
                )));
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuilderState {
    ExpectTree,
    ExpectNode,
    ExpectDetail,
    NodeComplete,
    ModelComplete,
}

impl BuilderState {
    fn name(self) -> &'static str {
        match self {
            BuilderState::ExpectTree => "ExpectTree",
            BuilderState::ExpectNode => "ExpectNode",
            BuilderState::ExpectDetail => "ExpectDetail",
            BuilderState::NodeComplete => "NodeComplete",
            BuilderState::ModelComplete => "ModelComplete",
        }
    }
}

enum PendingDetail<T, L> {
    LeafScalar(L),
    LeafVector(Vec<L>),
    Numerical {
        left_key: NodeKey,
        right_key: NodeKey,
        feature: u32,
        threshold: T,
        default_left: bool,
        op: Operator,
    },
    Categorical {
        left_key: NodeKey,
        right_key: NodeKey,
        feature: u32,
        default_left: bool,
        categories: Vec<u32>,
        list_is_right_child: bool,
    },
}

/// The statically-typed model builder. See the module docs.
pub struct ModelBuilder<T: ThresholdType, L: LeafOutputType> {
    state: BuilderState,
    metadata: ModelMetadata,
    sigmoid_alpha: f32,
    ratio_c: f32,
    expected_num_tree: usize,

    trees: Vec<Tree<T, L>>,
    target_ids: Vec<i32>,
    class_ids: Vec<i32>,

    // In-progress tree state.
    cur_tree: Tree<T, L>,
    key_to_id: HashMap<NodeKey, usize>,
    node_details: Vec<Option<PendingDetail<T, L>>>,
    leaf_is_vector: Option<bool>,
    cur_tree_target_id: i32,
    cur_tree_class_id: i32,

    // In-progress node state.
    cur_node: Option<usize>,
}

impl<T: ThresholdType, L: LeafOutputType> ModelBuilder<T, L> {
    /// Validate `metadata` and create an empty builder expecting exactly
    /// `expected_num_tree` trees. Fails with `ValidationError` if metadata
    /// is self-contradictory, or `UnknownIdentifier` if `postprocessor` is
    /// not in the post-processor catalog.
    pub fn new(metadata: ModelMetadata, expected_num_tree: usize) -> Result<Self> {
        let (sigmoid_alpha, ratio_c) = validate_metadata(&metadata)?;
        Ok(ModelBuilder {
            state: BuilderState::ExpectTree,
            metadata,
            sigmoid_alpha,
            ratio_c,
            expected_num_tree,
            trees: Vec::new(),
            target_ids: Vec::new(),
            class_ids: Vec::new(),
            cur_tree: Tree::new(),
            key_to_id: HashMap::new(),
            node_details: Vec::new(),
            leaf_is_vector: None,
            cur_tree_target_id: -1,
            cur_tree_class_id: -1,
            cur_node: None,
        })
    }

    fn illegal(&self, call: &str) -> Error {
        Error::BuilderState(format!(
            "call `{}` is illegal in state {}",
            call,
            self.state.name()
        ))
    }

    /// Begin a new tree annotated with `(target_id, class_id)` (`-1` for
    /// "applies to all"). Legal only in `ExpectTree`.
    pub fn start_tree(&mut self, target_id: i32, class_id: i32) -> Result<()> {
        if self.state != BuilderState::ExpectTree {
            return Err(self.illegal("start_tree"));
        }
        validate_tree_annotation(&self.metadata, target_id, class_id)?;
        self.cur_tree = Tree::new();
        self.cur_tree_target_id = target_id;
        self.cur_tree_class_id = class_id;
        self.key_to_id.clear();
        self.node_details.clear();
        self.leaf_is_vector = None;
        self.state = BuilderState::ExpectNode;
        Ok(())
    }

    /// Register `key` as the next node of the current tree. Legal only in
    /// `ExpectNode`.
    pub fn start_node(&mut self, key: NodeKey) -> Result<()> {
        if self.state != BuilderState::ExpectNode {
            return Err(self.illegal("start_node"));
        }
        if self.key_to_id.contains_key(&key) {
            return Err(Error::Validation(format!(
                "node key {} is already registered in this tree",
                key
            )));
        }
        let nid = if self.node_details.is_empty() {
            // The tree starts as a 1-node arena from `Tree::new()`; reuse node 0
            // for the first `start_node` call instead of allocating a second one.
            0
        } else {
            self.cur_tree.alloc_node()
        };
        self.key_to_id.insert(key, nid);
        self.node_details.push(None);
        self.cur_node = Some(nid);
        self.state = BuilderState::ExpectDetail;
        Ok(())
    }

    fn take_detail_slot(&mut self) -> Result<(usize, &mut Option<PendingDetail<T, L>>)> {
        let nid = self.cur_node.expect("ExpectDetail/NodeComplete imply cur_node is set");
        // `node_details` is pushed once per `start_node` call in the same order
        // node ids are allocated, so the node id always doubles as its index.
        Ok((nid, &mut self.node_details[nid]))
    }

    /// Finalize the current node as a scalar-valued leaf. Fails if the
    /// model's `leaf_vector_shape != [1, 1]`, or if an earlier leaf in this
    /// tree was a vector leaf (every leaf in one tree must agree on scalar
    /// vs. vector kind).
    pub fn leaf_scalar(&mut self, value: L) -> Result<()> {
        if self.state != BuilderState::ExpectDetail {
            return Err(self.illegal("leaf_scalar"));
        }
        if self.metadata.leaf_vector_shape != [1, 1] {
            return Err(Error::Validation(
                "leaf_scalar requires leaf_vector_shape == [1, 1]".into(),
            ));
        }
        if self.leaf_is_vector == Some(true) {
            return Err(Error::Validation(
                "tree mixes scalar and vector leaves".into(),
            ));
        }
        self.leaf_is_vector = Some(false);
        let (_, slot) = self.take_detail_slot()?;
        *slot = Some(PendingDetail::LeafScalar(value));
        self.state = BuilderState::NodeComplete;
        Ok(())
    }

    /// Finalize the current node as a vector-valued leaf. Fails unless
    /// `values.len() == leaf_vector_shape[0] * leaf_vector_shape[1]`, or if
    /// an earlier leaf in this tree was scalar.
    pub fn leaf_vector(&mut self, values: Vec<L>) -> Result<()> {
        if self.state != BuilderState::ExpectDetail {
            return Err(self.illegal("leaf_vector"));
        }
        let expected =
            self.metadata.leaf_vector_shape[0] as usize * self.metadata.leaf_vector_shape[1] as usize;
        if values.len() != expected {
            return Err(Error::Validation(format!(
                "leaf_vector has {} values, expected {}",
                values.len(),
                expected
            )));
        }
        if self.leaf_is_vector == Some(false) {
            return Err(Error::Validation(
                "tree mixes scalar and vector leaves".into(),
            ));
        }
        self.leaf_is_vector = Some(true);
        let (_, slot) = self.take_detail_slot()?;
        *slot = Some(PendingDetail::LeafVector(values));
        self.state = BuilderState::NodeComplete;
        Ok(())
    }

    /// Finalize the current node as a `NumericalTestNode`. `left_key` /
    /// `right_key` are resolved to internal ids in [`Self::end_tree`].
    #[allow(clippy::too_many_arguments)]
    pub fn numerical_test(
        &mut self,
        feature: u32,
        threshold: T,
        default_left: bool,
        op: Operator,
        left_key: NodeKey,
        right_key: NodeKey,
    ) -> Result<()> {
        if self.state != BuilderState::ExpectDetail {
            return Err(self.illegal("numerical_test"));
        }
        if feature > crate::tree::MAX_FEATURE_INDEX {
            return Err(Error::Validation(format!(
                "feature index {} exceeds the maximum of {}",
                feature,
                crate::tree::MAX_FEATURE_INDEX
            )));
        }
        let (_, slot) = self.take_detail_slot()?;
        *slot = Some(PendingDetail::Numerical {
            left_key,
            right_key,
            feature,
            threshold,
            default_left,
            op,
        });
        self.state = BuilderState::NodeComplete;
        Ok(())
    }

    /// Finalize the current node as a `CategoricalTestNode`.
    #[allow(clippy::too_many_arguments)]
    pub fn categorical_test(
        &mut self,
        feature: u32,
        default_left: bool,
        categories: Vec<u32>,
        list_is_right_child: bool,
        left_key: NodeKey,
        right_key: NodeKey,
    ) -> Result<()> {
        if self.state != BuilderState::ExpectDetail {
            return Err(self.illegal("categorical_test"));
        }
        if feature > crate::tree::MAX_FEATURE_INDEX {
            return Err(Error::Validation(format!(
                "feature index {} exceeds the maximum of {}",
                feature,
                crate::tree::MAX_FEATURE_INDEX
            )));
        }
        let (_, slot) = self.take_detail_slot()?;
        *slot = Some(PendingDetail::Categorical {
            left_key,
            right_key,
            feature,
            default_left,
            categories,
            list_is_right_child,
        });
        self.state = BuilderState::NodeComplete;
        Ok(())
    }

    /// Record the node's split gain. Legal in `ExpectDetail` or
    /// `NodeComplete` (i.e. before or after the detail call).
    pub fn set_gain(&mut self, gain: f64) -> Result<()> {
        self.require_detail_or_complete("set_gain")?;
        let nid = self.cur_node.unwrap();
        self.cur_tree.set_gain(nid, gain)
    }

    /// Record the node's training sample count.
    pub fn set_data_count(&mut self, count: u64) -> Result<()> {
        self.require_detail_or_complete("set_data_count")?;
        let nid = self.cur_node.unwrap();
        self.cur_tree.set_data_count(nid, count)
    }

    /// Record the node's sum of Hessians.
    pub fn set_sum_hess(&mut self, sum_hess: f64) -> Result<()> {
        self.require_detail_or_complete("set_sum_hess")?;
        let nid = self.cur_node.unwrap();
        self.cur_tree.set_sum_hess(nid, sum_hess)
    }

    fn require_detail_or_complete(&self, call: &str) -> Result<()> {
        match self.state {
            BuilderState::ExpectDetail | BuilderState::NodeComplete => Ok(()),
            _ => Err(self.illegal(call)),
        }
    }

    /// Close the current node. Legal only in `NodeComplete`.
    pub fn end_node(&mut self) -> Result<()> {
        if self.state != BuilderState::NodeComplete {
            return Err(self.illegal("end_node"));
        }
        self.cur_node = None;
        self.state = BuilderState::ExpectNode;
        Ok(())
    }

    /// Close the current tree: resolve every child `NodeKey` to its
    /// internal id, apply every node's detail, and verify the tree has no
    /// orphaned nodes and no cycles. Legal only in `ExpectNode` (i.e. after
    /// the last node has been ended).
    pub fn end_tree(&mut self) -> Result<()> {
        if self.state != BuilderState::ExpectNode {
            return Err(self.illegal("end_tree"));
        }

        let details = std::mem::take(&mut self.node_details);
        for (nid, detail) in details.into_iter().enumerate() {
            match detail.expect("every allocated node must have a detail by end_tree") {
                PendingDetail::LeafScalar(v) => {
                    self.cur_tree.set_leaf(nid, v)?;
                }
                PendingDetail::LeafVector(vals) => {
                    self.cur_tree.set_leaf_vector(nid, &vals)?;
                }
                PendingDetail::Numerical {
                    left_key,
                    right_key,
                    feature,
                    threshold,
                    default_left,
                    op,
                } => {
                    let left = self.resolve_key(left_key)?;
                    let right = self.resolve_key(right_key)?;
                    self.cur_tree.wire_children_raw(nid, left, right);
                    self.cur_tree
                        .set_numerical_split(nid, feature, threshold, default_left, op)?;
                }
                PendingDetail::Categorical {
                    left_key,
                    right_key,
                    feature,
                    default_left,
                    categories,
                    list_is_right_child,
                } => {
                    let left = self.resolve_key(left_key)?;
                    let right = self.resolve_key(right_key)?;
                    self.cur_tree.wire_children_raw(nid, left, right);
                    self.cur_tree.set_categorical_split(
                        nid,
                        feature,
                        default_left,
                        categories,
                        list_is_right_child,
                    )?;
                }
            }
        }

        self.cur_tree.validate_structure()?;

        let finished = std::mem::replace(&mut self.cur_tree, Tree::new());
        self.trees.push(finished);
        self.target_ids.push(self.cur_tree_target_id);
        self.class_ids.push(self.cur_tree_class_id);
        self.state = BuilderState::ExpectTree;
        Ok(())
    }

    fn resolve_key(&self, key: NodeKey) -> Result<usize> {
        self.key_to_id.get(&key).copied().ok_or_else(|| {
            Error::Structural(format!(
                "node key {} is referenced as a child but was never started",
                key
            ))
        })
    }

    /// Finish the model. Requires exactly `expected_num_tree` trees to have
    /// been built. Legal only in `ExpectTree`.
    pub fn commit_model(mut self) -> Result<ModelData<T, L>> {
        if self.state != BuilderState::ExpectTree {
            return Err(self.illegal("commit_model"));
        }
        if self.trees.len() != self.expected_num_tree {
            return Err(Error::Validation(format!(
                "expected {} trees, got {}",
                self.expected_num_tree,
                self.trees.len()
            )));
        }
        self.state = BuilderState::ModelComplete;
        let param = ModelParam {
            num_feature: self.metadata.num_feature,
            task_type: self.metadata.task_type,
            average_tree_output: self.metadata.average_tree_output,
            num_target: self.metadata.num_target,
            num_class: self.metadata.num_class.clone(),
            leaf_vector_shape: self.metadata.leaf_vector_shape,
            postprocessor: self.metadata.postprocessor.clone(),
            sigmoid_alpha: self.sigmoid_alpha,
            ratio_c: self.ratio_c,
            base_scores: self.metadata.base_scores.clone(),
            attributes: self.metadata.attributes.clone(),
            version: crate::serialize::CURRENT_VERSION,
        };
        Ok(ModelData {
            param,
            trees: self.trees,
            target_id: self.target_ids,
            class_id: self.class_ids,
        })
    }
}

/// The dynamically-typed entry point: picks a `ModelBuilder<f32, f32>` or
/// `ModelBuilder<f64, f64>` from a runtime [`TypeInfo`] pair, rejecting
/// every other pair with `TypeMismatch`.
pub enum Builder {
    F32(ModelBuilder<f32, f32>),
    F64(ModelBuilder<f64, f64>),
}

impl Builder {
    pub fn new(
        threshold_type: TypeInfo,
        leaf_output_type: TypeInfo,
        metadata: ModelMetadata,
        expected_num_tree: usize,
    ) -> Result<Self> {
        match (threshold_type, leaf_output_type) {
            (TypeInfo::Float32, TypeInfo::Float32) => {
                Ok(Builder::F32(ModelBuilder::new(metadata, expected_num_tree)?))
            }
            (TypeInfo::Float64, TypeInfo::Float64) => {
                Ok(Builder::F64(ModelBuilder::new(metadata, expected_num_tree)?))
            }
            (t, l) => Err(Error::TypeMismatch(format!(
                "(threshold={}, leaf_output={}) is not a constructible pair; only \
                 (float32, float32) and (float64, float64) are",
                t, l
            ))),
        }
    }

    pub fn start_tree(&mut self, target_id: i32, class_id: i32) -> Result<()> {
        match self {
            Builder::F32(b) => b.start_tree(target_id, class_id),
            Builder::F64(b) => b.start_tree(target_id, class_id),
        }
    }

    pub fn start_node(&mut self, key: NodeKey) -> Result<()> {
        match self {
            Builder::F32(b) => b.start_node(key),
            Builder::F64(b) => b.start_node(key),
        }
    }

    pub fn leaf_scalar(&mut self, value: f64) -> Result<()> {
        match self {
            Builder::F32(b) => b.leaf_scalar(value as f32),
            Builder::F64(b) => b.leaf_scalar(value),
        }
    }

    pub fn leaf_vector(&mut self, values: &[f64]) -> Result<()> {
        match self {
            Builder::F32(b) => b.leaf_vector(values.iter().map(|&v| v as f32).collect()),
            Builder::F64(b) => b.leaf_vector(values.to_vec()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn numerical_test(
        &mut self,
        feature: u32,
        threshold: f64,
        default_left: bool,
        op: Operator,
        left_key: NodeKey,
        right_key: NodeKey,
    ) -> Result<()> {
        match self {
            Builder::F32(b) => {
                b.numerical_test(feature, threshold as f32, default_left, op, left_key, right_key)
            }
            Builder::F64(b) => b.numerical_test(feature, threshold, default_left, op, left_key, right_key),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn categorical_test(
        &mut self,
        feature: u32,
        default_left: bool,
        categories: Vec<u32>,
        list_is_right_child: bool,
        left_key: NodeKey,
        right_key: NodeKey,
    ) -> Result<()> {
        match self {
            Builder::F32(b) => {
                b.categorical_test(feature, default_left, categories, list_is_right_child, left_key, right_key)
            }
            Builder::F64(b) => {
                b.categorical_test(feature, default_left, categories, list_is_right_child, left_key, right_key)
            }
        }
    }

    pub fn set_gain(&mut self, gain: f64) -> Result<()> {
        match self {
            Builder::F32(b) => b.set_gain(gain),
            Builder::F64(b) => b.set_gain(gain),
        }
    }

    pub fn set_data_count(&mut self, count: u64) -> Result<()> {
        match self {
            Builder::F32(b) => b.set_data_count(count),
            Builder::F64(b) => b.set_data_count(count),
        }
    }

    pub fn set_sum_hess(&mut self, sum_hess: f64) -> Result<()> {
        match self {
            Builder::F32(b) => b.set_sum_hess(sum_hess),
            Builder::F64(b) => b.set_sum_hess(sum_hess),
        }
    }

    pub fn end_node(&mut self) -> Result<()> {
        match self {
            Builder::F32(b) => b.end_node(),
            Builder::F64(b) => b.end_node(),
        }
    }

    pub fn end_tree(&mut self) -> Result<()> {
        match self {
            Builder::F32(b) => b.end_tree(),
            Builder::F64(b) => b.end_tree(),
        }
    }

    pub fn commit_model(self) -> Result<Model> {
        match self {
            Builder::F32(b) => Ok(Model::F32(b.commit_model()?)),
            Builder::F64(b) => Ok(Model::F64(b.commit_model()?)),
        }
    }
}

/// Concatenate several models built with identical metadata into one,
/// appending their trees in order.
pub fn concatenate(models: Vec<Model>) -> Result<Model> {
    if models.is_empty() {
        return Err(Error::Validation("concatenate requires at least one model".into()));
    }

    fn merge<T: ThresholdType, L: LeafOutputType>(
        mut parts: Vec<ModelData<T, L>>,
    ) -> Result<ModelData<T, L>> {
        let first = &parts[0].param;
        for other in &parts[1..] {
            let p = &other.param;
            if p.num_feature != first.num_feature
                || p.task_type != first.task_type
                || p.num_target != first.num_target
                || p.num_class != first.num_class
                || p.leaf_vector_shape != first.leaf_vector_shape
                || p.postprocessor != first.postprocessor
                || p.sigmoid_alpha != first.sigmoid_alpha
                || p.ratio_c != first.ratio_c
                || p.base_scores != first.base_scores
                || p.average_tree_output != first.average_tree_output
            {
                return Err(Error::Validation(
                    "models being concatenated must share task, target/class shape, \
                     postprocessor, and base_scores"
                        .into(),
                ));
            }
        }

        let mut merged = parts.remove(0);
        for mut other in parts {
            merged.trees.append(&mut other.trees);
            merged.target_id.append(&mut other.target_id);
            merged.class_id.append(&mut other.class_id);
        }
        Ok(merged)
    }

    let first_threshold = models[0].threshold_type();
    let first_leaf = models[0].leaf_output_type();
    for m in &models[1..] {
        if m.threshold_type() != first_threshold || m.leaf_output_type() != first_leaf {
            return Err(Error::TypeMismatch(
                "all models being concatenated must share the same (threshold, leaf) type pair".into(),
            ));
        }
    }

    match first_threshold {
        TypeInfo::Float32 => {
            let parts = models
                .into_iter()
                .map(|m| match m {
                    Model::F32(d) => d,
                    Model::F64(_) => unreachable!("type pair already checked"),
                })
                .collect();
            Ok(Model::F32(merge(parts)?))
        }
        TypeInfo::Float64 => {
            let parts = models
                .into_iter()
                .map(|m| match m {
                    Model::F64(d) => d,
                    Model::F32(_) => unreachable!("type pair already checked"),
                })
                .collect();
            Ok(Model::F64(merge(parts)?))
        }
        TypeInfo::UInt32 => unreachable!("no Model variant is ever tagged UInt32"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ModelMetadata {
        ModelMetadata {
            num_feature: 2,
            task_type: TaskType::Regressor,
            average_tree_output: false,
            num_target: 1,
            num_class: vec![1],
            leaf_vector_shape: [1, 1],
            postprocessor: "identity".to_string(),
            postprocessor_config: None,
            base_scores: vec![0.0],
            attributes: String::new(),
        }
    }

    #[test]
    fn happy_path_builds_a_stump() {
        let mut b = Builder::new(TypeInfo::Float32, TypeInfo::Float32, metadata(), 1).unwrap();
        b.start_tree(0, 0).unwrap();
        b.start_node(0).unwrap();
        b.numerical_test(0, 0.0, true, Operator::LT, 1, 2).unwrap();
        b.end_node().unwrap();
        b.start_node(1).unwrap();
        b.leaf_scalar(1.0).unwrap();
        b.end_node().unwrap();
        b.start_node(2).unwrap();
        b.leaf_scalar(2.0).unwrap();
        b.end_node().unwrap();
        b.end_tree().unwrap();
        let model = b.commit_model().unwrap();
        assert_eq!(model.num_tree(), 1);
    }

    #[test]
    fn illegal_call_in_wrong_state_is_rejected() {
        let mut b = Builder::new(TypeInfo::Float32, TypeInfo::Float32, metadata(), 1).unwrap();
        // start_node before start_tree.
        assert!(matches!(b.start_node(0), Err(Error::BuilderState(_))));
    }

    #[test]
    fn orphan_node_rejected_at_end_tree() {
        let mut b = Builder::new(TypeInfo::Float32, TypeInfo::Float32, metadata(), 1).unwrap();
        b.start_tree(0, 0).unwrap();
        b.start_node(0).unwrap();
        b.leaf_scalar(1.0).unwrap();
        b.end_node().unwrap();
        // An extra node, never wired to the root.
        b.start_node(1).unwrap();
        b.leaf_scalar(2.0).unwrap();
        b.end_node().unwrap();
        assert!(matches!(b.end_tree(), Err(Error::Structural(_))));
    }

    #[test]
    fn unresolved_child_key_rejected_at_end_tree() {
        let mut b = Builder::new(TypeInfo::Float32, TypeInfo::Float32, metadata(), 1).unwrap();
        b.start_tree(0, 0).unwrap();
        b.start_node(0).unwrap();
        b.numerical_test(0, 0.0, true, Operator::LT, 1, 2).unwrap();
        b.end_node().unwrap();
        b.start_node(1).unwrap();
        b.leaf_scalar(1.0).unwrap();
        b.end_node().unwrap();
        // Node keyed 2 never started.
        assert!(matches!(b.end_tree(), Err(Error::Structural(_))));
    }

    #[test]
    fn leaf_shape_mismatch_rejected() {
        let mut b = Builder::new(TypeInfo::Float32, TypeInfo::Float32, metadata(), 1).unwrap();
        b.start_tree(0, 0).unwrap();
        b.start_node(0).unwrap();
        assert!(matches!(b.leaf_vector(&[1.0, 2.0]), Err(Error::Validation(_))));
    }

    #[test]
    fn mismatched_type_pair_rejected_at_construction() {
        let err = Builder::new(TypeInfo::Float32, TypeInfo::Float64, metadata(), 1).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
    }

    #[test]
    fn leaf_id_pair_is_disallowed_for_construction() {
        let err = Builder::new(TypeInfo::Float32, TypeInfo::UInt32, metadata(), 1);
        assert!(err.is_err());
    }

    #[test]
    fn commit_before_expected_tree_count_fails() {
        let b = Builder::new(TypeInfo::Float32, TypeInfo::Float32, metadata(), 2).unwrap();
        assert!(matches!(b.commit_model(), Err(Error::Validation(_))));
    }

    #[test]
    fn concatenate_preserves_dump() {
        let build_one = |val: f32| -> Model {
            let mut b = Builder::new(TypeInfo::Float32, TypeInfo::Float32, metadata(), 1).unwrap();
            b.start_tree(0, 0).unwrap();
            b.start_node(0).unwrap();
            b.leaf_scalar(val).unwrap();
            b.end_node().unwrap();
            b.end_tree().unwrap();
            b.commit_model().unwrap()
        };
        let m1 = build_one(1.0);
        let m2 = build_one(2.0);
        let combined = concatenate(vec![m1, m2]).unwrap();
        assert_eq!(combined.num_tree(), 2);
    }
}

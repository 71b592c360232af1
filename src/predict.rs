//! The prediction engine: parallel, NaN-aware tree traversal with
//! numerical and categorical splits, per-tree vs per-class/per-target
//! output routing, multiple prediction kinds, and post-processing.
//!
//! Row-parallelism is the only concurrency primitive here: each row is
//! evaluated independently by a `rayon` worker, with no cross-row
//! communication and no allocation inside the per-row traversal loop.

use crate::error::{Error, Result};
use crate::model::{Model, ModelData, ModelParam};
use crate::tree::Tree;
use crate::typeinfo::{LeafOutputType, NodeType, ThresholdType, TypeInfo};
use itertools::Itertools;
use rayon::prelude::*;
use serde::Deserialize;

/// The kind of prediction requested.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PredictKind {
    Default,
    Raw,
    LeafId,
    ScorePerTree,
}

impl PredictKind {
    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "default" => PredictKind::Default,
            "raw" => PredictKind::Raw,
            "leaf_id" => PredictKind::LeafId,
            "score_per_tree" => PredictKind::ScorePerTree,
            other => {
                return Err(Error::UnknownIdentifier(format!(
                    "unknown predict_type '{}'",
                    other
                )))
            }
        })
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfiguration {
    predict_type: Option<String>,
    nthread: Option<i32>,
}

/// Prediction configuration, parsed from `{"predict_type": "...",
/// "nthread": N}`.
#[derive(Copy, Clone, Debug)]
pub struct Configuration {
    pub pred_kind: PredictKind,
    /// `<= 0` means "use all available cores".
    pub nthread: i32,
}

impl Configuration {
    pub fn from_json(config_json: &str) -> Result<Self> {
        let raw: RawConfiguration = serde_json::from_str(config_json)?;
        Ok(Configuration {
            pred_kind: PredictKind::from_str(raw.predict_type.as_deref().unwrap_or("default"))?,
            nthread: raw.nthread.unwrap_or(0),
        })
    }
}

/// A row-major input matrix whose element type must match the model's
/// `LeafOutputT` (`InputT = LeafOutputT`); a mismatch is a `TypeMismatch`
/// error, never a silent cast.
pub enum Input<'a> {
    F32(&'a [f32]),
    F64(&'a [f64]),
}

impl<'a> Input<'a> {
    fn type_info(&self) -> TypeInfo {
        match self {
            Input::F32(_) => TypeInfo::Float32,
            Input::F64(_) => TypeInfo::Float64,
        }
    }
}

/// The result of a [`predict`] call. `leaf_id` predictions are node indices
/// (the reserved `(ThresholdT, u32)` output pair); every other kind
/// accumulates in `f64` regardless of the model's own type.
pub enum Output {
    Scores(Vec<f64>),
    LeafId(Vec<u32>),
}

/// Compute the output buffer shape for `num_row` rows of `model` under
/// `config`.
pub fn get_output_shape(model: &Model, num_row: u64, config: &Configuration) -> Result<Vec<u64>> {
    let param = model.param();
    let num_tree = model.num_tree() as u64;
    let max_num_class = param.max_num_class() as u64;
    let num_target = param.num_target as u64;

    Ok(match config.pred_kind {
        PredictKind::Default | PredictKind::Raw => {
            if num_target == 1 {
                vec![num_row, max_num_class]
            } else {
                vec![num_target, num_row, max_num_class]
            }
        }
        PredictKind::LeafId => vec![num_row, num_tree],
        PredictKind::ScorePerTree => vec![num_row, num_tree, per_tree_width(param) as u64],
    })
}

fn per_tree_width(param: &ModelParam) -> usize {
    if param.num_target == 1 {
        *param.num_class.first().unwrap_or(&1) as usize
    } else {
        param.max_num_class() as usize
    }
}

/// Run the ensemble in `model` over `input` (`num_row` rows of
/// `model.num_feature()` columns each, row-major), per `config`.
pub fn predict(model: &Model, input: Input, num_row: usize, config: &Configuration) -> Result<Output> {
    if input.type_info() != model.leaf_output_type() {
        return Err(Error::TypeMismatch(format!(
            "input element type {} does not match model leaf-output type {}",
            input.type_info(),
            model.leaf_output_type()
        )));
    }
    match (model, input) {
        (Model::F32(data), Input::F32(rows)) => predict_typed(data, rows, num_row, config),
        (Model::F64(data), Input::F64(rows)) => predict_typed(data, rows, num_row, config),
        _ => unreachable!("type check above already rejected any other combination"),
    }
}

/// Walk `tree` from the root for one `row` of `num_feature` values.
/// Returns the terminal leaf's node id. Fails with `Error::Structural` if
/// the walk exceeds `num_nodes` steps (a cycle) or references a feature
/// index past the end of `row`.
fn traverse<T, L>(tree: &Tree<T, L>, row: &[T]) -> Result<usize>
where
    T: ThresholdType + Into<f64>,
    L: LeafOutputType,
{
    let cap = tree.num_nodes();
    let mut nid = 0usize;
    for _ in 0..=cap {
        if tree.is_leaf(nid) {
            return Ok(nid);
        }
        let feature = tree.split_feature_index(nid) as usize;
        let f = *row.get(feature).ok_or_else(|| {
            Error::Validation(format!(
                "feature index {} is out of range for a row of {} values",
                feature,
                row.len()
            ))
        })?;

        nid = if f.is_nan() {
            if tree.default_left(nid) {
                tree.left_child(nid)
            } else {
                tree.right_child(nid)
            }
        } else {
            match tree.node_type_at(nid) {
                NodeType::NumericalTestNode => {
                    let cond = tree.comparison_op(nid).apply(f, tree.threshold(nid));
                    if cond {
                        tree.left_child(nid)
                    } else {
                        tree.right_child(nid)
                    }
                }
                NodeType::CategoricalTestNode => {
                    let f64v: f64 = f.into();
                    let max_exact = T::max_exact_integer().min(u32::MAX as f64);
                    let is_valid = f64v >= 0.0 && f64v <= max_exact && f64v.fract() == 0.0;
                    let matched = is_valid && {
                        let cat = f64v as u32;
                        tree.category_list(nid).binary_search(&cat).is_ok()
                    };
                    let list_is_right = tree.category_list_right_child(nid);
                    if matched == list_is_right {
                        tree.right_child(nid)
                    } else {
                        tree.left_child(nid)
                    }
                }
                NodeType::LeafNode => unreachable!("handled by tree.is_leaf above"),
            }
        } as usize;
    }
    Err(Error::Structural(format!(
        "tree traversal exceeded {} steps; the tree has a cycle",
        cap
    )))
}

/// Add a tree's leaf contribution at node `leaf_nid` into `acc` (one
/// `(num_target, max_num_class)` row-major accumulator per output row),
/// following the tree's `(target_id, class_id)` routing annotation.
fn accumulate<T, L>(
    tree: &Tree<T, L>,
    leaf_nid: usize,
    target_id: i32,
    class_id: i32,
    num_target: usize,
    max_num_class: usize,
    acc: &mut [f64],
    touched: &mut [u32],
) where
    T: ThresholdType,
    L: LeafOutputType + Into<f64>,
{
    let mut cell = |t: usize, c: usize, v: f64| {
        let idx = t * max_num_class + c;
        acc[idx] += v;
        touched[idx] += 1;
    };
    match (target_id, class_id) {
        (t, c) if t >= 0 && c >= 0 => {
            cell(t as usize, c as usize, tree.leaf_value(leaf_nid).into());
        }
        (t, -1) if t >= 0 => {
            for (c, &v) in tree.leaf_vector(leaf_nid).iter().enumerate() {
                cell(t as usize, c, v.into());
            }
        }
        (-1, c) if c >= 0 => {
            for (t, &v) in tree.leaf_vector(leaf_nid).iter().enumerate() {
                cell(t, c as usize, v.into());
            }
        }
        (-1, -1) => {
            let vec = tree.leaf_vector(leaf_nid);
            for t in 0..num_target {
                for c in 0..max_num_class {
                    let idx = t * max_num_class + c;
                    if idx < vec.len() {
                        cell(t, c, vec[idx].into());
                    }
                }
            }
        }
        _ => unreachable!("validated at builder time: class_id >= 0 implies target_id known"),
    }
}

fn predict_typed<T, L>(
    data: &ModelData<T, L>,
    input: &[T],
    num_row: usize,
    config: &Configuration,
) -> Result<Output>
where
    T: ThresholdType + Into<f64>,
    L: LeafOutputType + Into<f64>,
{
    let param = &data.param;
    let num_feature = param.num_feature as usize;
    if input.len() != num_row * num_feature {
        return Err(Error::Validation(format!(
            "input has {} values, expected num_row * num_feature = {} * {} = {}",
            input.len(),
            num_row,
            num_feature,
            num_row * num_feature
        )));
    }

    let run = || -> Result<Output> { run_predict(data, input, num_row, num_feature, config) };

    if config.nthread > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.nthread as usize)
            .build()
            .map_err(|e| Error::Validation(e.to_string()))?;
        pool.install(run)
    } else {
        run()
    }
}

fn run_predict<T, L>(
    data: &ModelData<T, L>,
    input: &[T],
    num_row: usize,
    num_feature: usize,
    config: &Configuration,
) -> Result<Output>
where
    T: ThresholdType + Into<f64>,
    L: LeafOutputType + Into<f64>,
{
    let param = &data.param;
    let num_tree = data.num_tree();
    let num_target = param.num_target as usize;
    let max_num_class = param.max_num_class() as usize;

    match config.pred_kind {
        PredictKind::LeafId => {
            let mut out = vec![0u32; num_row * num_tree];
            out.par_chunks_mut(num_tree)
                .zip(input.par_chunks(num_feature))
                .try_for_each(|(row_out, row)| -> Result<()> {
                    for (tree_idx, tree) in data.trees.iter().enumerate() {
                        row_out[tree_idx] = traverse(tree, row)? as u32;
                    }
                    Ok(())
                })?;
            Ok(Output::LeafId(out))
        }
        PredictKind::ScorePerTree => {
            let width = per_tree_width(param);
            let mut out = vec![0f64; num_row * num_tree * width];
            out.par_chunks_mut(num_tree * width)
                .zip(input.par_chunks(num_feature))
                .try_for_each(|(row_out, row)| -> Result<()> {
                    for (tree_idx, tree) in data.trees.iter().enumerate() {
                        let leaf_nid = traverse(tree, row)?;
                        let dst = &mut row_out[tree_idx * width..(tree_idx + 1) * width];
                        if tree.has_leaf_vector(leaf_nid) {
                            for (d, &v) in dst.iter_mut().zip(tree.leaf_vector(leaf_nid)) {
                                *d = v.into();
                            }
                        } else {
                            dst[0] = tree.leaf_value(leaf_nid).into();
                        }
                    }
                    Ok(())
                })?;
            Ok(Output::Scores(out))
        }
        PredictKind::Raw | PredictKind::Default => {
            let mut out = vec![0f64; num_row * num_target * max_num_class];
            out.par_chunks_mut(num_target * max_num_class)
                .zip(input.par_chunks(num_feature))
                .try_for_each(|(row_out, row)| -> Result<()> {
                    let mut touched = vec![0u32; num_target * max_num_class];
                    for ((tree, &target_id), &class_id) in
                        data.trees.iter().zip_eq(data.target_id.iter()).zip_eq(data.class_id.iter())
                    {
                        let leaf_nid = traverse(tree, row)?;
                        accumulate(
                            tree,
                            leaf_nid,
                            target_id,
                            class_id,
                            num_target,
                            max_num_class,
                            row_out,
                            &mut touched,
                        );
                    }
                    if param.average_tree_output {
                        for (v, &n) in row_out.iter_mut().zip(touched.iter()) {
                            if n > 0 {
                                *v /= n as f64;
                            }
                        }
                    }
                    for t in 0..num_target {
                        for c in 0..max_num_class {
                            let base_idx = if max_num_class == 1 { t } else { t * max_num_class + c };
                            if let Some(&base) = param.base_scores.get(base_idx) {
                                row_out[t * max_num_class + c] += base;
                            }
                        }
                    }
                    Ok(())
                })?;

            if config.pred_kind == PredictKind::Default {
                crate::postprocess::apply(
                    &param.postprocessor,
                    param.sigmoid_alpha,
                    param.ratio_c,
                    &mut out,
                    max_num_class,
                )?;
            }

            Ok(reshape_for_output(out, num_row, num_target, max_num_class))
        }
    }
}

/// Collapse the `(row, target, class)`-major accumulator down to the exact
/// output shape: `(num_row, max_num_class)` when there is a single target,
/// or `(num_target, num_row, max_num_class)` otherwise.
fn reshape_for_output(flat: Vec<f64>, num_row: usize, num_target: usize, max_num_class: usize) -> Output {
    if num_target == 1 {
        return Output::Scores(flat);
    }
    let mut out = vec![0f64; num_target * num_row * max_num_class];
    for row in 0..num_row {
        for t in 0..num_target {
            let src = &flat[row * num_target * max_num_class + t * max_num_class..][..max_num_class];
            let dst_base = t * num_row * max_num_class + row * max_num_class;
            out[dst_base..dst_base + max_num_class].copy_from_slice(src);
        }
    }
    Output::Scores(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Builder, ModelMetadata};
    use crate::typeinfo::{Operator, TaskType, TypeInfo};
    use assert_approx_eq::assert_approx_eq;

    fn scores(output: Output) -> Vec<f64> {
        match output {
            Output::Scores(v) => v,
            Output::LeafId(_) => panic!("expected Scores output"),
        }
    }

    fn leaf_ids(output: Output) -> Vec<u32> {
        match output {
            Output::LeafId(v) => v,
            Output::Scores(_) => panic!("expected LeafId output"),
        }
    }

    /// A single-tree f32/f32 regressor: one numerical split, two leaves.
    fn regressor_stump() -> Model {
        let metadata = ModelMetadata {
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
        };
        let mut b = Builder::new(TypeInfo::Float32, TypeInfo::Float32, metadata, 1).unwrap();
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
        b.commit_model().unwrap()
    }

    #[test]
    fn regressor_stump_routes_on_threshold() {
        let model = regressor_stump();
        let config = Configuration {
            pred_kind: PredictKind::Raw,
            nthread: 1,
        };
        let input = [-1.0f32, 0.0, 1.0, 0.0];
        let out = scores(predict(&model, Input::F32(&input), 2, &config).unwrap());
        assert_approx_eq!(out[0], 1.0, 1e-9);
        assert_approx_eq!(out[1], 2.0, 1e-9);
    }

    /// Grove-per-class multiclass: 3 classes, 6 single-split trees, one
    /// tree per (round, class) pair.
    fn grove_per_class() -> Model {
        let metadata = ModelMetadata {
            num_feature: 1,
            task_type: TaskType::MultiClf,
            average_tree_output: false,
            num_target: 1,
            num_class: vec![3],
            leaf_vector_shape: [1, 1],
            postprocessor: "softmax".to_string(),
            postprocessor_config: None,
            base_scores: vec![0.3, 0.2, 0.5],
            attributes: String::new(),
        };
        let mut b = Builder::new(TypeInfo::Float32, TypeInfo::Float32, metadata, 6).unwrap();
        let class_id = [0, 1, 2, 0, 1, 2];
        let leaves = [(-1.0, 1.0), (1.0, -1.0), (0.5, 0.5), (-1.0, 0.0), (0.0, -1.0), (0.5, 1.5)];
        for i in 0..6 {
            b.start_tree(0, class_id[i]).unwrap();
            b.start_node(0).unwrap();
            b.numerical_test(0, 0.0, true, Operator::LT, 1, 2).unwrap();
            b.end_node().unwrap();
            b.start_node(1).unwrap();
            b.leaf_scalar(leaves[i].0).unwrap();
            b.end_node().unwrap();
            b.start_node(2).unwrap();
            b.leaf_scalar(leaves[i].1).unwrap();
            b.end_node().unwrap();
            b.end_tree().unwrap();
        }
        b.commit_model().unwrap()
    }

    #[test]
    fn grove_per_class_raw_matches_seed_scenario() {
        let model = grove_per_class();
        let config = Configuration {
            pred_kind: PredictKind::Raw,
            nthread: 1,
        };
        let input = [1.0f32, -1.0];
        let out = scores(predict(&model, Input::F32(&input), 2, &config).unwrap());
        assert_approx_eq!(out[0], 1.3, 1e-6);
        assert_approx_eq!(out[1], -1.8, 1e-6);
        assert_approx_eq!(out[2], 2.5, 1e-6);
        assert_approx_eq!(out[3], -1.7, 1e-6);
        assert_approx_eq!(out[4], 1.2, 1e-6);
        assert_approx_eq!(out[5], 1.5, 1e-6);
    }

    #[test]
    fn grove_per_class_leaf_id_matches_seed_scenario() {
        let model = grove_per_class();
        let config = Configuration {
            pred_kind: PredictKind::LeafId,
            nthread: 1,
        };
        let input = [1.0f32, -1.0];
        let out = leaf_ids(predict(&model, Input::F32(&input), 2, &config).unwrap());
        assert_eq!(&out[0..6], &[2, 2, 2, 2, 2, 2]);
        assert_eq!(&out[6..12], &[1, 1, 1, 1, 1, 1]);
    }

    /// Random-forest-style multi-class leaf-vector ensemble: 2 single-node
    /// trees, each a leaf vector spanning all 3 classes, averaged.
    fn rf_leaf_vector() -> Model {
        let metadata = ModelMetadata {
            num_feature: 1,
            task_type: TaskType::MultiClf,
            average_tree_output: true,
            num_target: 1,
            num_class: vec![3],
            leaf_vector_shape: [1, 3],
            postprocessor: "identity_multiclass".to_string(),
            postprocessor_config: None,
            base_scores: vec![100.0, 200.0, 300.0],
            attributes: String::new(),
        };
        let mut b = Builder::new(TypeInfo::Float32, TypeInfo::Float32, metadata, 2).unwrap();
        let vectors = [[1.0, 0.0, 0.0], [0.0, 0.5, 0.5]];
        for v in vectors {
            b.start_tree(0, -1).unwrap();
            b.start_node(0).unwrap();
            b.leaf_vector(v.to_vec()).unwrap();
            b.end_node().unwrap();
            b.end_tree().unwrap();
        }
        b.commit_model().unwrap()
    }

    #[test]
    fn rf_leaf_vector_averages_then_adds_base_scores() {
        let model = rf_leaf_vector();
        let config = Configuration {
            pred_kind: PredictKind::Raw,
            nthread: 1,
        };
        // One feature, value irrelevant: both trees are one-node (root = leaf).
        // class0 = (1.0 + 0.0) / 2 trees + base 100 = 100.5
        // class1 = (0.0 + 0.5) / 2 trees + base 200 = 200.25
        // class2 = (0.0 + 0.5) / 2 trees + base 300 = 300.25
        let input = [1.0f32, -1.0];
        let out = scores(predict(&model, Input::F32(&input), 2, &config).unwrap());
        assert_approx_eq!(out[0], 100.5, 1e-9);
        assert_approx_eq!(out[1], 200.25, 1e-9);
        assert_approx_eq!(out[2], 300.25, 1e-9);
        assert_approx_eq!(out[3], 100.5, 1e-9);
        assert_approx_eq!(out[4], 200.25, 1e-9);
        assert_approx_eq!(out[5], 300.25, 1e-9);
    }

    #[test]
    fn nan_feature_takes_default_child_regardless_of_operator() {
        let metadata = ModelMetadata {
            num_feature: 1,
            task_type: TaskType::Regressor,
            average_tree_output: false,
            num_target: 1,
            num_class: vec![1],
            leaf_vector_shape: [1, 1],
            postprocessor: "identity".to_string(),
            postprocessor_config: None,
            base_scores: vec![0.0],
            attributes: String::new(),
        };
        let mut b = Builder::new(TypeInfo::Float32, TypeInfo::Float32, metadata, 1).unwrap();
        b.start_tree(0, 0).unwrap();
        b.start_node(0).unwrap();
        // default_left = true: NaN should go left no matter the operator.
        b.numerical_test(0, 0.0, true, Operator::GE, 1, 2).unwrap();
        b.end_node().unwrap();
        b.start_node(1).unwrap();
        b.leaf_scalar(11.0).unwrap();
        b.end_node().unwrap();
        b.start_node(2).unwrap();
        b.leaf_scalar(22.0).unwrap();
        b.end_node().unwrap();
        b.end_tree().unwrap();
        let model = b.commit_model().unwrap();

        let config = Configuration {
            pred_kind: PredictKind::Raw,
            nthread: 1,
        };
        let input = [f32::NAN];
        let out = scores(predict(&model, Input::F32(&input), 1, &config).unwrap());
        assert_approx_eq!(out[0], 11.0, 1e-9);
    }

    /// A single categorical split: membership test plus non-integer and
    /// out-of-range fallback to the non-matching branch.
    fn categorical_model() -> Model {
        let metadata = ModelMetadata {
            num_feature: 1,
            task_type: TaskType::Regressor,
            average_tree_output: false,
            num_target: 1,
            num_class: vec![1],
            leaf_vector_shape: [1, 1],
            postprocessor: "identity".to_string(),
            postprocessor_config: None,
            base_scores: vec![0.0],
            attributes: String::new(),
        };
        let mut b = Builder::new(TypeInfo::Float32, TypeInfo::Float32, metadata, 1).unwrap();
        b.start_tree(0, 0).unwrap();
        b.start_node(0).unwrap();
        b.categorical_test(0, false, vec![2, 5, 7], true, 1, 2).unwrap();
        b.end_node().unwrap();
        b.start_node(1).unwrap();
        b.leaf_scalar(0.0).unwrap(); // left = "not matched"
        b.end_node().unwrap();
        b.start_node(2).unwrap();
        b.leaf_scalar(1.0).unwrap(); // right = "matched"
        b.end_node().unwrap();
        b.end_tree().unwrap();
        b.commit_model().unwrap()
    }

    #[test]
    fn categorical_split_matches_seed_scenario() {
        let model = categorical_model();
        let config = Configuration {
            pred_kind: PredictKind::Raw,
            nthread: 1,
        };
        let inputs = [5.0f32, 3.0, 5.5, -1.0, 2.9999];
        let expected = [1.0, 0.0, 0.0, 0.0, 0.0];
        for (&x, &want) in inputs.iter().zip(expected.iter()) {
            let out = scores(predict(&model, Input::F32(&[x]), 1, &config).unwrap());
            assert_approx_eq!(out[0], want, 1e-9);
        }
    }

    #[test]
    fn prediction_is_deterministic_across_thread_counts() {
        let model = grove_per_class();
        let input: Vec<f32> = (0..200).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let mut reference = None;
        for nthread in [1, 2, 4] {
            let config = Configuration {
                pred_kind: PredictKind::Raw,
                nthread,
            };
            let out = scores(predict(&model, Input::F32(&input), 200, &config).unwrap());
            match &reference {
                None => reference = Some(out),
                Some(r) => assert_eq!(r, &out),
            }
        }
    }

    #[test]
    fn get_output_shape_matches_table() {
        let model = grove_per_class();
        let config = Configuration {
            pred_kind: PredictKind::Raw,
            nthread: 1,
        };
        assert_eq!(get_output_shape(&model, 10, &config).unwrap(), vec![10, 3]);

        let config = Configuration {
            pred_kind: PredictKind::LeafId,
            nthread: 1,
        };
        assert_eq!(get_output_shape(&model, 10, &config).unwrap(), vec![10, 6]);
    }

    #[test]
    fn unknown_predict_type_is_rejected() {
        assert!(matches!(
            Configuration::from_json(r#"{"predict_type": "bogus"}"#),
            Err(Error::UnknownIdentifier(_))
        ));
    }

    #[test]
    fn unknown_config_key_is_rejected() {
        assert!(Configuration::from_json(r#"{"predict_type": "raw", "extra": 1}"#).is_err());
    }

    #[test]
    fn input_type_mismatch_is_rejected() {
        let model = regressor_stump();
        let config = Configuration {
            pred_kind: PredictKind::Raw,
            nthread: 1,
        };
        let input = [0.0f64, 0.0];
        assert!(matches!(
            predict(&model, Input::F64(&input), 1, &config),
            Err(Error::TypeMismatch(_))
        ));
    }
}

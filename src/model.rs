//! The tree-ensemble container: ensemble-wide metadata plus a variant over
//! the legal numeric type pairs.
//!
//! A [`Model`] is a tagged union over the two reachable `(ThresholdT,
//! LeafOutputT)` specializations that the builder can actually construct —
//! `(f32, f32)` and `(f64, f64)` — plus the ensemble-wide metadata in
//! [`ModelParam`]. See `DESIGN.md` for why the `u32` leaf-id output type is
//! never a third `Model` variant: it only ever types the leaf-id prediction
//! buffer, never a committed model's own leaf storage.

use crate::error::{Error, Result};
use crate::tree::Tree;
use crate::typeinfo::{LeafOutputType, TaskType, ThresholdType, TypeInfo};
use serde::{Deserialize, Serialize};

/// Ensemble-wide metadata, independent of the numeric type pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelParam {
    pub num_feature: i32,
    pub task_type: TaskType,
    pub average_tree_output: bool,
    pub num_target: u32,
    pub num_class: Vec<u32>,
    pub leaf_vector_shape: [u32; 2],
    pub postprocessor: String,
    pub sigmoid_alpha: f32,
    pub ratio_c: f32,
    pub base_scores: Vec<f64>,
    pub attributes: String,
    /// Version stamped at creation, preserved through round-trip.
    pub version: (i32, i32, i32),
}

impl ModelParam {
    pub fn max_num_class(&self) -> u32 {
        self.num_class.iter().copied().max().unwrap_or(1)
    }
}

/// One `(ThresholdT, LeafOutputT)` specialization of a committed ensemble:
/// its trees plus the per-tree `(target_id, class_id)` routing annotation
/// that tells the prediction engine which output cell(s) each tree feeds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelData<T, L> {
    pub param: ModelParam,
    pub trees: Vec<Tree<T, L>>,
    pub target_id: Vec<i32>,
    pub class_id: Vec<i32>,
}

impl<T: ThresholdType, L: LeafOutputType> ModelData<T, L> {
    pub fn num_tree(&self) -> usize {
        self.trees.len()
    }
}

/// A committed tree ensemble. Immutable from the core's perspective once
/// produced by [`crate::builder::Builder::commit_model`] or a deserializer;
/// the only mutation afterwards is the tree-limit truncation used by
/// loaders.
#[derive(Clone, Debug)]
pub enum Model {
    F32(ModelData<f32, f32>),
    F64(ModelData<f64, f64>),
}

impl Model {
    pub fn threshold_type(&self) -> TypeInfo {
        match self {
            Model::F32(_) => TypeInfo::Float32,
            Model::F64(_) => TypeInfo::Float64,
        }
    }

    pub fn leaf_output_type(&self) -> TypeInfo {
        match self {
            Model::F32(_) => TypeInfo::Float32,
            Model::F64(_) => TypeInfo::Float64,
        }
    }

    pub fn param(&self) -> &ModelParam {
        match self {
            Model::F32(m) => &m.param,
            Model::F64(m) => &m.param,
        }
    }

    pub fn num_feature(&self) -> i32 {
        self.param().num_feature
    }

    pub fn num_tree(&self) -> usize {
        match self {
            Model::F32(m) => m.num_tree(),
            Model::F64(m) => m.num_tree(),
        }
    }

    pub fn task_type(&self) -> TaskType {
        self.param().task_type
    }

    /// Truncate the ensemble to its first `limit` trees, in place. Used
    /// only by loaders that honor a "best iteration" cutoff; never invoked
    /// by the builder or predictor.
    pub fn set_tree_limit(&mut self, limit: usize) -> Result<()> {
        fn truncate<T, L>(m: &mut ModelData<T, L>, limit: usize) -> Result<()> {
            if limit > m.trees.len() {
                return Err(Error::Validation(format!(
                    "tree limit {} exceeds the ensemble's {} trees",
                    limit,
                    m.trees.len()
                )));
            }
            m.trees.truncate(limit);
            m.target_id.truncate(limit);
            m.class_id.truncate(limit);
            Ok(())
        }
        match self {
            Model::F32(m) => truncate(m, limit),
            Model::F64(m) => truncate(m, limit),
        }
    }

    /// Render this model as a deterministic JSON document. See
    /// [`crate::json`] for the schema.
    pub fn dump_as_json(&self, pretty: bool) -> Result<String> {
        crate::json::dump_as_json(self, pretty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;

    fn base_param(num_target: u32, num_class: Vec<u32>) -> crate::builder::ModelMetadata {
        crate::builder::ModelMetadata {
            num_feature: 2,
            task_type: TaskType::Regressor,
            average_tree_output: false,
            num_target,
            num_class: num_class.clone(),
            leaf_vector_shape: [1, 1],
            postprocessor: "identity".to_string(),
            postprocessor_config: None,
            base_scores: vec![0.0; num_class.iter().sum::<u32>().max(1) as usize],
            attributes: String::new(),
        }
    }

    #[test]
    fn set_tree_limit_truncates_all_parallel_arrays() {
        let metadata = base_param(1, vec![1]);
        let mut builder = Builder::new(TypeInfo::Float32, TypeInfo::Float32, metadata, 2).unwrap();
        for _ in 0..2 {
            builder.start_tree().unwrap();
            builder.start_node(0).unwrap();
            builder.leaf_scalar(1.0).unwrap();
            builder.end_node().unwrap();
            builder.end_tree().unwrap();
        }
        let mut model = builder.commit_model().unwrap();
        model.set_tree_limit(1).unwrap();
        assert_eq!(model.num_tree(), 1);
    }
}

//! `treelite`: a universal exchange format and reference inference engine
//! for decision-tree ensembles produced by gradient boosting, random
//! forests, and similar tree-based learners.
//!
//! A [`model::Model`] is a flat, column-oriented representation of one or
//! more [`tree::Tree`]s that is agnostic to the training framework that
//! produced it. Models are assembled through [`builder::Builder`] (or the
//! generic, statically-typed [`builder::ModelBuilder`]), serialized through
//! [`serialize`], rendered to a deterministic JSON form through [`json`],
//! and scored through [`predict`]. [`xgboost`] is a small front-end loader
//! that turns one real external format into builder calls.
//!
//! # Example
//!
//! ```
//! use treelite::builder::{Builder, ModelMetadata};
//! use treelite::predict::{predict, Configuration, Input, PredictKind};
//! use treelite::typeinfo::{Operator, TaskType, TypeInfo};
//!
//! let metadata = ModelMetadata {
//!     num_feature: 1,
//!     task_type: TaskType::Regressor,
//!     average_tree_output: false,
//!     num_target: 1,
//!     num_class: vec![1],
//!     leaf_vector_shape: [1, 1],
//!     postprocessor: "identity".to_string(),
//!     postprocessor_config: None,
//!     base_scores: vec![0.0],
//!     attributes: String::new(),
//! };
//! let mut builder = Builder::new(TypeInfo::Float32, TypeInfo::Float32, metadata, 1).unwrap();
//! builder.start_tree(0, 0).unwrap();
//! builder.start_node(0).unwrap();
//! builder.numerical_test(0, 0.0, true, Operator::LT, 1, 2).unwrap();
//! builder.end_node().unwrap();
//! builder.start_node(1).unwrap();
//! builder.leaf_scalar(1.0).unwrap();
//! builder.end_node().unwrap();
//! builder.start_node(2).unwrap();
//! builder.leaf_scalar(2.0).unwrap();
//! builder.end_node().unwrap();
//! builder.end_tree().unwrap();
//! let model = builder.commit_model().unwrap();
//!
//! let config = Configuration { pred_kind: PredictKind::Raw, nthread: 1 };
//! let input = [-1.0f32, 1.0];
//! let out = predict(&model, Input::F32(&input), 2, &config).unwrap();
//! ```

pub mod builder;
pub mod error;
pub mod json;
pub mod model;
pub mod postprocess;
pub mod predict;
pub mod serialize;
pub mod tree;
pub mod typeinfo;
pub mod xgboost;

pub use builder::{Builder, ModelBuilder, ModelMetadata};
pub use error::{Error, Result};
pub use model::{Model, ModelData, ModelParam};
pub use tree::Tree;

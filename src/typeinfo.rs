//! Closed enums and numeric type-tag plumbing shared across the crate.
//!
//! Dense column arrays are parametric over `(ThresholdT, LeafOutputT)`,
//! backed by enum tables with canonical string encodings. The [`TypeInfo`]
//! enum reifies the numeric type of a column at runtime so
//! [`crate::model::Model`] can be discriminated without downcasting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime tag for a column's element type.
///
/// Only `(Float32, Float32)` and `(Float64, Float64)` are legal
/// `(threshold, leaf)` pairs for [`crate::builder::Builder::new`]; `UInt32`
/// exists purely to type the leaf-id prediction output buffer (see
/// `DESIGN.md`, Open Question 3) and is never the leaf type of a committed
/// [`crate::model::Model`].
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum TypeInfo {
    Float32,
    Float64,
    UInt32,
}

impl TypeInfo {
    pub fn as_u8(self) -> u8 {
        match self {
            TypeInfo::Float32 => 0,
            TypeInfo::Float64 => 1,
            TypeInfo::UInt32 => 2,
        }
    }

    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(TypeInfo::Float32),
            1 => Some(TypeInfo::Float64),
            2 => Some(TypeInfo::UInt32),
            _ => None,
        }
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeInfo::Float32 => "float32",
            TypeInfo::Float64 => "float64",
            TypeInfo::UInt32 => "uint32",
        };
        f.write_str(s)
    }
}

/// Comparison used by a `NumericalTestNode`.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum Operator {
    LT,
    LE,
    EQ,
    GT,
    GE,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::LT => "<",
            Operator::LE => "<=",
            Operator::EQ => "==",
            Operator::GT => ">",
            Operator::GE => ">=",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "<" => Some(Operator::LT),
            "<=" => Some(Operator::LE),
            "==" => Some(Operator::EQ),
            ">" => Some(Operator::GT),
            ">=" => Some(Operator::GE),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Operator::LT => 0,
            Operator::LE => 1,
            Operator::EQ => 2,
            Operator::GT => 3,
            Operator::GE => 4,
        }
    }

    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Operator::LT),
            1 => Some(Operator::LE),
            2 => Some(Operator::EQ),
            3 => Some(Operator::GT),
            4 => Some(Operator::GE),
            _ => None,
        }
    }

    /// Evaluate `lhs OP rhs`.
    pub fn apply<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
        match self {
            Operator::LT => lhs < rhs,
            Operator::LE => lhs <= rhs,
            Operator::EQ => lhs == rhs,
            Operator::GT => lhs > rhs,
            Operator::GE => lhs >= rhs,
        }
    }
}

/// The kind of a tree node.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum NodeType {
    LeafNode,
    NumericalTestNode,
    CategoricalTestNode,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::LeafNode => "leaf_node",
            NodeType::NumericalTestNode => "numerical_test_node",
            NodeType::CategoricalTestNode => "categorical_test_node",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "leaf_node" => Some(NodeType::LeafNode),
            "numerical_test_node" => Some(NodeType::NumericalTestNode),
            "categorical_test_node" => Some(NodeType::CategoricalTestNode),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            NodeType::LeafNode => 0,
            NodeType::NumericalTestNode => 1,
            NodeType::CategoricalTestNode => 2,
        }
    }

    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(NodeType::LeafNode),
            1 => Some(NodeType::NumericalTestNode),
            2 => Some(NodeType::CategoricalTestNode),
            _ => None,
        }
    }
}

/// The prediction task an ensemble was trained for.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum TaskType {
    Regressor,
    BinaryClf,
    MultiClf,
    LearningToRank,
    IsolationForest,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Regressor => "kRegressor",
            TaskType::BinaryClf => "kBinaryClf",
            TaskType::MultiClf => "kMultiClf",
            TaskType::LearningToRank => "kLearningToRank",
            TaskType::IsolationForest => "kIsolationForest",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "kRegressor" => Some(TaskType::Regressor),
            "kBinaryClf" => Some(TaskType::BinaryClf),
            "kMultiClf" => Some(TaskType::MultiClf),
            "kLearningToRank" => Some(TaskType::LearningToRank),
            "kIsolationForest" => Some(TaskType::IsolationForest),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            TaskType::Regressor => 0,
            TaskType::BinaryClf => 1,
            TaskType::MultiClf => 2,
            TaskType::LearningToRank => 3,
            TaskType::IsolationForest => 4,
        }
    }

    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(TaskType::Regressor),
            1 => Some(TaskType::BinaryClf),
            2 => Some(TaskType::MultiClf),
            3 => Some(TaskType::LearningToRank),
            4 => Some(TaskType::IsolationForest),
            _ => None,
        }
    }
}

/// Element type usable as a split threshold: `f32` or `f64`.
pub trait ThresholdType:
    num_traits::Float + Copy + Default + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    fn type_info() -> TypeInfo;

    /// The largest integer exactly representable by this type, used by the
    /// prediction engine's categorical-split membership test to bound
    /// `|f| <= min(u32::MAX, 2^MANT_DIG)`.
    fn max_exact_integer() -> f64;
}

impl ThresholdType for f32 {
    fn type_info() -> TypeInfo {
        TypeInfo::Float32
    }
    fn max_exact_integer() -> f64 {
        2f64.powi(f32::MANTISSA_DIGITS as i32)
    }
}

impl ThresholdType for f64 {
    fn type_info() -> TypeInfo {
        TypeInfo::Float64
    }
    fn max_exact_integer() -> f64 {
        2f64.powi(f64::MANTISSA_DIGITS as i32)
    }
}

/// Element type usable as a leaf output: `f32`, `f64`, or (buffer-only) `u32`.
pub trait LeafOutputType:
    Copy + Default + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    fn type_info() -> TypeInfo;
}

impl LeafOutputType for f32 {
    fn type_info() -> TypeInfo {
        TypeInfo::Float32
    }
}

impl LeafOutputType for f64 {
    fn type_info() -> TypeInfo {
        TypeInfo::Float64
    }
}

impl LeafOutputType for u32 {
    fn type_info() -> TypeInfo {
        TypeInfo::UInt32
    }
}

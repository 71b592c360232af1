//! Deterministic JSON rendering of a [`Model`].
//!
//! This is the equality oracle used by the round-trip tests: two models
//! are "the same" for testing purposes iff their dumps are byte-for-byte
//! identical strings. `pretty` only toggles whitespace; key names, key
//! set, and array ordering never change.

use crate::error::Result;
use crate::model::{Model, ModelData, ModelParam};
use crate::tree::Tree;
use crate::typeinfo::{LeafOutputType, NodeType, ThresholdType};
use serde_json::{json, Value};

fn param_to_json(param: &ModelParam) -> Value {
    json!({
        "num_feature": param.num_feature,
        "task_type": param.task_type.as_str(),
        "average_tree_output": param.average_tree_output,
        "num_target": param.num_target,
        "num_class": param.num_class,
        "leaf_vector_shape": param.leaf_vector_shape,
        "postprocessor": param.postprocessor,
        "sigmoid_alpha": param.sigmoid_alpha,
        "ratio_c": param.ratio_c,
        "base_scores": param.base_scores,
        "attributes": param.attributes,
        "version": [param.version.0, param.version.1, param.version.2],
    })
}

fn tree_to_json<T, L>(tree: &Tree<T, L>) -> Value
where
    T: ThresholdType + Into<f64>,
    L: LeafOutputType + Into<f64>,
{
    let mut nodes = Vec::with_capacity(tree.num_nodes());
    for nid in 0..tree.num_nodes() {
        let mut node = serde_json::Map::new();
        node.insert("node_type".into(), json!(tree.node_type_at(nid).as_str()));

        if tree.is_leaf(nid) {
            if tree.has_leaf_vector(nid) {
                let values: Vec<f64> = tree.leaf_vector(nid).iter().map(|&v| v.into()).collect();
                node.insert("leaf_value".into(), json!(values));
            } else {
                node.insert("leaf_value".into(), json!(tree.leaf_value(nid).into()));
            }
        } else {
            node.insert("split_feature_id".into(), json!(tree.split_feature_index(nid)));
            node.insert("default_left".into(), json!(tree.default_left(nid)));
            node.insert("left_child".into(), json!(tree.left_child(nid)));
            node.insert("right_child".into(), json!(tree.right_child(nid)));
            match tree.node_type_at(nid) {
                NodeType::NumericalTestNode => {
                    node.insert("threshold".into(), json!(tree.threshold(nid).into()));
                    node.insert("comparison_op".into(), json!(tree.comparison_op(nid).as_str()));
                }
                NodeType::CategoricalTestNode => {
                    node.insert("category_list".into(), json!(tree.category_list(nid)));
                    node.insert(
                        "category_list_right_child".into(),
                        json!(tree.category_list_right_child(nid)),
                    );
                }
                NodeType::LeafNode => unreachable!(),
            }
        }

        if let Some(c) = tree.data_count(nid) {
            node.insert("data_count".into(), json!(c));
        }
        if let Some(h) = tree.sum_hess(nid) {
            node.insert("sum_hess".into(), json!(h));
        }
        if let Some(g) = tree.gain(nid) {
            node.insert("gain".into(), json!(g));
        }

        nodes.push(Value::Object(node));
    }

    json!({
        "num_nodes": tree.num_nodes(),
        "has_categorical_split": tree.has_categorical_split(),
        "nodes": nodes,
    })
}

fn model_data_to_json<T, L>(data: &ModelData<T, L>) -> Value
where
    T: ThresholdType + Into<f64>,
    L: LeafOutputType + Into<f64>,
{
    let mut root = param_to_json(&data.param);
    let trees: Vec<Value> = data.trees.iter().map(tree_to_json).collect();
    let obj = root.as_object_mut().unwrap();
    obj.insert("target_id".into(), json!(data.target_id));
    obj.insert("class_id".into(), json!(data.class_id));
    obj.insert("trees".into(), json!(trees));
    root
}

pub fn dump_as_json(model: &Model, pretty: bool) -> Result<String> {
    let value = match model {
        Model::F32(data) => model_data_to_json(data),
        Model::F64(data) => model_data_to_json(data),
    };
    let s = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Builder, ModelMetadata};
    use crate::typeinfo::{Operator, TaskType, TypeInfo};

    fn stump() -> Model {
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
    fn dump_contains_expected_leaf_values() {
        let model = stump();
        let dump = dump_as_json(&model, false).unwrap();
        assert!(dump.contains("\"leaf_value\":1.0"));
        assert!(dump.contains("\"leaf_value\":2.0"));
        assert!(dump.contains("\"threshold\":0.0"));
    }

    #[test]
    fn pretty_and_compact_dumps_parse_to_the_same_value() {
        let model = stump();
        let compact = dump_as_json(&model, false).unwrap();
        let pretty = dump_as_json(&model, true).unwrap();
        let v1: Value = serde_json::from_str(&compact).unwrap();
        let v2: Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(v1, v2);
    }

    #[test]
    fn dump_is_deterministic() {
        let model = stump();
        assert_eq!(dump_as_json(&model, false).unwrap(), dump_as_json(&model, false).unwrap());
    }
}

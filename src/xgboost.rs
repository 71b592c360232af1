//! Minimal XGBoost `dump_model(..., dump_format="json")` loader.
//!
//! This is deliberately narrow: one `gbtree` round per entry of the dumped
//! array, `reg:squarederror` or `binary:logistic` objectives only. It exists
//! to exercise the builder end-to-end with a real external JSON shape, not
//! to become a second front-end engine — `dart`, `gblinear`, multi-class
//! objectives, and named (non-`fN`) feature references are all rejected
//! with [`Error::UnknownIdentifier`] rather than guessed at.

use crate::builder::{Builder, ModelMetadata};
use crate::error::{Error, Result};
use crate::model::Model;
use crate::typeinfo::{Operator, TaskType, TypeInfo};
use serde_json::Value;

/// The subset of XGBoost objectives this loader understands.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum XGBoostObjective {
    RegSquaredError,
    BinaryLogistic,
}

/// Fields the JSON tree dump itself does not carry and must be supplied by
/// the caller (mirroring what `learner_model_param` holds in a full model
/// file).
pub struct XGBoostConfig {
    pub num_feature: u32,
    /// `learner_model_param.base_score`, still in probability space.
    pub base_score: f64,
    pub objective: XGBoostObjective,
}

/// Parse the output of `booster.get_dump(dump_format="json")` (a JSON array
/// of per-tree root nodes) into a [`Model`].
pub fn load_xgboost_model(dump_json: &str, config: &XGBoostConfig) -> Result<Model> {
    let tree_roots: Vec<Value> = serde_json::from_str(dump_json)?;
    if tree_roots.is_empty() {
        return Err(Error::Validation("xgboost dump contains no trees".into()));
    }

    // XGBoost stores `base_score` as a probability even for `binary:logistic`;
    // trees accumulate in logit (margin) space, so the additive base score
    // must be logit-transformed up front rather than left as a raw
    // probability (see `DESIGN.md`, Open Question "xgboost base_score").
    let (postprocessor, task_type, base_score) = match config.objective {
        XGBoostObjective::RegSquaredError => ("identity", TaskType::Regressor, config.base_score),
        XGBoostObjective::BinaryLogistic => {
            let p = config.base_score;
            ("sigmoid", TaskType::BinaryClf, (p / (1.0 - p)).ln())
        }
    };

    let metadata = ModelMetadata {
        num_feature: config.num_feature as i32,
        task_type,
        average_tree_output: false,
        num_target: 1,
        num_class: vec![1],
        leaf_vector_shape: [1, 1],
        postprocessor: postprocessor.to_string(),
        postprocessor_config: None,
        base_scores: vec![base_score],
        attributes: String::new(),
    };

    let mut builder = Builder::new(TypeInfo::Float64, TypeInfo::Float64, metadata, tree_roots.len())?;
    for root in &tree_roots {
        builder.start_tree(0, 0)?;
        parse_node(root, &mut builder)?;
        builder.end_tree()?;
    }
    builder.commit_model()
}

fn parse_node(node: &Value, builder: &mut Builder) -> Result<()> {
    let obj = node
        .as_object()
        .ok_or_else(|| Error::Parse("xgboost tree node is not a JSON object".into()))?;
    let nodeid = obj
        .get("nodeid")
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::Parse("xgboost node is missing 'nodeid'".into()))?;

    builder.start_node(nodeid)?;

    if let Some(leaf) = obj.get("leaf").and_then(Value::as_f64) {
        builder.leaf_scalar(leaf)?;
        builder.end_node()?;
        return Ok(());
    }

    let split = obj
        .get("split")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Parse(format!("node {} has neither 'leaf' nor 'split'", nodeid)))?;
    let feature = parse_feature_index(split)?;
    let split_condition = obj
        .get("split_condition")
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::Parse(format!("node {} is missing 'split_condition'", nodeid)))?;
    let yes = obj
        .get("yes")
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::Parse(format!("node {} is missing 'yes'", nodeid)))?;
    let no = obj
        .get("no")
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::Parse(format!("node {} is missing 'no'", nodeid)))?;
    let missing = obj.get("missing").and_then(Value::as_i64).unwrap_or(yes);
    let default_left = missing == yes;

    builder.numerical_test(feature, split_condition, default_left, Operator::LT, yes, no)?;
    builder.end_node()?;

    let children = obj
        .get("children")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Parse(format!("split node {} has no 'children'", nodeid)))?;
    for child in children {
        parse_node(child, builder)?;
    }
    Ok(())
}

/// XGBoost dump nodes name features `"f{index}"` unless `feature_names` was
/// supplied at training time; named (non-numeric) features are out of
/// scope for this loader.
fn parse_feature_index(s: &str) -> Result<u32> {
    let digit_start = s.find(|c: char| c.is_ascii_digit()).ok_or_else(|| {
        Error::UnknownIdentifier(format!(
            "xgboost feature name '{}' is not of the form 'fN'; named features are not supported",
            s
        ))
    })?;
    s[digit_start..]
        .parse::<u32>()
        .map_err(|_| Error::Parse(format!("cannot parse a feature index out of '{}'", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::{predict, Configuration, Input, PredictKind};

    #[test]
    fn single_round_regression_stump_round_trips_through_predict() {
        let dump = r#"[
            {
                "nodeid": 0, "depth": 0, "split": "f0", "split_condition": 0.5,
                "yes": 1, "no": 2, "missing": 1,
                "children": [
                    {"nodeid": 1, "leaf": 1.25},
                    {"nodeid": 2, "leaf": -0.75}
                ]
            }
        ]"#;
        let config = XGBoostConfig {
            num_feature: 1,
            base_score: 0.0,
            objective: XGBoostObjective::RegSquaredError,
        };
        let model = load_xgboost_model(dump, &config).unwrap();
        assert_eq!(model.num_tree(), 1);

        let pred_config = Configuration {
            pred_kind: PredictKind::Raw,
            nthread: 1,
        };
        let input = [0.0f64, 1.0];
        let out = match predict(&model, Input::F64(&input), 2, &pred_config).unwrap() {
            crate::predict::Output::Scores(v) => v,
            _ => panic!("expected scores"),
        };
        assert_eq!(out, vec![1.25, -0.75]);
    }

    #[test]
    fn binary_logistic_base_score_is_logit_transformed() {
        let dump = r#"[{"nodeid": 0, "leaf": 0.0}]"#;
        let config = XGBoostConfig {
            num_feature: 1,
            base_score: 0.5,
            objective: XGBoostObjective::BinaryLogistic,
        };
        let model = load_xgboost_model(dump, &config).unwrap();
        // logit(0.5) == 0.0, so the single leaf-0.0 tree plus base score
        // should sigmoid back out to exactly 0.5.
        let pred_config = Configuration {
            pred_kind: PredictKind::Default,
            nthread: 1,
        };
        let input = [0.0f64];
        let out = match predict(&model, Input::F64(&input), 1, &pred_config).unwrap() {
            crate::predict::Output::Scores(v) => v,
            _ => panic!("expected scores"),
        };
        assert!((out[0] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn empty_dump_is_rejected() {
        let config = XGBoostConfig {
            num_feature: 1,
            base_score: 0.0,
            objective: XGBoostObjective::RegSquaredError,
        };
        assert!(load_xgboost_model("[]", &config).is_err());
    }

    #[test]
    fn named_feature_is_rejected() {
        let dump = r#"[
            {
                "nodeid": 0, "split": "age", "split_condition": 30.0,
                "yes": 1, "no": 2, "missing": 1,
                "children": [
                    {"nodeid": 1, "leaf": 1.0},
                    {"nodeid": 2, "leaf": 0.0}
                ]
            }
        ]"#;
        let config = XGBoostConfig {
            num_feature: 1,
            base_score: 0.0,
            objective: XGBoostObjective::RegSquaredError,
        };
        assert!(matches!(
            load_xgboost_model(dump, &config),
            Err(Error::UnknownIdentifier(_))
        ));
    }
}

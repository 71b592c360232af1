//! The post-processor ("pred-transform") catalog.
//!
//! A closed set of named pure numerical functions, looked up by the
//! `Model.postprocessor` string. There is no dynamic user extension of this
//! registry in-core.

use crate::error::{Error, Result};

/// One entry of the post-processor catalog.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PostProcessor {
    Identity,
    SignedSquare,
    Hinge,
    Sigmoid,
    Exponential,
    ExponentialStandardRatio,
    LogarithmOnePlusExp,
    IdentityMulticlass,
    Softmax,
    MulticlassOva,
}

/// Look up a post-processor by its `Model.postprocessor` name. Returns
/// `None` for an unrecognized name (callers turn this into
/// `Error::UnknownIdentifier`).
pub fn lookup(name: &str) -> Option<PostProcessor> {
    Some(match name {
        "identity" => PostProcessor::Identity,
        "signed_square" => PostProcessor::SignedSquare,
        "hinge" => PostProcessor::Hinge,
        "sigmoid" => PostProcessor::Sigmoid,
        "exponential" => PostProcessor::Exponential,
        "exponential_standard_ratio" => PostProcessor::ExponentialStandardRatio,
        "logarithm_one_plus_exp" => PostProcessor::LogarithmOnePlusExp,
        "identity_multiclass" => PostProcessor::IdentityMulticlass,
        "softmax" => PostProcessor::Softmax,
        "multiclass_ova" => PostProcessor::MulticlassOva,
        _ => return None,
    })
}

impl PostProcessor {
    /// Whether this post-processor operates on a whole row (the class
    /// axis) rather than elementwise.
    pub fn is_row_wise(self) -> bool {
        matches!(
            self,
            PostProcessor::IdentityMulticlass | PostProcessor::Softmax | PostProcessor::MulticlassOva
        )
    }

    fn scalar(self, x: f64, sigmoid_alpha: f32, ratio_c: f32) -> f64 {
        match self {
            PostProcessor::Identity => x,
            PostProcessor::SignedSquare => x.signum() * x * x,
            PostProcessor::Hinge => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            PostProcessor::Sigmoid => sigmoid(x, sigmoid_alpha as f64),
            PostProcessor::Exponential => x.exp(),
            PostProcessor::ExponentialStandardRatio => 2f64.powf(-x / ratio_c as f64),
            PostProcessor::LogarithmOnePlusExp => x.exp().ln_1p(),
            PostProcessor::IdentityMulticlass
            | PostProcessor::Softmax
            | PostProcessor::MulticlassOva => {
                unreachable!("row-wise post-processors must go through `apply_row`")
            }
        }
    }

    /// Apply this post-processor in place to one row of accumulated scores.
    pub fn apply_row(self, row: &mut [f64], sigmoid_alpha: f32, ratio_c: f32) {
        match self {
            PostProcessor::IdentityMulticlass => {}
            PostProcessor::Softmax => softmax(row),
            PostProcessor::MulticlassOva => {
                for v in row.iter_mut() {
                    *v = sigmoid(*v, sigmoid_alpha as f64);
                }
            }
            other => {
                for v in row.iter_mut() {
                    *v = other.scalar(*v, sigmoid_alpha, ratio_c);
                }
            }
        }
    }
}

fn sigmoid(x: f64, alpha: f64) -> f64 {
    1.0 / (1.0 + (-alpha * x).exp())
}

/// Numerically-stable softmax: subtract the row max before exponentiating.
fn softmax(row: &mut [f64]) {
    let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for v in row.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in row.iter_mut() {
        *v /= sum;
    }
}

/// Apply `name` (validated to be in the catalog) to every row of `data`,
/// where each row has `row_len` elements.
pub fn apply(name: &str, sigmoid_alpha: f32, ratio_c: f32, data: &mut [f64], row_len: usize) -> Result<()> {
    let pp = lookup(name)
        .ok_or_else(|| Error::UnknownIdentifier(format!("unknown postprocessor '{}'", name)))?;
    if row_len == 0 {
        return Ok(());
    }
    for row in data.chunks_mut(row_len) {
        pp.apply_row(row, sigmoid_alpha, ratio_c);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn sigmoid_matches_closed_form() {
        let mut data = vec![0.0];
        apply("sigmoid", 1.0, 1.0, &mut data, 1).unwrap();
        assert_approx_eq!(data[0], 0.5, 1e-9);
    }

    #[test]
    fn softmax_rows_sum_to_one() {
        let mut data = vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0];
        apply("softmax", 1.0, 1.0, &mut data, 3).unwrap();
        let sum0: f64 = data[0..3].iter().sum();
        let sum1: f64 = data[3..6].iter().sum();
        assert_approx_eq!(sum0, 1.0, 1e-9);
        assert_approx_eq!(sum1, 1.0, 1e-9);
    }

    #[test]
    fn exponential_standard_ratio_matches_closed_form() {
        let mut data = vec![2.0];
        apply("exponential_standard_ratio", 1.0, 2.0, &mut data, 1).unwrap();
        assert_approx_eq!(data[0], 2f64.powf(-1.0), 1e-9);
    }

    #[test]
    fn unknown_postprocessor_is_fatal() {
        let mut data = vec![1.0];
        assert!(apply("no_such_fn", 1.0, 1.0, &mut data, 1).is_err());
    }
}

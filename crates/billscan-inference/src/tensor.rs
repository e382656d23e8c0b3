//! Tensor types exchanged with inference backends.

use ndarray::{Array2, ArrayD};

/// Input tensor for inference.
#[derive(Debug, Clone)]
pub enum InputTensor {
    Float32(ArrayD<f32>),
    Int64(ArrayD<i64>),
}

impl InputTensor {
    /// Build a `[1, n]` feature row, the layout scikit-learn exports expect.
    pub fn feature_row(features: &[f32]) -> Self {
        let row = Array2::from_shape_fn((1, features.len()), |(_, j)| features[j]);
        InputTensor::Float32(row.into_dyn())
    }
}

/// Output tensor from inference.
#[derive(Debug, Clone)]
pub enum OutputTensor {
    Float32(ArrayD<f32>),
    Int64(ArrayD<i64>),
}

impl OutputTensor {
    /// Try to get the inner Float32 array.
    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            OutputTensor::Float32(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to get the inner Int64 array.
    pub fn as_i64(&self) -> Option<&ArrayD<i64>> {
        match self {
            OutputTensor::Int64(arr) => Some(arr),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_feature_row_shape() {
        let InputTensor::Float32(arr) = InputTensor::feature_row(&[0.1, 0.0, 0.7]) else {
            panic!("feature row must be float32");
        };
        assert_eq!(arr.shape(), &[1, 3]);
        assert_eq!(arr.iter().copied().collect::<Vec<f32>>(), vec![0.1, 0.0, 0.7]);
    }

    #[test]
    fn test_output_accessors() {
        let probs = OutputTensor::Float32(ArrayD::from_elem(vec![1, 2], 0.5));
        let label = OutputTensor::Int64(ArrayD::from_elem(vec![1], 3));

        assert_eq!(probs.as_f32().map(|a| a.len()), Some(2));
        assert!(probs.as_i64().is_none());
        assert_eq!(label.as_i64().and_then(|a| a.iter().next().copied()), Some(3));
        assert!(label.as_f32().is_none());
    }
}

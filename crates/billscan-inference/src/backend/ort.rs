//! ONNX Runtime (ort) backend with XNNPACK.

use std::path::Path;
use std::sync::Mutex;

use ndarray::{ArrayD, IxDyn};
use ort::ep::XNNPACK;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session, SessionInputValue};
use ort::value::{DynValue, Tensor};
use tracing::debug;

use crate::error::InferenceError;
use crate::tensor::{InputTensor, OutputTensor};
use crate::{InferenceBackend, Result};

/// Backend running a model inside an ONNX Runtime session.
pub struct OrtBackend {
    session: Mutex<Session>,
    input_names: Vec<String>,
    output_names: Vec<String>,
}

impl OrtBackend {
    /// Load a model from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P, intra_threads: usize) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading ONNX model from: {}", path.display());

        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, intra_threads)
    }

    /// Load a model from bytes.
    pub fn from_bytes(bytes: &[u8], intra_threads: usize) -> Result<Self> {
        debug!("Loading ONNX model from {} bytes", bytes.len());

        let session = Session::builder()
            .map_err(|e| InferenceError::SessionCreate(e.to_string()))?
            .with_execution_providers([XNNPACK::default().build()])
            .map_err(|e| InferenceError::SessionCreate(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError::SessionCreate(e.to_string()))?
            .with_intra_threads(intra_threads.max(1))
            .map_err(|e| InferenceError::SessionCreate(e.to_string()))?
            .commit_from_memory(bytes)
            .map_err(|e| InferenceError::ModelLoad(e.to_string()))?;

        let input_names: Vec<String> = session
            .inputs()
            .iter()
            .map(|i| i.name().to_string())
            .collect();

        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();

        debug!("Model inputs: {:?}, outputs: {:?}", input_names, output_names);

        Ok(Self {
            session: Mutex::new(session),
            input_names,
            output_names,
        })
    }
}

fn convert_input(tensor: &InputTensor) -> Result<SessionInputValue<'static>> {
    match tensor {
        InputTensor::Float32(arr) => {
            let shape: Vec<i64> = arr.shape().iter().map(|&s| s as i64).collect();
            let data: Vec<f32> = arr.iter().copied().collect();
            Tensor::from_array((shape, data))
                .map(Into::into)
                .map_err(|e| InferenceError::InvalidInput(e.to_string()))
        }
        InputTensor::Int64(arr) => {
            let shape: Vec<i64> = arr.shape().iter().map(|&s| s as i64).collect();
            let data: Vec<i64> = arr.iter().copied().collect();
            Tensor::from_array((shape, data))
                .map(Into::into)
                .map_err(|e| InferenceError::InvalidInput(e.to_string()))
        }
    }
}

fn convert_output(name: &str, value: &DynValue) -> Result<OutputTensor> {
    if let Ok((shape, data)) = value.try_extract_tensor::<f32>() {
        let shape: Vec<usize> = shape.iter().map(|&s| s as usize).collect();
        let arr = ArrayD::from_shape_vec(IxDyn(&shape), data.to_vec())
            .map_err(|e| InferenceError::OutputExtraction(e.to_string()))?;
        return Ok(OutputTensor::Float32(arr));
    }

    if let Ok((shape, data)) = value.try_extract_tensor::<i64>() {
        let shape: Vec<usize> = shape.iter().map(|&s| s as usize).collect();
        let arr = ArrayD::from_shape_vec(IxDyn(&shape), data.to_vec())
            .map_err(|e| InferenceError::OutputExtraction(e.to_string()))?;
        return Ok(OutputTensor::Int64(arr));
    }

    Err(InferenceError::OutputExtraction(format!(
        "unsupported output type for '{}'",
        name
    )))
}

impl InferenceBackend for OrtBackend {
    fn run(&self, inputs: &[(&str, InputTensor)]) -> Result<Vec<(String, OutputTensor)>> {
        let ort_inputs: Vec<(&str, SessionInputValue<'static>)> = inputs
            .iter()
            .map(|(name, tensor)| Ok((*name, convert_input(tensor)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| InferenceError::InferenceFailed(format!("failed to lock session: {}", e)))?;

        let outputs = session
            .run(ort_inputs)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let mut results = Vec::with_capacity(outputs.len());
        for (name, value) in outputs.iter() {
            // Non-tensor outputs (e.g. ZipMap sequences) are skipped; the
            // caller looks for the probability tensor by type.
            match convert_output(name, &value) {
                Ok(tensor) => results.push((name.to_string(), tensor)),
                Err(e) => debug!("Skipping output '{}': {}", name, e),
            }
        }

        Ok(results)
    }

    fn input_names(&self) -> &[String] {
        &self.input_names
    }

    fn output_names(&self) -> &[String] {
        &self.output_names
    }
}

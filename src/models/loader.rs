//! ONNX model loader

use crate::config::ModelsConfig;
use crate::error::{EqsError, Result as EqsResult};
use crate::models::inference::QualityModel;
use crate::types::readings::Domain;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::Tensor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Loaded ONNX model for one domain
pub struct OnnxModel {
    /// Domain the model predicts for
    pub domain: Domain,
    /// Model name (file stem)
    pub name: String,
    /// ONNX Runtime session; running it needs exclusive access
    session: Mutex<Session>,
    /// Input name for the model
    pub input_name: String,
    /// Output holding the prediction
    pub output_name: String,
}

impl OnnxModel {
    /// Pull the first prediction out of the model outputs.
    ///
    /// Regressors export an f32 tensor; classifiers export an i64 label tensor.
    fn extract_prediction(&self, outputs: &SessionOutputs) -> EqsResult<f64> {
        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| {
                EqsError::inference(self.domain, format!("missing output {}", self.output_name))
            })?;

        if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
            if let Some(&value) = data.first() {
                debug!(model = %self.name, value = value, "Extracted f32 prediction");
                return Ok(value as f64);
            }
        }

        if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
            if let Some(&label) = data.first() {
                debug!(model = %self.name, label = label, "Extracted class label");
                return Ok(label as f64);
            }
        }

        Err(EqsError::inference(
            self.domain,
            format!("output {} holds no numeric prediction", self.output_name),
        ))
    }
}

impl QualityModel for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &[f32]) -> EqsResult<f64> {
        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .map_err(|e| EqsError::inference(self.domain, e))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| EqsError::inference(self.domain, format!("lock error: {}", e)))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_tensor])
            .map_err(|e| EqsError::inference(self.domain, e))?;

        self.extract_prediction(&outputs)
    }
}

/// Domain models loaded at startup
pub struct DomainModels {
    pub air: Arc<dyn QualityModel>,
    pub water: Arc<dyn QualityModel>,
    pub soil: Arc<dyn QualityModel>,
}

/// Loader for ONNX models
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
    /// Output name override
    output_name: Option<String>,
}

impl ModelLoader {
    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        // Initialize ONNX Runtime
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self {
            onnx_threads,
            output_name: None,
        })
    }

    /// Read predictions from a named output instead of the first one
    pub fn with_output_name(mut self, output_name: Option<String>) -> Self {
        self.output_name = output_name;
        self
    }

    /// Load a single ONNX model from file
    pub fn load_model<P: AsRef<Path>>(&self, path: P, domain: Domain) -> Result<OnnxModel> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}_model", domain));

        info!(
            model = %name,
            domain = %domain,
            path = %path.display(),
            threads = self.onnx_threads,
            "Loading ONNX model"
        );

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load {} model from {}", domain, path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        // Regressors expose "variable", classifiers expose "label" first
        let output_name = match &self.output_name {
            Some(name) => name.clone(),
            None => session
                .outputs
                .first()
                .map(|o| o.name.clone())
                .unwrap_or_else(|| "variable".to_string()),
        };

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(OnnxModel {
            domain,
            name,
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }

    /// Load the air, water and soil models; all three are required
    pub fn load_domain_models(&self, config: &ModelsConfig) -> Result<DomainModels> {
        let models_dir = Path::new(&config.models_dir);

        let load = |domain: Domain, file: &str| -> Result<Arc<dyn QualityModel>> {
            let path = models_dir.join(file);
            anyhow::ensure!(
                path.exists(),
                "{} model not found at {}",
                domain,
                path.display()
            );
            let model: Arc<dyn QualityModel> = Arc::new(self.load_model(&path, domain)?);
            Ok(model)
        };

        let models = DomainModels {
            air: load(Domain::Air, &config.air_model)?,
            water: load(Domain::Water, &config.water_model)?,
            soil: load(Domain::Soil, &config.soil_model)?,
        };

        info!(models_dir = %models_dir.display(), "Loaded air, water and soil models");

        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_reported() {
        let loader = ModelLoader {
            onnx_threads: 1,
            output_name: None,
        };
        let config = ModelsConfig {
            models_dir: std::env::temp_dir()
                .join(format!("eqs-missing-{}", uuid::Uuid::new_v4()))
                .to_string_lossy()
                .into_owned(),
            onnx_threads: 1,
            air_model: "air_model.onnx".to_string(),
            water_model: "water_model.onnx".to_string(),
            soil_model: "soil_model.onnx".to_string(),
            output_name: None,
        };

        let err = loader.load_domain_models(&config).err().unwrap();
        assert!(err.to_string().starts_with("air model not found"));
    }
}

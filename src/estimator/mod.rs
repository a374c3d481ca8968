//! The `predict(record) -> cost` boundary and its backends

pub mod command;
pub mod features;
pub mod model;

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::config::EstimatorConfig;
use crate::form::InputRecord;

/// Highest age served by the young-adult model
pub const YOUNG_AGE_LIMIT: u32 = 25;

#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("model file not found: {}", .path.display())]
    ModelMissing { path: PathBuf },

    #[error("failed to read model file {}: {source}", .path.display())]
    ReadModel {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid model file {}: {source}", .path.display())]
    ParseModel {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed tree: {0}")]
    MalformedTree(String),

    #[error("model file {} uses unknown feature column `{column}`", .path.display())]
    UnknownColumn { path: PathBuf, column: String },

    #[error("failed to start estimator `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Failed(String),

    #[error("estimator printed an unreadable cost: {0:?}")]
    InvalidOutput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Encode(#[from] serde_json::Error),
}

/// A pre-trained cost model behind a single call
pub trait Estimator: Send + Sync {
    fn predict(&self, record: &InputRecord) -> Result<f64, EstimatorError>;

    /// Short description for the status line and logs
    fn describe(&self) -> String;
}

/// Model family that serves a given age
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    Young,
    Rest,
}

impl ModelFamily {
    pub fn for_age(age: u32) -> Self {
        if age > YOUNG_AGE_LIMIT {
            ModelFamily::Rest
        } else {
            ModelFamily::Young
        }
    }

    pub fn model_name(self) -> &'static str {
        match self {
            ModelFamily::Young => "Linear Regression",
            ModelFamily::Rest => "Gradient Boosted Trees",
        }
    }

    pub fn age_group(self) -> &'static str {
        match self {
            ModelFamily::Young => "Age ≤ 25",
            ModelFamily::Rest => "Age > 25",
        }
    }

    pub fn artifact_file(self) -> &'static str {
        match self {
            ModelFamily::Young => "model_young.json",
            ModelFamily::Rest => "model_rest.json",
        }
    }
}

/// Build the backend named in the config
pub fn from_config(config: &EstimatorConfig) -> Arc<dyn Estimator> {
    match config {
        EstimatorConfig::Builtin { models_dir } => {
            let dir = models_dir.clone().unwrap_or_else(crate::config::default_models_dir);
            Arc::new(model::ArtifactEstimator::new(dir))
        }
        EstimatorConfig::Command { program, args } => {
            Arc::new(command::CommandEstimator::new(program.clone(), args.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_routing_by_age() {
        assert_eq!(ModelFamily::for_age(18), ModelFamily::Young);
        assert_eq!(ModelFamily::for_age(25), ModelFamily::Young);
        assert_eq!(ModelFamily::for_age(26), ModelFamily::Rest);
        assert_eq!(ModelFamily::for_age(100), ModelFamily::Rest);
    }

    #[test]
    fn test_missing_model_message() {
        let err = EstimatorError::ModelMissing { path: PathBuf::from("/models/model_rest.json") };
        assert_eq!(err.to_string(), "model file not found: /models/model_rest.json");
    }

    #[test]
    fn test_from_config_describes_backend() {
        let estimator = from_config(&EstimatorConfig::Command {
            program: "python3".to_string(),
            args: vec!["prediction_helper.py".to_string()],
        });
        assert_eq!(estimator.describe(), "python3 prediction_helper.py");
    }
}

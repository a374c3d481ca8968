//! Built-in estimator over JSON model artifacts
//!
//! Each age group has its own artifact: a min-max scaler plus either a linear
//! model or a tree ensemble in XGBoost's JSON dump layout. Artifacts are read
//! from disk on every call.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::features::{self, FeatureRow};
use super::{Estimator, EstimatorError, ModelFamily};
use crate::form::InputRecord;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

impl MinMax {
    fn scale(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span.abs() < f64::EPSILON {
            0.0
        } else {
            (value - self.min) / span
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    #[serde(default)]
    pub scaler: BTreeMap<String, MinMax>,
    pub model: Regressor,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Regressor {
    Linear {
        intercept: f64,
        coefficients: BTreeMap<String, f64>,
    },
    TreeEnsemble {
        #[serde(default)]
        base_score: f64,
        trees: Vec<TreeNode>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        nodeid: u32,
        split: String,
        split_condition: f64,
        yes: u32,
        no: u32,
        #[serde(default)]
        missing: Option<u32>,
        children: Vec<TreeNode>,
    },
    Leaf {
        nodeid: u32,
        leaf: f64,
    },
}

impl TreeNode {
    fn id(&self) -> u32 {
        match self {
            TreeNode::Split { nodeid, .. } | TreeNode::Leaf { nodeid, .. } => *nodeid,
        }
    }

    fn split_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let TreeNode::Split { split, children, .. } = self {
            out.push(split);
            for child in children {
                child.split_columns(out);
            }
        }
    }

    fn evaluate(&self, row: &FeatureRow) -> Result<f64, EstimatorError> {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { leaf, .. } => return Ok(*leaf),
                TreeNode::Split {
                    nodeid,
                    split,
                    split_condition,
                    yes,
                    no,
                    missing,
                    children,
                } => {
                    let next = match row.get(split) {
                        Some(value) if value < *split_condition => *yes,
                        Some(_) => *no,
                        None => missing.unwrap_or(*yes),
                    };
                    node = children.iter().find(|c| c.id() == next).ok_or_else(|| {
                        EstimatorError::MalformedTree(format!("node {} has no child {}", nodeid, next))
                    })?;
                }
            }
        }
    }
}

impl ModelArtifact {
    pub fn load(path: &Path) -> Result<Self, EstimatorError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                EstimatorError::ModelMissing { path: path.to_path_buf() }
            } else {
                EstimatorError::ReadModel {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let artifact: Self = serde_json::from_str(&content).map_err(|source| EstimatorError::ParseModel {
            path: path.to_path_buf(),
            source,
        })?;

        match artifact.unknown_column() {
            Some(column) => Err(EstimatorError::UnknownColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            }),
            None => Ok(artifact),
        }
    }

    /// First scaler, coefficient or split name that `encode` never produces
    pub fn unknown_column(&self) -> Option<&str> {
        let mut names: Vec<&str> = self.scaler.keys().map(String::as_str).collect();
        match &self.model {
            Regressor::Linear { coefficients, .. } => names.extend(coefficients.keys().map(String::as_str)),
            Regressor::TreeEnsemble { trees, .. } => {
                for tree in trees {
                    tree.split_columns(&mut names);
                }
            }
        }
        names.into_iter().find(|name| !features::COLUMNS.contains(name))
    }

    /// Apply the scaler to every column it knows about
    pub fn scale(&self, mut row: FeatureRow) -> FeatureRow {
        for column in features::COLUMNS {
            if let (Some(range), Some(value)) = (self.scaler.get(column), row.get(column)) {
                row.set(column, range.scale(value));
            }
        }
        row
    }

    pub fn predict(&self, record: &InputRecord) -> Result<f64, EstimatorError> {
        let row = self.scale(features::encode(record));

        match &self.model {
            Regressor::Linear { intercept, coefficients } => Ok(coefficients
                .iter()
                .map(|(column, weight)| weight * row.get(column).unwrap_or(0.0))
                .sum::<f64>()
                + intercept),
            Regressor::TreeEnsemble { base_score, trees } => {
                let mut total = *base_score;
                for tree in trees {
                    total += tree.evaluate(&row)?;
                }
                Ok(total)
            }
        }
    }
}

/// Routes each record to the artifact for its age group
pub struct ArtifactEstimator {
    models_dir: PathBuf,
}

impl ArtifactEstimator {
    pub fn new(models_dir: PathBuf) -> Self {
        Self { models_dir }
    }

    pub fn artifact_path(&self, family: ModelFamily) -> PathBuf {
        self.models_dir.join(family.artifact_file())
    }
}

impl Estimator for ArtifactEstimator {
    fn predict(&self, record: &InputRecord) -> Result<f64, EstimatorError> {
        let family = ModelFamily::for_age(record.age);
        let path = self.artifact_path(family);
        tracing::debug!("Estimating with {:?} model at {}", family, path.display());

        ModelArtifact::load(&path)?.predict(record)
    }

    fn describe(&self) -> String {
        format!("built-in models in {}", self.models_dir.display())
    }
}

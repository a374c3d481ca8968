//! Prediction gateway: one record in, one displayable outcome out

use std::sync::Arc;

use crate::estimator::{Estimator, ModelFamily};
use crate::form::InputRecord;

/// Result of a single submission; always exactly one of the two
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    Estimated { cost: f64, family: ModelFamily },
    Failed(String),
}

impl PredictionOutcome {
    /// Headline shown to the user
    pub fn message(&self) -> String {
        match self {
            PredictionOutcome::Estimated { cost, .. } => {
                format!("Predicted Health Insurance Cost: {}", format_currency(*cost))
            }
            PredictionOutcome::Failed(reason) => format!("Error making prediction: {}", reason),
        }
    }

    /// Secondary line naming the model that served the estimate
    pub fn model_note(&self) -> Option<String> {
        match self {
            PredictionOutcome::Estimated { family, .. } => {
                Some(format!("Prediction made using {}", family.model_name()))
            }
            PredictionOutcome::Failed(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PredictionOutcome::Estimated { .. })
    }
}

#[derive(Clone)]
pub struct PredictionGateway {
    estimator: Arc<dyn Estimator>,
}

impl PredictionGateway {
    pub fn new(estimator: Arc<dyn Estimator>) -> Self {
        Self { estimator }
    }

    pub fn describe(&self) -> String {
        self.estimator.describe()
    }

    /// Call the estimator once on the current thread
    pub fn estimate(&self, record: &InputRecord) -> PredictionOutcome {
        let family = ModelFamily::for_age(record.age);

        let outcome = match record.validate().map_err(|e| e.to_string()).and_then(|()| {
            self.estimator.predict(record).map_err(|e| e.to_string())
        }) {
            Ok(cost) if cost.is_finite() && cost >= 0.0 => PredictionOutcome::Estimated { cost, family },
            Ok(cost) => PredictionOutcome::Failed(format!("estimator returned an invalid cost: {}", cost)),
            Err(reason) => PredictionOutcome::Failed(reason),
        };

        match &outcome {
            PredictionOutcome::Estimated { cost, .. } => {
                tracing::debug!("Estimated {:.2} for age {} ({:?})", cost, record.age, family)
            }
            PredictionOutcome::Failed(reason) => tracing::warn!("Prediction failed: {}", reason),
        }

        outcome
    }

    /// Run the estimator on the blocking pool and wait for it
    pub async fn submit(&self, record: InputRecord) -> PredictionOutcome {
        let gateway = self.clone();
        match tokio::task::spawn_blocking(move || gateway.estimate(&record)).await {
            Ok(outcome) => outcome,
            Err(e) => PredictionOutcome::Failed(format!("estimator task failed: {}", e)),
        }
    }
}

/// Format as rupees with thousands separators and two decimals, e.g. `₹12,345.67`
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}₹{}.{}", sign, grouped, cents)
}

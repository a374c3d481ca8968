//! Pre-rendered feature importance charts
//!
//! Charts are optional. A missing file produces a fallback warning instead of
//! an error.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::AssetsConfig;
use crate::estimator::ModelFamily;

#[derive(Debug, Clone, PartialEq)]
pub enum ChartStatus {
    Available { path: PathBuf, bytes: u64 },
    Missing { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureChart {
    pub family: ModelFamily,
    pub status: ChartStatus,
}

impl FeatureChart {
    pub fn locate(family: ModelFamily, path: PathBuf) -> Self {
        let status = match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => ChartStatus::Available { bytes: meta.len(), path },
            Ok(_) | Err(_) => {
                tracing::debug!("Feature importance chart not found at {}", path.display());
                ChartStatus::Missing { path }
            }
        };
        Self { family, status }
    }

    pub fn title(&self) -> String {
        format!("{} Model ({})", self.family.age_group(), self.family.model_name())
    }

    pub fn is_available(&self) -> bool {
        matches!(self.status, ChartStatus::Available { .. })
    }

    pub fn path(&self) -> &Path {
        match &self.status {
            ChartStatus::Available { path, .. } | ChartStatus::Missing { path } => path,
        }
    }

    /// Text for the chart panel: the file, or a fallback warning
    pub fn caption(&self) -> String {
        match &self.status {
            ChartStatus::Available { path, bytes } => {
                format!("{} ({} KB)", path.display(), bytes.div_ceil(1024))
            }
            ChartStatus::Missing { .. } => format!(
                "Feature importance chart for {} will be displayed here when available",
                self.family.age_group()
            ),
        }
    }
}

/// Both charts, Age > 25 first
pub fn locate_charts(config: &AssetsConfig) -> [FeatureChart; 2] {
    [
        FeatureChart::locate(ModelFamily::Rest, config.dir.join(&config.over_25_chart)),
        FeatureChart::locate(ModelFamily::Young, config.dir.join(&config.under_25_chart)),
    ]
}

/// Hand an available chart to the configured image viewer
pub fn open_chart(chart: &FeatureChart, viewer: &str) -> Result<()> {
    if !chart.is_available() {
        anyhow::bail!("{}", chart.caption());
    }

    Command::new(viewer)
        .arg(chart.path())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to launch {}", viewer))?;
    tracing::info!("Opened {} with {}", chart.path().display(), viewer);
    Ok(())
}

/// Observations about what drives each model's predictions
pub fn key_insights(family: ModelFamily) -> &'static [&'static str] {
    match family {
        ModelFamily::Rest => &[
            "Top drivers: Insurance plan, Age, and Risk Score.",
            "Health risks: Obesity, Smoking, and Overweight BMI strongly increase predictions.",
            "Moderate impact: Self-employment, Gender, Genetic risk, and Region.",
            "Negative impact: More Dependents, Higher Income, and Unmarried status lower predictions.",
            "Model is mainly driven by insurance, age, and health risk factors.",
        ],
        ModelFamily::Young => &[
            "Top drivers: Insurance plan, Genetic risk, and Risk score.",
            "Health risks: Obesity, Regular smoking, and Overweight BMI increase predictions.",
            "Moderate impact: Occasional smoking, Underweight BMI, Dependents, and Marital status.",
            "Minimal effect: Gender, Region, Employment, Income, and Age.",
            "Model is mainly driven by insurance type and genetic/health risk factors.",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_chart_has_fallback_warning() {
        let dir = tempfile::tempdir().unwrap();
        let config = AssetsConfig {
            dir: dir.path().to_path_buf(),
            ..AssetsConfig::default()
        };
        let [over, under] = locate_charts(&config);

        assert!(!over.is_available());
        assert_eq!(
            over.caption(),
            "Feature importance chart for Age > 25 will be displayed here when available"
        );
        assert_eq!(
            under.caption(),
            "Feature importance chart for Age ≤ 25 will be displayed here when available"
        );
    }

    #[test]
    fn test_present_chart_is_available() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("feature_importance_under_25.jpeg"), vec![0u8; 2048]).unwrap();
        let config = AssetsConfig {
            dir: dir.path().to_path_buf(),
            ..AssetsConfig::default()
        };
        let [over, under] = locate_charts(&config);

        assert!(!over.is_available());
        assert!(under.is_available());
        assert!(under.caption().ends_with("(2 KB)"));
        assert_eq!(under.title(), "Age ≤ 25 Model (Linear Regression)");
    }

    #[test]
    fn test_directory_is_not_a_chart() {
        let dir = tempfile::tempdir().unwrap();
        let chart = FeatureChart::locate(ModelFamily::Rest, dir.path().to_path_buf());
        assert!(!chart.is_available());
    }

    #[test]
    fn test_open_missing_chart_fails_with_caption() {
        let chart = FeatureChart::locate(ModelFamily::Rest, PathBuf::from("/nonexistent/chart.jpeg"));
        let err = open_chart(&chart, "xdg-open").unwrap_err();
        assert!(err.to_string().contains("will be displayed here when available"));
    }
}

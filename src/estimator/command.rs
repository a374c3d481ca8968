//! Estimator that lives in another process
//!
//! The record is written to the program's stdin as JSON and the cost is read
//! back from stdout.

use std::io::Write;
use std::process::{Command, Stdio};

use super::{Estimator, EstimatorError};
use crate::form::InputRecord;

pub struct CommandEstimator {
    program: String,
    args: Vec<String>,
}

impl CommandEstimator {
    pub fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }
}

impl Estimator for CommandEstimator {
    fn predict(&self, record: &InputRecord) -> Result<f64, EstimatorError> {
        let payload = serde_json::to_vec(record)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EstimatorError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A child that exits without reading its input still reports through
            // its exit status and stderr
            match stdin.write_all(&payload) {
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                result => result?,
            }
            // stdin is dropped here so the child sees EOF
        }

        let output = child.wait_with_output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("estimator exited with {}", output.status)
            } else {
                stderr
            };
            return Err(EstimatorError::Failed(message));
        }

        parse_cost(&String::from_utf8_lossy(&output.stdout))
    }

    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Take the last non-empty line of output as the cost
fn parse_cost(stdout: &str) -> Result<f64, EstimatorError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .rev()
        .find(|l| !l.is_empty())
        .unwrap_or("");

    line.parse::<f64>()
        .map_err(|_| EstimatorError::InvalidOutput(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cost() {
        assert_eq!(parse_cost("12345.67\n").unwrap(), 12345.67);
        assert_eq!(parse_cost("loading models\n 9999 \n\n").unwrap(), 9999.0);
        assert!(matches!(parse_cost(""), Err(EstimatorError::InvalidOutput(_))));
        assert!(matches!(parse_cost("n/a"), Err(EstimatorError::InvalidOutput(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_reads_cost_from_stdout() {
        let estimator = CommandEstimator::new(
            "sh".to_string(),
            vec!["-c".to_string(), "grep -q '\"Age\":30' && echo 12345.67".to_string()],
        );
        let record = InputRecord { age: 30, ..InputRecord::default() };
        assert_eq!(estimator.predict(&record).unwrap(), 12345.67);
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_carries_stderr() {
        let estimator = CommandEstimator::new(
            "sh".to_string(),
            vec!["-c".to_string(), "cat > /dev/null; echo 'model file not found' >&2; exit 1".to_string()],
        );
        let err = estimator.predict(&InputRecord::default()).unwrap_err();
        assert_eq!(err.to_string(), "model file not found");
    }

    #[cfg(unix)]
    #[test]
    fn test_stderr_kept_when_input_is_never_read() {
        let estimator = CommandEstimator::new(
            "sh".to_string(),
            vec!["-c".to_string(), "exec 0<&-; echo 'model file not found' >&2; exit 1".to_string()],
        );
        // The write races the child's exit, so repeat to hit the closed pipe
        for _ in 0..200 {
            let err = estimator.predict(&InputRecord::default()).unwrap_err();
            assert_eq!(err.to_string(), "model file not found");
        }
    }

    #[test]
    fn test_missing_program() {
        let estimator = CommandEstimator::new("premia-no-such-estimator".to_string(), Vec::new());
        let err = estimator.predict(&InputRecord::default()).unwrap_err();
        assert!(matches!(err, EstimatorError::Spawn { .. }));
    }
}

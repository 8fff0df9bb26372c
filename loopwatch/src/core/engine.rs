//! Pure single-artifact evaluation: detect, then normalize or run heuristics.

use anyhow::Result;

use crate::core::format::{Classified, classify};
use crate::core::heuristics::{CollectedInputs, analyze_output};
use crate::core::normalize::normalize;
use crate::core::types::{Analysis, NormalizedResponse, OutputFormat, Thresholds};
use crate::core::vocabulary::{Vocabulary, VocabularyConfig};

/// Result of evaluating one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub format: OutputFormat,
    pub analysis: Analysis,
    /// Loop number reported inside a JSON response, if any.
    pub reported_loop: Option<u32>,
}

/// Compiled vocabulary plus thresholds; build once per invocation.
#[derive(Debug, Clone)]
pub struct Engine {
    vocabulary: Vocabulary,
    thresholds: Thresholds,
}

impl Engine {
    pub fn new(vocabulary: &VocabularyConfig, thresholds: Thresholds) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self {
            vocabulary: Vocabulary::new(vocabulary)?,
            thresholds,
        })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn evaluate(&self, content: &[u8], inputs: &CollectedInputs) -> Evaluation {
        let output_length = content.len() as u64;
        match classify(content) {
            Classified::Json(value) => {
                let response = normalize(&value, &self.thresholds);
                let reported_loop = Some(response.loop_number).filter(|n| *n > 0);
                Evaluation {
                    format: OutputFormat::Json,
                    analysis: structured_analysis(response, inputs, output_length),
                    reported_loop,
                }
            }
            Classified::Text => Evaluation {
                format: OutputFormat::Text,
                analysis: analyze_output(content, inputs, &self.vocabulary, &self.thresholds),
                reported_loop: None,
            },
        }
    }
}

/// Working-copy changes and reported file counts both count as progress.
fn structured_analysis(
    response: NormalizedResponse,
    inputs: &CollectedInputs,
    output_length: u64,
) -> Analysis {
    let files_modified = response.files_modified.max(inputs.modified_files);
    Analysis {
        status: response.status,
        has_completion_signal: response.has_completion_signal,
        is_test_only: response.is_test_only,
        is_stuck: response.is_stuck,
        has_progress: files_modified > 0,
        files_modified,
        confidence_score: response.confidence,
        exit_signal: response.exit_signal,
        work_summary: response.summary,
        output_length,
        session_id: response.session_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::WorkStatus;

    fn engine() -> Engine {
        Engine::new(&VocabularyConfig::default(), Thresholds::default()).expect("engine")
    }

    #[test]
    fn json_path_reports_format_and_loop() {
        let eval = engine().evaluate(
            br#"{"status":"IN_PROGRESS","loop_number":9,"files_modified":1}"#,
            &CollectedInputs::default(),
        );
        assert_eq!(eval.format, OutputFormat::Json);
        assert_eq!(eval.reported_loop, Some(9));
        assert!(eval.analysis.has_progress);
        assert_eq!(eval.analysis.status, WorkStatus::InProgress);
    }

    #[test]
    fn json_path_takes_larger_file_count() {
        let eval = engine().evaluate(
            br#"{"files_modified":1}"#,
            &CollectedInputs {
                modified_files: 4,
                previous_output_length: None,
            },
        );
        assert_eq!(eval.analysis.files_modified, 4);
    }

    #[test]
    fn malformed_json_runs_heuristics() {
        let eval = engine().evaluate(b"{ all tasks complete", &CollectedInputs::default());
        assert_eq!(eval.format, OutputFormat::Text);
        assert!(eval.analysis.exit_signal);
        assert_eq!(eval.reported_loop, None);
    }

    #[test]
    fn invalid_thresholds_are_rejected() {
        let thresholds = Thresholds {
            stuck_window: 0,
            ..Thresholds::default()
        };
        assert!(Engine::new(&VocabularyConfig::default(), thresholds).is_err());
    }
}

//! Ordered matcher lists used by the text heuristics and fingerprinting.
//!
//! Keyword lists match case-insensitively as substrings and report the first
//! entry (in configured order) that hits. The error grammar is a regex set with
//! an exclude pre-filter: a line is an error line when it does not match any
//! exclude pattern and matches at least one error pattern.

use anyhow::{Context, Result, anyhow};
use regex::RegexSet;
use serde::{Deserialize, Serialize};

const COMPLETION: &[&str] = &[
    "done",
    "complete",
    "finished",
    "all tasks complete",
    "project complete",
    "ready for review",
];
const NO_WORK: &[&str] = &[
    "nothing to do",
    "no changes",
    "already implemented",
    "up to date",
];
const TEST_COMMANDS: &[&str] = &[
    "running tests",
    "npm test",
    "bats",
    "pytest",
    "jest",
    "cargo test",
    "go test",
];
const IMPLEMENTATION: &[&str] = &[
    "implementing",
    "creating",
    "writing",
    "adding",
    "function",
    "class",
];
const SUMMARY_MARKERS: &[&str] = &["summary", "completed", "implemented"];
const ERROR_PATTERNS: &[&str] = &[
    r"^Error:",
    r"^ERROR:",
    r"^error:",
    r"\]: error",
    r"Link: error",
    r"Error occurred",
    r"failed with error",
    r"[Ee]xception",
    r"Fatal",
    r"FATAL",
];
// Lines like `"is_error": false,` are field declarations, not failures.
const ERROR_EXCLUDES: &[&str] = &[r#""[^"]*error[^"]*":"#];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|item| item.to_string()).collect()
}

/// Vocabulary lists as configured (`[vocabulary]` in `config.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VocabularyConfig {
    pub completion: Vec<String>,
    pub no_work: Vec<String>,
    pub test_commands: Vec<String>,
    pub implementation: Vec<String>,
    pub summary_markers: Vec<String>,
    /// Regular expressions, evaluated per line.
    pub error_patterns: Vec<String>,
    /// Regular expressions; matching lines are never counted as errors.
    pub error_excludes: Vec<String>,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            completion: owned(COMPLETION),
            no_work: owned(NO_WORK),
            test_commands: owned(TEST_COMMANDS),
            implementation: owned(IMPLEMENTATION),
            summary_markers: owned(SUMMARY_MARKERS),
            error_patterns: owned(ERROR_PATTERNS),
            error_excludes: owned(ERROR_EXCLUDES),
        }
    }
}

/// Case-insensitive keyword list that preserves configured order.
#[derive(Debug, Clone)]
pub struct KeywordList {
    keywords: Vec<String>,
}

impl KeywordList {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|keyword| keyword.trim().to_lowercase())
                .filter(|keyword| !keyword.is_empty())
                .collect(),
        }
    }

    /// First keyword (in list order) contained anywhere in `text`.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.keywords
            .iter()
            .find(|keyword| haystack.contains(keyword.as_str()))
            .map(String::as_str)
    }

    pub fn matches(&self, text: &str) -> bool {
        self.first_match(text).is_some()
    }

    /// Number of lines in `text` containing at least one keyword.
    pub fn count_lines(&self, text: &str) -> usize {
        text.lines().filter(|line| self.matches(line)).count()
    }
}

/// Two-stage line filter that recognizes error lines.
#[derive(Debug, Clone)]
pub struct ErrorGrammar {
    patterns: RegexSet,
    excludes: RegexSet,
}

impl ErrorGrammar {
    pub fn new(patterns: &[String], excludes: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Err(anyhow!("vocabulary.error_patterns must not be empty"));
        }
        let patterns = RegexSet::new(patterns).context("compile vocabulary.error_patterns")?;
        let excludes = RegexSet::new(excludes).context("compile vocabulary.error_excludes")?;
        Ok(Self { patterns, excludes })
    }

    pub fn is_error_line(&self, line: &str) -> bool {
        !self.excludes.is_match(line) && self.patterns.is_match(line)
    }

    pub fn error_lines<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        text.lines().filter(|line| self.is_error_line(line))
    }

    pub fn count_lines(&self, text: &str) -> usize {
        self.error_lines(text).count()
    }
}

/// Compiled vocabulary shared by every heuristic pass.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    pub completion: KeywordList,
    pub no_work: KeywordList,
    pub test_commands: KeywordList,
    pub implementation: KeywordList,
    pub summary_markers: KeywordList,
    pub errors: ErrorGrammar,
}

impl Vocabulary {
    pub fn new(config: &VocabularyConfig) -> Result<Self> {
        Ok(Self {
            completion: KeywordList::new(&config.completion),
            no_work: KeywordList::new(&config.no_work),
            test_commands: KeywordList::new(&config.test_commands),
            implementation: KeywordList::new(&config.implementation),
            summary_markers: KeywordList::new(&config.summary_markers),
            errors: ErrorGrammar::new(&config.error_patterns, &config.error_excludes)?,
        })
    }
}

use serde::{Deserialize, Serialize};

/// Job descriptions shorter than this (after trimming) are rejected.
pub const MIN_JOB_DESCRIPTION_CHARS: usize = 10;
pub const MAX_JOB_DESCRIPTION_CHARS: usize = 5000;

/// Normalized match assessment returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// 0 to 100
    pub score: f64,
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub recommendation: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub areas_for_improvement: Vec<String>,
}

//! Deterministic, network-free provider.
//!
//! Scores by keyword overlap against a fixed skill vocabulary. Used when no
//! credential is configured and throughout the test suite.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use super::{AnalysisProvider, ProviderError, RawAnalysisResult};

const PROVIDER: &str = "mock";

const SKILL_VOCABULARY: &[&str] = &[
    "python",
    "javascript",
    "react",
    "fastapi",
    "docker",
    "aws",
    "sql",
    "git",
    "api",
    "testing",
    "agile",
    "typescript",
];

/// Bonus added on top of the overlap ratio.
const BASE_BONUS: f64 = 20.0;
const MAX_LISTED_SKILLS: usize = 5;

const DEFAULT_MATCHING: &[&str] = &["Communication", "Problem Solving"];
const DEFAULT_MISSING: &[&str] = &["Leadership", "Project Management"];

const STRENGTHS: &[&str] = &[
    "Strong technical background",
    "Relevant work experience",
    "Clear communication skills",
];

const AREAS_FOR_IMPROVEMENT: &[&str] = &[
    "Could highlight more specific achievements",
    "Consider adding certifications",
    "Expand on leadership experience",
];

#[derive(Debug, Default, Clone)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        info!("Mock AI provider initialized (no network calls)");
        Self
    }
}

/// Overlap score: `min(100, matched / (matched + missing) * 100 + 20)`,
/// or the bare bonus when no vocabulary token appears in the job text.
/// Rounded to one decimal place.
pub fn overlap_score(matched: usize, missing: usize) -> f64 {
    let considered = matched + missing;
    let score = if considered == 0 {
        BASE_BONUS
    } else {
        (matched as f64 / considered as f64 * 100.0 + BASE_BONUS).min(100.0)
    };
    (score * 10.0).round() / 10.0
}

pub fn score_band(score: f64) -> &'static str {
    if score > 70.0 {
        "strong"
    } else if score > 50.0 {
        "moderate"
    } else {
        "developing"
    }
}

fn build_recommendation(score: f64, matching: &[&str], missing: &[&str]) -> String {
    let shown_strengths = if matching.is_empty() {
        "core competencies".to_string()
    } else {
        matching.iter().take(3).copied().collect::<Vec<_>>().join(", ")
    };
    let shown_gaps = if missing.is_empty() {
        "additional skills".to_string()
    } else {
        missing.iter().take(2).copied().collect::<Vec<_>>().join(", ")
    };

    format!(
        "The candidate shows a {score:.0}% match with the job requirements. \
         They demonstrate strong skills in {shown_strengths}. \
         To improve their profile, they should focus on developing {shown_gaps}. \
         Overall, this is a {} candidate for the role.",
        score_band(score)
    )
}

fn listed_or_default(skills: &[&str], default: &[&str]) -> Vec<String> {
    let source = if skills.is_empty() { default } else { skills };
    source
        .iter()
        .take(MAX_LISTED_SKILLS)
        .map(|s| s.to_string())
        .collect()
}

#[async_trait]
impl AnalysisProvider for MockProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn analyze(
        &self,
        cv_text: &str,
        job_description: &str,
    ) -> Result<RawAnalysisResult, ProviderError> {
        info!("Generating mock CV analysis");

        let cv_lower = cv_text.to_lowercase();
        let jd_lower = job_description.to_lowercase();

        let (matching, missing): (Vec<&str>, Vec<&str>) = SKILL_VOCABULARY
            .iter()
            .copied()
            .filter(|skill| jd_lower.contains(skill))
            .partition(|skill| cv_lower.contains(skill));

        let score = overlap_score(matching.len(), missing.len());

        let mut result = RawAnalysisResult::new();
        result.insert("score".into(), json!(score));
        result.insert(
            "matching_skills".into(),
            json!(listed_or_default(&matching, DEFAULT_MATCHING)),
        );
        result.insert(
            "missing_skills".into(),
            json!(listed_or_default(&missing, DEFAULT_MISSING)),
        );
        result.insert("strengths".into(), json!(STRENGTHS));
        result.insert("areas_for_improvement".into(), json!(AREAS_FOR_IMPROVEMENT));
        result.insert(
            "recommendation".into(),
            json!(build_recommendation(score, &matching, &missing)),
        );
        Ok(result)
    }
}

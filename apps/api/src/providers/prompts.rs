// Prompt text shared by every LLM-backed provider.

/// System instruction sent alongside the analysis prompt.
pub const ANALYSIS_SYSTEM: &str = "You are an expert HR consultant and career advisor. \
    Analyze CVs against job descriptions and provide structured feedback in JSON format.";

/// Builds the single user prompt embedding both texts verbatim.
pub fn build_analysis_prompt(cv_text: &str, job_description: &str) -> String {
    format!(
        r#"Analyze the following CV against the job description and provide a detailed assessment.

JOB DESCRIPTION:
{job_description}

CANDIDATE CV:
{cv_text}

Provide your analysis in the following JSON format (return ONLY valid JSON, no additional text):
{{
    "score": <number between 0-100 indicating match quality>,
    "matching_skills": [<list of skills from CV that match job requirements>],
    "missing_skills": [<list of important skills from job description missing in CV>],
    "strengths": [<list of candidate's key strengths>],
    "areas_for_improvement": [<list of areas where candidate could improve>],
    "recommendation": "<detailed text recommendation explaining the match, strengths, gaps, and overall assessment>"
}}

Be specific, actionable, and constructive in your analysis. Return ONLY valid JSON."#
    )
}

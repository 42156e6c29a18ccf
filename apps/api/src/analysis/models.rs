//! Output shapes the model must return for each flow.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm_client::LlmError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementAnalysis {
    pub overall_feedback: String,
    pub skills_gap_analysis: String,
    pub suggested_actions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewritten_section: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMatchAnalysis {
    /// 0 – 100
    pub match_score: f64,
    pub strengths: String,
    pub missing_skills: String,
    pub improvement_suggestions: String,
}

impl JobMatchAnalysis {
    /// Clamps the score into 0–100. A non-finite score is treated as a
    /// malformed response.
    pub fn normalized(mut self) -> Result<Self, LlmError> {
        if !self.match_score.is_finite() {
            return Err(LlmError::InvalidResponse(format!(
                "matchScore is not a finite number: {}",
                self.match_score
            )));
        }
        let clamped = self.match_score.clamp(0.0, 100.0);
        if clamped != self.match_score {
            warn!("Clamped out-of-range matchScore {} to {clamped}", self.match_score);
            self.match_score = clamped;
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

//! The resume flows: each forwards structured input to the LLM and checks the
//! reply against the expected output shape. Any provider or shape failure is
//! reported as `AppError::Llm`; nothing is retried here.

use serde_json::{json, Value};
use tracing::info;

use crate::analysis::models::{ChatMessage, ChatRole, ImprovementAnalysis, JobMatchAnalysis};
use crate::analysis::prompts::{
    CHAT_SYSTEM, IMPROVEMENT_PROMPT, IMPROVEMENT_SYSTEM, JOB_MATCH_PROMPT, JOB_MATCH_SYSTEM,
    PARSE_RESUME_PROMPT, PARSE_RESUME_SYSTEM, REWRITE_REQUEST,
};
use crate::errors::AppError;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{LlmClient, LlmError, Message, Role, Tool, ToolSpec};
use crate::models::resume::ResumeContent;

const PARSED_RESUME_FIELDS: &[&str] = &["personal", "summary", "experience", "education", "skills"];

/// Lets the model ask for a section to be rewritten. It hands the section
/// text straight back; the rewriting itself is done by the model.
pub struct RewriteSectionTool;

impl Tool for RewriteSectionTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "rewrite_section",
            description: "Rewrites a specific section of the resume to improve its quality.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "resumeText": {"type": "string", "description": "The entire text of the resume."},
                    "sectionToRewrite": {"type": "string", "description": "The specific section of the resume to rewrite."}
                },
                "required": ["resumeText", "sectionToRewrite"]
            }),
        }
    }

    fn invoke(&self, input: &Value) -> Result<String, LlmError> {
        input
            .get("sectionToRewrite")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| {
                LlmError::InvalidResponse("rewrite_section called without sectionToRewrite".into())
            })
    }
}

pub fn parse_resume_prompt(resume_text: &str) -> String {
    fill_template(PARSE_RESUME_PROMPT, &[("resume_text", resume_text)])
}

pub fn improvement_prompt(resume_text: &str, section_to_rewrite: Option<&str>) -> String {
    let rewrite_request = section_to_rewrite
        .map(|section| fill_template(REWRITE_REQUEST, &[("section_to_rewrite", section)]))
        .unwrap_or_default();
    fill_template(
        IMPROVEMENT_PROMPT,
        &[
            ("resume_text", resume_text),
            ("rewrite_request", &rewrite_request),
        ],
    )
}

pub fn job_match_prompt(resume_text: &str, job_description: &str) -> String {
    fill_template(
        JOB_MATCH_PROMPT,
        &[
            ("resume_text", resume_text),
            ("job_description", job_description),
        ],
    )
}

/// Rejects blank user input before any provider request is made.
fn require_text(value: &str, message: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(message.to_string()));
    }
    Ok(())
}

/// Parses free-form resume text into resume content.
pub async fn parse_resume_from_text(
    llm: &LlmClient,
    resume_text: &str,
) -> Result<ResumeContent, AppError> {
    require_text(
        resume_text,
        "Please paste your resume content into the text area.",
    )?;
    let raw: Value = llm
        .call_json(&parse_resume_prompt(resume_text), PARSE_RESUME_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Resume parsing failed: {e}")))?;
    let content = parsed_resume_from_value(raw)
        .map_err(|e| AppError::Llm(format!("Resume parsing failed: {e}")))?;
    info!(
        "Parsed resume: {} experience, {} education, {} skills",
        content.experience.len(),
        content.education.len(),
        content.skills.len()
    );
    Ok(content)
}

/// Checks that every top-level section is present before filling in
/// defaults for the fields inside them.
pub fn parsed_resume_from_value(raw: Value) -> Result<ResumeContent, LlmError> {
    let object = raw
        .as_object()
        .ok_or_else(|| LlmError::InvalidResponse("expected a JSON object".into()))?;
    if let Some(missing) = PARSED_RESUME_FIELDS.iter().find(|f| !object.contains_key(**f)) {
        return Err(LlmError::InvalidResponse(format!(
            "missing field '{missing}'"
        )));
    }
    Ok(serde_json::from_value(raw)?)
}

/// Critiques a resume; with `section_to_rewrite`, also returns a rewrite.
pub async fn analyze_resume_for_improvements(
    llm: &LlmClient,
    resume_text: &str,
    section_to_rewrite: Option<&str>,
) -> Result<ImprovementAnalysis, AppError> {
    let section = section_to_rewrite.filter(|s| !s.trim().is_empty());
    let prompt = improvement_prompt(resume_text, section);
    let tools: Vec<&dyn Tool> = match section {
        Some(_) => vec![&RewriteSectionTool as &dyn Tool],
        None => vec![],
    };
    llm.call_json_with_tools::<ImprovementAnalysis>(&prompt, IMPROVEMENT_SYSTEM, &tools)
        .await
        .map_err(|e| AppError::Llm(format!("Improvement analysis failed: {e}")))
}

/// Scores a resume against a job description.
pub async fn match_resume_to_job_description(
    llm: &LlmClient,
    resume_text: &str,
    job_description: &str,
) -> Result<JobMatchAnalysis, AppError> {
    require_text(
        job_description,
        "Please paste a job description to start the analysis.",
    )?;
    llm.call_json::<JobMatchAnalysis>(
        &job_match_prompt(resume_text, job_description),
        JOB_MATCH_SYSTEM,
    )
    .await
    .and_then(JobMatchAnalysis::normalized)
    .map_err(|e| AppError::Llm(format!("Job match analysis failed: {e}")))
}

/// Maps the chat history onto provider messages. The history must be
/// non-empty and end with a user turn.
pub fn chat_messages(history: &[ChatMessage]) -> Result<Vec<Message>, AppError> {
    match history.last() {
        None => {
            return Err(AppError::Validation(
                "Chat history cannot be empty".to_string(),
            ))
        }
        Some(last) if last.role != ChatRole::User => {
            return Err(AppError::Validation(
                "The last chat message must come from the user".to_string(),
            ))
        }
        Some(_) => {}
    }
    Ok(history
        .iter()
        .map(|m| {
            let role = match m.role {
                ChatRole::User => Role::User,
                ChatRole::Model => Role::Assistant,
            };
            Message::text(role, m.content.as_str())
        })
        .collect())
}

/// Produces the assistant's next chat reply.
pub async fn resume_chat(llm: &LlmClient, history: &[ChatMessage]) -> Result<String, AppError> {
    let messages = chat_messages(history)?;
    let response = llm
        .converse(CHAT_SYSTEM, &messages, &[])
        .await
        .map_err(|e| AppError::Llm(format!("Chat failed: {e}")))?;
    response
        .text()
        .map(String::from)
        .ok_or_else(|| AppError::Llm(LlmError::EmptyContent.to_string()))
}

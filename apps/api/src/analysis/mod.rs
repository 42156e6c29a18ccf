// LLM-backed resume flows: parse pasted/extracted text, critique, rewrite a
// section, score against a job description, and free-form chat.
// All LLM calls go through llm_client.

pub mod flows;
pub mod handlers;
pub mod models;
pub mod prompts;

// Prompt templates for the resume flows.
// Placeholders are filled with `llm_client::prompts::fill_template`.

pub const PARSE_RESUME_SYSTEM: &str = "\
You are an expert resume parser. \
Extract resume text into structured JSON. \
You MUST respond with valid JSON only, no markdown fences, no explanations. \
Never invent information that is not in the text.";

pub const PARSE_RESUME_PROMPT: &str = r#"Analyze the following resume text and extract the information into a structured JSON object.

INSTRUCTIONS:
1. Identify the sections (personal information, summary/objective, experience/work history, education, skills). Headings may vary.
2. Personal information: full name, email, phone number, location (city and state), and any personal website or portfolio URL. Usually at the top.
3. Summary: the professional summary or objective. If none is explicit, use an introductory paragraph describing goals or high-level experience. Otherwise leave it empty.
4. Experience: one object per job with title, company, location, dates (e.g. "Jan 2020 - Present") and description of responsibilities and achievements.
5. Education: one object per entry with degree, school, location and dates.
6. Skills: a flat list of every mentioned skill, from a skills section or anywhere in the text.
7. Missing information: use "" or [] for anything not present. Do not invent information.

RESUME TEXT:
{resume_text}

OUTPUT SCHEMA (return exactly this structure):
{
  "personal": {"name": "string", "email": "string", "phone": "string", "location": "string", "website": "string"},
  "summary": "string",
  "experience": [{"title": "string", "company": "string", "location": "string", "dates": "string", "description": "string"}],
  "education": [{"degree": "string", "school": "string", "location": "string", "dates": "string"}],
  "skills": ["string"]
}

Return ONLY the JSON object, nothing else, no code fences."#;

pub const IMPROVEMENT_SYSTEM: &str = "\
You are an AI resume expert providing feedback on a resume. \
Be specific and concise. \
Your final answer MUST be valid JSON only, no markdown fences, no explanations.";

pub const IMPROVEMENT_PROMPT: &str = r#"Analyze the following resume and give feedback on spelling, clarity, and formatting.
Identify any skills gaps and suggest actions to improve the resume.

RESUME:
{resume_text}
{rewrite_request}
OUTPUT SCHEMA (return exactly this structure):
{
  "overallFeedback": "string: spelling, clarity and formatting feedback",
  "skillsGapAnalysis": "string: skills gaps and how to close them",
  "suggestedActions": "string: concrete revisions to make",
  "rewrittenSection": "string: only when a rewrite was requested, otherwise omit"
}

Fill out every required field. Return ONLY the JSON object."#;

/// Inserted into `IMPROVEMENT_PROMPT` when the user asks for a rewrite.
pub const REWRITE_REQUEST: &str = r#"
The user has requested that you rewrite the following section:
{section_to_rewrite}
Use the rewrite_section tool to rewrite the section, and put the rewritten text in "rewrittenSection".
"#;

pub const JOB_MATCH_SYSTEM: &str = "\
You are an AI resume analyst comparing a resume against a job description. \
You MUST respond with valid JSON only, no markdown fences, no explanations.";

pub const JOB_MATCH_PROMPT: &str = r#"Compare the resume against the job description. Provide a match score (0-100), highlight strengths, missing skills, and improvement suggestions.

RESUME:
{resume_text}

JOB DESCRIPTION:
{job_description}

OUTPUT SCHEMA (return exactly this structure):
{
  "matchScore": number between 0 and 100,
  "strengths": "string: key strengths of the resume for this job",
  "missingSkills": "string: skills the job requires that the resume lacks",
  "improvementSuggestions": "string: how to improve the resume for this job"
}

Return ONLY the JSON object."#;

pub const CHAT_SYSTEM: &str = "\
You are a helpful and friendly AI resume assistant. \
Give clear, concise, and actionable advice to users asking for help with their resumes. \
Respond to the user's latest message in light of the conversation so far.";

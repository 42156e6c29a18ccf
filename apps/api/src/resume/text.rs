//! Flattens a resume into the plain-text blob used as LLM prompt input.

use crate::models::resume::{EducationEntry, ExperienceEntry, PersonalInfo, Resume};

/// Serializes every field of `resume` into a single labelled text block.
///
/// Personal lines are emitted only for non-empty values. The section headers
/// ("Summary:", "Experience:", "Education:", "Skills:") are always present,
/// even when their bodies are empty. `None` yields an empty string.
pub fn full_resume_text(resume: Option<&Resume>) -> String {
    let Some(resume) = resume else {
        return String::new();
    };
    let content = &resume.content;

    let experience = content
        .experience
        .iter()
        .map(experience_block)
        .collect::<Vec<_>>()
        .join("\n\n");
    let education = content
        .education
        .iter()
        .map(education_block)
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{}\n\nSummary:\n{}\n\nExperience:\n{}\n\nEducation:\n{}\n\nSkills:\n{}",
        personal_block(&content.personal),
        content.summary,
        experience,
        education,
        content.skills.join(", ")
    )
}

fn personal_block(personal: &PersonalInfo) -> String {
    [
        ("Name", &personal.name),
        ("Email", &personal.email),
        ("Phone", &personal.phone),
        ("Location", &personal.location),
        ("Website", &personal.website),
    ]
    .iter()
    .filter(|(_, value)| !value.is_empty())
    .map(|(label, value)| format!("{label}: {value}"))
    .collect::<Vec<_>>()
    .join("\n")
}

fn experience_block(exp: &ExperienceEntry) -> String {
    format!(
        "Title: {}\nCompany: {}\nLocation: {}\nDates: {}\nDescription:\n{}",
        exp.title, exp.company, exp.location, exp.dates, exp.description
    )
}

fn education_block(edu: &EducationEntry) -> String {
    format!(
        "Degree: {}\nSchool: {}\nLocation: {}\nDates: {}",
        edu.degree, edu.school, edu.location, edu.dates
    )
}

//! Form-editor operations on a resume draft.
//!
//! Every operation takes the draft by reference and returns a new value with
//! one field replaced. Nothing is mutated in place, so a caller holding the
//! previous draft (e.g. for undo or a concurrent preview) never observes a
//! partial edit.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::resume::{EducationEntry, ExperienceEntry, Resume};

#[derive(Debug, Error, PartialEq)]
pub enum EditError {
    #[error("{section} index {index} is out of range (len {len})")]
    IndexOutOfRange {
        section: &'static str,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonalField {
    Name,
    Email,
    Phone,
    Location,
    Website,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceField {
    Title,
    Company,
    Location,
    Dates,
    Description,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EducationField {
    Degree,
    School,
    Location,
    Dates,
}

/// A single editor action, as sent by a client in an edit batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ResumeEdit {
    SetTitle { value: String },
    SetPersonal { field: PersonalField, value: String },
    SetSummary { value: String },
    SetExperience { index: usize, field: ExperienceField, value: String },
    AddExperience,
    RemoveExperience { index: usize },
    SetEducation { index: usize, field: EducationField, value: String },
    AddEducation,
    RemoveEducation { index: usize },
    SetSkills { value: String },
}

impl ResumeEdit {
    pub fn apply(&self, resume: &Resume) -> Result<Resume, EditError> {
        match self {
            ResumeEdit::SetTitle { value } => Ok(with_title(resume, value)),
            ResumeEdit::SetPersonal { field, value } => Ok(with_personal(resume, *field, value)),
            ResumeEdit::SetSummary { value } => Ok(with_summary(resume, value)),
            ResumeEdit::SetExperience {
                index,
                field,
                value,
            } => with_experience_field(resume, *index, *field, value),
            ResumeEdit::AddExperience => Ok(add_experience(resume)),
            ResumeEdit::RemoveExperience { index } => remove_experience(resume, *index),
            ResumeEdit::SetEducation {
                index,
                field,
                value,
            } => with_education_field(resume, *index, *field, value),
            ResumeEdit::AddEducation => Ok(add_education(resume)),
            ResumeEdit::RemoveEducation { index } => remove_education(resume, *index),
            ResumeEdit::SetSkills { value } => Ok(with_skills_input(resume, value)),
        }
    }
}

/// Applies a batch of edits in order. The first failing edit aborts the batch
/// and the original draft is left untouched.
pub fn apply_edits(resume: &Resume, edits: &[ResumeEdit]) -> Result<Resume, EditError> {
    edits
        .iter()
        .try_fold(resume.clone(), |draft, edit| edit.apply(&draft))
}

pub fn with_title(resume: &Resume, title: &str) -> Resume {
    Resume {
        title: title.to_string(),
        ..resume.clone()
    }
}

pub fn with_personal(resume: &Resume, field: PersonalField, value: &str) -> Resume {
    let mut next = resume.clone();
    let personal = &mut next.content.personal;
    let slot = match field {
        PersonalField::Name => &mut personal.name,
        PersonalField::Email => &mut personal.email,
        PersonalField::Phone => &mut personal.phone,
        PersonalField::Location => &mut personal.location,
        PersonalField::Website => &mut personal.website,
    };
    *slot = value.to_string();
    next
}

pub fn with_summary(resume: &Resume, summary: &str) -> Resume {
    let mut next = resume.clone();
    next.content.summary = summary.to_string();
    next
}

pub fn with_experience_field(
    resume: &Resume,
    index: usize,
    field: ExperienceField,
    value: &str,
) -> Result<Resume, EditError> {
    let mut next = resume.clone();
    let len = next.content.experience.len();
    let entry = next
        .content
        .experience
        .get_mut(index)
        .ok_or(EditError::IndexOutOfRange {
            section: "experience",
            index,
            len,
        })?;
    let slot = match field {
        ExperienceField::Title => &mut entry.title,
        ExperienceField::Company => &mut entry.company,
        ExperienceField::Location => &mut entry.location,
        ExperienceField::Dates => &mut entry.dates,
        ExperienceField::Description => &mut entry.description,
    };
    *slot = value.to_string();
    Ok(next)
}

pub fn add_experience(resume: &Resume) -> Resume {
    let mut next = resume.clone();
    next.content.experience.push(ExperienceEntry::default());
    next
}

pub fn remove_experience(resume: &Resume, index: usize) -> Result<Resume, EditError> {
    let mut next = resume.clone();
    next.content.experience = without_index(&resume.content.experience, index, "experience")?;
    Ok(next)
}

pub fn with_education_field(
    resume: &Resume,
    index: usize,
    field: EducationField,
    value: &str,
) -> Result<Resume, EditError> {
    let mut next = resume.clone();
    let len = next.content.education.len();
    let entry = next
        .content
        .education
        .get_mut(index)
        .ok_or(EditError::IndexOutOfRange {
            section: "education",
            index,
            len,
        })?;
    let slot = match field {
        EducationField::Degree => &mut entry.degree,
        EducationField::School => &mut entry.school,
        EducationField::Location => &mut entry.location,
        EducationField::Dates => &mut entry.dates,
    };
    *slot = value.to_string();
    Ok(next)
}

pub fn add_education(resume: &Resume) -> Resume {
    let mut next = resume.clone();
    next.content.education.push(EducationEntry::default());
    next
}

pub fn remove_education(resume: &Resume, index: usize) -> Result<Resume, EditError> {
    let mut next = resume.clone();
    next.content.education = without_index(&resume.content.education, index, "education")?;
    Ok(next)
}

/// Replaces the skills list from a comma-separated input string.
pub fn with_skills_input(resume: &Resume, input: &str) -> Resume {
    let mut next = resume.clone();
    next.content.skills = split_skills(input);
    next
}

/// Splits on commas and trims each element. Empty elements are dropped, so a
/// cleared input yields an empty list.
pub fn split_skills(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn without_index<T: Clone>(
    items: &[T],
    index: usize,
    section: &'static str,
) -> Result<Vec<T>, EditError> {
    if index >= items.len() {
        return Err(EditError::IndexOutOfRange {
            section,
            index,
            len: items.len(),
        });
    }
    Ok(items
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, item)| item.clone())
        .collect())
}

use chrono::{DateTime, Duration, SubsecRound, Utc};

use crate::models::resume::{EducationEntry, ExperienceEntry, Resume, ResumeContent};

pub const UNTITLED: &str = "Untitled Resume";
const COPY_SUFFIX: &str = " (Copy)";

/// The blank draft shown when a user starts a new resume: one empty
/// experience entry and one empty education entry so the form has rows to fill.
pub fn new_resume_template() -> Resume {
    Resume {
        id: None,
        title: UNTITLED.to_string(),
        updated_at: Utc::now().trunc_subsecs(6),
        content: ResumeContent {
            experience: vec![ExperienceEntry::default()],
            education: vec![EducationEntry::default()],
            ..Default::default()
        },
    }
}

/// Returns a timestamp strictly after `previous`, normally the current time.
/// Truncated to microseconds to match what PostgreSQL stores.
pub fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now().trunc_subsecs(6);
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// Stamps a draft for saving with the server clock. `stored` is the stamp of
/// the document being overwritten, if any; the draft's own `updated_at` is
/// ignored.
pub fn touched(draft: &Resume, stored: Option<DateTime<Utc>>) -> Resume {
    Resume {
        updated_at: next_timestamp(stored.unwrap_or(DateTime::<Utc>::MIN_UTC)),
        ..draft.clone()
    }
}

/// Builds an unsaved copy of `resume`: same content, title suffixed with
/// " (Copy)", no id, and a fresh `updated_at`.
pub fn duplicate(resume: &Resume) -> Resume {
    Resume {
        id: None,
        title: format!("{}{COPY_SUFFIX}", resume.title),
        updated_at: next_timestamp(resume.updated_at),
        content: resume.content.clone(),
    }
}

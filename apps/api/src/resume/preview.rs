//! Print-formatted HTML preview. Exporting to PDF is left to the browser's
//! print dialog; the page rules in the template size the output to A4.

use askama::Template;

use crate::models::resume::{EducationEntry, ExperienceEntry, PersonalInfo, Resume};

#[derive(Template)]
#[template(path = "resume_preview.html")]
pub struct ResumePreview<'a> {
    title: &'a str,
    name: &'a str,
    contact: Vec<&'a str>,
    website: Option<Website<'a>>,
    summary: &'a str,
    experience: Vec<ExperienceView<'a>>,
    education: Vec<EducationView<'a>>,
    skills: Vec<&'a str>,
}

struct Website<'a> {
    url: &'a str,
    /// Only http(s) addresses become links.
    linked: bool,
}

struct ExperienceView<'a> {
    title: &'a str,
    dates: &'a str,
    company: &'a str,
    location: &'a str,
    bullets: Vec<&'a str>,
}

struct EducationView<'a> {
    degree: &'a str,
    dates: &'a str,
    school: &'a str,
    location: &'a str,
}

impl<'a> ResumePreview<'a> {
    /// Empty fields show the same placeholder text the editor preview shows.
    pub fn new(resume: &'a Resume) -> Self {
        let content = &resume.content;
        Self {
            title: &resume.title,
            name: or_placeholder(&content.personal.name, "Your Name"),
            contact: contact_items(&content.personal),
            website: website(&content.personal),
            summary: or_placeholder(
                &content.summary,
                "A brief professional summary about yourself.",
            ),
            experience: content.experience.iter().map(ExperienceView::new).collect(),
            education: content.education.iter().map(EducationView::new).collect(),
            skills: content
                .skills
                .iter()
                .map(String::as_str)
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

impl<'a> ExperienceView<'a> {
    fn new(exp: &'a ExperienceEntry) -> Self {
        Self {
            title: or_placeholder(&exp.title, "Job Title"),
            dates: or_placeholder(&exp.dates, "Date Range"),
            company: or_placeholder(&exp.company, "Company Name"),
            location: or_placeholder(&exp.location, "Location"),
            bullets: description_bullets(&exp.description).collect(),
        }
    }
}

impl<'a> EducationView<'a> {
    fn new(edu: &'a EducationEntry) -> Self {
        Self {
            degree: or_placeholder(&edu.degree, "Degree"),
            dates: or_placeholder(&edu.dates, "Date Range"),
            school: or_placeholder(&edu.school, "School Name"),
            location: or_placeholder(&edu.location, "Location"),
        }
    }
}

/// Renders `resume` as a standalone HTML document.
pub fn render_print_html(resume: &Resume) -> Result<String, askama::Error> {
    ResumePreview::new(resume).render()
}

fn contact_items(personal: &PersonalInfo) -> Vec<&str> {
    [&personal.email, &personal.phone, &personal.location]
        .into_iter()
        .map(String::as_str)
        .filter(|value| !value.is_empty())
        .collect()
}

fn website(personal: &PersonalInfo) -> Option<Website<'_>> {
    let url = personal.website.as_str();
    if url.is_empty() {
        return None;
    }
    Some(Website {
        url,
        linked: url.starts_with("http://") || url.starts_with("https://"),
    })
}

/// One bullet per non-empty description line, without a leading "- ".
fn description_bullets(description: &str) -> impl Iterator<Item = &str> {
    description
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| line.strip_prefix("- ").unwrap_or(line))
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() {
        placeholder
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::lifecycle::new_resume_template;

    #[test]
    fn test_template_renders_placeholders() {
        let html = render_print_html(&new_resume_template()).unwrap();
        assert!(html.contains("<h1>Your Name</h1>"));
        assert!(html.contains("A brief professional summary about yourself."));
        assert!(html.contains("Job Title"));
        assert!(html.contains("School Name"));
        assert!(html.contains("size: A4"));
    }

    #[test]
    fn test_description_lines_become_bullets() {
        let bullets: Vec<_> =
            description_bullets("- Led design system\n\n- Mentored juniors\nShipped v2").collect();
        assert_eq!(
            bullets,
            vec!["Led design system", "Mentored juniors", "Shipped v2"]
        );
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut resume = new_resume_template();
        resume.content.personal.name = "<script>alert('x')</script>".to_string();
        resume.content.personal.website = "javascript:alert(1)".to_string();
        let html = render_print_html(&resume).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("href=\"javascript"));
    }

    #[test]
    fn test_http_website_is_linked_and_empty_skills_skipped() {
        let mut resume = new_resume_template();
        resume.content.personal.website = "https://jane.dev".to_string();
        resume.content.skills = vec!["Rust".to_string(), String::new()];
        let html = render_print_html(&resume).unwrap();
        assert!(html.contains("<a href=\"https://jane.dev\">"));
        assert_eq!(html.matches("class=\"skill\"").count(), 1);
    }
}

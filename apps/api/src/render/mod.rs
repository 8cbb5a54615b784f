//! Template Renderer — pure HTML generation from a `CvRecord`.
//!
//! One shared assembly path walks the logical sections in the fixed order
//! (identity → summary → experience → education → skills → languages); the
//! four templates contribute only CSS and a wrapper class, never their own
//! ordering. That keeps the field-ordering business rule in exactly one
//! place.
//!
//! The same renderer serves interactive preview and static export: export
//! mode swaps in fixed A4 page dimensions and print rules, nothing else.

pub mod handlers;
mod style;

use crate::models::cv::{CvRecord, EducationEntry, ExperienceEntry, SectionValue};

/// The closed set of templates. An unknown identifier falls back to the
/// default rather than erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateId {
    /// Single column with a colored banner (default).
    Moderne,
    /// Two-column layout with a sidebar identity block.
    Classique,
    /// Colored card sections.
    Creatif,
    /// Monospace, code-styled sections.
    Tech,
}

impl TemplateId {
    pub const DEFAULT: TemplateId = TemplateId::Moderne;

    pub fn from_param(param: &str) -> Self {
        match param.to_lowercase().as_str() {
            "moderne" => TemplateId::Moderne,
            "classique" => TemplateId::Classique,
            "creatif" => TemplateId::Creatif,
            "tech" => TemplateId::Tech,
            _ => TemplateId::DEFAULT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::Moderne => "moderne",
            TemplateId::Classique => "classique",
            TemplateId::Creatif => "creatif",
            TemplateId::Tech => "tech",
        }
    }

    fn css(&self) -> &'static str {
        match self {
            TemplateId::Moderne => style::MODERNE_CSS,
            TemplateId::Classique => style::CLASSIQUE_CSS,
            TemplateId::Creatif => style::CREATIF_CSS,
            TemplateId::Tech => style::TECH_CSS,
        }
    }
}

/// Interactive preview or static print-oriented export.
/// The layout markup is identical in both modes (layout parity); export adds
/// fixed page dimensions and drops runtime-only affordances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Preview,
    Export,
}

/// Renders a full HTML document for the record. Pure: no I/O, no mutation.
pub fn render_cv(record: &CvRecord, template: TemplateId, mode: RenderMode) -> String {
    let body = render_sections(record);

    let mode_class = match mode {
        RenderMode::Preview => "cv--preview",
        RenderMode::Export => "cv--export",
    };
    let page_css = match mode {
        RenderMode::Preview => style::PREVIEW_CSS,
        RenderMode::Export => style::EXPORT_CSS,
    };

    let title = record.name.as_deref().unwrap_or("CV");
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
         <style>\n{}\n{}\n{}\n</style>\n</head>\n\
         <body class=\"cv cv--{} {}\">\n{}</body>\n</html>\n",
        escape_html(title),
        style::BASE_CSS,
        template.css(),
        page_css,
        template.as_str(),
        mode_class,
        body,
    )
}

/// The single field-ordering contract shared by every template:
/// identity → summary → experience → education → skills → languages.
fn render_sections(record: &CvRecord) -> String {
    let mut out = String::new();
    render_identity(record, &mut out);
    render_summary(record, &mut out);
    render_experience(record, &mut out);
    render_education(record, &mut out);
    render_skills(record, &mut out);
    render_languages(record, &mut out);
    out
}

fn render_identity(record: &CvRecord, out: &mut String) {
    out.push_str("<header class=\"identity\">\n");
    let name = record.name.as_deref().filter(|s| !s.trim().is_empty());
    let title = record.title.as_deref().filter(|s| !s.trim().is_empty());
    out.push_str(&format!(
        "<h1 class=\"name\">{}</h1>\n",
        escape_html(name.unwrap_or("Your Name"))
    ));
    if let Some(title) = title {
        out.push_str(&format!(
            "<h2 class=\"headline\">{}</h2>\n",
            escape_html(title)
        ));
    }
    if let Some(contact) = &record.contact {
        let mut parts: Vec<String> = Vec::new();
        for value in [
            &contact.email,
            &contact.phone,
            &contact.address,
            &contact.linkedin,
        ] {
            if let Some(v) = value.as_deref().filter(|s| !s.trim().is_empty()) {
                parts.push(escape_html(v));
            }
        }
        if !parts.is_empty() {
            out.push_str(&format!(
                "<div class=\"contact\">{}</div>\n",
                parts.join(" | ")
            ));
        }
    }
    out.push_str("</header>\n");
}

fn render_summary(record: &CvRecord, out: &mut String) {
    if let Some(summary) = record.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        out.push_str("<section class=\"summary\">\n<h3>Summary</h3>\n");
        out.push_str(&format!("<p>{}</p>\n", escape_html(summary)));
        out.push_str("</section>\n");
    }
}

fn render_experience(record: &CvRecord, out: &mut String) {
    let Some(experience) = &record.experience else {
        return;
    };
    if experience.is_empty() {
        return;
    }
    out.push_str("<section class=\"experience\">\n<h3>Experience</h3>\n");
    match experience {
        SectionValue::Entries(entries) => {
            for entry in entries {
                render_experience_entry(entry, out);
            }
        }
        SectionValue::FreeText(text) => render_freeform(text, out),
    }
    out.push_str("</section>\n");
}

fn render_experience_entry(entry: &ExperienceEntry, out: &mut String) {
    out.push_str("<div class=\"entry\">\n");
    if let Some(title) = entry.title.as_deref().filter(|s| !s.trim().is_empty()) {
        out.push_str(&format!(
            "<div class=\"entry-title\">{}</div>\n",
            escape_html(title)
        ));
    }
    let mut meta: Vec<String> = Vec::new();
    if let Some(company) = entry.company.as_deref().filter(|s| !s.trim().is_empty()) {
        meta.push(escape_html(company));
    }
    if let Some(years) = entry.years.as_deref().filter(|s| !s.trim().is_empty()) {
        meta.push(escape_html(years));
    }
    if !meta.is_empty() {
        out.push_str(&format!(
            "<div class=\"entry-meta\">{}</div>\n",
            meta.join(" \u{2022} ")
        ));
    }
    if let Some(description) = entry
        .description
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        out.push_str(&format!(
            "<div class=\"entry-desc\">{}</div>\n",
            escape_html(description)
        ));
    }
    out.push_str("</div>\n");
}

fn render_education(record: &CvRecord, out: &mut String) {
    let Some(education) = &record.education else {
        return;
    };
    if education.is_empty() {
        return;
    }
    out.push_str("<section class=\"education\">\n<h3>Education</h3>\n");
    match education {
        SectionValue::Entries(entries) => {
            for entry in entries {
                render_education_entry(entry, out);
            }
        }
        SectionValue::FreeText(text) => render_freeform(text, out),
    }
    out.push_str("</section>\n");
}

fn render_education_entry(entry: &EducationEntry, out: &mut String) {
    out.push_str("<div class=\"entry\">\n");
    if let Some(degree) = entry.degree.as_deref().filter(|s| !s.trim().is_empty()) {
        out.push_str(&format!(
            "<div class=\"entry-title\">{}</div>\n",
            escape_html(degree)
        ));
    }
    let mut meta: Vec<String> = Vec::new();
    if let Some(university) = entry.university.as_deref().filter(|s| !s.trim().is_empty()) {
        meta.push(escape_html(university));
    }
    if let Some(years) = entry.years.as_deref().filter(|s| !s.trim().is_empty()) {
        meta.push(escape_html(years));
    }
    if !meta.is_empty() {
        out.push_str(&format!(
            "<div class=\"entry-meta\">{}</div>\n",
            meta.join(" \u{2022} ")
        ));
    }
    out.push_str("</div>\n");
}

fn render_skills(record: &CvRecord, out: &mut String) {
    let Some(skills) = &record.skills else {
        return;
    };
    if skills.is_empty() {
        return;
    }
    out.push_str("<section class=\"skills\">\n<h3>Skills</h3>\n");
    match skills {
        SectionValue::Entries(items) => {
            out.push_str("<div class=\"skill-list\">");
            for skill in items {
                if skill.trim().is_empty() {
                    continue;
                }
                out.push_str(&format!(
                    "<span class=\"skill\">{}</span>",
                    escape_html(skill)
                ));
            }
            out.push_str("</div>\n");
        }
        SectionValue::FreeText(text) => render_freeform(text, out),
    }
    out.push_str("</section>\n");
}

fn render_languages(record: &CvRecord, out: &mut String) {
    if let Some(languages) = record.languages.as_deref().filter(|s| !s.trim().is_empty()) {
        out.push_str("<section class=\"languages\">\n<h3>Languages</h3>\n");
        out.push_str(&format!("<p>{}</p>\n", escape_html(languages)));
        out.push_str("</section>\n");
    }
}

/// Legacy scalar sections render as one preformatted block, never as an error.
fn render_freeform(text: &str, out: &mut String) {
    out.push_str(&format!(
        "<pre class=\"freeform\">{}</pre>\n",
        escape_html(text)
    ));
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TEMPLATES: [TemplateId; 4] = [
        TemplateId::Moderne,
        TemplateId::Classique,
        TemplateId::Creatif,
        TemplateId::Tech,
    ];

    fn sample_record() -> CvRecord {
        serde_json::from_str(
            r#"{
                "name": "Ada Lovelace",
                "title": "Analytical Engineer",
                "summary": "Pioneer of computing with a decade of experience.",
                "experience": [
                    {"title": "Engineer", "company": "Analytical Engines", "years": "1840-1852", "description": "Wrote the first published program."}
                ],
                "education": [
                    {"degree": "Mathematics", "university": "Home tutoring", "years": "1825-1835"}
                ],
                "skills": ["Mathematics", "Programming"],
                "languages": "English (native), French (fluent)",
                "contact": {"email": "ada@example.org", "phone": "+44 20 0000", "linkedin": "linkedin.com/in/ada"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_default_template_preserves_all_populated_fields_verbatim() {
        let html = render_cv(&sample_record(), TemplateId::DEFAULT, RenderMode::Preview);
        for expected in [
            "Ada Lovelace",
            "Analytical Engineer",
            "Pioneer of computing with a decade of experience.",
            "Engineer",
            "Analytical Engines",
            "1840-1852",
            "Wrote the first published program.",
            "Mathematics",
            "Home tutoring",
            "1825-1835",
            "Programming",
            "English (native), French (fluent)",
            "ada@example.org",
            "+44 20 0000",
            "linkedin.com/in/ada",
        ] {
            assert!(html.contains(expected), "missing field value: {expected}");
        }
    }

    #[test]
    fn test_sections_appear_in_fixed_order_in_every_template() {
        for template in ALL_TEMPLATES {
            let html = render_cv(&sample_record(), template, RenderMode::Preview);
            let positions: Vec<usize> = [
                "class=\"identity\"",
                "class=\"summary\"",
                "class=\"experience\"",
                "class=\"education\"",
                "class=\"skills\"",
                "class=\"languages\"",
            ]
            .iter()
            .map(|marker| {
                html.find(marker)
                    .unwrap_or_else(|| panic!("{marker} missing in {template:?}"))
            })
            .collect();
            let mut sorted = positions.clone();
            sorted.sort_unstable();
            assert_eq!(positions, sorted, "section order broken in {template:?}");
        }
    }

    #[test]
    fn test_legacy_freetext_renders_as_single_pre_block_in_every_template() {
        let record: CvRecord = serde_json::from_str(
            r#"{"name": "Ada", "experience": "Engineer at Analytical Engines\n1840-1852"}"#,
        )
        .unwrap();
        for template in ALL_TEMPLATES {
            let html = render_cv(&record, template, RenderMode::Preview);
            assert_eq!(
                html.matches("<pre class=\"freeform\">").count(),
                1,
                "expected exactly one preformatted block in {template:?}"
            );
            assert!(html.contains("Engineer at Analytical Engines"));
        }
    }

    #[test]
    fn test_structured_sections_render_entry_blocks_not_pre() {
        let html = render_cv(&sample_record(), TemplateId::Classique, RenderMode::Preview);
        assert!(html.contains("class=\"entry\""));
        assert!(!html.contains("<pre"));
    }

    #[test]
    fn test_unknown_template_falls_back_to_default() {
        assert_eq!(TemplateId::from_param("brutalist"), TemplateId::DEFAULT);
        assert_eq!(TemplateId::from_param(""), TemplateId::DEFAULT);
        assert_eq!(TemplateId::from_param("TECH"), TemplateId::Tech);
    }

    #[test]
    fn test_values_are_html_escaped() {
        let record: CvRecord =
            serde_json::from_str(r#"{"name": "<script>alert(1)</script>", "summary": "A & B"}"#)
                .unwrap();
        let html = render_cv(&record, TemplateId::DEFAULT, RenderMode::Preview);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("A &amp; B"));
    }

    #[test]
    fn test_export_mode_uses_fixed_page_dimensions() {
        let preview = render_cv(&sample_record(), TemplateId::DEFAULT, RenderMode::Preview);
        let export = render_cv(&sample_record(), TemplateId::DEFAULT, RenderMode::Export);
        assert!(export.contains("@page"));
        assert!(export.contains("210mm"));
        assert!(!preview.contains("@page"));
        assert!(preview.contains("cv--preview"));
        assert!(export.contains("cv--export"));
    }

    #[test]
    fn test_preview_and_export_share_layout_markup() {
        // Parity: the body markup is identical apart from the mode class.
        let preview = render_cv(&sample_record(), TemplateId::Creatif, RenderMode::Preview);
        let export = render_cv(&sample_record(), TemplateId::Creatif, RenderMode::Export);
        let body = |s: &str| {
            s[s.find("<body").unwrap()..]
                .replace("cv--preview", "")
                .replace("cv--export", "")
        };
        assert_eq!(body(&preview), body(&export));
    }

    #[test]
    fn test_missing_name_renders_placeholder() {
        let record = CvRecord::default();
        let html = render_cv(&record, TemplateId::DEFAULT, RenderMode::Preview);
        assert!(html.contains("Your Name"));
        // Absent sections are omitted entirely.
        assert!(!html.contains("class=\"summary\""));
        assert!(!html.contains("class=\"experience\""));
    }

    #[test]
    fn test_empty_structured_sections_are_omitted() {
        let record: CvRecord =
            serde_json::from_str(r#"{"name": "Ada", "experience": [], "skills": []}"#).unwrap();
        let html = render_cv(&record, TemplateId::DEFAULT, RenderMode::Preview);
        assert!(!html.contains("class=\"experience\""));
        assert!(!html.contains("class=\"skills\""));
    }
}

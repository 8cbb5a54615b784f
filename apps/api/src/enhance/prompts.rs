// Per-section rewriting instructions. Each section has a distinct goal;
// all of them forbid inventing facts.

use super::Section;

const SUMMARY_INSTRUCTION: &str = "Improve this professional summary: clarity, impact, \
    ATS keywords. Stay factual. Maximum 4-5 lines.";

const EXPERIENCE_INSTRUCTION: &str = "Rewrite these work experiences with: action verbs, \
    quantified results (%, currency amounts, counts), concrete accomplishments. \
    Stay truthful: never invent numbers that are not implied by the original.";

const EDUCATION_INSTRUCTION: &str = "Improve the education section: clear degree names, \
    recognizable institution names, honors where present. Formal and precise.";

const SKILLS_INSTRUCTION: &str = "Optimize this skills list for ATS screening: clear \
    categorization (Technical / Languages / Tools / Soft skills), industry keywords.";

/// The fixed system instruction for one section's rewrite.
pub fn system_instruction(section: Section) -> &'static str {
    match section {
        Section::Summary => SUMMARY_INSTRUCTION,
        Section::Experience => EXPERIENCE_INSTRUCTION,
        Section::Education => EDUCATION_INSTRUCTION,
        Section::Skills => SKILLS_INSTRUCTION,
    }
}

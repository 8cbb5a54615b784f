// Prompt constants for CV structuring. The schema in the prompt is the
// contract: `CvRecord` mirrors it field for field.

/// System prompt for text-mode structuring — enforces JSON-only output.
pub const STRUCTURE_SYSTEM: &str =
    "You are an expert at extracting information from CVs and resumes. \
    You MUST respond with a single valid JSON object and nothing else. \
    Do NOT use markdown code fences. \
    Do NOT include explanations.";

/// Shared schema and extraction rules used by both modes.
const STRUCTURE_SCHEMA: &str = r#"Extract ALL information into this EXACT JSON schema:
{
  "name": "candidate's exact full name",
  "title": "current professional title",
  "summary": "professional summary or career objective",
  "experience": [
    {
      "title": "job title",
      "company": "company name",
      "years": "period (e.g. 2020-2023)",
      "description": "responsibilities and achievements"
    }
  ],
  "education": [
    {
      "degree": "degree obtained",
      "university": "institution name",
      "years": "period (e.g. 2015-2019)"
    }
  ],
  "skills": ["skill1", "skill2", "skill3"],
  "languages": "spoken languages with levels",
  "contact": {
    "email": "email@example.com",
    "phone": "+1 555 0100",
    "address": "city, country",
    "linkedin": "linkedin url"
  }
}

IMPORTANT:
- Extract the REAL information from the document, never generic examples or placeholders
- For experience and education, build arrays of objects
- For skills, build an array of strings
- If a piece of information is not found, use an empty string rather than inventing one
- Respond ONLY with the JSON object, without markdown or additional text"#;

/// Builds the text-mode user turn around the extracted document text.
pub fn structure_user_turn(text: &str) -> String {
    format!("{STRUCTURE_SCHEMA}\n\nCV TEXT:\n{text}")
}

/// Document-mode prompt: sent alongside the raw document as a data URL.
pub fn structure_document_prompt() -> String {
    format!(
        "Analyze this CV document and extract all of its information as structured JSON.\n\n{STRUCTURE_SCHEMA}"
    )
}

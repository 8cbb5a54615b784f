use serde::{Deserialize, Serialize};

/// A CV section that evolved from free text to structured entries.
///
/// Older saved records carry `experience`/`education`/`skills` as plain
/// strings; newer extractions return arrays of objects. Both shapes must
/// deserialize and both must render, so the union is explicit rather than
/// an untyped `Value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionValue<T> {
    Entries(Vec<T>),
    FreeText(String),
}

impl<T> SectionValue<T> {
    pub fn is_empty(&self) -> bool {
        match self {
            SectionValue::Entries(entries) => entries.is_empty(),
            SectionValue::FreeText(text) => text.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub years: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub university: Option<String>,
    #[serde(default)]
    pub years: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
}

/// The structured CV produced by the structurer and edited field-by-field
/// by the section enhancer. Every field is optional; extraction prefers
/// empty values over invented content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CvRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub experience: Option<SectionValue<ExperienceEntry>>,
    #[serde(default)]
    pub education: Option<SectionValue<EducationEntry>>,
    #[serde(default)]
    pub skills: Option<SectionValue<String>>,
    #[serde(default)]
    pub languages: Option<String>,
    #[serde(default)]
    pub contact: Option<Contact>,
}

impl CvRecord {
    /// A record missing all of name, experience, and education is flagged as a
    /// low-confidence extraction. It is still delivered to the caller.
    pub fn is_low_confidence(&self) -> bool {
        let no_name = self.name.as_deref().map_or(true, |n| n.trim().is_empty());
        let no_experience = self.experience.as_ref().map_or(true, |e| e.is_empty());
        let no_education = self.education.as_ref().map_or(true, |e| e.is_empty());
        no_name && no_experience && no_education
    }
}

/// Result of the photo locator. Ephemeral — consumed by the client to crop
/// the rendered page image, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRegion {
    pub has_photo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<PhotoCoordinates>,
}

impl PhotoRegion {
    pub fn none() -> Self {
        Self {
            has_photo: false,
            coordinates: None,
        }
    }
}

/// Bounding box in percentages of page width/height, each in [0, 100].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoCoordinates {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PhotoCoordinates {
    pub fn clamped(self) -> Self {
        let clamp = |v: f64| v.clamp(0.0, 100.0);
        Self {
            x: clamp(self.x),
            y: clamp(self.y),
            width: clamp(self.width),
            height: clamp(self.height),
        }
    }
}

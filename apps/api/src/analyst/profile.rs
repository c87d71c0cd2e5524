//! Structured candidate profile extracted from resume text.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::analyst::prompts::PROFILE_EXTRACT_PROMPT;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub major: Option<String>,
    pub degree: Option<String>,
    pub institution: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
    pub role: Option<String>,
    pub company: Option<String>,
    pub duration: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub responsibilities: Vec<String>,
}

/// Everything the model could read off a resume. Missing fields stay empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeProfile {
    pub location: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub languages: Vec<String>,
    pub summary: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub educations: Vec<Education>,
    #[serde(deserialize_with = "null_as_empty")]
    pub experiences: Vec<Experience>,
    pub year_of_experience: Option<f64>,
    #[serde(deserialize_with = "null_as_empty")]
    pub profile_links: Vec<String>,
}

impl ResumeProfile {
    /// Education as stored on the applicant row; `None` when nothing was extracted.
    pub fn education_json(&self) -> Option<Value> {
        (!self.educations.is_empty()).then(|| json!(self.educations))
    }

    /// Experience as stored on the applicant row; `None` when nothing was extracted.
    pub fn experience_json(&self) -> Option<Value> {
        (!self.experiences.is_empty()).then(|| json!(self.experiences))
    }
}

/// Treats an explicit JSON `null` like a missing list.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn build_profile_prompt(resume_text: &str) -> String {
    PROFILE_EXTRACT_PROMPT.replace("{resume_text}", resume_text)
}

/// Response schema handed to the model for profile extraction.
pub fn profile_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "location": { "type": "STRING", "nullable": true },
            "languages": { "type": "ARRAY", "items": { "type": "STRING" } },
            "summary": { "type": "STRING", "nullable": true },
            "educations": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "major": { "type": "STRING", "nullable": true },
                        "degree": { "type": "STRING", "nullable": true },
                        "institution": { "type": "STRING", "nullable": true }
                    }
                }
            },
            "experiences": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "role": { "type": "STRING", "nullable": true },
                        "company": { "type": "STRING", "nullable": true },
                        "duration": { "type": "STRING", "nullable": true },
                        "responsibilities": { "type": "ARRAY", "items": { "type": "STRING" } }
                    }
                }
            },
            "yearOfExperience": { "type": "NUMBER", "nullable": true },
            "profileLinks": { "type": "ARRAY", "items": { "type": "STRING" } }
        }
    })
}

//! Screening result: how well a resume fits a job description.
//!
//! Produced per request and returned to the caller; never persisted.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::analyst::profile::null_as_empty;
use crate::analyst::prompts::SCREENING_PROMPT;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Screening {
    /// 0 – 100
    pub match_percentage: Option<f64>,
    #[serde(deserialize_with = "null_as_empty")]
    pub missing_keywords: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub accurate_keywords: Vec<String>,
    pub final_thoughts: Option<String>,
    pub recommendations: Option<String>,
}

impl Screening {
    /// Clamps the score and makes the keyword lists disjoint and duplicate-free.
    /// A keyword reported as both matching and missing counts as matching.
    pub fn normalized(mut self) -> Self {
        self.match_percentage = self
            .match_percentage
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 100.0));

        let mut seen = HashSet::new();
        self.accurate_keywords = dedup_keywords(self.accurate_keywords, &mut seen);
        self.missing_keywords = dedup_keywords(self.missing_keywords, &mut seen);
        self
    }
}

fn dedup_keywords(keywords: Vec<String>, seen: &mut HashSet<String>) -> Vec<String> {
    keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty() && seen.insert(k.to_lowercase()))
        .collect()
}

/// Input of one screening run.
#[derive(Debug, Clone, Copy)]
pub struct ScreeningInput<'a> {
    pub job_description: &'a str,
    pub resume_text: &'a str,
    /// Free-form recruiter requirements; `null` when none were given.
    pub custom_requirement: &'a Value,
}

pub fn build_screening_prompt(input: &ScreeningInput<'_>) -> String {
    let custom = serde_json::to_string_pretty(input.custom_requirement)
        .unwrap_or_else(|_| "null".to_string());
    SCREENING_PROMPT
        .replace("{job_description}", input.job_description)
        .replace("{resume_text}", input.resume_text)
        .replace("{custom_requirement}", &custom)
}

/// Response schema handed to the model for screening.
pub fn screening_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "matchPercentage": { "type": "NUMBER" },
            "missingKeywords": { "type": "ARRAY", "items": { "type": "STRING" } },
            "accurateKeywords": { "type": "ARRAY", "items": { "type": "STRING" } },
            "finalThoughts": { "type": "STRING" },
            "recommendations": { "type": "STRING" }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screening_deserializes_model_answer() {
        let json = r#"{
            "matchPercentage": 72,
            "missingKeywords": ["Kubernetes"],
            "accurateKeywords": ["Go", "PostgreSQL", "REST API"],
            "finalThoughts": "Solid backend profile.",
            "recommendations": "Mention container orchestration work."
        }"#;
        let screening: Screening = serde_json::from_str(json).unwrap();
        assert_eq!(screening.match_percentage, Some(72.0));
        assert_eq!(screening.accurate_keywords.len(), 3);
        assert_eq!(screening.missing_keywords, vec!["Kubernetes"]);
    }

    #[test]
    fn test_screening_serializes_camel_case() {
        let value = serde_json::to_value(Screening {
            match_percentage: Some(50.0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(value["matchPercentage"], 50.0);
        assert!(value["accurateKeywords"].is_array());
        assert!(value.get("match_percentage").is_none());
    }

    #[test]
    fn test_normalized_clamps_percentage() {
        let high = Screening {
            match_percentage: Some(140.0),
            ..Default::default()
        };
        assert_eq!(high.normalized().match_percentage, Some(100.0));

        let low = Screening {
            match_percentage: Some(-3.0),
            ..Default::default()
        };
        assert_eq!(low.normalized().match_percentage, Some(0.0));

        let nan = Screening {
            match_percentage: Some(f64::NAN),
            ..Default::default()
        };
        assert_eq!(nan.normalized().match_percentage, None);
    }

    #[test]
    fn test_normalized_keeps_keyword_lists_disjoint() {
        let screening = Screening {
            accurate_keywords: vec!["Go".into(), "go ".into(), "Docker".into()],
            missing_keywords: vec!["docker".into(), "Kafka".into(), "".into()],
            ..Default::default()
        }
        .normalized();

        assert_eq!(screening.accurate_keywords, vec!["Go", "Docker"]);
        assert_eq!(screening.missing_keywords, vec!["Kafka"]);
    }

    #[test]
    fn test_prompt_includes_all_inputs() {
        let custom = json!({ "religion": "any", "minYears": 3 });
        let prompt = build_screening_prompt(&ScreeningInput {
            job_description: "Senior Go engineer",
            resume_text: "Jane Doe, 6 years of Go",
            custom_requirement: &custom,
        });
        assert!(prompt.contains("Senior Go engineer"));
        assert!(prompt.contains("Jane Doe, 6 years of Go"));
        assert!(prompt.contains("\"minYears\": 3"));
    }

    #[test]
    fn test_prompt_renders_missing_requirement_as_null() {
        let prompt = build_screening_prompt(&ScreeningInput {
            job_description: "jd",
            resume_text: "cv",
            custom_requirement: &Value::Null,
        });
        assert!(prompt.ends_with("null"));
    }
}

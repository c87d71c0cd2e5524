//! Candidate filtering for the job-post pipeline views.
//!
//! All text comparisons are case-insensitive; all active filters must match.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

use crate::models::applicant::Applicant;
use crate::models::application::{Application, Stage};

/// Experience bands used by the recruiter views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    /// under 3 years
    Junior,
    /// 3 to under 5 years
    Mid,
    /// 5 to under 8 years
    Senior,
    /// 8 years and up
    Lead,
}

impl ExperienceLevel {
    pub fn from_years(years: f64) -> Self {
        if years >= 8.0 {
            ExperienceLevel::Lead
        } else if years >= 5.0 {
            ExperienceLevel::Senior
        } else if years >= 3.0 {
            ExperienceLevel::Mid
        } else {
            ExperienceLevel::Junior
        }
    }
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "junior" => Ok(ExperienceLevel::Junior),
            "mid" => Ok(ExperienceLevel::Mid),
            "senior" => Ok(ExperienceLevel::Senior),
            "lead" => Ok(ExperienceLevel::Lead),
            other => Err(format!("unknown experience level '{other}'")),
        }
    }
}

const CUSTOM_PREFIX: &str = "custom.";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateFilter {
    pub stage: Option<Stage>,
    pub search: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub location: Option<String>,
    pub min_experience: Option<f64>,
    pub max_salary: Option<f64>,
    pub skills: Vec<String>,
    /// Applicant field → required substring.
    pub custom: BTreeMap<String, String>,
}

impl CandidateFilter {
    /// Builds a filter from query parameters. Blank values are ignored;
    /// `experience_level=all` means any level.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let mut filter = CandidateFilter::default();

        for (key, raw) in params {
            let value = raw.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "stage" => filter.stage = Some(value.parse()?),
                "search" => filter.search = Some(value.to_lowercase()),
                "experience_level" | "experienceLevel" => {
                    if !value.eq_ignore_ascii_case("all") {
                        filter.experience_level = Some(value.parse()?);
                    }
                }
                "location" => filter.location = Some(value.to_lowercase()),
                "min_experience" | "minExperience" => {
                    filter.min_experience = Some(parse_number(key, value)?)
                }
                "max_salary" | "maxSalary" => filter.max_salary = Some(parse_number(key, value)?),
                "skills" => {
                    filter.skills = value
                        .split(',')
                        .map(|s| s.trim().to_lowercase())
                        .filter(|s| !s.is_empty())
                        .collect()
                }
                other => {
                    if let Some(field) = other.strip_prefix(CUSTOM_PREFIX) {
                        if !field.is_empty() {
                            filter
                                .custom
                                .insert(snake_to_camel(field), value.to_lowercase());
                        }
                    }
                }
            }
        }

        Ok(filter)
    }

    pub fn is_active(&self) -> bool {
        *self != CandidateFilter::default()
    }

    pub fn matches(&self, application: &Application, applicant: &Applicant) -> bool {
        if let Some(stage) = self.stage {
            if application.current_stage != stage.as_str() {
                return false;
            }
        }

        let profile_text = profile_text(applicant);

        if let Some(term) = &self.search {
            let hit = applicant.full_name.to_lowercase().contains(term)
                || applicant.email.to_lowercase().contains(term)
                || profile_text.contains(term);
            if !hit {
                return false;
            }
        }

        if let Some(level) = self.experience_level {
            match applicant.year_of_experience {
                Some(years) if ExperienceLevel::from_years(years) == level => {}
                _ => return false,
            }
        }

        if let Some(location) = &self.location {
            let hit = applicant
                .location
                .as_deref()
                .map(|l| l.to_lowercase().contains(location))
                .unwrap_or(false);
            if !hit {
                return false;
            }
        }

        if let Some(min) = self.min_experience {
            if applicant.year_of_experience.unwrap_or(0.0) < min {
                return false;
            }
        }

        if let Some(max) = self.max_salary {
            if let Some(salary) = salary_amount(&application.expected_salary) {
                if salary > max {
                    return false;
                }
            }
        }

        if !self.skills.iter().all(|skill| profile_text.contains(skill)) {
            return false;
        }

        if !self.custom.is_empty() {
            let fields = serde_json::to_value(applicant).unwrap_or(Value::Null);
            for (field, wanted) in &self.custom {
                if !value_contains(fields.get(field), wanted) {
                    return false;
                }
            }
        }

        true
    }
}

fn parse_number(key: &str, value: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .map_err(|_| format!("{key} must be a number"))
}

/// `profile_links` → `profileLinks`, so custom filters accept either spelling.
fn snake_to_camel(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Lower-cased text the search and skill filters look through.
fn profile_text(applicant: &Applicant) -> String {
    let mut text = String::new();
    if let Some(summary) = &applicant.summary {
        text.push_str(summary);
        text.push('\n');
    }
    for language in &applicant.languages {
        text.push_str(language);
        text.push('\n');
    }
    for json in [&applicant.experience, &applicant.education].into_iter().flatten() {
        collect_strings(json, &mut text);
    }
    text.to_lowercase()
}

fn collect_strings(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => {
            out.push_str(s);
            out.push('\n');
        }
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

fn value_contains(value: Option<&Value>, wanted: &str) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => s.to_lowercase().contains(wanted),
        Some(Value::Array(items)) => items.iter().any(|item| value_contains(Some(item), wanted)),
        Some(other) => other.to_string().to_lowercase().contains(wanted),
    }
}

/// Numeric value of a free-form salary such as `Rp 15.000.000` or `$120,000`.
/// `None` when the text holds no digits.
pub fn salary_amount(expected_salary: &str) -> Option<f64> {
    let digits: String = expected_salary
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<f64>().ok()
}

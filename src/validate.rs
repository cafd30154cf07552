//! Rich-result checks for `JobPosting` structured data.
//!
//! Problems come back as data. Only `errors` affect validity; warnings
//! and recommendations are advisory.

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;

use crate::models::EmploymentType;

pub const JOB_LOCATION_TYPES: [&str; 2] = ["TELECOMMUTE", "ON_SITE"];

const TITLE_WARN_LENGTH: usize = 100;
const DESCRIPTION_MIN_LENGTH: usize = 100;

const RECOMMENDED_FIELDS: [&str; 5] = [
    "validThrough",
    "industry",
    "qualifications",
    "experienceRequirements",
    "applicationContact",
];

// YYYY-MM-DD, optionally followed by an ISO-8601 time and offset
static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{2})-(\d{2})(?:T\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?$",
    )
    .expect("date pattern is valid")
});

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Non-empty, non-whitespace string at `path`.
fn text_at<'a>(data: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = data;
    for key in path {
        current = match current {
            // schema.org allows a list of places or organizations; check the first
            Value::Array(items) => items.first()?.get(key)?,
            _ => current.get(key)?,
        };
    }
    current.as_str().filter(|s| !s.trim().is_empty())
}

fn is_present(data: &Value, key: &str) -> bool {
    match data.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

pub fn is_valid_date(value: &str) -> bool {
    let Some(cap) = DATE_PATTERN.captures(value) else {
        return false;
    };
    let part = |i: usize| cap.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    match (cap.get(1).and_then(|m| m.as_str().parse::<i32>().ok()), part(2), part(3)) {
        (Some(year), Some(month), Some(day)) => NaiveDate::from_ymd_opt(year, month, day).is_some(),
        _ => false,
    }
}

/// String values of a field that may be a single string or a list of strings.
fn enum_values(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(enum_value).collect(),
        other => vec![enum_value(other)],
    }
}

fn enum_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn validate_job_posting(data: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    match text_at(data, &["title"]) {
        None => report.errors.push("Missing required field: title".to_string()),
        Some(title) => {
            let len = title.chars().count();
            if len > TITLE_WARN_LENGTH {
                report.warnings.push(format!(
                    "title is {} characters; keep it under {} for search results",
                    len, TITLE_WARN_LENGTH
                ));
            }
        }
    }

    match text_at(data, &["description"]) {
        None => report.errors.push("Missing required field: description".to_string()),
        Some(description) => {
            let len = description.chars().count();
            if len < DESCRIPTION_MIN_LENGTH {
                report.warnings.push(format!(
                    "description is only {} characters; at least {} is recommended",
                    len, DESCRIPTION_MIN_LENGTH
                ));
            }
        }
    }

    match text_at(data, &["datePosted"]) {
        None => report.errors.push("Missing required field: datePosted".to_string()),
        Some(date) if !is_valid_date(date) => report.errors.push(format!(
            "Invalid datePosted '{}': expected YYYY-MM-DD or an ISO-8601 timestamp",
            date
        )),
        Some(_) => {}
    }

    if text_at(data, &["hiringOrganization", "name"]).is_none() {
        report
            .errors
            .push("Missing required field: hiringOrganization.name".to_string());
    }
    if text_at(data, &["jobLocation", "address", "addressLocality"]).is_none() {
        report
            .errors
            .push("Missing required field: jobLocation.address.addressLocality".to_string());
    }
    if text_at(data, &["jobLocation", "address", "addressCountry"]).is_none() {
        report
            .errors
            .push("Missing required field: jobLocation.address.addressCountry".to_string());
    }

    if let Some(value) = data.get("employmentType").filter(|v| !v.is_null()) {
        for kind in enum_values(value) {
            if EmploymentType::parse(&kind).is_none() {
                let allowed: Vec<&str> = EmploymentType::ALL.iter().map(|t| t.as_str()).collect();
                report.errors.push(format!(
                    "Invalid employmentType '{}': expected one of {}",
                    kind,
                    allowed.join(", ")
                ));
            }
        }
    }

    if let Some(value) = data.get("jobLocationType").filter(|v| !v.is_null()) {
        for kind in enum_values(value) {
            if !JOB_LOCATION_TYPES.contains(&kind.as_str()) {
                report.errors.push(format!(
                    "Invalid jobLocationType '{}': expected one of {}",
                    kind,
                    JOB_LOCATION_TYPES.join(", ")
                ));
            }
        }
    }

    for field in RECOMMENDED_FIELDS {
        if !is_present(data, field) {
            report
                .recommendations
                .push(format!("Add {} for richer search results", field));
        }
    }

    report.valid = report.errors.is_empty();
    report
}

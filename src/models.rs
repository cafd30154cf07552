use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

/// Job record as supplied by the data layer.
///
/// `id` is the identity; `title` is display-only and may change.
/// `title`, `organization`, `location`, `country` and `date_posted` are
/// assumed present and non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: u64,
    pub title: String,
    pub organization: String,
    pub location: String,
    pub country: String,
    pub sector: Option<String>,
    #[serde(deserialize_with = "deserialize_date")]
    pub date_posted: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub deadline: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub qualifications: Option<String>,
    pub responsibilities: Option<String>,
    pub experience: Option<String>,
    pub url: Option<String>,
    pub source: Option<String>,
    pub external_id: Option<String>,
    /// Explicit classification; when absent it is inferred from `experience`.
    pub employment_type: Option<EmploymentType>,
}

impl JobRecord {
    /// Load records from a JSON array, a single JSON object, or JSON lines.
    pub fn load_all(path: &Path) -> Result<Vec<JobRecord>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read jobs file: {}", path.display()))?;
        Self::parse_all(&content)
            .with_context(|| format!("Failed to parse jobs file: {}", path.display()))
    }

    pub fn parse_all(content: &str) -> Result<Vec<JobRecord>> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        if trimmed.starts_with('[') {
            return serde_json::from_str(trimmed).context("Invalid JSON array of jobs");
        }

        // A pretty-printed single object spans several lines, so try it whole first
        if let Ok(record) = serde_json::from_str::<JobRecord>(trimmed) {
            return Ok(vec![record]);
        }

        trimmed
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line).with_context(|| format!("Invalid job on line {}", i + 1))
            })
            .collect()
    }
}

/// Find a record by id, mapping absence to a not-found error.
pub fn find_job(records: &[JobRecord], id: u64) -> Result<&JobRecord> {
    records
        .iter()
        .find(|job| job.id == id)
        .ok_or_else(|| anyhow!("Job #{} not found", id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contractor,
    Temporary,
    Intern,
    Volunteer,
    PerDiem,
    Other,
}

impl EmploymentType {
    pub const ALL: [EmploymentType; 8] = [
        EmploymentType::FullTime,
        EmploymentType::PartTime,
        EmploymentType::Contractor,
        EmploymentType::Temporary,
        EmploymentType::Intern,
        EmploymentType::Volunteer,
        EmploymentType::PerDiem,
        EmploymentType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "FULL_TIME",
            EmploymentType::PartTime => "PART_TIME",
            EmploymentType::Contractor => "CONTRACTOR",
            EmploymentType::Temporary => "TEMPORARY",
            EmploymentType::Intern => "INTERN",
            EmploymentType::Volunteer => "VOLUNTEER",
            EmploymentType::PerDiem => "PER_DIEM",
            EmploymentType::Other => "OTHER",
        }
    }

    pub fn parse(value: &str) -> Option<EmploymentType> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| anyhow!("Unrecognized date '{}'", value))?;
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| anyhow!("Unrecognized date '{}'", value))
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => {
            parse_date(&raw).map(Some).map_err(serde::de::Error::custom)
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
pub(crate) fn sample_job() -> JobRecord {
    JobRecord {
        id: 42,
        title: "Senior Program Officer".to_string(),
        organization: "Médecins Sans Frontières".to_string(),
        location: "Nairobi".to_string(),
        country: "Kenya".to_string(),
        sector: Some("Health".to_string()),
        date_posted: parse_date("2024-03-01T09:30:00Z").unwrap(),
        deadline: None,
        description: Some("Lead program delivery across field sites.".to_string()),
        qualifications: Some("Master's degree in public health".to_string()),
        responsibilities: None,
        experience: Some("5+ years, Full-time".to_string()),
        url: Some("https://reliefweb.int/job/12345".to_string()),
        source: Some("reliefweb".to_string()),
        external_id: Some("RW-12345".to_string()),
        employment_type: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_date_accepts_date_only() {
        let dt = parse_date("2024-02-29").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 2, 29));
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_parse_date_normalizes_offsets_to_utc() {
        let dt = parse_date("2024-01-15T10:00:00+02:00").unwrap();
        assert_eq!(dt.hour(), 8);
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("next tuesday").is_err());
        assert!(parse_date("2023-02-30").is_err());
    }

    #[test]
    fn test_parse_all_json_array() {
        let content = r#"[
            {"id": 1, "title": "Logistics Officer", "organization": "WFP",
             "location": "Juba", "country": "South Sudan", "datePosted": "2024-05-01"},
            {"id": 2, "title": "WASH Engineer", "organization": "UNICEF",
             "location": "Cox's Bazar", "country": "Bangladesh",
             "datePosted": "2024-05-02T00:00:00Z", "deadline": "2024-06-01",
             "employmentType": "PART_TIME"}
        ]"#;
        let jobs = JobRecord::parse_all(content).unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(jobs[0].deadline.is_none());
        assert!(jobs[0].sector.is_none());
        assert!(jobs[1].deadline.is_some());
        assert_eq!(jobs[1].employment_type, Some(EmploymentType::PartTime));
    }

    #[test]
    fn test_parse_all_json_lines_and_single_object() {
        let lines = concat!(
            r#"{"id": 3, "title": "A", "organization": "O", "location": "L", "country": "C", "datePosted": "2024-01-01"}"#,
            "\n\n",
            r#"{"id": 4, "title": "B", "organization": "O", "location": "L", "country": "C", "datePosted": "2024-01-02", "deadline": ""}"#,
        );
        let jobs = JobRecord::parse_all(lines).unwrap();
        assert_eq!(jobs.iter().map(|j| j.id).collect::<Vec<_>>(), vec![3, 4]);
        assert!(jobs[1].deadline.is_none());

        let single = "{\n  \"id\": 5,\n  \"title\": \"C\",\n  \"organization\": \"O\",\n  \"location\": \"L\",\n  \"country\": \"C\",\n  \"datePosted\": \"2024-01-03\"\n}";
        assert_eq!(JobRecord::parse_all(single).unwrap()[0].id, 5);
    }

    #[test]
    fn test_parse_all_reports_bad_line() {
        let lines = "{\"id\": 1}\nnot json";
        let err = JobRecord::parse_all(lines).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_find_job_not_found() {
        let jobs = vec![sample_job()];
        assert_eq!(find_job(&jobs, 42).unwrap().title, "Senior Program Officer");
        let err = find_job(&jobs, 7).unwrap_err();
        assert!(err.to_string().contains("#7 not found"));
    }

    #[test]
    fn test_employment_type_round_trips_names() {
        for kind in EmploymentType::ALL {
            assert_eq!(EmploymentType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EmploymentType::parse("full_time"), None);
    }
}

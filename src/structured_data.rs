//! schema.org JSON-LD for job pages: `JobPosting`, `ItemList` and `BreadcrumbList`.
//!
//! Everything here is a pure mapping from [`JobRecord`]s and the site
//! config. Missing optional fields get literal defaults; nothing fails.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::Serialize;
use tracing::warn;

use crate::config::{SiteConfig, DEFAULT_VALIDITY_DAYS, VALIDITY_DAYS_RANGE};
use crate::meta::truncate;
use crate::models::{EmploymentType, JobRecord};
use crate::slug::job_path;

pub const SCHEMA_CONTEXT: &str = "https://schema.org";
pub const BREADCRUMB_MARKER: &str = "breadcrumbs";
pub const JOB_LIST_MARKER: &str = "job-list";

const BREADCRUMB_LABEL_MAX: usize = 50;

pub fn job_posting_marker(id: u64) -> String {
    format!("job-posting-{}", id)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub title: String,
    pub description: String,
    pub identifier: PropertyValue,
    pub date_posted: String,
    pub valid_through: String,
    pub employment_type: EmploymentType,
    pub hiring_organization: Organization,
    pub job_location: Place,
    pub industry: String,
    pub occupational_category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifications: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsibilities: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_requirements: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_contact: Option<ContactPoint>,
    pub direct_apply: bool,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyValue {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: String,
    pub same_as: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Place {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub address: PostalAddress,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub address_locality: String,
    pub address_country: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPoint {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub contact_type: &'static str,
    pub url: String,
}

/// `ItemList` for listing pages and `BreadcrumbList` share this shape.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemList {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_items: Option<usize>,
    pub item_list_element: Vec<ListItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListItem {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreadcrumbItem {
    pub label: String,
    /// Absent for the current page.
    pub path: Option<String>,
    pub current: bool,
}

/// Full ISO-8601 UTC timestamp, millisecond precision, `Z` suffix.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Heuristic classification; an explicit `employment_type` on the record wins.
/// Only an exact "Full-time" substring in `experience` yields FULL_TIME.
pub fn infer_employment_type(job: &JobRecord) -> EmploymentType {
    if let Some(kind) = job.employment_type {
        return kind;
    }
    match job.experience.as_deref() {
        Some(experience) if experience.contains("Full-time") => EmploymentType::FullTime,
        _ => EmploymentType::Contractor,
    }
}

fn organization_same_as(job: &JobRecord, config: &SiteConfig) -> String {
    match job.url.as_deref() {
        Some(url) if config.is_trusted_url(url) => url.to_string(),
        _ => config.absolute_url(&format!(
            "/organizations/{}",
            urlencoding::encode(&job.organization)
        )),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `datePosted` plus the configured window. An out-of-range window falls
/// back to the default rather than failing the build.
fn default_valid_through(job: &JobRecord, config: &SiteConfig) -> DateTime<Utc> {
    let window = Some(config.validity_days)
        .filter(|days| VALIDITY_DAYS_RANGE.contains(days))
        .and_then(TimeDelta::try_days)
        .and_then(|window| job.date_posted.checked_add_signed(window));
    if let Some(valid_through) = window {
        return valid_through;
    }
    warn!(validity_days = config.validity_days, "validity window out of range, using default");
    TimeDelta::try_days(DEFAULT_VALIDITY_DAYS)
        .and_then(|window| job.date_posted.checked_add_signed(window))
        .unwrap_or(job.date_posted)
}

pub fn build_job_posting(job: &JobRecord, config: &SiteConfig) -> JobPosting {
    let valid_through = job
        .deadline
        .unwrap_or_else(|| default_valid_through(job, config));

    let description = non_empty(job.description.as_deref()).unwrap_or_else(|| {
        format!(
            "{} at {} in {}, {}.",
            job.title, job.organization, job.location, job.country
        )
    });

    let sector = non_empty(job.sector.as_deref());

    JobPosting {
        context: SCHEMA_CONTEXT,
        kind: "JobPosting",
        title: job.title.clone(),
        description,
        identifier: PropertyValue {
            kind: "PropertyValue",
            name: job.organization.clone(),
            value: non_empty(job.external_id.as_deref()).unwrap_or_else(|| job.id.to_string()),
        },
        date_posted: format_timestamp(&job.date_posted),
        valid_through: format_timestamp(&valid_through),
        employment_type: infer_employment_type(job),
        hiring_organization: Organization {
            kind: "Organization",
            name: job.organization.clone(),
            same_as: organization_same_as(job, config),
        },
        job_location: Place {
            kind: "Place",
            address: PostalAddress {
                kind: "PostalAddress",
                address_locality: job.location.clone(),
                address_country: job.country.clone(),
            },
        },
        industry: sector
            .clone()
            .unwrap_or_else(|| config.default_industry.clone()),
        occupational_category: sector
            .unwrap_or_else(|| config.default_occupational_category.clone()),
        qualifications: non_empty(job.qualifications.as_deref()),
        responsibilities: non_empty(job.responsibilities.as_deref()),
        experience_requirements: non_empty(job.experience.as_deref()),
        application_contact: non_empty(job.url.as_deref()).map(|url| ContactPoint {
            kind: "ContactPoint",
            contact_type: "Application",
            url,
        }),
        direct_apply: false,
        url: config.absolute_url(&job_path(&job.title, job.id)),
    }
}

pub fn build_job_postings(jobs: &[JobRecord], config: &SiteConfig) -> Vec<JobPosting> {
    jobs.iter().map(|job| build_job_posting(job, config)).collect()
}

/// Summary list for a listing page; each entry points at the job's canonical URL.
pub fn build_job_posting_list(jobs: &[JobRecord], config: &SiteConfig) -> ItemList {
    ItemList {
        context: SCHEMA_CONTEXT,
        kind: "ItemList",
        number_of_items: Some(jobs.len()),
        item_list_element: jobs
            .iter()
            .enumerate()
            .map(|(i, job)| ListItem {
                kind: "ListItem",
                position: i + 1,
                name: Some(job.title.clone()),
                item: None,
                url: Some(config.absolute_url(&job_path(&job.title, job.id))),
            })
            .collect(),
    }
}

/// Home, Jobs, an optional sector filter, and on detail pages the current job.
pub fn breadcrumb_trail(title: &str, sector: Option<&str>, is_detail_page: bool) -> Vec<BreadcrumbItem> {
    let mut trail = vec![
        BreadcrumbItem {
            label: "Home".to_string(),
            path: Some("/".to_string()),
            current: false,
        },
        BreadcrumbItem {
            label: "Jobs".to_string(),
            path: Some("/jobs".to_string()),
            current: false,
        },
    ];

    if let Some(sector) = sector.map(str::trim).filter(|s| !s.is_empty()) {
        trail.push(BreadcrumbItem {
            label: format!("{} Jobs", sector),
            path: Some(format!("/jobs?sector={}", urlencoding::encode(sector))),
            current: false,
        });
    }

    if is_detail_page {
        trail.push(BreadcrumbItem {
            label: truncate(title, BREADCRUMB_LABEL_MAX),
            path: None,
            current: true,
        });
    }

    trail
}

pub fn build_breadcrumb_list(trail: &[BreadcrumbItem], config: &SiteConfig) -> ItemList {
    ItemList {
        context: SCHEMA_CONTEXT,
        kind: "BreadcrumbList",
        number_of_items: None,
        item_list_element: trail
            .iter()
            .enumerate()
            .map(|(i, crumb)| ListItem {
                kind: "ListItem",
                position: i + 1,
                name: Some(crumb.label.clone()),
                item: crumb.path.as_deref().map(|path| config.absolute_url(path)),
                url: None,
            })
            .collect(),
    }
}

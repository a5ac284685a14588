use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::info;

use crate::record::{JobRecord, RawBag};

/// Coerce raw bags into typed records and drop duplicates, keeping
/// first-seen order. Running it over its own output changes nothing.
pub fn normalize_records(bags: &[RawBag]) -> Vec<JobRecord> {
    let cleaned: Vec<JobRecord> = bags.iter().map(normalize_one).collect();
    let before = cleaned.len();
    let unique = dedupe(cleaned);
    info!("Normalized {} -> {} unique records", before, unique.len());
    unique
}

/// Project one bag onto the schema. Unknown keys are dropped, strings are
/// trimmed, list fields always come out as lists.
pub fn normalize_one(bag: &RawBag) -> JobRecord {
    JobRecord {
        id: string(bag, "id"),
        link: string(bag, "link"),
        title: string(bag, "title"),
        company_name: string(bag, "companyName"),
        company_linkedin_url: string(bag, "companyLinkedinUrl"),
        company_logo: string(bag, "companyLogo"),
        location: string(bag, "location"),
        salary_info: list(bag, "salaryInfo"),
        posted_at: string(bag, "postedAt").map(|d| coerce_date(&d)),
        benefits: list(bag, "benefits"),
        description_html: string(bag, "descriptionHtml"),
        applicants_count: string(bag, "applicantsCount"),
        job_poster_name: string(bag, "jobPosterName"),
        job_poster_title: string(bag, "jobPosterTitle"),
        job_poster_photo: string(bag, "jobPosterPhoto"),
        job_poster_profile_url: string(bag, "jobPosterProfileUrl"),
        seniority_level: string(bag, "seniorityLevel"),
        employment_type: string(bag, "employmentType"),
        job_function: string(bag, "jobFunction"),
        industries: list(bag, "industries"),
        company_description: string(bag, "companyDescription"),
        company_website: string(bag, "companyWebsite"),
        company_employees_count: string(bag, "companyEmployeesCount"),
    }
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string()),
    }
}

fn string(bag: &RawBag, key: &str) -> Option<String> {
    bag.get(key).and_then(render)
}

/// A bare value becomes a one-item list; nulls inside lists are skipped.
fn list(bag: &RawBag, key: &str) -> Option<Vec<String>> {
    match bag.get(key)? {
        Value::Array(items) => Some(items.iter().filter_map(render).collect()),
        other => render(other).map(|v| vec![v]),
    }
}

/// Rewrite recognized dates as `YYYY-MM-DD`; anything else ("2 days ago")
/// is returned unchanged.
pub fn coerce_date(val: &str) -> String {
    parse_date(val)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| val.to_string())
}

fn parse_date(val: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(val, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_str(val, "%Y-%m-%dT%H:%M:%S%z")
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            let utc = val.strip_suffix('Z')?;
            NaiveDateTime::parse_from_str(utc, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(val, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(val, "%b %d, %Y").ok())
}

/// Keep the first record per identity key. Keyless records never collide.
fn dedupe(records: Vec<JobRecord>) -> Vec<JobRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| match r.identity() {
            Some(key) => seen.insert(key.to_string()),
            None => true,
        })
        .collect()
}

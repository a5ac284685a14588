use serde::Serialize;
use serde_json::{Map, Value};

/// Untyped field bag as produced by the card extractor or read from sample data.
/// Values may not match the schema yet (bare strings for lists, extra keys).
pub type RawBag = Map<String, Value>;

/// One job listing. Field order here is the export order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: Option<String>,
    pub link: Option<String>,
    pub title: Option<String>,
    pub company_name: Option<String>,
    pub company_linkedin_url: Option<String>,
    pub company_logo: Option<String>,
    pub location: Option<String>,
    pub salary_info: Option<Vec<String>>,
    pub posted_at: Option<String>,
    pub benefits: Option<Vec<String>>,
    pub description_html: Option<String>,
    pub applicants_count: Option<String>,
    pub job_poster_name: Option<String>,
    pub job_poster_title: Option<String>,
    pub job_poster_photo: Option<String>,
    pub job_poster_profile_url: Option<String>,
    pub seniority_level: Option<String>,
    pub employment_type: Option<String>,
    pub job_function: Option<String>,
    pub industries: Option<Vec<String>>,
    pub company_description: Option<String>,
    pub company_website: Option<String>,
    pub company_employees_count: Option<String>,
}

impl JobRecord {
    /// Identity used for deduplication: `id`, else `link`. Empty strings don't count.
    pub fn identity(&self) -> Option<&str> {
        non_empty(&self.id).or_else(|| non_empty(&self.link))
    }

    pub fn into_bag(self) -> RawBag {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => RawBag::new(),
        }
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !v.is_empty())
}

/// Company metadata patch. Only `Some` fields are applied by [`merge`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub company_description: Option<String>,
    pub company_website: Option<String>,
    pub company_employees_count: Option<String>,
    pub company_logo: Option<String>,
}

impl CompanyProfile {
    pub fn is_empty(&self) -> bool {
        self.company_description.is_none()
            && self.company_website.is_none()
            && self.company_employees_count.is_none()
            && self.company_logo.is_none()
    }
}

/// Overwrite the keys the patch supplies and leave everything else alone.
pub fn merge(mut bag: RawBag, patch: &CompanyProfile) -> RawBag {
    let fields = [
        ("companyDescription", &patch.company_description),
        ("companyWebsite", &patch.company_website),
        ("companyEmployeesCount", &patch.company_employees_count),
        ("companyLogo", &patch.company_logo),
    ];
    for (key, value) in fields {
        if let Some(v) = value {
            bag.insert(key.to_string(), Value::String(v.clone()));
        }
    }
    bag
}

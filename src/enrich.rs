use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::EnrichError;
use crate::fetch::{Fetch, FetchPool};
use crate::parser::extract::company;
use crate::record::{merge, CompanyProfile, RawBag};

/// Older exports carried the company link under this key.
const LEGACY_COMPANY_KEY: &str = "companyProfile";

/// Company page a bag points at, if any.
pub fn company_url(bag: &RawBag) -> Option<&str> {
    ["companyLinkedinUrl", LEGACY_COMPANY_KEY]
        .iter()
        .filter_map(|key| bag.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|url| !url.is_empty())
}

/// Fetch one company page and extract its profile.
pub async fn profile(fetcher: &dyn Fetch, url: &str) -> Result<CompanyProfile, EnrichError> {
    let html = fetcher.fetch(url).await?;
    Ok(company::extract(&html))
}

/// Merge company metadata into every bag that links a company. Each company
/// page is fetched once per run. A failed fetch leaves the bag unchanged.
pub async fn enrich_all(pool: &FetchPool, bags: Vec<RawBag>) -> Vec<RawBag> {
    let mut urls: Vec<String> = Vec::new();
    for url in bags.iter().filter_map(company_url) {
        if !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    if urls.is_empty() {
        debug!("No company links to enrich");
        return bags;
    }

    info!("Enriching {} records from {} company pages", bags.len(), urls.len());
    let fetched = pool.fetch_all(&urls, "companies").await;

    let mut profiles: HashMap<String, CompanyProfile> = HashMap::with_capacity(urls.len());
    for (url, result) in urls.into_iter().zip(fetched) {
        let profile = match result {
            Ok(html) => company::extract(&html),
            Err(e) => {
                debug!("Company enrichment failed for {}: {}", url, e);
                CompanyProfile::default()
            }
        };
        if profile.is_empty() {
            debug!("No company metadata found at {}", url);
        }
        profiles.insert(url, profile);
    }

    bags.into_iter()
        .map(|bag| {
            let patch = company_url(&bag).and_then(|url| profiles.get(url)).cloned();
            match patch {
                Some(patch) => merge(bag, &patch),
                None => bag,
            }
        })
        .collect()
}

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::info;

use crate::parser::dom::{self, Predicate};
use crate::record::{JobRecord, RawBag};

static RESULTS_LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(jobs-search__results-list|jobs-search-results)").unwrap());
static CARD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(base-card|jobs-search-results__list-item|job-card)").unwrap()
});
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(base-card__full-link|job-card-list__title)").unwrap());
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(base-search-card__title|job-card-list__title)").unwrap());
static COMPANY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(base-search-card__subtitle|job-card-container__company-name)").unwrap()
});
static COMPANY_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"company-name").unwrap());
static LOGO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(artdeco-entity-image|base-search-card__logo)").unwrap());
static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(job-search-card__location|job-card-container__metadata-item)").unwrap()
});
static SALARY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"salary").unwrap());
static BENEFIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(actively-hiring|benefit-badge|insight)").unwrap());
static META_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(metadata|job-posting)").unwrap());

static JOB_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"jobs/view/(\d+)").unwrap());
static MONEY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\$€£]\s?\d[\d,\.]*").unwrap());
static APPLICANTS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d[\d,]*)\+?").unwrap());

const EMPLOYMENT_KEYWORDS: &[&str] = &["full-time", "contract", "part-time", "intern"];

/// Where the result cards live, most specific first.
const CONTAINER_CHAIN: &[Predicate] = &[
    |el| dom::is_tag(el, &["ul"]) && dom::class_matches(el, &RESULTS_LIST_RE),
    |el| el.value().attr("data-search-id").is_some(),
];

/// Parse one search-results page into raw job bags, in document order.
pub fn extract(html: &str, base_url: &str) -> Vec<RawBag> {
    let doc = Html::parse_document(html);
    let root = dom::root(&doc);
    let container = dom::find_with_fallbacks(root, CONTAINER_CHAIN).unwrap_or(root);

    let cards = dom::find_all(container, |el| {
        dom::is_tag(el, &["li", "div"]) && dom::class_matches(el, &CARD_RE)
    });
    info!("Found {} job card candidates", cards.len());

    cards
        .into_iter()
        .map(|card| parse_card(card, base_url).into_bag())
        .collect()
}

fn parse_card(card: ElementRef, base_url: &str) -> JobRecord {
    let link = job_link(card, base_url);
    let id = link
        .as_deref()
        .and_then(|l| JOB_ID_RE.captures(l))
        .map(|c| c[1].to_string());
    let (company_name, company_linkedin_url) = company(card, base_url);
    let (applicants_count, employment_type) = metadata(card);

    JobRecord {
        id,
        link,
        title: title(card),
        company_name,
        company_linkedin_url,
        company_logo: logo(card),
        location: location(card),
        salary_info: salary(card),
        posted_at: posted_at(card),
        benefits: benefits(card),
        applicants_count,
        employment_type,
        ..Default::default()
    }
}

fn job_link(card: ElementRef, base_url: &str) -> Option<String> {
    let anchor = dom::find(card, |el| {
        dom::is_tag(el, &["a"]) && el.value().attr("href").is_some() && dom::class_matches(el, &LINK_RE)
    })?;
    let href = dom::attr(&anchor, "href")?;
    dom::resolve_url(base_url, &href)
}

fn title(card: ElementRef) -> Option<String> {
    dom::find(card, |el| dom::is_tag(el, &["h3", "a"]) && dom::class_matches(el, &TITLE_RE))
        .and_then(|el| dom::clean_text(&el))
}

fn company(card: ElementRef, base_url: &str) -> (Option<String>, Option<String>) {
    let name_el = dom::find(card, |el| {
        dom::is_tag(el, &["h4", "a", "span"]) && dom::class_matches(el, &COMPANY_RE)
    });
    let name = name_el.and_then(|el| dom::clean_text(&el));

    let link_el = match name_el {
        Some(el) if dom::is_tag(&el, &["a"]) => Some(el),
        _ => dom::find(card, |el| {
            dom::is_tag(el, &["a"])
                && el.value().attr("href").is_some()
                && dom::class_matches(el, &COMPANY_LINK_RE)
        }),
    };
    let url = link_el
        .and_then(|el| dom::attr(&el, "href"))
        .and_then(|href| dom::resolve_url(base_url, &href));

    (name, url)
}

fn logo(card: ElementRef) -> Option<String> {
    let img = dom::find(card, |el| dom::is_tag(el, &["img"]) && dom::class_matches(el, &LOGO_RE))?;
    dom::attr(&img, "src").or_else(|| dom::attr(&img, "data-delayed-url"))
}

fn location(card: ElementRef) -> Option<String> {
    dom::find(card, |el| dom::is_tag(el, &["span"]) && dom::class_matches(el, &LOCATION_RE))
        .and_then(|el| dom::clean_text(&el))
}

/// `None` without a salary block; an empty list when the block has no amounts.
fn salary(card: ElementRef) -> Option<Vec<String>> {
    let block = dom::find(card, |el| dom::is_tag(el, &["div"]) && dom::class_matches(el, &SALARY_RE))?;
    let raw = dom::text(&block);
    Some(
        MONEY_RE
            .find_iter(&raw)
            .map(|m| m.as_str().to_string())
            .collect(),
    )
}

fn benefits(card: ElementRef) -> Option<Vec<String>> {
    let mut found: Vec<String> = Vec::new();
    for badge in dom::find_all(card, |el| dom::is_tag(el, &["span"]) && dom::class_matches(el, &BENEFIT_RE)) {
        let val = dom::text(&badge);
        if !val.is_empty() && !found.contains(&val) {
            found.push(val);
        }
    }
    if found.is_empty() {
        None
    } else {
        Some(found)
    }
}

fn posted_at(card: ElementRef) -> Option<String> {
    let time = dom::find(card, |el| dom::is_tag(el, &["time"]))?;
    dom::attr(&time, "datetime").or_else(|| {
        let t = dom::text(&time);
        (!t.is_empty()).then_some(t)
    })
}

/// Applicant count and employment type from metadata spans.
/// Later spans overwrite earlier ones for both fields.
fn metadata(card: ElementRef) -> (Option<String>, Option<String>) {
    let mut applicants = None;
    let mut employment = None;

    for span in dom::find_all(card, |el| dom::is_tag(el, &["span"]) && dom::class_matches(el, &META_RE)) {
        let lower = dom::text(&span).to_lowercase();
        if lower.contains("applicant") {
            if let Some(caps) = APPLICANTS_RE.captures(&lower) {
                applicants = Some(caps[1].to_string());
            }
        }
        if EMPLOYMENT_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            let raw: String = span.text().collect();
            employment = Some(raw.trim().to_string());
        }
    }

    (applicants, employment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    fn field<'a>(bag: &'a RawBag, key: &str) -> &'a Value {
        bag.get(key).unwrap_or(&Value::Null)
    }

    #[test]
    fn no_cards_yields_empty() {
        assert!(extract("<html><body><p>Nothing here</p></body></html>", "https://example.com").is_empty());
        assert!(extract("", "").is_empty());
        assert!(extract("<<<not html at all", "not a url").is_empty());
    }

    #[test]
    fn link_is_stripped_resolved_and_yields_id() {
        let html = r#"<ul class="jobs-search__results-list"><li>
            <div class="base-card"><a class="base-card__full-link" href="/jobs/view/123456?x=1">x</a></div>
        </li></ul>"#;
        let bags = extract(html, "https://example.com");
        assert_eq!(bags.len(), 1);
        assert_eq!(field(&bags[0], "link"), &json!("https://example.com/jobs/view/123456"));
        assert_eq!(field(&bags[0], "id"), &json!("123456"));
    }

    #[test]
    fn search_results_page() {
        let bags = extract(&fixture("search_results"), "https://www.linkedin.com/jobs/search?keywords=rust");
        assert_eq!(bags.len(), 3);

        let first = &bags[0];
        assert_eq!(field(first, "id"), &json!("3812345678"));
        assert_eq!(field(first, "link"), &json!("https://www.linkedin.com/jobs/view/3812345678"));
        assert_eq!(field(first, "title"), &json!("Senior Rust Engineer"));
        assert_eq!(field(first, "companyName"), &json!("Acme Robotics"));
        assert_eq!(
            field(first, "companyLinkedinUrl"),
            &json!("https://www.linkedin.com/company/acme-robotics")
        );
        assert_eq!(field(first, "companyLogo"), &json!("https://media.example.com/acme.png"));
        assert_eq!(field(first, "location"), &json!("Berlin, Germany"));
        assert_eq!(field(first, "salaryInfo"), &json!(["$120,000", "$150,000.00"]));
        assert_eq!(field(first, "postedAt"), &json!("2024-01-15"));
        assert_eq!(field(first, "benefits"), &json!(["Actively Hiring", "Medical insurance"]));
        assert_eq!(field(first, "applicantsCount"), &json!("200"));
        assert_eq!(field(first, "employmentType"), &json!("Full-time"));
        assert_eq!(field(first, "companyDescription"), &Value::Null);
        assert_eq!(field(first, "descriptionHtml"), &Value::Null);
    }

    #[test]
    fn sparse_card_degrades_to_absent_fields() {
        let bags = extract(&fixture("search_results"), "https://www.linkedin.com/jobs/search");
        let second = &bags[1];
        assert_eq!(field(second, "title"), &json!("Data Engineer"));
        // lazy-loaded logo
        assert_eq!(field(second, "companyLogo"), &json!("https://media.example.com/lazy.png"));
        // company name is not a link; the separate company-name anchor is used
        assert_eq!(
            field(second, "companyLinkedinUrl"),
            &json!("https://www.linkedin.com/company/globex")
        );
        // salary block without amounts
        assert_eq!(field(second, "salaryInfo"), &json!([]));
        assert_eq!(field(second, "postedAt"), &json!("3 days ago"));
        assert_eq!(field(second, "benefits"), &Value::Null);
        assert_eq!(field(second, "applicantsCount"), &json!("1,024"));

        let third = &bags[2];
        assert_eq!(field(third, "link"), &Value::Null);
        assert_eq!(field(third, "id"), &Value::Null);
        assert_eq!(field(third, "title"), &Value::Null);
        assert_eq!(field(third, "salaryInfo"), &Value::Null);
        assert_eq!(field(third, "postedAt"), &Value::Null);
    }

    #[test]
    fn last_matching_metadata_span_wins() {
        // Observed behavior: employment type comes from the last qualifying span.
        let bags = extract(&fixture("search_results"), "https://www.linkedin.com/jobs/search");
        assert_eq!(field(&bags[1], "employmentType"), &json!("Internship"));

        let html = r#"<ul class="jobs-search__results-list"><li><div class="base-card">
            <span class="job-search-card__metadata-item">Be among the first 25 applicants</span>
            <span class="job-posting-meta">Full-time</span>
            <span class="result-metadata">Over 1,200+ applicants</span>
        </div></li></ul>"#;
        let bags = extract(html, "https://example.com");
        assert_eq!(field(&bags[0], "applicantsCount"), &json!("1,200"));
        assert_eq!(field(&bags[0], "employmentType"), &json!("Full-time"));
    }

    #[test]
    fn whole_document_fallback_finds_loose_cards() {
        let html = r#"<html><body>
            <div class="job-card-container">
              <a class="job-card-list__title" href="/jobs/view/101?trk=1">First</a>
            </div>
            <p>filler</p>
            <div class="job-card-container">
              <a class="job-card-list__title" href="/jobs/view/102">Second</a>
            </div>
        </body></html>"#;
        let bags = extract(html, "https://www.linkedin.com/jobs/search");
        assert_eq!(bags.len(), 2);
        assert_eq!(field(&bags[0], "id"), &json!("101"));
        assert_eq!(field(&bags[0], "title"), &json!("First"));
        assert_eq!(field(&bags[0], "link"), &json!("https://www.linkedin.com/jobs/view/101"));
        assert_eq!(field(&bags[1], "id"), &json!("102"));
        assert_eq!(field(&bags[1], "title"), &json!("Second"));
    }

    #[test]
    fn data_attribute_container_fallback() {
        let bags = extract(&fixture("alt_layout"), "https://www.linkedin.com/jobs/search");
        assert_eq!(bags.len(), 2);
        assert_eq!(field(&bags[0], "title"), &json!("Platform Engineer"));
        assert_eq!(field(&bags[0], "id"), &json!("555"));
        assert_eq!(field(&bags[0], "companyName"), &json!("Initech"));
        assert_eq!(field(&bags[0], "location"), &json!("Remote"));
        assert_eq!(field(&bags[1], "title"), &json!("SRE"));
    }

    #[test]
    fn container_scopes_card_search() {
        // cards outside the results list are ignored once the list is found
        let html = r#"
            <div class="job-card"><h3 class="base-search-card__title">Sidebar</h3></div>
            <ul class="jobs-search-results">
              <li class="jobs-search-results__list-item"><a class="job-card-list__title" href="https://x.test/jobs/view/7">Listed</a></li>
            </ul>"#;
        let bags = extract(html, "https://x.test");
        assert_eq!(bags.len(), 1);
        assert_eq!(field(&bags[0], "title"), &json!("Listed"));
        assert_eq!(field(&bags[0], "id"), &json!("7"));
    }
}

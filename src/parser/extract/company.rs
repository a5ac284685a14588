use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};

use crate::parser::dom;
use crate::record::CompanyProfile;

static ABOUT_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(about|organization)").unwrap());
static WEBSITE_TRACKING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(website|org-about)").unwrap());
static SIZE_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(employees|employee count|company size)").unwrap());
static SIZE_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d[\d,\.KkMm+]*)").unwrap());
static LOGO_ALT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)logo").unwrap());

/// Pull what we can from a company "about" page. Every field is best effort.
pub fn extract(html: &str) -> CompanyProfile {
    let doc = Html::parse_document(html);
    let root = dom::root(&doc);

    CompanyProfile {
        company_description: description(root),
        company_website: website(root),
        company_employees_count: employees(root),
        company_logo: logo(root),
    }
}

fn description(root: ElementRef) -> Option<String> {
    let section = dom::find(root, |el| {
        dom::is_tag(el, &["section"]) && dom::attr_matches(el, "id", &ABOUT_ID_RE)
    })?;
    let p = dom::find(section, |el| dom::is_tag(el, &["p"]))?;
    dom::clean_text(&p)
}

fn website(root: ElementRef) -> Option<String> {
    let a = dom::find(root, |el| {
        dom::is_tag(el, &["a"])
            && el.value().attr("href").is_some()
            && dom::attr_matches(el, "data-tracking-control-name", &WEBSITE_TRACKING_RE)
    })?;
    dom::attr(&a, "href")
}

/// First text node naming the company size, read through its parent element.
fn employees(root: ElementRef) -> Option<String> {
    let label = root.descendants().find(|node| {
        node.value()
            .as_text()
            .is_some_and(|t| SIZE_LABEL_RE.is_match(t))
    })?;
    let parent = label.parent().and_then(ElementRef::wrap)?;
    let text = dom::text(&parent);
    SIZE_VALUE_RE.captures(&text).map(|c| c[1].to_string())
}

fn logo(root: ElementRef) -> Option<String> {
    let img = dom::find(root, |el| {
        dom::is_tag(el, &["img"]) && dom::attr_matches(el, "alt", &LOGO_ALT_RE)
    })?;
    dom::attr(&img, "src").or_else(|| dom::attr(&img, "data-delayed-url"))
}

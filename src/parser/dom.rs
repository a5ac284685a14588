use regex::Regex;
use scraper::{ElementRef, Html};
use url::Url;

/// A structural test over one element. Fallback chains are slices of these,
/// tried in order until one finds something.
pub type Predicate = fn(&ElementRef) -> bool;

/// All elements below `scope` in document order, excluding `scope` itself.
pub fn elements<'a>(scope: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    scope.descendants().skip(1).filter_map(ElementRef::wrap)
}

pub fn find<'a, F>(scope: ElementRef<'a>, pred: F) -> Option<ElementRef<'a>>
where
    F: Fn(&ElementRef<'a>) -> bool,
{
    elements(scope).find(|el| pred(el))
}

pub fn find_all<'a, F>(scope: ElementRef<'a>, pred: F) -> Vec<ElementRef<'a>>
where
    F: Fn(&ElementRef<'a>) -> bool,
{
    elements(scope).filter(|el| pred(el)).collect()
}

/// First element matched by the earliest predicate that matches anything.
pub fn find_with_fallbacks<'a>(scope: ElementRef<'a>, chain: &[Predicate]) -> Option<ElementRef<'a>> {
    chain.iter().find_map(|pred| find(scope, |el| pred(el)))
}

pub fn root(doc: &Html) -> ElementRef<'_> {
    doc.root_element()
}

pub fn is_tag(el: &ElementRef, tags: &[&str]) -> bool {
    tags.contains(&el.value().name())
}

/// True when any single class token of `el` matches `re`.
pub fn class_matches(el: &ElementRef, re: &Regex) -> bool {
    el.value().classes().any(|c| re.is_match(c))
}

pub fn attr_matches(el: &ElementRef, name: &str, re: &Regex) -> bool {
    el.value().attr(name).is_some_and(|v| re.is_match(v))
}

/// Non-empty attribute value.
pub fn attr(el: &ElementRef, name: &str) -> Option<String> {
    el.value()
        .attr(name)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Stripped text fragments joined by single spaces.
pub fn text(el: &ElementRef) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text with all whitespace runs collapsed; `None` when empty.
pub fn clean_text(el: &ElementRef) -> Option<String> {
    let collapsed = text(el).split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Drop the query string and resolve `href` against `base`.
/// A query-only href points at the base itself. An unparseable base leaves
/// the stripped href as is.
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let href = href.split('?').next().unwrap_or(href).trim();
    if href.is_empty() {
        return (!base.is_empty()).then(|| base.to_string());
    }
    match Url::parse(base) {
        Ok(base) => base.join(href).ok().map(String::from),
        Err(_) => Some(href.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div id="outer" class="card">
            <span class="meta  item">  Remote
              (US) </span>
            <div class="card"><a class="x" href="/a?b=1">A</a></div>
          </div>
        </body></html>
    "#;

    #[test]
    fn find_skips_scope_and_walks_in_document_order() {
        let doc = Html::parse_document(PAGE);
        let re = Regex::new("card").unwrap();
        let cards = find_all(root(&doc), |el| class_matches(el, &re));
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].value().attr("id"), Some("outer"));

        let inner = find(cards[0], |el| class_matches(el, &re)).unwrap();
        assert!(inner.value().attr("id").is_none());
    }

    #[test]
    fn fallback_chain_uses_first_predicate_that_hits() {
        let doc = Html::parse_document(PAGE);
        let chain: [Predicate; 2] = [|el| is_tag(el, &["table"]), |el| is_tag(el, &["span"])];
        let hit = find_with_fallbacks(root(&doc), &chain).unwrap();
        assert_eq!(hit.value().name(), "span");

        let none: [Predicate; 1] = [|el| is_tag(el, &["table"])];
        assert!(find_with_fallbacks(root(&doc), &none).is_none());
    }

    #[test]
    fn clean_text_collapses_whitespace() {
        let doc = Html::parse_document(PAGE);
        let span = find(root(&doc), |el| is_tag(el, &["span"])).unwrap();
        assert_eq!(clean_text(&span).as_deref(), Some("Remote (US)"));
    }

    #[test]
    fn resolve_url_strips_query_and_joins() {
        assert_eq!(
            resolve_url("https://example.com", "/jobs/view/123456?x=1").as_deref(),
            Some("https://example.com/jobs/view/123456")
        );
        assert_eq!(
            resolve_url("https://example.com/search", "https://www.linkedin.com/company/acme?trk=a")
                .as_deref(),
            Some("https://www.linkedin.com/company/acme")
        );
        assert_eq!(resolve_url("", "/jobs/view/1").as_deref(), Some("/jobs/view/1"));
        assert_eq!(
            resolve_url("https://example.com/jobs/view/42", "?only=query").as_deref(),
            Some("https://example.com/jobs/view/42")
        );
        assert_eq!(resolve_url("", "?only=query"), None);
    }
}

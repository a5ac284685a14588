pub mod dom;
pub mod extract;

use rayon::prelude::*;

use crate::record::RawBag;

/// A search page body together with the URL it came from.
pub struct FetchedPage {
    pub url: String,
    pub html: String,
}

/// Extract job cards from every page in parallel. Output keeps page order,
/// then card order within each page.
pub fn extract_pages(pages: &[FetchedPage]) -> Vec<RawBag> {
    pages
        .par_iter()
        .map(|page| extract::jobs::extract(&page.html, &page.url))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

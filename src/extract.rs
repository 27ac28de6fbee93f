use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::{BookRecord, Error, Result, ENTRIES_PER_PAGE, UNRATED};

const RATING_CLASS: &str = "star-rating";

struct Selectors {
    entry: Selector,
    link: Selector,
    price: Selector,
    availability: Selector,
    rating: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        Ok(Self {
            entry: create_selector("article.product_pod")?,
            link: create_selector("h3 a")?,
            price: create_selector(".price_color")?,
            availability: create_selector(".instock.availability")?,
            rating: create_selector("p.star-rating")?,
        })
    }
}

/// Extracts every product entry of a catalogue page.
/// Links are resolved against `page_url`, so every record carries an absolute URL.
///
/// An entry without a title link, price or availability fails the whole page.
pub fn extract_books(html: &str, page_url: &Url) -> Result<Vec<BookRecord>> {
    let doc = Html::parse_document(html);
    let sel = Selectors::new()?;

    let mut books = Vec::with_capacity(ENTRIES_PER_PAGE);
    for entry in doc.select(&sel.entry) {
        let link = entry
            .select(&sel.link)
            .next()
            .ok_or(Error::MissingField { field: "title" })?;
        let title = link
            .value()
            .attr("title")
            .ok_or(Error::MissingField { field: "title" })?;
        let href = link
            .value()
            .attr("href")
            .ok_or(Error::MissingField { field: "url" })?;

        books.push(BookRecord {
            title: title.to_string(),
            url: resolve_url(page_url, href)?.into(),
            price: select_text(&entry, &sel.price).ok_or(Error::MissingField { field: "price" })?,
            availability: select_text(&entry, &sel.availability)
                .ok_or(Error::MissingField { field: "availability" })?,
            rating: rating(&entry, &sel.rating),
        });
    }
    Ok(books)
}

/// Resolves `href` against the page it was found on. Absolute hrefs come back as they are.
pub fn resolve_url(page_url: &Url, href: &str) -> Result<Url> {
    Ok(page_url.join(href.trim())?)
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::InvalidSelector(sel_str.into()))
}

fn select_text(entry: &ElementRef, selector: &Selector) -> Option<String> {
    entry
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

/// The star marker is the class next to `star-rating`, e.g. `star-rating Three`.
fn rating(entry: &ElementRef, selector: &Selector) -> String {
    entry
        .select(selector)
        .next()
        .and_then(|el| el.value().attr("class"))
        .and_then(|classes| classes.split_whitespace().find(|c| *c != RATING_CLASS))
        .unwrap_or(UNRATED)
        .to_string()
}

//! Field extraction from parsed documents
//!
//! Each entity type is read by an ordered list of [`Section`] parsers. Every
//! section runs regardless of how the others fared: a section that cannot
//! find or interpret its part of the page records a warning on the entity,
//! leaves its fields at their defaults and returns `false`. If any section
//! failed, one summary warning is added at the end.
//!
//! An [`ExtractError`] is reserved for problems that make the whole document
//! unreadable and turns the item into a hard failure.

pub mod hop;
pub mod yeast;

pub use hop::HopTarget;
pub use yeast::YeastTarget;

use crate::error::ExtractError;
use crate::model::{NumericRange, ScrapedEntity};
use scraper::{ElementRef, Html, Selector};
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;
use url::Url;

/// Signature shared by every section parser
pub type SectionFn<E> = fn(&Html, &mut E) -> Result<bool, ExtractError>;

/// One named, independent part of a page
pub struct Section<E> {
    pub name: &'static str,
    pub parse: SectionFn<E>,
}

impl<E> std::fmt::Debug for Section<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Section").field("name", &self.name).finish()
    }
}

/// Run every section over `doc`, appending a summary warning if any failed.
///
/// A section returning an error counts as failed and its error becomes a
/// warning; the remaining sections still run.
pub fn run_sections<E: ScrapedEntity>(doc: &Html, entity: &mut E, sections: &[Section<E>], kind: &str) {
    let mut failed = Vec::new();
    for section in sections {
        match (section.parse)(doc, entity) {
            Ok(true) => {}
            Ok(false) => failed.push(section.name),
            Err(e) => {
                entity.add_warning(format!("Could not read {} section: {e}", section.name));
                failed.push(section.name);
            }
        }
    }

    if !failed.is_empty() {
        debug!(link = %entity.link(), sections = ?failed, "Incomplete extraction");
        entity.add_warning(format!("Some sections of this {kind} failed to be read"));
    }
}

/// Parse `body` and run `sections`, converting a panic into an error.
///
/// Whatever the sections wrote before a panic stays on `entity`.
pub fn extract_document<E: ScrapedEntity>(
    body: &str,
    entity: &mut E,
    sections: &[Section<E>],
    kind: &str,
) -> Result<(), ExtractError> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        let doc = Html::parse_document(body);
        run_sections(&doc, entity, sections, kind);
    }))
    .map_err(|payload| ExtractError::Panicked(panic_message(payload.as_ref())))
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// ============================================================================
// DOM helpers
// ============================================================================

pub(crate) fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        css: css.to_string(),
        message: format!("{e:?}"),
    })
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-normalized text content of an element
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// First `h2` whose text contains `needle`
pub(crate) fn find_heading<'a>(doc: &'a Html, needle: &str) -> Result<Option<ElementRef<'a>>, ExtractError> {
    let h2 = selector("h2")?;
    Ok(doc.select(&h2).find(|heading| text_of(*heading).contains(needle)))
}

/// Element siblings following `element`
pub(crate) fn following<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.next_siblings().filter_map(ElementRef::wrap)
}

/// Elements after a heading, up to the next `h2`
pub(crate) fn section_body<'a>(heading: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    following(heading).take_while(|element| element.value().name() != "h2")
}

/// Next sibling element named `tag`
pub(crate) fn next_named<'a>(element: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    following(element).find(|sibling| sibling.value().name() == tag)
}

/// `(label, value cell)` pairs for every row under `scope_css` having both a
/// `th` and a `td`
pub(crate) fn labelled_rows<'a>(
    doc: &'a Html,
    scope_css: &str,
) -> Result<Vec<(String, ElementRef<'a>)>, ExtractError> {
    let rows = selector(&format!("{scope_css} tr"))?;
    let th = selector("th")?;
    let td = selector("td")?;

    Ok(doc
        .select(&rows)
        .filter_map(|row| {
            let label = row.select(&th).next()?;
            let cell = row.select(&td).next()?;
            Some((text_of(label), cell))
        })
        .collect())
}

/// Value of a brewing-values cell: the highlighted figure when present,
/// otherwise the whole cell
pub(crate) fn cell_value(cell: ElementRef<'_>) -> Result<String, ExtractError> {
    let highlighted = selector("small.text-muted.bold")?;
    Ok(cell
        .select(&highlighted)
        .next()
        .map(text_of)
        .unwrap_or_else(|| text_of(cell)))
}

/// Absolute `href` of every link in the first `ul` after `heading`.
///
/// A link that cannot be resolved against `base` is skipped with a warning
/// naming `field`.
pub(crate) fn list_links<E: ScrapedEntity>(
    heading: ElementRef<'_>,
    base: &Url,
    entity: &mut E,
    field: &str,
) -> Result<Vec<String>, ExtractError> {
    let anchor = selector("li a[href]")?;
    let Some(list) = next_named(heading, "ul") else {
        return Ok(Vec::new());
    };

    let mut links = Vec::new();
    for href in list.select(&anchor).filter_map(|a| a.value().attr("href")) {
        let href = href.trim();
        match base.join(href) {
            Ok(url) => links.push(url.to_string()),
            Err(e) => entity.add_warning(format!("{field}: skipped link '{href}' ({e})")),
        }
    }
    Ok(links)
}

/// Split `"A, B, C & D"` into its items
pub(crate) fn split_style_list(text: &str) -> Vec<String> {
    let mut items: Vec<&str> = text.split(',').collect();
    let last = items.pop().unwrap_or_default();
    items.extend(last.split('&'));

    items
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Last non-empty path segment of `link`
pub(crate) fn slug_of(link: &str) -> &str {
    link.trim_end_matches('/').rsplit('/').next().unwrap_or(link)
}

/// Read a range field. On failure the warning is recorded and `None` is
/// returned so the caller keeps the field's default.
pub(crate) fn read_range<E: ScrapedEntity>(
    entity: &mut E,
    field: &str,
    text: &str,
    unit: &str,
) -> Option<NumericRange> {
    match NumericRange::parse(text, unit) {
        Ok(range) => {
            if range.is_inverted() {
                entity.add_warning(format!("{field}: inverted range {} > {}", range.min, range.max));
            }
            Some(range)
        }
        Err(e) => {
            entity.add_warning(format!("{field}: cannot read '{}' ({e})", text.trim()));
            None
        }
    }
}

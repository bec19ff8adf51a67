//! Yeast page extraction

use super::{
    cell_value, collapse_whitespace, find_heading, labelled_rows, list_links, next_named, read_range, selector,
    slug_of, split_style_list, text_of, Section,
};
use crate::error::{ExtractError, FetchError};
use crate::http::Page;
use crate::model::{ScrapedEntity, Yeast};
use crate::scrape::{FollowUp, ScrapeTarget};
use scraper::Html;
use tracing::debug;
use url::Url;

const YEAST_SECTIONS: &[Section<Yeast>] = &[
    Section { name: "name", parse: parse_name },
    Section { name: "basics", parse: parse_basics },
    Section { name: "description", parse: parse_description },
    Section { name: "brewing values", parse: parse_brew_values },
    Section { name: "beer styles", parse: parse_beer_styles },
    Section { name: "comparable yeasts", parse: parse_comparable_yeasts },
];

/// Yeast listing page, which upstream uses as the canonical link of
/// retired yeast pages
const LISTING_PATH: &str = "/yeasts/";

/// Scrapes yeast pages, then follows every comparable yeast link once to
/// replace redirected links with their final location
#[derive(Debug, Clone, Copy, Default)]
pub struct YeastTarget;

impl YeastTarget {
    pub fn new() -> Self {
        Self
    }
}

impl ScrapeTarget for YeastTarget {
    type Entity = Yeast;

    fn kind(&self) -> &'static str {
        "yeast"
    }

    fn collection(&self) -> &'static str {
        "yeasts"
    }

    fn sections(&self) -> &[Section<Yeast>] {
        YEAST_SECTIONS
    }

    fn follow_ups(&self, yeast: &Yeast) -> Vec<FollowUp> {
        yeast
            .comparable_yeasts
            .iter()
            .enumerate()
            .map(|(slot, url)| FollowUp {
                slot,
                url: url.clone(),
                follow_redirects: false,
            })
            .collect()
    }

    fn apply_follow_up(&self, yeast: &mut Yeast, follow_up: &FollowUp, outcome: Result<Page, FetchError>) {
        let resolved = match &outcome {
            Ok(page) if page.is_redirect() => page
                .location
                .as_deref()
                .and_then(|location| join(&follow_up.url, location)),
            Ok(page) if page.status == 200 => {
                let canonical = canonical_link(&page.body).unwrap_or_else(|| follow_up.url.clone());
                let listing = join(&follow_up.url, LISTING_PATH);
                (listing.as_deref() != Some(canonical.as_str())).then_some(canonical)
            }
            _ => None,
        };

        match resolved {
            Some(url) => {
                if let Some(slot) = yeast.comparable_yeasts.get_mut(follow_up.slot) {
                    if *slot != url {
                        debug!(from = %slot, to = %url, "Comparable yeast relocated");
                    }
                    *slot = url;
                }
            }
            None => {
                let reason = match outcome {
                    Ok(page) => format!("HTTP {}", page.status),
                    Err(e) => e.to_string(),
                };
                yeast.add_warning(format!("Broken link in comparable yeasts: {} ({reason})", follow_up.url));
            }
        }
    }
}

fn join(base: &str, href: &str) -> Option<String> {
    Url::parse(base).and_then(|url| url.join(href)).ok().map(String::from)
}

fn canonical_link(body: &str) -> Option<String> {
    let doc = Html::parse_document(body);
    let canonical = selector(r#"link[rel="canonical"]"#).ok()?;
    let link = doc
        .select(&canonical)
        .next()
        .and_then(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string());
    link
}

// ============================================================================
// Sections
// ============================================================================

fn parse_name(doc: &Html, yeast: &mut Yeast) -> Result<bool, ExtractError> {
    let title = selector("h1.entry-title")?;
    match doc.select(&title).next() {
        Some(h1) => {
            yeast.name = text_of(h1);
            Ok(true)
        }
        None => {
            yeast.add_warning(format!("Could not retrieve yeast name for link {}", yeast.link));
            yeast.name = slug_of(&yeast.link).to_string();
            Ok(false)
        }
    }
}

fn parse_basics(doc: &Html, yeast: &mut Yeast) -> Result<bool, ExtractError> {
    let mut found = false;

    for (label, cell) in labelled_rows(doc, "table")? {
        let value = text_of(cell);
        match label.as_str() {
            "Brand:" => yeast.brand = value,
            "Type:" => yeast.yeast_type = value,
            "Packet:" => yeast.packaging = value,
            "Species:" => yeast.species = value,
            "Contains Bacteria?" => match value.to_ascii_lowercase().as_str() {
                "yes" => yeast.has_bacteria = Some(true),
                "no" => yeast.has_bacteria = Some(false),
                _ => yeast.add_warning(format!("Unexpected bacteria flag '{value}'")),
            },
            _ => continue,
        }
        found = true;
    }

    if !found {
        yeast.add_warning("Could not find yeast basics table".to_string());
    }
    Ok(found)
}

fn parse_description(doc: &Html, yeast: &mut Yeast) -> Result<bool, ExtractError> {
    let description = find_heading(doc, "Description")?.and_then(|heading| next_named(heading, "p"));
    let Some(description) = description else {
        yeast.add_warning("Could not find Description header".to_string());
        return Ok(false);
    };
    yeast.description = text_of(description);

    let mut tags_paragraph = next_named(description, "p");
    if let Some(paragraph) = tags_paragraph {
        if paragraph.value().classes().any(|class| class == "readmore") {
            tags_paragraph = next_named(paragraph, "p");
        }
    }

    let strong = selector("strong")?;
    let Some(tags) = tags_paragraph.and_then(|paragraph| paragraph.select(&strong).next()) else {
        yeast.add_warning(format!("No tags found for yeast {}", yeast.name));
        return Ok(false);
    };

    let raw = tags.text().collect::<String>().replace(['#', '\u{a0}'], " ");
    yeast.tags = collapse_whitespace(&raw).split(' ').filter(|t| !t.is_empty()).map(str::to_string).collect();
    Ok(true)
}

fn parse_brew_values(doc: &Html, yeast: &mut Yeast) -> Result<bool, ExtractError> {
    let rows = labelled_rows(doc, "table.brewvalues")?;
    if rows.is_empty() {
        yeast.add_warning("Could not parse brewing values".to_string());
        return Ok(false);
    }

    for (label, cell) in rows {
        let value = cell_value(cell)?;

        if label.contains("Alcohol Tolerance") {
            read_alcohol_tolerance(yeast, &value);
        } else if label.contains("Attenuation") {
            if value.trim_end_matches('%').trim() == "Unknown" {
                yeast.add_warning("No available values for attenuation".to_string());
            } else if let Some(range) = read_range(yeast, "Attenuation", &value, "%") {
                yeast.attenuation = range;
            }
        } else if label.contains("Flocculation") {
            yeast.flocculation = value;
        } else if label.contains("Optimal Temperature") {
            if let Some(range) = read_range(yeast, "Optimal temperature", &value, "° F") {
                yeast.optimal_temperature = range.map(|f| fahrenheit_to_celsius(f).round());
            }
        }
    }
    Ok(true)
}

fn read_alcohol_tolerance(yeast: &mut Yeast, value: &str) {
    let value = value.trim_end_matches('%').trim();
    if value == "Unknown" {
        yeast.add_warning("No available values for alcohol tolerance".to_string());
        return;
    }

    if value.contains('-') {
        yeast.add_warning(format!("Alcohol tolerance given as a range '{value}', keeping the upper bound"));
        if let Some(range) = read_range(yeast, "Alcohol tolerance", value, "") {
            yeast.alcohol_tolerance = Some(range.max);
        }
        return;
    }

    match value.parse::<f64>() {
        Ok(tolerance) => yeast.alcohol_tolerance = Some(tolerance),
        Err(_) => yeast.add_warning(format!("Alcohol tolerance: cannot read '{value}'")),
    }
}

fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

fn parse_beer_styles(doc: &Html, yeast: &mut Yeast) -> Result<bool, ExtractError> {
    // The first paragraph is an introduction, the list follows it
    let styles = find_heading(doc, "Common Beer Styles")?
        .and_then(|heading| next_named(heading, "p"))
        .and_then(|intro| next_named(intro, "p"));
    let Some(styles) = styles else {
        yeast.add_warning("Could not find Common Beer Styles header".to_string());
        return Ok(false);
    };

    yeast.common_beer_styles = split_style_list(&text_of(styles));
    Ok(true)
}

fn parse_comparable_yeasts(doc: &Html, yeast: &mut Yeast) -> Result<bool, ExtractError> {
    let Some(heading) = find_heading(doc, "Comparable Beer Yeast")? else {
        yeast.add_warning("Could not find Comparable Beer Yeast header".to_string());
        return Ok(false);
    };

    let base = Url::parse(&yeast.link)?;
    let links = list_links(heading, &base, yeast, "Comparable yeasts")?;
    yeast.comparable_yeasts = links;
    Ok(true)
}

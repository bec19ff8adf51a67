//! Hop page extraction

use super::{
    cell_value, find_heading, labelled_rows, list_links, next_named, read_range, section_body, selector,
    slug_of, split_style_list, text_of, Section,
};
use crate::config::{ScraperConfig, SLUG_PLACEHOLDER};
use crate::error::{ExtractError, FetchError};
use crate::http::Page;
use crate::model::{Hop, HopPurpose, NumericRange, RatioRange, ScrapedEntity};
use crate::scrape::{FollowUp, ScrapeTarget};
use scraper::Html;
use serde::Deserialize;
use url::Url;

const HOP_SECTIONS: &[Section<Hop>] = &[
    Section { name: "name", parse: parse_name },
    Section { name: "basics", parse: parse_basics },
    Section { name: "origin", parse: parse_origin },
    Section { name: "flavor", parse: parse_flavor_and_aroma },
    Section { name: "brewing values", parse: parse_brew_values },
    Section { name: "beer styles", parse: parse_beer_styles },
    Section { name: "substitutes", parse: parse_substitutes },
];

/// Scrapes hop pages, then looks up each hop's aroma radar chart
#[derive(Debug, Clone)]
pub struct HopTarget {
    api_template: String,
}

impl HopTarget {
    pub fn new(config: &ScraperConfig) -> Self {
        Self::with_api_template(&config.hop_api_url)
    }

    pub fn with_api_template(template: &str) -> Self {
        Self {
            api_template: template.to_string(),
        }
    }

    pub fn api_url(&self, link: &str) -> String {
        self.api_template.replace(SLUG_PLACEHOLDER, slug_of(link))
    }
}

impl ScrapeTarget for HopTarget {
    type Entity = Hop;

    fn kind(&self) -> &'static str {
        "hop"
    }

    fn collection(&self) -> &'static str {
        "hops"
    }

    fn sections(&self) -> &[Section<Hop>] {
        HOP_SECTIONS
    }

    fn follow_ups(&self, hop: &Hop) -> Vec<FollowUp> {
        vec![FollowUp {
            slot: 0,
            url: self.api_url(&hop.link),
            follow_redirects: true,
        }]
    }

    fn apply_follow_up(&self, hop: &mut Hop, follow_up: &FollowUp, outcome: Result<Page, FetchError>) {
        let page = match outcome {
            Ok(page) if page.is_success() => page,
            Ok(page) => {
                hop.add_warning(format!("Aroma profile unavailable: HTTP {} from {}", page.status, follow_up.url));
                return;
            }
            Err(e) => {
                hop.add_warning(format!("Aroma profile unavailable: {e}"));
                return;
            }
        };

        match serde_json::from_str::<ProfilePayload>(&page.body) {
            Ok(payload) if payload.primary.has_profile() => hop.aroma_profile = Some(payload.primary.radar_chart),
            Ok(_) => hop.add_warning("Aroma profile unavailable: empty radar chart".to_string()),
            Err(e) => hop.add_warning(format!("Aroma profile unavailable: malformed payload ({e})")),
        }
    }
}

/// Relevant part of the hop profile API response
#[derive(Debug, Deserialize)]
struct ProfilePayload {
    primary: PrimaryProfile,
}

#[derive(Debug, Deserialize)]
struct PrimaryProfile {
    #[serde(default)]
    radar_chart: Vec<f64>,
}

impl PrimaryProfile {
    fn has_profile(&self) -> bool {
        self.radar_chart.iter().any(|value| *value != 0.0)
    }
}

// ============================================================================
// Sections
// ============================================================================

fn parse_name(doc: &Html, hop: &mut Hop) -> Result<bool, ExtractError> {
    let title = selector("h1.entry-title")?;
    match doc.select(&title).next() {
        Some(h1) => {
            let text = text_of(h1);
            hop.name = text.strip_suffix(" Hops").unwrap_or(&text).to_string();
            Ok(true)
        }
        None => {
            hop.add_warning(format!("Could not retrieve hop name for link {}", hop.link));
            hop.name = slug_of(&hop.link).to_string();
            Ok(false)
        }
    }
}

fn parse_basics(doc: &Html, hop: &mut Hop) -> Result<bool, ExtractError> {
    let anchor = selector("a")?;
    let mut found = false;

    for (label, cell) in labelled_rows(doc, "table")? {
        match label.as_str() {
            "Purpose:" => {
                let text = cell.select(&anchor).next().map(text_of).unwrap_or_else(|| text_of(cell));
                hop.purpose = HopPurpose::from_label(&text);
            }
            "Country:" => hop.country = text_of(cell),
            "International Code:" => hop.international_code = text_of(cell),
            "Cultivar/Brand ID:" => hop.cultivar_id = text_of(cell),
            _ => continue,
        }
        found = true;
    }

    if !found {
        hop.add_warning("Could not find hop basics table".to_string());
    }
    Ok(found)
}

fn parse_origin(doc: &Html, hop: &mut Hop) -> Result<bool, ExtractError> {
    let Some(heading) = find_heading(doc, "Origin")? else {
        hop.add_warning("Could not find Origin header".to_string());
        return Ok(false);
    };

    let parts: Vec<String> = section_body(heading)
        .filter(|element| element.value().name() != "span")
        .map(text_of)
        .filter(|text| !text.is_empty())
        .collect();
    hop.origin_text = parts.join(" ");
    Ok(true)
}

fn parse_flavor_and_aroma(doc: &Html, hop: &mut Hop) -> Result<bool, ExtractError> {
    let Some(heading) = find_heading(doc, "Flavor & Aroma")? else {
        hop.add_warning("Could not find Flavor & Aroma header".to_string());
        return Ok(false);
    };

    let mut parts = Vec::new();
    let mut tags_block = None;
    for element in section_body(heading) {
        let text = text_of(element);
        if text.contains("Tags:") {
            tags_block = Some(element);
            break;
        }
        if !text.is_empty() {
            parts.push(text);
        }
    }
    hop.flavor_text = parts.join(" ");

    let Some(block) = tags_block else {
        hop.add_warning(format!("No tags found for hop {}", hop.name));
        return Ok(false);
    };

    let tag = selector("em a.text-muted")?;
    hop.tags = block
        .select(&tag)
        .map(|a| text_of(a).trim_start_matches('#').to_string())
        .filter(|tag| !tag.is_empty())
        .collect();
    Ok(true)
}

type RangeField = fn(&mut Hop) -> &mut NumericRange;

/// Range rows of the brewing values table: label fragment, field name, unit
fn range_row(label: &str) -> Option<(&'static str, &'static str, RangeField)> {
    let row: (&'static str, &'static str, RangeField) = if label.contains("Alpha Acid") {
        ("Alpha acids", "%", |hop| &mut hop.alpha_acids)
    } else if label.contains("Beta Acid") {
        ("Beta acids", "%", |hop| &mut hop.beta_acids)
    } else if label.contains("Co-Humulone") {
        ("Co-humulone", "%", |hop| &mut hop.co_humulone_normalized)
    } else if label.contains("Total Oil") {
        ("Total oils", "mL", |hop| &mut hop.total_oils)
    } else if label.contains("Myrcene") {
        ("Myrcene", "%", |hop| &mut hop.myrcene)
    } else if label.contains("Humulene") {
        ("Humulene", "%", |hop| &mut hop.humulene)
    } else if label.contains("Caryophyllene") {
        ("Caryophyllene", "%", |hop| &mut hop.caryophyllene)
    } else if label.contains("Farnesene") {
        ("Farnesene", "%", |hop| &mut hop.farnesene)
    } else if label.contains("Other") {
        ("Other oils", "%", |hop| &mut hop.other_oils)
    } else {
        return None;
    };
    Some(row)
}

fn parse_brew_values(doc: &Html, hop: &mut Hop) -> Result<bool, ExtractError> {
    let rows = labelled_rows(doc, "table.brewvalues")?;
    if rows.is_empty() {
        hop.add_warning("Could not find brewing values table".to_string());
        return Ok(false);
    }

    for (label, cell) in rows {
        let value = cell_value(cell)?;

        if label.contains("Ratio") {
            match RatioRange::parse(&value) {
                Ok(ratio) => hop.alpha_beta_ratio = ratio,
                Err(e) => hop.add_warning(format!("Alpha-beta ratio: cannot read '{value}' ({e})")),
            }
        } else if label.contains("Storage Index") {
            match value.trim_end_matches('%').trim().parse::<f64>() {
                Ok(index) => hop.hop_storage_index = Some(index),
                Err(_) => hop.add_warning(format!("Hop storage index: cannot read '{value}'")),
            }
        } else if let Some((field, unit, slot)) = range_row(&label) {
            let text = value.replace("/100g", "");
            if let Some(range) = read_range(hop, field, &text, unit) {
                *slot(hop) = range;
            }
        }
    }
    Ok(true)
}

fn parse_beer_styles(doc: &Html, hop: &mut Hop) -> Result<bool, ExtractError> {
    let paragraph = find_heading(doc, "Beer Styles")?.and_then(|heading| next_named(heading, "p"));
    let Some(paragraph) = paragraph else {
        hop.add_warning("Could not find Beer Styles header".to_string());
        return Ok(false);
    };

    hop.beer_styles = split_style_list(&text_of(paragraph));
    Ok(true)
}

fn parse_substitutes(doc: &Html, hop: &mut Hop) -> Result<bool, ExtractError> {
    let Some(heading) = find_heading(doc, "Substitutes")? else {
        hop.add_warning("Could not find Substitutes header".to_string());
        return Ok(false);
    };

    let base = Url::parse(&hop.link)?;
    let links = list_links(heading, &base, hop, "Substitutes")?;
    hop.substitutes = links;
    Ok(true)
}

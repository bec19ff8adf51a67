//! Seed link retrieval from the site map

use crate::error::{Result, ScrapeError};
use crate::http::Fetcher;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::info;

/// Every `<loc>` value of a sitemap document, in document order
pub fn parse_sitemap(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut links = Vec::new();
    let mut in_loc = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) if element.local_name().as_ref() == b"loc" => in_loc = true,
            Ok(Event::End(element)) if element.local_name().as_ref() == b"loc" => in_loc = false,
            Ok(Event::Text(text)) if in_loc => {
                let value = text
                    .unescape()
                    .map_err(|e| ScrapeError::sitemap(format!("bad <loc> text: {e}")))?;
                links.push(value.trim().to_string());
            }
            Ok(Event::CData(data)) if in_loc => {
                links.push(String::from_utf8_lossy(&data).trim().to_string());
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ScrapeError::sitemap(format!(
                    "malformed sitemap at byte {}: {e}",
                    reader.error_position()
                )))
            }
        }
    }
    Ok(links)
}

/// Download and parse the site map at `url`
pub fn fetch_sitemap(fetcher: &dyn Fetcher, url: &str) -> Result<Vec<String>> {
    let page = fetcher.get(url)?;
    if !page.is_success() {
        return Err(ScrapeError::sitemap(format!("HTTP {} fetching {url}", page.status)));
    }
    let links = parse_sitemap(&page.body)?;
    info!(url = %url, count = links.len(), "Retrieved sitemap");
    Ok(links)
}

/// Seed links grouped by the kind of page they point at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizedLinks {
    pub hops: Vec<String>,
    pub yeasts: Vec<String>,
    pub fermentables: Vec<String>,
    pub water: Vec<String>,
    pub beer_styles: Vec<String>,
}

impl CategorizedLinks {
    pub fn from_links(links: &[String]) -> Self {
        let mut categorized = Self::default();
        for link in links {
            let bucket = if link.contains("/hop/") {
                &mut categorized.hops
            } else if link.contains("/yeast/") {
                &mut categorized.yeasts
            } else if link.contains("/fermentable/") {
                &mut categorized.fermentables
            } else if link.contains("/water/") {
                &mut categorized.water
            } else if link.contains("/beer-style/") {
                &mut categorized.beer_styles
            } else {
                continue;
            };
            bucket.push(link.clone());
        }
        categorized
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SITEMAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://beermaverick.com/hop/citra/</loc><lastmod>2023-01-01</lastmod></url>
  <url><loc> https://beermaverick.com/yeast/wlp001/ </loc></url>
  <url><loc>https://beermaverick.com/beer-style/american-ipa/?a=1&amp;b=2</loc></url>
  <url><loc>https://beermaverick.com/about/</loc></url>
</urlset>"#;

    #[test]
    fn test_parse_sitemap() {
        let links = parse_sitemap(SITEMAP).unwrap();
        assert_eq!(
            links,
            [
                "https://beermaverick.com/hop/citra/",
                "https://beermaverick.com/yeast/wlp001/",
                "https://beermaverick.com/beer-style/american-ipa/?a=1&b=2",
                "https://beermaverick.com/about/",
            ]
        );
    }

    #[test]
    fn test_malformed_sitemap() {
        assert!(matches!(
            parse_sitemap("<urlset><url><loc>x</url></urlset>"),
            Err(ScrapeError::Sitemap(_))
        ));
    }

    #[test]
    fn test_categorize() {
        let links = parse_sitemap(SITEMAP).unwrap();
        let categorized = CategorizedLinks::from_links(&links);
        assert_eq!(categorized.hops, ["https://beermaverick.com/hop/citra/"]);
        assert_eq!(categorized.yeasts, ["https://beermaverick.com/yeast/wlp001/"]);
        assert_eq!(categorized.beer_styles.len(), 1);
        assert!(categorized.fermentables.is_empty());
    }
}

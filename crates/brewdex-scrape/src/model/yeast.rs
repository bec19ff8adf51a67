use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::range::NumericRange;
use super::{drop_warning, push_warning, ScrapedEntity};

/// A yeast strain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Yeast {
    pub id: Uuid,
    pub name: String,
    pub link: String,
    #[serde(default)]
    pub brand: String,
    #[serde(rename = "type", default)]
    pub yeast_type: String,
    #[serde(default)]
    pub packaging: String,
    #[serde(default)]
    pub has_bacteria: Option<bool>,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Upper alcohol tolerance in percent ABV
    #[serde(default)]
    pub alcohol_tolerance: Option<f64>,
    #[serde(default)]
    pub attenuation: NumericRange,
    #[serde(default)]
    pub flocculation: String,
    /// Degrees Celsius
    #[serde(default)]
    pub optimal_temperature: NumericRange,
    #[serde(default)]
    pub comparable_yeasts: Vec<String>,
    #[serde(default)]
    pub common_beer_styles: Vec<String>,
    #[serde(default)]
    pub parsing_errors: Option<Vec<String>>,
}

impl ScrapedEntity for Yeast {
    fn from_link(link: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            link: link.to_string(),
            brand: String::new(),
            yeast_type: String::new(),
            packaging: String::new(),
            has_bacteria: None,
            species: String::new(),
            description: String::new(),
            tags: Vec::new(),
            alcohol_tolerance: None,
            attenuation: NumericRange::default(),
            flocculation: String::new(),
            optimal_temperature: NumericRange::default(),
            comparable_yeasts: Vec::new(),
            common_beer_styles: Vec::new(),
            parsing_errors: None,
        }
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn restore_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn link(&self) -> &str {
        &self.link
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn warnings(&self) -> &[String] {
        self.parsing_errors.as_deref().unwrap_or(&[])
    }

    fn add_warning(&mut self, message: String) {
        push_warning(&mut self.parsing_errors, message);
    }

    fn remove_warning(&mut self, message: &str) {
        drop_warning(&mut self.parsing_errors, message);
    }

    fn cross_references(&self) -> &[String] {
        &self.comparable_yeasts
    }

    fn cross_references_mut(&mut self) -> &mut Vec<String> {
        &mut self.comparable_yeasts
    }
}

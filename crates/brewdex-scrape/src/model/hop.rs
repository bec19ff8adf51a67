use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::range::{NumericRange, RatioRange};
use super::{drop_warning, push_warning, ScrapedEntity};

/// Primary brewing use of a hop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HopPurpose {
    #[default]
    Bittering,
    Aromatic,
    Hybrid,
}

impl HopPurpose {
    /// Map the page label onto a purpose. "Dual Purpose" and anything
    /// unrecognised is treated as hybrid.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_ascii_lowercase();
        if label.starts_with("bittering") {
            Self::Bittering
        } else if label.starts_with("aroma") {
            Self::Aromatic
        } else {
            Self::Hybrid
        }
    }
}

/// A hop variety
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hop {
    pub id: Uuid,
    pub name: String,
    pub link: String,
    #[serde(default)]
    pub purpose: HopPurpose,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub international_code: String,
    #[serde(default)]
    pub cultivar_id: String,
    #[serde(default)]
    pub origin_text: String,
    #[serde(default)]
    pub flavor_text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub alpha_acids: NumericRange,
    #[serde(default)]
    pub beta_acids: NumericRange,
    #[serde(default)]
    pub alpha_beta_ratio: RatioRange,
    #[serde(default)]
    pub hop_storage_index: Option<f64>,
    #[serde(default)]
    pub co_humulone_normalized: NumericRange,
    #[serde(default)]
    pub total_oils: NumericRange,
    #[serde(default)]
    pub myrcene: NumericRange,
    #[serde(default)]
    pub humulene: NumericRange,
    #[serde(default)]
    pub caryophyllene: NumericRange,
    #[serde(default)]
    pub farnesene: NumericRange,
    #[serde(default)]
    pub other_oils: NumericRange,
    #[serde(default)]
    pub beer_styles: Vec<String>,
    #[serde(default)]
    pub substitutes: Vec<String>,
    #[serde(default)]
    pub aroma_profile: Option<Vec<f64>>,
    #[serde(default)]
    pub parsing_errors: Option<Vec<String>>,
}

impl ScrapedEntity for Hop {
    fn from_link(link: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            link: link.to_string(),
            purpose: HopPurpose::default(),
            country: String::new(),
            international_code: String::new(),
            cultivar_id: String::new(),
            origin_text: String::new(),
            flavor_text: String::new(),
            tags: Vec::new(),
            alpha_acids: NumericRange::default(),
            beta_acids: NumericRange::default(),
            alpha_beta_ratio: RatioRange::default(),
            hop_storage_index: None,
            co_humulone_normalized: NumericRange::default(),
            total_oils: NumericRange::default(),
            myrcene: NumericRange::default(),
            humulene: NumericRange::default(),
            caryophyllene: NumericRange::default(),
            farnesene: NumericRange::default(),
            other_oils: NumericRange::default(),
            beer_styles: Vec::new(),
            substitutes: Vec::new(),
            aroma_profile: None,
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
        &self.substitutes
    }

    fn cross_references_mut(&mut self) -> &mut Vec<String> {
        &mut self.substitutes
    }
}

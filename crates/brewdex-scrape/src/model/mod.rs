//! Entity data model
//!
//! Every scraped record carries a stable internal id, its source link (the
//! cache key), typed attributes and an optional list of parsing warnings.
//! Entities serialize with camelCase keys and a trailing `parsingErrors`
//! array.

pub mod hop;
pub mod range;
pub mod yeast;

pub use hop::{Hop, HopPurpose};
pub use range::{NumericRange, Range, RangeParseError, RatioRange};
pub use yeast::Yeast;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// Behaviour shared by every scraped record type
pub trait ScrapedEntity: Serialize + DeserializeOwned + Clone + Send + 'static {
    /// Fresh entity for `link` with a newly generated id and default fields
    fn from_link(link: &str) -> Self;

    fn id(&self) -> Uuid;

    /// Re-use the id of a previously persisted record for the same link
    fn restore_id(&mut self, id: Uuid);

    fn link(&self) -> &str;

    fn name(&self) -> &str;

    fn warnings(&self) -> &[String];

    fn add_warning(&mut self, message: String);

    /// Drop every warning equal to `message`
    fn remove_warning(&mut self, message: &str);

    /// Links to sibling entities, rewritten to ids after a run
    fn cross_references(&self) -> &[String];

    fn cross_references_mut(&mut self) -> &mut Vec<String>;

    fn has_warnings(&self) -> bool {
        !self.warnings().is_empty()
    }
}

pub(crate) fn push_warning(warnings: &mut Option<Vec<String>>, message: String) {
    warnings.get_or_insert_with(Vec::new).push(message);
}

/// Remove `message`, resetting to `None` once no warning is left
pub(crate) fn drop_warning(warnings: &mut Option<Vec<String>>, message: &str) {
    if let Some(list) = warnings {
        list.retain(|warning| warning != message);
        if list.is_empty() {
            *warnings = None;
        }
    }
}

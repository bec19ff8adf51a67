//! Cross-reference resolution
//!
//! Runs once over a complete collection. Every cross-reference that matches
//! the link of an entity in the set is replaced by that entity's id.
//! References that match nothing stay as they are and are reported.

use crate::model::ScrapedEntity;
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

/// What a resolution pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    /// References rewritten to ids in this pass
    pub resolved: usize,
    /// References that already were ids of entities in the set
    pub already_resolved: usize,
    /// `(referencing link, raw reference)` pairs with no match
    pub dangling: Vec<(String, String)>,
}

fn normalize(link: &str) -> &str {
    link.trim_end_matches('/')
}

fn unresolved_warning(reference: &str) -> String {
    format!("Unresolved cross-reference: {reference}")
}

/// Rewrite cross-references of `entities` in place.
///
/// Re-running on an already resolved set changes nothing, and a dangling
/// reference is only warned about on the entity once. The warning goes
/// away in the pass that finally resolves the reference.
pub fn resolve_cross_references<E: ScrapedEntity>(entities: &mut [E]) -> ResolutionReport {
    let by_link: HashMap<String, Uuid> = entities
        .iter()
        .map(|entity| (normalize(entity.link()).to_string(), entity.id()))
        .collect();
    let ids: std::collections::HashSet<Uuid> = by_link.values().copied().collect();

    let mut report = ResolutionReport::default();
    for entity in entities.iter_mut() {
        let mut dangling = Vec::new();
        let mut resolved = Vec::new();

        for reference in entity.cross_references_mut().iter_mut() {
            if Uuid::parse_str(reference).is_ok_and(|id| ids.contains(&id)) {
                report.already_resolved += 1;
                continue;
            }
            match by_link.get(normalize(reference)) {
                Some(id) => {
                    resolved.push(std::mem::replace(reference, id.to_string()));
                    report.resolved += 1;
                }
                None => dangling.push(reference.clone()),
            }
        }

        // A reference left dangling by an earlier run may resolve now
        for reference in resolved {
            entity.remove_warning(&unresolved_warning(&reference));
        }

        for reference in dangling {
            warn!(link = %entity.link(), reference = %reference, "Dangling cross-reference");
            let message = unresolved_warning(&reference);
            if !entity.warnings().contains(&message) {
                entity.add_warning(message);
            }
            report.dangling.push((entity.link().to_string(), reference));
        }
    }
    report
}

//! Merges raw cut entries into one cut per `(target, action)`.
use std::collections::HashSet;

use crate::{diagnostic::Diagnostic, facet::FacetCut};

/// Groups `cuts` by target and action.
///
/// Selectors of merged entries are deduplicated, keeping first-seen order.
/// Every selector that ends up in more than one group is reported as a
/// [`Diagnostic::SelectorConflict`] naming the target of each repeated
/// occurrence. The grouped cuts never depend on the diagnostics.
pub fn group_facet_cuts(
    cuts: impl IntoIterator<Item = FacetCut>,
) -> (Vec<FacetCut>, Vec<Diagnostic>) {
    let mut groups: Vec<FacetCut> = Vec::new();

    for cut in cuts {
        match groups.iter_mut().find(|group| {
            group.action == cut.action && group.target == cut.target
        }) {
            Some(group) => {
                for selector in cut.selectors {
                    if !group.selectors.contains(&selector) {
                        group.selectors.push(selector);
                    }
                }
            }
            None => groups.push(FacetCut {
                selectors: crate::facet::unique(cut.selectors),
                ..cut
            }),
        }
    }

    let diagnostics = conflicts(&groups);
    (groups, diagnostics)
}

fn conflicts(groups: &[FacetCut]) -> Vec<Diagnostic> {
    let mut seen = HashSet::new();
    let mut diagnostics = Vec::new();

    for group in groups {
        for selector in &group.selectors {
            if !seen.insert(*selector) {
                let diagnostic = Diagnostic::SelectorConflict {
                    selector: *selector,
                    target: group.target,
                };
                diagnostic.emit();
                diagnostics.push(diagnostic);
            }
        }
    }

    diagnostics
}

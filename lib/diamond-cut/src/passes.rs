//! The three reconciliation passes.
//!
//! Each pass compares a [`RegistrySnapshot`] with the candidate facets and
//! emits raw, single-selector cuts. Passes only read their inputs, so they
//! can run in any order against the same snapshot. A pass that finds nothing
//! to do returns [`PassOutcome::Empty`], which is not an error.
use std::collections::HashSet;

use alloy_primitives::{Address, Selector};
use tracing::debug;

use crate::{
    diagnostic::Diagnostic,
    facet::{facet_cut, is_empty_selector, Facet, FacetCut, FacetCutAction},
    filter::{
        destructure_filters, selector_is_filtered, validate_filters,
        FacetFilter, FilterError,
    },
    registry::{OwnerMap, RegistrySnapshot},
};

/// Result of a single reconciliation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PassOutcome {
    /// The pass found nothing to do.
    Empty(FacetCutAction),
    /// Raw cut entries, one selector each.
    Entries(Vec<FacetCut>),
}

impl PassOutcome {
    fn new(action: FacetCutAction, cuts: Vec<FacetCut>) -> Self {
        debug!(%action, entries = cuts.len(), "reconciliation pass finished");
        if cuts.is_empty() {
            PassOutcome::Empty(action)
        } else {
            PassOutcome::Entries(cuts)
        }
    }

    /// Returns true if the pass found nothing to do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, PassOutcome::Empty(_))
    }

    /// The emitted cut entries, empty for [`PassOutcome::Empty`].
    #[must_use]
    pub fn into_cuts(self) -> Vec<FacetCut> {
        match self {
            PassOutcome::Empty(_) => Vec::new(),
            PassOutcome::Entries(cuts) => cuts,
        }
    }

    /// The diagnostic reporting an empty pass, if the pass was empty.
    #[must_use]
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        match self {
            PassOutcome::Empty(action) => {
                Some(Diagnostic::NothingToApply { action: *action })
            }
            PassOutcome::Entries(_) => None,
        }
    }
}

fn scoped_filters(
    filters: &[FacetFilter],
    action: FacetCutAction,
) -> Result<(Vec<FacetFilter>, Vec<FacetFilter>), FilterError> {
    let (only, except) = destructure_filters(filters, action);
    validate_filters(&only, &except)?;
    Ok((only, except))
}

/// Emits an ADD entry for every candidate selector the registry doesn't know.
///
/// Candidates targeting the registry itself are ignored.
///
/// # Errors
///
/// If the ADD rules of `filters` are malformed.
pub fn addition_pass(
    snapshot: &RegistrySnapshot,
    candidates: &[Facet],
    filters: &[FacetFilter],
) -> Result<PassOutcome, FilterError> {
    let (only, except) = scoped_filters(filters, FacetCutAction::Add)?;

    let mut cuts = Vec::new();
    for facet in candidates {
        let target = facet.target;
        for &selector in &facet.selectors {
            if target != snapshot.diamond()
                && !is_empty_selector(&selector)
                && !snapshot.contains(&selector)
                && selector_is_filtered(&only, &except, target, selector)
            {
                cuts.push(facet_cut(target, [selector], FacetCutAction::Add));
            }
        }
    }

    Ok(PassOutcome::new(FacetCutAction::Add, cuts))
}

/// Emits a REPLACE entry for every registered candidate selector whose
/// current owner differs from the candidate's target.
///
/// `owners` holds the current owner of each selector; a missing entry means
/// the selector has no owner.
///
/// # Errors
///
/// If the REPLACE rules of `filters` are malformed.
pub fn replacement_pass(
    snapshot: &RegistrySnapshot,
    candidates: &[Facet],
    owners: &OwnerMap,
    filters: &[FacetFilter],
) -> Result<PassOutcome, FilterError> {
    let (only, except) = scoped_filters(filters, FacetCutAction::Replace)?;

    let mut cuts = Vec::new();
    for facet in candidates {
        let target = facet.target;
        for &selector in &facet.selectors {
            let current =
                owners.get(&selector).copied().unwrap_or(Address::ZERO);

            if target != current
                && !target.is_zero()
                && target != snapshot.diamond()
                && !is_empty_selector(&selector)
                && snapshot.contains(&selector)
                && selector_is_filtered(&only, &except, target, selector)
            {
                cuts.push(facet_cut(
                    target,
                    [selector],
                    FacetCutAction::Replace,
                ));
            }
        }
    }

    Ok(PassOutcome::new(FacetCutAction::Replace, cuts))
}

/// Emits a REMOVE entry for every registered selector no candidate exposes.
///
/// Selectors owned by the registry itself are kept. Filter rules are
/// evaluated against the null address, the target of every REMOVE cut.
///
/// # Errors
///
/// If the REMOVE rules of `filters` are malformed.
pub fn removal_pass(
    snapshot: &RegistrySnapshot,
    candidates: &[Facet],
    filters: &[FacetFilter],
) -> Result<PassOutcome, FilterError> {
    let (only, except) = scoped_filters(filters, FacetCutAction::Remove)?;

    let exposed: HashSet<Selector> = candidates
        .iter()
        .flat_map(|facet| facet.selectors.iter().copied())
        .collect();

    let mut cuts = Vec::new();
    for facet in snapshot.facets() {
        let target = facet.target;
        for &selector in &facet.selectors {
            if !target.is_zero()
                && target != snapshot.diamond()
                && !is_empty_selector(&selector)
                && !exposed.contains(&selector)
                && selector_is_filtered(&only, &except, Address::ZERO, selector)
            {
                cuts.push(facet_cut(
                    Address::ZERO,
                    [selector],
                    FacetCutAction::Remove,
                ));
            }
        }
    }

    Ok(PassOutcome::new(FacetCutAction::Remove, cuts))
}

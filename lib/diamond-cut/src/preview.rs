//! Previews the cut that brings a registry in line with a set of contracts.
use std::fmt;

use alloy_primitives::Selector;
use tracing::{debug, info};

use crate::{
    config::{OwnerLookup, PreviewOptions},
    diagnostic::Diagnostic,
    facet::{Facet, FacetCut, FacetCutAction},
    filter::{destructure_filters, validate_filters, FacetFilter},
    group::group_facet_cuts,
    passes::{addition_pass, removal_pass, replacement_pass, PassOutcome},
    registry::{DiamondReader, OwnerMap, RegistrySnapshot},
    report::Report,
    selectors::{facets, ContractHandle},
};

/// A grouped cut plan and what an operator should review about it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Preview {
    /// Grouped cuts, at most one per `(target, action)`.
    pub cuts: Vec<FacetCut>,
    /// Empty passes and selector conflicts.
    pub diagnostics: Vec<Diagnostic>,
}

impl Preview {
    /// Returns true if there is nothing to submit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    /// Tabular rendering of the cuts.
    #[must_use]
    pub fn report(&self) -> Report<'_> {
        Report::new(&self.cuts)
    }
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.report())?;
        for diagnostic in &self.diagnostics {
            writeln!(f, "WARNING: {diagnostic}")?;
        }
        Ok(())
    }
}

/// Previews the cut adding, replacing and removing selectors as needed.
///
/// Same as [`preview_facet_cut_with`] with default [`PreviewOptions`].
///
/// # Errors
///
/// See [`preview_facet_cut_with`].
pub async fn preview_facet_cut<R, C>(
    diamond: &R,
    contracts: &[C],
    filters: &[FacetFilter],
) -> eyre::Result<Preview>
where
    R: DiamondReader,
    C: ContractHandle,
{
    preview_facet_cut_with(
        diamond,
        contracts,
        filters,
        PreviewOptions::default(),
    )
    .await
}

/// Previews the cut adding, replacing and removing selectors as needed.
///
/// Runs the three passes against one fresh snapshot of `diamond` and groups
/// their union. An empty pass is reported as a [`Diagnostic`] and
/// contributes nothing.
///
/// # Errors
///
/// * [`crate::FilterError`] - `filters` are malformed. Checked before the
///   registry is read.
/// * Any error of `diamond` while reading the registry, unchanged.
pub async fn preview_facet_cut_with<R, C>(
    diamond: &R,
    contracts: &[C],
    filters: &[FacetFilter],
    options: PreviewOptions,
) -> eyre::Result<Preview>
where
    R: DiamondReader,
    C: ContractHandle,
{
    for action in FacetCutAction::ALL {
        let (only, except) = destructure_filters(filters, action);
        validate_filters(&only, &except)?;
    }

    let candidates = facets(contracts);
    let snapshot = RegistrySnapshot::read(diamond).await?;
    let owners =
        resolve_owners(diamond, &snapshot, &candidates, options.owner_lookup)
            .await?;

    let outcomes = [
        addition_pass(&snapshot, &candidates, filters)?,
        replacement_pass(&snapshot, &candidates, &owners, filters)?,
        removal_pass(&snapshot, &candidates, filters)?,
    ];

    let mut diagnostics = Vec::new();
    let mut raw = Vec::new();
    for outcome in outcomes {
        if let Some(diagnostic) = outcome.diagnostic() {
            diagnostic.emit();
            diagnostics.push(diagnostic);
        }
        raw.extend(outcome.into_cuts());
    }

    let (cuts, conflicts) = group_facet_cuts(raw);
    diagnostics.extend(conflicts);

    info!(
        diamond = %snapshot.diamond(),
        cuts = cuts.len(),
        diagnostics = diagnostics.len(),
        "previewed facet cut"
    );
    Ok(Preview { cuts, diagnostics })
}

/// Runs the addition pass alone against a fresh snapshot of `diamond`.
///
/// # Errors
///
/// If the ADD rules of `filters` are malformed or the registry can't be
/// read.
pub async fn add_unregistered_selectors<R, C>(
    diamond: &R,
    contracts: &[C],
    filters: &[FacetFilter],
) -> eyre::Result<PassOutcome>
where
    R: DiamondReader,
    C: ContractHandle,
{
    let (only, except) = destructure_filters(filters, FacetCutAction::Add);
    validate_filters(&only, &except)?;

    let snapshot = RegistrySnapshot::read(diamond).await?;
    Ok(addition_pass(&snapshot, &facets(contracts), filters)?)
}

/// Runs the replacement pass alone against a fresh snapshot of `diamond`,
/// asking the registry for the owner of every registered candidate selector.
///
/// # Errors
///
/// If the REPLACE rules of `filters` are malformed or the registry can't be
/// read.
pub async fn replace_registered_selectors<R, C>(
    diamond: &R,
    contracts: &[C],
    filters: &[FacetFilter],
) -> eyre::Result<PassOutcome>
where
    R: DiamondReader,
    C: ContractHandle,
{
    let (only, except) = destructure_filters(filters, FacetCutAction::Replace);
    validate_filters(&only, &except)?;

    let snapshot = RegistrySnapshot::read(diamond).await?;
    let candidates = facets(contracts);
    let owners =
        resolve_owners(diamond, &snapshot, &candidates, OwnerLookup::Live)
            .await?;
    Ok(replacement_pass(&snapshot, &candidates, &owners, filters)?)
}

/// Runs the removal pass alone against a fresh snapshot of `diamond`.
///
/// # Errors
///
/// If the REMOVE rules of `filters` are malformed or the registry can't be
/// read.
pub async fn remove_registered_selectors<R, C>(
    diamond: &R,
    contracts: &[C],
    filters: &[FacetFilter],
) -> eyre::Result<PassOutcome>
where
    R: DiamondReader,
    C: ContractHandle,
{
    let (only, except) = destructure_filters(filters, FacetCutAction::Remove);
    validate_filters(&only, &except)?;

    let snapshot = RegistrySnapshot::read(diamond).await?;
    Ok(removal_pass(&snapshot, &facets(contracts), filters)?)
}

/// Current owners of the candidate selectors the replacement pass may cut.
async fn resolve_owners<R: DiamondReader>(
    diamond: &R,
    snapshot: &RegistrySnapshot,
    candidates: &[Facet],
    lookup: OwnerLookup,
) -> eyre::Result<OwnerMap> {
    match lookup {
        OwnerLookup::Snapshot => Ok(snapshot.owners().clone()),
        OwnerLookup::Live => {
            let mut owners = OwnerMap::new();
            let registered = candidates
                .iter()
                .flat_map(|facet| facet.selectors.iter().copied())
                .filter(|selector: &Selector| snapshot.contains(selector));

            for selector in registered {
                if owners.contains_key(&selector) {
                    continue;
                }
                let owner = diamond.facet_address(selector).await?;
                owners.insert(selector, owner);
            }

            debug!(lookups = owners.len(), "resolved selector owners");
            Ok(owners)
        }
    }
}

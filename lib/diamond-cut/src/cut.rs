//! Submits a finalized cut to the registry.
use alloy_primitives::{Address, Bytes, TxHash};
use tracing::info;

use crate::{
    facet::{FacetCut, FacetCutAction},
    registry::DiamondWriter,
};

/// A cut that can't be submitted or was rejected by the registry.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CutError {
    /// A cut lists no selectors.
    #[error("{action} cut for {target} has no selectors")]
    NoSelectors {
        /// Target of the offending cut.
        target: Address,
        /// Action of the offending cut.
        action: FacetCutAction,
    },
    /// An ADD or REPLACE cut points to the null address.
    #[error("{action} cut targets the zero address")]
    ZeroTarget {
        /// Action of the offending cut.
        action: FacetCutAction,
    },
    /// A REMOVE cut names a target.
    #[error("REMOVE cut targets {target}, expected the zero address")]
    RemoveTargetNotZero {
        /// Target of the offending cut.
        target: Address,
    },
    /// Initialization data was supplied for the null address, or the other
    /// way round.
    #[error("initialization target and data must be both set or both empty")]
    InvalidInitialization,
    /// The cut transaction was mined but reverted.
    #[error("diamond cut transaction {tx_hash} reverted")]
    Reverted {
        /// Hash of the reverted transaction.
        tx_hash: TxHash,
    },
}

impl CutError {
    /// Extracts a [`CutError`] from an [`eyre::Report`], if it holds one.
    #[must_use]
    pub fn from_report(report: &eyre::Report) -> Option<&Self> {
        report.downcast_ref::<CutError>()
    }
}

/// Delegate call run by the registry once the cut is applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Initializer {
    /// Contract to delegate call.
    pub target: Address,
    /// Call data of the delegate call.
    pub data: Bytes,
}

/// Checks the cuts the registry would reject regardless of its state.
///
/// # Errors
///
/// * [`CutError::NoSelectors`] - a cut lists no selectors.
/// * [`CutError::ZeroTarget`] - an ADD or REPLACE cut targets the null
///   address.
/// * [`CutError::RemoveTargetNotZero`] - a REMOVE cut names a target.
pub fn validate_cuts(cuts: &[FacetCut]) -> Result<(), CutError> {
    for cut in cuts {
        if cut.selectors.is_empty() {
            return Err(CutError::NoSelectors {
                target: cut.target,
                action: cut.action,
            });
        }

        match cut.action {
            FacetCutAction::Add | FacetCutAction::Replace
                if cut.target.is_zero() =>
            {
                return Err(CutError::ZeroTarget { action: cut.action });
            }
            FacetCutAction::Remove if !cut.target.is_zero() => {
                return Err(CutError::RemoveTargetNotZero {
                    target: cut.target,
                });
            }
            _ => {}
        }
    }

    Ok(())
}

/// Applies `cuts` to the registry behind `diamond` and waits for
/// confirmation.
///
/// # Errors
///
/// * [`CutError`] - the cuts or `init` are malformed. Nothing is submitted.
/// * Any error reported by `diamond` while submitting, unchanged.
pub async fn diamond_cut<W: DiamondWriter>(
    diamond: &W,
    cuts: &[FacetCut],
    init: Option<Initializer>,
) -> eyre::Result<W::Receipt> {
    validate_cuts(cuts)?;

    let Initializer { target, data } = init.unwrap_or(Initializer {
        target: Address::ZERO,
        data: Bytes::new(),
    });
    if target.is_zero() != data.is_empty() {
        return Err(CutError::InvalidInitialization.into());
    }

    info!(cuts = cuts.len(), init = %target, "submitting diamond cut");
    diamond.diamond_cut(cuts.to_vec(), target, data).await
}

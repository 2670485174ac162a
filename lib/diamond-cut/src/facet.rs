//! Facet and cut types shared by every stage of the reconciliation engine.
//!
//! A [`Facet`] pairs a deployed contract with the function selectors it
//! exposes. A [`FacetCut`] is one batched mutation of the registry's
//! selector to target mapping.
use std::{collections::HashSet, fmt};

use alloy_primitives::{Address, Selector};
use serde::{Deserialize, Serialize};

use crate::abi;

/// Mutation kind applied to a batch of selectors.
///
/// The discriminants are the values the registry's `diamondCut` entrypoint
/// expects on the wire.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum FacetCutAction {
    /// Registers selectors unknown to the registry.
    Add = 0,
    /// Points registered selectors to a new target.
    Replace = 1,
    /// Unregisters selectors.
    Remove = 2,
}

impl FacetCutAction {
    /// Every action, in wire order.
    pub const ALL: [Self; 3] = [Self::Add, Self::Replace, Self::Remove];

    /// Solidity name of the action.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Replace => "REPLACE",
            Self::Remove => "REMOVE",
        }
    }
}

impl fmt::Display for FacetCutAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<FacetCutAction> for u8 {
    fn from(action: FacetCutAction) -> Self {
        action as u8
    }
}

/// A wire value that is not a [`FacetCutAction`] discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid facet cut action: {0}")]
pub struct InvalidAction(pub u8);

impl TryFrom<u8> for FacetCutAction {
    type Error = InvalidAction;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Add),
            1 => Ok(Self::Replace),
            2 => Ok(Self::Remove),
            other => Err(InvalidAction(other)),
        }
    }
}

/// A deployed contract and the selectors it exposes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Facet {
    /// Address the selectors resolve to.
    pub target: Address,
    /// Exposed selectors, unique and in first-seen order.
    pub selectors: Vec<Selector>,
}

impl Facet {
    /// Creates a facet, collapsing duplicate selectors.
    pub fn new(
        target: Address,
        selectors: impl IntoIterator<Item = Selector>,
    ) -> Self {
        Self { target, selectors: unique(selectors) }
    }

    /// Returns true if the facet exposes `selector`.
    #[must_use]
    pub fn contains(&self, selector: &Selector) -> bool {
        self.selectors.contains(selector)
    }
}

impl From<abi::Facet> for Facet {
    fn from(facet: abi::Facet) -> Self {
        Facet::new(facet.target, facet.selectors)
    }
}

/// One batched registry mutation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FacetCut {
    /// New owner of the selectors, or the null address for removals.
    pub target: Address,
    /// What to do with the selectors.
    pub action: FacetCutAction,
    /// Selectors affected by this cut.
    pub selectors: Vec<Selector>,
}

impl From<FacetCut> for abi::FacetCut {
    fn from(cut: FacetCut) -> Self {
        abi::FacetCut {
            target: cut.target,
            action: cut.action.into(),
            selectors: cut.selectors,
        }
    }
}

impl TryFrom<abi::FacetCut> for FacetCut {
    type Error = InvalidAction;

    fn try_from(cut: abi::FacetCut) -> Result<Self, Self::Error> {
        Ok(FacetCut {
            target: cut.target,
            action: cut.action.try_into()?,
            selectors: cut.selectors,
        })
    }
}

/// Returns a [`FacetCut`] for `target`.
pub fn facet_cut(
    target: Address,
    selectors: impl IntoIterator<Item = Selector>,
    action: FacetCutAction,
) -> FacetCut {
    FacetCut { target, action, selectors: selectors.into_iter().collect() }
}

/// Returns true if `selector` is exposed by any of `facets`.
#[must_use]
pub fn selector_exists_in_facets(
    selector: &Selector,
    facets: &[Facet],
) -> bool {
    facets.iter().any(|facet| facet.contains(selector))
}

/// The zero selector never identifies a function and is treated as unset.
#[must_use]
pub fn is_empty_selector(selector: &Selector) -> bool {
    selector.is_zero()
}

/// Removes duplicates, keeping the first occurrence of every selector.
pub(crate) fn unique(
    selectors: impl IntoIterator<Item = Selector>,
) -> Vec<Selector> {
    let mut seen = HashSet::new();
    selectors.into_iter().filter(|selector| seen.insert(*selector)).collect()
}

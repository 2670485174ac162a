use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex, MutexGuard, PoisonError,
};

use alloy_primitives::{Address, Bytes, Selector};
use tracing::debug;

use super::{DiamondReader, DiamondWriter};
use crate::facet::{Facet, FacetCut, FacetCutAction};

/// A rejected cut, mirroring the registry contract's revert reasons.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    /// A cut lists no selectors.
    #[error("no selectors specified for {action} cut")]
    SelectorNotSpecified {
        /// Action of the offending cut.
        action: FacetCutAction,
    },
    /// ADD of a selector that is already registered.
    #[error("selector {0} is already added")]
    SelectorAlreadyAdded(Selector),
    /// REPLACE or REMOVE of a selector that is not registered.
    #[error("selector {0} is not found")]
    SelectorNotFound(Selector),
    /// REPLACE or REMOVE of a selector owned by the registry itself.
    #[error("selector {0} is immutable")]
    SelectorIsImmutable(Selector),
    /// REPLACE pointing a selector to its current owner.
    #[error("replace target of selector {0} is identical")]
    ReplaceTargetIsIdentical(Selector),
    /// REMOVE with a target other than the null address.
    #[error("remove target {0} is not the zero address")]
    RemoveTargetNotZeroAddress(Address),
    /// ADD or REPLACE pointing to the null address.
    #[error("{0} target is the zero address")]
    TargetIsZeroAddress(FacetCutAction),
    /// Initialization target and data are not both set or both unset.
    #[error("invalid initialization parameters")]
    InvalidInitializationParameters,
}

/// Confirmation of a cut applied to a [`MemoryDiamond`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CutReceipt {
    /// Number of cuts applied to the registry so far, this one included.
    pub sequence: usize,
    /// The applied cuts.
    pub cuts: Vec<FacetCut>,
    /// Initialization target, [`Address::ZERO`] if none.
    pub init_target: Address,
    /// Initialization call data.
    pub init_data: Bytes,
}

/// An in-memory registry enforcing the registry contract's cut rules.
///
/// Cuts are applied atomically: a rejected batch leaves the registry
/// untouched. Useful to dry-run a preview before submitting it.
#[derive(Debug)]
pub struct MemoryDiamond {
    address: Address,
    /// Registered selectors and their owners, in registration order.
    registry: Mutex<Vec<(Selector, Address)>>,
    cuts: AtomicUsize,
    lookups: AtomicUsize,
}

impl MemoryDiamond {
    /// Creates the registry at `address` with `facets` already registered.
    ///
    /// Selectors registered to `address` itself are immutable.
    pub fn new(
        address: Address,
        facets: impl IntoIterator<Item = Facet>,
    ) -> Self {
        let mut registry: Vec<(Selector, Address)> = Vec::new();
        for facet in facets {
            for selector in facet.selectors {
                if !registry.iter().any(|(s, _)| *s == selector) {
                    registry.push((selector, facet.target));
                }
            }
        }

        Self {
            address,
            registry: Mutex::new(registry),
            cuts: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Number of [`DiamondReader::facet_address`] calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Registered facets, grouped by target in registration order.
    pub fn snapshot(&self) -> Vec<Facet> {
        let registry = self.lock();
        let mut facets: Vec<Facet> = Vec::new();
        for (selector, target) in registry.iter() {
            match facets.iter_mut().find(|facet| facet.target == *target) {
                Some(facet) => facet.selectors.push(*selector),
                None => facets.push(Facet::new(*target, [*selector])),
            }
        }
        facets
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(Selector, Address)>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(
        &self,
        registry: &mut Vec<(Selector, Address)>,
        cut: &FacetCut,
    ) -> Result<(), MemoryError> {
        if cut.selectors.is_empty() {
            return Err(MemoryError::SelectorNotSpecified {
                action: cut.action,
            });
        }

        match cut.action {
            FacetCutAction::Add | FacetCutAction::Replace
                if cut.target.is_zero() =>
            {
                return Err(MemoryError::TargetIsZeroAddress(cut.action));
            }
            FacetCutAction::Remove if !cut.target.is_zero() => {
                return Err(MemoryError::RemoveTargetNotZeroAddress(
                    cut.target,
                ));
            }
            _ => {}
        }

        for selector in &cut.selectors {
            let position = registry.iter().position(|(s, _)| s == selector);

            match (cut.action, position) {
                (FacetCutAction::Add, None) => {
                    registry.push((*selector, cut.target));
                }
                (FacetCutAction::Add, Some(_)) => {
                    return Err(MemoryError::SelectorAlreadyAdded(*selector));
                }
                (_, None) => {
                    return Err(MemoryError::SelectorNotFound(*selector));
                }
                (_, Some(index)) if registry[index].1 == self.address => {
                    return Err(MemoryError::SelectorIsImmutable(*selector));
                }
                (FacetCutAction::Replace, Some(index)) => {
                    if registry[index].1 == cut.target {
                        return Err(MemoryError::ReplaceTargetIsIdentical(
                            *selector,
                        ));
                    }
                    registry[index].1 = cut.target;
                }
                (FacetCutAction::Remove, Some(index)) => {
                    registry.remove(index);
                }
            }
        }

        Ok(())
    }
}

impl DiamondReader for MemoryDiamond {
    fn address(&self) -> Address {
        self.address
    }

    async fn facets(&self) -> eyre::Result<Vec<Facet>> {
        Ok(self.snapshot())
    }

    async fn facet_address(&self, selector: Selector) -> eyre::Result<Address> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let registry = self.lock();
        Ok(registry
            .iter()
            .find(|(s, _)| *s == selector)
            .map_or(Address::ZERO, |(_, target)| *target))
    }
}

impl DiamondWriter for MemoryDiamond {
    type Receipt = CutReceipt;

    async fn diamond_cut(
        &self,
        cuts: Vec<FacetCut>,
        target: Address,
        data: Bytes,
    ) -> eyre::Result<CutReceipt> {
        if target.is_zero() != data.is_empty() {
            return Err(MemoryError::InvalidInitializationParameters.into());
        }

        let mut registry = self.lock();
        let mut staged = registry.clone();
        for cut in &cuts {
            self.apply(&mut staged, cut)?;
        }
        *registry = staged;
        drop(registry);

        let sequence = self.cuts.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            diamond = %self.address,
            sequence,
            cuts = cuts.len(),
            "applied in-memory cut"
        );

        Ok(CutReceipt { sequence, cuts, init_target: target, init_data: data })
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, fixed_bytes};

    use super::*;
    use crate::facet::facet_cut;

    const DIAMOND: Address =
        address!("00000000000000000000000000000000000000dd");
    const A: Address = address!("000000000000000000000000000000000000000a");
    const B: Address = address!("000000000000000000000000000000000000000b");
    const S1: Selector = fixed_bytes!("00000001");
    const S2: Selector = fixed_bytes!("00000002");
    const S9: Selector = fixed_bytes!("00000009");

    fn diamond() -> MemoryDiamond {
        MemoryDiamond::new(
            DIAMOND,
            [
                Facet::new(DIAMOND, [fixed_bytes!("1f931c1c")]),
                Facet::new(A, [S1]),
            ],
        )
    }

    fn rejection(err: &eyre::Report) -> &MemoryError {
        err.downcast_ref::<MemoryError>().expect("should be a MemoryError")
    }

    #[tokio::test]
    async fn applies_add_replace_and_remove() -> eyre::Result<()> {
        let diamond = diamond();

        let receipt = diamond
            .diamond_cut(
                vec![
                    facet_cut(B, [S2], FacetCutAction::Add),
                    facet_cut(
                        B,
                        [S1],
                        FacetCutAction::Replace,
                    ),
                ],
                Address::ZERO,
                Bytes::new(),
            )
            .await?;
        assert_eq!(receipt.sequence, 1);
        assert_eq!(
            diamond.facet_address(S1).await?,
            B
        );

        diamond
            .diamond_cut(
                vec![facet_cut(
                    Address::ZERO,
                    [S2],
                    FacetCutAction::Remove,
                )],
                Address::ZERO,
                Bytes::new(),
            )
            .await?;

        assert_eq!(
            diamond.facets().await?,
            vec![
                Facet::new(DIAMOND, [fixed_bytes!("1f931c1c")]),
                Facet::new(B, [S1]),
            ]
        );
        assert_eq!(diamond.lookups(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_batch_leaves_registry_untouched() {
        let diamond = diamond();
        let before = diamond.snapshot();

        let err = diamond
            .diamond_cut(
                vec![
                    facet_cut(B, [S2], FacetCutAction::Add),
                    facet_cut(B, [S1], FacetCutAction::Add),
                ],
                Address::ZERO,
                Bytes::new(),
            )
            .await
            .expect_err("should reject duplicate add");

        assert_eq!(
            rejection(&err),
            &MemoryError::SelectorAlreadyAdded(S1)
        );
        assert_eq!(diamond.snapshot(), before);
    }

    #[tokio::test]
    async fn enforces_cut_rules() {
        let diamond = diamond();

        let cases = [
            (
                facet_cut(A, [S1], FacetCutAction::Replace),
                MemoryError::ReplaceTargetIsIdentical(S1),
            ),
            (
                facet_cut(A, [S9], FacetCutAction::Replace),
                MemoryError::SelectorNotFound(S9),
            ),
            (
                facet_cut(A, [S1], FacetCutAction::Remove),
                MemoryError::RemoveTargetNotZeroAddress(A),
            ),
            (
                facet_cut(
                    Address::ZERO,
                    [fixed_bytes!("1f931c1c")],
                    FacetCutAction::Remove,
                ),
                MemoryError::SelectorIsImmutable(fixed_bytes!("1f931c1c")),
            ),
            (
                facet_cut(Address::ZERO, [S2], FacetCutAction::Add),
                MemoryError::TargetIsZeroAddress(FacetCutAction::Add),
            ),
            (
                facet_cut(B, [Selector::ZERO; 0], FacetCutAction::Add),
                MemoryError::SelectorNotSpecified {
                    action: FacetCutAction::Add,
                },
            ),
        ];

        for (cut, expected) in cases {
            let err = diamond
                .diamond_cut(vec![cut], Address::ZERO, Bytes::new())
                .await
                .expect_err("should reject cut");
            assert_eq!(rejection(&err), &expected);
        }
    }

    #[tokio::test]
    async fn rejects_half_specified_initialization() {
        let diamond = diamond();

        let err = diamond
            .diamond_cut(vec![], A, Bytes::new())
            .await
            .expect_err("should reject init target without data");

        assert_eq!(
            rejection(&err),
            &MemoryError::InvalidInitializationParameters
        );
    }
}

//! Access to the registry of a diamond proxy.
//!
//! [`DiamondReader`] and [`DiamondWriter`] are the only places the engine
//! touches external state. [`RpcDiamond`] binds them to a deployed registry
//! through an alloy provider, [`MemoryDiamond`] keeps the registry in memory.
use std::{collections::HashMap, future::Future};

use alloy_primitives::{Address, Bytes, Selector};

use crate::facet::{self, Facet, FacetCut};

mod memory;
mod rpc;

pub use memory::{CutReceipt, MemoryDiamond, MemoryError};
pub use rpc::RpcDiamond;

/// Read access to a registry.
pub trait DiamondReader {
    /// Address of the registry itself.
    fn address(&self) -> Address;

    /// Currently registered facets.
    fn facets(&self) -> impl Future<Output = eyre::Result<Vec<Facet>>> + Send;

    /// Current owner of `selector`, or [`Address::ZERO`] if it is not
    /// registered.
    fn facet_address(
        &self,
        selector: Selector,
    ) -> impl Future<Output = eyre::Result<Address>> + Send;
}

/// Write access to a registry.
pub trait DiamondWriter {
    /// Confirmation of an applied cut.
    type Receipt;

    /// Applies `cuts`, then delegate calls `target` with `data` unless
    /// `target` is [`Address::ZERO`].
    ///
    /// Resolves once the mutation is confirmed.
    fn diamond_cut(
        &self,
        cuts: Vec<FacetCut>,
        target: Address,
        data: Bytes,
    ) -> impl Future<Output = eyre::Result<Self::Receipt>> + Send;
}

/// Resolved owner of each selector a pass may look at.
pub type OwnerMap = HashMap<Selector, Address>;

/// The registry's facets at the time they were read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrySnapshot {
    diamond: Address,
    facets: Vec<Facet>,
    owners: OwnerMap,
}

impl RegistrySnapshot {
    /// Reads a fresh snapshot from `reader`.
    ///
    /// # Errors
    ///
    /// If the registry's facets can't be read.
    pub async fn read<R: DiamondReader>(
        reader: &R,
    ) -> eyre::Result<Self> {
        let facets = reader.facets().await?;
        Ok(Self::new(reader.address(), facets))
    }

    /// Builds a snapshot of the registry at `diamond` from `facets`.
    ///
    /// A selector listed by several facets belongs to the first of them.
    #[must_use]
    pub fn new(diamond: Address, facets: Vec<Facet>) -> Self {
        let mut owners = OwnerMap::new();
        for facet in &facets {
            for selector in &facet.selectors {
                owners.entry(*selector).or_insert(facet.target);
            }
        }
        Self { diamond, facets, owners }
    }

    /// Address of the registry the snapshot was taken from.
    #[must_use]
    pub fn diamond(&self) -> Address {
        self.diamond
    }

    /// Registered facets, in the order the registry reported them.
    #[must_use]
    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    /// Owner of every registered selector.
    #[must_use]
    pub fn owners(&self) -> &OwnerMap {
        &self.owners
    }

    /// Returns true if `selector` is registered.
    #[must_use]
    pub fn contains(&self, selector: &Selector) -> bool {
        self.owners.contains_key(selector)
    }

    /// Owner of `selector`, or [`Address::ZERO`] if it is not registered.
    #[must_use]
    pub fn facet_address(&self, selector: &Selector) -> Address {
        self.owners.get(selector).copied().unwrap_or(Address::ZERO)
    }

    /// Targets of every registered facet.
    #[must_use]
    pub fn facet_addresses(&self) -> Vec<Address> {
        let mut addresses = Vec::new();
        for facet in &self.facets {
            if !addresses.contains(&facet.target) {
                addresses.push(facet.target);
            }
        }
        addresses
    }

    /// Selectors registered to `target`.
    #[must_use]
    pub fn facet_function_selectors(&self, target: Address) -> Vec<Selector> {
        facet::unique(
            self.facets
                .iter()
                .filter(|facet| facet.target == target)
                .flat_map(|facet| facet.selectors.iter().copied()),
        )
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, fixed_bytes};

    use super::*;

    const DIAMOND: Address =
        address!("00000000000000000000000000000000000000dd");
    const A: Address = address!("000000000000000000000000000000000000000a");
    const B: Address = address!("000000000000000000000000000000000000000b");

    fn snapshot() -> RegistrySnapshot {
        RegistrySnapshot::new(
            DIAMOND,
            vec![
                Facet::new(
                    A,
                    [fixed_bytes!("00000001"), fixed_bytes!("00000002")],
                ),
                Facet::new(B, [fixed_bytes!("00000003")]),
            ],
        )
    }

    #[test]
    fn resolves_selector_owners() {
        let snapshot = snapshot();

        assert_eq!(snapshot.facet_address(&fixed_bytes!("00000002")), A);
        assert_eq!(snapshot.facet_address(&fixed_bytes!("00000003")), B);
        assert_eq!(
            snapshot.facet_address(&fixed_bytes!("00000004")),
            Address::ZERO
        );
        assert!(snapshot.contains(&fixed_bytes!("00000001")));
        assert!(!snapshot.contains(&fixed_bytes!("00000004")));
    }

    #[test]
    fn first_facet_owns_shared_selector() {
        let snapshot = RegistrySnapshot::new(
            DIAMOND,
            vec![
                Facet::new(A, [fixed_bytes!("00000001")]),
                Facet::new(B, [fixed_bytes!("00000001")]),
            ],
        );

        assert_eq!(snapshot.facet_address(&fixed_bytes!("00000001")), A);
    }

    #[test]
    fn exposes_loupe_views() {
        let snapshot = snapshot();

        assert_eq!(snapshot.diamond(), DIAMOND);
        assert_eq!(snapshot.facet_addresses(), vec![A, B]);
        assert_eq!(
            snapshot.facet_function_selectors(A),
            vec![fixed_bytes!("00000001"), fixed_bytes!("00000002")]
        );
        assert!(snapshot.facet_function_selectors(Address::ZERO).is_empty());
    }
}

use alloy::{
    network::ReceiptResponse, providers::Provider,
    rpc::types::TransactionReceipt,
};
use alloy_primitives::{Address, Bytes, Selector};
use tracing::debug;

use super::{DiamondReader, DiamondWriter};
use crate::{
    abi::{self, IDiamondReadable, IDiamondWritable},
    cut::CutError,
    facet::{Facet, FacetCut},
};

/// A registry deployed on chain, reached through `provider`.
///
/// Submitting cuts requires a provider with a wallet filler.
#[derive(Clone, Debug)]
pub struct RpcDiamond<P> {
    address: Address,
    provider: P,
}

impl<P: Provider> RpcDiamond<P> {
    /// Binds the registry at `address`.
    pub fn new(address: Address, provider: P) -> Self {
        Self { address, provider }
    }

    /// The underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: Provider> DiamondReader for RpcDiamond<P> {
    fn address(&self) -> Address {
        self.address
    }

    async fn facets(&self) -> eyre::Result<Vec<Facet>> {
        let diamond = IDiamondReadable::new(self.address, &self.provider);
        let facets = diamond.facets().call().await?;
        debug!(
            diamond = %self.address,
            facets = facets.len(),
            "read registry facets"
        );
        Ok(facets.into_iter().map(Facet::from).collect())
    }

    async fn facet_address(&self, selector: Selector) -> eyre::Result<Address> {
        let diamond = IDiamondReadable::new(self.address, &self.provider);
        Ok(diamond.facetAddress(selector).call().await?)
    }
}

impl<P: Provider> DiamondWriter for RpcDiamond<P> {
    type Receipt = TransactionReceipt;

    async fn diamond_cut(
        &self,
        cuts: Vec<FacetCut>,
        target: Address,
        data: Bytes,
    ) -> eyre::Result<TransactionReceipt> {
        let diamond = IDiamondWritable::new(self.address, &self.provider);
        let cuts: Vec<abi::FacetCut> =
            cuts.into_iter().map(abi::FacetCut::from).collect();

        let receipt = diamond
            .diamondCut(cuts, target, data)
            .send()
            .await?
            .get_receipt()
            .await?;

        if !receipt.status() {
            return Err(CutError::Reverted {
                tx_hash: receipt.transaction_hash,
            }
            .into());
        }

        debug!(tx_hash = %receipt.transaction_hash, "diamond cut confirmed");
        Ok(receipt)
    }
}

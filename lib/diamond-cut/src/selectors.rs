//! Derives the selectors a deployed contract exposes and bundles them into
//! [`Facet`] records.
use alloy::json_abi::{AbiItem, Function};
use alloy_primitives::{Address, Selector};
use eyre::WrapErr;

use crate::facet::{self, Facet};

/// Handle of a deployed contract whose interface is known.
pub trait ContractHandle {
    /// Address the contract is deployed at.
    fn address(&self) -> Address;

    /// Selectors of the contract's functions, in declaration order.
    ///
    /// May contain duplicates, [`selectors`] removes them.
    fn selectors(&self) -> Vec<Selector>;
}

/// A deployed contract described by its function fragments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployedContract {
    address: Address,
    functions: Vec<Function>,
}

impl DeployedContract {
    /// Describes the contract at `address` with the function items of
    /// `items`, in the order they appear.
    #[must_use]
    pub fn from_abi_items<'a>(
        address: Address,
        items: impl IntoIterator<Item = AbiItem<'a>>,
    ) -> Self {
        let functions = items
            .into_iter()
            .filter_map(|item| match item {
                AbiItem::Function(function) => Some(function.into_owned()),
                _ => None,
            })
            .collect();

        Self { address, functions }
    }

    /// Describes the contract at `address` from its JSON ABI, keeping the
    /// declaration order of its functions.
    ///
    /// # Errors
    ///
    /// If `json` is not a JSON ABI array.
    pub fn from_abi_json(address: Address, json: &str) -> eyre::Result<Self> {
        let items: Vec<AbiItem<'_>> =
            serde_json::from_str(json).wrap_err("failed to parse JSON ABI")?;
        Ok(Self::from_abi_items(address, items))
    }

    /// Describes the contract at `address` from human-readable signatures,
    /// e.g. `"transfer(address,uint256)"`.
    ///
    /// # Errors
    ///
    /// If any of `signatures` can't be parsed as a function signature.
    pub fn from_signatures<S: AsRef<str>>(
        address: Address,
        signatures: impl IntoIterator<Item = S>,
    ) -> eyre::Result<Self> {
        let functions = signatures
            .into_iter()
            .map(|signature| {
                let signature = signature.as_ref();
                Function::parse(signature).wrap_err(format!(
                    "failed to parse function signature `{signature}`"
                ))
            })
            .collect::<eyre::Result<Vec<_>>>()?;

        Ok(Self { address, functions })
    }

    /// Canonical signatures of the contract's functions.
    #[must_use]
    pub fn function_signatures(&self) -> Vec<String> {
        self.functions.iter().map(Function::signature).collect()
    }
}

impl ContractHandle for DeployedContract {
    fn address(&self) -> Address {
        self.address
    }

    fn selectors(&self) -> Vec<Selector> {
        self.functions.iter().map(Function::selector).collect()
    }
}

impl<C: ContractHandle + ?Sized> ContractHandle for &C {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn selectors(&self) -> Vec<Selector> {
        (**self).selectors()
    }
}

/// Returns the unique selectors exposed by `contract`, in declaration order.
pub fn selectors(contract: &impl ContractHandle) -> Vec<Selector> {
    facet::unique(contract.selectors())
}

/// Returns one [`Facet`] per contract.
pub fn facets<C: ContractHandle>(contracts: &[C]) -> Vec<Facet> {
    contracts
        .iter()
        .map(|contract| Facet::new(contract.address(), contract.selectors()))
        .collect()
}

//! Preview options and connection settings.
use std::str::FromStr;

use alloy::{
    network::EthereumWallet,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use alloy_primitives::Address;
use eyre::{Context, ContextCompat};

use crate::registry::RpcDiamond;

pub(crate) const RPC_URL_ENV_VAR_NAME: &str = "RPC_URL";
pub(crate) const DIAMOND_ADDRESS_ENV_VAR_NAME: &str = "DIAMOND_ADDRESS";
pub(crate) const PRIVATE_KEY_ENV_VAR_NAME: &str = "PRIVATE_KEY";

/// How the replacement pass learns the current owner of a selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OwnerLookup {
    /// Derive owners from the registry snapshot read for the preview.
    ///
    /// Costs no round-trip beyond the snapshot itself.
    #[default]
    Snapshot,
    /// Ask the registry for the owner of every registered candidate
    /// selector.
    Live,
}

/// Knobs of [`crate::preview_facet_cut_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PreviewOptions {
    /// Owner resolution strategy of the replacement pass.
    pub owner_lookup: OwnerLookup,
}

/// Where the registry lives and who signs cuts for it.
#[derive(Clone, Debug)]
pub struct DiamondConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: Url,
    /// Address of the registry.
    pub diamond: Address,
    /// Hex-encoded private key used to submit cuts, if any.
    pub private_key: Option<String>,
}

impl DiamondConfig {
    /// Loads the configuration from the `RPC_URL`, `DIAMOND_ADDRESS` and
    /// optional `PRIVATE_KEY` environment variables.
    ///
    /// # Errors
    ///
    /// If a required variable is missing or any variable is malformed.
    pub fn from_env() -> eyre::Result<Self> {
        let rpc_url = env(RPC_URL_ENV_VAR_NAME)?;
        let rpc_url = Url::from_str(&rpc_url)
            .wrap_err(format!("failed to parse {RPC_URL_ENV_VAR_NAME}"))?;

        let diamond = env(DIAMOND_ADDRESS_ENV_VAR_NAME)?;
        let diamond = Address::from_str(&diamond)
            .wrap_err(format!(
                "failed to parse {DIAMOND_ADDRESS_ENV_VAR_NAME}"
            ))?;

        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR_NAME).ok();

        Ok(Self { rpc_url, diamond, private_key })
    }

    /// Connects to the registry. Cuts can only be submitted when a private
    /// key is configured.
    ///
    /// # Errors
    ///
    /// If the private key is malformed.
    pub fn connect(&self) -> eyre::Result<RpcDiamond<DynProvider>> {
        let provider = match &self.private_key {
            Some(private_key) => {
                let signer = private_key
                    .parse::<PrivateKeySigner>()
                    .wrap_err(format!(
                        "failed to parse {PRIVATE_KEY_ENV_VAR_NAME}"
                    ))?;
                ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .connect_http(self.rpc_url.clone())
                    .erased()
            }
            None => ProviderBuilder::new()
                .connect_http(self.rpc_url.clone())
                .erased(),
        };

        Ok(RpcDiamond::new(self.diamond, provider))
    }

    /// Address of the account submitting cuts.
    ///
    /// # Errors
    ///
    /// If no private key is configured or it is malformed.
    pub fn signer_address(&self) -> eyre::Result<Address> {
        let private_key =
            self.private_key.as_ref().context("no private key configured")?;
        let signer = private_key
            .parse::<PrivateKeySigner>()
            .wrap_err(format!("failed to parse {PRIVATE_KEY_ENV_VAR_NAME}"))?;
        Ok(signer.address())
    }
}

/// Load the `name` environment variable.
fn env(name: &str) -> eyre::Result<String> {
    std::env::var(name).wrap_err(format!("failed to load {name}"))
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;

    const ANVIL_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn config(private_key: Option<&str>) -> DiamondConfig {
        DiamondConfig {
            rpc_url: Url::from_str("http://localhost:8547")
                .expect("should parse url"),
            diamond: address!("00000000000000000000000000000000000000dd"),
            private_key: private_key.map(str::to_owned),
        }
    }

    #[test]
    fn defaults_to_snapshot_lookup() {
        assert_eq!(
            PreviewOptions::default().owner_lookup,
            OwnerLookup::Snapshot
        );
    }

    #[test]
    fn derives_signer_address() {
        let config = config(Some(ANVIL_KEY));

        assert_eq!(
            config.signer_address().expect("should parse key"),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
    }

    #[test]
    fn rejects_malformed_private_key() {
        let config = config(Some("not a key"));

        let err = config.connect().expect_err("should reject key");
        assert!(err.to_string().contains(PRIVATE_KEY_ENV_VAR_NAME));
        assert!(config.signer_address().is_err());
    }

    #[test]
    fn connects_read_only_without_key() {
        let config = config(None);

        let diamond = config.connect().expect("should build provider");
        assert_eq!(
            crate::registry::DiamondReader::address(&diamond),
            config.diamond
        );
        assert!(config.signer_address().is_err());
    }
}

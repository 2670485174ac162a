/*!
Preview and apply facet cuts for diamond proxies ([EIP-2535]).

A diamond is a single address whose functions are served by several
independently deployed contracts, its facets. The registry maps every
function selector to the facet serving it, and a cut adds, replaces or
removes entries of that mapping.

This crate computes the cut that brings a registry in line with a set of
contracts, without touching the registry until the cut is applied.

## Previewing a cut

[`preview_facet_cut`] reads the registry once, runs three reconciliation
passes over it and groups their results into at most one [`FacetCut`] per
target and action:

- selectors no registered facet exposes are added,
- registered selectors now served by a different contract are replaced,
- registered selectors no contract exposes anymore are removed.

```rust,ignore
use diamond_cut::{
    diamond_cut, preview_facet_cut, DeployedContract, DiamondConfig,
};

let diamond = DiamondConfig::from_env()?.connect()?;
let facets = [DeployedContract::from_abi_json(erc20_address, ERC20_ABI)?];

let preview = preview_facet_cut(&diamond, &facets, &[]).await?;
println!("{preview}");
diamond_cut(&diamond, &preview.cuts, None).await?;
```

[`FacetFilter`] rules restrict which targets and selectors each action may
touch. Passes that find nothing to do and selectors that end up in several
cuts are reported as [`Diagnostic`]s next to the cuts; they never fail the
preview.

## Dry runs

[`MemoryDiamond`] keeps a registry in memory and enforces the same cut rules
as the on-chain registry, so a preview can be applied and checked before it
is submitted.

[EIP-2535]: https://eips.ethereum.org/EIPS/eip-2535
*/

#![allow(clippy::module_name_repetitions)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod abi;
pub mod config;
pub mod cut;
pub mod diagnostic;
pub mod facet;
pub mod filter;
pub mod group;
pub mod passes;
pub mod preview;
pub mod registry;
pub mod report;
pub mod selectors;

pub use config::{DiamondConfig, OwnerLookup, PreviewOptions};
pub use cut::{diamond_cut, validate_cuts, CutError, Initializer};
pub use diagnostic::Diagnostic;
pub use facet::{
    facet_cut, selector_exists_in_facets, Facet, FacetCut, FacetCutAction,
};
pub use filter::{
    destructure_filters, selector_is_filtered, validate_filters, FacetFilter,
    FilterError, FilterKind,
};
pub use group::group_facet_cuts;
pub use passes::{addition_pass, removal_pass, replacement_pass, PassOutcome};
pub use preview::{
    add_unregistered_selectors, preview_facet_cut, preview_facet_cut_with,
    remove_registered_selectors, replace_registered_selectors, Preview,
};
pub use registry::{
    DiamondReader, DiamondWriter, MemoryDiamond, RegistrySnapshot, RpcDiamond,
};
pub use selectors::{facets, selectors, ContractHandle, DeployedContract};

//! Solidity bindings of the registry's loupe and cut entrypoints.
//!
//! These are the [EIP-2535] interfaces. `FacetCut::action` carries the
//! `FacetCutAction` enum, which the ABI encodes as `uint8`.
//!
//! [EIP-2535]: https://eips.ethereum.org/EIPS/eip-2535
#![allow(missing_docs)]
#![allow(clippy::pub_underscore_fields)]

use alloy::sol;

sol! {
    /// Registered facet as reported by the loupe.
    #[derive(Debug, PartialEq, Eq)]
    struct Facet {
        address target;
        bytes4[] selectors;
    }

    /// Cut entry accepted by `diamondCut`.
    #[derive(Debug, PartialEq, Eq)]
    struct FacetCut {
        address target;
        uint8 action;
        bytes4[] selectors;
    }

    #[sol(rpc)]
    interface IDiamondReadable {
        function facets() external view returns (Facet[] memory diamondFacets);

        function facetFunctionSelectors(address facet)
            external
            view
            returns (bytes4[] memory selectors);

        function facetAddresses()
            external
            view
            returns (address[] memory addresses);

        function facetAddress(bytes4 selector)
            external
            view
            returns (address facet);
    }

    #[sol(rpc)]
    interface IDiamondWritable {
        event DiamondCut(FacetCut[] facetCuts, address target, bytes data);

        function diamondCut(
            FacetCut[] calldata facetCuts,
            address target,
            bytes calldata data
        ) external;
    }
}

#[cfg(test)]
mod tests {
    use alloy::sol_types::SolCall;
    use alloy_primitives::{address, fixed_bytes, Bytes};

    use super::*;

    #[test]
    fn diamond_cut_selector_matches_eip2535() {
        assert_eq!(
            IDiamondWritable::diamondCutCall::SELECTOR,
            [0x1f, 0x93, 0x1c, 0x1c]
        );
    }

    #[test]
    fn loupe_selectors_xor_to_interface_id() {
        use IDiamondReadable::*;

        let interface_id = [
            facetsCall::SELECTOR,
            facetFunctionSelectorsCall::SELECTOR,
            facetAddressesCall::SELECTOR,
            facetAddressCall::SELECTOR,
        ]
        .into_iter()
        .map(u32::from_be_bytes)
        .fold(0, |acc, selector| acc ^ selector);

        assert_eq!(interface_id, 0x48e2_b093);
    }

    #[test]
    fn encodes_action_as_uint8() {
        let call = IDiamondWritable::diamondCutCall {
            facetCuts: vec![FacetCut {
                target: address!("00000000000000000000000000000000000000aa"),
                action: 1,
                selectors: vec![fixed_bytes!("a9059cbb")],
            }],
            target: alloy_primitives::Address::ZERO,
            data: Bytes::new(),
        };

        let encoded = call.abi_encode();
        assert_eq!(encoded[..4], IDiamondWritable::diamondCutCall::SELECTOR);

        let decoded = IDiamondWritable::diamondCutCall::abi_decode(&encoded)
            .expect("should decode own encoding");
        assert_eq!(decoded.facetCuts, call.facetCuts);
    }
}

//! Inclusion and exclusion rules that scope which selectors a cut may touch.
//!
//! A rule applies to a single [`FacetCutAction`]. Rules of kind
//! [`FilterKind::Only`] form an allow list: once any exists, a candidate must
//! match one of them. Rules of kind [`FilterKind::Except`] always win.
use std::fmt;

use alloy_primitives::{Address, Selector};
use serde::{Deserialize, Serialize};

use crate::facet::FacetCutAction;

/// Whether a rule includes or excludes what it matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Only matching candidates are in scope.
    Only,
    /// Matching candidates are out of scope.
    Except,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Only => f.write_str("only"),
            FilterKind::Except => f.write_str("except"),
        }
    }
}

/// A single filter rule.
///
/// The rule matches a `(target, selector)` pair when every field it sets is
/// equal to the pair's.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FacetFilter {
    /// Action the rule applies to.
    pub action: FacetCutAction,
    /// Include or exclude.
    pub kind: FilterKind,
    /// Target the rule matches, if any.
    #[serde(default)]
    pub target: Option<Address>,
    /// Selector the rule matches, if any.
    #[serde(default)]
    pub selector: Option<Selector>,
}

impl FacetFilter {
    /// Rule including only `target` for `action`.
    #[must_use]
    pub fn only_target(action: FacetCutAction, target: Address) -> Self {
        Self {
            action,
            kind: FilterKind::Only,
            target: Some(target),
            selector: None,
        }
    }

    /// Rule including only `selector` for `action`.
    #[must_use]
    pub fn only_selector(action: FacetCutAction, selector: Selector) -> Self {
        Self {
            action,
            kind: FilterKind::Only,
            target: None,
            selector: Some(selector),
        }
    }

    /// Rule excluding `target` for `action`.
    #[must_use]
    pub fn except_target(action: FacetCutAction, target: Address) -> Self {
        Self {
            action,
            kind: FilterKind::Except,
            target: Some(target),
            selector: None,
        }
    }

    /// Rule excluding `selector` for `action`.
    #[must_use]
    pub fn except_selector(action: FacetCutAction, selector: Selector) -> Self {
        Self {
            action,
            kind: FilterKind::Except,
            target: None,
            selector: Some(selector),
        }
    }

    /// Returns true if the rule matches `target` and `selector`.
    #[must_use]
    pub fn matches(&self, target: Address, selector: Selector) -> bool {
        self.target.is_none_or(|t| t == target)
            && self.selector.is_none_or(|s| s == selector)
    }

    fn same_scope(&self, other: &FacetFilter) -> bool {
        self.target == other.target && self.selector == other.selector
    }
}

/// A malformed rule set.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// The rule names neither a target nor a selector.
    #[error("{action} `{kind}` filter must specify a target or a selector")]
    Unscoped {
        /// Action of the offending rule.
        action: FacetCutAction,
        /// Kind of the offending rule.
        kind: FilterKind,
    },
    /// The same scope is both included and excluded.
    #[error(
        "{action} filter both includes and excludes target {target:?}, \
         selector {selector:?}"
    )]
    Contradictory {
        /// Action of the offending rules.
        action: FacetCutAction,
        /// Target shared by both rules.
        target: Option<Address>,
        /// Selector shared by both rules.
        selector: Option<Selector>,
    },
}

/// Splits the rules that apply to `action` into `(only, except)`.
#[must_use]
pub fn destructure_filters(
    filters: &[FacetFilter],
    action: FacetCutAction,
) -> (Vec<FacetFilter>, Vec<FacetFilter>) {
    filters
        .iter()
        .filter(|filter| filter.action == action)
        .cloned()
        .partition(|filter| filter.kind == FilterKind::Only)
}

/// Checks that a rule set is well formed.
///
/// # Errors
///
/// * [`FilterError::Unscoped`] - a rule matches every candidate.
/// * [`FilterError::Contradictory`] - a scope is both in `only` and `except`.
pub fn validate_filters(
    only: &[FacetFilter],
    except: &[FacetFilter],
) -> Result<(), FilterError> {
    if let Some(filter) = only
        .iter()
        .chain(except)
        .find(|filter| filter.target.is_none() && filter.selector.is_none())
    {
        return Err(FilterError::Unscoped {
            action: filter.action,
            kind: filter.kind,
        });
    }

    for included in only {
        if except.iter().any(|excluded| included.same_scope(excluded)) {
            return Err(FilterError::Contradictory {
                action: included.action,
                target: included.target,
                selector: included.selector,
            });
        }
    }

    Ok(())
}

/// Returns true if `(target, selector)` is in scope under `only` and
/// `except`.
#[must_use]
pub fn selector_is_filtered(
    only: &[FacetFilter],
    except: &[FacetFilter],
    target: Address,
    selector: Selector,
) -> bool {
    if !only.is_empty()
        && !only.iter().any(|filter| filter.matches(target, selector))
    {
        return false;
    }

    !except.iter().any(|filter| filter.matches(target, selector))
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, fixed_bytes};
    use proptest::prelude::*;

    use super::*;

    const A: Address = address!("00000000000000000000000000000000000000aa");
    const B: Address = address!("00000000000000000000000000000000000000bb");
    const TRANSFER: Selector = fixed_bytes!("a9059cbb");
    const BALANCE_OF: Selector = fixed_bytes!("70a08231");

    #[test]
    fn destructures_by_action_and_kind() {
        let filters = vec![
            FacetFilter::only_target(FacetCutAction::Add, A),
            FacetFilter::except_selector(FacetCutAction::Add, TRANSFER),
            FacetFilter::only_target(FacetCutAction::Remove, B),
        ];

        let (only, except) = destructure_filters(&filters, FacetCutAction::Add);
        assert_eq!(only, vec![filters[0].clone()]);
        assert_eq!(except, vec![filters[1].clone()]);

        let (only, except) =
            destructure_filters(&filters, FacetCutAction::Replace);
        assert!(only.is_empty());
        assert!(except.is_empty());
    }

    #[test]
    fn everything_is_in_scope_without_rules() {
        assert!(selector_is_filtered(&[], &[], A, TRANSFER));
    }

    #[test]
    fn only_rules_form_an_allow_list() {
        let only = [FacetFilter::only_target(FacetCutAction::Add, A)];

        assert!(selector_is_filtered(&only, &[], A, TRANSFER));
        assert!(!selector_is_filtered(&only, &[], B, TRANSFER));
    }

    #[test]
    fn except_wins_over_only() {
        let only = [FacetFilter::only_target(FacetCutAction::Add, A)];
        let except =
            [FacetFilter::except_selector(FacetCutAction::Add, TRANSFER)];

        assert!(!selector_is_filtered(&only, &except, A, TRANSFER));
        assert!(selector_is_filtered(&only, &except, A, BALANCE_OF));
    }

    #[test]
    fn rule_with_both_fields_matches_exact_pair() {
        let except = [FacetFilter {
            action: FacetCutAction::Replace,
            kind: FilterKind::Except,
            target: Some(A),
            selector: Some(TRANSFER),
        }];

        assert!(!selector_is_filtered(&[], &except, A, TRANSFER));
        assert!(selector_is_filtered(&[], &except, B, TRANSFER));
        assert!(selector_is_filtered(&[], &except, A, BALANCE_OF));
    }

    #[test]
    fn rejects_unscoped_rule() {
        let except = [FacetFilter {
            action: FacetCutAction::Remove,
            kind: FilterKind::Except,
            target: None,
            selector: None,
        }];

        assert_eq!(
            validate_filters(&[], &except),
            Err(FilterError::Unscoped {
                action: FacetCutAction::Remove,
                kind: FilterKind::Except,
            })
        );
    }

    #[test]
    fn rejects_contradictory_rules() {
        let only = [FacetFilter::only_selector(FacetCutAction::Add, TRANSFER)];
        let except =
            [FacetFilter::except_selector(FacetCutAction::Add, TRANSFER)];

        assert!(matches!(
            validate_filters(&only, &except),
            Err(FilterError::Contradictory { .. })
        ));
    }

    #[test]
    fn accepts_disjoint_rules() {
        let only = [FacetFilter::only_target(FacetCutAction::Add, A)];
        let except =
            [FacetFilter::except_selector(FacetCutAction::Add, TRANSFER)];

        assert_eq!(validate_filters(&only, &except), Ok(()));
    }

    #[test]
    fn deserializes_rule_without_optional_fields() {
        let filter: FacetFilter = serde_json::from_str(
            r#"{"action":"REMOVE","kind":"except","selector":"0xa9059cbb"}"#,
        )
        .expect("should deserialize");

        assert_eq!(
            filter,
            FacetFilter::except_selector(FacetCutAction::Remove, TRANSFER)
        );
    }

    proptest! {
        #[test]
        fn excluded_pair_is_never_in_scope(
            target in any::<u8>(),
            selector in any::<u8>(),
            allow_target in any::<bool>(),
        ) {
            let target = Address::with_last_byte(target);
            let selector = Selector::from([0, 0, 0, selector]);
            let only = if allow_target {
                vec![FacetFilter::only_target(FacetCutAction::Add, target)]
            } else {
                vec![]
            };
            let except = [FacetFilter {
                action: FacetCutAction::Add,
                kind: FilterKind::Except,
                target: Some(target),
                selector: Some(selector),
            }];

            prop_assert!(!selector_is_filtered(
                &only, &except, target, selector
            ));
        }
    }
}

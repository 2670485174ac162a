//! Non-fatal findings produced while previewing a cut.
use std::fmt;

use alloy_primitives::{Address, Selector};
use tracing::warn;

use crate::facet::FacetCutAction;

/// Something an operator should review before submitting a cut.
///
/// Diagnostics never change the computed cuts.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Diagnostic {
    /// A reconciliation pass found nothing to do.
    NothingToApply {
        /// Action of the pass.
        action: FacetCutAction,
    },
    /// A selector appears in more than one grouped cut.
    SelectorConflict {
        /// The selector.
        selector: Selector,
        /// Target of the cut where the selector was seen again.
        target: Address,
    },
}

impl Diagnostic {
    /// Logs the diagnostic at `WARN` level.
    pub(crate) fn emit(&self) {
        match self {
            Diagnostic::NothingToApply { action } => {
                warn!(%action, "{self}");
            }
            Diagnostic::SelectorConflict { selector, target } => {
                warn!(
                    %selector,
                    %target,
                    "selector is defined in multiple cuts"
                );
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NothingToApply { action: FacetCutAction::Add } => {
                f.write_str("no selectors were added to FacetCut")
            }
            Diagnostic::NothingToApply { action: FacetCutAction::Replace } => {
                f.write_str("no selectors were replaced in FacetCut")
            }
            Diagnostic::NothingToApply { action: FacetCutAction::Remove } => {
                f.write_str("no selectors were removed from FacetCut")
            }
            Diagnostic::SelectorConflict { selector, target } => write!(
                f,
                "selector: {selector}, target: {target} is defined in \
                 multiple cuts"
            ),
        }
    }
}

//! Renders a cut plan as a table, one row per selector.
use std::fmt::{self, Display};

use crate::facet::FacetCut;

const HEADER_ACTION: &str = "Action";
const HEADER_TARGET: &str = "Target";
const HEADER_SELECTOR: &str = "Selector";

/// Table view of a list of cuts.
#[derive(Clone, Copy, Debug)]
pub struct Report<'a> {
    cuts: &'a [FacetCut],
}

impl<'a> Report<'a> {
    /// Wraps `cuts` for rendering.
    #[must_use]
    pub fn new(cuts: &'a [FacetCut]) -> Self {
        Report { cuts }
    }

    fn column_width(
        &self,
        column_value: impl FnMut(&FacetCut) -> usize,
        header: &str,
    ) -> usize {
        self.cuts
            .iter()
            .map(column_value)
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or_default()
    }
}

impl Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Calculating the width of table columns.
        let width1 = self
            .column_width(|cut| cut.action.name().len(), HEADER_ACTION);
        let width2 = self.column_width(
            |cut| cut.target.to_string().len(),
            HEADER_TARGET,
        );
        let width3 = self.column_width(
            |cut| {
                cut.selectors
                    .iter()
                    .map(|selector| selector.to_string().len())
                    .max()
                    .unwrap_or_default()
            },
            HEADER_SELECTOR,
        );

        writeln!(
            f,
            "| {:<width1$} | {:<width2$} | {:<width3$} |",
            HEADER_ACTION, HEADER_TARGET, HEADER_SELECTOR,
        )?;
        writeln!(
            f,
            "| {:->width1$} | {:->width2$} | {:->width3$} |",
            "", "", "",
        )?;

        for cut in self.cuts {
            let action = cut.action.name();
            let target = cut.target.to_string();
            for selector in &cut.selectors {
                let selector = selector.to_string();
                writeln!(
                    f,
                    "| {:<width1$} | {:<width2$} | {:<width3$} |",
                    action, target, selector,
                )?;
            }
        }

        Ok(())
    }
}

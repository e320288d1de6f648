//! The flat genepanels export.
//!
//! [`build`] joins current panels with their current links into sorted
//! [`GenepanelsRow`]s and [`export`] renders and names the file.
//! [`compare_exports`] diffs two exports at panel level, then row by row.
//!
//! ## Layouts
//!
//! | Layout | Columns |
//! |--------|---------|
//! | `default` | `panel_id`, `panel_name`, `hgnc_id` |
//! | `legacy` | `clinical_indication`, `panel_name_version`, `hgnc_id`, `panel_id` |
//!
//! [`GenepanelsRow`]: crate::core::genepanels::GenepanelsRow

pub mod builder;
pub mod compare;
pub mod export;

pub use builder::{build, build_with_layout, BuildError};
pub use compare::{compare_exports, ExportComparison};

/// Column layout of a genepanels file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Layout {
    #[default]
    Default,
    /// Four columns, led by the clinical indication
    Legacy,
}

impl Layout {
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Default => &["panel_id", "panel_name", "hgnc_id"],
            Self::Legacy => &[
                "clinical_indication",
                "panel_name_version",
                "hgnc_id",
                "panel_id",
            ],
        }
    }
}

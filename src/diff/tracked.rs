use super::{FieldValue, Tracked};
use crate::core::gene::{Gene, PanelGeneLink};
use crate::core::genepanels::GenepanelsRow;
use crate::core::panel::Panel;

impl Tracked for Panel {
    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("name", FieldValue::text(&self.name)),
            ("version", FieldValue::Version(self.version)),
            (
                "clinical_indication_code",
                FieldValue::optional(self.clinical_indication_code.as_deref(), FieldValue::text),
            ),
            ("signoff_date", FieldValue::optional(self.signoff_date, FieldValue::Date)),
            ("source", FieldValue::text(self.source.as_str())),
        ]
    }
}

impl Tracked for Gene {
    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("symbol", FieldValue::optional(self.symbol.as_deref(), FieldValue::text)),
            ("confidence_level", FieldValue::Confidence(self.confidence_level)),
            (
                "mode_of_inheritance",
                FieldValue::optional(self.mode_of_inheritance.as_deref(), FieldValue::text),
            ),
        ]
    }
}

impl Tracked for PanelGeneLink {
    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![("confidence_level", FieldValue::Confidence(self.confidence_level))]
    }
}

impl Tracked for GenepanelsRow {
    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("panel_name", FieldValue::text(&self.panel_name)),
            (
                "clinical_indication",
                FieldValue::optional(self.clinical_indication.as_deref(), FieldValue::text),
            ),
        ]
    }
}

/// The parts of a panel the test directory spreadsheet can speak to
///
/// The spreadsheet carries no sign-off dates and usually no versions, so
/// comparing it against the database goes through this view. Versions are
/// compared only when both sides are built with `compare_version`.
#[derive(Debug, Clone, Copy)]
pub struct IndicationView<'a> {
    pub panel: &'a Panel,
    pub compare_version: bool,
}

impl<'a> IndicationView<'a> {
    /// Views over the current panels of `panels`
    pub fn current(panels: &'a [Panel], compare_version: bool) -> Vec<Self> {
        panels
            .iter()
            .filter(|p| p.is_current())
            .map(|panel| Self {
                panel,
                compare_version,
            })
            .collect()
    }
}

impl Tracked for IndicationView<'_> {
    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        let mut fields = vec![
            ("name", FieldValue::text(&self.panel.name)),
            (
                "clinical_indication_code",
                FieldValue::optional(self.panel.clinical_indication_code.as_deref(), FieldValue::text),
            ),
            ("source", FieldValue::text(self.panel.source.as_str())),
        ];
        if self.compare_version {
            fields.push(("version", FieldValue::Version(self.panel.version)));
        }
        fields
    }
}

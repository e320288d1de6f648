//! Rendering typed entities back into database rows.
//!
//! The inverse direction (rows to entities) lives in the canonicalizer,
//! because it has to cope with foreign column names and vocabularies.

use super::{columns, Row};
use crate::core::gene::{Gene, PanelGeneLink};
use crate::core::panel::Panel;

fn insert(row: &mut Row, column: &str, value: impl ToString) {
    row.insert(column.to_string(), value.to_string());
}

pub fn panel_row(panel: &Panel) -> Row {
    let mut row = Row::new();
    insert(&mut row, columns::PANEL_ID, &panel.panel_id);
    insert(&mut row, columns::PANEL_NAME, &panel.name);
    insert(&mut row, columns::PANEL_VERSION, panel.version);
    insert(&mut row, columns::PANEL_TYPE, panel.source);
    insert(&mut row, columns::STATUS, panel.status);
    if let Some(code) = &panel.clinical_indication_code {
        insert(&mut row, columns::CLINICAL_INDICATION_CODE, code);
    }
    if let Some(date) = panel.signoff_date {
        insert(&mut row, columns::SIGNOFF_DATE, date.format("%Y-%m-%d"));
    }
    row
}

pub fn gene_row(gene: &Gene) -> Row {
    let mut row = Row::new();
    insert(&mut row, columns::HGNC_ID, gene.hgnc_id);
    insert(&mut row, columns::CONFIDENCE_LEVEL, gene.confidence_level);
    if let Some(symbol) = &gene.symbol {
        insert(&mut row, columns::SYMBOL, symbol);
    }
    if let Some(moi) = &gene.mode_of_inheritance {
        insert(&mut row, columns::MODE_OF_INHERITANCE, moi);
    }
    row
}

pub fn link_row(link: &PanelGeneLink) -> Row {
    let mut row = Row::new();
    insert(&mut row, columns::PANEL_ID, &link.panel_id);
    insert(&mut row, columns::PANEL_VERSION, link.panel_version);
    insert(&mut row, columns::HGNC_ID, link.hgnc_id);
    insert(&mut row, columns::CONFIDENCE_LEVEL, link.confidence_level);
    insert(&mut row, columns::STATUS, link.status);
    row
}

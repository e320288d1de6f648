use std::io::Write;

use chrono::NaiveDate;

use super::Layout;
use crate::core::genepanels::GenepanelsRow;

/// Render rows as a headerless tab-delimited genepanels file
#[must_use]
pub fn render(rows: &[GenepanelsRow], layout: Layout) -> String {
    let mut out = String::new();
    for row in rows {
        let hgnc = row.hgnc_id.to_string();
        let line = match layout {
            Layout::Default => [row.panel_id.as_str(), row.panel_name.as_str(), hgnc.as_str()].join("\t"),
            Layout::Legacy => [
                row.clinical_indication.as_deref().unwrap_or_default(),
                row.panel_name.as_str(),
                hgnc.as_str(),
                row.panel_id.as_str(),
            ]
            .join("\t"),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Write the rendered export, returning its digest
///
/// # Errors
///
/// Returns any I/O error from `writer`.
pub fn write_genepanels<W: Write>(
    rows: &[GenepanelsRow],
    layout: Layout,
    mut writer: W,
) -> std::io::Result<String> {
    let rendered = render(rows, layout);
    writer.write_all(rendered.as_bytes())?;
    writer.flush()?;
    Ok(export_digest(&rendered))
}

/// MD5 hex digest of a rendered export
#[must_use]
pub fn export_digest(rendered: &str) -> String {
    format!("{:x}", md5::compute(rendered.as_bytes()))
}

/// `{yymmdd}_genepanels.tsv`
#[must_use]
pub fn default_file_name(date: NaiveDate) -> String {
    format!("{}_genepanels.tsv", date.format("%y%m%d"))
}

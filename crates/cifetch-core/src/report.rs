//! Plain-text tables for console output

use crate::types::{ContainerFile, FileReference};

/// Render rows as a `|`-separated table padded to the widest cell per column
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return "(no rows)".to_string();
    }

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_row(headers.to_vec()));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in rows {
        let cells = (0..headers.len())
            .map(|i| row.get(i).map(String::as_str).unwrap_or(""))
            .collect();
        lines.push(format_row(cells));
    }

    lines.join("\n")
}

/// Table of extracted references: `filename | file_id | container_id`
pub fn reference_table(references: &[FileReference]) -> String {
    let rows: Vec<Vec<String>> = references
        .iter()
        .map(|r| {
            vec![
                r.filename.clone().unwrap_or_default(),
                r.file_id.clone(),
                r.container_id.clone().unwrap_or_default(),
            ]
        })
        .collect();
    render_table(&["filename", "file_id", "container_id"], &rows)
}

/// Table of a container listing: `path | file_id | bytes | source`
pub fn container_file_table(files: &[ContainerFile]) -> String {
    let rows: Vec<Vec<String>> = files
        .iter()
        .map(|f| {
            vec![
                f.path.clone().unwrap_or_default(),
                f.id.clone(),
                f.bytes.map(|b| b.to_string()).unwrap_or_default(),
                f.source.clone().unwrap_or_default(),
            ]
        })
        .collect();
    render_table(&["path", "file_id", "bytes", "source"], &rows)
}

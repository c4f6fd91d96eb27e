//! Spreadsheet export: a "Resumo" sheet with one summary row per result,
//! followed by one sheet per result listing its events.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::diagnose::outcome::DiagnosisResult;
use crate::error::FibraError;
use crate::model::Reading;

pub const SUMMARY_SHEET: &str = "Resumo";

const SUMMARY_HEADERS: [&str; 12] = [
    "Fibra",
    "Período",
    "Formato",
    "Comprimento esperado (km)",
    "Comprimento medido (km)",
    "Perda total (dB)",
    "Perda máxima (dB)",
    "Comprimento de onda (nm)",
    "Eventos",
    "Eventos críticos",
    "Estado",
    "Motivo",
];

const EVENT_HEADERS: [&str; 6] = [
    "Evento",
    "Distância (km)",
    "Perda (dB)",
    "Reflectância (dB)",
    "P. Total (dB)",
    "Crítico",
];

/// Excel's limit on worksheet name length.
const MAX_SHEET_NAME: usize = 31;

/// Write `results` to an xlsx workbook at `path`.
///
/// Events with a loss above `critical_loss_db` are flagged and highlighted.
pub fn write_workbook(
    path: &Path,
    results: &[DiagnosisResult],
    critical_loss_db: Decimal,
) -> Result<(), FibraError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let critical = Format::new().set_font_color("#C00000");

    let sheet = workbook.add_worksheet();
    sheet.set_name(SUMMARY_SHEET)?;
    write_header(sheet, &SUMMARY_HEADERS, &header)?;
    for (i, r) in results.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &r.fiber_id)?;
        sheet.write_string(row, 1, r.period.as_deref().unwrap_or(""))?;
        sheet.write_string(row, 2, &r.source_format)?;
        write_decimal(sheet, row, 3, r.expected_length_km)?;
        write_decimal(sheet, row, 4, r.measured_length_km)?;
        write_decimal(sheet, row, 5, r.total_loss_db)?;
        write_decimal(sheet, row, 6, r.max_allowed_loss_db)?;
        if let Some(nm) = r.wavelength_nm {
            sheet.write_number(row, 7, nm)?;
        }
        sheet.write_number(row, 8, r.event_count() as f64)?;
        sheet.write_number(row, 9, r.critical_events as f64)?;
        sheet.write_string(row, 10, r.status.to_string())?;
        sheet.write_string(row, 11, &r.reason)?;
    }
    sheet.set_column_width(0, 16)?;
    sheet.set_column_width(11, 60)?;

    let mut taken: HashSet<String> = HashSet::from([SUMMARY_SHEET.to_lowercase()]);
    for r in results {
        let name = unique_sheet_name(&r.fiber_id, &mut taken);
        let sheet = workbook.add_worksheet();
        sheet.set_name(&name)?;
        write_header(sheet, &EVENT_HEADERS, &header)?;
        for (i, event) in r.events.iter().enumerate() {
            let row = i as u32 + 1;
            match event.label {
                Some(ref label) => sheet.write_string(row, 0, label)?,
                None => sheet.write_number(row, 0, row)?,
            };
            write_reading(sheet, row, 1, event.position_km.as_ref())?;
            write_reading(sheet, row, 2, event.loss_db.as_ref())?;
            write_reading(sheet, row, 3, event.reflectance_db.as_ref())?;
            write_reading(sheet, row, 4, event.cumulative_loss_db.as_ref())?;
            if event.is_critical(critical_loss_db) {
                sheet.write_string_with_format(row, 5, "sim", &critical)?;
            }
        }
        sheet.set_column_width(1, 14)?;
    }

    workbook.save(path)?;
    tracing::debug!(path = %path.display(), results = results.len(), "workbook written");
    Ok(())
}

fn write_header(sheet: &mut Worksheet, headers: &[&str], format: &Format) -> Result<(), FibraError> {
    for (col, title) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, format)?;
    }
    Ok(())
}

fn write_decimal(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<Decimal>,
) -> Result<(), FibraError> {
    if let Some(v) = value.and_then(|v| v.to_f64()) {
        sheet.write_number(row, col, v)?;
    }
    Ok(())
}

fn write_reading(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    reading: Option<&Reading>,
) -> Result<(), FibraError> {
    match reading {
        Some(Reading::Value(v)) => write_decimal(sheet, row, col, Some(*v)),
        Some(Reading::Raw(s)) => {
            sheet.write_string(row, col, s)?;
            Ok(())
        }
        None => Ok(()),
    }
}

/// A legal worksheet name derived from `fiber_id`, distinct (ignoring case)
/// from every name in `taken`.
fn unique_sheet_name(fiber_id: &str, taken: &mut HashSet<String>) -> String {
    let cleaned: String = fiber_id
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches('\'').trim();
    let base = if cleaned.is_empty() { "Fibra" } else { cleaned };

    let mut name = truncate(base, MAX_SHEET_NAME);
    let mut n = 2;
    while taken.contains(&name.to_lowercase()) {
        let suffix = format!(" ({n})");
        name = format!("{}{suffix}", truncate(base, MAX_SHEET_NAME - suffix.len()));
        n += 1;
    }
    taken.insert(name.to_lowercase());
    name
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

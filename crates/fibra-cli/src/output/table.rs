use fibra_core::diagnose::compare::PeriodComparison;
use fibra_core::diagnose::outcome::DiagnosisResult;
use fibra_core::history::SummaryRow;
use fibra_core::model::{EventRecord, FieldRecord, Reading};
use fibra_core::parsing::lookup::LookupHit;
use fibra_core::parsing::ParsedDocument;
use rust_decimal::Decimal;

fn opt(value: Option<Decimal>, unit: &str) -> String {
    match value {
        Some(v) => format!("{} {}", v.normalize(), unit),
        None => "-".into(),
    }
}

fn reading(value: &Option<Reading>) -> String {
    match value {
        Some(r) => r.to_string(),
        None => String::new(),
    }
}

fn provenance(field: &FieldRecord) -> String {
    match (&field.source, &field.evidence) {
        (Some(src), Some(ev)) => format!("  [{}, page {}]", src, ev.page_number),
        (Some(src), None) => format!("  [{}]", src),
        _ => String::new(),
    }
}

pub fn print_diagnosis(result: &DiagnosisResult, show_events: bool) {
    match result.period {
        Some(ref period) => println!("=== {} ({}) ===\n", result.fiber_id, period),
        None => println!("=== {} ===\n", result.fiber_id),
    }

    println!("  Status: {} ({})\n", result.status, result.reason);

    println!("  Expected length:   {}", opt(result.expected_length_km, "km"));
    println!(
        "  Measured length:   {}{}",
        opt(result.measured_length_km, "km"),
        provenance(&result.fields.fiber_end)
    );
    println!(
        "  Total loss:        {}{}",
        opt(result.total_loss_db, "dB"),
        provenance(&result.fields.total_loss)
    );
    let budget = match result.wavelength_nm {
        Some(nm) => format!("{} ({} nm)", opt(result.max_allowed_loss_db, "dB"), nm),
        None => opt(result.max_allowed_loss_db, "dB"),
    };
    println!("  Max allowed loss:  {}", budget);
    println!(
        "  Events:            {} ({} critical)",
        result.event_count(),
        result.critical_events
    );

    if show_events && !result.events.is_empty() {
        println!();
        print_events(&result.events);
    }

    if !result.warnings.is_empty() {
        println!("\n  Warnings:");
        for w in &result.warnings {
            println!("    - {}", w);
        }
    }
}

pub fn print_comparison(cmp: &PeriodComparison) {
    println!("=== {}: {} ===\n", cmp.fiber_id, cmp.period_label());
    println!(
        "  Status: {} -> {} ({})",
        cmp.prior_status, cmp.current_status, cmp.trend
    );
    match cmp.loss_variation_db {
        Some(v) if v > Decimal::ZERO => println!("  Total loss variation: +{} dB", v.round_dp(2)),
        Some(v) => println!("  Total loss variation: {} dB", v.round_dp(2)),
        None => println!("  Total loss variation: - (loss missing in one period)"),
    }
}

fn print_events(events: &[EventRecord]) {
    let rows: Vec<[String; 5]> = events
        .iter()
        .map(|e| {
            [
                e.label.clone().unwrap_or_default(),
                reading(&e.position_km),
                reading(&e.loss_db),
                reading(&e.reflectance_db),
                reading(&e.cumulative_loss_db),
            ]
        })
        .collect();
    let header = ["Event", "Dist (km)", "Loss (dB)", "Refl (dB)", "Total (dB)"];

    let mut widths = header.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let line = |cells: [&str; 5]| {
        let parts: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(c, w)| format!("{:<w$}", c, w = w))
            .collect();
        println!("  {}", parts.join("  ").trim_end());
    };
    line(header);
    for row in &rows {
        line([
            row[0].as_str(),
            row[1].as_str(),
            row[2].as_str(),
            row[3].as_str(),
            row[4].as_str(),
        ]);
    }
}

/// Render parsed fields and the event table.
pub fn format_parsed(parsed: &ParsedDocument) -> String {
    let mut out = String::new();
    out.push_str(&format!("Pages: {}\n\n", parsed.page_count));

    for field in parsed.fields.iter() {
        let value = match field.value {
            Some(v) => v.normalize().to_string(),
            None => "not found".into(),
        };
        out.push_str(&format!("  {:<18} {}{}\n", field.kind.to_string(), value, provenance(field)));
        if let Some(ref ev) = field.evidence {
            out.push_str(&format!("  {:<18} \"{}\"\n", "", ev.text.trim()));
        }
    }

    out.push_str(&format!("\nEvents: {}\n", parsed.events.len()));
    for e in &parsed.events {
        out.push_str(&format!(
            "  {:<12} {:>10} km  {:>8} dB\n",
            e.label.as_deref().unwrap_or("-"),
            reading(&e.position_km),
            reading(&e.loss_db)
        ));
    }

    out
}

pub fn print_history(rows: &[SummaryRow]) {
    let max_id = rows.iter().map(|r| r.fiber_id.len()).max().unwrap_or(8).max(8);
    println!(
        "  {:<width$}  {:<8}  {:>10}  {:>10}  {:>8}  Status",
        "Fiber",
        "Period",
        "Length",
        "Loss",
        "Critical",
        width = max_id
    );
    for r in rows {
        println!(
            "  {:<width$}  {:<8}  {:>10}  {:>10}  {:>8}  {}",
            r.fiber_id,
            r.period.as_deref().unwrap_or("-"),
            opt(r.measured_length_km, "km"),
            opt(r.total_loss_db, "dB"),
            r.critical_events,
            r.status,
            width = max_id
        );
    }
}

pub fn print_lookup(hit: &LookupHit) {
    let loc = &hit.location;
    let place = match loc.table {
        Some(t) => format!("page {}, table {}, row {}, column {}", loc.page_number, t, loc.row, loc.column),
        None => format!("page {}, line {}, column {}", loc.page_number, loc.row, loc.column),
    };
    println!("  Match:  \"{}\" ({:.0}% similar)", hit.cell, hit.score);
    println!("  At:     {}", place);
    match hit.value_below {
        Some(ref value) => println!("  Below:  {}", value),
        None => println!("  Below:  - (last row, nothing below)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fibra_core::model::{FieldKind, LocatedFields, StrategyKind};

    #[test]
    fn test_format_parsed_shows_provenance() {
        let mut fields = LocatedFields::empty();
        fields.fiber_end = FieldRecord::found(
            FieldKind::FiberEnd,
            Decimal::new(12300, 3),
            StrategyKind::TableColumn,
            None,
        );
        let parsed = ParsedDocument {
            page_count: 2,
            fields,
            events: vec![],
            warnings: vec![],
        };
        let text = format_parsed(&parsed);
        assert!(text.contains("Pages: 2"));
        assert!(text.contains("12.3  [table column]"), "{text}");
        assert!(text.contains("not found"));
    }
}

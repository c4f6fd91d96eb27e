use crate::extraction::PageContent;
use crate::model::{EventRecord, Reading};
use crate::parsing::columns::{column_map, ColumnMap, ColumnRole};

/// Collect event rows from every event table, in document order.
///
/// A table is an event table when a distance and/or loss column was
/// identified. Numeric cells that do not parse are kept as text; only
/// entirely blank rows are dropped.
pub fn extract_events(pages: &[PageContent]) -> Vec<EventRecord> {
    let mut events = Vec::new();

    for page in pages {
        for table in &page.tables {
            let Some(map) = column_map(table) else { continue };
            if !map.is_event_table() {
                continue;
            }
            for row in table.body() {
                let event = read_row(row, &map);
                if event != EventRecord::default() {
                    events.push(event);
                }
            }
        }
    }

    events
}

fn read_row(row: &[String], map: &ColumnMap) -> EventRecord {
    let cell = |role: ColumnRole| {
        map.index_of(role)
            .and_then(|idx| row.get(idx))
            .map(String::as_str)
    };
    let reading = |role: ColumnRole| cell(role).and_then(Reading::from_cell);

    EventRecord {
        label: cell(ColumnRole::Event)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        position_km: reading(ColumnRole::Distance),
        loss_db: reading(ColumnRole::Loss),
        reflectance_db: reading(ColumnRole::Reflectance),
        cumulative_loss_db: reading(ColumnRole::CumulativeLoss),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::Table;
    use rust_decimal_macros::dec;

    fn page_with(rows: &[&[&str]]) -> PageContent {
        PageContent {
            page_number: 1,
            lines: vec![],
            tables: vec![Table::new(
                rows.iter()
                    .map(|r| r.iter().map(|s| s.to_string()).collect())
                    .collect(),
            )],
        }
    }

    #[test]
    fn test_event_rows_in_order() {
        let pages = vec![page_with(&[
            &["Evento", "Distância (km)", "Perda (dB)", "Reflect. dB", "P. Total dB"],
            &["1", "0,000", "0,25", "-45,1", "0,25"],
            &["2", "5,120", "", "", "1,40"],
        ])];
        let events = extract_events(&pages);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].label.as_deref(), Some("1"));
        assert_eq!(events[0].reflectance_db, Some(Reading::Value(dec!(-45.1))));
        assert_eq!(events[1].position_km, Some(Reading::Value(dec!(5.120))));
        assert_eq!(events[1].loss_db, None);
        assert_eq!(events[1].cumulative_loss_db, Some(Reading::Value(dec!(1.40))));
    }

    #[test]
    fn test_unparseable_cells_are_kept() {
        let pages = vec![page_with(&[
            &["Evento", "Dist", "Perda"],
            &["Conector", "n/d", "alta"],
            &["", "", ""],
        ])];
        let events = extract_events(&pages);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].position_km, Some(Reading::Raw("n/d".into())));
        assert_eq!(events[0].loss_db, Some(Reading::Raw("alta".into())));
    }

    #[test]
    fn test_loss_only_table_is_an_event_table() {
        let pages = vec![page_with(&[&["Tipo", "Loss"], &["Splice", "0,08"]])];
        let events = extract_events(&pages);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].label, None);
    }

    #[test]
    fn test_non_event_table_ignored() {
        let pages = vec![page_with(&[&["Operador", "Data"], &["Ana", "2024-01-02"]])];
        assert!(extract_events(&pages).is_empty());
    }
}

use serde::{Deserialize, Serialize};

use crate::extraction::Table;
use crate::parsing::normalize::normalize_header;

/// The meaning of an event-table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Event,
    Distance,
    Loss,
    CumulativeLoss,
    Reflectance,
}

/// Classify a header cell. Rules are tried in order; the first match wins.
pub fn classify_column(header: &str) -> Option<ColumnRole> {
    let nh = normalize_header(header);
    if nh.is_empty() {
        return None;
    }

    let mentions_loss = nh.contains("perda") || nh.contains("loss") || nh.contains("atenua");
    if nh.contains("event") {
        Some(ColumnRole::Event)
    } else if nh.contains("dist") {
        Some(ColumnRole::Distance)
    } else if mentions_loss && !nh.contains("total") && !nh.contains("cumul") {
        Some(ColumnRole::Loss)
    } else if nh.contains("p. total")
        || nh.contains("p total")
        || (mentions_loss && (nh.contains("total") || nh.contains("cumul")))
    {
        Some(ColumnRole::CumulativeLoss)
    } else if nh.contains("reflect") {
        Some(ColumnRole::Reflectance)
    } else {
        None
    }
}

/// Column roles for one table, by column index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    roles: Vec<Option<ColumnRole>>,
}

impl ColumnMap {
    /// Map a header row. When two columns claim the same role the leftmost
    /// keeps it.
    pub fn from_header(header: &[String]) -> Self {
        let mut roles: Vec<Option<ColumnRole>> = Vec::with_capacity(header.len());
        for cell in header {
            let role = classify_column(cell).filter(|r| !roles.contains(&Some(*r)));
            roles.push(role);
        }
        ColumnMap { roles }
    }

    pub fn index_of(&self, role: ColumnRole) -> Option<usize> {
        self.roles.iter().position(|r| *r == Some(role))
    }

    pub fn has(&self, role: ColumnRole) -> bool {
        self.index_of(role).is_some()
    }

    /// Whether rows of this table describe fiber events.
    pub fn is_event_table(&self) -> bool {
        self.has(ColumnRole::Distance) || self.has(ColumnRole::Loss)
    }
}

/// Column map of a table that can be read column-wise; `None` for malformed
/// tables.
pub fn column_map(table: &Table) -> Option<ColumnMap> {
    table.check_shape().ok()?;
    table.header().map(ColumnMap::from_header)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_portuguese_headers() {
        assert_eq!(classify_column("Evento"), Some(ColumnRole::Event));
        assert_eq!(classify_column("Distância (km)"), Some(ColumnRole::Distance));
        assert_eq!(classify_column("Perda (dB)"), Some(ColumnRole::Loss));
        assert_eq!(classify_column("P. Total dB"), Some(ColumnRole::CumulativeLoss));
        assert_eq!(classify_column("Reflect. dB"), Some(ColumnRole::Reflectance));
        assert_eq!(classify_column("Tipo"), None);
    }

    #[test]
    fn test_english_headers() {
        assert_eq!(classify_column("Event #"), Some(ColumnRole::Event));
        assert_eq!(classify_column("Distance"), Some(ColumnRole::Distance));
        assert_eq!(classify_column("Splice Loss"), Some(ColumnRole::Loss));
        assert_eq!(classify_column("Total Loss (dB)"), Some(ColumnRole::CumulativeLoss));
        assert_eq!(classify_column("Cumulative loss"), Some(ColumnRole::CumulativeLoss));
        assert_eq!(classify_column("Reflectance"), Some(ColumnRole::Reflectance));
    }

    #[test]
    fn test_duplicate_role_keeps_leftmost() {
        let map = ColumnMap::from_header(&header(&["Dist A", "Dist B", "Perda"]));
        assert_eq!(map.index_of(ColumnRole::Distance), Some(0));
        assert_eq!(map.index_of(ColumnRole::Loss), Some(2));
        assert!(map.is_event_table());
    }

    #[test]
    fn test_non_event_table() {
        let map = ColumnMap::from_header(&header(&["Operador", "Data"]));
        assert!(!map.is_event_table());
    }
}

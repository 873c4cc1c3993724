//! Restaurant floor tables.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    #[default]
    Available,
    Occupied,
    Reserved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RestaurantTable {
    pub id: String,
    pub number: u32,
    pub name: String,
    pub seats: u32,
    pub section: String,
    pub status: TableStatus,
    /// Name of the server looking after the table.
    pub server: Option<String>,
}

impl RestaurantTable {
    pub fn new(number: u32, seats: u32, section: impl Into<String>) -> Self {
        RestaurantTable {
            id: crate::new_id(),
            number,
            name: format!("Table {number}"),
            seats,
            section: section.into(),
            status: TableStatus::Available,
            server: None,
        }
    }

    pub(crate) fn occupy(&mut self, server: &str) {
        self.status = TableStatus::Occupied;
        self.server = Some(server.to_string());
    }

    pub(crate) fn release(&mut self) {
        self.status = TableStatus::Available;
        self.server = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occupy_and_release() {
        let mut t = RestaurantTable::new(4, 6, "Patio");
        assert_eq!(t.name, "Table 4");
        t.occupy("Dana");
        assert_eq!(t.status, TableStatus::Occupied);
        assert_eq!(t.server.as_deref(), Some("Dana"));
        t.release();
        assert_eq!(t.status, TableStatus::Available);
        assert!(t.server.is_none());
    }
}

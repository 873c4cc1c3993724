//! JSON export of store snapshots.

use std::io::Write;
use std::path::Path;

use aura_core::Snapshot;
use tracing::{error, info};

use crate::error::RegisterResult;

/// Writes `snapshot` as pretty JSON.
pub fn write_json<W: Write>(snapshot: &Snapshot, mut writer: W) -> RegisterResult<()> {
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writer.flush()?;
    Ok(())
}

/// Writes `snapshot` to `path`, creating parent directories.
pub fn export_to_file(snapshot: &Snapshot, path: &Path) -> RegisterResult<()> {
    let result = (|| -> RegisterResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        write_json(snapshot, std::io::BufWriter::new(file))
    })();

    match &result {
        Ok(()) => info!(
            ?path,
            orders = snapshot.orders.len(),
            transactions = snapshot.transactions.len(),
            "snapshot exported"
        ),
        Err(e) => error!(?path, error = %e, "snapshot export failed"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::fixtures::open_store;

    #[test]
    fn test_write_json_shape() {
        let store = open_store();
        let mut buf = Vec::new();
        write_json(&store.snapshot(), &mut buf).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        for key in ["products", "customers", "shifts", "orders", "transactions"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["shifts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_export_to_file_reads_back() {
        let store = open_store();
        let dir = std::env::temp_dir().join(format!("aura-export-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("snapshot.json");

        export_to_file(&store.snapshot(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let back: Snapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(back, store.snapshot());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_export_failure_is_returned() {
        let store = open_store();
        let dir = std::env::temp_dir().join(format!("aura-export-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        // a directory where the file should go
        assert!(export_to_file(&store.snapshot(), &dir).is_err());
        let _ = std::fs::remove_dir_all(dir);
    }
}

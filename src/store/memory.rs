//! メモリ上の台帳（テスト・一時利用向け）

use super::RecordStore;
use crate::error::Result;
use tenken_common::PersistedRow;

#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    rows: Vec<PersistedRow>,
    writes: usize,
}

impl MemoryRecordStore {
    pub fn new(rows: Vec<PersistedRow>) -> Self {
        Self { rows, writes: 0 }
    }

    /// `write_all` が呼ばれた回数
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn rows(&self) -> &[PersistedRow] {
        &self.rows
    }
}

impl RecordStore for MemoryRecordStore {
    fn load(&self) -> Result<Vec<PersistedRow>> {
        Ok(self.rows.clone())
    }

    fn write_all(&mut self, rows: &[PersistedRow]) -> Result<()> {
        self.rows = rows.to_vec();
        self.writes += 1;
        Ok(())
    }
}

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{CellUpdate, RowPosition, RowStore, StoreError};

/// Row store kept in process memory, with the same addressing as a sheet.
#[derive(Debug, Default)]
pub struct InMemoryRowStore {
    rows: Mutex<Vec<Vec<String>>>,
}

impl InMemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    /// Copy of the current rows.
    pub fn snapshot(&self) -> Vec<Vec<String>> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Vec<String>>>, StoreError> {
        self.rows.lock().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl RowStore for InMemoryRowStore {
    async fn list_rows(&self) -> Result<Vec<Vec<String>>, StoreError> {
        Ok(self.lock()?.clone())
    }

    async fn append_row(&self, row: Vec<String>) -> Result<(), StoreError> {
        self.lock()?.push(row);
        Ok(())
    }

    async fn update_cells(
        &self,
        position: RowPosition,
        updates: &[CellUpdate],
    ) -> Result<(), StoreError> {
        if let Some(update) = updates.iter().find(|u| u.column == 0) {
            return Err(StoreError::InvalidColumn(update.column));
        }

        let mut rows = self.lock()?;
        let row = rows
            .get_mut(position.data_index())
            .ok_or(StoreError::MissingRow(position))?;

        for update in updates {
            if row.len() < update.column {
                row.resize(update.column, String::new());
            }
            row[update.column - 1] = update.value.clone();
        }
        Ok(())
    }
}

//! Row-addressed persistence for subscriber data.
//!
//! A row store is a spreadsheet seen as a list of string rows under a single
//! header row. Rows are addressed by their 1-based sheet row number and
//! columns by their 1-based index.

mod memory;
mod sheets;

pub use memory::InMemoryRowStore;
pub use sheets::SheetsClient;

use async_trait::async_trait;

/// Sheet row number of a data row. The header occupies row 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowPosition(usize);

impl RowPosition {
    const FIRST_DATA_ROW: usize = 2;

    /// Position of the `index`-th (0-based) row returned by [`RowStore::list_rows`].
    pub fn from_data_index(index: usize) -> Self {
        Self(index + Self::FIRST_DATA_ROW)
    }

    pub fn data_index(self) -> usize {
        self.0 - Self::FIRST_DATA_ROW
    }

    pub fn row_number(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for RowPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// New value for one cell of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub column: usize,
    pub value: String,
}

impl CellUpdate {
    pub fn new(column: usize, value: impl Into<String>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Request to the spreadsheet API failed")]
    Request(#[from] reqwest::Error),
    #[error("Row {0} does not exist")]
    MissingRow(RowPosition),
    #[error("Column {0} is not a valid sheet column")]
    InvalidColumn(usize),
    #[error("In-memory row store lock was poisoned")]
    Poisoned,
}

#[async_trait]
pub trait RowStore: Send + Sync {
    /// All data rows in sheet order, header excluded.
    async fn list_rows(&self) -> Result<Vec<Vec<String>>, StoreError>;

    async fn append_row(&self, row: Vec<String>) -> Result<(), StoreError>;

    /// Writes every update to the row at `position` in a single request.
    async fn update_cells(
        &self,
        position: RowPosition,
        updates: &[CellUpdate],
    ) -> Result<(), StoreError>;
}

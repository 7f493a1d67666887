use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use super::{CellUpdate, RowPosition, RowStore, StoreError};

const VALUE_INPUT_OPTION: &str = "RAW";
const ROW_RANGE: &str = "A:I";

/// Google Sheets v4 `values` API, scoped to one sheet of one spreadsheet.
#[derive(Clone)]
pub struct SheetsClient {
    http_client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    sheet_name: String,
    access_token: Secret<String>,
    timeout: Duration,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Serialize)]
struct AppendRequestBody<'a> {
    values: [&'a [String]; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateRequestBody<'a> {
    value_input_option: &'a str,
    data: Vec<CellRange<'a>>,
}

#[derive(Serialize)]
struct CellRange<'a> {
    range: String,
    values: [[&'a str; 1]; 1],
}

impl SheetsClient {
    pub fn new(
        base_url: String,
        spreadsheet_id: String,
        sheet_name: String,
        access_token: Secret<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url,
            spreadsheet_id,
            sheet_name,
            access_token,
            timeout,
        }
    }

    /// Another sheet of the same spreadsheet, sharing this client's connection pool.
    pub fn for_sheet(&self, sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            ..self.clone()
        }
    }

    fn quoted_sheet(&self) -> String {
        format!("'{}'", self.sheet_name.replace('\'', "''"))
    }

    fn cell_range(&self, position: RowPosition, column: usize) -> String {
        format!(
            "{}!{}{}",
            self.quoted_sheet(),
            column_letters(column),
            position.row_number()
        )
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url,
            self.spreadsheet_id,
            urlencoding::encode(range)
        )
    }
}

#[async_trait]
impl RowStore for SheetsClient {
    #[tracing::instrument(name = "Listing sheet rows", skip(self), fields(sheet = %self.sheet_name))]
    async fn list_rows(&self) -> Result<Vec<Vec<String>>, StoreError> {
        let range: ValueRange = self
            .http_client
            .get(self.values_url(&format!("{}!{}", self.quoted_sheet(), ROW_RANGE)))
            .timeout(self.timeout)
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(range.values.into_iter().skip(1).collect())
    }

    #[tracing::instrument(name = "Appending sheet row", skip(self, row), fields(sheet = %self.sheet_name))]
    async fn append_row(&self, row: Vec<String>) -> Result<(), StoreError> {
        let url = format!("{}:append", self.values_url(&format!("{}!A1", self.quoted_sheet())));

        self.http_client
            .post(url)
            .query(&[
                ("valueInputOption", VALUE_INPUT_OPTION),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .timeout(self.timeout)
            .bearer_auth(self.access_token.expose_secret())
            .json(&AppendRequestBody {
                values: [row.as_slice()],
            })
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    #[tracing::instrument(
        name = "Updating sheet cells",
        skip(self, updates),
        fields(sheet = %self.sheet_name)
    )]
    async fn update_cells(
        &self,
        position: RowPosition,
        updates: &[CellUpdate],
    ) -> Result<(), StoreError> {
        if updates.is_empty() {
            return Ok(());
        }
        if let Some(update) = updates.iter().find(|u| u.column == 0) {
            return Err(StoreError::InvalidColumn(update.column));
        }

        let body = BatchUpdateRequestBody {
            value_input_option: VALUE_INPUT_OPTION,
            data: updates
                .iter()
                .map(|update| CellRange {
                    range: self.cell_range(position, update.column),
                    values: [[update.value.as_str()]],
                })
                .collect(),
        };
        let url = format!(
            "{}/v4/spreadsheets/{}/values:batchUpdate",
            self.base_url, self.spreadsheet_id
        );

        self.http_client
            .post(url)
            .timeout(self.timeout)
            .bearer_auth(self.access_token.expose_secret())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// A1-notation column letters for a 1-based column index (1 -> A, 27 -> AA).
fn column_letters(column: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = column;
    while remaining > 0 {
        let offset = (remaining - 1) % 26;
        letters.push(char::from(b'A' + offset as u8));
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().collect()
}

use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Columns appended to every tick of a bulk response.
pub const CONTRACT_COLUMNS: [&str; 4] = ["root", "expiration", "strike", "right"];

/// One call against the terminal: where to send it, what to send, and how
/// to name the CSV it produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataRequest {
    pub endpoint: String,
    pub params: Vec<(String, String)>,
    pub datatype: String,
    pub identifier: String,
    pub write_csv: bool,
    pub fallback_columns: Option<Vec<String>>,
}

impl DataRequest {
    pub fn new(endpoint: &str, datatype: &str, identifier: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            params: Vec::new(),
            datatype: datatype.to_string(),
            identifier: identifier.into(),
            write_csv: false,
            fallback_columns: None,
        }
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    pub fn param_opt<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Booleans go over the wire lower-case.
    pub fn flag(self, key: &str, value: bool) -> Self {
        self.param(key, if value { "true" } else { "false" })
    }

    pub fn write_csv(mut self, write_csv: bool) -> Self {
        self.write_csv = write_csv;
        self
    }

    pub fn fallback_columns(mut self, columns: &[&str]) -> Self {
        self.fallback_columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn file_name(&self) -> String {
        format!("{}_{}.csv", self.datatype, self.identifier)
    }

    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseHeader {
    #[serde(default)]
    pub format: Option<Vec<String>>,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error_msg: Option<String>,
}

impl ResponseHeader {
    /// The terminal sends the literal string "null" when nothing went wrong.
    pub fn remote_error(&self) -> Option<EtlError> {
        let error_type = self.error_type.as_deref()?;
        if error_type.is_empty() || error_type.eq_ignore_ascii_case("null") {
            return None;
        }
        Some(EtlError::RemoteError {
            error_type: error_type.to_string(),
            message: self
                .error_msg
                .clone()
                .filter(|m| !m.eq_ignore_ascii_case("null"))
                .unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub header: ResponseHeader,
    #[serde(default)]
    pub response: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from the header's column list and the response rows.
    ///
    /// Plain responses carry one array per row. Bulk responses carry
    /// `{"ticks": [[..]], "contract": {..}}` objects; each tick becomes a row
    /// with the contract's root, expiration, strike and right appended.
    pub fn from_response(response: ApiResponse, fallback: Option<&[String]>) -> Result<Self> {
        let columns = match (response.header.format, fallback) {
            (Some(format), _) if !format.is_empty() => format,
            (_, Some(fallback)) => fallback.to_vec(),
            _ => {
                return Err(EtlError::processing(
                    "response header has no column format",
                ))
            }
        };

        let mut table = Table::new(columns);
        let base_width = table.columns.len();
        let mut has_contract_columns = false;

        for (index, item) in response.response.into_iter().enumerate() {
            match item {
                Value::Array(cells) => table.push_row(index, cells)?,
                Value::Object(mut bulk) => {
                    let ticks = match bulk.remove("ticks") {
                        Some(Value::Array(ticks)) => ticks,
                        _ => {
                            return Err(EtlError::processing(format!(
                                "row {} is an object without a 'ticks' array",
                                index
                            )))
                        }
                    };
                    let contract = contract_cells(index, bulk.get("contract"))?;

                    if !has_contract_columns {
                        if !table.rows.is_empty() {
                            return Err(EtlError::processing(format!(
                                "row {} mixes bulk ticks with plain rows",
                                index
                            )));
                        }
                        table
                            .columns
                            .extend(CONTRACT_COLUMNS.iter().map(|c| c.to_string()));
                        has_contract_columns = true;
                    }

                    for tick in ticks {
                        let mut cells = match tick {
                            Value::Array(cells) if cells.len() == base_width => cells,
                            Value::Array(cells) => {
                                return Err(EtlError::processing(format!(
                                    "row {} has a tick with {} fields, expected {}",
                                    index,
                                    cells.len(),
                                    base_width
                                )))
                            }
                            other => {
                                return Err(EtlError::processing(format!(
                                    "row {} has a non-array tick: {}",
                                    index, other
                                )))
                            }
                        };
                        cells.extend(contract.iter().cloned());
                        table.push_row(index, cells)?;
                    }
                }
                other => {
                    return Err(EtlError::processing(format!(
                        "row {} is neither an array nor a bulk object: {}",
                        index, other
                    )))
                }
            }
        }

        Ok(table)
    }

    fn push_row(&mut self, index: usize, cells: Vec<Value>) -> Result<()> {
        if cells.len() != self.columns.len() {
            return Err(EtlError::processing(format!(
                "row {} has {} fields, expected {}",
                index,
                cells.len(),
                self.columns.len()
            )));
        }
        self.rows.push(cells);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }

    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(cell_text))?;
        }
        writer
            .into_inner()
            .map_err(|e| EtlError::IoError(e.into_error()))
    }
}

fn contract_cells(index: usize, contract: Option<&Value>) -> Result<Vec<Value>> {
    let contract = contract.and_then(Value::as_object).ok_or_else(|| {
        EtlError::processing(format!("row {} has no 'contract' object", index))
    })?;
    Ok(CONTRACT_COLUMNS
        .iter()
        .map(|key| contract.get(*key).cloned().unwrap_or(Value::Null))
        .collect())
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

/// What a wrapper call hands back: the table, and where it was written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutput {
    pub table: Table,
    pub csv_path: Option<String>,
}

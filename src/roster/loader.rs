use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use std::path::PathBuf;
use tracing::warn;

use super::models::{Columns, Participant};
use super::{RosterError, RosterSource};

/// Roster stored in a spreadsheet on disk.
///
/// `.csv` files go through the `csv` reader; every other extension is handed
/// to calamine, which sniffs xlsx/xls/xlsb/ods itself. Only the first sheet is
/// read and its first row is taken as the header.
#[derive(Debug, Clone)]
pub struct FileRoster {
    path: PathBuf,
}

impl FileRoster {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn is_csv(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
    }
}

impl RosterSource for FileRoster {
    fn load(&self) -> Result<Vec<Participant>, RosterError> {
        let bytes = std::fs::read(&self.path).map_err(|source| RosterError::Io {
            path: self.path.clone(),
            source,
        })?;

        let (columns, rows) = if self.is_csv() {
            parse_csv(&bytes)?
        } else {
            parse_workbook(bytes)?
        };

        let missing = columns.missing();
        if !missing.is_empty() {
            warn!(
                path = %self.path.display(),
                ?missing,
                "Roster is missing expected columns; those fields will never match"
            );
        }

        Ok(rows
            .iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .map(|row| columns.participant(row))
            .collect())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn parse_csv(bytes: &[u8]) -> Result<(Columns, Vec<Vec<String>>), RosterError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let columns = Columns::from_headers(reader.headers()?.iter());
    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((columns, rows))
}

fn parse_workbook(bytes: Vec<u8>) -> Result<(Columns, Vec<Vec<String>>), RosterError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(RosterError::NoSheets)??;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>());

    let Some(header) = rows.next() else {
        return Ok((Columns::default(), Vec::new()));
    };
    let columns = Columns::from_headers(header.iter().map(String::as_str));

    Ok((columns, rows.collect()))
}

/// Stringify a cell the way a spreadsheet shows it: whole numbers lose their
/// fractional part so a roll number typed as `101` compares as `"101"`.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

//! Reader for the delimited world file.
//!
//! One grid row per line, cells separated by `,` and the fields of a cell by
//! `;`: `tag[;temperature[;air_pollution]]`.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::cell::{CellDescriptor, CellError};
use crate::grid::GridError;

const CELL_DELIMITER: char = ',';
const FIELD_DELIMITER: char = ';';

#[derive(Debug, Error)]
pub enum WorldFileError {
    #[error("failed to read world file: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}, cell {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
    #[error(transparent)]
    Cell(#[from] CellError),
    #[error(transparent)]
    Grid(#[from] GridError),
}

pub fn read_world_file(path: impl AsRef<Path>) -> Result<Vec<Vec<CellDescriptor>>, WorldFileError> {
    let text = fs::read_to_string(path)?;
    parse_world(&text)
}

pub fn parse_world(text: &str) -> Result<Vec<Vec<CellDescriptor>>, WorldFileError> {
    let mut rows = Vec::new();
    for (line_index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let row = trimmed
            .split(CELL_DELIMITER)
            .enumerate()
            .map(|(column, raw)| parse_cell(raw, line_index + 1, column + 1))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }
    Ok(rows)
}

fn parse_cell(raw: &str, line: usize, column: usize) -> Result<CellDescriptor, WorldFileError> {
    let parse_error = |message: String| WorldFileError::Parse {
        line,
        column,
        message,
    };
    let mut fields = raw.split(FIELD_DELIMITER).map(str::trim);

    let tag_text = fields.next().unwrap_or_default();
    let tag = tag_text
        .parse::<i64>()
        .map_err(|_| parse_error(format!("unable to parse cell type from '{tag_text}'")))?;

    let mut optional = |name: &str| -> Result<Option<f64>, WorldFileError> {
        match fields.next() {
            None | Some("") => Ok(None),
            Some(value) => value
                .parse::<f64>()
                .map(Some)
                .map_err(|_| parse_error(format!("unable to parse {name} from '{value}'"))),
        }
    };
    let temperature = optional("temperature")?;
    let air_pollution = optional("air pollution")?;

    Ok(CellDescriptor {
        tag,
        temperature,
        air_pollution,
    })
}

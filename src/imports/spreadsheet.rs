// src/imports/spreadsheet.rs

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader};
use serde::{Deserialize, Serialize};

use crate::common::error::AppError;

// Valor de célula já desacoplado do calamine: é o que vai para o JSONB do
// staging e o que o mapeador de linhas consome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    /// Texto "como o usuário digitou": números inteiros sem o ".0" que o
    /// Excel inventa (um nº de fatura 100 não pode virar "100.0").
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => {
                let t = s.trim();
                if t.is_empty() { None } else { Some(t.to_string()) }
            }
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(format!("{}", n))
                }
            }
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Empty => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(_) | Data::Empty => CellValue::Empty,
        }
    }
}

// Uma linha crua: cabeçalho -> valor, só células não vazias.
pub type RawRow = HashMap<String, CellValue>;

/// Lê a primeira aba de um XLSX: cabeçalhos da primeira linha + linhas de
/// dados como mapas. Linhas totalmente vazias são descartadas.
pub fn parse_workbook(bytes: &[u8]) -> Result<(Vec<String>, Vec<RawRow>), AppError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| AppError::SpreadsheetParse(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(AppError::EmptyFile)?
        .map_err(|e| AppError::SpreadsheetParse(e.to_string()))?;

    let mut rows_iter = range.rows();

    let headers: Vec<String> = match rows_iter.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| CellValue::from(cell).as_text().unwrap_or_default())
            .collect(),
        None => return Err(AppError::EmptyFile),
    };

    let mut rows = Vec::new();
    for data_row in rows_iter {
        let mut row: RawRow = HashMap::new();
        for (header, cell) in headers.iter().zip(data_row.iter()) {
            if header.is_empty() {
                continue;
            }
            let value = CellValue::from(cell);
            if value != CellValue::Empty {
                row.insert(header.clone(), value);
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }

    Ok((headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_numbers_render_without_decimal_point() {
        assert_eq!(CellValue::Number(100.0).as_text(), Some("100".to_string()));
        assert_eq!(CellValue::Number(100.5).as_text(), Some("100.5".to_string()));
    }

    #[test]
    fn blank_text_is_none() {
        assert_eq!(CellValue::Text("   ".to_string()).as_text(), None);
        assert_eq!(CellValue::Empty.as_text(), None);
        assert_eq!(CellValue::Text(" x ".to_string()).as_text(), Some("x".to_string()));
    }

    #[test]
    fn cell_value_roundtrips_through_json() {
        let row: RawRow = [
            ("Party Name".to_string(), CellValue::Text("ABC School".to_string())),
            ("Amount".to_string(), CellValue::Number(5000.0)),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_value(&row).unwrap();
        let back: RawRow = serde_json::from_value(json).unwrap();
        assert_eq!(back, row);
    }
}

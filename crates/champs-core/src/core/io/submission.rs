use super::error::TableError;
use super::traits::{TableFile, read_rows, write_rows};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

const SUBMISSION_HEADER: [&str; 2] = ["id", "scalar_coupling_constant"];

/// One predicted value, keyed by the pair id of the test table.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SubmissionRow {
    pub id: u64,
    pub scalar_coupling_constant: f64,
}

pub struct SubmissionFile;

impl TableFile for SubmissionFile {
    type Record = SubmissionRow;

    fn read_from(reader: impl Read, limit: Option<usize>) -> Result<Vec<SubmissionRow>, TableError> {
        read_rows(reader, limit, |row, record: SubmissionRow| {
            if !record.scalar_coupling_constant.is_finite() {
                return Err(TableError::InvalidRecord {
                    row,
                    message: format!("prediction for id {} is not finite", record.id),
                });
            }
            Ok(record)
        })
    }

    fn write_to(records: &[SubmissionRow], writer: impl Write) -> Result<(), TableError> {
        write_rows(&SUBMISSION_HEADER, records.iter(), writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_rows_in_order() {
        let rows = [
            SubmissionRow {
                id: 4658147,
                scalar_coupling_constant: 12.5,
            },
            SubmissionRow {
                id: 4658148,
                scalar_coupling_constant: -1.25,
            },
        ];
        let mut buffer = Vec::new();
        SubmissionFile::write_to(&rows, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "id,scalar_coupling_constant\n4658147,12.5\n4658148,-1.25\n"
        );
    }

    #[test]
    fn non_finite_prediction_is_rejected_on_read() {
        let csv = "id,scalar_coupling_constant\n1,NaN\n";
        let result = SubmissionFile::read_from(csv.as_bytes(), None);
        assert!(matches!(result, Err(TableError::InvalidRecord { row: 1, .. })));
    }
}

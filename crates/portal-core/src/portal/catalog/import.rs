use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::portal::domain::{Grade, NewSubject};

#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidGrade { row: usize, grade: u8 },
    EmptyName { row: usize },
}

impl std::fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read catalog file: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid catalog CSV data: {}", err),
            CatalogImportError::InvalidGrade { row, grade } => {
                write!(f, "row {}: grade {} is outside 4..=12", row, grade)
            }
            CatalogImportError::EmptyName { row } => {
                write!(f, "row {}: subject name is empty", row)
            }
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
            CatalogImportError::InvalidGrade { .. } | CatalogImportError::EmptyName { .. } => None,
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Deserialize)]
struct SubjectRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Grade")]
    grade: u8,
}

/// Parses `Name,Grade` CSV exports into subject seed data. Duplicate rows
/// within one file collapse to the first occurrence.
pub struct SubjectCatalogImporter;

impl SubjectCatalogImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<NewSubject>, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<NewSubject>, CatalogImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut seen: HashSet<(String, u8)> = HashSet::new();
        let mut subjects = Vec::new();

        for (index, record) in csv_reader.deserialize::<SubjectRow>().enumerate() {
            // Header occupies the first line of the file.
            let row = index + 2;
            let parsed = record?;

            let name = parsed.name.trim().to_string();
            if name.is_empty() {
                return Err(CatalogImportError::EmptyName { row });
            }
            let grade = Grade::new(parsed.grade).ok_or(CatalogImportError::InvalidGrade {
                row,
                grade: parsed.grade,
            })?;

            if seen.insert((name.to_ascii_lowercase(), parsed.grade)) {
                subjects.push(NewSubject { name, grade });
            }
        }

        Ok(subjects)
    }
}

//! CSV loading for sections and TAs.

use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;

use crate::schema::{Preference, Problem, Section, Ta};

/// Errors raised while loading problem tables.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: io::Error,
    },
    #[error("{file}: missing column `{column}`")]
    MissingColumn { file: String, column: String },
    #[error("{file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },
    #[error("{file}: preference column `{column}` is not a section index")]
    SectionColumn { file: String, column: String },
}

/// Load both tables. Any failure is fatal for a run.
pub fn load_problem<P, Q>(sections_path: P, tas_path: Q) -> Result<Problem, LoadError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let sections = parse_sections(
        &read(sections_path.as_ref())?,
        &sections_path.as_ref().display().to_string(),
    )?;
    let tas = parse_tas(
        &read(tas_path.as_ref())?,
        &tas_path.as_ref().display().to_string(),
    )?;
    Ok(Problem { sections, tas })
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        file: path.display().to_string(),
        source,
    })
}

/// One row of `sections.csv`.
#[derive(Debug, Deserialize)]
struct SectionRow {
    section: usize,
    instructor: String,
    daytime: String,
    location: String,
    students: u32,
    topic: String,
    min_ta: u32,
    max_ta: u32,
}

impl From<SectionRow> for Section {
    fn from(row: SectionRow) -> Self {
        Section {
            section_id: row.section,
            instructor: row.instructor,
            daytime: row.daytime,
            location: row.location,
            students: row.students,
            topic: row.topic,
            min_ta: row.min_ta,
            max_ta: row.max_ta,
        }
    }
}

/// Leading columns of `tas.csv`. Preference columns are read by index.
#[derive(Debug, Deserialize)]
struct TaRow {
    ta_id: usize,
    name: String,
    max_assigned: u32,
}

const SECTION_COLUMNS: [&str; 8] = [
    "section",
    "instructor",
    "daytime",
    "location",
    "students",
    "topic",
    "min_ta",
    "max_ta",
];

const TA_COLUMNS: [&str; 3] = ["ta_id", "name", "max_assigned"];

fn reader(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes())
}

fn csv_error(file: &str) -> impl Fn(csv::Error) -> LoadError + '_ {
    move |source| LoadError::Csv {
        file: file.to_string(),
        source,
    }
}

/// Fail on the first expected column the header lacks.
fn require_columns(
    headers: &csv::StringRecord,
    columns: &[&str],
    file: &str,
) -> Result<(), LoadError> {
    match columns.iter().find(|c| !headers.iter().any(|h| h == **c)) {
        Some(column) => Err(LoadError::MissingColumn {
            file: file.to_string(),
            column: column.to_string(),
        }),
        None => Ok(()),
    }
}

/// Parse the sections table.
///
/// Columns: `section,instructor,daytime,location,students,topic,min_ta,max_ta`.
pub fn parse_sections(text: &str, file: &str) -> Result<Vec<Section>, LoadError> {
    let mut rdr = reader(text);
    require_columns(rdr.headers().map_err(csv_error(file))?, &SECTION_COLUMNS, file)?;

    rdr.deserialize::<SectionRow>()
        .map(|row| row.map(Section::from).map_err(csv_error(file)))
        .collect()
}

/// Parse the TA table.
///
/// Columns: `ta_id,name,max_assigned` followed by one preference column per
/// section, headed by the section index.
pub fn parse_tas(text: &str, file: &str) -> Result<Vec<Ta>, LoadError> {
    let mut rdr = reader(text);
    let headers = rdr.headers().map_err(csv_error(file))?.clone();
    require_columns(&headers, &TA_COLUMNS, file)?;

    let section_columns: Vec<(usize, usize)> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !TA_COLUMNS.contains(name))
        .map(|(i, name)| {
            name.parse::<usize>()
                .map(|section| (i, section))
                .map_err(|_| LoadError::SectionColumn {
                    file: file.to_string(),
                    column: name.to_string(),
                })
        })
        .collect::<Result<_, _>>()?;

    rdr.records()
        .map(|record| -> Result<Ta, LoadError> {
            let record = record.map_err(csv_error(file))?;
            let row: TaRow = record.deserialize(Some(&headers)).map_err(csv_error(file))?;
            Ok(Ta {
                ta_id: row.ta_id,
                name: row.name,
                max_assigned: row.max_assigned,
                preferences: section_columns
                    .iter()
                    .map(|&(i, section)| {
                        (section, Preference::from_code(record.get(i).unwrap_or("")))
                    })
                    .collect(),
            })
        })
        .collect()
}

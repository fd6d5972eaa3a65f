//! Run reports: population summary CSV, best-solution text and their parsers.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compute::evolution::Population;
use crate::problems::assignta::OBJECTIVE_NAMES;
use crate::schema::{Score, format_value};

/// Errors raised while writing or reading reports.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("population is empty")]
    EmptyPopulation,
}

/// Report column values for one score. Objectives the score lacks count as 0.
pub fn report_values(score: &Score) -> Vec<f64> {
    OBJECTIVE_NAMES
        .iter()
        .map(|name| score.get(name).unwrap_or(0.0))
        .collect()
}

/// One summary row. Field order is the CSV column order.
#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    groupname: &'a str,
    overallocation: String,
    conflicts: String,
    undersupport: String,
    unavailable: String,
    unpreferred: String,
}

impl<'a> SummaryRow<'a> {
    fn new(group_name: &'a str, score: &Score) -> Self {
        let [overallocation, conflicts, undersupport, unavailable, unpreferred] =
            OBJECTIVE_NAMES.map(|name| format_value(score.get(name).unwrap_or(0.0)));
        Self {
            groupname: group_name,
            overallocation,
            conflicts,
            undersupport,
            unavailable,
            unpreferred,
        }
    }
}

/// Write one CSV row per population member, in population order. The header
/// is written even for an empty population.
pub fn save_summary<C, P: AsRef<Path>>(
    path: P,
    group_name: &str,
    population: &Population<C>,
) -> Result<(), ReportError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    wtr.write_record(std::iter::once("groupname").chain(OBJECTIVE_NAMES))?;
    for score in population.scores() {
        wtr.serialize(SummaryRow::new(group_name, score))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Per-objective `(name, min, max)` over the population.
pub fn objective_ranges<C>(population: &Population<C>) -> Vec<(&'static str, f64, f64)> {
    OBJECTIVE_NAMES
        .iter()
        .enumerate()
        .map(|(i, &name)| {
            let (min, max) = population
                .scores()
                .map(|s| report_values(s)[i])
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            (name, min, max)
        })
        .collect()
}

/// Lowest-total-penalty row of the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestSolution {
    /// Values in report column order.
    pub values: Vec<f64>,
    pub total_penalty: f64,
}

/// Pick the member with the smallest summed penalty. Ties go to the first
/// in population order.
pub fn best_solution<C>(population: &Population<C>) -> Result<BestSolution, ReportError> {
    let mut best: Option<BestSolution> = None;
    for score in population.scores() {
        let values = report_values(score);
        let total_penalty: f64 = values.iter().sum();
        if best.as_ref().is_none_or(|b| total_penalty < b.total_penalty) {
            best = Some(BestSolution {
                values,
                total_penalty,
            });
        }
    }
    best.ok_or(ReportError::EmptyPopulation)
}

/// `Overallocation: N` ... `Total Penalty: N`, followed by a blank line.
pub fn format_best_solution(best: &BestSolution) -> String {
    let mut text = String::new();
    for (name, value) in OBJECTIVE_NAMES.iter().zip(&best.values) {
        text.push_str(&format!("{}: {}\n", capitalize(name), format_value(*value)));
    }
    text.push_str(&format!(
        "Total Penalty: {}\n\n",
        format_value(best.total_penalty)
    ));
    text
}

pub fn write_best_solution<P: AsRef<Path>>(path: P, best: &BestSolution) -> Result<(), ReportError> {
    fs::write(path, format_best_solution(best))?;
    Ok(())
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parse `key: value` lines, splitting on the first colon. Other lines are
/// skipped.
pub fn parse_best_solution(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// One row of a profiler report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub function: String,
    pub calls: u64,
    pub total_time: f64,
    pub avg_time: f64,
}

/// Parse a profiler report back into rows.
///
/// The first three lines (total, blank, header) are skipped. The last three
/// tokens of a row are calls, total and average; everything before them is
/// the function name. Rows that do not parse are skipped.
pub fn parse_profile_report(text: &str) -> Vec<ProfileEntry> {
    text.lines()
        .skip(3)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 {
                return None;
            }
            let n = parts.len();
            Some(ProfileEntry {
                function: parts[..n - 3].join(" "),
                calls: parts[n - 3].parse().ok()?,
                total_time: parts[n - 2].parse().ok()?,
                avg_time: parts[n - 1].parse().ok()?,
            })
        })
        .collect()
}

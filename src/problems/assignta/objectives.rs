//! Penalty objectives for TA assignment grids.

use std::collections::HashSet;

use crate::compute::evolution::ObjectiveError;
use crate::schema::{Assignment, Preference, Section, Ta};

/// Sections assigned beyond each TA's `max_assigned`, summed over TAs.
pub fn overallocation(solution: &Assignment, tas: &[Ta]) -> Result<u32, ObjectiveError> {
    check_rows(solution, tas.len())?;
    Ok(solution
        .row_sums()
        .iter()
        .zip(tas)
        .map(|(&assigned, ta)| assigned.saturating_sub(ta.max_assigned))
        .sum())
}

/// Number of TAs holding at least two sections that meet at the same time.
pub fn conflicts(solution: &Assignment, sections: &[Section]) -> Result<u32, ObjectiveError> {
    check_cols(solution, sections.len())?;
    let mut count = 0;
    for ta in 0..solution.rows() {
        let assigned = solution.assigned_sections(ta);
        let clash = assigned.iter().enumerate().any(|(i, &a)| {
            assigned[i + 1..]
                .iter()
                .any(|&b| sections[a].daytime == sections[b].daytime)
        });
        if clash {
            count += 1;
        }
    }
    Ok(count)
}

/// TAs missing below each section's `min_ta`, summed over sections.
pub fn undersupport(solution: &Assignment, sections: &[Section]) -> Result<u32, ObjectiveError> {
    check_cols(solution, sections.len())?;
    Ok(solution
        .col_sums()
        .iter()
        .zip(sections)
        .map(|(&assigned, section)| section.min_ta.saturating_sub(assigned))
        .sum())
}

/// Assignments to sections the TA marked unavailable (`U`).
pub fn unavailable(solution: &Assignment, tas: &[Ta]) -> Result<u32, ObjectiveError> {
    Ok(count_preference(solution, tas, Preference::Unavailable))
}

/// Assignments to sections the TA is only willing to take (`W`).
pub fn unpreferred(solution: &Assignment, tas: &[Ta]) -> Result<u32, ObjectiveError> {
    Ok(count_preference(solution, tas, Preference::Willing))
}

fn count_preference(solution: &Assignment, tas: &[Ta], wanted: Preference) -> u32 {
    let marked: HashSet<(usize, usize)> = tas
        .iter()
        .enumerate()
        .flat_map(|(row, ta)| {
            ta.preferences
                .iter()
                .filter(move |(_, p)| *p == wanted)
                .map(move |(section, _)| (row, *section))
        })
        .collect();

    solution
        .assigned_cells()
        .filter(|cell| marked.contains(cell))
        .count() as u32
}

fn check_rows(solution: &Assignment, rows: usize) -> Result<(), ObjectiveError> {
    if solution.rows() != rows {
        return Err(ObjectiveError::ShapeMismatch {
            expected: (rows, solution.cols()),
            actual: (solution.rows(), solution.cols()),
        });
    }
    Ok(())
}

fn check_cols(solution: &Assignment, cols: usize) -> Result<(), ObjectiveError> {
    if solution.cols() != cols {
        return Err(ObjectiveError::ShapeMismatch {
            expected: (solution.rows(), cols),
            actual: (solution.rows(), solution.cols()),
        });
    }
    Ok(())
}

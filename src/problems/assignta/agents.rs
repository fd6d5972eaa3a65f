//! Agent operators that produce new assignment grids.
//!
//! Every agent takes the grids drawn from the population and falls back to a
//! fresh random grid when it receives fewer than it needs.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::compute::evolution::SearchRng;
use crate::schema::Assignment;

/// A grid with every cell set independently with probability 1/2.
pub fn random_solution(rng: &mut SearchRng, shape: (usize, usize)) -> Assignment {
    let (rows, cols) = shape;
    let mut grid = Assignment::zeros(rows, cols);
    for r in 0..rows {
        for c in 0..cols {
            grid.set(r, c, rng.gen_bool(0.5));
        }
    }
    grid
}

/// Flip between 1 and 10 random cells.
pub fn swap_assignment(
    rng: &mut SearchRng,
    picks: Vec<Assignment>,
    shape: (usize, usize),
) -> Assignment {
    let Some(mut grid) = picks.into_iter().next() else {
        return random_solution(rng, shape);
    };
    if is_degenerate(&grid) {
        return grid;
    }
    let swaps = rng.gen_range(1..=10);
    for _ in 0..swaps {
        let ta = rng.gen_range(0..grid.rows());
        let section = rng.gen_range(0..grid.cols());
        grid.toggle(ta, section);
    }
    grid
}

/// Drop 1 to 3 random sections from every TA holding more than two,
/// always leaving at least one.
pub fn conflict_reduction(
    rng: &mut SearchRng,
    picks: Vec<Assignment>,
    shape: (usize, usize),
) -> Assignment {
    let Some(mut grid) = picks.into_iter().next() else {
        return random_solution(rng, shape);
    };
    for ta in 0..grid.rows() {
        let assigned = grid.assigned_sections(ta);
        if assigned.len() > 2 {
            let amount = rng.gen_range(1..=3.min(assigned.len() - 1));
            for section in rng.sample_distinct(&assigned, amount) {
                grid.set(ta, section, false);
            }
        }
    }
    grid
}

/// Move single sections from TAs with more than three to TAs with fewer
/// than two, up to five moves.
pub fn workload_balancing(
    rng: &mut SearchRng,
    picks: Vec<Assignment>,
    shape: (usize, usize),
) -> Assignment {
    let Some(mut grid) = picks.into_iter().next() else {
        return random_solution(rng, shape);
    };

    let workloads = grid.row_sums();
    let overloaded: Vec<usize> = (0..grid.rows()).filter(|&r| workloads[r] > 3).collect();
    let underloaded: Vec<usize> = (0..grid.rows()).filter(|&r| workloads[r] < 2).collect();
    if overloaded.is_empty() || underloaded.is_empty() {
        return grid;
    }

    for _ in 0..overloaded.len().min(5) {
        let (Some(&from), Some(&to)) = (overloaded.choose(rng), underloaded.choose(rng)) else {
            break;
        };
        let assigned = grid.assigned_sections(from);
        if let Some(&section) = assigned.choose(rng) {
            grid.set(from, section, false);
            grid.set(to, section, true);
        }
    }
    grid
}

/// Add one or two unassigned TAs to every section covered by fewer than two.
pub fn section_coverage(
    rng: &mut SearchRng,
    picks: Vec<Assignment>,
    shape: (usize, usize),
) -> Assignment {
    let Some(mut grid) = picks.into_iter().next() else {
        return random_solution(rng, shape);
    };

    let coverage = grid.col_sums();
    for section in 0..grid.cols() {
        if coverage[section] >= 2 {
            continue;
        }
        let available = grid.unassigned_tas(section);
        if !available.is_empty() {
            let amount = rng.gen_range(1..=2).min(available.len());
            for ta in rng.sample_distinct(&available, amount) {
                grid.set(ta, section, true);
            }
        }
    }
    grid
}

/// Uniform row-wise crossover: each TA row comes from either parent.
pub fn crossover(rng: &mut SearchRng, picks: Vec<Assignment>, shape: (usize, usize)) -> Assignment {
    let mut picks = picks.into_iter();
    let (Some(mut child), Some(other)) = (picks.next(), picks.next()) else {
        return random_solution(rng, shape);
    };
    if child.rows() != other.rows() || child.cols() != other.cols() {
        return child;
    }
    for ta in 0..child.rows() {
        if rng.gen_bool(0.5) {
            child.copy_row_from(&other, ta);
        }
    }
    child
}

/// Pick 1 to 5 random cells and flip each with probability 1/2.
pub fn mutation(rng: &mut SearchRng, picks: Vec<Assignment>, shape: (usize, usize)) -> Assignment {
    let Some(mut grid) = picks.into_iter().next() else {
        return random_solution(rng, shape);
    };
    if is_degenerate(&grid) {
        return grid;
    }
    let mutations = rng.gen_range(1..=5);
    for _ in 0..mutations {
        let ta = rng.gen_range(0..grid.rows());
        let section = rng.gen_range(0..grid.cols());
        if rng.gen_bool(0.5) {
            grid.toggle(ta, section);
        }
    }
    grid
}

/// Trim every TA holding more than four sections down to four.
pub fn constraint_repair(
    rng: &mut SearchRng,
    picks: Vec<Assignment>,
    shape: (usize, usize),
) -> Assignment {
    let Some(mut grid) = picks.into_iter().next() else {
        return random_solution(rng, shape);
    };
    for ta in 0..grid.rows() {
        let assigned = grid.assigned_sections(ta);
        if assigned.len() > 4 {
            for section in rng.sample_distinct(&assigned, assigned.len() - 4) {
                grid.set(ta, section, false);
            }
        }
    }
    grid
}

fn is_degenerate(grid: &Assignment) -> bool {
    grid.rows() == 0 || grid.cols() == 0
}

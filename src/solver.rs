//! Bounded best-first (A*-style) search over board states.
//!
//! The solver validates generated levels and produces hints. It is not
//! exhaustive: a per-tier state budget and depth cap keep every run inside
//! interactive time, and a run that hits either one reports
//! [`SolveOutcome::Unsolvable`] exactly like a run that ran out of states.
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{BoardState, Move};
use crate::heuristics::{all_legal_moves, estimate, search_moves, HeuristicWeights};

/// State-count and depth cap bounding one solver run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBudget {
    /// Distinct states the search may discover before giving up.
    pub max_states: usize,
    /// Nodes whose path has this many moves are not expanded.
    pub max_depth: usize,
}

impl SearchBudget {
    pub const fn new(max_states: usize, max_depth: usize) -> Self {
        SearchBudget { max_states, max_depth }
    }

    /// No caps at all. Only sensible on small boards.
    pub const fn unbounded() -> Self {
        SearchBudget::new(usize::MAX, usize::MAX)
    }
}

/// Verdict of one solver run.
///
/// `Unsolvable` covers both "the reachable space was exhausted" and "the
/// budget ran out"; callers must not read it as a proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolveOutcome {
    /// The first move sequence discovered, root to solved state.
    Solvable(Vec<Move>),
    Unsolvable,
}

impl SolveOutcome {
    pub fn is_solvable(&self) -> bool {
        matches!(self, SolveOutcome::Solvable(_))
    }

    pub fn moves(&self) -> Option<&[Move]> {
        match self {
            SolveOutcome::Solvable(moves) => Some(moves),
            SolveOutcome::Unsolvable => None,
        }
    }
}

/// Outcome plus the number of distinct states the run discovered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolveReport {
    pub outcome: SolveOutcome,
    pub explored: usize,
}

struct SearchNode {
    state: BoardState,
    depth: usize,
    /// Index into the trail of the move that produced this node.
    trail: Option<usize>,
    priority: u32,
    seq: u64,
}

// BinaryHeap is a max-heap: the lowest priority must compare greatest.
// Ties go to the node inserted first.
impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for SearchNode {}

fn rebuild_path(trail: &[(Option<usize>, Move)], mut cursor: Option<usize>) -> Vec<Move> {
    let mut path = Vec::new();
    while let Some(idx) = cursor {
        let (parent, mv) = trail[idx];
        path.push(mv);
        cursor = parent;
    }
    path.reverse();
    path
}

/// A* search configured with heuristic weights and a budget.
#[derive(Clone, Debug)]
pub struct Solver {
    weights: HeuristicWeights,
    budget: SearchBudget,
}

impl Solver {
    pub fn new(weights: HeuristicWeights, budget: SearchBudget) -> Self {
        Solver { weights, budget }
    }

    pub fn budget(&self) -> SearchBudget {
        self.budget
    }

    pub fn weights(&self) -> &HeuristicWeights {
        &self.weights
    }

    /// Searches for a move sequence that completes `root`.
    ///
    /// States are treated as immutable values: every expansion produces a new
    /// `BoardState`, and a state is recorded as visited the first time it is
    /// generated. Priority is `path length + estimate`; states the heuristic
    /// proves stuck are never queued.
    pub fn solve(&self, root: &BoardState) -> SolveReport {
        let Some(root_estimate) = estimate(root, &self.weights) else {
            debug!("root state is heuristically unreachable");
            return SolveReport {
                outcome: SolveOutcome::Unsolvable,
                explored: 1,
            };
        };

        let mut visited: HashSet<BoardState> = HashSet::new();
        visited.insert(root.clone());
        let mut trail: Vec<(Option<usize>, Move)> = Vec::new();
        let mut open = BinaryHeap::new();
        let mut seq = 0u64;
        open.push(SearchNode {
            state: root.clone(),
            depth: 0,
            trail: None,
            priority: root_estimate,
            seq,
        });

        while let Some(node) = open.pop() {
            if node.state.is_complete() {
                let path = rebuild_path(&trail, node.trail);
                debug!(explored = visited.len(), moves = path.len(), "solver found a solution");
                return SolveReport {
                    outcome: SolveOutcome::Solvable(path),
                    explored: visited.len(),
                };
            }
            if node.depth >= self.budget.max_depth {
                continue;
            }

            for mv in search_moves(&node.state) {
                let next = node.state.pour(mv);
                if visited.contains(&next) {
                    continue;
                }
                visited.insert(next.clone());
                if visited.len() > self.budget.max_states {
                    debug!(
                        max_states = self.budget.max_states,
                        "solver state budget exhausted"
                    );
                    return SolveReport {
                        outcome: SolveOutcome::Unsolvable,
                        explored: visited.len(),
                    };
                }
                let Some(h) = estimate(&next, &self.weights) else {
                    continue;
                };
                trail.push((node.trail, mv));
                seq += 1;
                let depth = node.depth + 1;
                open.push(SearchNode {
                    state: next,
                    depth,
                    trail: Some(trail.len() - 1),
                    priority: depth as u32 + h,
                    seq,
                });
            }
        }

        debug!(explored = visited.len(), "solver exhausted the open set");
        SolveReport {
            outcome: SolveOutcome::Unsolvable,
            explored: visited.len(),
        }
    }
}

/// Breadth-first reachability over every legal pour, with no pruning and no
/// heuristic. Returns `None` if more than `max_states` states were discovered
/// before an answer.
///
/// Exponential in general; it exists to cross-check the pruned search on
/// small boards.
pub fn is_solvable_exhaustive(root: &BoardState, max_states: usize) -> Option<bool> {
    let mut visited: HashSet<BoardState> = HashSet::new();
    visited.insert(root.clone());
    let mut queue = VecDeque::from([root.clone()]);

    while let Some(state) = queue.pop_front() {
        if state.is_complete() {
            return Some(true);
        }
        for mv in all_legal_moves(&state) {
            let next = state.pour(mv);
            if visited.insert(next.clone()) {
                if visited.len() > max_states {
                    return None;
                }
                queue.push_back(next);
            }
        }
    }
    Some(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DEFAULT_CAPACITY;
    use crate::utils::board_from_rows;

    fn board(rows: &[&str]) -> BoardState {
        board_from_rows(rows, DEFAULT_CAPACITY).unwrap()
    }

    fn replay(root: &BoardState, moves: &[Move]) -> BoardState {
        let mut state = root.clone();
        for &mv in moves {
            assert!(state.can_pour(mv.source, mv.target), "illegal move {} in path", mv);
            state.apply_pour(mv);
        }
        state
    }

    #[test]
    fn test_solve_already_complete() {
        let solver = Solver::new(HeuristicWeights::default(), SearchBudget::new(100, 10));
        let report = solver.solve(&board(&["RRRR", "GGGG", ""]));
        assert_eq!(report.outcome, SolveOutcome::Solvable(vec![]));
    }

    #[test]
    fn test_solve_single_move() {
        let solver = Solver::new(HeuristicWeights::default(), SearchBudget::new(100, 10));
        let root = board(&["RRR", "GGGG", "R"]);
        let report = solver.solve(&root);
        let moves = report.outcome.moves().expect("solvable");
        assert_eq!(moves.len(), 1);
        assert!(replay(&root, moves).is_complete());
    }

    #[test]
    fn test_solve_tutorial_example() {
        let root = board(&["RGBR", "GBRG", "BRGB", ""]);
        let solver = Solver::new(HeuristicWeights::default(), SearchBudget::new(20_000, 40));
        let report = solver.solve(&root);
        let moves = report.outcome.moves().expect("tutorial example is solvable");
        assert!(replay(&root, moves).is_complete());
        assert_eq!(is_solvable_exhaustive(&root, 100_000), Some(true));
    }

    #[test]
    fn test_solve_root_unreachable() {
        let solver = Solver::new(HeuristicWeights::default(), SearchBudget::new(1_000, 10));
        let report = solver.solve(&board(&["RRR", "GGGG", ""]));
        assert_eq!(report.outcome, SolveOutcome::Unsolvable);
    }

    #[test]
    fn test_solve_no_moves_available() {
        // Every container full, nothing sorted: no pour is legal.
        let root = board(&["RGRG", "GRGR"]);
        let solver = Solver::new(HeuristicWeights::default(), SearchBudget::unbounded());
        assert_eq!(solver.solve(&root).outcome, SolveOutcome::Unsolvable);
        assert_eq!(is_solvable_exhaustive(&root, 1_000), Some(false));
    }

    #[test]
    fn test_depth_cap_gives_up() {
        let root = board(&["RGBR", "GBRG", "BRGB", ""]);
        let solver = Solver::new(HeuristicWeights::default(), SearchBudget::new(100_000, 2));
        assert_eq!(solver.solve(&root).outcome, SolveOutcome::Unsolvable);
    }

    #[test]
    fn test_state_budget_gives_up() {
        let root = board(&["RGBR", "GBRG", "BRGB", ""]);
        let solver = Solver::new(HeuristicWeights::default(), SearchBudget::new(3, 100));
        let report = solver.solve(&root);
        assert_eq!(report.outcome, SolveOutcome::Unsolvable);
        assert_eq!(report.explored, 4);
    }

    #[test]
    fn test_solution_is_deterministic() {
        let root = board(&["RGBR", "GBRG", "BRGB", ""]);
        let solver = Solver::new(HeuristicWeights::default(), SearchBudget::new(20_000, 40));
        assert_eq!(solver.solve(&root), solver.solve(&root));
    }

    #[test]
    fn test_exhaustive_respects_state_cap() {
        let root = board(&["RGBR", "GBRG", "BRGB", ""]);
        assert_eq!(is_solvable_exhaustive(&root, 2), None);
    }
}

//! State evaluation and move generation for the search.
//!
//! `estimate` scores how unsorted a board is; `search_moves` produces the
//! pruned move set the solver expands. The player-facing legality check is
//! [`BoardState::can_pour`], which is deliberately more permissive.
use serde::{Deserialize, Serialize};

use crate::engine::{BoardState, Color, Container, Move};

/// Penalty weights used by [`estimate`].
///
/// The exact values are empirical. What matters is the ordering: a mixed
/// container costs more than a pure but incomplete one, and a buried match
/// costs more than one sitting on top of its container.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicWeights {
    /// Flat cost of a container holding more than one color.
    pub mixed_container: u32,
    /// Cost per unit that differs from the container's majority color.
    pub misplaced_unit: u32,
    /// Extra cost when the majority color already has `large_majority_threshold` units.
    pub large_majority: u32,
    pub large_majority_threshold: usize,
    /// Pure, incomplete container whose color sits on top of another container.
    pub accessible_match: u32,
    /// Pure, incomplete container whose color is only found buried elsewhere.
    pub buried_match: u32,
    /// The last move did not complete its target.
    pub incomplete_move: u32,
    /// The last move left part of its run behind in the source.
    pub split_run: u32,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        HeuristicWeights {
            mixed_container: 10,
            misplaced_unit: 3,
            large_majority: 5,
            large_majority_threshold: 3,
            accessible_match: 2,
            buried_match: 4,
            incomplete_move: 1,
            split_run: 3,
        }
    }
}

/// Where the nearest other unit of a color was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MatchSite {
    Top,
    Buried,
}

fn find_match(board: &BoardState, skip: usize, color: Color) -> Option<MatchSite> {
    let mut found = None;
    for (idx, container) in board.containers().iter().enumerate() {
        if idx == skip {
            continue;
        }
        if container.top_color() == Some(color) {
            return Some(MatchSite::Top);
        }
        if container.units().iter().any(|u| u.color == color) {
            found = Some(MatchSite::Buried);
        }
    }
    found
}

fn majority_count(container: &Container) -> usize {
    let mut counts = [0usize; Color::PALETTE.len()];
    for unit in container.units() {
        counts[unit.color as usize] += 1;
    }
    counts.into_iter().max().unwrap_or(0)
}

/// Estimates the remaining difficulty of `board`.
///
/// Returns `None` when the board is locally proven unsolvable: a pure,
/// incomplete container whose color appears nowhere else can never be
/// filled. Callers treat `None` as +infinity and discard the state.
pub fn estimate(board: &BoardState, weights: &HeuristicWeights) -> Option<u32> {
    let mut score = 0u32;

    for (idx, container) in board.containers().iter().enumerate() {
        let Some(top) = container.top_color() else {
            continue;
        };

        if !container.is_uniform() {
            let majority = majority_count(container);
            let misplaced = (container.len() - majority) as u32;
            score += weights.mixed_container + weights.misplaced_unit * misplaced;
            if majority >= weights.large_majority_threshold {
                score += weights.large_majority;
            }
        } else if !container.is_full() {
            match find_match(board, idx, top)? {
                MatchSite::Top => score += weights.accessible_match,
                MatchSite::Buried => score += weights.buried_match,
            }
        }
    }

    if let Some(mv) = board.last_move() {
        let containers = board.containers();
        let target = &containers[mv.target];
        if !target.is_completed() {
            score += weights.incomplete_move;
        }
        let source_top = containers[mv.source].top_color();
        if source_top.is_some() && source_top == target.top_color() {
            score += weights.split_run;
        }
    }

    Some(score)
}

/// Generates the moves the solver expands from `board`.
///
/// Starts from every pour [`BoardState::can_pour`] allows and drops the ones
/// that can never help:
/// - pours out of a completed container;
/// - pours that would relocate a source's entire content, as one run, into an
///   empty container. The result is the same layout with two containers
///   swapped.
///
/// Truncating pours onto a same-colored target stay in the set; excluding them
/// loses solutions on some boards.
pub fn search_moves(board: &BoardState) -> Vec<Move> {
    let containers = board.containers();
    let mut moves = Vec::new();

    for (source, src) in containers.iter().enumerate() {
        if src.is_empty() || src.is_completed() {
            continue;
        }
        let run = src.run_length();
        for (target, dst) in containers.iter().enumerate() {
            if !board.can_pour(source, target) {
                continue;
            }
            if dst.is_empty() && run == src.len() {
                continue;
            }
            moves.push(Move::new(source, target));
        }
    }
    moves
}

/// Every pour [`BoardState::can_pour`] allows, with no pruning.
pub fn all_legal_moves(board: &BoardState) -> Vec<Move> {
    let n = board.len();
    (0..n)
        .flat_map(|s| (0..n).map(move |t| Move::new(s, t)))
        .filter(|mv| board.can_pour(mv.source, mv.target))
        .collect()
}

/// Chooses the search move whose successor has the lowest estimate.
///
/// Ties keep the first move in [`search_moves`] order. Returns `None` when no
/// move leads to a state that is not provably stuck.
pub fn choose_greedy_move(board: &BoardState, weights: &HeuristicWeights) -> Option<Move> {
    search_moves(board)
        .into_iter()
        .filter_map(|mv| estimate(&board.pour(mv), weights).map(|score| (score, mv)))
        .min_by_key(|(score, _)| *score)
        .map(|(_, mv)| mv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DEFAULT_CAPACITY;
    use crate::utils::board_from_rows;

    fn board(rows: &[&str]) -> BoardState {
        board_from_rows(rows, DEFAULT_CAPACITY).unwrap()
    }

    #[test]
    fn test_estimate_solved_board_is_zero() {
        let w = HeuristicWeights::default();
        assert_eq!(estimate(&board(&["RRRR", "GGGG", ""]), &w), Some(0));
    }

    #[test]
    fn test_estimate_mixed_container() {
        let w = HeuristicWeights::default();
        // Majority 2 of 4: mixed + 2 misplaced, below the large-majority threshold.
        let b = board(&["RRGB", "GGGB", "BBRR", ""]);
        let first = estimate(&board(&["RRGB", "", "", ""]), &w);
        assert_eq!(first, Some(10 + 3 * 2));
        // "GGGB" has a majority of 3, which pays the extra penalty.
        let only_second = estimate(&board(&["", "GGGB", "", ""]), &w);
        assert_eq!(only_second, Some(10 + 3 + 5));
        assert!(estimate(&b, &w).unwrap() > only_second.unwrap());
    }

    #[test]
    fn test_estimate_pure_incomplete_accessible_vs_buried() {
        let w = HeuristicWeights::default();
        let accessible = estimate(&board(&["RRR", "GGGR", "GGGG"]), &w).unwrap();
        let buried = estimate(&board(&["RRR", "GGRG", "GGGG"]), &w).unwrap();
        assert!(buried > accessible);
    }

    #[test]
    fn test_estimate_unreachable_when_color_missing_elsewhere() {
        let w = HeuristicWeights::default();
        // Only three reds exist: the red container can never be completed.
        assert_eq!(estimate(&board(&["RRR", "GGGG", ""]), &w), None);
    }

    #[test]
    fn test_estimate_mixed_outweighs_incomplete_pure() {
        let w = HeuristicWeights::default();
        let mixed = estimate(&board(&["RG", "GR", ""]), &w).unwrap();
        let pure = estimate(&board(&["RR", "GG", "RRGG"]), &w).unwrap();
        assert!(mixed > 0);
        assert!(pure > 0);
        let single_mixed = estimate(&board(&["RGRR", "GGG", ""]), &w).unwrap();
        let single_pure = estimate(&board(&["RRR", "GGGG", "R"]), &w).unwrap();
        assert!(single_mixed > single_pure);
    }

    #[test]
    fn test_estimate_last_move_penalties() {
        let w = HeuristicWeights::default();
        // Only one of the two top reds fits: the target completes but the run is split.
        let split = board(&["GRR", "RRR", "G"]).pour(Move::new(0, 1));
        let split_layout = board(&["GR", "RRRR", "G"]);
        assert_eq!(split, split_layout);
        assert_eq!(
            estimate(&split, &w).unwrap(),
            estimate(&split_layout, &w).unwrap() + w.split_run
        );

        // Whole run moved, target still incomplete.
        let incomplete = board(&["GR", "R", "RG"]).pour(Move::new(0, 1));
        let incomplete_layout = board(&["G", "RR", "RG"]);
        assert_eq!(
            estimate(&incomplete, &w).unwrap(),
            estimate(&incomplete_layout, &w).unwrap() + w.incomplete_move
        );
    }

    #[test]
    fn test_search_moves_skips_completed_sources() {
        let b = board(&["RRRR", "GB", ""]);
        let moves = search_moves(&b);
        assert!(moves.iter().all(|m| m.source != 0));
        assert!(moves.contains(&Move::new(1, 2)));
    }

    #[test]
    fn test_search_moves_skips_whole_container_relocation() {
        let b = board(&["RR", "GB", ""]);
        let moves = search_moves(&b);
        assert!(!moves.contains(&Move::new(0, 2)));
        assert!(moves.contains(&Move::new(1, 2)));
        // The permissive set still allows it.
        assert!(all_legal_moves(&b).contains(&Move::new(0, 2)));
    }

    #[test]
    fn test_search_moves_keeps_truncating_pours() {
        let b = board(&["GRRR", "BBR", "B"]);
        assert!(search_moves(&b).contains(&Move::new(0, 1)));
    }

    #[test]
    fn test_search_moves_subset_of_legal_moves() {
        let b = board(&["RGBR", "GBRG", "BRGB", ""]);
        let legal = all_legal_moves(&b);
        let pruned = search_moves(&b);
        assert!(pruned.iter().all(|m| legal.contains(m)));
        assert_eq!(pruned, vec![Move::new(0, 3), Move::new(1, 3), Move::new(2, 3)]);
    }

    #[test]
    fn test_choose_greedy_move_prefers_joining() {
        let w = HeuristicWeights::default();
        let b = board(&["GRRR", "R", "", "GGG"]);
        // Joining reds into container 1 beats splitting into the empty container.
        assert_eq!(choose_greedy_move(&b, &w), Some(Move::new(0, 1)));
        assert_eq!(choose_greedy_move(&board(&["RRRR", ""]), &w), None);
    }
}

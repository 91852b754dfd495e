//! The live game: one mutable board, an undo history, score and selection.
//!
//! A `GameSession` is the only owner of its history. Illegal taps and pours
//! are ignored rather than reported as errors, since a player mis-tapping is
//! the normal case.
use crate::engine::{BoardState, Color, Move};
use crate::generator::GeneratedLevel;
use crate::heuristics::choose_greedy_move;
use crate::solver::Solver;
use crate::tier::Tier;

/// Points awarded per completed container.
pub const COMPLETED_CONTAINER_POINTS: i64 = 1000;
/// Points deducted per move made.
pub const MOVE_PENALTY: i64 = 10;

/// Change notifications for a presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Anything visible changed: board, selection or completion.
    StateChanged,
    /// A pour committed; `transferred` units moved from `source` to `target`.
    PourOccurred {
        source: usize,
        target: usize,
        transferred: usize,
    },
    LevelCompleted,
    ScoreChanged(u32),
    MovesChanged(u32),
}

/// Receives [`SessionEvent`]s. Any `FnMut(&SessionEvent)` closure qualifies.
pub trait SessionObserver {
    fn on_event(&mut self, event: &SessionEvent);
}

impl<F: FnMut(&SessionEvent)> SessionObserver for F {
    fn on_event(&mut self, event: &SessionEvent) {
        self(event)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Playing,
    /// Taps and pours are ignored until `undo` or `reset`.
    LevelComplete,
}

/// What a [`GameSession::tap`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapOutcome {
    Selected(usize),
    Deselected,
    /// A pour committed, moving this many units.
    Poured(usize),
    /// A pour was attempted but is not legal; the selection is cleared.
    Rejected,
    /// Nothing happened: empty or out-of-range container with no selection,
    /// or the level is already complete.
    Ignored,
}

struct Snapshot {
    board: BoardState,
    score: u32,
    moves: u32,
}

pub struct GameSession {
    tier: Option<Tier>,
    validated: bool,
    initial: BoardState,
    board: BoardState,
    history: Vec<Snapshot>,
    score: u32,
    moves: u32,
    selected: Option<usize>,
    phase: Phase,
    observers: Vec<Box<dyn SessionObserver>>,
}

/// `max(0, 1000 × completed − 10 × moves)`.
pub fn score_for(completed: usize, moves: u32) -> u32 {
    let raw = COMPLETED_CONTAINER_POINTS * completed as i64 - MOVE_PENALTY * moves as i64;
    raw.clamp(0, u32::MAX as i64) as u32
}

impl GameSession {
    /// Starts a session on `initial`, which becomes the reset target.
    pub fn new(initial: BoardState) -> Self {
        let score = score_for(initial.completed_count(), 0);
        let phase = if initial.is_complete() {
            Phase::LevelComplete
        } else {
            Phase::Playing
        };
        GameSession {
            tier: None,
            validated: false,
            board: initial.clone(),
            initial,
            history: Vec::new(),
            score,
            moves: 0,
            selected: None,
            phase,
            observers: Vec::new(),
        }
    }

    pub fn from_level(level: GeneratedLevel) -> Self {
        let mut session = GameSession::new(level.board);
        session.tier = Some(level.tier);
        session.validated = level.validated;
        session
    }

    pub fn subscribe(&mut self, observer: impl SessionObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn emit(&mut self, event: SessionEvent) {
        for observer in self.observers.iter_mut() {
            observer.on_event(&event);
        }
    }

    pub fn tier(&self) -> Option<Tier> {
        self.tier
    }

    /// False if the layout is the generator's unvalidated fallback.
    pub fn is_validated(&self) -> bool {
        self.validated
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn initial_board(&self) -> &BoardState {
        &self.initial
    }

    pub fn columns(&self) -> Vec<Vec<Color>> {
        self.board.color_columns()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::LevelComplete
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Select-then-pour input handling.
    ///
    /// With nothing selected, a non-empty container becomes selected. With a
    /// selection, tapping the same container deselects it and tapping another
    /// one attempts a pour; the selection is cleared either way.
    pub fn tap(&mut self, index: usize) -> TapOutcome {
        if self.is_complete() {
            return TapOutcome::Ignored;
        }
        let outcome = match self.selected.take() {
            None => match self.board.container(index) {
                Some(container) if !container.is_empty() => {
                    self.selected = Some(index);
                    TapOutcome::Selected(index)
                }
                _ => return TapOutcome::Ignored,
            },
            Some(source) if source == index => TapOutcome::Deselected,
            Some(source) => match self.commit_pour(source, index) {
                Some(transferred) => TapOutcome::Poured(transferred),
                None => TapOutcome::Rejected,
            },
        };
        self.emit(SessionEvent::StateChanged);
        outcome
    }

    /// Pours directly, bypassing selection. Returns the number of units moved,
    /// or `None` with nothing changed if the pour is illegal.
    pub fn pour(&mut self, source: usize, target: usize) -> Option<usize> {
        let transferred = self.commit_pour(source, target)?;
        self.selected = None;
        self.emit(SessionEvent::StateChanged);
        Some(transferred)
    }

    fn commit_pour(&mut self, source: usize, target: usize) -> Option<usize> {
        if self.is_complete() || !self.board.can_pour(source, target) {
            return None;
        }
        self.history.push(Snapshot {
            board: self.board.clone(),
            score: self.score,
            moves: self.moves,
        });
        let transferred = self.board.apply_pour(Move::new(source, target))?;
        self.moves += 1;
        self.emit(SessionEvent::PourOccurred {
            source,
            target,
            transferred,
        });
        self.emit(SessionEvent::MovesChanged(self.moves));

        self.score = score_for(self.board.completed_count(), self.moves);
        self.emit(SessionEvent::ScoreChanged(self.score));

        if self.board.is_complete() {
            self.phase = Phase::LevelComplete;
            self.emit(SessionEvent::LevelCompleted);
        }
        Some(transferred)
    }

    /// Restores the most recent snapshot verbatim. Returns false if there is
    /// nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.pop() else {
            return false;
        };
        self.board = snapshot.board;
        self.score = snapshot.score;
        self.moves = snapshot.moves;
        self.phase = Phase::Playing;
        self.selected = None;
        self.emit(SessionEvent::MovesChanged(self.moves));
        self.emit(SessionEvent::ScoreChanged(self.score));
        self.emit(SessionEvent::StateChanged);
        true
    }

    /// Back to the generated layout with an empty history.
    pub fn reset(&mut self) {
        self.board = self.initial.clone();
        self.history.clear();
        self.moves = 0;
        self.score = score_for(self.board.completed_count(), 0);
        self.selected = None;
        self.phase = if self.board.is_complete() {
            Phase::LevelComplete
        } else {
            Phase::Playing
        };
        self.emit(SessionEvent::MovesChanged(self.moves));
        self.emit(SessionEvent::ScoreChanged(self.score));
        self.emit(SessionEvent::StateChanged);
    }

    /// Suggests the next move: the first step of a solver path from the
    /// current board, or the greedy choice if the solver gives up.
    pub fn hint(&self, solver: &Solver) -> Option<Move> {
        if self.is_complete() {
            return None;
        }
        let report = solver.solve(&self.board);
        match report.outcome.moves().and_then(|moves| moves.first()) {
            Some(&mv) => Some(mv),
            None => choose_greedy_move(&self.board, solver.weights()),
        }
    }
}

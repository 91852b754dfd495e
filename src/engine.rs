//! Core rules engine for the pour sort puzzle.
//!
//! This module defines the game's fundamental components:
//! - `Color` and `UnitKind`: the palette and the phase of matter a unit belongs to.
//! - `Unit`: a single colored token occupying one slot of a container.
//! - `Container`: a capacity-bounded stack of units of one accepted kind.
//! - `Move`: a `(source, target)` pair of container indices.
//! - `BoardState`: an ordered snapshot of all containers, with pour legality,
//!   pour application and the completion predicate.
use std::fmt;
use std::hash::{Hash, Hasher};

/// The canonical number of units a container holds.
pub const DEFAULT_CAPACITY: usize = 4;

/// One entry of the fixed palette.
///
/// Colors are plain tags, so equality and hashing never depend on how a
/// presentation layer chooses to render them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
    Cyan,
    Teal,
    Gray,
    Brown,
    Mint,
    Indigo,
    Pink,
}

impl Color {
    /// Every palette color, in the order levels draw them from.
    pub const PALETTE: [Color; 13] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Purple,
        Color::Orange,
        Color::Cyan,
        Color::Teal,
        Color::Gray,
        Color::Brown,
        Color::Mint,
        Color::Indigo,
        Color::Pink,
    ];

    /// Converts the color to its single-letter code.
    ///
    /// # Examples
    ///
    /// ```
    /// use pour_sort::engine::Color;
    /// assert_eq!(Color::Red.to_char(), 'R');
    /// assert_eq!(Color::Gray.to_char(), 'A');
    /// ```
    pub fn to_char(&self) -> char {
        match self {
            Color::Red => 'R',
            Color::Blue => 'B',
            Color::Green => 'G',
            Color::Yellow => 'Y',
            Color::Purple => 'P',
            Color::Orange => 'O',
            Color::Cyan => 'C',
            Color::Teal => 'T',
            Color::Gray => 'A',
            Color::Brown => 'N',
            Color::Mint => 'M',
            Color::Indigo => 'I',
            Color::Pink => 'K',
        }
    }

    /// Parses a single-letter code, case-insensitively.
    pub fn from_char(ch: char) -> Option<Color> {
        let up = ch.to_ascii_uppercase();
        Color::PALETTE.iter().copied().find(|c| c.to_char() == up)
    }

    /// Returns the ANSI background color code used for terminal output.
    fn to_ansi_color_code(&self) -> &'static str {
        match self {
            Color::Red => "41",
            Color::Green => "42",
            Color::Yellow => "43",
            Color::Blue => "44",
            Color::Purple => "45",
            Color::Cyan => "46",
            Color::Gray => "100",
            Color::Orange => "101",
            Color::Mint => "102",
            Color::Brown => "103",
            Color::Indigo => "104",
            Color::Pink => "105",
            Color::Teal => "106",
        }
    }
}

/// The phase of matter of a unit. A container only accepts one kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UnitKind {
    #[default]
    Liquid,
    Solid,
    Gas,
}

/// An immutable colored token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Unit {
    pub color: Color,
    pub kind: UnitKind,
}

impl Unit {
    pub fn new(color: Color, kind: UnitKind) -> Self {
        Unit { color, kind }
    }

    pub fn liquid(color: Color) -> Self {
        Unit::new(color, UnitKind::Liquid)
    }
}

/// A capacity-bounded stack of units, stored bottom to top.
///
/// The only mutators are [`Container::push_run`] and [`Container::pop_run`].
/// Both panic on a contract violation (overflow, underflow, wrong kind): the
/// board invariants make those unreachable, so they are bugs, not runtime errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Container {
    capacity: usize,
    accepts: UnitKind,
    units: Vec<Unit>,
}

impl Container {
    /// Creates an empty container.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize, accepts: UnitKind) -> Self {
        assert!(capacity > 0, "container capacity must be positive");
        Container {
            capacity,
            accepts,
            units: Vec::with_capacity(capacity),
        }
    }

    /// Creates a container pre-filled with `units` (bottom first).
    ///
    /// # Panics
    /// Panics if the units do not fit or are of a different kind.
    pub fn with_units(capacity: usize, accepts: UnitKind, units: Vec<Unit>) -> Self {
        let mut container = Container::new(capacity, accepts);
        container.push_run(&units);
        container
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn accepts(&self) -> UnitKind {
        self.accepts
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.units.len() >= self.capacity
    }

    pub fn free_space(&self) -> usize {
        self.capacity - self.units.len()
    }

    pub fn top(&self) -> Option<Unit> {
        self.units.last().copied()
    }

    pub fn top_color(&self) -> Option<Color> {
        self.top().map(|u| u.color)
    }

    /// Number of consecutive units at the top sharing the top unit's color.
    /// Zero for an empty container.
    pub fn run_length(&self) -> usize {
        let Some(top) = self.top_color() else {
            return 0;
        };
        self.units
            .iter()
            .rev()
            .take_while(|u| u.color == top)
            .count()
    }

    /// True if every unit shares one color. Empty containers are trivially uniform.
    pub fn is_uniform(&self) -> bool {
        match self.units.first() {
            Some(first) => self.units.iter().all(|u| u.color == first.color),
            None => true,
        }
    }

    /// A container that is full and holds a single color.
    pub fn is_completed(&self) -> bool {
        self.is_full() && self.is_uniform()
    }

    /// Appends `run` on top, preserving order.
    ///
    /// # Panics
    /// Panics if the run overflows the container or a unit is of the wrong kind.
    pub fn push_run(&mut self, run: &[Unit]) {
        assert!(
            run.len() <= self.free_space(),
            "push of {} units overflows container with {} free slots",
            run.len(),
            self.free_space()
        );
        for unit in run {
            assert_eq!(
                unit.kind, self.accepts,
                "container accepting {:?} cannot hold {:?}",
                self.accepts, unit.kind
            );
        }
        self.units.extend_from_slice(run);
    }

    /// Removes the top `count` units and returns them bottom first.
    ///
    /// # Panics
    /// Panics if fewer than `count` units are present.
    pub fn pop_run(&mut self, count: usize) -> Vec<Unit> {
        assert!(
            count <= self.units.len(),
            "pop of {} units underflows container holding {}",
            count,
            self.units.len()
        );
        self.units.split_off(self.units.len() - count)
    }
}

/// A pour from `source` to `target`, both container indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub source: usize,
    pub target: usize,
}

impl Move {
    pub fn new(source: usize, target: usize) -> Self {
        Move { source, target }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// A full snapshot of all containers at one point in time.
///
/// A container's index is its identity. Equality and hashing are structural
/// over the ordered color sequence of every container; `move_count` and
/// `last_move` are bookkeeping and do not take part, so two different paths
/// reaching the same layout compare equal.
#[derive(Clone, Debug)]
pub struct BoardState {
    containers: Vec<Container>,
    move_count: u32,
    last_move: Option<Move>,
}

impl PartialEq for BoardState {
    fn eq(&self, other: &Self) -> bool {
        self.containers.len() == other.containers.len()
            && self
                .containers
                .iter()
                .zip(&other.containers)
                .all(|(a, b)| {
                    a.len() == b.len()
                        && a.units().iter().zip(b.units()).all(|(x, y)| x.color == y.color)
                })
    }
}

impl Eq for BoardState {}

impl Hash for BoardState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.containers.len());
        for container in &self.containers {
            state.write_usize(container.len());
            for unit in container.units() {
                unit.color.hash(state);
            }
        }
    }
}

impl BoardState {
    pub fn new(containers: Vec<Container>) -> Self {
        BoardState {
            containers,
            move_count: 0,
            last_move: None,
        }
    }

    /// Builds a board of liquid containers from per-container color lists (bottom first).
    ///
    /// # Panics
    /// Panics if any list is longer than `capacity`.
    pub fn from_colors(capacity: usize, columns: &[Vec<Color>]) -> Self {
        let containers = columns
            .iter()
            .map(|colors| {
                let units = colors.iter().map(|&c| Unit::liquid(c)).collect();
                Container::with_units(capacity, UnitKind::Liquid, units)
            })
            .collect();
        BoardState::new(containers)
    }

    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    pub fn container(&self, index: usize) -> Option<&Container> {
        self.containers.get(index)
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    /// Per-container color sequences, bottom first. This is the query shape the
    /// presentation layer consumes.
    pub fn color_columns(&self) -> Vec<Vec<Color>> {
        self.containers
            .iter()
            .map(|c| c.units().iter().map(|u| u.color).collect())
            .collect()
    }

    pub fn total_units(&self) -> usize {
        self.containers.iter().map(Container::len).sum()
    }

    /// Number of containers that are full and single-colored.
    pub fn completed_count(&self) -> usize {
        self.containers.iter().filter(|c| c.is_completed()).count()
    }

    /// Count of top units sharing the top color in container `index`, or 0
    /// if the index is out of range or the container is empty.
    pub fn run_length(&self, index: usize) -> usize {
        self.containers.get(index).map_or(0, Container::run_length)
    }

    /// Player-facing legality check.
    ///
    /// True iff the indices differ and are in range, the source is non-empty,
    /// the target is not full and accepts the source's kind, and the target is
    /// empty or shows the same top color. Pours that would be truncated by
    /// the target's free space are legal.
    pub fn can_pour(&self, source: usize, target: usize) -> bool {
        if source == target {
            return false;
        }
        let (Some(src), Some(dst)) = (self.containers.get(source), self.containers.get(target))
        else {
            return false;
        };
        let Some(top) = src.top() else {
            return false;
        };
        if dst.is_full() || dst.accepts() != top.kind {
            return false;
        }
        match dst.top_color() {
            None => true,
            Some(color) => color == top.color,
        }
    }

    /// Number of units a pour would transfer, 0 when the pour is illegal.
    pub fn pour_count(&self, source: usize, target: usize) -> usize {
        if !self.can_pour(source, target) {
            return 0;
        }
        let run = self.containers[source].run_length();
        run.min(self.containers[target].free_space())
    }

    /// Applies a pour in place and returns the number of units transferred,
    /// or `None` (state untouched) when the pour is illegal.
    pub fn apply_pour(&mut self, mv: Move) -> Option<usize> {
        let transfer = self.pour_count(mv.source, mv.target);
        if transfer == 0 {
            return None;
        }
        let run = self.containers[mv.source].pop_run(transfer);
        self.containers[mv.target].push_run(&run);
        self.move_count += 1;
        self.last_move = Some(mv);
        Some(transfer)
    }

    /// Returns the successor state for `mv`, leaving `self` untouched.
    ///
    /// An illegal move yields an unchanged copy.
    pub fn pour(&self, mv: Move) -> BoardState {
        let mut next = self.clone();
        next.apply_pour(mv);
        next
    }

    /// True iff every container is empty or full with a single color.
    pub fn is_complete(&self) -> bool {
        self.containers
            .iter()
            .all(|c| c.is_empty() || c.is_completed())
    }

    /// Renders the board with ANSI background colors, one container per line,
    /// highlighting `selected` with a marker.
    pub fn to_string_with_highlight(&self, selected: Option<usize>) -> String {
        let mut output = String::new();
        for (idx, container) in self.containers.iter().enumerate() {
            let marker = if selected == Some(idx) { '>' } else { ' ' };
            output.push_str(&format!("{}{:>2} |", marker, idx));
            for unit in container.units() {
                output.push_str(&format!(
                    "\x1b[1;{}m {} \x1b[m",
                    unit.color.to_ansi_color_code(),
                    unit.color.to_char()
                ));
            }
            for _ in 0..container.free_space() {
                output.push_str(" . ");
            }
            output.push('|');
            if idx + 1 < self.containers.len() {
                output.push('\n');
            }
        }
        output
    }
}

impl fmt::Display for BoardState {
    /// One container per line, bottom unit first, `.` for free slots.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, container) in self.containers.iter().enumerate() {
            let mut line: String = container.units().iter().map(|u| u.color.to_char()).collect();
            line.extend(std::iter::repeat('.').take(container.free_space()));
            if idx + 1 < self.containers.len() {
                writeln!(f, "{}", line)?;
            } else {
                write!(f, "{}", line)?;
            }
        }
        Ok(())
    }
}

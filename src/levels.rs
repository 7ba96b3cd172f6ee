//! Alternate views of a puzzle's configuration space.
//!
//! - normal: the reachability search over the pieces as placed
//! - sub: normal states reduced to their occupancy pattern (which cells are
//!   covered, not by whom), edges inherited
//! - micro: every occupied cell becomes its own unit piece, searched afresh
//! - super: independent searches over the pieces plus extra blocks dropped
//!   into empty space, one per generated layout
//!
//! [`Explorer`] builds levels lazily from one board and piece snapshot and
//! drops them whenever the inputs they depend on change.

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Tunables;
use crate::enumerate::{enumerate_all, unreachable_from, LARGE_ENUMERATION};
use crate::error::{Error, Result};
use crate::grid::{decode, encode, StateKey};
use crate::pieces::{Board, Configuration, Piece, Shape};
use crate::placement::pieces_overlap;
use crate::search::{check_pieces, check_start, explore};
use crate::space::StateSpace;

/// Abstraction level of a state space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Level {
    #[default]
    Normal,
    Sub,
    Micro,
    Super,
}

/// Merges states that cover the same cells.
///
/// Each state maps to its occupancy key; edges follow the base graph between
/// mapped endpoints, dropping collapsed self-loops and duplicates.
pub fn merge_occupancy(space: &StateSpace) -> StateSpace {
    let mut merged = StateSpace::new();
    for state in space.states() {
        merged.insert(state.to_occupancy());
    }
    for state in space.states() {
        let from = state.to_occupancy();
        for to in space.graph().neighbors(state) {
            merged.add_edge(&from, &to.to_occupancy());
        }
    }
    merged
}

/// One unit piece per occupied cell of the configuration, row-major.
pub fn micro_pieces(board: &Board, pieces: &[Piece]) -> Configuration {
    let occupancy = encode(board, pieces);
    occupancy
        .cells()
        .iter()
        .enumerate()
        .filter(|&(_, &label)| label > 0)
        .enumerate()
        .map(|(id, (idx, _))| Piece {
            id,
            x: (idx % board.width) as i32,
            y: (idx / board.width) as i32,
            shape: Shape::Rect {
                width: 1,
                height: 1,
            },
        })
        .collect()
}

/// Searches the configuration's occupied cells as independent unit pieces.
pub fn micro_space(board: &Board, pieces: &[Piece]) -> Result<StateSpace> {
    check_pieces(pieces)?;
    explore(board, &micro_pieces(board, pieces))
}

/// An empty axis-aligned rectangle of the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct EmptyRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Every empty rectangle of size 1x1 up to 2x2.
///
/// Ordered by height, then width, then row-major position, so all unit cells
/// come first.
pub fn available_spaces(board: &Board, pieces: &[Piece]) -> Vec<EmptyRect> {
    let occupancy = encode(board, pieces);
    let free = |x: usize, y: usize| occupancy.cells()[y * board.width + x] == 0;

    let mut spaces = Vec::new();
    for height in 1..=2usize {
        for width in 1..=2usize {
            for y in 0..(board.height + 1).saturating_sub(height) {
                for x in 0..(board.width + 1).saturating_sub(width) {
                    let empty = (y..y + height).all(|py| (x..x + width).all(|px| free(px, py)));
                    if empty {
                        spaces.push(EmptyRect {
                            x: x as i32,
                            y: y as i32,
                            width: width as i32,
                            height: height as i32,
                        });
                    }
                }
            }
        }
    }
    spaces
}

/// Block size dropped into `space` for layout `layout_index`.
///
/// Bar-shaped spaces alternate between a bar and a unit block across layouts.
fn extra_piece_size(space: &EmptyRect, layout_index: usize) -> (i32, i32) {
    let full = layout_index % 2 == 0;
    match (space.width, space.height) {
        (1, 2) => (1, if full { 2 } else { 1 }),
        (2, 1) => (if full { 2 } else { 1 }, 1),
        (width, height) => (width, height),
    }
}

/// The pieces plus up to `layout_index + 1` extra blocks taken in order from
/// `spaces`. A space whose block would overlap an earlier addition is skipped.
pub fn similar_layout(pieces: &[Piece], layout_index: usize, spaces: &[EmptyRect]) -> Configuration {
    let wanted = (layout_index + 1).min(spaces.len());
    let mut next_id = pieces.iter().map(|piece| piece.id + 1).max().unwrap_or(0);
    let mut layout = pieces.to_vec();
    let mut added = 0;

    for space in spaces {
        if added == wanted {
            break;
        }
        let (width, height) = extra_piece_size(space, layout_index);
        let piece = Piece {
            id: next_id,
            x: space.x,
            y: space.y,
            shape: Shape::Rect { width, height },
        };
        if layout.iter().any(|other| pieces_overlap(&piece, other)) {
            continue;
        }
        layout.push(piece);
        next_id += 1;
        added += 1;
    }

    layout
}

/// One generated layout and its independently searched state space.
#[derive(Clone, Debug)]
pub struct SuperLayout {
    pub id: String,
    pub name: String,
    pub description: String,
    pub pieces: Configuration,
    pub original_pieces: Configuration,
    pub space: StateSpace,
}

impl SuperLayout {
    pub fn pieces_added(&self) -> usize {
        self.pieces.len() - self.original_pieces.len()
    }
}

/// Builds `max(1, min(available spaces, limit))` layouts and searches each.
pub fn super_layouts(board: &Board, pieces: &[Piece], limit: usize) -> Result<Vec<SuperLayout>> {
    check_start(board, pieces)?;

    let spaces = available_spaces(board, pieces);
    let count = spaces.len().min(limit).max(1);

    (0..count)
        .map(|k| {
            let layout_pieces = similar_layout(pieces, k, &spaces);
            let space = explore(board, &layout_pieces)?;
            let added = layout_pieces.len() - pieces.len();
            if space.len() > LARGE_ENUMERATION {
                warn!(layout = k, states = space.len(), "large super layout space");
            }
            info!(
                layout = k,
                added,
                states = space.len(),
                "super layout searched"
            );
            Ok(SuperLayout {
                id: format!("layout_{k}"),
                name: format!("Similar Layout {}", k + 1),
                description: format!(
                    "Contains all original {} pieces plus {added} additional pieces",
                    pieces.len()
                ),
                pieces: layout_pieces,
                original_pieces: pieces.to_vec(),
                space,
            })
        })
        .collect()
}

/// A built level.
#[derive(Clone, Debug)]
pub enum LevelData {
    Normal(StateSpace),
    Sub(StateSpace),
    Micro(StateSpace),
    Super(Vec<SuperLayout>),
}

impl LevelData {
    pub fn level(&self) -> Level {
        match self {
            LevelData::Normal(_) => Level::Normal,
            LevelData::Sub(_) => Level::Sub,
            LevelData::Micro(_) => Level::Micro,
            LevelData::Super(_) => Level::Super,
        }
    }

    /// The level's single state space; `None` for the layout collection.
    pub fn states(&self) -> Option<&StateSpace> {
        match self {
            LevelData::Normal(space) | LevelData::Sub(space) | LevelData::Micro(space) => Some(space),
            LevelData::Super(_) => None,
        }
    }
}

/// What the active level currently shows.
#[derive(Clone, Copy, Debug)]
pub enum View<'a> {
    /// A plain state space.
    States { level: Level, space: &'a StateSpace },
    /// The super level's layout selection.
    Layouts(&'a [SuperLayout]),
    /// One super layout navigated into.
    Layout(&'a SuperLayout),
}

impl<'a> View<'a> {
    /// The state space on display, if the view is a single space.
    pub fn space(&self) -> Option<&'a StateSpace> {
        match *self {
            View::States { space, .. } => Some(space),
            View::Layout(layout) => Some(&layout.space),
            View::Layouts(_) => None,
        }
    }
}

/// Lazily built levels over one board and piece snapshot.
pub struct Explorer {
    board: Board,
    pieces: Configuration,
    tunables: Tunables,
    active: Level,
    focused_layout: Option<usize>,
    built: FxHashMap<Level, LevelData>,
    all_placements: Option<StateSpace>,
}

impl Explorer {
    /// Takes a private copy of `pieces`; the caller keeps ownership of its list.
    pub fn new(board: Board, pieces: &[Piece], tunables: Tunables) -> Self {
        Self {
            board,
            pieces: pieces.to_vec(),
            tunables,
            active: Level::Normal,
            focused_layout: None,
            built: FxHashMap::default(),
            all_placements: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    pub fn active(&self) -> Level {
        self.active
    }

    /// Whether `level` has been built since the last invalidation.
    pub fn is_built(&self, level: Level) -> bool {
        self.built.contains_key(&level)
    }

    fn invalidate(&mut self) {
        self.built.clear();
        self.all_placements = None;
        self.focused_layout = None;
    }

    /// Replaces the pieces; every level is rebuilt on next use.
    pub fn set_pieces(&mut self, pieces: &[Piece]) {
        self.pieces = pieces.to_vec();
        self.invalidate();
    }

    /// Changes the board. Pieces are cleared, since they may no longer fit.
    pub fn set_board(&mut self, board: Board) {
        self.board = board;
        self.pieces.clear();
        self.invalidate();
    }

    /// Replaces the tunables; drops the super level if its limit changed.
    pub fn set_tunables(&mut self, tunables: Tunables) {
        if tunables.super_limit() != self.tunables.super_limit() {
            self.built.remove(&Level::Super);
            self.focused_layout = None;
        }
        self.tunables = tunables;
    }

    fn build(&mut self, level: Level) -> Result<LevelData> {
        Ok(match level {
            Level::Normal => LevelData::Normal(explore(&self.board, &self.pieces)?),
            Level::Sub => {
                let normal = self.ensure(Level::Normal)?;
                LevelData::Sub(normal.states().map(merge_occupancy).unwrap_or_default())
            }
            Level::Micro => LevelData::Micro(micro_space(&self.board, &self.pieces)?),
            Level::Super => LevelData::Super(super_layouts(
                &self.board,
                &self.pieces,
                self.tunables.super_limit(),
            )?),
        })
    }

    /// Builds `level` if needed and returns it.
    pub fn ensure(&mut self, level: Level) -> Result<&LevelData> {
        if !self.built.contains_key(&level) {
            let data = self.build(level)?;
            info!(level = ?level, "level built");
            self.built.insert(level, data);
        }
        Ok(&self.built[&level])
    }

    /// Switches the active level, leaving any focused layout.
    pub fn activate(&mut self, level: Level) -> Result<View<'_>> {
        self.active = level;
        self.focused_layout = None;
        self.current()
    }

    /// The active level's view, building it if needed.
    pub fn current(&mut self) -> Result<View<'_>> {
        let level = self.active;
        let focused = self.focused_layout;
        Ok(match self.ensure(level)? {
            LevelData::Super(layouts) => match focused.and_then(|i| layouts.get(i)) {
                Some(layout) => View::Layout(layout),
                None => View::Layouts(layouts),
            },
            LevelData::Normal(space) | LevelData::Sub(space) | LevelData::Micro(space) => {
                View::States { level, space }
            }
        })
    }

    /// Navigates into one super layout by id.
    pub fn enter_layout(&mut self, id: &str) -> Result<&SuperLayout> {
        self.active = Level::Super;
        let LevelData::Super(layouts) = self.ensure(Level::Super)? else {
            return Err(Error::UnknownLayout(id.to_string()));
        };
        let index = layouts
            .iter()
            .position(|layout| layout.id == id)
            .ok_or_else(|| Error::UnknownLayout(id.to_string()))?;
        self.focused_layout = Some(index);
        match &self.built[&Level::Super] {
            LevelData::Super(layouts) => Ok(&layouts[index]),
            _ => Err(Error::UnknownLayout(id.to_string())),
        }
    }

    /// Returns from a focused layout to the layout selection.
    pub fn leave_layout(&mut self) -> Result<View<'_>> {
        self.activate(Level::Super)
    }

    /// Every legal placement of the pieces, built on first use.
    pub fn all_placements(&mut self) -> Result<&StateSpace> {
        if self.all_placements.is_none() {
            self.all_placements = Some(enumerate_all(&self.board, &self.pieces)?);
        }
        Ok(self.all_placements.get_or_insert_with(StateSpace::new))
    }

    /// Legal placements that cannot be reached from the current configuration.
    pub fn unreachable(&mut self) -> Result<Vec<StateKey>> {
        let start = encode(&self.board, &self.pieces);
        Ok(unreachable_from(self.all_placements()?, &start))
    }

    /// The configuration a state key stands for, for restoring a board.
    pub fn configuration_for(&self, key: &StateKey) -> Result<Configuration> {
        decode(&self.board, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::parse_board;

    fn unit(id: usize, x: i32, y: i32) -> Piece {
        Piece::rect(id, x, y, 1, 1).unwrap()
    }

    fn key(text: &str) -> StateKey {
        text.parse().unwrap()
    }

    fn corner() -> (Board, Vec<Piece>) {
        (Board::new(2, 2).unwrap(), vec![unit(0, 0, 0)])
    }

    #[test]
    fn test_sub_level_of_single_block_keeps_each_position() {
        let (board, pieces) = corner();
        let sub = merge_occupancy(&explore(&board, &pieces).unwrap());
        assert_eq!(sub.len(), 4);
        assert_eq!(sub.edge_count(), 8);
        assert!(sub.contains(&key("0,0,0,1")));
    }

    #[test]
    fn test_sub_level_merges_by_pattern() {
        let board = Board::new(3, 1).unwrap();
        let all = enumerate_all(&board, &[unit(0, 0, 0), unit(1, 1, 0)]).unwrap();
        let sub = merge_occupancy(&all);
        assert_eq!(all.len(), 6);
        assert_eq!(sub.len(), 3);
        for (from, edges) in sub.graph().iter() {
            assert!(!edges.contains(from));
        }
    }

    #[test]
    fn test_sub_level_drops_collapsed_edges() {
        let mut space = StateSpace::new();
        space.insert(key("1,2"));
        space.insert(key("2,1"));
        space.add_edge(&key("1,2"), &key("2,1"));
        let sub = merge_occupancy(&space);
        assert_eq!(sub.len(), 1);
        assert_eq!(sub.edge_count(), 0);
    }

    #[test]
    fn test_micro_pieces_split_every_cell() {
        let (board, pieces) = parse_board("AAB\n..B\nC..").unwrap();
        let micro = micro_pieces(&board, &pieces);
        assert_eq!(micro.len(), 5);
        assert!(micro.iter().all(|p| p.cell_count() == 1 && !p.is_custom()));
        assert_eq!((micro[2].x, micro[2].y), (2, 0));
        assert_eq!(micro[4].id, 4);

        let space = micro_space(&board, &pieces).unwrap();
        assert_eq!(space.states()[0], encode(&board, &micro));
        assert!(space.len() > 1);
    }

    #[test]
    fn test_micro_space_has_no_self_loops() {
        let (board, pieces) = parse_board("AA.\n...").unwrap();
        let space = micro_space(&board, &pieces).unwrap();
        // two unit blocks on six cells
        assert_eq!(space.len(), 30);
        assert!(space.edge_count() > 0);
        for (from, edges) in space.graph().iter() {
            assert!(!edges.contains(from), "{from}");
        }
    }

    #[test]
    fn test_available_spaces_order() {
        let (board, pieces) = corner();
        let spaces = available_spaces(&board, &pieces);
        let shapes: Vec<(i32, i32, i32, i32)> = spaces
            .iter()
            .map(|s| (s.x, s.y, s.width, s.height))
            .collect();
        assert_eq!(
            shapes,
            vec![
                (1, 0, 1, 1),
                (0, 1, 1, 1),
                (1, 1, 1, 1),
                (0, 1, 2, 1),
                (1, 0, 1, 2),
            ]
        );
    }

    #[test]
    fn test_available_spaces_on_narrow_board() {
        let board = Board::new(1, 1).unwrap();
        assert_eq!(available_spaces(&board, &[]).len(), 1);
        assert!(available_spaces(&board, &[unit(0, 0, 0)]).is_empty());
    }

    #[test]
    fn test_super_layouts_add_growing_piece_counts() {
        let (board, pieces) = corner();
        let layouts = super_layouts(&board, &pieces, 8).unwrap();

        assert_eq!(layouts.len(), 5);
        assert_eq!(layouts[0].id, "layout_0");
        assert_eq!(layouts[0].name, "Similar Layout 1");
        assert_eq!(layouts[0].pieces_added(), 1);
        assert_eq!(layouts[1].pieces_added(), 2);
        // board is full after three unit blocks; later bars overlap and are skipped
        assert_eq!(layouts[2].space.len(), 1);
        assert_eq!(layouts[4].pieces_added(), 3);
        assert_eq!(layouts[0].pieces[1].id, 1);
        assert_eq!(
            layouts[1].description,
            "Contains all original 1 pieces plus 2 additional pieces"
        );
    }

    #[test]
    fn test_super_layout_count_is_limited() {
        let (board, pieces) = corner();
        assert_eq!(super_layouts(&board, &pieces, 2).unwrap().len(), 2);

        let full = Board::new(1, 1).unwrap();
        let layouts = super_layouts(&full, &[unit(0, 0, 0)], 8).unwrap();
        assert_eq!(layouts.len(), 1);
        assert_eq!(layouts[0].pieces_added(), 0);
    }

    #[test]
    fn test_similar_layout_alternates_bar_sizes() {
        let space = EmptyRect {
            x: 0,
            y: 0,
            width: 2,
            height: 1,
        };
        assert_eq!(similar_layout(&[], 0, &[space])[0].width(), 2);
        assert_eq!(similar_layout(&[], 1, &[space])[0].width(), 1);
    }

    #[test]
    fn test_explorer_builds_levels_lazily_and_invalidates() {
        let (board, pieces) = corner();
        let mut explorer = Explorer::new(board, &pieces, Tunables::default());
        assert!(!explorer.is_built(Level::Normal));

        let view = explorer.activate(Level::Sub).unwrap();
        assert_eq!(view.space().unwrap().len(), 4);
        assert!(explorer.is_built(Level::Normal));
        assert_eq!(explorer.active(), Level::Sub);

        explorer.set_pieces(&[unit(0, 0, 0), unit(1, 1, 0)]);
        assert!(!explorer.is_built(Level::Sub));
        let view = explorer.activate(Level::Normal).unwrap();
        assert_eq!(view.space().unwrap().len(), 12);
    }

    #[test]
    fn test_explorer_layout_navigation() {
        let (board, pieces) = corner();
        let mut explorer = Explorer::new(board, &pieces, Tunables::default());

        assert!(matches!(
            explorer.activate(Level::Super).unwrap(),
            View::Layouts(layouts) if layouts.len() == 5
        ));
        let entered = explorer.enter_layout("layout_2").unwrap();
        assert_eq!(entered.space.len(), 1);
        assert!(matches!(explorer.current().unwrap(), View::Layout(layout) if layout.id == "layout_2"));
        assert!(matches!(explorer.leave_layout().unwrap(), View::Layouts(_)));
        assert!(matches!(
            explorer.enter_layout("layout_99"),
            Err(Error::UnknownLayout(_))
        ));
    }

    #[test]
    fn test_explorer_tunables_drop_super_level() {
        let (board, pieces) = corner();
        let mut explorer = Explorer::new(board, &pieces, Tunables::default());
        explorer.activate(Level::Super).unwrap();
        explorer.activate(Level::Normal).unwrap();

        let mut tunables = Tunables::default();
        tunables.aggregate_size = 3;
        explorer.set_tunables(tunables.clone());
        assert!(explorer.is_built(Level::Super));

        tunables.super_layout_limit = 2;
        explorer.set_tunables(tunables);
        assert!(!explorer.is_built(Level::Super));
        assert!(explorer.is_built(Level::Normal));
    }

    #[test]
    fn test_explorer_selection_and_unreachable() {
        let board = Board::new(3, 1).unwrap();
        let mut explorer = Explorer::new(board, &[unit(0, 0, 0), unit(1, 1, 0)], Tunables::default());

        let restored = explorer.configuration_for(&key("0,1,2")).unwrap();
        assert_eq!((restored[0].x, restored[1].x), (1, 2));
        assert_eq!(explorer.unreachable().unwrap().len(), 3);
        assert_eq!(explorer.all_placements().unwrap().len(), 6);

        explorer.set_board(Board::new(4, 1).unwrap());
        assert!(explorer.pieces().is_empty());
        assert!(matches!(explorer.activate(Level::Normal), Err(Error::NoPieces)));
    }
}

//! File I/O for saving and loading explored state spaces.
//!
//! `save` writes `<stem>.txt` (every state rendered as a board) and
//! `<stem>.bin`, the format `load` reads back.
//!
//! Binary format (little endian):
//! - u32: board width
//! - u32: board height
//! - u32: state count
//! - repeat per state: width * height u16 cell labels, row-major
//! - repeat per state, in the same order:
//!   - u32: neighbor count
//!   - repeat per neighbor: u32 state index
//!
//! `export_json` writes a self-contained JSON document for external renderers.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::aggregate::Aggregation;
use crate::error::{Error, Result};
use crate::geometry::Point3;
use crate::grid::{format_state, StateKey};
use crate::layout::Layout;
use crate::pieces::{Board, Configuration};
use crate::space::StateSpace;

fn with_extension(stem: &Path, extension: &str) -> PathBuf {
    stem.with_extension(extension)
}

/// Renders every state of `space`, numbered from 1.
pub fn format_space(board: &Board, space: &StateSpace) -> String {
    let mut output = format!("Found {} states:\n", space.len());
    for (i, state) in space.states().iter().enumerate() {
        output.push_str(&format!("\nState {}:\n", i + 1));
        output.push_str(&format_state(board, state));
    }
    output
}

/// Saves `space` to `<stem>.txt` and `<stem>.bin`.
pub fn save(stem: &Path, board: &Board, space: &StateSpace) -> Result<()> {
    save_text(&with_extension(stem, "txt"), board, space)?;
    save_binary(&with_extension(stem, "bin"), board, space)?;
    Ok(())
}

fn save_text(path: &Path, board: &Board, space: &StateSpace) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(format_space(board, space).as_bytes())?;
    file.flush()?;
    Ok(())
}

fn write_u32(writer: &mut impl Write, value: usize) -> Result<()> {
    let value = u32::try_from(value)
        .map_err(|_| Error::CorruptFile(format!("{value} does not fit in 32 bits")))?;
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

fn save_binary(path: &Path, board: &Board, space: &StateSpace) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);

    write_u32(&mut file, board.width)?;
    write_u32(&mut file, board.height)?;
    write_u32(&mut file, space.len())?;

    for state in space.states() {
        for &label in state.cells() {
            file.write_all(&label.to_le_bytes())?;
        }
    }

    for state in space.states() {
        let neighbors = space.graph().neighbors(state);
        write_u32(&mut file, neighbors.len())?;
        for neighbor in neighbors {
            let index = space
                .index_of(neighbor)
                .ok_or_else(|| Error::CorruptFile(format!("edge to unknown state {neighbor}")))?;
            write_u32(&mut file, index)?;
        }
    }

    file.flush()?;
    Ok(())
}

fn read_u32(reader: &mut impl Read) -> Result<usize> {
    let mut buffer = [0u8; 4];
    reader.read_exact(&mut buffer)?;
    Ok(u32::from_le_bytes(buffer) as usize)
}

/// Loads a space written by [`save`] from `<stem>.bin`.
///
/// The header is checked against the file size before anything is allocated,
/// so a damaged or foreign file fails with [`Error::CorruptFile`].
pub fn load(stem: &Path) -> Result<(Board, StateSpace)> {
    let file = File::open(with_extension(stem, "bin"))?;
    let file_len = file.metadata()?.len();
    let mut file = BufReader::new(file);

    let width = read_u32(&mut file)?;
    let height = read_u32(&mut file)?;
    let board = Board::new(width, height)
        .map_err(|e| Error::CorruptFile(format!("bad board header: {e}")))?;
    let state_count = read_u32(&mut file)?;

    let state_bytes = width
        .checked_mul(height)
        .and_then(|cells| cells.checked_mul(2))
        .ok_or_else(|| Error::CorruptFile(format!("{width}x{height} board is too large")))?;
    let body_len = usize::try_from(file_len.saturating_sub(12)).unwrap_or(usize::MAX);
    if state_bytes
        .checked_mul(state_count)
        .map_or(true, |needed| needed > body_len)
    {
        return Err(Error::CorruptFile(format!(
            "{state_count} states of {state_bytes} bytes do not fit in {body_len} bytes"
        )));
    }

    let mut space = StateSpace::new();
    let mut cell_buffer = vec![0u8; state_bytes];
    for i in 0..state_count {
        file.read_exact(&mut cell_buffer)?;
        let cells = cell_buffer
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        if !space.insert(StateKey::from_cells(cells)) {
            return Err(Error::CorruptFile(format!("state {i} is a duplicate")));
        }
    }

    for from in 0..state_count {
        let neighbor_count = read_u32(&mut file)?;
        for _ in 0..neighbor_count {
            let to = read_u32(&mut file)?;
            if to >= state_count {
                return Err(Error::CorruptFile(format!(
                    "state {from} links to state {to} of {state_count}"
                )));
            }
            let (a, b) = (space.states()[from].clone(), space.states()[to].clone());
            space.add_edge(&a, &b);
        }
    }

    Ok((board, space))
}

/// Returns the number of saved states without loading them.
pub fn count(path: &Path) -> Result<usize> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 12];
    file.read_exact(&mut header)?;
    Ok(u32::from_le_bytes([header[8], header[9], header[10], header[11]]) as usize)
}

/// One state as exported: its key and, when laid out, its position.
#[derive(Debug, Serialize)]
pub struct ExportedState<'a> {
    pub key: &'a StateKey,
    pub position: Option<Point3>,
}

/// A laid-out state space in renderer-friendly form. Edges are pairs of
/// indices into `states`.
#[derive(Debug, Serialize)]
pub struct Export<'a> {
    pub board: &'a Board,
    pub states: Vec<ExportedState<'a>>,
    pub edges: Vec<(usize, usize)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<&'a Aggregation>,
}

impl<'a> Export<'a> {
    pub fn new(
        board: &'a Board,
        space: &'a StateSpace,
        layout: &'a Layout,
        aggregation: Option<&'a Aggregation>,
    ) -> Self {
        let states = space
            .states()
            .iter()
            .map(|key| ExportedState {
                key,
                position: layout.position(key),
            })
            .collect();

        let edges = space
            .states()
            .iter()
            .enumerate()
            .flat_map(|(i, from)| {
                space
                    .graph()
                    .neighbors(from)
                    .iter()
                    .filter_map(move |to| Some((i, space.index_of(to)?)))
            })
            .collect();

        Self {
            board,
            states,
            edges,
            aggregation,
        }
    }
}

/// An exported super layout: its metadata plus its own laid-out space.
#[derive(Debug, Serialize)]
pub struct LayoutExport<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub pieces: &'a Configuration,
    pub space: Export<'a>,
}

/// Writes `value` as pretty-printed JSON followed by a newline.
pub fn export_json(writer: &mut impl Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::distance_matrix;
    use crate::layout::{force_directed, LayoutParams};
    use crate::pieces::Piece;
    use crate::search::explore;

    fn corner() -> (Board, StateSpace) {
        let board = Board::new(2, 2).unwrap();
        let space = explore(&board, &[Piece::rect(0, 0, 0, 1, 1).unwrap()]).unwrap();
        (board, space)
    }

    fn temp_stem(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("slidespace-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_save_and_load_preserve_order_and_edges() {
        let (board, space) = corner();
        let stem = temp_stem("roundtrip");
        save(&stem, &board, &space).unwrap();

        let (loaded_board, loaded) = load(&stem).unwrap();
        assert_eq!(loaded_board, board);
        assert_eq!(loaded.states(), space.states());
        assert_eq!(loaded.edge_count(), space.edge_count());
        for state in space.states() {
            assert_eq!(loaded.graph().neighbors(state), space.graph().neighbors(state));
        }
        assert_eq!(count(&stem.with_extension("bin")).unwrap(), 4);

        let text = std::fs::read_to_string(stem.with_extension("txt")).unwrap();
        assert!(text.starts_with("Found 4 states:\n"));

        std::fs::remove_file(stem.with_extension("txt")).unwrap();
        std::fs::remove_file(stem.with_extension("bin")).unwrap();
    }

    #[test]
    fn test_load_rejects_dangling_edges() {
        let stem = temp_stem("dangling");
        let mut bytes = Vec::new();
        for value in [1u32, 1, 1] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes.extend_from_slice(&1u16.to_le_bytes());
        for value in [1u32, 5] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        std::fs::write(stem.with_extension("bin"), bytes).unwrap();

        assert!(matches!(load(&stem), Err(Error::CorruptFile(_))));
        std::fs::remove_file(stem.with_extension("bin")).unwrap();
    }

    fn write_words(stem: &Path, words: &[u32]) {
        let bytes: Vec<u8> = words.iter().flat_map(|word| word.to_le_bytes()).collect();
        std::fs::write(stem.with_extension("bin"), bytes).unwrap();
    }

    #[test]
    fn test_load_rejects_oversized_header() {
        let stem = temp_stem("oversized");
        write_words(&stem, &[u32::MAX, u32::MAX, 1]);
        assert!(matches!(load(&stem), Err(Error::CorruptFile(_))));

        write_words(&stem, &[0, 3, 1]);
        assert!(matches!(load(&stem), Err(Error::CorruptFile(_))));
        std::fs::remove_file(stem.with_extension("bin")).unwrap();
    }

    #[test]
    fn test_load_rejects_state_count_beyond_file() {
        let stem = temp_stem("truncated");
        // claims a million 2x2 states but holds none
        write_words(&stem, &[2, 2, 1_000_000]);
        assert!(matches!(load(&stem), Err(Error::CorruptFile(_))));

        write_words(&stem, &[2, 2, u32::MAX]);
        assert!(matches!(load(&stem), Err(Error::CorruptFile(_))));
        std::fs::remove_file(stem.with_extension("bin")).unwrap();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(load(&temp_stem("missing")), Err(Error::Io(_))));
    }

    #[test]
    fn test_export_lists_edges_by_index() {
        let (board, space) = corner();
        let distances = distance_matrix(&board, space.states()).unwrap();
        let layout = force_directed(
            space.states(),
            space.graph(),
            &distances,
            &LayoutParams::default(),
        );
        let export = Export::new(&board, &space, &layout, None);
        assert_eq!(export.edges.len(), 8);
        assert!(export.edges.contains(&(0, 1)));

        let mut buffer = Vec::new();
        export_json(&mut buffer, &export).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["states"][0]["key"], "1,0,0,0");
        assert_eq!(value["board"]["width"], 2);
        assert!(value["states"][3]["position"]["z"].is_number());
        assert!(value.get("aggregation").is_none());
    }
}

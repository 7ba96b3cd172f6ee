//! Sliding Block State Space Explorer
//!
//! Explores every configuration of a sliding-block puzzle reachable by
//! single-cell moves, offers coarser and finer views of that space, and lays
//! the result out in 3D for an interactive viewer or for export as JSON.

mod visualization;

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use slidespace::aggregate::{aggregate, Aggregation};
use slidespace::config::Tunables;
use slidespace::distance::distance_matrix;
use slidespace::geometry::Point3;
use slidespace::grid::{format_state, parse_board, StateKey};
use slidespace::layout::{force_directed, Layout, LayoutParams};
use slidespace::levels::{Explorer, Level, SuperLayout, View};
use slidespace::persistence::{self, Export, LayoutExport};
use slidespace::pieces::{load_preset, Board, Configuration, Piece};
use slidespace::space::StateSpace;
use slidespace::Result;
use visualization::ViewNode;

/// Explores and visualizes the state space of sliding-block puzzles.
#[derive(Parser)]
#[command(name = "slidespace")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    setup: Setup,
    #[command(subcommand)]
    command: Option<Command>,
}

/// Where the starting board comes from and how hard to work on it.
#[derive(Args)]
struct Setup {
    /// Built-in puzzle to start from.
    #[arg(long, global = true, default_value = "starter")]
    preset: String,
    /// Text board to start from instead of a preset.
    #[arg(long, global = true)]
    board: Option<PathBuf>,
    /// JSON file with tunables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// More layout iterations and more super layouts.
    #[arg(long, global = true)]
    thorough: bool,
    /// Most super layouts to generate.
    #[arg(long, global = true)]
    super_limit: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Build a level and print its size.
    Explore {
        #[arg(long, value_enum, default_value_t = LevelArg::Normal)]
        level: LevelArg,
        /// Save the space to <STEM>.txt and <STEM>.bin.
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Lay out a level and show it in an interactive 3D viewer.
    Display(ViewArgs),
    /// Show the number of states in a saved .bin file.
    Count { file: PathBuf },
    /// Lay out a level and print it as JSON.
    Export(ViewArgs),
    /// Print the configuration a state key stands for.
    Show { key: String },
    /// List legal placements that cannot be reached from the start.
    Unreachable,
}

#[derive(Args)]
struct ViewArgs {
    #[arg(long, value_enum, default_value_t = LevelArg::Normal)]
    level: LevelArg,
    /// Group states into meta-nodes of N (tunable default when N is omitted).
    #[arg(long)]
    aggregate: Option<Option<usize>>,
    /// Super layout to use, e.g. layout_0.
    #[arg(long)]
    layout: Option<String>,
    /// Show a space saved by `explore --save` from <STEM>.bin instead of a level.
    #[arg(long, conflicts_with_all = ["level", "layout"])]
    load: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LevelArg {
    Normal,
    Sub,
    Micro,
    Super,
    All,
}

impl LevelArg {
    fn level(self) -> Option<Level> {
        match self {
            LevelArg::Normal => Some(Level::Normal),
            LevelArg::Sub => Some(Level::Sub),
            LevelArg::Micro => Some(Level::Micro),
            LevelArg::Super => Some(Level::Super),
            LevelArg::All => None,
        }
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Normal => "normal",
        Level::Sub => "sub",
        Level::Micro => "micro",
        Level::Super => "super",
    }
}

/// A state space picked for output.
enum Target {
    Level { name: &'static str, space: StateSpace },
    Layout(SuperLayout),
}

impl Target {
    fn name(&self) -> &str {
        match self {
            Target::Level { name, .. } => name,
            Target::Layout(layout) => &layout.name,
        }
    }

    fn space(&self) -> &StateSpace {
        match self {
            Target::Level { space, .. } => space,
            Target::Layout(layout) => &layout.space,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Count { file }) => run_count(&file),
        Some(Command::Explore { level, save }) => {
            run_explore(&mut load_explorer(&cli.setup)?, level, save.as_deref())
        }
        Some(Command::Display(args)) => {
            let (explorer, targets) = open_view(&cli.setup, &args)?;
            run_display(&explorer, &targets, args.aggregate)
        }
        Some(Command::Export(args)) => {
            let (explorer, targets) = open_view(&cli.setup, &args)?;
            run_export(&explorer, &targets, args.aggregate)
        }
        Some(Command::Show { key }) => run_show(&load_explorer(&cli.setup)?, &key),
        Some(Command::Unreachable) => run_unreachable(&mut load_explorer(&cli.setup)?),
        None => {
            // default: explore and display
            let mut explorer = load_explorer(&cli.setup)?;
            run_explore(&mut explorer, LevelArg::Normal, None)?;
            let targets = select(&mut explorer, LevelArg::Normal, None)?;
            run_display(&explorer, &targets, None)
        }
    }
}

/// Reads tunables and applies flag overrides.
fn load_tunables(setup: &Setup) -> Result<Tunables> {
    let mut tunables = match &setup.config {
        Some(path) => Tunables::load(path)?,
        None => Tunables::default(),
    };
    if setup.thorough {
        tunables.thorough = true;
    }
    if let Some(limit) = setup.super_limit {
        tunables.super_layout_limit = limit;
        tunables.thorough_super_layout_limit = limit;
    }
    Ok(tunables)
}

/// Loads the starting board with the configured tunables.
fn load_explorer(setup: &Setup) -> Result<Explorer> {
    let tunables = load_tunables(setup)?;
    let (board, pieces) = match &setup.board {
        Some(path) => {
            let (board, pieces) = parse_board(&std::fs::read_to_string(path)?)?;
            Board::within(board.width, board.height, tunables.dimension_range())?;
            (board, pieces)
        }
        None => load_preset(&setup.preset)?,
    };

    Ok(Explorer::new(board, &pieces, tunables))
}

/// The explorer and spaces a view command works on.
///
/// With `--load` the saved space is shown on its own board and the explorer
/// holds no pieces; it is only used to decode selected states.
fn open_view(setup: &Setup, args: &ViewArgs) -> Result<(Explorer, Vec<Target>)> {
    if let Some(stem) = &args.load {
        let (board, space) = persistence::load(stem)?;
        let explorer = Explorer::new(board, &[], load_tunables(setup)?);
        return Ok((explorer, vec![Target::Level { name: "saved", space }]));
    }

    let mut explorer = load_explorer(setup)?;
    let targets = select(&mut explorer, args.level, args.layout.as_deref())?;
    Ok((explorer, targets))
}

/// Builds the requested level and returns the spaces to show.
fn select(explorer: &mut Explorer, level: LevelArg, layout_id: Option<&str>) -> Result<Vec<Target>> {
    let Some(level) = level.level() else {
        let space = explorer.all_placements()?.clone();
        return Ok(vec![Target::Level { name: "all", space }]);
    };

    if let (Level::Super, Some(id)) = (level, layout_id) {
        return Ok(vec![Target::Layout(explorer.enter_layout(id)?.clone())]);
    }

    Ok(match explorer.activate(level)? {
        View::States { level, space } => vec![Target::Level {
            name: level_name(level),
            space: space.clone(),
        }],
        View::Layouts(layouts) => layouts.iter().cloned().map(Target::Layout).collect(),
        View::Layout(layout) => vec![Target::Layout(layout.clone())],
    })
}

/// Builds a level, prints its size and optionally saves it.
fn run_explore(explorer: &mut Explorer, level: LevelArg, save: Option<&Path>) -> Result<()> {
    let board = *explorer.board();
    let targets = select(explorer, level, None)?;

    for target in &targets {
        let space = target.space();
        println!(
            "{}: {} states, {} edges",
            target.name(),
            space.len(),
            space.edge_count()
        );
        if let Target::Layout(layout) = target {
            println!("  {} ({})", layout.description, layout.id);
        }

        if let Some(stem) = save {
            let stem = match target {
                Target::Layout(layout) => PathBuf::from(format!("{}-{}", stem.display(), layout.id)),
                Target::Level { .. } => stem.to_path_buf(),
            };
            persistence::save(&stem, &board, space)?;
            println!(
                "Wrote {} and {}",
                stem.with_extension("txt").display(),
                stem.with_extension("bin").display()
            );
        }
    }

    Ok(())
}

/// Positions `space` and optionally groups it into meta-nodes.
fn lay_out(
    board: &Board,
    space: &StateSpace,
    tunables: &Tunables,
    chunk_size: Option<Option<usize>>,
) -> Result<(Layout, Option<Aggregation>)> {
    let distances = distance_matrix(board, space.states())?;
    let params = LayoutParams::from_tunables(tunables);
    let layout = force_directed(space.states(), space.graph(), &distances, &params);

    let aggregation = chunk_size
        .map(|size| {
            aggregate(
                space.states(),
                &layout,
                space.graph(),
                size.unwrap_or(tunables.aggregate_size),
            )
        })
        .transpose()?;

    Ok((layout, aggregation))
}

/// Lists super layouts when no single one was picked.
fn print_layouts(targets: &[Target]) {
    for target in targets {
        if let Target::Layout(layout) = target {
            println!(
                "{}: {} - {} ({} states)",
                layout.id,
                layout.name,
                layout.description,
                layout.space.len()
            );
        }
    }
    println!("Pass --layout ID to pick one.");
}

fn describe_piece(piece: &Piece) -> String {
    let kind = if piece.is_custom() { ", custom" } else { "" };
    format!(
        "piece {} at ({}, {}), {}x{}{}",
        piece.id,
        piece.x,
        piece.y,
        piece.width(),
        piece.height(),
        kind
    )
}

fn print_configuration(board: &Board, key: &StateKey, pieces: &Configuration) {
    print!("{}", format_state(board, key));
    for piece in pieces {
        println!("  {}", describe_piece(piece));
    }
}

/// Endpoints of every edge, each unordered pair once.
fn state_edges(space: &StateSpace, layout: &Layout) -> Vec<(Point3, Point3)> {
    let mut edges = Vec::new();
    for from in space.states() {
        for to in space.graph().neighbors(from) {
            if space.index_of(from) >= space.index_of(to) {
                continue;
            }
            if let (Some(start), Some(end)) = (layout.position(from), layout.position(to)) {
                edges.push((start, end));
            }
        }
    }
    edges
}

/// Lays out a single target and shows it in the 3D viewer.
fn run_display(explorer: &Explorer, targets: &[Target], chunk_size: Option<Option<usize>>) -> Result<()> {
    let board = *explorer.board();
    let [target] = targets else {
        print_layouts(targets);
        return Ok(());
    };
    let space = target.space();
    let (layout, aggregation) = lay_out(&board, space, explorer.tunables(), chunk_size)?;

    let (nodes, edges) = match &aggregation {
        Some(aggregation) => (
            aggregation
                .nodes
                .iter()
                .map(|node| ViewNode {
                    position: node.centroid,
                    members: node.members.clone(),
                })
                .collect(),
            aggregation
                .edges
                .iter()
                .map(|edge| (edge.start, edge.end))
                .collect(),
        ),
        None => (
            layout
                .iter()
                .map(|(key, position)| ViewNode {
                    position,
                    members: vec![key.clone()],
                })
                .collect(),
            state_edges(space, &layout),
        ),
    };

    println!("Controls: Left/Right select, Up/Down scale, R reset");
    let title = format!("{} ({} states)", target.name(), space.len());
    visualization::display(&title, nodes, edges, |index, node| {
        let Some(key) = node.members.first() else {
            return;
        };
        println!("\nNode {} ({} states):", index + 1, node.members.len());
        match explorer.configuration_for(key) {
            Ok(pieces) => print_configuration(&board, key, &pieces),
            Err(e) => eprintln!("Cannot restore {}: {}", key, e),
        }
    });

    Ok(())
}

/// Lays out every target and prints them as JSON on stdout.
fn run_export(explorer: &Explorer, targets: &[Target], chunk_size: Option<Option<usize>>) -> Result<()> {
    let board = *explorer.board();
    let prepared = targets
        .iter()
        .map(|target| lay_out(&board, target.space(), explorer.tunables(), chunk_size))
        .collect::<Result<Vec<_>>>()?;

    let mut stdout = io::stdout().lock();
    match (targets, prepared.as_slice()) {
        ([Target::Level { space, .. }], [(layout, aggregation)]) => {
            let export = Export::new(&board, space, layout, aggregation.as_ref());
            persistence::export_json(&mut stdout, &export)
        }
        _ => {
            let exports: Vec<LayoutExport> = targets
                .iter()
                .zip(&prepared)
                .filter_map(|(target, (layout, aggregation))| match target {
                    Target::Layout(super_layout) => Some(LayoutExport {
                        id: &super_layout.id,
                        name: &super_layout.name,
                        description: &super_layout.description,
                        pieces: &super_layout.pieces,
                        space: Export::new(&board, &super_layout.space, layout, aggregation.as_ref()),
                    }),
                    Target::Level { .. } => None,
                })
                .collect();
            persistence::export_json(&mut stdout, &exports)
        }
    }
}

/// Prints the count of states in a saved file.
fn run_count(file: &Path) -> Result<()> {
    println!("{} states", persistence::count(file)?);
    Ok(())
}

/// Decodes a state key against the current board.
fn run_show(explorer: &Explorer, key: &str) -> Result<()> {
    let key: StateKey = key.parse()?;
    let pieces = explorer.configuration_for(&key)?;
    print_configuration(explorer.board(), &key, &pieces);
    Ok(())
}

/// Prints every legal placement the start cannot reach.
fn run_unreachable(explorer: &mut Explorer) -> Result<()> {
    let board = *explorer.board();
    let unreachable = explorer.unreachable()?;
    let total = explorer.all_placements()?.len();

    println!("{} of {} placements are unreachable", unreachable.len(), total);
    for (i, key) in unreachable.iter().enumerate() {
        println!("\nState {}:", i + 1);
        print!("{}", format_state(&board, key));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidespace::search::explore;

    #[test]
    fn test_corner_snapshot() {
        let (board, pieces) = load_preset("corner").unwrap();
        let space = explore(&board, &pieces).unwrap();
        let output = persistence::format_space(&board, &space);

        insta::assert_snapshot!(output.trim_end(), @r"
Found 4 states:

State 1:
1.
..

State 2:
.1
..

State 3:
..
1.

State 4:
..
.1
");
    }

    #[test]
    fn test_preset_state_counts() {
        let counts: Vec<usize> = ["corner", "pair"]
            .iter()
            .map(|name| {
                let (board, pieces) = load_preset(name).unwrap();
                explore(&board, &pieces).unwrap().len()
            })
            .collect();
        assert_eq!(counts, vec![4, 3]);
    }

    #[test]
    fn test_select_super_lists_every_layout() {
        let (board, pieces) = load_preset("corner").unwrap();
        let mut explorer = Explorer::new(board, &pieces, Tunables::default());

        let targets = select(&mut explorer, LevelArg::Super, None).unwrap();
        assert_eq!(targets.len(), 5);
        assert_eq!(targets[0].name(), "Similar Layout 1");

        let picked = select(&mut explorer, LevelArg::Super, Some("layout_1")).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].space().len(), targets[1].space().len());

        let all = select(&mut explorer, LevelArg::All, None).unwrap();
        assert_eq!(all[0].name(), "all");
        assert_eq!(all[0].space().len(), 4);
    }

    #[test]
    fn test_view_of_saved_space_uses_its_board() {
        let (board, pieces) = load_preset("corner").unwrap();
        let space = explore(&board, &pieces).unwrap();
        let stem = std::env::temp_dir().join(format!("slidespace-{}-view", std::process::id()));
        persistence::save(&stem, &board, &space).unwrap();

        let setup = Setup {
            preset: "pair".into(),
            board: None,
            config: None,
            thorough: false,
            super_limit: None,
        };
        let args = ViewArgs {
            level: LevelArg::Normal,
            aggregate: Some(Some(2)),
            layout: None,
            load: Some(stem.clone()),
        };
        let (explorer, targets) = open_view(&setup, &args).unwrap();
        assert_eq!(*explorer.board(), board);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].name(), "saved");
        assert_eq!(targets[0].space().states(), space.states());

        let (layout, aggregation) =
            lay_out(explorer.board(), targets[0].space(), explorer.tunables(), args.aggregate).unwrap();
        assert_eq!(layout.len(), 4);
        assert_eq!(aggregation.unwrap().nodes.len(), 2);
        let first = &targets[0].space().states()[0];
        assert_eq!(explorer.configuration_for(first).unwrap().len(), pieces.len());

        std::fs::remove_file(stem.with_extension("txt")).unwrap();
        std::fs::remove_file(stem.with_extension("bin")).unwrap();
    }

    #[test]
    fn test_describe_piece() {
        let (_, pieces) = load_preset("tee").unwrap();
        assert_eq!(describe_piece(&pieces[0]), "piece 0 at (0, 0), 2x3, custom");
        assert_eq!(describe_piece(&pieces[1]), "piece 1 at (2, 1), 2x1");
    }
}

//! 3D visualization of laid-out state spaces using kiss3d.

use kiss3d::prelude::*;

use slidespace::geometry::Point3;
use slidespace::grid::StateKey;

/// One drawable node: a single state or a meta-node of several.
pub struct ViewNode {
    pub position: Point3,
    pub members: Vec<StateKey>,
}

/// Returns the display color for a node index.
///
/// The mapping is stable to keep colors consistent across renders.
fn node_color(index: usize) -> Color {
    match index % 7 {
        0 => Color::new(1.0, 0.2, 0.2, 1.0), // red
        1 => Color::new(0.2, 1.0, 0.2, 1.0), // green
        2 => Color::new(0.2, 0.2, 1.0, 1.0), // blue
        3 => Color::new(1.0, 1.0, 0.2, 1.0), // yellow
        4 => Color::new(1.0, 0.2, 1.0, 1.0), // magenta
        5 => Color::new(0.2, 1.0, 1.0, 1.0), // cyan
        _ => Color::new(1.0, 0.6, 0.2, 1.0), // orange
    }
}

fn selected_color() -> Color {
    Color::new(1.0, 1.0, 1.0, 1.0)
}

fn edge_color() -> Color {
    Color::new(0.6, 0.6, 0.6, 1.0)
}

/// Layout units per world unit.
const WORLD_SCALE: f32 = 10.0;
/// Node cube side, scaled up for meta-nodes.
const NODE_SIZE: f32 = 0.35;
const DOT_SIZE: f32 = 0.06;
/// World distance between edge dots.
const DOT_SPACING: f32 = 0.4;
const MAX_DOTS_PER_EDGE: usize = 12;
/// Edges beyond this are not drawn.
const MAX_EDGES: usize = 4_000;
const SCALE_STEP: f32 = 0.1;

fn to_world(point: Point3) -> Vec3 {
    Vec3::new(point.x as f32, point.y as f32, point.z as f32) / WORLD_SCALE
}

/// A rendered cube and where it sits at scale 1.
struct Placed {
    node: SceneNode3d,
    base_position: Vec3,
}

/// Builds the cubes for nodes and the dotted trails for edges.
fn build_scene(
    scene: &mut SceneNode3d,
    nodes: &[ViewNode],
    edges: &[(Point3, Point3)],
) -> (Vec<Placed>, Vec<Placed>) {
    let cubes: Vec<Placed> = nodes
        .iter()
        .enumerate()
        .map(|(i, view_node)| {
            let size = NODE_SIZE * (view_node.members.len().max(1) as f32).cbrt();
            let base_position = to_world(view_node.position);
            let node = scene
                .add_cube(size, size, size)
                .set_color(node_color(i))
                .set_position(base_position);
            Placed {
                node,
                base_position,
            }
        })
        .collect();

    let mut dots = Vec::new();
    for &(start, end) in edges.iter().take(MAX_EDGES) {
        let (start, end) = (to_world(start), to_world(end));
        let steps = ((start.distance(end) / DOT_SPACING) as usize).clamp(1, MAX_DOTS_PER_EDGE);
        for step in 1..steps {
            let base_position = start.lerp(end, step as f32 / steps as f32);
            let node = scene
                .add_cube(DOT_SIZE, DOT_SIZE, DOT_SIZE)
                .set_color(edge_color())
                .set_position(base_position);
            dots.push(Placed {
                node,
                base_position,
            });
        }
    }

    (cubes, dots)
}

/// Displays a laid-out space in an interactive 3D viewer.
///
/// `on_select` runs whenever the selection moves to another node.
pub fn display(
    title: &str,
    nodes: Vec<ViewNode>,
    edges: Vec<(Point3, Point3)>,
    on_select: impl FnMut(usize, &ViewNode),
) {
    pollster::block_on(display_async(title, nodes, edges, on_select));
}

async fn display_async(
    title: &str,
    nodes: Vec<ViewNode>,
    edges: Vec<(Point3, Point3)>,
    mut on_select: impl FnMut(usize, &ViewNode),
) {
    if nodes.is_empty() {
        println!("No states to display");
        return;
    }

    let num_nodes = nodes.len();
    let mut selected = 0;
    let window_title = |selected: usize| {
        format!(
            "{title} - node {}/{} - [Left/Right] select, [Up/Down] scale, [R] reset",
            selected + 1,
            num_nodes
        )
    };

    let mut window = Window::new(&window_title(selected)).await;

    let mut camera = OrbitCamera3d::default();
    camera.set_dist(12.0);

    let mut scene = SceneNode3d::empty();
    scene
        .add_light(Light::point(100.0))
        .set_position(Vec3::new(10.0, 10.0, 10.0));

    let (mut cubes, mut dots) = build_scene(&mut scene, &nodes, &edges);
    cubes[selected].node.set_color(selected_color());
    on_select(selected, &nodes[selected]);

    // world scale multiplier applied around the origin
    let mut scale: f32 = 1.0;
    let mut needs_reposition = false;

    loop {
        let previous = selected;
        for event in window.events().iter() {
            if let kiss3d::event::WindowEvent::Key(key, action, _) = event.value {
                use kiss3d::event::{Action, Key};
                if action == Action::Press {
                    match key {
                        Key::Up => {
                            scale += SCALE_STEP;
                            needs_reposition = true;
                        }
                        Key::Down => {
                            scale = (scale - SCALE_STEP).max(SCALE_STEP);
                            needs_reposition = true;
                        }
                        Key::R => {
                            scale = 1.0;
                            selected = 0;
                            needs_reposition = true;
                        }
                        Key::Right => selected = (selected + 1) % num_nodes,
                        Key::Left => selected = selected.checked_sub(1).unwrap_or(num_nodes - 1),
                        _ => {}
                    }
                }
            }
        }

        if selected != previous {
            cubes[previous].node.set_color(node_color(previous));
            cubes[selected].node.set_color(selected_color());
            window.set_title(&window_title(selected));
            on_select(selected, &nodes[selected]);
        }

        if needs_reposition {
            for placed in cubes.iter_mut().chain(dots.iter_mut()) {
                placed.node.set_position(placed.base_position * scale);
            }
            needs_reposition = false;
        }

        if !window.render_3d(&mut scene, &mut camera).await {
            break;
        }
    }
}

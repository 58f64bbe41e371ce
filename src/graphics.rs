use crate::math::{multiply_matrix_vector, Mat3, Vec3, IDENTITY};
use crate::scene::{Handle, LineKind, SceneGraph};
use crate::vertex::{Vertex, Viewport, CELL_ASPECT};
use crossterm::cursor::MoveTo;
use crossterm::style::{Color, Print, SetForegroundColor};
use crossterm::queue;
use std::collections::BTreeMap;
use std::io::{self, Write};
use tracing::debug;

pub const POINT_GLYPH: char = '●';
pub const GRID_GLYPH: char = '·';

/// Depth difference treated as a tie; later layers win ties
const DEPTH_TOLERANCE: f64 = 1e-9;
/// Baselines shorter than this fraction of a unit's on-screen size are edge-on
const EDGE_ON: f64 = 1e-3;

/// One character cell of the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub glyph: char,
    pub color: Color,
}

impl Cell {
    const BLANK: Cell = Cell {
        glyph: ' ',
        color: Color::Reset,
    };
}

#[derive(Debug, Clone)]
enum Primitive {
    Point(Vec3),
    Line(LineKind, Vec<Vec3>),
    Label {
        text: String,
        position: Vec3,
        orientation: Mat3,
    },
}

impl Primitive {
    /// Draw order: grid first, labels last
    fn layer(&self) -> u8 {
        match self {
            Primitive::Line(LineKind::Grid, _) => 0,
            Primitive::Line(_, _) => 1,
            Primitive::Point(_) => 2,
            Primitive::Label { .. } => 3,
        }
    }
}

/// Character-cell canvas with a depth buffer; the terminal's scene graph
pub struct Canvas {
    width: usize,
    height: usize,
    zoom: f64,
    cells: Vec<Cell>,
    depth: Vec<f64>,
    next_handle: u64,
    objects: BTreeMap<Handle, Primitive>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas {
            width,
            height,
            zoom: 1.0,
            cells: vec![Cell::BLANK; width * height],
            depth: vec![f64::NEG_INFINITY; width * height],
            next_handle: 0,
            objects: BTreeMap::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[cfg(test)]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width,
            height: self.height,
            zoom: self.zoom,
        }
    }

    #[cfg(test)]
    pub fn cell(&self, column: usize, row: usize) -> Option<Cell> {
        if column < self.width && row < self.height {
            Some(self.cells[row * self.width + column])
        } else {
            None
        }
    }

    /// Text of one row, trailing blanks trimmed
    #[cfg(test)]
    pub fn row_text(&self, row: usize) -> String {
        let start = row * self.width;
        self.cells[start..start + self.width]
            .iter()
            .map(|cell| cell.glyph)
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    /// Changes the canvas size. Contents are discarded until the next frame.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.clear();
    }

    fn clear(&mut self) {
        self.cells = vec![Cell::BLANK; self.width * self.height];
        self.depth = vec![f64::NEG_INFINITY; self.width * self.height];
    }

    fn insert(&mut self, primitive: Primitive) -> Handle {
        self.next_handle += 1;
        let handle = Handle(self.next_handle);
        self.objects.insert(handle, primitive);
        handle
    }

    /// Writes text on top of the frame, ignoring depth
    pub fn draw_text(&mut self, column: usize, row: usize, text: &str, color: Color) {
        if row >= self.height {
            return;
        }
        for (i, glyph) in text.chars().enumerate() {
            let x = column + i;
            if x >= self.width {
                break;
            }
            let offset = row * self.width + x;
            self.cells[offset] = Cell { glyph, color };
            self.depth[offset] = f64::INFINITY;
        }
    }

    /// Writes the frame to `out` starting at the top-left corner
    pub fn present<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut current = None;
        for row in 0..self.height {
            queue!(out, MoveTo(0, row as u16))?;
            let start = row * self.width;
            for cell in &self.cells[start..start + self.width] {
                if current != Some(cell.color) {
                    queue!(out, SetForegroundColor(cell.color))?;
                    current = Some(cell.color);
                }
                queue!(out, Print(cell.glyph))?;
            }
        }
        out.flush()
    }

    fn plot(&mut self, x: isize, y: isize, depth: f64, cell: Cell) {
        if x < 0 || y < 0 || x >= self.width as isize || y >= self.height as isize {
            return;
        }
        let offset = y as usize * self.width + x as usize;
        if depth + DEPTH_TOLERANCE >= self.depth[offset] {
            self.depth[offset] = depth;
            self.cells[offset] = cell;
        }
    }

    /// Draws a line between two vertices using Bresenham's algorithm, interpolating depth
    fn draw_line(&mut self, v0: &Vertex, v1: &Vertex, glyph: Option<char>, color: Color) {
        let glyph = glyph.unwrap_or_else(|| line_glyph(v0, v1));
        let (mut x0, mut y0, x1, y1) = (
            v0.screen_position[0].round() as isize,
            v0.screen_position[1].round() as isize,
            v1.screen_position[0].round() as isize,
            v1.screen_position[1].round() as isize,
        );
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy; // error value e_xy
        let steps = dx.max(-dy).max(1) as f64;
        let mut step = 0.0;

        loop {
            let t = step / steps;
            let depth = v0.depth + (v1.depth - v0.depth) * t;
            self.plot(x0, y0, depth, Cell { glyph, color });

            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
            step += 1.0;
        }
    }

    /// Lays the label's characters along its local X axis, centered on its position.
    ///
    /// Consecutive characters advance one whole cell along whichever screen
    /// axis the baseline mostly follows, so a baseline turned vertical still
    /// keeps every character. An edge-on baseline falls back to a flat row.
    fn draw_label(&mut self, text: &str, position: &Vec3, orientation: &Mat3) {
        let viewport = self.viewport();
        let baseline = multiply_matrix_vector(orientation, &[1.0, 0.0, 0.0]);
        let origin = viewport.project(position);
        let ahead = viewport.project(&[
            position[0] + baseline[0],
            position[1] + baseline[1],
            position[2] + baseline[2],
        ]);

        let columns = ahead.screen_position[0] - origin.screen_position[0];
        let rows = ahead.screen_position[1] - origin.screen_position[1];
        let depth = ahead.depth - origin.depth;
        let cells_per_unit = columns.abs().max(rows.abs());
        let edge_on = cells_per_unit <= EDGE_ON * viewport.scale();
        let (step_column, step_row, step_depth) = if edge_on {
            (1.0, 0.0, 0.0)
        } else {
            (
                columns / cells_per_unit,
                rows / cells_per_unit,
                depth / cells_per_unit,
            )
        };

        let anchor_column = origin.screen_position[0].round();
        let anchor_row = origin.screen_position[1].round();
        let first = -((text.chars().count().saturating_sub(1) / 2) as isize);

        for (i, glyph) in text.chars().enumerate() {
            let k = (first + i as isize) as f64;
            self.plot(
                (anchor_column + (step_column * k).round()) as isize,
                (anchor_row + (step_row * k).round()) as isize,
                origin.depth + step_depth * k,
                Cell {
                    glyph,
                    color: Color::White,
                },
            );
        }
    }
}

impl SceneGraph for Canvas {
    fn create_point(&mut self, position: Vec3) -> Handle {
        self.insert(Primitive::Point(position))
    }

    fn create_line(&mut self, kind: LineKind, points: &[Vec3]) -> Handle {
        self.insert(Primitive::Line(kind, points.to_vec()))
    }

    fn create_label(&mut self, text: &str) -> Handle {
        self.insert(Primitive::Label {
            text: text.to_string(),
            position: [0.0; 3],
            orientation: IDENTITY,
        })
    }

    fn set_position(&mut self, handle: Handle, position: Vec3) {
        if let Some(Primitive::Point(p)) = self.objects.get_mut(&handle) {
            *p = position;
        }
    }

    fn set_line_points(&mut self, handle: Handle, points: &[Vec3]) {
        if let Some(Primitive::Line(_, existing)) = self.objects.get_mut(&handle) {
            existing.clear();
            existing.extend_from_slice(points);
        }
    }

    fn set_label_transform(&mut self, handle: Handle, position: Vec3, orientation: Mat3) {
        if let Some(Primitive::Label {
            position: p,
            orientation: o,
            ..
        }) = self.objects.get_mut(&handle)
        {
            *p = position;
            *o = orientation;
        }
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    fn remove(&mut self, handle: Handle) {
        if self.objects.remove(&handle).is_none() {
            debug!(handle = handle.0, "remove of unknown object");
        }
    }

    fn render_frame(&mut self) {
        self.clear();
        let viewport = self.viewport();

        let objects = std::mem::take(&mut self.objects);
        let mut primitives: Vec<&Primitive> = objects.values().collect();
        primitives.sort_by_key(|primitive| primitive.layer());

        for primitive in primitives {
            match primitive {
                Primitive::Line(kind, points) => {
                    let (glyph, color) = line_style(*kind);
                    let stride = if *kind == LineKind::Grid { 2 } else { 1 };
                    for segment in points.windows(2).step_by(stride) {
                        let v0 = viewport.project(&segment[0]);
                        let v1 = viewport.project(&segment[1]);
                        self.draw_line(&v0, &v1, glyph, color);
                    }
                }
                Primitive::Point(position) => {
                    let vertex = viewport.project(position);
                    self.plot(
                        vertex.screen_position[0].round() as isize,
                        vertex.screen_position[1].round() as isize,
                        vertex.depth,
                        Cell {
                            glyph: POINT_GLYPH,
                            color: Color::Magenta,
                        },
                    );
                }
                Primitive::Label {
                    text,
                    position,
                    orientation,
                } => self.draw_label(text, position, orientation),
            }
        }
        self.objects = objects;
    }
}

/// Fixed glyph (if any) and color for each kind of line
fn line_style(kind: LineKind) -> (Option<char>, Color) {
    match kind {
        LineKind::Grid => (Some(GRID_GLYPH), Color::DarkBlue),
        LineKind::XAxis => (None, Color::Red),
        LineKind::YAxis => (None, Color::Green),
        LineKind::RotationAxis => (None, Color::Yellow),
    }
}

/// Picks a slash, bar or dash matching the on-screen slope
fn line_glyph(v0: &Vertex, v1: &Vertex) -> char {
    let dx = v1.screen_position[0] - v0.screen_position[0];
    let dy = (v1.screen_position[1] - v0.screen_position[1]) * CELL_ASPECT;
    if dx == 0.0 && dy == 0.0 {
        return '+';
    }
    let angle = dy.atan2(dx).to_degrees().rem_euclid(180.0);
    match angle {
        a if !(22.5..157.5).contains(&a) => '-',
        a if (67.5..112.5).contains(&a) => '|',
        a if a < 90.0 => '\\',
        _ => '/',
    }
}

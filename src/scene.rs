use crate::math::{multiply_matrices, rotate, rotation_matrix, Mat3, Vec3, IDENTITY};
use crate::state::{Readout, RotationParameters};
use rand::Rng;
use tracing::{debug, info};

/// Half-length of the coordinate axes, the rotation axis line and the grid
pub const EXTENT: f64 = 5.0;
/// Number of grid cells along each side
pub const GRID_DIVISIONS: i32 = 10;
/// Offset of a point label from the point it names
pub const POINT_LABEL_OFFSET: f64 = 0.3;

/// Opaque reference to an object owned by a [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u64);

/// What a line represents, so the scene graph can style it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    XAxis,
    YAxis,
    RotationAxis,
    /// Pairs of vertices, each pair one segment
    Grid,
}

/// Rendering collaborator. The scene pushes geometry into it and never reads any back.
pub trait SceneGraph {
    fn create_point(&mut self, position: Vec3) -> Handle;
    fn create_line(&mut self, kind: LineKind, points: &[Vec3]) -> Handle;
    /// Creates a label lying flat in the z=0 plane at the origin
    fn create_label(&mut self, text: &str) -> Handle;
    fn set_position(&mut self, handle: Handle, position: Vec3);
    fn set_line_points(&mut self, handle: Handle, points: &[Vec3]);
    fn set_label_transform(&mut self, handle: Handle, position: Vec3, orientation: Mat3);
    fn set_zoom(&mut self, zoom: f64);
    fn remove(&mut self, handle: Handle);
    fn render_frame(&mut self);
}

/// Line geometry with immutable source vertices
#[derive(Debug, Clone)]
pub struct TrackedLine {
    handle: Handle,
    original: Vec<Vec3>,
    displayed: Vec<Vec3>,
}

impl TrackedLine {
    #[cfg(test)]
    pub fn original(&self) -> &[Vec3] {
        &self.original
    }

    #[cfg(test)]
    pub fn displayed(&self) -> &[Vec3] {
        &self.displayed
    }
}

/// A user-placed point
#[derive(Debug, Clone, Copy)]
pub struct TrackedPoint {
    handle: Handle,
    original: Vec3,
    displayed: Vec3,
}

impl TrackedPoint {
    #[cfg(test)]
    pub fn original(&self) -> Vec3 {
        self.original
    }

    #[cfg(test)]
    pub fn displayed(&self) -> Vec3 {
        self.displayed
    }
}

/// A user-placed text label, re-oriented as well as re-positioned
#[derive(Debug, Clone)]
pub struct TrackedLabel {
    handle: Handle,
    text: String,
    original: Vec3,
    original_orientation: Mat3,
    displayed: Vec3,
    orientation: Mat3,
}

impl TrackedLabel {
    #[cfg(test)]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[cfg(test)]
    pub fn original(&self) -> Vec3 {
        self.original
    }

    #[cfg(test)]
    pub fn displayed(&self) -> Vec3 {
        self.displayed
    }

    #[cfg(test)]
    pub fn orientation(&self) -> Mat3 {
        self.orientation
    }
}

/// Owner of the rotation parameters and every tracked object
pub struct Scene<G: SceneGraph> {
    graph: G,
    params: RotationParameters,
    x_axis: TrackedLine,
    y_axis: TrackedLine,
    grid: TrackedLine,
    rotation_axis: Handle,
    points: Vec<TrackedPoint>,
    labels: Vec<TrackedLabel>,
}

impl<G: SceneGraph> Scene<G> {
    /// Builds the fixed geometry in `graph` and projects it under `params`
    pub fn new(mut graph: G, params: RotationParameters) -> Self {
        let x_axis = track_line(
            &mut graph,
            LineKind::XAxis,
            vec![[-EXTENT, 0.0, 0.0], [EXTENT, 0.0, 0.0]],
        );
        let y_axis = track_line(
            &mut graph,
            LineKind::YAxis,
            vec![[0.0, -EXTENT, 0.0], [0.0, EXTENT, 0.0]],
        );
        let grid = track_line(&mut graph, LineKind::Grid, grid_vertices());
        let rotation_axis =
            graph.create_line(LineKind::RotationAxis, &rotation_axis_line(&params));

        let mut scene = Scene {
            graph,
            params,
            x_axis,
            y_axis,
            grid,
            rotation_axis,
            points: Vec::new(),
            labels: Vec::new(),
        };
        scene.graph.set_zoom(params.zoom_factor);
        scene.refresh_all_objects();
        scene
    }

    #[cfg(test)]
    pub fn params(&self) -> &RotationParameters {
        &self.params
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    #[cfg(test)]
    pub fn points(&self) -> &[TrackedPoint] {
        &self.points
    }

    #[cfg(test)]
    pub fn labels(&self) -> &[TrackedLabel] {
        &self.labels
    }

    #[cfg(test)]
    pub fn x_axis(&self) -> &TrackedLine {
        &self.x_axis
    }

    #[cfg(test)]
    pub fn y_axis(&self) -> &TrackedLine {
        &self.y_axis
    }

    #[cfg(test)]
    pub fn grid(&self) -> &TrackedLine {
        &self.grid
    }

    /// Re-projects every tracked object from its original coordinates
    pub fn refresh_all_objects(&mut self) {
        let axis = self.params.axis();
        let angle = self.params.angle_radians();

        for line in [&mut self.x_axis, &mut self.y_axis, &mut self.grid] {
            line.displayed = line
                .original
                .iter()
                .map(|p| rotate(p, &axis, angle))
                .collect();
            self.graph.set_line_points(line.handle, &line.displayed);
        }
        self.graph
            .set_line_points(self.rotation_axis, &rotation_axis_line(&self.params));

        for point in &mut self.points {
            point.displayed = rotate(&point.original, &axis, angle);
            self.graph.set_position(point.handle, point.displayed);
        }

        let rotation = rotation_matrix(&axis, angle);
        for label in &mut self.labels {
            label.displayed = rotate(&label.original, &axis, angle);
            label.orientation = multiply_matrices(&rotation, &label.original_orientation);
            self.graph
                .set_label_transform(label.handle, label.displayed, label.orientation);
        }

        debug!(
            axis_angle = self.params.axis_angle_degrees,
            rotation_angle = self.params.rotation_angle_degrees,
            points = self.points.len(),
            labels = self.labels.len(),
            "refreshed scene"
        );
    }

    /// Replaces the parameters wholesale and refreshes
    pub fn apply_parameters(&mut self, params: RotationParameters) {
        self.params = params;
        self.graph.set_zoom(params.zoom_factor);
        self.refresh_all_objects();
    }

    pub fn set_axis_angle(&mut self, input: &str) -> bool {
        let changed = self.params.set_axis_angle(input);
        if changed {
            self.refresh_all_objects();
        }
        changed
    }

    pub fn set_rotation_angle(&mut self, input: &str) -> bool {
        let changed = self.params.set_rotation_angle(input);
        if changed {
            self.refresh_all_objects();
        }
        changed
    }

    /// Zoom only changes the view, so no object is re-projected
    pub fn set_zoom(&mut self, input: &str) -> bool {
        let changed = self.params.set_zoom(input);
        if changed {
            self.graph.set_zoom(self.params.zoom_factor);
        }
        changed
    }

    pub fn nudge_axis_angle(&mut self, delta: f64) {
        self.params.nudge_axis_angle(delta);
        self.refresh_all_objects();
    }

    pub fn nudge_rotation_angle(&mut self, delta: f64) {
        self.params.nudge_rotation_angle(delta);
        self.refresh_all_objects();
    }

    pub fn scale_zoom(&mut self, factor: f64) {
        self.params.scale_zoom(factor);
        self.graph.set_zoom(self.params.zoom_factor);
    }

    /// Restores default parameters. Points and labels are kept.
    pub fn reset(&mut self) {
        info!("resetting view");
        self.apply_parameters(RotationParameters::default());
    }

    /// Adds a point at a random original position in [-5, 5) x [-5, 5)
    pub fn add_random_point<R: Rng>(&mut self, rng: &mut R) -> Vec3 {
        let x = rng.gen_range(-EXTENT..EXTENT);
        let y = rng.gen_range(-EXTENT..EXTENT);
        self.add_point_at(x, y)
    }

    /// Adds a point at `(x, y, 0)` in the unrotated plane and returns its displayed position
    pub fn add_point_at(&mut self, x: f64, y: f64) -> Vec3 {
        let original = [x, y, 0.0];
        let displayed = rotate(&original, &self.params.axis(), self.params.angle_radians());
        let handle = self.graph.create_point(displayed);
        self.points.push(TrackedPoint {
            handle,
            original,
            displayed,
        });
        debug!(x, y, count = self.points.len(), "added point");
        displayed
    }

    /// Removes the most recently added point. Returns false when there is none.
    pub fn remove_last_point(&mut self) -> bool {
        match self.points.pop() {
            Some(point) => {
                self.graph.remove(point.handle);
                debug!(count = self.points.len(), "removed point");
                true
            }
            None => false,
        }
    }

    /// Adds a label at the origin of the unrotated plane. Blank text is ignored.
    pub fn add_label(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.push_label(text, [0.0, 0.0, 0.0]);
        true
    }

    /// Names the most recent point `P<n>`, offset slightly from it
    pub fn label_last_point(&mut self) -> bool {
        let Some(point) = self.points.last() else {
            return false;
        };
        let [x, y, z] = point.original;
        let text = format!("P{}", self.points.len());
        self.push_label(&text, [x + POINT_LABEL_OFFSET, y + POINT_LABEL_OFFSET, z]);
        true
    }

    fn push_label(&mut self, text: &str, original: Vec3) {
        let axis = self.params.axis();
        let angle = self.params.angle_radians();
        let original_orientation = IDENTITY;
        let displayed = rotate(&original, &axis, angle);
        let orientation = multiply_matrices(&rotation_matrix(&axis, angle), &original_orientation);

        let handle = self.graph.create_label(text);
        self.graph.set_label_transform(handle, displayed, orientation);
        self.labels.push(TrackedLabel {
            handle,
            text: text.to_string(),
            original,
            original_orientation,
            displayed,
            orientation,
        });
        debug!(text, count = self.labels.len(), "added label");
    }

    /// Removes every label and returns how many were removed
    pub fn clear_labels(&mut self) -> usize {
        let count = self.labels.len();
        for label in self.labels.drain(..) {
            debug!(text = %label.text, "removing label");
            self.graph.remove(label.handle);
        }
        debug!(count, "cleared labels");
        count
    }

    pub fn readout(&self) -> Readout {
        Readout {
            matrix: self.params.affine_matrix(),
            axis_angle_degrees: self.params.axis_angle_degrees,
            rotation_angle_degrees: self.params.rotation_angle_degrees,
            zoom_factor: self.params.zoom_factor,
            point_count: self.points.len(),
            label_count: self.labels.len(),
        }
    }

    pub fn render_frame(&mut self) {
        self.graph.render_frame();
    }
}

fn track_line<G: SceneGraph>(graph: &mut G, kind: LineKind, original: Vec<Vec3>) -> TrackedLine {
    let handle = graph.create_line(kind, &original);
    TrackedLine {
        handle,
        displayed: original.clone(),
        original,
    }
}

/// Segment endpoints for the grid: one horizontal and one vertical segment per step
fn grid_vertices() -> Vec<Vec3> {
    let step = 2.0 * EXTENT / GRID_DIVISIONS as f64;
    let mut vertices = Vec::with_capacity(4 * (GRID_DIVISIONS as usize + 1));
    for i in 0..=GRID_DIVISIONS {
        let offset = -EXTENT + i as f64 * step;
        vertices.push([-EXTENT, offset, 0.0]);
        vertices.push([EXTENT, offset, 0.0]);
        vertices.push([offset, -EXTENT, 0.0]);
        vertices.push([offset, EXTENT, 0.0]);
    }
    vertices
}

/// The rotation axis lies on itself, so it is drawn unrotated
fn rotation_axis_line(params: &RotationParameters) -> Vec<Vec3> {
    let [x, y, _] = params.axis();
    vec![[-x * EXTENT, -y * EXTENT, 0.0], [x * EXTENT, y * EXTENT, 0.0]]
}

use crate::math::Vec3;

/// World units visible across the smaller screen dimension at zoom 1
pub const BASE_VIEW_SIZE: f64 = 10.0;

/// Terminal cells are roughly twice as tall as they are wide
pub const CELL_ASPECT: f64 = 2.0;

/// Projected vertex: screen position and depth toward the camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Column and row, fractional
    pub screen_position: [f64; 2],
    /// Larger is closer to the viewer
    pub depth: f64,
}

/// Orthographic camera looking down -Z at the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
    pub zoom: f64,
}

impl Viewport {
    /// Columns per world unit
    pub fn scale(&self) -> f64 {
        let span = (self.width as f64).min(self.height as f64 * CELL_ASPECT);
        span / (BASE_VIEW_SIZE / self.zoom)
    }

    pub fn project(&self, position: &Vec3) -> Vertex {
        let scale = self.scale();
        let center_x = self.width as f64 / 2.0;
        let center_y = self.height as f64 / 2.0;
        Vertex {
            screen_position: [
                center_x + position[0] * scale,
                center_y - position[1] * scale / CELL_ASPECT,
            ],
            depth: position[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_lands_in_center() {
        let viewport = Viewport {
            width: 80,
            height: 24,
            zoom: 1.0,
        };
        let vertex = viewport.project(&[0.0, 0.0, 2.0]);
        assert_eq!(vertex.screen_position, [40.0, 12.0]);
        assert_eq!(vertex.depth, 2.0);
    }

    #[test]
    fn view_spans_ten_units_at_unit_zoom() {
        let viewport = Viewport {
            width: 100,
            height: 25,
            zoom: 1.0,
        };
        // 25 rows are 50 columns tall, so the height limits the view
        assert_eq!(viewport.scale(), 5.0);
        let top = viewport.project(&[0.0, 5.0, 0.0]);
        assert_eq!(top.screen_position[1], 0.0);
    }

    #[test]
    fn zoom_magnifies() {
        let mut viewport = Viewport {
            width: 60,
            height: 40,
            zoom: 1.0,
        };
        let before = viewport.project(&[1.0, 0.0, 0.0]).screen_position[0];
        viewport.zoom = 2.0;
        let after = viewport.project(&[1.0, 0.0, 0.0]).screen_position[0];
        assert_eq!(after - 30.0, 2.0 * (before - 30.0));
    }
}

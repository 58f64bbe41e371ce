use crate::error::AppError;
use crate::graphics::Canvas;
use crate::scene::Scene;
use crate::state::RotationParameters;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Color;
use rand::rngs::StdRng;
use std::io::{self, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Degrees added per arrow key press
const ANGLE_STEP: f64 = 5.0;
/// Zoom multiplier per `+`/`-` press
const ZOOM_STEP: f64 = 1.1;

const HELP: &str = "←→ axis ↑↓ rot +- zoom 1/2/3 edit a/x pt l tag t text c clear r reset q quit";

/// Field being typed into at the bottom of the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    AxisAngle,
    RotationAngle,
    Zoom,
    Label,
}

impl Entry {
    fn prompt(&self) -> &'static str {
        match self {
            Entry::AxisAngle => "axis angle (deg)",
            Entry::RotationAngle => "rotation angle (deg)",
            Entry::Zoom => "zoom",
            Entry::Label => "label text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Normal,
    Editing { entry: Entry, buffer: String },
}

/// Frames per second, averaged over windows of at least one second
struct FpsCounter {
    frames: usize,
    window_start: Instant,
    fps: f64,
}

impl FpsCounter {
    fn new() -> Self {
        FpsCounter {
            frames: 0,
            window_start: Instant::now(),
            fps: 0.0,
        }
    }

    /// Counts a frame drawn at `now` and returns the latest rate
    fn tick(&mut self, now: Instant) -> f64 {
        self.frames += 1;
        let elapsed = now.duration_since(self.window_start).as_secs_f64();
        if elapsed >= 1.0 {
            self.fps = self.frames as f64 / elapsed;
            self.frames = 0;
            self.window_start = now;
        }
        self.fps
    }
}

/// Interactive rotated-plane view
pub struct PlaneWidget {
    scene: Scene<Canvas>,
    rng: StdRng,
    mode: Mode,
    /// Enable debug overlay
    debug: bool,
    quit: bool,
    fps: FpsCounter,
}

impl PlaneWidget {
    pub fn new(canvas: Canvas, params: RotationParameters, rng: StdRng) -> Self {
        PlaneWidget {
            scene: Scene::new(canvas, params),
            rng,
            mode: Mode::Normal,
            debug: false,
            quit: false,
            fps: FpsCounter::new(),
        }
    }

    #[cfg(test)]
    pub fn scene(&self) -> &Scene<Canvas> {
        &self.scene
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// The field currently being edited, if any
    #[cfg(test)]
    pub fn editing(&self) -> Option<Entry> {
        match &self.mode {
            Mode::Normal => None,
            Mode::Editing { entry, .. } => Some(*entry),
        }
    }

    pub fn resize(&mut self, columns: u16, rows: u16) {
        debug!(columns, rows, "resized");
        self.scene
            .graph_mut()
            .resize(columns.max(1) as usize, rows.max(1) as usize);
    }

    /// Handle a key press
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }

        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        self.mode = match mode {
            Mode::Normal => self.handle_command(key.code),
            Mode::Editing { entry, mut buffer } => match key.code {
                KeyCode::Enter => {
                    self.commit(entry, &buffer);
                    Mode::Normal
                }
                KeyCode::Esc => Mode::Normal,
                KeyCode::Backspace => {
                    buffer.pop();
                    Mode::Editing { entry, buffer }
                }
                KeyCode::Char(c) => {
                    buffer.push(c);
                    Mode::Editing { entry, buffer }
                }
                _ => Mode::Editing { entry, buffer },
            },
        };
    }

    fn handle_command(&mut self, code: KeyCode) -> Mode {
        let edit = |entry| Mode::Editing {
            entry,
            buffer: String::new(),
        };
        match code {
            KeyCode::Left => self.scene.nudge_axis_angle(-ANGLE_STEP),
            KeyCode::Right => self.scene.nudge_axis_angle(ANGLE_STEP),
            KeyCode::Up => self.scene.nudge_rotation_angle(ANGLE_STEP),
            KeyCode::Down => self.scene.nudge_rotation_angle(-ANGLE_STEP),
            KeyCode::Char('+') | KeyCode::Char('=') => self.scene.scale_zoom(ZOOM_STEP),
            KeyCode::Char('-') => self.scene.scale_zoom(1.0 / ZOOM_STEP),
            KeyCode::Char('1') => return edit(Entry::AxisAngle),
            KeyCode::Char('2') => return edit(Entry::RotationAngle),
            KeyCode::Char('3') => return edit(Entry::Zoom),
            KeyCode::Char('t') | KeyCode::Char('T') => return edit(Entry::Label),
            KeyCode::Char('a') | KeyCode::Char('A') => {
                self.scene.add_random_point(&mut self.rng);
            }
            KeyCode::Char('x') | KeyCode::Char('X') => {
                self.scene.remove_last_point();
            }
            KeyCode::Char('l') | KeyCode::Char('L') => {
                self.scene.label_last_point();
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                self.scene.clear_labels();
            }
            KeyCode::Char('r') | KeyCode::Char('R') => self.scene.reset(),
            KeyCode::Char('d') | KeyCode::Char('D') => self.debug = !self.debug,
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.quit = true,
            _ => {}
        }
        Mode::Normal
    }

    fn commit(&mut self, entry: Entry, buffer: &str) {
        let applied = match entry {
            Entry::AxisAngle => self.scene.set_axis_angle(buffer),
            Entry::RotationAngle => self.scene.set_rotation_angle(buffer),
            Entry::Zoom => self.scene.set_zoom(buffer),
            Entry::Label => self.scene.add_label(buffer),
        };
        debug!(?entry, applied, "entry committed");
    }

    /// Rasterize the scene and draw the readout on top
    pub fn paint(&mut self) {
        let fps = self.fps.tick(Instant::now());
        self.scene.render_frame();
        let readout = self.scene.readout();
        let canvas = self.scene.graph_mut();

        for (row, line) in readout.lines().iter().enumerate() {
            canvas.draw_text(1, row, line, Color::White);
        }

        let bottom = canvas.height().saturating_sub(1);
        match &self.mode {
            Mode::Normal => canvas.draw_text(1, bottom, HELP, Color::DarkGrey),
            Mode::Editing { entry, buffer } => {
                let prompt = format!("{}: {}_", entry.prompt(), buffer);
                canvas.draw_text(1, bottom, &prompt, Color::Cyan);
            }
        }

        if self.debug {
            let lines = [
                format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
                format!("FPS: {:.2}", fps),
                format!("Canvas: {}x{}", canvas.width(), canvas.height()),
            ];
            for (row, line) in lines.iter().enumerate() {
                let column = canvas.width().saturating_sub(line.chars().count() + 1);
                canvas.draw_text(column, row, line, Color::Grey);
            }
        }
    }

    pub fn present<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.scene.graph().present(out)
    }
}

/// Runs the event loop until the user quits
pub fn run<W: Write>(
    out: &mut W,
    widget: &mut PlaneWidget,
    frame: Duration,
) -> Result<(), AppError> {
    info!(frame_ms = frame.as_millis() as u64, "starting event loop");
    while !widget.should_quit() {
        widget.paint();
        widget.present(out)?;

        if event::poll(frame)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => widget.handle_key(key),
                Event::Resize(columns, rows) => widget.resize(columns, rows),
                _ => {}
            }
        }
    }
    info!("quit requested");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn widget() -> PlaneWidget {
        PlaneWidget::new(
            Canvas::new(80, 24),
            RotationParameters::default(),
            StdRng::seed_from_u64(1),
        )
    }

    fn press(widget: &mut PlaneWidget, code: KeyCode) {
        widget.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(widget: &mut PlaneWidget, text: &str) {
        for c in text.chars() {
            press(widget, KeyCode::Char(c));
        }
    }

    #[test]
    fn arrows_adjust_angles() {
        let mut widget = widget();
        press(&mut widget, KeyCode::Right);
        press(&mut widget, KeyCode::Down);
        let params = widget.scene().params();
        assert_eq!(params.axis_angle_degrees, 50.0);
        assert_eq!(params.rotation_angle_degrees, 355.0);
    }

    #[test]
    fn points_are_added_and_removed() {
        let mut widget = widget();
        press(&mut widget, KeyCode::Char('a'));
        press(&mut widget, KeyCode::Char('a'));
        press(&mut widget, KeyCode::Char('x'));
        assert_eq!(widget.scene().points().len(), 1);
        press(&mut widget, KeyCode::Char('x'));
        press(&mut widget, KeyCode::Char('x'));
        assert!(widget.scene().points().is_empty());
    }

    #[test]
    fn typed_rotation_is_applied() {
        let mut widget = widget();
        press(&mut widget, KeyCode::Char('2'));
        assert_eq!(widget.editing(), Some(Entry::RotationAngle));
        type_text(&mut widget, "1200");
        press(&mut widget, KeyCode::Backspace);
        press(&mut widget, KeyCode::Enter);
        assert_eq!(widget.editing(), None);
        assert_eq!(widget.scene().params().rotation_angle_degrees, 120.0);
    }

    #[test]
    fn bad_typed_value_is_ignored() {
        let mut widget = widget();
        press(&mut widget, KeyCode::Char('1'));
        type_text(&mut widget, "abc");
        press(&mut widget, KeyCode::Enter);
        assert_eq!(widget.scene().params().axis_angle_degrees, 45.0);
    }

    #[test]
    fn escape_cancels_entry() {
        let mut widget = widget();
        press(&mut widget, KeyCode::Char('3'));
        type_text(&mut widget, "4");
        press(&mut widget, KeyCode::Esc);
        assert_eq!(widget.editing(), None);
        assert_eq!(widget.scene().params().zoom_factor, 1.0);
        assert!(!widget.should_quit());
    }

    #[test]
    fn text_entry_adds_label_and_clear_removes_it() {
        let mut widget = widget();
        press(&mut widget, KeyCode::Char('t'));
        type_text(&mut widget, "hi q");
        press(&mut widget, KeyCode::Enter);
        assert_eq!(widget.scene().labels().len(), 1);
        assert_eq!(widget.scene().labels()[0].text(), "hi q");
        assert!(!widget.should_quit());

        press(&mut widget, KeyCode::Char('t'));
        press(&mut widget, KeyCode::Enter);
        assert_eq!(widget.scene().labels().len(), 1);

        press(&mut widget, KeyCode::Char('c'));
        assert!(widget.scene().labels().is_empty());
    }

    #[test]
    fn reset_keeps_points() {
        let mut widget = widget();
        press(&mut widget, KeyCode::Up);
        press(&mut widget, KeyCode::Char('+'));
        press(&mut widget, KeyCode::Char('a'));
        press(&mut widget, KeyCode::Char('r'));
        assert_eq!(*widget.scene().params(), RotationParameters::default());
        assert_eq!(widget.scene().points().len(), 1);
    }

    #[test]
    fn paint_shows_readout_and_prompt() {
        let mut widget = widget();
        widget.paint();
        let canvas = widget.scene().graph();
        assert!(canvas.row_text(0).contains("φ = 45°"));
        assert!(canvas.row_text(1).contains("1.00"));
        assert!(canvas.row_text(23).contains("reset"));

        press(&mut widget, KeyCode::Char('t'));
        type_text(&mut widget, "xy");
        widget.paint();
        assert!(widget.scene().graph().row_text(23).contains("label text: xy_"));
    }

    #[test]
    fn debug_overlay_toggles() {
        let mut widget = widget();
        press(&mut widget, KeyCode::Char('d'));
        widget.paint();
        assert!(widget.scene().graph().row_text(0).contains("planeview"));
    }

    #[test]
    fn quit_keys() {
        let mut widget = widget();
        press(&mut widget, KeyCode::Char('q'));
        assert!(widget.should_quit());

        let mut widget = self::widget();
        widget.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(widget.should_quit());
    }

    #[test]
    fn fps_averages_over_a_second() {
        let start = Instant::now();
        let mut counter = FpsCounter {
            frames: 0,
            window_start: start,
            fps: 0.0,
        };
        for i in 1..30 {
            assert_eq!(counter.tick(start + Duration::from_millis(i * 10)), 0.0);
        }
        let fps = counter.tick(start + Duration::from_secs(2));
        assert_eq!(fps, 15.0);
        assert_eq!(counter.frames, 0);
    }

    #[test]
    fn resize_updates_canvas() {
        let mut widget = widget();
        widget.resize(120, 40);
        let canvas = widget.scene().graph();
        assert_eq!((canvas.width(), canvas.height()), (120, 40));
    }
}

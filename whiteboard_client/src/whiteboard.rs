use crate::{
    error::ClientError,
    shared_types::{Point, Segment, WsMessage},
    surface::Surface,
    transport::Transport,
};

pub const THICKNESS_MIN: u32 = 1;
pub const THICKNESS_MAX: u32 = 120;
pub const DEFAULT_COLOR: &str = "#4d4d4d";
pub const DEFAULT_THICKNESS: u32 = 4;

/// Where our own strokes get rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    /// Draw on pointer move; the relay does not send our segments back.
    #[default]
    Immediate,
    /// Draw only what the relay echoes back to us.
    Echo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetOptions {
    pub color: String,
    pub thickness: u32,
    pub mode: DrawMode,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            thickness: DEFAULT_THICKNESS,
            mode: DrawMode::default(),
        }
    }
}

/// A pointer event in client (viewport) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub client: Point,
    pub primary_held: bool,
}

impl PointerEvent {
    pub const fn new(x: f64, y: f64, primary_held: bool) -> Self {
        Self {
            client: Point::new(x, y),
            primary_held,
        }
    }
}

fn clamp_thickness(value: i64) -> u32 {
    value.clamp(THICKNESS_MIN as i64, THICKNESS_MAX as i64) as u32
}

/// The drawing widget: turns pointer input into relay messages and renders
/// relay messages onto its surface.
///
/// Local and remote strokes keep separate cursors, so a remote path-begin
/// never cuts the stroke we are drawing and vice versa.
#[derive(Debug)]
pub struct Whiteboard<S, T> {
    surface: S,
    transport: T,
    color: String,
    thickness: u32,
    mode: DrawMode,
    local_cursor: Option<Point>,
    remote_cursor: Option<Point>,
    connection_id: Option<String>,
}

impl<S: Surface, T: Transport> Whiteboard<S, T> {
    pub fn new(surface: S, transport: T, options: WidgetOptions) -> Self {
        let mut board = Self {
            surface,
            transport,
            color: options.color,
            thickness: clamp_thickness(options.thickness as i64),
            mode: options.mode,
            local_cursor: None,
            remote_cursor: None,
            connection_id: None,
        };
        board.resize();
        board
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    /// Any string is accepted; the surface decides whether it can stroke
    /// with it.
    pub fn set_color(&mut self, value: impl Into<String>) {
        self.color = value.into();
    }

    pub fn thickness(&self) -> u32 {
        self.thickness
    }

    pub fn set_thickness(&mut self, value: u32) {
        self.thickness = clamp_thickness(value as i64);
    }

    pub fn increase_thickness(&mut self, step: i32) {
        self.thickness = clamp_thickness(self.thickness as i64 + step as i64);
    }

    pub fn decrease_thickness(&mut self, step: i32) {
        self.thickness = clamp_thickness(self.thickness as i64 - step as i64);
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    /// Id the relay assigned to our connection, once it has told us.
    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_parts(self) -> (S, T) {
        (self.surface, self.transport)
    }

    pub fn on_pointer_down(&mut self) {
        self.local_cursor = None;
        self.transport.send(WsMessage::DrawBeginPath);
    }

    pub fn on_pointer_move(&mut self, event: PointerEvent) {
        if event.primary_held {
            self.draw_to(event);
        }
    }

    /// A click without movement still marks the surface.
    pub fn on_click(&mut self, event: PointerEvent) {
        self.draw_to(event);
    }

    pub fn on_remote(&mut self, message: WsMessage) {
        match message {
            WsMessage::Draw(segment) => self.on_remote_segment(&segment),
            WsMessage::DrawBeginPath => self.on_remote_path_begin(),
            WsMessage::Connected(info) => {
                self.mode = if info.echoes {
                    DrawMode::Echo
                } else {
                    DrawMode::Immediate
                };
                log::info!("Connected to relay as {} ({:?})", info.id, self.mode);
                self.connection_id = Some(info.id);
            }
        }
    }

    /// Renders with the sender's color and thickness, never ours.
    ///
    /// A segment stamped with its sender already carries the right `prev`, so
    /// a missing one starts a new path. Only unstamped segments fall back to
    /// the shared remote cursor.
    pub fn on_remote_segment(&mut self, segment: &Segment) {
        let from = match segment.from {
            Some(_) => segment.prev.unwrap_or(segment.curr),
            None => {
                let from = segment
                    .prev
                    .or(self.remote_cursor)
                    .unwrap_or(segment.curr);
                self.remote_cursor = Some(segment.curr);
                from
            }
        };
        let thickness = clamp_thickness(segment.thickness as i64);
        self.surface
            .stroke_line(from, segment.curr, &segment.color, thickness);
    }

    pub fn on_remote_path_begin(&mut self) {
        self.remote_cursor = None;
    }

    /// Matches the backing store to the displayed size. Clears the surface:
    /// there is no replay log, so earlier drawing is lost.
    pub fn resize(&mut self) {
        let (width, height) = self.surface.layout_size();
        self.surface.resize(width, height);
        self.surface.clear();
    }

    pub fn download(&self, filename: &str) -> Result<(), ClientError> {
        self.surface.download(filename)
    }

    fn to_local(&self, client: Point) -> Point {
        let origin = self.surface.origin();
        let (width, height) = self.surface.size();
        Point::new(
            (client.x - origin.x).clamp(0.0, width as f64),
            (client.y - origin.y).clamp(0.0, height as f64),
        )
    }

    fn draw_to(&mut self, event: PointerEvent) {
        let point = self.to_local(event.client);
        let prev = self.local_cursor.unwrap_or(point);

        if self.mode == DrawMode::Immediate {
            self.surface
                .stroke_line(prev, point, &self.color, self.thickness);
        }
        self.local_cursor = Some(point);

        self.transport.send(WsMessage::Draw(Segment::new(
            Some(prev),
            point,
            self.color.clone(),
            self.thickness,
        )));
    }
}

use serde::{Deserialize, Serialize};

// A position on the drawing surface, in surface-local pixels.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// One line segment of a stroke.
// Accepts both the `{prev, curr, ..}` and the bare `{x, y, ..}` payloads,
// but always serializes as `{prev, curr, ..}`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(from = "DrawPayload")]
pub struct Segment {
    pub prev: Option<Point>,
    pub curr: Point,
    pub color: String,
    pub thickness: u32,
    /// Connection that drew the segment. Set by an echoing relay, whose
    /// `prev` is then authoritative: `None` starts a new path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl Segment {
    pub fn new(prev: Option<Point>, curr: Point, color: impl Into<String>, thickness: u32) -> Self {
        Self {
            prev,
            curr,
            color: color.into(),
            thickness,
            from: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DrawPayload {
    Segment {
        #[serde(default)]
        prev: Option<Point>,
        curr: Point,
        color: String,
        thickness: u32,
        #[serde(default)]
        from: Option<String>,
    },
    Point {
        x: f64,
        y: f64,
        color: String,
        thickness: u32,
        #[serde(default)]
        from: Option<String>,
    },
}

impl From<DrawPayload> for Segment {
    fn from(payload: DrawPayload) -> Self {
        match payload {
            DrawPayload::Segment {
                prev,
                curr,
                color,
                thickness,
                from,
            } => Segment {
                prev,
                curr,
                color,
                thickness,
                from,
            },
            DrawPayload::Point {
                x,
                y,
                color,
                thickness,
                from,
            } => Segment {
                prev: None,
                curr: Point::new(x, y),
                color,
                thickness,
                from,
            },
        }
    }
}

// Sent by the relay once a connection has joined its room.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct ConnectionInfo {
    pub id: String,
    /// The relay sends our own segments back to us.
    #[serde(default)]
    pub echoes: bool,
}

// Message format for WebSocket communication.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(tag = "event", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WsMessage {
    Draw(Segment),
    DrawBeginPath,
    Connected(ConnectionInfo),
}

impl WsMessage {
    pub fn from_text(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_text(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn begin_path_has_no_payload() {
        let text = WsMessage::DrawBeginPath.to_text().unwrap();
        assert_eq!(text, r#"{"event":"DRAW_BEGIN_PATH"}"#);
        assert_eq!(
            WsMessage::from_text(r#"{"event":"DRAW_BEGIN_PATH"}"#).unwrap(),
            WsMessage::DrawBeginPath
        );
    }

    #[test]
    fn bare_point_payload_becomes_segment_without_prev() {
        let msg = WsMessage::from_text(
            r##"{"event":"DRAW","data":{"x":10,"y":12.5,"color":"#ff0000","thickness":8}}"##,
        )
        .unwrap();
        assert_eq!(
            msg,
            WsMessage::Draw(Segment::new(None, Point::new(10.0, 12.5), "#ff0000", 8))
        );
    }

    #[test]
    fn segment_payload_keeps_prev() {
        let msg = WsMessage::from_text(
            r#"{"event":"DRAW","data":{"prev":{"x":1,"y":2},"curr":{"x":3,"y":4},"color":"red","thickness":4}}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            WsMessage::Draw(Segment::new(
                Some(Point::new(1.0, 2.0)),
                Point::new(3.0, 4.0),
                "red",
                4
            ))
        );
    }

    #[test]
    fn segment_serializes_in_prev_curr_form() {
        let msg = WsMessage::Draw(Segment::new(None, Point::new(3.0, 4.0), "blue", 2));
        let value: serde_json::Value = serde_json::from_str(&msg.to_text().unwrap()).unwrap();
        assert_eq!(value["event"], "DRAW");
        assert_eq!(value["data"]["prev"], serde_json::Value::Null);
        assert_eq!(value["data"]["curr"]["x"], 3.0);
        assert_eq!(value["data"]["thickness"], 2);
    }

    #[test]
    fn sender_is_only_written_when_stamped() {
        let mut segment = Segment::new(None, Point::new(3.0, 4.0), "blue", 2);
        let value: serde_json::Value =
            serde_json::from_str(&WsMessage::Draw(segment.clone()).to_text().unwrap()).unwrap();
        assert!(value["data"].get("from").is_none());

        segment.from = Some("V1StGXR8_Z".into());
        let text = WsMessage::Draw(segment.clone()).to_text().unwrap();
        assert_eq!(WsMessage::from_text(&text).unwrap(), WsMessage::Draw(segment));
    }

    #[test]
    fn connected_defaults_to_not_echoing() {
        assert_eq!(
            WsMessage::from_text(r#"{"event":"CONNECTED","data":{"id":"abc"}}"#).unwrap(),
            WsMessage::Connected(ConnectionInfo {
                id: "abc".into(),
                echoes: false,
            })
        );
    }

    #[test]
    fn malformed_draw_is_rejected() {
        assert!(WsMessage::from_text(r#"{"event":"DRAW","data":{"x":1}}"#).is_err());
        assert!(WsMessage::from_text(r#"{"event":"ERASE"}"#).is_err());
        assert!(WsMessage::from_text("not json").is_err());
    }
}

use clap::{Parser, Subcommand};
use comfy_table::Table;
use futures_util::{SinkExt, StreamExt};
use spinners::{Spinner, Spinners};
use std::collections::BTreeSet;
use std::error::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use whiteboard_client::{
    DEFAULT_COLOR, DEFAULT_THICKNESS, DrawMode, PixmapSurface, Point, PointerEvent, WidgetOptions,
    Whiteboard, WsMessage,
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A terminal client for the collaborative whiteboard.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// WebSocket endpoint of the relay (append /<room> for a named room).
    #[arg(long, global = true, default_value = "ws://127.0.0.1:3000/ws")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render everything drawn in the room, then save it as a PNG on Ctrl-C.
    Watch {
        #[arg(long, default_value = "art.png")]
        out: String,
        #[arg(long, default_value_t = 800)]
        width: u32,
        #[arg(long, default_value_t = 600)]
        height: u32,
    },
    /// Draw one stroke through the given points.
    /// Example: whiteboard draw --color red 10,10 40,25 80,60
    Draw {
        #[arg(long, default_value = DEFAULT_COLOR)]
        color: String,
        #[arg(long, default_value_t = DEFAULT_THICKNESS)]
        thickness: u32,
        #[arg(long, default_value_t = 800)]
        width: u32,
        #[arg(long, default_value_t = 600)]
        height: u32,
        /// Points as X,Y pairs.
        #[arg(required = true, value_parser = parse_point, allow_hyphen_values = true)]
        points: Vec<Point>,
    },
}

fn parse_point(value: &str) -> Result<Point, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got {value:?}"))?;
    let coordinate = |part: &str| {
        part.trim()
            .parse::<f64>()
            .ok()
            .filter(|c| c.is_finite())
            .ok_or_else(|| format!("invalid coordinate {part:?}"))
    };
    Ok(Point::new(coordinate(x)?, coordinate(y)?))
}

// What a watch session saw, for the closing summary.
#[derive(Debug, Default, PartialEq)]
struct Recording {
    strokes: usize,
    segments: usize,
    colors: BTreeSet<String>,
    max_thickness: u32,
}

impl Recording {
    fn record(&mut self, message: &WsMessage) {
        match message {
            WsMessage::DrawBeginPath => self.strokes += 1,
            WsMessage::Draw(segment) => {
                self.segments += 1;
                self.max_thickness = self.max_thickness.max(segment.thickness);
                self.colors.insert(segment.color.clone());
            }
            WsMessage::Connected(_) => {}
        }
    }

    fn summary(&self, connection_id: Option<&str>, mode: DrawMode, saved_to: &str) -> Table {
        let colors = if self.colors.is_empty() {
            "-".to_string()
        } else {
            self.colors.iter().cloned().collect::<Vec<_>>().join(", ")
        };

        let mut table = Table::new();
        table.set_header(vec!["Session", "Value"]);
        table.add_row(vec!["Connection", connection_id.unwrap_or("-")]);
        table.add_row(vec![
            "Relay echoes",
            if mode == DrawMode::Echo { "yes" } else { "no" },
        ]);
        table.add_row(vec!["Strokes begun".to_string(), self.strokes.to_string()]);
        table.add_row(vec!["Segments".to_string(), self.segments.to_string()]);
        table.add_row(vec!["Colors".to_string(), colors]);
        table.add_row(vec!["Max thickness".to_string(), self.max_thickness.to_string()]);
        table.add_row(vec!["Saved to", saved_to]);
        table
    }
}

async fn connect(url: &str) -> Option<Socket> {
    let mut sp = Spinner::new(Spinners::Dots9, format!("Connecting to {}...", url));
    match connect_async(url).await {
        Ok((socket, _)) => {
            sp.stop_with_message("✓ Connected to the relay.".into());
            Some(socket)
        }
        Err(e) => {
            sp.stop_with_message(format!("✗ Error: Could not connect to the relay: {}", e));
            None
        }
    }
}

fn decode(frame: Message) -> Option<WsMessage> {
    let Message::Text(text) = frame else {
        return None;
    };
    match WsMessage::from_text(text.as_str()) {
        Ok(message) => Some(message),
        Err(e) => {
            debug!("Ignoring malformed frame: {}", e);
            None
        }
    }
}

async fn watch(url: &str, out: &str, width: u32, height: u32) -> Result<(), Box<dyn Error>> {
    let surface = PixmapSurface::new(width, height)?;
    let mut board = Whiteboard::new(surface, (), WidgetOptions::default());
    let mut recording = Recording::default();

    let Some(mut socket) = connect(url).await else {
        return Ok(());
    };
    println!("Watching. Press Ctrl-C to save {}.", out);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            frame = socket.next() => match frame {
                Some(Ok(Message::Close(_))) | None => {
                    println!("The relay closed the connection.");
                    break;
                }
                Some(Ok(frame)) => {
                    if let Some(message) = decode(frame) {
                        recording.record(&message);
                        board.on_remote(message);
                    }
                }
                Some(Err(e)) => {
                    warn!("Connection lost: {}", e);
                    break;
                }
            },
            _ = &mut ctrl_c => {
                let _ = socket.close(None).await;
                break;
            }
        }
    }

    board.download(out)?;
    println!(
        "{}",
        recording.summary(board.connection_id(), board.mode(), out)
    );
    Ok(())
}

async fn draw(
    url: &str,
    options: WidgetOptions,
    width: u32,
    height: u32,
    points: &[Point],
) -> Result<(), Box<dyn Error>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut board = Whiteboard::new(PixmapSurface::new(width, height)?, tx, options);

    let Some(mut socket) = connect(url).await else {
        return Ok(());
    };

    // The relay greets a connection once it has joined its room.
    while let Some(frame) = socket.next().await {
        if let Some(message @ WsMessage::Connected(_)) = decode(frame?) {
            board.on_remote(message);
            break;
        }
    }
    debug!("Drawing in {:?} mode", board.mode());

    board.on_pointer_down();
    for point in points {
        board.on_pointer_move(PointerEvent::new(point.x, point.y, true));
    }
    // Dropping the board closes the channel, so the drain below ends.
    drop(board);

    let mut sp = Spinner::new(Spinners::Dots9, "Sending stroke...".into());
    let mut sent = 0;
    while let Some(message) = rx.recv().await {
        socket.send(Message::Text(message.to_text()?.into())).await?;
        sent += 1;
    }
    socket.close(None).await?;
    sp.stop_with_message(format!("✓ Sent {} messages.", sent));

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "whiteboard=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch { out, width, height } => watch(&cli.url, &out, width, height).await?,
        Commands::Draw {
            color,
            thickness,
            width,
            height,
            points,
        } => {
            let options = WidgetOptions {
                color,
                thickness,
                ..WidgetOptions::default()
            };
            draw(&cli.url, options, width, height, &points).await?
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use whiteboard_client::{ConnectionInfo, Segment};

    #[test]
    fn parses_points() {
        assert_eq!(parse_point("10,20"), Ok(Point::new(10.0, 20.0)));
        assert_eq!(parse_point(" -3.5 , 4"), Ok(Point::new(-3.5, 4.0)));
        assert!(parse_point("10").is_err());
        assert!(parse_point("a,b").is_err());
        assert!(parse_point("NaN,1").is_err());
    }

    #[test]
    fn parses_draw_arguments() {
        let cli = Cli::try_parse_from([
            "whiteboard",
            "--url",
            "ws://relay:3000/ws/studio",
            "draw",
            "--thickness",
            "9",
            "1,1",
            "5,5",
        ])
        .unwrap();

        assert_eq!(cli.url, "ws://relay:3000/ws/studio");
        match cli.command {
            Commands::Draw {
                color,
                thickness,
                points,
                ..
            } => {
                assert_eq!(color, DEFAULT_COLOR);
                assert_eq!(thickness, 9);
                assert_eq!(points, vec![Point::new(1.0, 1.0), Point::new(5.0, 5.0)]);
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(Cli::try_parse_from(["whiteboard", "draw"]).is_err());
    }

    #[test]
    fn records_what_was_drawn() {
        let mut recording = Recording::default();
        for message in [
            WsMessage::Connected(ConnectionInfo {
                id: "me".into(),
                echoes: false,
            }),
            WsMessage::DrawBeginPath,
            WsMessage::Draw(Segment::new(None, Point::new(1.0, 1.0), "red", 3)),
            WsMessage::Draw(Segment::new(None, Point::new(2.0, 2.0), "#00f", 12)),
            WsMessage::DrawBeginPath,
            WsMessage::Draw(Segment::new(None, Point::new(9.0, 9.0), "red", 5)),
        ] {
            recording.record(&message);
        }

        assert_eq!(recording.strokes, 2);
        assert_eq!(recording.segments, 3);
        assert_eq!(recording.max_thickness, 12);
        assert_eq!(
            recording.colors.into_iter().collect::<Vec<_>>(),
            vec!["#00f".to_string(), "red".to_string()]
        );
    }

    #[test]
    fn summary_reports_whether_the_relay_echoes() {
        let recording = Recording::default();
        let echoing = recording
            .summary(Some("me"), DrawMode::Echo, "art.png")
            .to_string();
        assert!(echoing.contains("Relay echoes") && echoing.contains("yes"));

        let plain = recording
            .summary(None, DrawMode::Immediate, "art.png")
            .to_string();
        assert!(plain.contains("no"));
        assert!(!plain.contains("yes"));
    }
}

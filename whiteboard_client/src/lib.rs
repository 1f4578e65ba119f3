//! Drawing widget core for the collaborative whiteboard.
//!
//! [`Whiteboard`] owns the stroke color and thickness, converts pointer input
//! into [`WsMessage`]s for the relay and renders the relay's messages. The
//! bitmap and the connection are behind the [`Surface`] and [`Transport`]
//! traits so the same widget runs in the browser and headless.

pub mod color;
pub mod error;
pub mod shared_types;
pub mod surface;
pub mod transport;
pub mod whiteboard;

pub use error::ClientError;
pub use shared_types::{ConnectionInfo, Point, Segment, WsMessage};
#[cfg(feature = "raster")]
pub use surface::PixmapSurface;
pub use surface::Surface;
pub use transport::Transport;
pub use whiteboard::{
    DEFAULT_COLOR, DEFAULT_THICKNESS, DrawMode, PointerEvent, THICKNESS_MAX, THICKNESS_MIN,
    WidgetOptions, Whiteboard,
};

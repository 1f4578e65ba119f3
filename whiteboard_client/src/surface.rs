use crate::{error::ClientError, shared_types::Point};

/// A bitmap the whiteboard draws on.
///
/// Every line is stroked with round caps and round joins, so a segment whose
/// endpoints coincide still leaves a dot of the given thickness.
pub trait Surface {
    /// Size of the backing store in pixels.
    fn size(&self) -> (u32, u32);

    /// Size the surface is displayed at. `resize` brings the backing store to
    /// this size.
    fn layout_size(&self) -> (u32, u32);

    /// Top-left corner of the surface in client (viewport) coordinates.
    fn origin(&self) -> Point;

    /// Reallocates the backing store. The previous contents are lost.
    fn resize(&mut self, width: u32, height: u32);

    fn clear(&mut self);

    fn stroke_line(&mut self, from: Point, to: Point, color: &str, thickness: u32);

    /// Exports the current pixels as a PNG named `filename`.
    fn download(&self, filename: &str) -> Result<(), ClientError>;
}

#[cfg(feature = "raster")]
pub use raster::PixmapSurface;

#[cfg(feature = "raster")]
mod raster {
    use super::Surface;
    use crate::{
        color::{Rgba, parse_css_color},
        error::ClientError,
        shared_types::Point,
    };
    use std::{fs, path::Path};
    use tiny_skia::{
        Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform,
    };

    /// Headless RGBA surface backed by a `tiny_skia::Pixmap`.
    ///
    /// Starts transparent, like a fresh canvas. The layout size and origin
    /// stand in for the CSS box a browser canvas would have.
    #[derive(Debug, Clone)]
    pub struct PixmapSurface {
        pixmap: Pixmap,
        layout: (u32, u32),
        origin: Point,
        stroke_color: Rgba,
    }

    impl PixmapSurface {
        pub fn new(width: u32, height: u32) -> Result<Self, ClientError> {
            let pixmap =
                Pixmap::new(width, height).ok_or(ClientError::InvalidSize { width, height })?;
            Ok(Self {
                pixmap,
                layout: (width, height),
                origin: Point::default(),
                stroke_color: Rgba::BLACK,
            })
        }

        pub fn with_origin(mut self, origin: Point) -> Self {
            self.origin = origin;
            self
        }

        /// Changes the displayed size without touching the pixels. Takes
        /// effect on the next `resize`.
        pub fn set_layout_size(&mut self, width: u32, height: u32) {
            self.layout = (width, height);
        }

        pub fn pixmap(&self) -> &Pixmap {
            &self.pixmap
        }

        /// Straight (non-premultiplied) RGBA of one pixel.
        pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
            self.pixmap.pixel(x, y).map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
        }

        pub fn encode_png(&self) -> Result<Vec<u8>, ClientError> {
            self.pixmap
                .encode_png()
                .map_err(|e| ClientError::Encode(e.to_string()))
        }

        fn paint(&mut self, color: &str) -> Paint<'static> {
            match parse_css_color(color) {
                Some(parsed) => self.stroke_color = parsed,
                None => log::debug!("Ignoring unparseable stroke color {:?}", color),
            }

            let Rgba { r, g, b, a } = self.stroke_color;
            let mut paint = Paint::default();
            paint.set_color_rgba8(r, g, b, a);
            paint.anti_alias = true;
            paint
        }
    }

    impl Surface for PixmapSurface {
        fn size(&self) -> (u32, u32) {
            (self.pixmap.width(), self.pixmap.height())
        }

        fn layout_size(&self) -> (u32, u32) {
            self.layout
        }

        fn origin(&self) -> Point {
            self.origin
        }

        fn resize(&mut self, width: u32, height: u32) {
            // A pixmap cannot be empty; a collapsed layout keeps one pixel.
            let (width, height) = (width.max(1), height.max(1));
            if let Some(pixmap) = Pixmap::new(width, height) {
                self.pixmap = pixmap;
            }
        }

        fn clear(&mut self) {
            self.pixmap.fill(Color::TRANSPARENT);
        }

        fn stroke_line(&mut self, from: Point, to: Point, color: &str, thickness: u32) {
            let paint = self.paint(color);
            let width = thickness as f32;

            if from == to {
                if let Some(dot) =
                    PathBuilder::from_circle(to.x as f32, to.y as f32, width / 2.0)
                {
                    self.pixmap.fill_path(
                        &dot,
                        &paint,
                        FillRule::Winding,
                        Transform::identity(),
                        None,
                    );
                }
                return;
            }

            let mut pb = PathBuilder::new();
            pb.move_to(from.x as f32, from.y as f32);
            pb.line_to(to.x as f32, to.y as f32);
            let Some(path) = pb.finish() else {
                return;
            };

            let stroke = Stroke {
                width,
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..Stroke::default()
            };
            self.pixmap
                .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }

        fn download(&self, filename: &str) -> Result<(), ClientError> {
            let png = self.encode_png()?;
            fs::write(Path::new(filename), png)?;
            log::info!("Saved whiteboard to {}", filename);
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn zero_size_is_rejected() {
            assert!(matches!(
                PixmapSurface::new(0, 10),
                Err(ClientError::InvalidSize { width: 0, height: 10 })
            ));
        }

        #[test]
        fn stroke_colors_the_line() {
            let mut surface = PixmapSurface::new(50, 50).unwrap();
            surface.stroke_line(Point::new(5.0, 25.0), Point::new(45.0, 25.0), "#ff0000", 6);

            assert_eq!(surface.pixel(25, 25), Some([255, 0, 0, 255]));
            assert_eq!(surface.pixel(25, 5), Some([0, 0, 0, 0]));
        }

        #[test]
        fn degenerate_segment_draws_a_dot() {
            let mut surface = PixmapSurface::new(40, 40).unwrap();
            surface.stroke_line(Point::new(20.0, 20.0), Point::new(20.0, 20.0), "blue", 10);

            assert_eq!(surface.pixel(20, 20), Some([0, 0, 255, 255]));
            assert_eq!(surface.pixel(23, 20), Some([0, 0, 255, 255]));
            assert_eq!(surface.pixel(30, 20), Some([0, 0, 0, 0]));
        }

        #[test]
        fn invalid_color_keeps_previous_one() {
            let mut surface = PixmapSurface::new(40, 40).unwrap();
            surface.stroke_line(Point::new(5.0, 10.0), Point::new(35.0, 10.0), "lime", 4);
            surface.stroke_line(Point::new(5.0, 30.0), Point::new(35.0, 30.0), "not-a-color", 4);

            assert_eq!(surface.pixel(20, 30), Some([0, 255, 0, 255]));
        }

        #[test]
        fn resize_reallocates_and_clears() {
            let mut surface = PixmapSurface::new(20, 20).unwrap();
            surface.stroke_line(Point::new(0.0, 0.0), Point::new(20.0, 20.0), "black", 4);
            surface.resize(30, 10);

            assert_eq!(surface.size(), (30, 10));
            assert!(surface.pixmap().data().iter().all(|b| *b == 0));

            surface.resize(0, 0);
            assert_eq!(surface.size(), (1, 1));
        }
    }
}

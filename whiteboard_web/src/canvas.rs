use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlAnchorElement, HtmlCanvasElement};
use whiteboard_client::{ClientError, Point, Surface};

/// A `<canvas>` element and its 2d context.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, ClientError> {
        let context = canvas
            .get_context("2d")
            .map_err(platform)?
            .ok_or_else(|| ClientError::Platform("canvas has no 2d context".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(platform)?;
        Ok(Self { canvas, context })
    }
}

fn platform(value: impl Into<JsValue>) -> ClientError {
    ClientError::Platform(format!("{:?}", value.into()))
}

impl Surface for CanvasSurface {
    fn size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn layout_size(&self) -> (u32, u32) {
        (
            self.canvas.offset_width().max(1) as u32,
            self.canvas.offset_height().max(1) as u32,
        )
    }

    fn origin(&self) -> Point {
        let rect = self.canvas.get_bounding_client_rect();
        Point::new(rect.left(), rect.top())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn clear(&mut self) {
        let (width, height) = self.size();
        self.context
            .clear_rect(0.0, 0.0, width as f64, height as f64);
    }

    fn stroke_line(&mut self, from: Point, to: Point, color: &str, thickness: u32) {
        let context = &self.context;
        context.begin_path();
        context.move_to(from.x, from.y);
        context.line_to(to.x, to.y);
        context.set_line_cap("round");
        context.set_line_join("round");
        context.set_line_width(thickness as f64);
        // An unparsable color leaves the previous stroke style in place.
        context.set_stroke_style_str(color);
        context.stroke();
    }

    fn download(&self, filename: &str) -> Result<(), ClientError> {
        let href = self.canvas.to_data_url().map_err(platform)?;
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| ClientError::Platform("no document".into()))?;
        let link = document
            .create_element("a")
            .map_err(platform)?
            .dyn_into::<HtmlAnchorElement>()
            .map_err(platform)?;
        link.set_download(filename);
        link.set_href(&href);
        link.click();
        Ok(())
    }
}

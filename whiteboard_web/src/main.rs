// The prelude brings all the essential Dioxus items into scope.
use dioxus::html::input_data::MouseButton;
use dioxus::prelude::*;
use futures_util::{SinkExt, StreamExt};
use gloo_net::websocket::{futures::WebSocket, Message as GlooWsMessage};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::HtmlCanvasElement;
use whiteboard_client::{
    ConnectionInfo, PointerEvent, Transport, WidgetOptions, Whiteboard, WsMessage, DEFAULT_COLOR,
    DEFAULT_THICKNESS,
};

mod canvas;

use canvas::CanvasSurface;

const THICKNESS_STEP: i32 = 2;
const DOWNLOAD_NAME: &str = "whiteboard.png";

/// Hands outgoing messages to the relay coroutine.
#[derive(Clone, Copy)]
struct CoroutineTransport(Coroutine<WsMessage>);

impl Transport for CoroutineTransport {
    fn send(&mut self, message: WsMessage) {
        self.0.send(message);
    }
}

type Board = Whiteboard<CanvasSurface, CoroutineTransport>;

// `/ws` on the host that served the page.
fn relay_url() -> Option<String> {
    let location = web_sys::window()?.location();
    let scheme = match location.protocol().ok()?.as_str() {
        "https:" => "wss:",
        _ => "ws:",
    };
    Some(format!("{}//{}/ws", scheme, location.host().ok()?))
}

fn pointer(evt: &MouseEvent) -> PointerEvent {
    let client = evt.client_coordinates();
    PointerEvent::new(
        client.x,
        client.y,
        evt.held_buttons().contains(MouseButton::Primary),
    )
}

#[allow(non_snake_case)]
fn App() -> Element {
    // Created once the canvas is mounted.
    let mut board = use_signal::<Option<Board>>(|| None);
    // A greeting that arrived before the canvas was mounted.
    let mut welcome = use_signal::<Option<ConnectionInfo>>(|| None);

    let relay = use_coroutine(move |mut rx: UnboundedReceiver<WsMessage>| async move {
        let Some(ws_url) = relay_url() else {
            log::error!("Could not work out the relay address.");
            return;
        };
        let ws = match WebSocket::open(&ws_url) {
            Ok(ws) => ws,
            Err(e) => {
                log::error!("Failed to connect to WebSocket: {:?}", e);
                return;
            }
        };

        let (mut write, mut read) = ws.split();

        // Incoming messages
        spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(GlooWsMessage::Text(text)) => match WsMessage::from_text(&text) {
                        Ok(message) => match (board.write().as_mut(), message) {
                            (Some(board), message) => board.on_remote(message),
                            (None, WsMessage::Connected(info)) => welcome.set(Some(info)),
                            (None, _) => {}
                        },
                        Err(e) => log::debug!("Ignoring malformed frame: {}", e),
                    },
                    Ok(GlooWsMessage::Bytes(_)) => {}
                    Err(e) => {
                        log::error!("WebSocket error: {:?}", e);
                        break;
                    }
                }
            }
        });

        // Outgoing messages
        while let Some(message) = rx.next().await {
            let text = match message.to_text() {
                Ok(text) => text,
                Err(e) => {
                    log::error!("Failed to encode {:?}: {}", message, e);
                    continue;
                }
            };
            if write.send(GlooWsMessage::Text(text)).await.is_err() {
                log::error!("WebSocket connection closed. Cannot send message.");
                break;
            }
        }
    });

    // Keep the backing store in step with the displayed size of the canvas.
    use_hook(move || {
        let on_resize = Closure::<dyn FnMut()>::new(move || {
            if let Some(board) = board.write().as_mut() {
                board.resize();
            }
        });
        if let Some(window) = web_sys::window() {
            if let Err(e) =
                window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())
            {
                log::error!("Could not listen for resize: {:?}", e);
            }
        }
        // The listener lives as long as the page.
        on_resize.forget();
    });

    let thickness = board
        .read()
        .as_ref()
        .map(|board| board.thickness())
        .unwrap_or(DEFAULT_THICKNESS);
    let color = board
        .read()
        .as_ref()
        .map(|board| board.color().to_string())
        .unwrap_or_else(|| DEFAULT_COLOR.to_string());

    rsx! {
        main {
            class: "whiteboard",
            div {
                class: "toolbar",
                button {
                    onclick: move |_| {
                        if let Some(board) = board.write().as_mut() {
                            board.decrease_thickness(THICKNESS_STEP);
                        }
                    },
                    "−"
                }
                span { class: "thickness", "{thickness}px" }
                button {
                    onclick: move |_| {
                        if let Some(board) = board.write().as_mut() {
                            board.increase_thickness(THICKNESS_STEP);
                        }
                    },
                    "+"
                }
                input {
                    r#type: "color",
                    value: "{color}",
                    oninput: move |evt| {
                        if let Some(board) = board.write().as_mut() {
                            board.set_color(evt.value());
                        }
                    },
                }
                button {
                    onclick: move |_| {
                        if let Some(board) = board.read().as_ref() {
                            if let Err(e) = board.download(DOWNLOAD_NAME) {
                                log::error!("Download failed: {}", e);
                            }
                        }
                    },
                    "Download"
                }
            }
            canvas {
                id: "whiteboard",
                onmounted: move |evt| {
                    let Some(element) = evt.data().downcast::<web_sys::Element>().cloned() else {
                        log::error!("Mounted canvas is not a DOM element.");
                        return;
                    };
                    let Ok(canvas) = element.dyn_into::<HtmlCanvasElement>() else {
                        log::error!("Mounted element is not a canvas.");
                        return;
                    };
                    match CanvasSurface::new(canvas) {
                        Ok(surface) => {
                            let mut whiteboard = Whiteboard::new(
                                surface,
                                CoroutineTransport(relay),
                                WidgetOptions::default(),
                            );
                            // Echoing relays switch the widget to echo mode.
                            if let Some(info) = welcome.take() {
                                whiteboard.on_remote(WsMessage::Connected(info));
                            }
                            board.set(Some(whiteboard));
                        }
                        Err(e) => log::error!("Could not set up the canvas: {}", e),
                    }
                },
                onmousedown: move |_| {
                    if let Some(board) = board.write().as_mut() {
                        board.on_pointer_down();
                    }
                },
                onmousemove: move |evt| {
                    if let Some(board) = board.write().as_mut() {
                        board.on_pointer_move(pointer(&evt));
                    }
                },
                onclick: move |evt| {
                    if let Some(board) = board.write().as_mut() {
                        board.on_click(pointer(&evt));
                    }
                },
            }
        }
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    launch(App);
}

use crate::shared_types::WsMessage;
use tokio::sync::mpsc::UnboundedSender;

/// Outbound half of the connection to the relay.
///
/// Delivery is fire-and-forget: a lost message shows up as a gap in the
/// stroke, never as an error at the widget level.
pub trait Transport {
    fn send(&mut self, message: WsMessage);
}

/// Discards everything. Used by receive-only boards.
impl Transport for () {
    fn send(&mut self, _message: WsMessage) {}
}

/// Records every message in order.
impl Transport for Vec<WsMessage> {
    fn send(&mut self, message: WsMessage) {
        self.push(message);
    }
}

impl Transport for UnboundedSender<WsMessage> {
    fn send(&mut self, message: WsMessage) {
        if UnboundedSender::send(self, message).is_err() {
            log::warn!("Socket writer has gone away. Dropping message.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn channel_transport_forwards_in_order() {
        let (mut tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        Transport::send(&mut tx, WsMessage::DrawBeginPath);
        Transport::send(
            &mut tx,
            WsMessage::Connected(crate::shared_types::ConnectionInfo {
                id: "a".into(),
                echoes: false,
            }),
        );
        drop(tx);

        assert_eq!(rx.recv().await, Some(WsMessage::DrawBeginPath));
        assert!(matches!(rx.recv().await, Some(WsMessage::Connected(_))));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn closed_channel_does_not_panic() {
        let (mut tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        Transport::send(&mut tx, WsMessage::DrawBeginPath);
    }
}

//! WebSocket transport adapter.
//!
//! Charge points dial `ws://host:port/<station-id>` with the `ocpp1.6`
//! subprotocol; the central system accepts raw TCP streams and completes
//! the handshake, returning the path segment as an opaque session label.
//! Ping/pong and binary frames are handled below this layer and never
//! reach the engine.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request, Response,
};
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{accept_hdr_async, connect_async, MaybeTlsStream, WebSocketStream};

use sv_types::TransportError;

use super::{MessageSink, MessageStream, Transport};

/// Protocol version tag exchanged during the handshake.
pub const SUBPROTOCOL: &str = "ocpp1.6";

/// A WebSocket connection as an engine transport.
pub struct WsTransport<S> {
    inner: WebSocketStream<S>,
}

/// Write half of a [`WsTransport`].
pub struct WsSink<S>(SplitSink<WebSocketStream<S>, Message>);

/// Read half of a [`WsTransport`].
pub struct WsStream<S>(SplitStream<WebSocketStream<S>>);

/// Dial the central system at `url` (e.g. `ws://localhost:9000/CHARGER-001`).
pub async fn connect(
    url: &str,
) -> Result<WsTransport<MaybeTlsStream<TcpStream>>, TransportError> {
    let mut request = url
        .into_client_request()
        .map_err(|e| TransportError::Failed(format!("bad endpoint url: {e}")))?;
    request
        .headers_mut()
        .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(SUBPROTOCOL));

    let (stream, _response) = connect_async(request)
        .await
        .map_err(|e| TransportError::Failed(format!("websocket connect: {e}")))?;
    Ok(WsTransport { inner: stream })
}

/// Complete the server-side handshake on an accepted TCP stream.
///
/// Returns the transport and the station id taken from the request path.
/// The id is an opaque session label; nothing routes on it.
pub async fn accept(stream: TcpStream) -> Result<(WsTransport<TcpStream>, String), TransportError> {
    let mut station_id = String::new();
    let callback = |request: &Request, mut response: Response| -> Result<Response, ErrorResponse> {
        station_id = request
            .uri()
            .path()
            .trim_start_matches('/')
            .to_string();
        response
            .headers_mut()
            .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(SUBPROTOCOL));
        Ok(response)
    };

    let ws = accept_hdr_async(stream, callback)
        .await
        .map_err(|e| TransportError::Failed(format!("websocket accept: {e}")))?;
    Ok((WsTransport { inner: ws }, station_id))
}

impl<S> Transport for WsTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    type Sink = WsSink<S>;
    type Stream = WsStream<S>;

    fn split(self) -> (Self::Sink, Self::Stream) {
        let (sink, stream) = self.inner.split();
        (WsSink(sink), WsStream(stream))
    }
}

#[async_trait]
impl<S> MessageSink for WsSink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.0
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| match e {
                WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::Closed,
                other => TransportError::Failed(other.to_string()),
            })
    }
}

#[async_trait]
impl<S> MessageStream for WsStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.0.next().await {
                None => return None,
                Some(Ok(Message::Text(text))) => return Some(Ok(text.as_str().to_owned())),
                Some(Ok(Message::Close(_))) => return None,
                // Ping/pong are answered by the protocol stack; binary
                // frames are not part of this protocol.
                Some(Ok(_)) => continue,
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => return None,
                Some(Err(e)) => return Some(Err(TransportError::Failed(e.to_string()))),
            }
        }
    }
}

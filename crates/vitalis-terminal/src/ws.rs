//! WebSocket [`Dialer`] over `tungstenite`.
//!
//! The handshake runs blocking with a short timeout; after that the socket is
//! switched to non-blocking so `poll_recv` can be called from the frame loop.
//! Only plain `ws://` URLs are supported.

use std::io::ErrorKind;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::{debug, warn};
use tungstenite::client::IntoClientRequest;
use tungstenite::{Error as WsError, Message, WebSocket};
use vitalis_core::{Dialer, Link, LinkPoll, TransportError};

/// Default limit for TCP connect and handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

fn dial_error(url: &str, reason: impl ToString) -> TransportError {
    TransportError::Dial {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

fn would_block(err: &WsError) -> bool {
    matches!(err, WsError::Io(e) if e.kind() == ErrorKind::WouldBlock)
}

/// Opens [`WsLink`]s.
#[derive(Debug, Clone, Copy)]
pub struct WsDialer {
    connect_timeout: Duration,
}

impl Default for WsDialer {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl WsDialer {
    /// Dialer with a connect + handshake time limit.
    #[must_use]
    pub const fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Dialer for WsDialer {
    type Link = WsLink;

    fn dial(&mut self, url: &str) -> Result<WsLink, TransportError> {
        let request = url.into_client_request().map_err(|e| dial_error(url, e))?;
        let uri = request.uri();
        if uri.scheme_str() != Some("ws") {
            return Err(dial_error(url, "only ws:// URLs are supported"));
        }
        let host = uri
            .host()
            .ok_or_else(|| dial_error(url, "missing host"))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = uri.port_u16().unwrap_or(80);

        let addr = (host.as_str(), port)
            .to_socket_addrs()
            .map_err(|e| dial_error(url, e))?
            .next()
            .ok_or_else(|| dial_error(url, "host did not resolve"))?;
        let stream =
            TcpStream::connect_timeout(&addr, self.connect_timeout).map_err(|e| dial_error(url, e))?;
        stream
            .set_read_timeout(Some(self.connect_timeout))
            .map_err(|e| dial_error(url, e))?;
        stream.set_nodelay(true).map_err(|e| dial_error(url, e))?;

        let (socket, response) =
            tungstenite::client(request, stream).map_err(|e| dial_error(url, e))?;
        socket
            .get_ref()
            .set_nonblocking(true)
            .map_err(|e| dial_error(url, e))?;
        debug!(%url, status = %response.status(), "websocket handshake complete");
        Ok(WsLink {
            socket,
            closed: false,
        })
    }
}

/// Open WebSocket connection in non-blocking mode.
#[derive(Debug)]
pub struct WsLink {
    socket: WebSocket<TcpStream>,
    closed: bool,
}

impl Link for WsLink {
    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        match self.socket.send(Message::text(text.to_owned())) {
            Ok(()) => Ok(()),
            // Queued in the write buffer; later reads flush it.
            Err(ref e) if would_block(e) => Ok(()),
            Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => {
                self.closed = true;
                Err(TransportError::Closed)
            }
            Err(e) => Err(TransportError::Send(e.to_string())),
        }
    }

    fn poll_recv(&mut self) -> LinkPoll {
        if self.closed {
            return LinkPoll::Closed;
        }
        loop {
            match self.socket.read() {
                Ok(Message::Text(text)) => return LinkPoll::Message(text.as_str().to_owned()),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return LinkPoll::Message(text),
                    Err(_) => debug!(len = bytes.len(), "dropping non-UTF-8 binary frame"),
                },
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "server closed the websocket");
                    self.closed = true;
                    return LinkPoll::Closed;
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(ref e) if would_block(e) => {
                    if let Err(e) = self.socket.flush() {
                        if !would_block(&e) {
                            debug!(error = %e, "websocket flush failed");
                        }
                    }
                    return LinkPoll::Idle;
                }
                Err(e) => {
                    warn!(error = %e, "websocket read failed");
                    self.closed = true;
                    return LinkPoll::Closed;
                }
            }
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.socket.close(None) {
            debug!(error = %e, "websocket close");
        }
        let _ = self.socket.flush();
    }
}

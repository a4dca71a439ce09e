//! Core protocol types shared by the codecs and the connection handler.
//!
//! # Components
//!
//! - **Messages** ([`message`]): what the upstream decoder yields
//!   - [`Message`]: either a response head or a piece of body
//!   - [`RelayItem`]: raw body bytes to forward, or end of body
//!   - [`TransferFraming`]: how a response body is delimited
//!
//! - **Requests and targets**
//!   - [`ProxyRequest`]: the parsed client request head
//!   - [`Target`]: the `(host, port, path)` one hop talks to
//!
//! - **Responses** ([`response`])
//!   - [`ResponseHead`]: raw upstream head plus the fields the proxy inspects
//!   - [`ErrorResponse`]: responses synthesized by the proxy (400/501/502)
//!
//! - **Errors** ([`error`])
//!   - [`ProxyError`]: top-level error of the connection handler
//!   - [`ParseError`], [`SendError`], [`ResolveError`], [`ConnectError`]

mod message;
pub use message::Message;
pub use message::RelayItem;
pub use message::TransferFraming;

mod request;
pub use request::ProxyRequest;

mod target;
pub use target::DEFAULT_HTTP_PORT;
pub use target::Target;

mod response;
pub use response::ErrorResponse;
pub use response::ResponseHead;

mod error;
pub use error::ConnectError;
pub use error::ParseError;
pub use error::ProxyError;
pub use error::ResolveError;
pub use error::SendError;

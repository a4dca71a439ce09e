//! Upstream response decoder.
//!
//! Yields the response head first, then the body as raw [`RelayItem`]s under the
//! framing the head declared, ending with [`RelayItem::Eof`]. Head and body share one
//! read buffer, so body bytes that arrived together with the head are neither lost nor
//! relayed twice.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::body::RelayDecoder;
use crate::codec::header::HeaderDecoder;
use crate::protocol::{Message, ParseError, RelayItem, ResponseHead, TransferFraming};

/// A decoder for one upstream response.
///
/// # State Machine
///
/// - `relay_decoder == None`: reading the head
/// - `relay_decoder == Some(_)`: relaying the body
///
/// After `Eof` the decoder is back to reading a head; the proxy never reads a second
/// response from the same upstream connection.
#[derive(Debug, Default)]
pub struct ResponseDecoder {
    header_decoder: HeaderDecoder,
    relay_decoder: Option<RelayDecoder>,
}

impl ResponseDecoder {
    pub fn new() -> Self {
        Default::default()
    }

    fn on_relay_item(&mut self, item: Option<RelayItem>) -> Option<Message<(ResponseHead, TransferFraming)>> {
        match item {
            Some(item @ RelayItem::Chunk(_)) => Some(Message::Payload(item)),
            Some(item @ RelayItem::Eof) => {
                self.relay_decoder.take();
                Some(Message::Payload(item))
            }
            None => None,
        }
    }

    fn on_head(&mut self, head: Option<ResponseHead>) -> Option<Message<(ResponseHead, TransferFraming)>> {
        head.map(|head| {
            let framing = head.framing();
            self.relay_decoder = Some(framing.into());
            Message::Header((head, framing))
        })
    }
}

impl Decoder for ResponseDecoder {
    type Item = Message<(ResponseHead, TransferFraming)>;
    type Error = ParseError;

    /// # Returns
    ///
    /// - `Ok(Some(Message::Header(_)))`: the head and its framing
    /// - `Ok(Some(Message::Payload(_)))`: body bytes to relay, or the end of the body
    /// - `Ok(None)`: need more data to proceed
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(relay_decoder) = &mut self.relay_decoder {
            let item = relay_decoder.decode(src)?;
            return Ok(self.on_relay_item(item));
        }

        let head = self.header_decoder.decode(src)?;
        Ok(self.on_head(head))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(relay_decoder) = &mut self.relay_decoder {
            let item = relay_decoder.decode_eof(src)?;
            return Ok(self.on_relay_item(item));
        }

        let head = self.header_decoder.decode_eof(src)?;
        Ok(self.on_head(head))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn header(message: Message<(ResponseHead, TransferFraming)>) -> (ResponseHead, TransferFraming) {
        match message {
            Message::Header(header) => header,
            Message::Payload(item) => panic!("expected head, got {item:?}"),
        }
    }

    fn payload(message: Message<(ResponseHead, TransferFraming)>) -> RelayItem {
        match message {
            Message::Payload(item) => item,
            Message::Header((head, _)) => panic!("expected body, got head {:?}", head.status_line()),
        }
    }

    #[test]
    fn length_body() {
        let mut buffer = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Length: 11\r\n\r\nhello worldEXTRA"[..]);
        let mut decoder = ResponseDecoder::new();

        let (head, framing) = header(decoder.decode(&mut buffer).unwrap().unwrap());
        assert_eq!(head.status_line(), "HTTP/1.1 200 OK");
        assert_eq!(framing, TransferFraming::Length(11));

        let body = payload(decoder.decode(&mut buffer).unwrap().unwrap());
        assert_eq!(body, RelayItem::Chunk(Bytes::from_static(b"hello world")));
        assert!(payload(decoder.decode(&mut buffer).unwrap().unwrap()).is_eof());

        assert_eq!(&buffer[..], b"EXTRA");
    }

    #[test]
    fn chunked_body_is_passed_through() {
        let mut buffer = BytesMut::from(&b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\ntest\r\n0\r\n\r\n"[..]);
        let mut decoder = ResponseDecoder::new();

        let (_, framing) = header(decoder.decode(&mut buffer).unwrap().unwrap());
        assert!(framing.is_chunked());

        let mut relayed = Vec::new();
        loop {
            match payload(decoder.decode(&mut buffer).unwrap().unwrap()) {
                RelayItem::Chunk(bytes) => relayed.extend_from_slice(&bytes),
                RelayItem::Eof => break,
            }
        }
        assert_eq!(relayed, b"4\r\ntest\r\n0\r\n\r\n");
    }

    #[test]
    fn close_delimited_body() {
        let mut buffer = BytesMut::from(&b"HTTP/1.0 200 OK\r\nServer: x\r\n\r\nuntil close"[..]);
        let mut decoder = ResponseDecoder::new();

        let (_, framing) = header(decoder.decode(&mut buffer).unwrap().unwrap());
        assert!(framing.is_close_delimited());

        assert_eq!(payload(decoder.decode(&mut buffer).unwrap().unwrap()), RelayItem::Chunk(Bytes::from_static(b"until close")));
        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        assert!(payload(decoder.decode_eof(&mut buffer).unwrap().unwrap()).is_eof());
    }

    #[test]
    fn empty_upstream() {
        let mut buffer = BytesMut::new();
        assert!(matches!(ResponseDecoder::new().decode_eof(&mut buffer), Err(ParseError::EmptyResponse)));
    }
}

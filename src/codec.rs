use std::io;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

use crate::core::{message::Message, traits::Wire};

/// Frames [`Message`]s on a byte stream, each behind a length prefix.
pub struct MessageCodec {
    codec: LengthDelimitedCodec,
}

impl MessageCodec {
    pub fn new() -> Self {
        Self {
            codec: LengthDelimitedCodec::new(),
        }
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let bytes = match self.codec.decode(src)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        match Message::decode(&bytes) {
            Ok((message, rest)) if rest.is_empty() => Ok(Some(message)),
            Ok((_, rest)) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} trailing byte(s) after message", rest.len()),
            )),
            Err(e) => Err(io::Error::new(io::ErrorKind::InvalidData, e)),
        }
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = io::Error;

    fn encode(&mut self, message: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.codec.encode(message.to_bytes().freeze(), dst)
    }
}

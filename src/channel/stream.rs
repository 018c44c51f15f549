use std::{
    io::{self, BufRead, BufReader, Write},
    net::TcpStream,
};

use tracing::trace;

use super::{Channel, ChannelError};
use crate::codec::MalformedPacket;

/// Line channel over a byte stream: a TCP connection, a pipe, or stdio.
pub struct StreamChannel<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> StreamChannel<R, W>
where
    R: BufRead,
    W: Write,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl StreamChannel<BufReader<TcpStream>, TcpStream> {
    pub fn tcp(stream: TcpStream) -> io::Result<Self> {
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self::new(reader, stream))
    }
}

impl<R, W> Channel for StreamChannel<R, W>
where
    R: BufRead,
    W: Write,
{
    fn send(&mut self, record: &str) -> Result<(), ChannelError> {
        if record.contains(['\n', '\r']) {
            return Err(ChannelError::EmbeddedNewline);
        }
        trace!(len = record.len(), "sending record");
        self.writer.write_all(record.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<String>, ChannelError> {
        let mut bytes = Vec::new();
        if self.reader.read_until(b'\n', &mut bytes)? == 0 {
            return Ok(None);
        }
        while matches!(bytes.last(), Some(b'\n' | b'\r')) {
            bytes.pop();
        }
        if !bytes.is_ascii() {
            return Err(ChannelError::Garbled(MalformedPacket::NonAscii));
        }
        let line = String::from_utf8(bytes)
            .map_err(|_| ChannelError::Garbled(MalformedPacket::NonAscii))?;
        trace!(len = line.len(), "received record");
        Ok(Some(line))
    }
}

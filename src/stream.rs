use crate::error::{Result, SkySettleError};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::{trace, warn};

/// Reads a streamed response body and accumulates it as text.
///
/// Chunk boundaries are arbitrary: a UTF-8 sequence cut in half by the network
/// is held back until the rest of it arrives.
#[derive(Debug, Default)]
pub struct StreamConsumer {
    buffer: String,
    pending: Vec<u8>,
    chunks: usize,
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything decoded so far, in arrival order
    pub fn accumulated(&self) -> &str {
        &self.buffer
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Decode one segment and append it. Returns true if any text was appended.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> bool {
        self.chunks += 1;
        self.pending.extend_from_slice(bytes);
        let decoded = self.decode_pending();
        if decoded.is_empty() {
            return false;
        }
        self.buffer.push_str(&decoded);
        true
    }

    /// Flush bytes left over from an incomplete sequence at end of stream.
    pub fn finish(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        warn!(
            "Stream ended inside a UTF-8 sequence ({} dangling bytes)",
            self.pending.len()
        );
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        self.buffer.push_str(&rest);
        true
    }

    fn decode_pending(&mut self) -> String {
        let mut decoded = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    decoded.push_str(text);
                    self.pending.clear();
                    return decoded;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    decoded.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match err.error_len() {
                        Some(invalid) => {
                            decoded.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + invalid);
                        }
                        None => {
                            // Incomplete sequence at the end, wait for more bytes
                            self.pending.drain(..valid);
                            return decoded;
                        }
                    }
                }
            }
        }
    }

    /// Read `stream` to the end, calling `on_update` with the accumulated text
    /// after every append.
    ///
    /// A read error stops the loop and is returned once. The buffer keeps
    /// whatever arrived before the failure.
    pub async fn consume<S, F>(&mut self, mut stream: S, mut on_update: F) -> Result<()>
    where
        S: Stream<Item = Result<Bytes>> + Unpin,
        F: FnMut(&str),
    {
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    warn!(
                        "Stream read failed after {} bytes of text: {}",
                        self.buffer.len(),
                        err
                    );
                    return Err(match err {
                        network @ SkySettleError::Network(_) => network,
                        other => SkySettleError::Network(other.to_string()),
                    });
                }
            };

            trace!("Received chunk of {} bytes", chunk.len());
            if self.push_bytes(&chunk) {
                on_update(&self.buffer);
            }
        }

        if self.finish() {
            on_update(&self.buffer);
        }

        Ok(())
    }
}

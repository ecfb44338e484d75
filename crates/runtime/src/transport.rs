//! Stdio pipe transport for the driver protocol.
//!
//! Frames are a 4-byte little-endian length prefix followed by a JSON
//! body, matching the framing used by the official Playwright language
//! bindings.

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Bidirectional framed transport over a pair of byte streams.
///
/// Generic over the stream types so tests can drive it with in-memory
/// duplex pipes; production code uses the driver child's stdin/stdout.
pub struct PipeTransport<W, R> {
    sender: PipeSender<W>,
    receiver: PipeReceiver<R>,
}

impl<W, R> PipeTransport<W, R>
where
    W: AsyncWrite + Unpin + Send + 'static,
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Create a transport over the given streams.
    ///
    /// Returns the transport plus the channel on which inbound messages
    /// will be delivered once the receiver is running.
    pub fn new(writer: W, reader: R) -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                sender: PipeSender { writer },
                receiver: PipeReceiver { reader, tx },
            },
            rx,
        )
    }

    /// Split into the sender and receiver halves.
    pub fn into_parts(self) -> (PipeSender<W>, PipeReceiver<R>) {
        (self.sender, self.receiver)
    }
}

/// Writing half of the transport.
pub struct PipeSender<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> PipeSender<W> {
    /// Serialize and write one framed message.
    pub async fn send(&mut self, message: Value) -> Result<()> {
        let body = serde_json::to_vec(&message)?;
        let length = u32::try_from(body.len())
            .map_err(|_| Error::Transport("message exceeds u32 frame length".to_string()))?;

        self.writer.write_all(&length.to_le_bytes()).await?;
        self.writer.write_all(&body).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// Reading half of the transport.
pub struct PipeReceiver<R> {
    reader: R,
    tx: mpsc::UnboundedSender<Value>,
}

impl<R: AsyncRead + Unpin> PipeReceiver<R> {
    /// Read frames until EOF or the message channel closes.
    pub async fn run(mut self) -> Result<()> {
        loop {
            let mut len_buf = [0u8; 4];
            match self.reader.read_exact(&mut len_buf).await {
                Ok(_) => {}
                // EOF between frames is a normal shutdown
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(e.into()),
            }
            let length = u32::from_le_bytes(len_buf) as usize;

            let mut body = vec![0u8; length];
            self.reader.read_exact(&mut body).await?;

            let message: Value = serde_json::from_slice(&body)?;
            if self.tx.send(message).is_err() {
                // Consumer hung up; stop reading.
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_prefix_is_little_endian() {
        let length: u32 = 1234;
        let bytes = length.to_le_bytes();

        assert_eq!(bytes[0], (length & 0xFF) as u8);
        assert_eq!(bytes[1], ((length >> 8) & 0xFF) as u8);
        assert_eq!(u32::from_le_bytes(bytes), length);
    }

    #[tokio::test]
    async fn send_writes_framed_message() {
        let (mut our_end, their_end) = tokio::io::duplex(1024);
        let (_unused_read, unused_write) = tokio::io::duplex(1024);
        let (transport, _rx) = PipeTransport::new(their_end, unused_write);
        let (mut sender, _receiver) = transport.into_parts();

        let message = serde_json::json!({
            "id": 1,
            "method": "test",
            "params": {"foo": "bar"}
        });
        sender.send(message.clone()).await.unwrap();

        let mut len_buf = [0u8; 4];
        our_end.read_exact(&mut len_buf).await.unwrap();
        let length = u32::from_le_bytes(len_buf) as usize;

        let mut body = vec![0u8; length];
        our_end.read_exact(&mut body).await.unwrap();

        let received: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(received, message);
    }

    #[tokio::test]
    async fn receiver_delivers_messages_in_order() {
        let (unused_read, _unused_write) = tokio::io::duplex(4096);
        let (mut our_end, their_end) = tokio::io::duplex(4096);
        let (transport, mut rx) = PipeTransport::new(unused_read, their_end);
        let (_sender, receiver) = transport.into_parts();

        let read_task = tokio::spawn(receiver.run());

        let messages = vec![
            serde_json::json!({"id": 1, "method": "first"}),
            serde_json::json!({"id": 2, "method": "second"}),
            serde_json::json!({"id": 3, "method": "third"}),
        ];
        for msg in &messages {
            let body = serde_json::to_vec(msg).unwrap();
            our_end
                .write_all(&(body.len() as u32).to_le_bytes())
                .await
                .unwrap();
            our_end.write_all(&body).await.unwrap();
        }
        our_end.flush().await.unwrap();

        for expected in &messages {
            let received = rx.recv().await.unwrap();
            assert_eq!(&received, expected);
        }

        drop(our_end);
        read_task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn receiver_handles_large_message() {
        let (unused_read, _unused_write) = tokio::io::duplex(1024 * 1024);
        let (mut our_end, their_end) = tokio::io::duplex(1024 * 1024);
        let (transport, mut rx) = PipeTransport::new(unused_read, their_end);
        let (_sender, receiver) = transport.into_parts();

        let read_task = tokio::spawn(receiver.run());

        let payload = "x".repeat(256 * 1024);
        let msg = serde_json::json!({"id": 1, "data": payload});
        let body = serde_json::to_vec(&msg).unwrap();
        our_end
            .write_all(&(body.len() as u32).to_le_bytes())
            .await
            .unwrap();
        our_end.write_all(&body).await.unwrap();
        our_end.flush().await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received, msg);

        drop(our_end);
        read_task.await.unwrap().unwrap();
    }
}

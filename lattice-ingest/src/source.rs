//! Record sources: the stream-client seam.
//!
//! The broker itself is an external collaborator; the loop only depends on
//! [`RecordSource`], a bounded-wait pull returning one [`Delivery`] status
//! per call. [`ChannelSource`] serves tests and in-process embedding;
//! [`ReplaySource`] bridges length-prefixed frames from any async reader
//! (the daemon wires stdin or a file). A broker client slots in as one more
//! implementation.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::mpsc;

/// Frames larger than this are treated as stream corruption.
const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Outcome of one bounded poll against the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A payload arrived.
    Record(Vec<u8>),
    /// The bounded wait elapsed with no payload.
    Timeout,
    /// The partition has no further records (informational).
    EndOfPartition,
    /// The stream reported a delivery failure.
    Failed(String),
}

/// A stream of opaque byte payloads with bounded-wait pulls.
#[async_trait]
pub trait RecordSource: Send {
    /// Pull the next payload, waiting at most `timeout`.
    async fn poll(&mut self, timeout: Duration) -> Delivery;
}

/// In-process source backed by a tokio mpsc channel.
///
/// A closed channel reads as end-of-partition.
pub struct ChannelSource {
    rx: mpsc::Receiver<Vec<u8>>,
}

/// Create a channel-backed source and the sender feeding it.
pub fn channel(buffer: usize) -> (mpsc::Sender<Vec<u8>>, ChannelSource) {
    let (tx, rx) = mpsc::channel(buffer);
    (tx, ChannelSource { rx })
}

#[async_trait]
impl RecordSource for ChannelSource {
    async fn poll(&mut self, timeout: Duration) -> Delivery {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(payload)) => Delivery::Record(payload),
            Ok(None) => Delivery::EndOfPartition,
            Err(_) => Delivery::Timeout,
        }
    }
}

/// Source replaying length-prefixed frames (u32 big-endian length, then the
/// payload bytes) from an async reader.
///
/// A background task owns the reader so a poll timeout can never cancel a
/// read mid-frame; frames are handed over through a channel.
pub struct ReplaySource {
    rx: mpsc::Receiver<Result<Vec<u8>, String>>,
}

impl ReplaySource {
    /// Spawn the reader task and return the source.
    pub fn spawn<R>(reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            loop {
                let frame = match read_frame(&mut reader).await {
                    Ok(Some(frame)) => Ok(frame),
                    Ok(None) => break,
                    Err(reason) => Err(reason),
                };
                let failed = frame.is_err();
                if tx.send(frame).await.is_err() || failed {
                    break;
                }
            }
        });
        Self { rx }
    }
}

/// Read one frame; `Ok(None)` on clean end-of-stream.
async fn read_frame<R>(reader: &mut BufReader<R>) -> Result<Option<Vec<u8>>, String>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(format!("frame header read failed: {}", e)),
    }

    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(format!("frame length {} exceeds limit", len));
    }

    let mut payload = vec![0u8; len as usize];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| format!("frame body read failed: {}", e))?;
    Ok(Some(payload))
}

#[async_trait]
impl RecordSource for ReplaySource {
    async fn poll(&mut self, timeout: Duration) -> Delivery {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(Ok(payload))) => Delivery::Record(payload),
            Ok(Some(Err(reason))) => Delivery::Failed(reason),
            Ok(None) => Delivery::EndOfPartition,
            Err(_) => Delivery::Timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLL: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_channel_source_delivers_in_order() {
        let (tx, mut source) = channel(8);
        tx.send(vec![1]).await.unwrap();
        tx.send(vec![2]).await.unwrap();

        assert_eq!(source.poll(POLL).await, Delivery::Record(vec![1]));
        assert_eq!(source.poll(POLL).await, Delivery::Record(vec![2]));
    }

    #[tokio::test]
    async fn test_channel_source_times_out_when_empty() {
        let (_tx, mut source) = channel(8);
        assert_eq!(source.poll(Duration::from_millis(10)).await, Delivery::Timeout);
    }

    #[tokio::test]
    async fn test_closed_channel_is_end_of_partition() {
        let (tx, mut source) = channel(8);
        drop(tx);
        assert_eq!(source.poll(POLL).await, Delivery::EndOfPartition);
    }

    fn framed(payloads: &[&[u8]]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for payload in payloads {
            bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            bytes.extend_from_slice(payload);
        }
        bytes
    }

    #[tokio::test]
    async fn test_replay_source_reads_frames_then_eof() {
        let bytes = framed(&[b"one", b"two"]);
        let mut source = ReplaySource::spawn(std::io::Cursor::new(bytes));

        assert_eq!(source.poll(POLL).await, Delivery::Record(b"one".to_vec()));
        assert_eq!(source.poll(POLL).await, Delivery::Record(b"two".to_vec()));
        assert_eq!(source.poll(POLL).await, Delivery::EndOfPartition);
        assert_eq!(source.poll(POLL).await, Delivery::EndOfPartition);
    }

    #[tokio::test]
    async fn test_replay_source_reports_truncated_frame() {
        let mut bytes = framed(&[b"complete"]);
        bytes.extend_from_slice(&8u32.to_be_bytes());
        bytes.extend_from_slice(b"shor"); // body cut off mid-frame

        let mut source = ReplaySource::spawn(std::io::Cursor::new(bytes));
        assert_eq!(source.poll(POLL).await, Delivery::Record(b"complete".to_vec()));
        assert!(matches!(source.poll(POLL).await, Delivery::Failed(_)));
    }

    #[tokio::test]
    async fn test_replay_source_rejects_oversized_frame() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(MAX_FRAME_LEN + 1).to_be_bytes());

        let mut source = ReplaySource::spawn(std::io::Cursor::new(bytes));
        assert!(matches!(source.poll(POLL).await, Delivery::Failed(_)));
    }
}

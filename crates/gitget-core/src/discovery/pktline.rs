//! Git pkt-line framing.
//!
//! Each packet is 4 hex digits of length (including the prefix) followed by
//! the payload. Special values: "0000" (flush), "0001" (delimiter),
//! "0002" (response-end).

use tokio::io::{AsyncRead, AsyncReadExt};

/// Flush packet (marks end of message)
pub const FLUSH_PKT: &[u8] = b"0000";

/// Maximum pkt-line size (65516 bytes payload + 4 length)
pub const MAX_PKT_LINE: usize = 65520;

/// Encode one pkt-line.
#[must_use]
pub fn pkt_line(data: &[u8]) -> Vec<u8> {
    let len = data.len().saturating_add(4);
    let mut pkt = format!("{len:04x}").into_bytes();
    pkt.extend_from_slice(data);
    pkt
}

/// A decoded pkt-line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PktLine {
    /// `0000`
    Flush,
    /// `0001`
    Delimiter,
    /// `0002`
    ResponseEnd,
    /// Payload bytes.
    Data(Vec<u8>),
}

/// Framing error.
#[derive(Debug, thiserror::Error)]
pub enum PktLineError {
    /// Length prefix is not 4 hex digits, or is below 4.
    #[error("invalid pkt-line length {0:?}")]
    InvalidLength(String),

    /// Length exceeds [`MAX_PKT_LINE`].
    #[error("pkt-line too large: {0} bytes")]
    TooLarge(usize),

    /// Stream ended inside a length prefix or payload.
    #[error("stream ended inside a pkt-line")]
    Truncated,

    /// Read failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reads pkt-lines from any async byte stream.
///
/// Works the same over an HTTP body held in memory (`&[u8]`), a child
/// process stdout, or a TCP socket.
pub struct PktLineReader<R> {
    inner: R,
}

impl<R: AsyncRead + Unpin> PktLineReader<R> {
    /// Wrap a byte stream.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Read the next pkt-line, or `None` at a clean end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed length prefixes, oversized packets,
    /// truncated payloads, or I/O failure.
    pub async fn read(&mut self) -> Result<Option<PktLine>, PktLineError> {
        let mut len_hex = [0u8; 4];
        let mut filled = 0;
        while filled < len_hex.len() {
            let n = self.inner.read(&mut len_hex[filled..]).await?;
            if n == 0 {
                // Only an end of stream on a packet boundary is clean.
                return if filled == 0 {
                    Ok(None)
                } else {
                    Err(PktLineError::Truncated)
                };
            }
            filled = filled.saturating_add(n);
        }

        let len_str = std::str::from_utf8(&len_hex)
            .map_err(|_| PktLineError::InvalidLength(String::from_utf8_lossy(&len_hex).into()))?;

        match len_str {
            "0000" => return Ok(Some(PktLine::Flush)),
            "0001" => return Ok(Some(PktLine::Delimiter)),
            "0002" => return Ok(Some(PktLine::ResponseEnd)),
            _ => {},
        }

        let len = usize::from_str_radix(len_str, 16)
            .map_err(|_| PktLineError::InvalidLength(len_str.to_owned()))?;
        if len < 4 {
            return Err(PktLineError::InvalidLength(len_str.to_owned()));
        }
        if len > MAX_PKT_LINE {
            return Err(PktLineError::TooLarge(len));
        }

        let mut payload = vec![0u8; len.saturating_sub(4)];
        self.inner.read_exact(&mut payload).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                PktLineError::Truncated
            } else {
                PktLineError::Io(e)
            }
        })?;

        Ok(Some(PktLine::Data(payload)))
    }

    /// Read data packets up to the next flush (or end of stream).
    ///
    /// # Errors
    ///
    /// Propagates framing errors from [`read`](Self::read).
    pub async fn read_until_flush(&mut self) -> Result<Vec<Vec<u8>>, PktLineError> {
        let mut lines = Vec::new();
        loop {
            match self.read().await? {
                Some(PktLine::Flush | PktLine::ResponseEnd) | None => break,
                Some(PktLine::Data(data)) => lines.push(data),
                Some(PktLine::Delimiter) => {},
            }
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pkt_line() {
        assert_eq!(pkt_line(b"hello"), b"0009hello");
        assert_eq!(pkt_line(b"hello\n"), b"000ahello\n");
    }

    #[tokio::test]
    async fn test_reader() {
        let data: &[u8] = b"0009hello0006ab00010000";
        let mut reader = PktLineReader::new(data);

        assert_eq!(
            reader.read().await.unwrap(),
            Some(PktLine::Data(b"hello".to_vec()))
        );
        assert_eq!(
            reader.read().await.unwrap(),
            Some(PktLine::Data(b"ab".to_vec()))
        );
        assert_eq!(reader.read().await.unwrap(), Some(PktLine::Delimiter));
        assert_eq!(reader.read().await.unwrap(), Some(PktLine::Flush));
        assert_eq!(reader.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_until_flush() {
        let data: &[u8] = b"0009hello0006ab0000000aafter\n";
        let mut reader = PktLineReader::new(data);
        let lines = reader.read_until_flush().await.unwrap();
        assert_eq!(lines, vec![b"hello".to_vec(), b"ab".to_vec()]);
        assert_eq!(
            reader.read().await.unwrap(),
            Some(PktLine::Data(b"after\n".to_vec()))
        );
    }

    #[tokio::test]
    async fn test_truncated() {
        let data: &[u8] = b"0010short";
        let mut reader = PktLineReader::new(data);
        assert!(matches!(
            reader.read().await,
            Err(PktLineError::Truncated)
        ));
    }

    #[tokio::test]
    async fn test_truncated_length_prefix() {
        for data in [&b"0"[..], b"00", b"000"] {
            let mut reader = PktLineReader::new(data);
            assert!(matches!(reader.read().await, Err(PktLineError::Truncated)));
        }

        let data: &[u8] = b"0008abcd00";
        let mut reader = PktLineReader::new(data);
        assert!(matches!(
            reader.read().await,
            Ok(Some(PktLine::Data(d))) if d == b"abcd"
        ));
        assert!(matches!(reader.read().await, Err(PktLineError::Truncated)));

        let data: &[u8] = b"";
        let mut reader = PktLineReader::new(data);
        assert!(matches!(reader.read().await, Ok(None)));
    }

    #[tokio::test]
    async fn test_invalid_length() {
        let data: &[u8] = b"zz12";
        let mut reader = PktLineReader::new(data);
        assert!(matches!(
            reader.read().await,
            Err(PktLineError::InvalidLength(_))
        ));

        let data: &[u8] = b"0003";
        let mut reader = PktLineReader::new(data);
        assert!(matches!(
            reader.read().await,
            Err(PktLineError::InvalidLength(_))
        ));
    }
}

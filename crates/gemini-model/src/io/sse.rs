use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    Chunks(ChunksError),
    InvalidPayload,
}

/// Reads the `data` of server-sent events from a chunk stream.
///
/// Events are separated by a blank line, with either LF or CRLF line
/// endings. Multiple `data` lines of one event are joined with a line
/// feed. Comments and the other fields are skipped, as are events
/// without any `data` line.
pub struct Sse {
    buf: Vec<u8>,
    /// Where the next separator search starts in `buf`.
    scanned: usize,
    chunks: Chunks,
    exhausted: bool,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            scanned: 0,
            chunks,
            exhausted: false,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            while let Some(block) = self.take_block() {
                if let Some(data) = parse_block(&block)? {
                    return Ok(Some(data));
                }
            }

            if self.exhausted {
                // A trailing block without the blank line is incomplete
                // and gets dropped.
                return Ok(None);
            }
            match self.chunks.next_chunk().await.map_err(Error::Chunks)? {
                Some(bytes) => self.buf.extend_from_slice(&bytes),
                None => self.exhausted = true,
            }
        }
    }

    /// Removes the first complete event block from the buffer.
    fn take_block(&mut self) -> Option<Vec<u8>> {
        let Some((end, separator_len)) =
            find_separator(&self.buf, self.scanned)
        else {
            // The tail may hold the start of a separator.
            self.scanned = self.buf.len().saturating_sub(3);
            return None;
        };
        self.scanned = 0;
        let block = self.buf[..end].to_vec();
        self.buf.drain(..end + separator_len);
        Some(block)
    }
}

fn find_separator(buf: &[u8], from: usize) -> Option<(usize, usize)> {
    (from..buf.len()).find_map(|idx| {
        let rest = &buf[idx..];
        if rest.starts_with(b"\n\n") {
            Some((idx, 2))
        } else if rest.starts_with(b"\r\n\r\n") {
            Some((idx, 4))
        } else {
            None
        }
    })
}

fn parse_block(block: &[u8]) -> Result<Option<String>, Error> {
    let block = str::from_utf8(block).map_err(|_| Error::InvalidPayload)?;

    let mut data: Option<String> = None;
    for line in block.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        if field != "data" {
            continue;
        }
        let value = value.strip_prefix(' ').unwrap_or(value);
        match &mut data {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => data = Some(value.to_owned()),
        }
    }
    Ok(data)
}

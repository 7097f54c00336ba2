/// Literal payload that ends an event stream early.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Accumulates raw bytes and hands out complete event-stream records.
///
/// Buffering is byte-level so a multibyte character split across two network
/// chunks is decoded only once the whole record is present.
#[derive(Debug, Default)]
pub struct SseBuffer {
    buffer: Vec<u8>,
}

/// Locate the first blank-line separator. Returns `(record_end, next_start)`.
fn find_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let mut index = 0;
    while index < buffer.len() {
        if buffer[index] == b'\n' {
            match (buffer.get(index + 1), buffer.get(index + 2)) {
                (Some(b'\n'), _) => return Some((index, index + 2)),
                (Some(b'\r'), Some(b'\n')) => return Some((index, index + 3)),
                _ => {}
            }
        }
        index += 1;
    }
    None
}

impl SseBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Next complete record, without its trailing separator.
    pub fn next_record(&mut self) -> Option<String> {
        let (end, next) = find_boundary(&self.buffer)?;
        let remaining = self.buffer.split_off(next);
        let mut record = std::mem::replace(&mut self.buffer, remaining);
        record.truncate(end);
        Some(String::from_utf8_lossy(&record).into_owned())
    }

    /// Whatever is left once the byte stream ends, if it holds anything.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let text = String::from_utf8_lossy(&rest).into_owned();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseRecord {
    Data(String),
    Done,
}

/// Payload lines of a record, with the `data:` marker (and one optional
/// space) stripped. `event:`, `id:`, `retry:` and `:` comment lines are
/// ignored.
pub fn data_lines(record: &str) -> Vec<&str> {
    record
        .lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect()
}

/// Interpret one record. Records without data lines yield `None`.
pub fn parse_record(record: &str) -> Option<SseRecord> {
    let lines = data_lines(record);
    if lines.is_empty() {
        return None;
    }
    let payload = lines.join("\n");
    if payload.trim() == DONE_SENTINEL {
        Some(SseRecord::Done)
    } else {
        Some(SseRecord::Data(payload))
    }
}

use super::frame::{StreamFrame, interpret};

/// Line buffer for newline-delimited JSON records.
#[derive(Debug, Default)]
pub struct NdjsonBuffer {
    buffer: Vec<u8>,
}

impl NdjsonBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Next complete line with its `\n` / `\r\n` terminator removed.
    pub fn next_line(&mut self) -> Option<String> {
        let newline = self.buffer.iter().position(|b| *b == b'\n')?;
        let remaining = self.buffer.split_off(newline + 1);
        let mut line = std::mem::replace(&mut self.buffer, remaining);
        line.truncate(newline);
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    pub fn finish(&mut self) -> Option<String> {
        let mut rest = std::mem::take(&mut self.buffer);
        if rest.last() == Some(&b'\r') {
            rest.pop();
        }
        if rest.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&rest).into_owned())
        }
    }
}

/// Decode one line. Blank lines are skipped; lines that fail to parse as
/// JSON are yielded verbatim.
pub fn parse_line(line: &str) -> Option<StreamFrame> {
    if line.trim().is_empty() {
        return None;
    }
    interpret(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_split_on_newline() {
        let mut buffer = NdjsonBuffer::new();
        buffer.push_chunk(b"{\"text\":\"a\"}\r\n{\"te");
        assert_eq!(buffer.next_line().as_deref(), Some("{\"text\":\"a\"}"));
        assert!(buffer.next_line().is_none());
        buffer.push_chunk(b"xt\":\"b\"}");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.finish().as_deref(), Some("{\"text\":\"b\"}"));
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_line("   "), None);
    }

    #[test]
    fn unparseable_line_falls_back_to_raw() {
        assert_eq!(
            parse_line("{broken"),
            Some(StreamFrame::Delta("{broken".into()))
        );
    }

    #[test]
    fn content_field_is_extracted() {
        assert_eq!(
            parse_line("{\"content\":\"chunk\"}"),
            Some(StreamFrame::Delta("chunk".into()))
        );
    }
}

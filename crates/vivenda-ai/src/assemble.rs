//! Incremental assembly of a streamed reply.
//!
//! The upstream stream is event-stream shaped but not strict SSE: payload
//! lines are `data: <json>` where the JSON is either an incremental token
//! (`choices[0].delta.content`) or a complete replacement (`reply`), and the
//! stream ends with a `data: [DONE]` sentinel. The assembler buffers raw
//! bytes and only interprets complete lines, so the final string is identical
//! no matter how the byte stream is chunked.

use crate::types::ReplyPayload;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// Chunk-boundary-tolerant reply assembler.
#[derive(Debug, Default)]
pub struct ReplyAssembler {
    buffer: Vec<u8>,
    accumulated: String,
    final_reply: Option<String>,
}

impl ReplyAssembler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk of the byte stream.
    ///
    /// Complete lines are processed immediately; the trailing partial line
    /// (which may end mid-character) stays buffered until more bytes arrive
    /// or [`finish`](Self::finish) flushes it.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            self.process_line(line.trim_end_matches('\r'));
        }
    }

    /// Flushes any buffered partial line and returns the assembled reply.
    ///
    /// A complete `reply` payload always wins over accumulated tokens.
    #[must_use]
    pub fn finish(mut self) -> String {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest);
            self.process_line(line.trim_end_matches('\r'));
        }
        self.final_reply.unwrap_or(self.accumulated)
    }

    fn process_line(&mut self, line: &str) {
        let line = line.trim();
        // Blank keep-alives and ":" comment lines carry no payload.
        if line.is_empty() || line.starts_with(':') {
            return;
        }
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return;
        };
        let payload = payload.trim_start();
        if payload == DONE_SENTINEL {
            return;
        }
        // One malformed line never aborts the stream.
        if let Ok(parsed) = serde_json::from_str::<ReplyPayload>(payload) {
            if let Some(token) = parsed.token() {
                self.accumulated.push_str(token);
            }
            if let Some(replacement) = parsed.replacement() {
                self.final_reply = Some(replacement.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(chunks: &[&[u8]]) -> String {
        let mut assembler = ReplyAssembler::new();
        for chunk in chunks {
            assembler.feed(chunk);
        }
        assembler.finish()
    }

    const STREAM: &[u8] = b"data: {\"choices\":[{\"delta\":{\"content\":\"Ol\xc3\xa1\"}}]}\n\
data: {\"choices\":[{\"delta\":{\"content\":\", tudo\"}}]}\n\
data: {\"choices\":[{\"delta\":{\"content\":\" bem?\"}}]}\n\
data: [DONE]\n";

    #[test]
    fn assembles_incremental_tokens() {
        assert_eq!(assemble(&[STREAM]), "Olá, tudo bem?");
    }

    #[test]
    fn identical_result_for_any_chunking() {
        let whole = assemble(&[STREAM]);
        // Byte-at-a-time chunking splits lines and the two-byte "á" as well.
        let bytes: Vec<&[u8]> = STREAM.chunks(1).collect();
        assert_eq!(assemble(&bytes), whole);
        let threes: Vec<&[u8]> = STREAM.chunks(3).collect();
        assert_eq!(assemble(&threes), whole);
        let sevens: Vec<&[u8]> = STREAM.chunks(7).collect();
        assert_eq!(assemble(&sevens), whole);
    }

    #[test]
    fn final_reply_wins_over_tokens() {
        let stream = b"data: {\"choices\":[{\"delta\":{\"content\":\"parcial\"}}]}\n\
data: {\"reply\":\"resposta completa\"}\n\
data: [DONE]\n";
        assert_eq!(assemble(&[stream]), "resposta completa");
    }

    #[test]
    fn message_field_also_replaces() {
        let stream = b"data: {\"message\":\"pela via message\"}\n";
        assert_eq!(assemble(&[stream]), "pela via message");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let stream = b"data: {not json at all\n\
data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n";
        assert_eq!(assemble(&[stream]), "ok");
    }

    #[test]
    fn comments_and_blanks_are_ignored() {
        let stream = b": keep-alive\n\n\
data: {\"choices\":[{\"delta\":{\"content\":\"oi\"}}]}\n\n";
        assert_eq!(assemble(&[stream]), "oi");
    }

    #[test]
    fn trailing_partial_line_is_flushed() {
        // No trailing newline: finish() must still parse the last line.
        let stream = b"data: {\"reply\":\"sem quebra final\"}";
        assert_eq!(assemble(&[stream]), "sem quebra final");
    }

    #[test]
    fn crlf_lines_are_handled() {
        let stream = b"data: {\"choices\":[{\"delta\":{\"content\":\"crlf\"}}]}\r\ndata: [DONE]\r\n";
        assert_eq!(assemble(&[stream]), "crlf");
    }

    #[test]
    fn empty_stream_yields_empty_string() {
        assert_eq!(assemble(&[b"" as &[u8]]), "");
    }
}

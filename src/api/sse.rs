// Incremental decoder for `data: <json>` event frames

use std::collections::VecDeque;
use std::fmt::Display;

use futures::stream::{Stream, StreamExt};
use serde_json::Value;

use super::ApiError;
use crate::events::Event;

pub const DATA_PREFIX: &str = "data: ";

/// How a single complete line was classified.
///
/// Only `Event` produces output. A malformed frame is dropped and decoding
/// carries on with the next line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Event(Event),
    /// No `data: ` prefix, or an empty payload (keep-alives, comments, padding)
    Ignored,
    /// Payload is not valid JSON, or a known type with the wrong shape
    Malformed(String),
    /// Well-formed payload with a `type` this client does not know
    Unrecognized(String),
}

pub fn parse_line(line: &str) -> LineOutcome {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return LineOutcome::Ignored;
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return LineOutcome::Ignored;
    }

    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => return LineOutcome::Malformed(e.to_string()),
    };

    match value.get("type").and_then(Value::as_str) {
        Some("text" | "done" | "error") => match serde_json::from_value::<Event>(value) {
            Ok(event) => LineOutcome::Event(event),
            Err(e) => LineOutcome::Malformed(e.to_string()),
        },
        Some(other) => LineOutcome::Unrecognized(other.to_string()),
        None => LineOutcome::Malformed("missing \"type\" field".to_string()),
    }
}

/// Turns raw body chunks into events, tolerating arbitrary chunk boundaries.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Trailing bytes of an incomplete UTF-8 sequence
    pending: Vec<u8>,
    /// Decoded text not yet terminated by a newline
    buffer: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every event completed by it, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Event> {
        let text = self.decode_utf8(chunk);
        self.buffer.push_str(&text);

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };
        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);

        complete
            .split('\n')
            .filter_map(|line| match parse_line(line) {
                LineOutcome::Event(event) => Some(event),
                LineOutcome::Ignored => None,
                LineOutcome::Malformed(reason) => {
                    tracing::debug!(%reason, "dropping malformed frame");
                    None
                }
                LineOutcome::Unrecognized(kind) => {
                    tracing::debug!(%kind, "ignoring unrecognized event type");
                    None
                }
            })
            .collect()
    }

    /// End of stream: discard any unterminated fragment.
    ///
    /// Returns the number of bytes that were dropped.
    pub fn finish(&mut self) -> usize {
        let dropped = self.pending.len() + self.buffer.len();
        self.pending.clear();
        self.buffer.clear();
        dropped
    }

    // Stateful UTF-8 decoding. Invalid sequences become U+FFFD; an incomplete
    // sequence at the end of the chunk waits for the next one.
    fn decode_utf8(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest: &[u8] = &bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    if let Some(len) = err.error_len() {
                        out.push(char::REPLACEMENT_CHARACTER);
                        rest = &after[len..];
                    } else {
                        self.pending = after.to_vec();
                        break;
                    }
                }
            }
        }
        out
    }
}

struct DecodeState<S> {
    bytes: std::pin::Pin<Box<S>>,
    decoder: FrameDecoder,
    ready: VecDeque<Event>,
    finished: bool,
}

/// Lazily decode a response body into events.
///
/// A read error is yielded once as `Err` and ends the stream.
pub fn decode_stream<S, B, E>(bytes: S) -> impl Stream<Item = Result<Event, ApiError>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let state = DecodeState {
        bytes: Box::pin(bytes),
        decoder: FrameDecoder::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.ready.pop_front() {
                return Some((Ok(event), state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(chunk.as_ref());
                    state.ready.extend(events);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(ApiError::Stream(e.to_string())), state));
                }
                None => {
                    let dropped = state.decoder.finish();
                    if dropped > 0 {
                        tracing::debug!(dropped, "discarding unterminated trailing fragment");
                    }
                    state.finished = true;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAMES: &str = concat!(
        "data: {\"type\":\"text\",\"content\":\"I \"}\n\n",
        ": keep-alive\n\n",
        "data: {\"type\":\"text\",\"content\":\"love café ☕ \"}\n\n",
        "data: {\"type\":\"text\",\"content\":\"très 🚀\"}\n\n",
        "data: {\"type\":\"done\"}\n\n",
    );

    fn text(content: &str) -> Event {
        Event::Text {
            content: content.to_string(),
        }
    }

    fn decode_all(chunks: &[&[u8]]) -> Vec<Event> {
        let mut decoder = FrameDecoder::new();
        let mut events = Vec::new();
        for chunk in chunks {
            events.extend(decoder.push(chunk));
        }
        decoder.finish();
        events
    }

    #[test]
    fn test_decodes_single_chunk() {
        let events = decode_all(&[FRAMES.as_bytes()]);
        assert_eq!(
            events,
            vec![
                text("I "),
                text("love café ☕ "),
                text("très 🚀"),
                Event::Done
            ]
        );
    }

    #[test]
    fn test_every_split_point_yields_same_events() {
        let bytes = FRAMES.as_bytes();
        let expected = decode_all(&[bytes]);

        for split in 0..=bytes.len() {
            let (a, b) = bytes.split_at(split);
            assert_eq!(decode_all(&[a, b]), expected, "split at byte {split}");
        }
    }

    #[test]
    fn test_byte_at_a_time_yields_same_events() {
        let bytes = FRAMES.as_bytes();
        let expected = decode_all(&[bytes]);
        let chunks: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(decode_all(&chunks), expected);
    }

    #[test]
    fn test_three_way_splits_yield_same_events() {
        let bytes = FRAMES.as_bytes();
        let expected = decode_all(&[bytes]);

        for first in (0..bytes.len()).step_by(7) {
            for second in (first..bytes.len()).step_by(5) {
                let chunks = [&bytes[..first], &bytes[first..second], &bytes[second..]];
                assert_eq!(decode_all(&chunks), expected, "splits {first}/{second}");
            }
        }
    }

    #[test]
    fn test_split_mid_multibyte_character() {
        let frame = "data: {\"type\":\"text\",\"content\":\"☕\"}\n".as_bytes();
        let cup = frame.iter().position(|&b| b == 0xE2).unwrap();

        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(&frame[..=cup]).is_empty());
        assert_eq!(decoder.push(&frame[cup + 1..]), vec![text("☕")]);
    }

    #[test]
    fn test_split_mid_token() {
        let frame = "data: {\"type\":\"text\",\"content\":\"I \"}\n";

        // second chunk begins with `":"te`
        let split = frame.find("\":\"te").unwrap();
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(&frame.as_bytes()[..split]).is_empty());
        assert_eq!(decoder.push(&frame.as_bytes()[split..]), vec![text("I ")]);

        // first chunk ends inside the type value
        let split = frame.find("xt\"").unwrap();
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(&frame.as_bytes()[..split]).is_empty());
        assert_eq!(decoder.push(&frame.as_bytes()[split..]), vec![text("I ")]);
    }

    #[test]
    fn test_line_without_prefix_is_ignored() {
        assert_eq!(
            parse_line(r#"{"type":"text","content":"x"}"#),
            LineOutcome::Ignored
        );
        assert_eq!(
            parse_line(r#"data:{"type":"text","content":"x"}"#),
            LineOutcome::Ignored
        );
        assert_eq!(parse_line("event: message"), LineOutcome::Ignored);
        assert_eq!(parse_line(": comment"), LineOutcome::Ignored);
        assert_eq!(parse_line(""), LineOutcome::Ignored);
        assert_eq!(parse_line("data:    "), LineOutcome::Ignored);
    }

    #[test]
    fn test_malformed_payload_is_classified() {
        assert!(matches!(
            parse_line("data: {not json"),
            LineOutcome::Malformed(_)
        ));
        assert!(matches!(
            parse_line(r#"data: {"type":"text"}"#),
            LineOutcome::Malformed(_)
        ));
        assert!(matches!(
            parse_line(r#"data: {"content":"x"}"#),
            LineOutcome::Malformed(_)
        ));
    }

    #[test]
    fn test_unknown_type_is_unrecognized() {
        assert_eq!(
            parse_line(r#"data: {"type":"ping"}"#),
            LineOutcome::Unrecognized("ping".to_string())
        );
    }

    #[test]
    fn test_payload_is_trimmed_and_crlf_tolerated() {
        assert_eq!(
            parse_line("data:   {\"type\":\"done\"}  \r"),
            LineOutcome::Event(Event::Done)
        );
        let events = decode_all(&[b"data: {\"type\":\"done\"}\r\n\r\n".as_slice()]);
        assert_eq!(events, vec![Event::Done]);
    }

    #[test]
    fn test_malformed_frame_does_not_block_following_lines() {
        let input = concat!(
            "data: {\"type\":\"text\",\"content\":\"a\"}\n",
            "data: {\"type\":\"text\",\"content\":\n",
            "data: {\"type\":\"mystery\"}\n",
            "data: {\"type\":\"text\",\"content\":\"b\"}\n",
            "data: {\"type\":\"done\"}\n",
        );
        assert_eq!(
            decode_all(&[input.as_bytes()]),
            vec![text("a"), text("b"), Event::Done]
        );
    }

    #[test]
    fn test_unterminated_trailing_fragment_is_discarded() {
        let mut decoder = FrameDecoder::new();
        let events = decoder.push(b"data: {\"type\":\"text\",\"content\":\"a\"}\ndata: {\"type\":\"done\"}");
        assert_eq!(events, vec![text("a")]);
        assert_eq!(decoder.finish(), r#"data: {"type":"done"}"#.len());
        assert_eq!(decoder.finish(), 0);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut decoder = FrameDecoder::new();
        let mut frame = b"data: {\"type\":\"text\",\"content\":\"a".to_vec();
        frame.push(0xFF);
        frame.extend_from_slice(b"b\"}\n");
        assert_eq!(decoder.push(&frame), vec![text("a\u{FFFD}b")]);
    }

    #[test]
    fn test_decode_stream_yields_events_in_order() {
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = FRAMES
            .as_bytes()
            .chunks(11)
            .map(|c| Ok(c.to_vec()))
            .collect();

        let events: Vec<Event> = tokio_test::block_on(
            decode_stream(futures::stream::iter(chunks))
                .map(|r| r.unwrap())
                .collect(),
        );
        assert_eq!(events, decode_all(&[FRAMES.as_bytes()]));
    }

    #[test]
    fn test_decode_stream_surfaces_read_error_and_stops() {
        let chunks: Vec<Result<&[u8], String>> = vec![
            Ok(b"data: {\"type\":\"text\",\"content\":\"a\"}\n".as_slice()),
            Err("connection reset".to_string()),
            Ok(b"data: {\"type\":\"done\"}\n".as_slice()),
        ];

        let items: Vec<Result<Event, ApiError>> =
            tokio_test::block_on(decode_stream(futures::stream::iter(chunks)).collect());
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), &text("a"));
        assert!(matches!(&items[1], Err(ApiError::Stream(msg)) if msg == "connection reset"));
    }
}

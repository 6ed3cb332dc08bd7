//! # Frame Accumulator
//!
//! Turn a TCP byte stream with arbitrary chunk boundaries into candidate
//! JSON-object texts.
//!
//! ## Design Principles
//!
//! 1. **Streaming Friendly**: The accumulator owns its buffer and returns
//!    `Ok(None)` when more data is needed, like a pull parser.
//! 2. **Closing-Brace Trigger**: A frame is considered finished as soon as
//!    the buffer contains any `}` byte. Braces are not matched, so a `}`
//!    inside a string value, two objects in one chunk, or a chunk boundary
//!    right after a nested object all mis-frame. Existing clients send one
//!    flat-terminated object per write and rely on this behavior.
//! 3. **Clear On Every Attempt**: Once triggered, the buffer is cleared
//!    whether or not the text looked like an object.
//! 4. **Replaceable**: Callers only see [`FrameAccumulator::feed`], so a
//!    length-prefixed or brace-matching framer can replace this one without
//!    touching dispatch.
//!
//! Bytes are kept raw until a frame triggers, so multi-byte UTF-8 characters
//! split across reads decode correctly. `}` is ASCII and never appears inside
//! a multi-byte sequence.

use bytes::BytesMut;

/// Leading artifacts some clients emit before the first `{`.
const LEADING_ARTIFACTS: [char; 3] = ['\0', '\u{FEFF}', '\u{200B}'];

/// Framing failures. The buffer has already been discarded when one is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// A closing brace arrived but the accumulated text was not `{...}`.
    Malformed {
        /// The discarded text, trimmed, for diagnostics.
        discarded: String,
    },
}

/// Per-session byte accumulator.
#[derive(Debug, Default)]
pub struct FrameAccumulator {
    buf: BytesMut,
}

impl FrameAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        FrameAccumulator {
            buf: BytesMut::new(),
        }
    }

    /// Appends `chunk` and attempts to complete a frame.
    ///
    /// Returns `Ok(None)` if no closing brace has arrived yet,
    /// `Ok(Some(text))` with the trimmed object text if one has, and
    /// `Err(FrameError::Malformed)` if one has but the text is not an object.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Option<String>, FrameError> {
        self.buf.extend_from_slice(chunk);
        if !self.buf.contains(&b'}') {
            return Ok(None);
        }

        let raw = self.buf.split();
        let text = String::from_utf8_lossy(&raw);
        let clean = clean_frame(&text);

        if clean.starts_with('{') && clean.ends_with('}') {
            Ok(Some(clean.to_string()))
        } else {
            Err(FrameError::Malformed {
                discarded: clean.to_string(),
            })
        }
    }

    /// Returns the number of bytes waiting for a closing brace.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

fn clean_frame(text: &str) -> &str {
    text.trim()
        .trim_start_matches(LEADING_ARTIFACTS)
        .trim_start()
}

//! ANSI escape stripping for remote output.
//!
//! Remote shells emit color codes, cursor movement and title-setting
//! sequences that mean nothing once the text lands in scrollback. The
//! normalizer strips CSI (`ESC [ ... final`), OSC (`ESC ] ... BEL/ST`)
//! and two-byte `ESC x` sequences while passing everything else
//! through, including `\r`, `\n` and `\t`.
//!
//! It is a streaming parser: a sequence split across chunk boundaries
//! is buffered and resolved when the rest arrives. A buffered tail
//! left over when the stream closes is recovered with [`flush`].
//!
//! Malformed sequences never fail: the buffered bytes are emitted as
//! literal text (minus the escape bytes themselves, so a second pass
//! over already-normalized text changes nothing) and parsing resumes.
//!
//! [`flush`]: OutputNormalizer::flush

const ESC: char = '\x1b';
const BEL: char = '\x07';

/// Buffered-sequence cap. A real escape sequence is a handful of
/// bytes; anything this long is garbage pretending to be one.
const MAX_PENDING: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Passing text through
    Ground,
    /// Seen ESC, waiting for the selector
    Escape,
    /// Inside a CSI sequence, waiting for the final byte
    Csi,
    /// Inside an OSC sequence, waiting for BEL or ST
    Osc,
    /// Seen ESC inside an OSC sequence; `\` completes an ST
    OscEscape,
}

/// Streaming ANSI stripper with cross-chunk buffering
#[derive(Debug)]
pub struct OutputNormalizer {
    state: State,
    pending: String,
}

impl Default for OutputNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputNormalizer {
    /// Create a normalizer in the ground state
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            pending: String::new(),
        }
    }

    /// Normalize one chunk, carrying parser state across calls
    pub fn push_chunk(&mut self, chunk: &str) -> String {
        let mut out = String::with_capacity(chunk.len());
        for ch in chunk.chars() {
            self.feed(ch, &mut out);
        }
        out
    }

    /// Recover whatever is buffered mid-sequence as literal text.
    ///
    /// Called when the stream closes so an unterminated sequence is
    /// not silently dropped.
    pub fn flush(&mut self) -> String {
        self.state = State::Ground;
        std::mem::take(&mut self.pending)
    }

    fn feed(&mut self, ch: char, out: &mut String) {
        match self.state {
            State::Ground => {
                if ch == ESC {
                    self.pending.push(ch);
                    self.state = State::Escape;
                } else {
                    out.push(ch);
                }
            }
            State::Escape => match ch {
                '[' => {
                    self.pending.push(ch);
                    self.state = State::Csi;
                }
                ']' => {
                    self.pending.push(ch);
                    self.state = State::Osc;
                }
                // Intermediate bytes extend the sequence (e.g. charset
                // designation `ESC ( B`)
                '\x20'..='\x2f' => self.pending.push(ch),
                // Final byte of a two-byte (or intermediate-extended)
                // sequence: drop the whole thing
                '\x30'..='\x7e' => self.discard(),
                _ => self.bail(ch, out),
            },
            State::Csi => match ch {
                // Parameter and intermediate bytes
                '\x20'..='\x3f' => {
                    self.pending.push(ch);
                    self.enforce_cap(out);
                }
                // Final byte terminates the sequence
                '\x40'..='\x7e' => self.discard(),
                _ => self.bail(ch, out),
            },
            State::Osc => match ch {
                BEL => self.discard(),
                ESC => {
                    self.pending.push(ch);
                    self.state = State::OscEscape;
                }
                _ => {
                    self.pending.push(ch);
                    self.enforce_cap(out);
                }
            },
            State::OscEscape => match ch {
                '\\' => self.discard(),
                _ => self.bail(ch, out),
            },
        }
    }

    fn discard(&mut self) {
        self.pending.clear();
        self.state = State::Ground;
    }

    /// Malformed sequence: emit the buffered bytes as literal text and
    /// reprocess the offending character from the ground state. The
    /// escape bytes themselves are dropped so renormalizing the result
    /// is a no-op.
    fn bail(&mut self, ch: char, out: &mut String) {
        tracing::debug!(
            buffered = self.pending.len(),
            "malformed escape sequence, passing through as text"
        );
        out.extend(self.pending.chars().filter(|&c| c != ESC));
        self.pending.clear();
        self.state = State::Ground;
        self.feed(ch, out);
    }

    fn enforce_cap(&mut self, out: &mut String) {
        if self.pending.len() > MAX_PENDING {
            tracing::debug!("escape sequence exceeds buffer cap, passing through as text");
            out.extend(self.pending.chars().filter(|&c| c != ESC));
            self.pending.clear();
            self.state = State::Ground;
        }
    }
}

/// One-shot normalization of a complete text
pub fn normalize(text: &str) -> String {
    let mut normalizer = OutputNormalizer::new();
    let mut out = normalizer.push_chunk(text);
    out.push_str(&normalizer.flush());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_color_codes() {
        assert_eq!(normalize("\x1b[32mok\x1b[0m\r\n"), "ok\r\n");
    }

    #[test]
    fn test_strips_osc_title_with_bel() {
        assert_eq!(normalize("\x1b]0;my title\x07prompt$ "), "prompt$ ");
    }

    #[test]
    fn test_strips_osc_with_st_terminator() {
        assert_eq!(normalize("\x1b]0;my title\x1b\\prompt$ "), "prompt$ ");
    }

    #[test]
    fn test_strips_two_byte_escape() {
        // Charset designation and keypad mode
        assert_eq!(normalize("\x1b(Bhello\x1b="), "hello");
    }

    #[test]
    fn test_preserves_plain_controls() {
        assert_eq!(normalize("a\tb\r\nc"), "a\tb\r\nc");
    }

    #[test]
    fn test_sequence_split_across_chunks() {
        let mut n = OutputNormalizer::new();
        let mut out = n.push_chunk("before\x1b[3");
        assert_eq!(out, "before");

        out = n.push_chunk("2mgreen\x1b[0m");
        assert_eq!(out, "green");
        assert!(n.flush().is_empty());
    }

    #[test]
    fn test_flush_recovers_unterminated_tail() {
        let mut n = OutputNormalizer::new();
        let out = n.push_chunk("done\x1b[3");
        assert_eq!(out, "done");
        assert_eq!(n.flush(), "\x1b[3");

        // Flushing twice yields nothing new
        assert!(n.flush().is_empty());
    }

    #[test]
    fn test_malformed_sequence_passes_through() {
        // A control byte cannot appear inside a CSI sequence; the
        // buffered text survives, only the escape byte is dropped.
        let out = normalize("\x1b[12\x01rest");
        assert_eq!(out, "[12\x01rest");
    }

    #[test]
    fn test_idempotent_on_normalized_text() {
        let inputs = [
            "\x1b[1;31mred\x1b[0m and \x1b]0;t\x07plain",
            "\x1b\x1b[2Jhi",
            "\x1b[12\x01rest",
            "no escapes at all\r\n",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_empty_chunk_is_noop() {
        let mut n = OutputNormalizer::new();
        assert_eq!(n.push_chunk(""), "");
        assert_eq!(n.flush(), "");
    }

    #[test]
    fn test_runaway_sequence_hits_cap() {
        let mut n = OutputNormalizer::new();
        let garbage = format!("\x1b]{}", "x".repeat(MAX_PENDING + 10));
        let out = n.push_chunk(&garbage);
        // Passed through (minus the escape byte) instead of buffering
        // forever
        assert!(out.starts_with(']'));
        assert!(out.len() >= MAX_PENDING);
    }
}

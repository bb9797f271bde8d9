//! Line framing: turns a byte stream into partial-line and complete-line
//! events over a fixed-capacity buffer.

use serde::{Deserialize, Serialize};

/// Default line buffer capacity, NUL slot included.
pub const PORT_BUFFER_SIZE: usize = 256;

/// Smallest usable capacity: one payload byte plus the NUL slot.
const MIN_CAPACITY: usize = 2;

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// What happens to payload bytes once the buffer is full and no terminator
/// has arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// The cursor wraps modulo capacity and new bytes overwrite the start of
    /// the buffer. When the cursor wraps to zero the accumulated line is
    /// effectively lost.
    #[default]
    Wrap,
    /// Bytes that do not fit are dropped until the next terminator.
    Truncate,
    /// The buffer doubles up to `max` bytes, then drops like `Truncate`.
    Grow { max: usize },
}

/// Event produced while feeding a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent<'a> {
    /// A payload byte was stored; the slice is everything since the last
    /// terminator.
    Partial(&'a [u8]),
    /// A terminator ended a non-empty line.
    Complete(&'a [u8]),
}

/// Fixed-capacity line accumulator.
///
/// Invariants: `cursor < capacity`, and `storage[cursor] == 0` after every
/// processed byte.
#[derive(Debug, Clone)]
pub struct LineBuffer {
    storage: Vec<u8>,
    cursor: usize,
    policy: OverflowPolicy,
    dropped: u64,
}

impl LineBuffer {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        let policy = match policy {
            OverflowPolicy::Grow { max } => OverflowPolicy::Grow {
                max: max.max(capacity),
            },
            other => other,
        };
        Self {
            storage: vec![0; capacity],
            cursor: 0,
            policy,
            dropped: 0,
        }
    }

    /// Current capacity. Only changes under [`OverflowPolicy::Grow`].
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Payload bytes discarded by `Truncate`/`Grow` since construction.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Bytes accumulated since the last terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage[..self.cursor]
    }

    /// The raw storage, including the NUL at the cursor and whatever stale
    /// bytes follow it.
    pub fn raw(&self) -> &[u8] {
        &self.storage
    }

    /// Forget the pending line.
    pub fn clear(&mut self) {
        self.cursor = 0;
        self.storage[0] = 0;
    }

    /// Process one byte, reporting partial or complete lines to `sink`.
    ///
    /// CR and LF are both terminators. A terminator with nothing accumulated
    /// is ignored, so CR-LF produces a single complete line.
    pub fn feed<F>(&mut self, byte: u8, mut sink: F)
    where
        F: FnMut(LineEvent<'_>),
    {
        if byte == CR || byte == LF {
            if self.cursor != 0 {
                sink(LineEvent::Complete(&self.storage[..self.cursor]));
                self.cursor = 0;
            }
            self.storage[self.cursor] = 0;
            return;
        }

        if !self.make_room() {
            self.dropped += 1;
            return;
        }

        self.storage[self.cursor] = byte;
        self.cursor += 1;
        if self.cursor == self.storage.len() {
            self.cursor = 0;
        }
        self.storage[self.cursor] = 0;
        sink(LineEvent::Partial(&self.storage[..self.cursor]));
    }

    /// Returns false when the byte must be dropped.
    fn make_room(&mut self) -> bool {
        let full = self.cursor + 1 >= self.storage.len();
        match self.policy {
            OverflowPolicy::Wrap => true,
            _ if !full => true,
            OverflowPolicy::Truncate => false,
            OverflowPolicy::Grow { max } => {
                let capacity = self.storage.len();
                if capacity >= max {
                    return false;
                }
                let grown = capacity.saturating_mul(2).min(max);
                self.storage.resize(grown, 0);
                true
            }
        }
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new(PORT_BUFFER_SIZE, OverflowPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, PartialEq)]
    enum Seen {
        Partial(String),
        Complete(String),
    }

    fn feed_all(buffer: &mut LineBuffer, bytes: &[u8]) -> Vec<Seen> {
        let mut seen = Vec::new();
        for &b in bytes {
            buffer.feed(b, |event| match event {
                LineEvent::Partial(p) => seen.push(Seen::Partial(String::from_utf8_lossy(p).into())),
                LineEvent::Complete(l) => {
                    seen.push(Seen::Complete(String::from_utf8_lossy(l).into()))
                }
            });
        }
        seen
    }

    fn completes(seen: &[Seen]) -> Vec<&str> {
        seen.iter()
            .filter_map(|s| match s {
                Seen::Complete(l) => Some(l.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_partials_then_complete() {
        let mut buffer = LineBuffer::default();
        let seen = feed_all(&mut buffer, b"ABC\r");
        assert_eq!(
            seen,
            vec![
                Seen::Partial("A".into()),
                Seen::Partial("AB".into()),
                Seen::Partial("ABC".into()),
                Seen::Complete("ABC".into()),
            ]
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_every_terminator_combination_yields_one_line() {
        for ending in [&b"\r"[..], b"\n", b"\r\n", b"\n\r", b"\r\r\n\n"] {
            let mut buffer = LineBuffer::default();
            let mut input = b"$GPRMC".to_vec();
            input.extend_from_slice(ending);
            let seen = feed_all(&mut buffer, &input);
            assert_eq!(completes(&seen), vec!["$GPRMC"], "ending {:?}", ending);
        }
    }

    #[test]
    fn test_lone_terminators_are_ignored() {
        let mut buffer = LineBuffer::default();
        let seen = feed_all(&mut buffer, b"\r\n\n\r");
        assert!(seen.is_empty());
        assert_eq!(buffer.cursor(), 0);
    }

    #[test]
    fn test_nul_kept_at_cursor() {
        let mut buffer = LineBuffer::new(8, OverflowPolicy::Wrap);
        feed_all(&mut buffer, b"xyz");
        assert_eq!(buffer.raw()[buffer.cursor()], 0);
        assert_eq!(&buffer.raw()[..4], b"xyz\0");
    }

    #[test]
    fn test_wrap_overwrites_from_start() {
        let mut buffer = LineBuffer::new(4, OverflowPolicy::Wrap);
        let seen = feed_all(&mut buffer, b"abcd");
        // Fourth byte fills the last slot, cursor wraps and the line reads empty.
        assert_eq!(buffer.cursor(), 0);
        assert_eq!(seen.last(), Some(&Seen::Partial(String::new())));

        let seen = feed_all(&mut buffer, b"ef\n");
        assert_eq!(completes(&seen), vec!["ef"]);
        assert_eq!(buffer.dropped(), 0);
    }

    #[test]
    fn test_truncate_drops_excess() {
        let mut buffer = LineBuffer::new(4, OverflowPolicy::Truncate);
        let seen = feed_all(&mut buffer, b"abcdef\r");
        assert_eq!(completes(&seen), vec!["abc"]);
        assert_eq!(buffer.dropped(), 3);
        assert_eq!(buffer.capacity(), 4);
    }

    #[test]
    fn test_grow_until_max() {
        let mut buffer = LineBuffer::new(4, OverflowPolicy::Grow { max: 8 });
        let seen = feed_all(&mut buffer, b"0123456789\n");
        assert_eq!(completes(&seen), vec!["0123456"]);
        assert_eq!(buffer.capacity(), 8);
        assert_eq!(buffer.dropped(), 3);
    }

    #[test]
    fn test_grow_max_below_capacity_is_clamped() {
        let buffer = LineBuffer::new(16, OverflowPolicy::Grow { max: 4 });
        assert_eq!(buffer.policy(), OverflowPolicy::Grow { max: 16 });
    }

    #[test]
    fn test_tiny_capacity_is_raised() {
        let buffer = LineBuffer::new(0, OverflowPolicy::Wrap);
        assert_eq!(buffer.capacity(), 2);
    }

    #[test]
    fn test_clear_discards_pending_line() {
        let mut buffer = LineBuffer::default();
        feed_all(&mut buffer, b"half");
        buffer.clear();
        let seen = feed_all(&mut buffer, b"new\n");
        assert_eq!(completes(&seen), vec!["new"]);
    }

    #[test]
    fn test_policy_toml_forms() {
        #[derive(Deserialize)]
        struct Holder {
            overflow: OverflowPolicy,
        }
        let wrap: Holder = toml::from_str("overflow = { mode = \"wrap\" }").unwrap();
        assert_eq!(wrap.overflow, OverflowPolicy::Wrap);
        let grow: Holder = toml::from_str("overflow = { mode = \"grow\", max = 1024 }").unwrap();
        assert_eq!(grow.overflow, OverflowPolicy::Grow { max: 1024 });
    }

    mod prop {
        use super::super::*;
        use proptest::prelude::*;

        fn payload() -> impl Strategy<Value = Vec<u8>> {
            proptest::collection::vec(any::<u8>().prop_filter("payload", |b| *b != b'\r' && *b != b'\n'), 1..200)
        }

        proptest! {
            #[test]
            fn cursor_stays_below_capacity(bytes in proptest::collection::vec(any::<u8>(), 0..2000), cap in 2usize..64) {
                let mut buffer = LineBuffer::new(cap, OverflowPolicy::Wrap);
                for b in bytes {
                    buffer.feed(b, |_| {});
                    prop_assert!(buffer.cursor() < buffer.capacity());
                    prop_assert_eq!(buffer.raw()[buffer.cursor()], 0);
                }
            }

            #[test]
            fn one_line_per_terminated_payload(line in payload(), ending in prop_oneof![Just(b"\r".to_vec()), Just(b"\n".to_vec()), Just(b"\r\n".to_vec())]) {
                let mut buffer = LineBuffer::new(512, OverflowPolicy::Wrap);
                let mut lines = Vec::new();
                let mut input = line.clone();
                input.extend_from_slice(&ending);
                input.extend_from_slice(&ending);
                for b in input {
                    buffer.feed(b, |event| {
                        if let LineEvent::Complete(l) = event {
                            lines.push(l.to_vec());
                        }
                    });
                }
                prop_assert_eq!(lines, vec![line]);
            }
        }
    }
}

//! Day file decoding.
//!
//! Canonical files hold one JSON object per line. Files from the previous
//! service are either a single JSON array or, after a known write bug,
//! objects concatenated back to back (`...}{...`).

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::application::errors::LogError;

/// Records read back from one file
#[derive(Debug)]
pub struct Decoded<R> {
    pub records: Vec<R>,
    /// Damaged spots that yielded no record
    pub skipped: usize,
}

impl<R> Decoded<R> {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            skipped: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.skipped == 0
    }

    fn absorb(&mut self, other: Decoded<R>) {
        self.records.extend(other.records);
        self.skipped += other.skipped;
    }
}

/// Decode every recoverable record in `content`, in file order. Never
/// fails: unreadable parts are counted in `skipped` and logged.
///
/// Lines that parse on their own are kept as they are. Runs of lines that
/// don't are handed to [`recover_block`] and the result is spliced back in
/// place.
pub fn decode<R: DeserializeOwned>(content: &str) -> Decoded<R> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Decoded::empty();
    }

    if trimmed.starts_with('[') {
        if let Ok(records) = serde_json::from_str::<Vec<R>>(trimmed) {
            return Decoded {
                records,
                skipped: 0,
            };
        }
    }

    let mut decoded = Decoded::empty();
    let mut pending: Vec<&str> = Vec::new();
    for line in trimmed.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match serde_json::from_str::<R>(line) {
            Ok(record) => {
                decoded.absorb(recover_block(&pending));
                pending.clear();
                decoded.records.push(record);
            }
            Err(_) => pending.push(line),
        }
    }
    decoded.absorb(recover_block(&pending));

    if !decoded.is_complete() {
        tracing::warn!(
            skipped = decoded.skipped,
            kept = decoded.records.len(),
            "Skipped unparseable log content"
        );
    }
    decoded
}

/// One line, newline terminated
pub fn encode_line<R: Serialize>(record: &R) -> Result<String, LogError> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    Ok(line)
}

#[cfg(feature = "legacy-recovery")]
fn recover_block<R: DeserializeOwned>(lines: &[&str]) -> Decoded<R> {
    if lines.is_empty() {
        return Decoded::empty();
    }
    recover_concatenated(&lines.join("\n"))
}

#[cfg(not(feature = "legacy-recovery"))]
fn recover_block<R: DeserializeOwned>(lines: &[&str]) -> Decoded<R> {
    Decoded {
        records: Vec::new(),
        skipped: lines.len(),
    }
}

/// Stream JSON values out of a concatenation with or without separators,
/// flattening arrays. After a malformed value the scan resumes at the next
/// `{`, so complete elements of a truncated array survive.
#[cfg(feature = "legacy-recovery")]
pub fn recover_concatenated<R: DeserializeOwned>(content: &str) -> Decoded<R> {
    use serde_json::Value;

    fn keep<R: DeserializeOwned>(value: Value, decoded: &mut Decoded<R>) {
        match serde_json::from_value(value) {
            Ok(record) => decoded.records.push(record),
            Err(_) => decoded.skipped += 1,
        }
    }

    let mut decoded = Decoded::empty();
    let mut start = 0;
    while start < content.len() {
        let mut stream = serde_json::Deserializer::from_str(&content[start..]).into_iter::<Value>();
        let mut failed = false;
        for value in stream.by_ref() {
            match value {
                Ok(Value::Array(items)) => {
                    for item in items {
                        keep(item, &mut decoded);
                    }
                }
                Ok(item) => keep(item, &mut decoded),
                Err(_) => {
                    failed = true;
                    break;
                }
            }
        }
        if !failed {
            break;
        }
        decoded.skipped += 1;

        let rest = content[start + stream.byte_offset()..].trim_start();
        let at = content.len() - rest.len();
        let step = rest.chars().next().map_or(1, char::len_utf8);
        match content.get(at + step..).and_then(|tail| tail.find('{')) {
            Some(pos) => start = at + step + pos,
            None => break,
        }
    }
    decoded
}

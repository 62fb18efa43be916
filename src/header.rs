//! Leading-comment header parsing.
//!
//! A managed file announces itself on its first line and then declares its
//! coordinates in a block comment:
//!
//! ```text
//! // @tfamanaged
//! /*
//!  * @groupId    >= org.cccs.jslibs
//!  * @artefactId >= jquery.collapsible
//!  * @version    >= 1.0.0
//!  */
//! ```
//!
//! [`is_managed`] only looks at the first line. [`parse_header`] is a small
//! line-oriented state machine over whatever lines follow it.

use crate::models::HeaderMetadata;

/// Token that opts a file into coordinate management.
pub const MANAGED_MARKER: &str = "@tfamanaged";

const LINE_COMMENT: &str = "//";
const BLOCK_OPEN: &str = "/*";
const BLOCK_CLOSE: &str = "*/";
const KEY_MARKER: char = '@';
const ASSIGN: &str = ">=";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NotStarted,
    InHeader,
    Done,
}

/// True iff the first line contains [`MANAGED_MARKER`]. Nothing past the
/// first line is read.
pub fn is_managed<I, S>(lines: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .next()
        .is_some_and(|first| first.as_ref().contains(MANAGED_MARKER))
}

/// Extract `@key >= value` entries from the leading block comment.
///
/// Returns an empty map when the first significant line is not a comment.
/// An unterminated block is read to the end of input.
pub fn parse_header<I, S>(lines: I) -> HeaderMetadata
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut values = HeaderMetadata::new();
    let mut state = State::NotStarted;

    for line in lines {
        let raw = line.as_ref();
        let trimmed = raw.trim();
        match state {
            State::NotStarted => {
                if trimmed.is_empty() || trimmed.starts_with(LINE_COMMENT) {
                    continue;
                }
                if !trimmed.starts_with(BLOCK_OPEN) {
                    break;
                }
                state = State::InHeader;
            }
            State::InHeader => {
                if trimmed.ends_with(BLOCK_CLOSE) {
                    state = State::Done;
                } else if let Some((key, value)) = parse_entry(raw) {
                    values.insert(key, value);
                }
            }
            State::Done => break,
        }
    }

    values
}

fn parse_entry(line: &str) -> Option<(String, String)> {
    let at = line.find(KEY_MARKER)?;
    let assign = line.find(ASSIGN)?;
    if assign <= at {
        return None;
    }
    let key = line[at + KEY_MARKER.len_utf8()..assign].trim();
    let value = line[assign + ASSIGN.len()..].trim();
    Some((key.to_string(), value.to_string()))
}

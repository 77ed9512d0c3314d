//! Result framing for the sqlite3 shell's JSON output.
//!
//! In `-json` mode the shell prints a result set as a JSON array with one
//! element per line:
//!
//! ```text
//! [{"id":1,"name":"a"},
//! {"id":2,"name":"b"}]
//! ```
//!
//! Every statement is followed by `.print *`, so the line `*` marks the end
//! of its output. Rows are cut out of the array incrementally: the first line
//! loses its leading `[`, every line loses its last character (`,` or `]`).
//! Nothing is buffered beyond the current line.

/// Readiness and end-of-result marker
pub const SENTINEL: &str = "*";

/// Text written to the child for one statement
pub fn statement_text(sql: &str) -> String {
    format!("{};\n.print {}\n", sql, SENTINEL)
}

/// Strip array punctuation from one output line
pub fn strip_row_punctuation(line: &str, first: bool) -> &str {
    let mut body = line;
    if first {
        let mut chars = body.chars();
        chars.next();
        body = chars.as_str();
    }
    let mut chars = body.chars();
    chars.next_back();
    chars.as_str()
}

/// What one line meant to the framer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame<'a> {
    Row(&'a str),
    End,
}

/// Per-statement framing state
#[derive(Debug, Default)]
pub struct RowFramer {
    lines_seen: usize,
    finished: bool,
}

impl RowFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify the next line. Returns `None` for lines that carry no row
    /// (nothing left after stripping), which only happens on malformed output.
    pub fn feed<'a>(&mut self, line: &'a str) -> Option<Frame<'a>> {
        if self.finished {
            return None;
        }
        if line == SENTINEL {
            self.finished = true;
            return Some(Frame::End);
        }

        let first = self.lines_seen == 0;
        self.lines_seen += 1;
        let row = strip_row_punctuation(line, first);
        if row.is_empty() {
            None
        } else {
            Some(Frame::Row(row))
        }
    }

    /// The sentinel for this statement has been consumed
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn lines_seen(&self) -> usize {
        self.lines_seen
    }
}

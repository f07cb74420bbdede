use std::collections::VecDeque;
use std::iter::Enumerate;
use std::slice;

use tracing::{debug, warn};

use super::ScriptRecognizer;
use crate::config::ContinuationSyntax;
use crate::types::*;

/// State of the CDSEND scan between two lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScanState {
    #[default]
    Idle,
    /// A dataset name is being continued across lines.
    Accumulating {
        name: String,
        start_offset: u32,
        /// Offset and end column of the last line that contributed.
        last_offset: u32,
        last_end_column: u32,
    },
}

/// Recognizes `&&DSN` parameter lines, reassembling names continued with a
/// trailing hyphen.
///
/// Every reference is a generic access; the idiom does not say whether the
/// dataset is sent or received.
#[derive(Debug, Clone, Default)]
pub struct ContinuationRecognizer {
    syntax: ContinuationSyntax,
}

impl ContinuationRecognizer {
    pub fn new(syntax: ContinuationSyntax) -> Self {
        Self { syntax }
    }

    /// Transition function of the scan: feeds one line at `offset` and
    /// returns the next state plus any references completed by that line.
    ///
    /// At most two references come out of one line: a name left open by a
    /// previous marker, and a single-line name on this marker.
    pub fn step(
        &self,
        state: ScanState,
        offset: u32,
        line: &str,
    ) -> (ScanState, Vec<ExtractedReference>) {
        if line.starts_with(self.syntax.comment_prefix.as_str()) {
            return (state, Vec::new());
        }

        let trimmed = line.trim();
        let cont = self.syntax.continuation;

        if let Some(rest) = self.syntax.marker_name(trimmed) {
            let mut emitted = Vec::new();
            if let ScanState::Accumulating { .. } = state {
                warn!(line = offset, "new marker before continued dataset name ended");
                emitted.extend(self.close(state));
            }

            return match rest.strip_suffix(cont) {
                Some(head) => (
                    ScanState::Accumulating {
                        name: head.trim().to_string(),
                        start_offset: offset,
                        last_offset: offset,
                        last_end_column: line_length(line),
                    },
                    emitted,
                ),
                None => {
                    emitted.extend(reference(rest.trim(), LineSpan::whole_line(offset, line)));
                    (ScanState::Idle, emitted)
                }
            };
        }

        match state {
            ScanState::Idle => (ScanState::Idle, Vec::new()),
            ScanState::Accumulating {
                mut name,
                start_offset,
                ..
            } => match trimmed.strip_suffix(cont) {
                Some(head) => {
                    name.push_str(head.trim());
                    (
                        ScanState::Accumulating {
                            name,
                            start_offset,
                            last_offset: offset,
                            last_end_column: line_length(line),
                        },
                        Vec::new(),
                    )
                }
                None => {
                    name.push_str(trimmed);
                    let span = LineSpan::lines(start_offset, offset, line);
                    (ScanState::Idle, reference(&name, span).into_iter().collect())
                }
            },
        }
    }

    /// Completes a scan: a name still open at the end of the block is
    /// emitted as it stands.
    pub fn finish(&self, state: ScanState) -> Option<ExtractedReference> {
        if let ScanState::Accumulating { start_offset, .. } = &state {
            warn!(
                line = *start_offset,
                "script ended before continued dataset name ended"
            );
        }
        self.close(state)
    }

    fn close(&self, state: ScanState) -> Option<ExtractedReference> {
        match state {
            ScanState::Idle => None,
            ScanState::Accumulating {
                name,
                start_offset,
                last_offset,
                last_end_column,
            } => reference(
                &name,
                LineSpan {
                    begin_offset: start_offset,
                    begin_column: 1,
                    end_offset: last_offset,
                    end_column: last_end_column,
                },
            ),
        }
    }
}

impl ScriptRecognizer for ContinuationRecognizer {
    fn family(&self) -> CommandFamily {
        CommandFamily::ParameterSend
    }

    fn scan<'a>(
        &'a self,
        block: &'a ScriptBlock,
    ) -> Box<dyn Iterator<Item = ExtractedReference> + 'a> {
        Box::new(ContinuationScan {
            recognizer: self,
            lines: block.lines.iter().enumerate(),
            state: Some(ScanState::Idle),
            pending: VecDeque::new(),
        })
    }
}

/// Lazy scan of one block; drives [`ContinuationRecognizer::step`].
struct ContinuationScan<'a> {
    recognizer: &'a ContinuationRecognizer,
    lines: Enumerate<slice::Iter<'a, String>>,
    /// `None` once the block is exhausted and the final state flushed.
    state: Option<ScanState>,
    pending: VecDeque<ExtractedReference>,
}

impl Iterator for ContinuationScan<'_> {
    type Item = ExtractedReference;

    fn next(&mut self) -> Option<ExtractedReference> {
        loop {
            if let Some(reference) = self.pending.pop_front() {
                return Some(reference);
            }
            let state = self.state.take()?;
            match self.lines.next() {
                Some((offset, line)) => {
                    let (next, emitted) = self.recognizer.step(state, offset as u32, line);
                    self.state = Some(next);
                    self.pending.extend(emitted);
                }
                None => return self.recognizer.finish(state),
            }
        }
    }
}

/// Builds a generic reference, dropping empty names.
fn reference(name: &str, span: LineSpan) -> Option<ExtractedReference> {
    if name.is_empty() {
        debug!(line = span.begin_offset, "empty dataset name ignored");
        return None;
    }
    debug!(dataset = name, line = span.begin_offset, "dataset name");
    Some(ExtractedReference {
        name: name.to_string(),
        access: AccessKind::Generic,
        span,
    })
}

use tracing::debug;

use super::tokenizer::tokenize;
use super::ScriptRecognizer;
use crate::types::*;

/// Recognizes FTP `GET`/`PUT` command lines.
///
/// Every dataset token on a command line yields one reference spanning the
/// whole line. `//DD:` tokens, `+` join markers and empty tokens are never
/// datasets.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferRecognizer;

impl TransferRecognizer {
    pub fn new() -> Self {
        Self
    }

    /// Extracts the references on a single line at `offset` within its block.
    pub fn scan_line(&self, offset: u32, line: &str) -> Vec<ExtractedReference> {
        if !is_transfer_command(line) {
            return Vec::new();
        }

        let tokens = tokenize(line);
        if tokens.len() <= 1 {
            return Vec::new();
        }

        let (direction, names) = classify_tokens(&tokens);
        debug!(line = offset, ?direction, ?names, "transfer command tokens");

        let span = LineSpan::whole_line(offset, line);
        names
            .into_iter()
            .map(|name| ExtractedReference {
                name,
                access: direction.access_kind(),
                span,
            })
            .collect()
    }
}

impl ScriptRecognizer for TransferRecognizer {
    fn family(&self) -> CommandFamily {
        CommandFamily::Transfer
    }

    fn scan<'a>(
        &'a self,
        block: &'a ScriptBlock,
    ) -> Box<dyn Iterator<Item = ExtractedReference> + 'a> {
        Box::new(
            block
                .lines
                .iter()
                .enumerate()
                .flat_map(move |(offset, line)| self.scan_line(offset as u32, line)),
        )
    }
}

/// Returns `true` if the trimmed line starts with `GET ` or `PUT `, in any case.
pub fn is_transfer_command(line: &str) -> bool {
    let trimmed = line.trim();
    starts_with_ignore_case(trimmed, "GET ") || starts_with_ignore_case(trimmed, "PUT ")
}

/// Walks the tokens of one command line, returning the direction in force
/// once the whole line has been read, and the dataset names in order.
///
/// The last `GET`/`PUT` token on the line decides the direction for every
/// name on it, including names that appear before it. Verbs match exactly,
/// so a lowercase `get` is taken as a name. Empty quoted tokens are dropped.
pub fn classify_tokens(tokens: &[String]) -> (TransferDirection, Vec<String>) {
    let mut direction = TransferDirection::default();
    let mut names = Vec::new();

    for token in tokens {
        if token.is_empty() || token.starts_with("//DD:") || token == "+" {
            continue;
        }
        if token == "GET" {
            direction = TransferDirection::Get;
            continue;
        }
        if token == "PUT" {
            direction = TransferDirection::Put;
            continue;
        }
        names.push(token.clone());
    }

    (direction, names)
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

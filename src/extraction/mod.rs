mod continuation;
/// Line-oriented recognizers for dataset references in embedded scripts.
///
/// Each recognizer turns a [`ScriptBlock`] into a lazy sequence of
/// [`ExtractedReference`]s positioned relative to the block.
mod tokenizer;
mod transfer;

pub use continuation::{ContinuationRecognizer, ScanState};
pub use tokenizer::tokenize;
pub use transfer::{classify_tokens, is_transfer_command, TransferRecognizer};

use crate::config::LinkerConfig;
use crate::types::{CommandFamily, ExtractedReference, ScriptBlock};

/// Trait for command-family specific script recognizers.
pub trait ScriptRecognizer {
    /// The command family this recognizer handles.
    fn family(&self) -> CommandFamily;

    /// Scans a block, yielding references in line order.
    fn scan<'a>(&'a self, block: &'a ScriptBlock)
        -> Box<dyn Iterator<Item = ExtractedReference> + 'a>;
}

/// Returns the recognizer for a command family.
pub fn recognizer_for(family: CommandFamily, config: &LinkerConfig) -> Box<dyn ScriptRecognizer> {
    match family {
        CommandFamily::Transfer => Box::new(TransferRecognizer::new()),
        CommandFamily::ParameterSend => {
            Box::new(ContinuationRecognizer::new(config.continuation.clone()))
        }
    }
}

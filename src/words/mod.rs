//! Word validation and tokenization
//!
//! A [`WordBank`] decides which tokens count as words; a [`WordCounter`]
//! splits extracted text into tokens and counts the valid ones.

mod tokenizer;
mod wordbank;

pub use tokenizer::WordCounter;
pub use wordbank::{WordBank, WordValidator};

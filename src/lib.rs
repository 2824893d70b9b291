//! qt-linguist-language-server
//!
//! Qt Linguist の `.ts` 翻訳カタログを扱うライブラリと Language Server Protocol (LSP) 実装

pub mod catalog;
pub mod config;
pub mod db;
pub mod ide;
pub mod indexer;
pub mod input;
pub mod interned;
pub mod syntax;
mod test_utils;
pub mod types;

// Backend を再エクスポート
pub use ide::backend::Backend;

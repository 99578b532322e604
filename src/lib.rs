//! 石炭ルーフ/フロア検査の承認フォームとPDF報告書
//!
//! デスクトップ版とCLIが共有するフォーム状態・署名・PDF描画。

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod form;
pub mod logging;
pub mod pointer;
pub mod signature;

pub use error::{Result, SignoffError};
pub use form::FormStore;

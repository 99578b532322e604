//! Coal sign-off common library
//!
//! CLIとデスクトップで共有される型・テンプレート・レイアウト計算

pub mod types;
pub mod catalog;
pub mod layout;
pub mod error;
pub mod export;

pub use types::{
    AnswerRecord, ChecklistGroup, ChecklistItem, FormFields, SignatureRole, Status, Template,
};
pub use catalog::{catalog, find_template, DEFAULT_TEMPLATE};
pub use error::{Error, Result};
pub use export::pdf_core::{compose, report_file_name, DocumentPlan, ReportInput};

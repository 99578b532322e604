//! Export core modules shared by the CLI and the desktop form.

pub mod pdf_core;

use coal_signoff::form::{EvidenceTicket, PhotoBatchTicket, StoredImage};
use coal_signoff::signature::RestoreTicket;
use image::DynamicImage;
use signoff_common::SignatureRole;

/// Results sent back from decode threads.
pub enum UiMessage {
    PhotosDecoded {
        ticket: PhotoBatchTicket,
        images: Vec<StoredImage>,
    },
    EvidenceDecoded {
        ticket: EvidenceTicket,
        image: StoredImage,
    },
    SignatureLoaded {
        role: SignatureRole,
        ticket: RestoreTicket,
        image: Result<DynamicImage, String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusLine {
    pub fn info(text: impl Into<String>) -> Self {
        Self { kind: StatusKind::Info, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { kind: StatusKind::Error, text: text.into() }
    }
}

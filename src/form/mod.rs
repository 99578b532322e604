//! フォーム状態
//!
//! 回答・写真・署名はすべて `FormStore` の操作を通してのみ変更する。
//! テンプレート切替で回答・写真・署名をまとめて初期化する。

pub mod decode;
pub mod intake;
pub mod io;

pub use decode::{decode_upload, StoredImage, Upload};

use std::collections::BTreeMap;

use signoff_common::export::pdf_core::ReportInput;
use signoff_common::{find_template, AnswerRecord, FormFields, SignatureRole, Status, Template};

use crate::error::{Result, SignoffError};
use crate::signature::{EncodedSignature, SignatureUpdate};

/// 一般写真の上限
pub const MAX_PHOTOS: usize = signoff_common::layout::MAX_GENERAL_PHOTOS;

// ============================================
// 署名
// ============================================

/// Exactly three slots, one per role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signatures {
    slots: [Option<EncodedSignature>; 3],
}

impl Signatures {
    pub fn get(&self, role: SignatureRole) -> Option<&EncodedSignature> {
        self.slots[role.index()].as_ref()
    }

    pub fn apply(&mut self, role: SignatureRole, update: SignatureUpdate) {
        self.slots[role.index()] = match update {
            SignatureUpdate::Signed(sig) => Some(sig),
            SignatureUpdate::Cleared => None,
        };
    }

    /// `SignatureRole::index()` 順
    pub fn filled(&self) -> [bool; 3] {
        [
            self.slots[0].is_some(),
            self.slots[1].is_some(),
            self.slots[2].is_some(),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    fn clear(&mut self) {
        self.slots = Default::default();
    }
}

// ============================================
// 非同期デコードのチケット
// ============================================

/// Identifies the evidence record a decode was started for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceTicket {
    epoch: u64,
    item_id: String,
    generation: u64,
}

impl EvidenceTicket {
    pub fn item_id(&self) -> &str {
        &self.item_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoBatchTicket {
    epoch: u64,
}

#[derive(Debug, Clone, Default)]
struct EvidenceSlot {
    generation: u64,
    image: Option<StoredImage>,
}

// ============================================
// 集計
// ============================================

/// 報告書プレビュー用の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormSummary {
    pub items: usize,
    pub yes: usize,
    pub no: usize,
    pub not_available: usize,
    pub evidence: usize,
    pub photos: usize,
    pub signatures: usize,
}

impl FormSummary {
    pub fn answered(&self) -> usize {
        self.yes + self.no + self.not_available
    }

    /// 回答済み項目の割合（四捨五入）
    pub fn completion_percent(&self) -> u32 {
        if self.items == 0 {
            return 0;
        }
        (self.answered() as f64 / self.items as f64 * 100.0).round() as u32
    }
}

impl std::fmt::Display for FormSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}項目 ({}%) Y:{} N:{} N/A:{} / 証拠写真{}枚 / 写真{}枚 / 署名{}/3",
            self.answered(),
            self.items,
            self.completion_percent(),
            self.yes,
            self.no,
            self.not_available,
            self.evidence,
            self.photos,
            self.signatures
        )
    }
}

// ============================================
// FormStore
// ============================================

pub struct FormStore {
    template: &'static Template,
    fields: FormFields,
    answers: BTreeMap<String, AnswerRecord>,
    evidence: BTreeMap<String, EvidenceSlot>,
    photos: Vec<StoredImage>,
    signatures: Signatures,
    /// テンプレート切替ごとに進む
    epoch: u64,
}

impl FormStore {
    pub fn new(template: &'static Template) -> Self {
        Self::with_fields(template, FormFields::default())
    }

    pub fn with_fields(template: &'static Template, fields: FormFields) -> Self {
        let mut store = Self {
            template,
            fields,
            answers: BTreeMap::new(),
            evidence: BTreeMap::new(),
            photos: Vec::new(),
            signatures: Signatures::default(),
            epoch: 0,
        };
        store.reset_records();
        store
    }

    pub fn template(&self) -> &'static Template {
        self.template
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn answers(&self) -> &BTreeMap<String, AnswerRecord> {
        &self.answers
    }

    pub fn answer(&self, item_id: &str) -> Option<&AnswerRecord> {
        self.answers.get(item_id)
    }

    pub fn evidence(&self, item_id: &str) -> Option<&StoredImage> {
        self.evidence.get(item_id).and_then(|slot| slot.image.as_ref())
    }

    pub fn photos(&self) -> &[StoredImage] {
        &self.photos
    }

    pub fn signatures(&self) -> &Signatures {
        &self.signatures
    }

    // ----- フィールド・回答 -----

    /// Unconditional overwrite.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        self.fields.set(name, value);
    }

    pub fn set_status(&mut self, item_id: &str, status: Status) -> Result<()> {
        self.answer_mut(item_id)?.status = status;
        Ok(())
    }

    pub fn set_remark(&mut self, item_id: &str, remark: impl Into<String>) -> Result<()> {
        self.answer_mut(item_id)?.remark = remark.into();
        Ok(())
    }

    fn answer_mut(&mut self, item_id: &str) -> Result<&mut AnswerRecord> {
        self.answers
            .get_mut(item_id)
            .ok_or_else(|| SignoffError::UnknownItem(item_id.to_string()))
    }

    pub fn set_signature(&mut self, role: SignatureRole, update: SignatureUpdate) {
        self.signatures.apply(role, update);
    }

    // ----- テンプレート切替 -----

    /// Fresh empty records for `template`; photos and signatures are
    /// cleared at the same time. Fields are kept.
    pub fn reset_for_template(&mut self, template: &'static Template) {
        tracing::debug!(template = %template.key, "reset form for template");
        self.template = template;
        self.reset_records();
    }

    pub fn select_template(&mut self, key: &str) -> Result<()> {
        let template =
            find_template(key).ok_or_else(|| SignoffError::TemplateNotFound(key.to_string()))?;
        self.reset_for_template(template);
        Ok(())
    }

    fn reset_records(&mut self) {
        self.epoch += 1;
        self.answers = self
            .template
            .items()
            .map(|item| (item.id.clone(), AnswerRecord::default()))
            .collect();
        self.evidence = self
            .template
            .items()
            .map(|item| (item.id.clone(), EvidenceSlot::default()))
            .collect();
        self.photos.clear();
        self.signatures.clear();
    }

    // ----- 証拠写真 -----

    /// Start attaching evidence to `item_id`. Returns `None` (and leaves
    /// the record untouched) when the upload is not an image.
    pub fn begin_evidence(&mut self, item_id: &str, upload: &Upload) -> Result<Option<EvidenceTicket>> {
        let slot = self
            .evidence
            .get_mut(item_id)
            .ok_or_else(|| SignoffError::UnknownItem(item_id.to_string()))?;
        if !upload.is_image() {
            tracing::debug!(item = item_id, file = %upload.file_name, "skipping non-image evidence");
            return Ok(None);
        }
        slot.generation += 1;
        Ok(Some(EvidenceTicket {
            epoch: self.epoch,
            item_id: item_id.to_string(),
            generation: slot.generation,
        }))
    }

    /// Store a finished decode. Dropped when the form was reset or a newer
    /// attach/clear was issued for the same item since the ticket.
    pub fn complete_evidence(&mut self, ticket: EvidenceTicket, image: StoredImage) -> bool {
        if ticket.epoch != self.epoch {
            tracing::debug!(item = %ticket.item_id, "dropping evidence decoded for a previous template");
            return false;
        }
        match self.evidence.get_mut(&ticket.item_id) {
            Some(slot) if slot.generation == ticket.generation => {
                slot.image = Some(image);
                true
            }
            _ => {
                tracing::debug!(item = %ticket.item_id, "dropping superseded evidence decode");
                false
            }
        }
    }

    /// Synchronous attach (decode on the calling thread).
    pub fn attach_evidence(&mut self, item_id: &str, upload: Upload) -> Result<bool> {
        match self.begin_evidence(item_id, &upload)? {
            Some(ticket) => Ok(self.complete_evidence(ticket, decode_upload(upload))),
            None => Ok(false),
        }
    }

    pub fn clear_evidence(&mut self, item_id: &str) -> Result<()> {
        let slot = self
            .evidence
            .get_mut(item_id)
            .ok_or_else(|| SignoffError::UnknownItem(item_id.to_string()))?;
        slot.generation += 1;
        slot.image = None;
        Ok(())
    }

    // ----- 一般写真 -----

    /// Append in order, then keep the first [`MAX_PHOTOS`] overall.
    pub fn add_photos(&mut self, images: Vec<StoredImage>) {
        self.photos.extend(images);
        if self.photos.len() > MAX_PHOTOS {
            tracing::debug!(
                dropped = self.photos.len() - MAX_PHOTOS,
                "photo limit reached, discarding surplus"
            );
            self.photos.truncate(MAX_PHOTOS);
        }
    }

    /// Filter, decode on the calling thread and add.
    pub fn add_uploads(&mut self, uploads: Vec<Upload>) {
        let decoded = intake::accept_images(uploads)
            .into_iter()
            .map(decode_upload)
            .collect();
        self.add_photos(decoded);
    }

    pub fn remove_photo(&mut self, index: usize) -> Option<StoredImage> {
        if index < self.photos.len() {
            Some(self.photos.remove(index))
        } else {
            None
        }
    }

    pub fn begin_photo_batch(&self) -> PhotoBatchTicket {
        PhotoBatchTicket { epoch: self.epoch }
    }

    /// Returns whether the batch was applied (it is dropped after a
    /// template switch).
    pub fn complete_photos(&mut self, ticket: PhotoBatchTicket, images: Vec<StoredImage>) -> bool {
        if ticket.epoch != self.epoch {
            tracing::debug!(count = images.len(), "dropping photos decoded for a previous template");
            return false;
        }
        self.add_photos(images);
        true
    }

    // ----- 出力 -----

    pub fn summary(&self) -> FormSummary {
        let mut summary = FormSummary {
            items: self.template.item_count(),
            evidence: self.evidence.values().filter(|slot| slot.image.is_some()).count(),
            photos: self.photos.len(),
            signatures: self.signatures.filled().iter().filter(|f| **f).count(),
            ..FormSummary::default()
        };
        for answer in self.answers.values() {
            match answer.status {
                Status::Yes => summary.yes += 1,
                Status::No => summary.no += 1,
                Status::NotAvailable => summary.not_available += 1,
                Status::Unset => {}
            }
        }
        summary
    }

    pub fn report_input(&self) -> ReportInput<'_> {
        ReportInput {
            template: self.template,
            fields: &self.fields,
            answers: &self.answers,
            photo_count: self.photos.len(),
            signed: self.signatures.filled(),
        }
    }
}

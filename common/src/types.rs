//! 点検フォームの型定義
//!
//! CLIとデスクトップで共有される型:
//! - Template / ChecklistGroup / ChecklistItem: 静的なテンプレート定義
//! - Status / AnswerRecord: 項目ごとの回答
//! - FormFields: ヘッダー情報（日付・場所・署名者名など）
//! - SignatureRole: 3つの署名欄

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::{Error, Result};

/// Checklist mark chosen for one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "")]
    Unset,
    #[serde(rename = "Y")]
    Yes,
    #[serde(rename = "N")]
    No,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl Status {
    pub const CHOICES: [Status; 3] = [Status::Yes, Status::No, Status::NotAvailable];

    /// Mark printed in the checklist table. Unset items print a dash so the
    /// column never looks like a rendering gap.
    pub fn mark(&self) -> &'static str {
        match self {
            Status::Unset => "-",
            Status::Yes => "Y",
            Status::No => "N",
            Status::NotAvailable => "N/A",
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, Status::Unset)
    }
}

impl std::str::FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "" | "-" => Ok(Status::Unset),
            "Y" | "YES" => Ok(Status::Yes),
            "N" | "NO" => Ok(Status::No),
            "N/A" | "NA" => Ok(Status::NotAvailable),
            _ => Err(Error::UnknownStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mark())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    /// 現地語の補足説明
    pub subtext: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistGroup {
    pub id: String,
    pub title: String,
    pub items: Vec<ChecklistItem>,
}

/// 報告書テンプレート
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub key: String,
    pub title: String,
    /// 改行を含む場合は1行ずつ中央寄せで出力
    pub subtitle: String,
    pub groups: Vec<ChecklistGroup>,
}

impl Template {
    /// All items, group order then item order.
    pub fn items(&self) -> impl Iterator<Item = &ChecklistItem> {
        self.groups.iter().flat_map(|g| g.items.iter())
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|g| g.items.len()).sum()
    }

    pub fn contains_item(&self, id: &str) -> bool {
        self.items().any(|item| item.id == id)
    }

    pub fn subtitle_lines(&self) -> impl Iterator<Item = &str> {
        self.subtitle.split('\n')
    }

    /// テンプレート読み込み時に一度だけ検証する
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::InvalidTemplate {
            key: self.key.clone(),
            reason,
        };

        if self.key.trim().is_empty() {
            return Err(invalid("empty template key".to_string()));
        }
        if self.item_count() == 0 {
            return Err(invalid("template has no checklist items".to_string()));
        }

        let mut seen = HashSet::new();
        for item in self.items() {
            if item.id.trim().is_empty() {
                return Err(invalid("empty item id".to_string()));
            }
            if !seen.insert(item.id.as_str()) {
                return Err(invalid(format!("duplicate item id '{}'", item.id)));
            }
        }
        Ok(())
    }
}

/// 項目ごとの回答（証拠写真はルートクレート側で保持）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerRecord {
    pub status: Status,
    pub remark: String,
}

/// 署名欄の役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureRole {
    /// Accepted by / Diterima Oleh
    Acceptor,
    /// Prepared by
    Preparer,
    /// Proposed by
    Proposer,
}

impl SignatureRole {
    pub const ALL: [SignatureRole; 3] = [
        SignatureRole::Acceptor,
        SignatureRole::Preparer,
        SignatureRole::Proposer,
    ];

    pub fn index(&self) -> usize {
        match self {
            SignatureRole::Acceptor => 0,
            SignatureRole::Preparer => 1,
            SignatureRole::Proposer => 2,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            SignatureRole::Acceptor => "acceptor",
            SignatureRole::Preparer => "preparer",
            SignatureRole::Proposer => "proposer",
        }
    }

    /// Label printed above the signature cell.
    pub fn label(&self) -> &'static str {
        match self {
            SignatureRole::Acceptor => "Accepted by / Diterima Oleh",
            SignatureRole::Preparer => "Prepared by / Diajukan Oleh",
            SignatureRole::Proposer => "Proposed by / Diajukan Oleh",
        }
    }

    /// Form field holding the name/position caption of this signer.
    pub fn name_field(&self) -> &'static str {
        match self {
            SignatureRole::Acceptor => "approvedBy",
            SignatureRole::Preparer => "preparedBy",
            SignatureRole::Proposer => "verifiedBy",
        }
    }

    pub fn default_position(&self) -> &'static str {
        match self {
            SignatureRole::Acceptor => "Pit Geos/Operation BRE",
            SignatureRole::Preparer => "Engineering KPP",
            SignatureRole::Proposer => "Production KPP",
        }
    }
}

impl std::str::FromStr for SignatureRole {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "acceptor" | "accepted" | "bre" => Ok(SignatureRole::Acceptor),
            "preparer" | "prepared" | "engineering" => Ok(SignatureRole::Preparer),
            "proposer" | "proposed" | "production" => Ok(SignatureRole::Proposer),
            _ => Err(Error::UnknownRole(s.to_string())),
        }
    }
}

// ============================================
// ヘッダー情報
// ============================================

pub const FIELD_DATE: &str = "date";
pub const FIELD_TIME: &str = "time";
pub const FIELD_DAY: &str = "day";
pub const FIELD_PROJECT: &str = "project";
pub const FIELD_PIT: &str = "pit";
pub const FIELD_BLOCK: &str = "block";
pub const FIELD_SEAM: &str = "seam";
pub const FIELD_RL: &str = "rl";
pub const FIELD_PREPARED_BY: &str = "preparedBy";
pub const FIELD_VERIFIED_BY: &str = "verifiedBy";
pub const FIELD_APPROVED_BY: &str = "approvedBy";
pub const FIELD_NOTES: &str = "notes";
pub const FIELD_RECOMMENDATIONS: &str = "recommendations";
pub const FIELD_PHOTO_NOTE: &str = "photoNote";

/// フォーム画面に並べる既知のフィールド（キー, ラベル）
pub const KNOWN_FIELDS: &[(&str, &str)] = &[
    (FIELD_DATE, "Date"),
    (FIELD_TIME, "Time"),
    (FIELD_DAY, "Day"),
    (FIELD_PROJECT, "Project"),
    (FIELD_PIT, "Pit"),
    (FIELD_BLOCK, "Block"),
    (FIELD_SEAM, "Seam"),
    (FIELD_RL, "RL"),
    (FIELD_PREPARED_BY, "Prepared by"),
    (FIELD_VERIFIED_BY, "Verified by"),
    (FIELD_APPROVED_BY, "Approved by"),
    (FIELD_NOTES, "Notes"),
    (FIELD_RECOMMENDATIONS, "Recommendations"),
    (FIELD_PHOTO_NOTE, "Photo note"),
];

/// Free-text metadata. No cross-field validation, unknown keys are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormFields(BTreeMap<String, String>);

impl Default for FormFields {
    fn default() -> Self {
        let mut fields = BTreeMap::new();
        for (key, _) in KNOWN_FIELDS {
            fields.insert(key.to_string(), String::new());
        }
        fields.insert(FIELD_PROJECT.to_string(), "PT BRE – PT KPP RANTAU".to_string());
        for role in SignatureRole::ALL {
            fields.insert(role.name_field().to_string(), role.default_position().to_string());
        }
        Self(fields)
    }
}

impl FormFields {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// 未設定は空文字
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or("")
    }

    /// Trimmed value, `None` when blank.
    pub fn value(&self, name: &str) -> Option<&str> {
        let value = self.get(name).trim();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlay `other` on top of these fields (non-empty values win).
    pub fn merge(&mut self, other: &FormFields) {
        for (key, value) in other.iter() {
            if !value.is_empty() {
                self.set(key, value);
            }
        }
    }
}

impl From<BTreeMap<String, String>> for FormFields {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> ChecklistItem {
        ChecklistItem {
            id: id.to_string(),
            text: format!("text {}", id),
            subtext: format!("(sub {})", id),
        }
    }

    fn template(ids: &[&[&str]]) -> Template {
        Template {
            key: "test".to_string(),
            title: "Test".to_string(),
            subtitle: "Line 1\nLine 2".to_string(),
            groups: ids
                .iter()
                .enumerate()
                .map(|(i, group)| ChecklistGroup {
                    id: format!("G{}", i),
                    title: format!("Group {}", i),
                    items: group.iter().map(|id| item(id)).collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_status_serde_marks() {
        let json = serde_json::to_string(&[Status::Unset, Status::Yes, Status::No, Status::NotAvailable])
            .expect("シリアライズ失敗");
        assert_eq!(json, r#"["","Y","N","N/A"]"#);

        let parsed: Status = serde_json::from_str(r#""N/A""#).unwrap();
        assert_eq!(parsed, Status::NotAvailable);
    }

    #[test]
    fn test_status_mark_placeholder() {
        assert_eq!(Status::Unset.mark(), "-");
        assert_eq!(Status::Yes.mark(), "Y");
        assert!(!Status::Unset.is_set());
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("y".parse::<Status>().unwrap(), Status::Yes);
        assert_eq!("na".parse::<Status>().unwrap(), Status::NotAvailable);
        assert_eq!("".parse::<Status>().unwrap(), Status::Unset);
        assert!("maybe".parse::<Status>().is_err());
    }

    #[test]
    fn test_template_items_flatten_in_order() {
        let t = template(&[&["A1", "A2"], &["B1"]]);
        let ids: Vec<&str> = t.items().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A2", "B1"]);
        assert_eq!(t.item_count(), 3);
        assert!(t.contains_item("B1"));
        assert!(!t.contains_item("C1"));
    }

    #[test]
    fn test_template_validate_rejects_duplicates() {
        let t = template(&[&["A1"], &["A1"]]);
        let err = t.validate().unwrap_err();
        assert!(format!("{}", err).contains("duplicate item id 'A1'"));
    }

    #[test]
    fn test_template_validate_rejects_empty() {
        let t = template(&[]);
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_subtitle_lines() {
        let t = template(&[&["A1"]]);
        assert_eq!(t.subtitle_lines().collect::<Vec<_>>(), vec!["Line 1", "Line 2"]);
    }

    #[test]
    fn test_form_fields_defaults() {
        let fields = FormFields::default();
        assert_eq!(fields.get(FIELD_PREPARED_BY), "Engineering KPP");
        assert_eq!(fields.get(FIELD_APPROVED_BY), "Pit Geos/Operation BRE");
        assert_eq!(fields.value(FIELD_DATE), None);
        assert_eq!(fields.get("unknown"), "");
    }

    #[test]
    fn test_form_fields_merge_keeps_existing_on_blank() {
        let mut fields = FormFields::default();
        let mut overlay = FormFields::empty();
        overlay.set(FIELD_PIT, "Pit 3");
        overlay.set(FIELD_PROJECT, "");
        fields.merge(&overlay);
        assert_eq!(fields.get(FIELD_PIT), "Pit 3");
        assert_eq!(fields.get(FIELD_PROJECT), "PT BRE – PT KPP RANTAU");
    }

    #[test]
    fn test_signature_role_keys() {
        let json = serde_json::to_string(&SignatureRole::Preparer).unwrap();
        assert_eq!(json, r#""preparer""#);
        for (i, role) in SignatureRole::ALL.iter().enumerate() {
            assert_eq!(role.index(), i);
            assert_eq!(role.key().parse::<SignatureRole>().unwrap(), *role);
        }
    }
}

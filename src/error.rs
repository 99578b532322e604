use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignoffError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("テンプレートが見つかりません: {0}")]
    TemplateNotFound(String),

    #[error("チェック項目がテンプレートにありません: {0}")]
    UnknownItem(String),

    #[error("画像読み込みエラー: {0}")]
    ImageDecode(String),

    #[error("署名データが不正: {0}")]
    InvalidSignature(String),

    #[error("PDF生成エラー: {0}")]
    PdfGeneration(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] signoff_common::Error),
}

pub type Result<T> = std::result::Result<T, SignoffError>;

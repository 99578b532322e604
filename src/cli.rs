use clap::{Parser, Subcommand};
use crate::export::PdfQuality;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "coal-signoff")]
#[command(about = "Coal roof/floor 検査承認フォーム・PDF報告書ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// テンプレート一覧を表示
    Templates,

    /// 空のフォームJSONを作成
    Init {
        /// テンプレート (floor/roof/combined)
        #[arg(default_value = "floor")]
        template: String,

        /// 出力JSONファイル
        #[arg(short, long, default_value = "form.json")]
        output: PathBuf,
    },

    /// フォームJSONからPDFを生成
    Export {
        /// 入力JSONファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 出力ディレクトリ（省略時は設定値、なければカレント）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 出力日付 YYYY-MM-DD（省略時は今日）
        #[arg(long)]
        date: Option<String>,

        /// PDF画像品質 (high/medium/low)（省略時は設定値）
        #[arg(long)]
        pdf_quality: Option<PdfQuality>,
    },

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 左ロゴ画像
        #[arg(long)]
        logo_left: Option<PathBuf>,

        /// 右ロゴ画像
        #[arg(long)]
        logo_right: Option<PathBuf>,

        /// 既定の出力ディレクトリ
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// 既定のPDF画像品質
        #[arg(long)]
        pdf_quality: Option<PdfQuality>,
    },
}

use chrono::{Local, NaiveDate};
use clap::Parser;
use coal_signoff::{cli, config, error, export, form, logging};
use cli::{Cli, Commands};
use config::Config;
use error::{Result, SignoffError};
use signoff_common::{catalog, find_template};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Templates => {
            for template in catalog() {
                println!("{:<10} {} ({}項目)", template.key, template.title, template.item_count());
                for line in template.subtitle_lines() {
                    println!("{:<10} {}", "", line);
                }
            }
        }

        Commands::Init { template, output } => {
            let template =
                find_template(&template).ok_or(SignoffError::TemplateNotFound(template))?;
            let file = form::io::blank_form_file(template, &config.initial_fields());
            form::io::write_form_file(&output, &file)?;
            println!("✔ フォームを作成: {} ({})", output.display(), template.key);
        }

        Commands::Export { input, output, date, pdf_quality } => {
            println!("📄 coal-signoff - エクスポート\n");

            let date = match date {
                Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .map_err(|e| SignoffError::Config(format!("日付の形式が不正です ({}): {}", s, e)))?,
                None => Local::now().date_naive(),
            };
            let pdf_quality = pdf_quality.unwrap_or(config.pdf_quality);
            let output_dir = output.unwrap_or_else(|| config.output_dir());

            println!("[1/2] フォームを読み込み中...");
            let store = form::io::load_form_file(&input, config.initial_fields()).await?;
            println!("✔ {} : {}\n", store.template().key, store.summary());

            println!("[2/2] PDFを生成中... (品質: {})", pdf_quality);
            let path = export::export_report(&store, &config, &output_dir, date, pdf_quality)?;
            println!("✔ PDF出力: {}", path.display());

            println!("\n✅ エクスポート完了");
        }

        Commands::Config { show, logo_left, logo_right, output_dir, pdf_quality } => {
            let mut config = config;
            let mut changed = false;

            if let Some(path) = logo_left {
                config.logo_left = Some(path);
                changed = true;
            }
            if let Some(path) = logo_right {
                config.logo_right = Some(path);
                changed = true;
            }
            if let Some(dir) = output_dir {
                config.output_dir = Some(dir);
                changed = true;
            }
            if let Some(quality) = pdf_quality {
                config.pdf_quality = quality;
                changed = true;
            }
            if changed {
                config.save()?;
                println!("✔ 設定を保存しました: {}", Config::config_path()?.display());
            }

            if show || !changed {
                let path_or = |p: &Option<std::path::PathBuf>| {
                    p.as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "未設定".to_string())
                };
                println!("設定:");
                println!("  左ロゴ: {}", path_or(&config.logo_left));
                println!("  右ロゴ: {}", path_or(&config.logo_right));
                println!("  出力先: {}", config.output_dir().display());
                println!("  PDF品質: {}", config.pdf_quality);
                for (key, value) in &config.default_fields {
                    println!("  既定値 {}: {}", key, value);
                }
            }
        }
    }

    Ok(())
}

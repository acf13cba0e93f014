use anyhow::{bail, Context};
use clap::Parser;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use pricing_auto::{cli, config, export, loader, logging};
use pricing_auto_common::format::result_lines;
use pricing_auto_common::{FormulaBook, PricingEngine};
use cli::{Cli, Commands};
use config::Config;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    let config = Config::load().context("設定の読み込みに失敗")?;

    match cli.command {
        Commands::Query { pn, json } => {
            let pn = match pn {
                Some(pn) => pn,
                None => Input::<String>::new()
                    .with_prompt("PN")
                    .interact_text()
                    .context("PN の入力に失敗")?,
            };
            if pn.trim().is_empty() {
                bail!("PN が空です");
            }

            let loaded = loader::load_snapshot(&config).context("参照データのロードに失敗")?;
            let engine = PricingEngine::new(loaded.snapshot);
            let result = engine.query_one(&pn);

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                for line in result_lines(&result) {
                    println!("{}", line);
                }
                for warning in &result.warnings {
                    println!("⚠ {}", warning);
                }
            }
        }

        Commands::Batch { input, level, output, sequential } => {
            println!("📋 pricing-auto - 一括照会\n");

            // 1. PN リスト
            println!("[1/4] PN リストを読み込み中...");
            let pns = loader::read_pn_list(&input)
                .with_context(|| format!("PN リストを読み込めません: {}", input.display()))?;
            println!("✔ {}件の PN\n", pns.len());

            // 2. 参照データ
            println!("[2/4] 参照データをロード中...");
            let loaded = loader::load_snapshot(&config).context("参照データのロードに失敗")?;
            println!(
                "✔ 価格表 {} / {} 行\n",
                loaded.snapshot.primary.len(),
                loaded.snapshot.secondary.len()
            );
            let engine = PricingEngine::new(loaded.snapshot);

            // 3. 照会
            println!("[3/4] 照会中...");
            let bar = ProgressBar::new(pns.len() as u64);
            bar.set_style(
                ProgressStyle::with_template("{bar:40} {pos}/{len} {elapsed}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            let parallel = config.parallel_batch && !sequential;
            let outcome = engine.query_many_with_progress(&pns, parallel, || bar.inc(1));
            bar.finish_and_clear();
            println!(
                "✔ {}件中 見つからない {}件 / 分類不能 {}件 / 算出あり {}件\n",
                outcome.counts.total,
                outcome.counts.not_found,
                outcome.counts.unclassified,
                outcome.counts.calculated
            );

            // 4. 出力
            println!("[4/4] エクスポート中...");
            let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
            export::export_batch(&outcome, level, &output_dir).context("出力に失敗")?;

            if !outcome.warnings.is_empty() {
                println!("\n⚠ 警告 {}件（詳細は report.json）", outcome.warnings.len());
            }
            println!("\n✅ 完了");
        }

        Commands::Meta { json } => {
            let loaded = loader::load_snapshot(&config).context("参照データのロードに失敗")?;
            let meta = loaded.meta;

            if json {
                println!("{}", serde_json::to_string_pretty(&meta)?);
            } else {
                println!("参照データ:");
                println!("  ロード時刻: {}", meta.loaded_at);
                for file in &meta.files {
                    println!("  {}: {} ({}行, sha256 {})", file.role, file.path, file.rows, file.sha256);
                }
                println!("  公式テーブル: {}", meta.formula_source);
                println!("  フィンガープリント: {}", meta.fingerprint);
            }
        }

        Commands::Config { show, set_data_dir, set_mapping_dir, set_formula_file, dump_formulas } => {
            let mut config = config;

            if let Some(dir) = set_data_dir {
                config.set_data_dir(dir)?;
                println!("✔ 価格表ディレクトリを設定しました");
            }

            if let Some(dir) = set_mapping_dir {
                config.set_mapping_dir(dir)?;
                println!("✔ マッピング表ディレクトリを設定しました");
            }

            if let Some(path) = set_formula_file {
                // 読めない JSON は保存しない
                FormulaBook::from_file(&path)
                    .with_context(|| format!("公式テーブルが不正です: {}", path.display()))?;
                config.set_formula_file(path)?;
                println!("✔ 公式テーブルを設定しました");
            }

            if let Some(path) = dump_formulas {
                std::fs::write(&path, FormulaBook::builtin().to_json_pretty()?)?;
                println!("✔ 組み込み公式テーブルを出力: {}", path.display());
            }

            if show {
                println!("設定:");
                println!("  価格表: {}", config.resolved_data_dir().display());
                println!("  マッピング表: {}", config.resolved_mapping_dir().display());
                println!("  出力先: {}", config.output_dir.display());
                println!(
                    "  公式テーブル: {}",
                    config
                        .formula_file
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "組み込み".to_string())
                );
                println!("  並列バッチ: {}", if config.parallel_batch { "有効" } else { "無効" });
            }
        }
    }

    Ok(())
}

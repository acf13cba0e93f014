use clap::{Parser, Subcommand};
use pricing_auto_common::ExportLevel;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pricing-auto")]
#[command(about = "価格表照合・見積価格自動算出ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// PN を1件照会
    Query {
        /// 照会する PN（省略時は対話入力）
        pn: Option<String>,

        /// 結果を JSON で出力
        #[arg(long)]
        json: bool,
    },

    /// PN リストを一括照会して取込用 Excel を出力
    Batch {
        /// PN リスト (.txt / .csv / .xlsx / .xls)
        #[arg(required = true)]
        input: PathBuf,

        /// 出力レベル (country/country_customer)
        #[arg(short, long, default_value = "country")]
        level: ExportLevel,

        /// 出力ディレクトリ（デフォルト: 設定の output_dir）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 逐次実行（並列化しない）
        #[arg(long)]
        sequential: bool,
    },

    /// 参照データのメタ情報を表示
    Meta {
        /// JSON で出力
        #[arg(long)]
        json: bool,
    },

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 価格表ディレクトリを設定
        #[arg(long)]
        set_data_dir: Option<PathBuf>,

        /// マッピング表ディレクトリを設定
        #[arg(long)]
        set_mapping_dir: Option<PathBuf>,

        /// 公式テーブル JSON を設定
        #[arg(long)]
        set_formula_file: Option<PathBuf>,

        /// 組み込み公式テーブルを JSON で書き出す
        #[arg(long)]
        dump_formulas: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch_level() {
        let cli = Cli::parse_from(["pricing-auto", "batch", "pns.txt", "--level", "country_customer", "-v"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Batch { input, level, output, sequential } => {
                assert_eq!(input, PathBuf::from("pns.txt"));
                assert_eq!(level, ExportLevel::CountryCustomer);
                assert!(output.is_none());
                assert!(!sequential);
            }
            _ => panic!("batch expected"),
        }
    }

    #[test]
    fn test_query_pn_optional() {
        let cli = Cli::parse_from(["pricing-auto", "query"]);
        assert!(matches!(cli.command, Commands::Query { pn: None, json: false }));
    }
}

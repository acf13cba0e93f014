//! Excel生成（共通ライブラリ）
//!
//! 照会結果を取込用シートにし、見つからなかった PN を別シートに並べる。
//! 算出した価格セルは背景色で区別する。

use super::{ExportLevel, DESCRIPTIVE_COLUMNS};
use crate::format::{decimals_for, round_for_display};
use crate::types::{ComputationResult, FinalValues};
use rust_xlsxwriter::*;

const RESULT_SHEET: &str = "Prices";
const NOT_FOUND_SHEET: &str = "Not Found";

/// 説明列の値
fn descriptive_value<'a>(values: &'a FinalValues, column: &str) -> &'a str {
    let v = match column {
        "Part No." => Some(&values.part_no),
        "Series" => values.series.as_ref(),
        "External Model" => values.external_model.as_ref(),
        "Internal Model" => values.internal_model.as_ref(),
        "Sales Status" => values.sales_status.as_ref(),
        "Description" => values.description.as_ref(),
        _ => None,
    };
    v.map(|s| s.as_str()).unwrap_or("")
}

fn number_format(decimals: usize) -> &'static str {
    match decimals {
        0 => "0",
        2 => "0.00",
        _ => "0.0000",
    }
}

/// 価格シートをバッファに生成
///
/// # Arguments
/// * `results` - 照会結果（入力順）。not_found は価格シートに出さない
/// * `not_found` - 見つからなかった PN
/// * `level` - 出力する価格列
pub fn generate_price_workbook(
    results: &[ComputationResult],
    not_found: &[String],
    level: ExportLevel,
) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xD9E1F2))
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA));

    let text_format = Format::new()
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xCCCCCC));

    let price_fields = level.price_fields();

    {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(RESULT_SHEET)
            .map_err(|e| format!("シート名設定エラー: {}", e))?;

        let mut col: u16 = 0;
        for name in DESCRIPTIVE_COLUMNS {
            worksheet
                .write_string_with_format(0, col, name, &header_format)
                .map_err(|e| format!("ヘッダー書き込みエラー: {}", e))?;
            col += 1;
        }
        for field in price_fields {
            worksheet
                .write_string_with_format(0, col, field.column(), &header_format)
                .map_err(|e| format!("ヘッダー書き込みエラー: {}", e))?;
            col += 1;
        }
        worksheet
            .set_freeze_panes(1, 1)
            .map_err(|e| format!("ウィンドウ枠固定エラー: {}", e))?;

        let mut row: u32 = 1;
        for result in results.iter().filter(|r| !r.is_not_found()) {
            let values = &result.final_values;
            let mut col: u16 = 0;

            for name in DESCRIPTIVE_COLUMNS {
                worksheet
                    .write_string_with_format(row, col, descriptive_value(values, name), &text_format)
                    .map_err(|e| format!("値書き込みエラー: {}", e))?;
                col += 1;
            }

            for field in price_fields {
                if let Some(value) = values.prices.get(*field) {
                    let mut format = Format::new()
                        .set_num_format(number_format(decimals_for(value)))
                        .set_border(FormatBorder::Hair)
                        .set_border_color(Color::RGB(0xCCCCCC));
                    if result.is_calculated(*field) {
                        format = format.set_background_color(Color::RGB(0xFFF2CC));
                    }
                    worksheet
                        .write_number_with_format(row, col, round_for_display(value), &format)
                        .map_err(|e| format!("値書き込みエラー: {}", e))?;
                } else {
                    worksheet
                        .write_string_with_format(row, col, "", &text_format)
                        .map_err(|e| format!("値書き込みエラー: {}", e))?;
                }
                col += 1;
            }
            row += 1;
        }

        for c in 0..col_count(price_fields.len()) {
            let width = if c == 5 { 48.0 } else { 18.0 };
            worksheet
                .set_column_width(c, width)
                .map_err(|e| format!("列幅設定エラー: {}", e))?;
        }
    }

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(NOT_FOUND_SHEET)
        .map_err(|e| format!("シート名設定エラー: {}", e))?;
    worksheet
        .write_string_with_format(0, 0, "Part No.", &header_format)
        .map_err(|e| format!("ヘッダー書き込みエラー: {}", e))?;
    worksheet
        .set_column_width(0, 24.0)
        .map_err(|e| format!("列幅設定エラー: {}", e))?;
    for (i, pn) in not_found.iter().enumerate() {
        worksheet
            .write_string(i as u32 + 1, 0, pn)
            .map_err(|e| format!("値書き込みエラー: {}", e))?;
    }

    workbook
        .save_to_buffer()
        .map_err(|e| format!("Excel保存エラー: {}", e))
}

fn col_count(price_columns: usize) -> u16 {
    (DESCRIPTIVE_COLUMNS.len() + price_columns) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PriceField, QueryStatus};

    fn sample() -> ComputationResult {
        let mut result = ComputationResult::not_found("PN-1");
        result.status = QueryStatus::Ok;
        result.final_values.part_no = "PN-1".to_string();
        result.final_values.prices.set(PriceField::CostPrice, 12.5);
        result.final_values.prices.set(PriceField::LandedCost, 150.25);
        result.calculated_fields.insert(PriceField::LandedCost);
        result
    }

    #[test]
    fn test_generate_price_workbook_is_xlsx() {
        let buffer = generate_price_workbook(
            &[sample(), ComputationResult::not_found("PN-2")],
            &["PN-2".to_string()],
            ExportLevel::CountryCustomer,
        )
        .unwrap();
        // xlsx は zip コンテナ
        assert_eq!(&buffer[..2], b"PK");
    }

    #[test]
    fn test_descriptive_value() {
        let result = sample();
        assert_eq!(descriptive_value(&result.final_values, "Part No."), "PN-1");
        assert_eq!(descriptive_value(&result.final_values, "Description"), "");
    }
}

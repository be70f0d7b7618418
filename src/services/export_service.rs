use crate::dto::submission_dto::NormalizedSubmission;
use crate::error::Result;
use crate::models::submission::SubmissionId;
use crate::utils::time;
use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use rust_xlsxwriter::*;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const SHEET_NAME: &str = "Submissions";

/// Header and width (in characters) of every exported column, in order.
pub const COLUMNS: [(&str, f64); 10] = [
    ("ID", 8.0),
    ("Nama", 20.0),
    ("Kelas", 12.0),
    ("Kuis", 25.0),
    ("R1: Level", 30.0),
    ("R2: Kesadaran", 30.0),
    ("R3: Faktor Malas", 30.0),
    ("R4: Langkah Upgrade", 30.0),
    ("Target", 40.0),
    ("Tanggal Submit", 20.0),
];

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// Offset `created_at` is rendered in.
    pub utc_offset: FixedOffset,
}

impl ExportOptions {
    pub fn with_offset_hours(hours: i32) -> Self {
        let utc_offset = hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self { utc_offset }
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::with_offset_hours(7)
    }
}

pub struct ExportService;

impl ExportService {
    pub fn export_filename(date: NaiveDate) -> String {
        format!("submissions_{}.xlsx", date.format("%Y-%m-%d"))
    }

    /// Text of every cell after the ID column, in column order.
    pub fn row_cells(record: &NormalizedSubmission, options: &ExportOptions) -> [String; 9] {
        let s = &record.submission;
        [
            s.nama.clone().unwrap_or_default(),
            s.kelas.clone().unwrap_or_default(),
            record.skor_formatted.clone(),
            record.refleksi_1.clone(),
            record.refleksi_2.clone(),
            record.refleksi_3.clone(),
            record.refleksi_4.clone(),
            record.target_upgrade.clone(),
            s.created_at
                .map(|d| time::format_local(d, options.utc_offset))
                .unwrap_or_else(|| "-".to_string()),
        ]
    }

    /// Build a single-sheet workbook with one header row and one row per record.
    pub fn generate_submissions_xlsx(
        records: &[NormalizedSubmission],
        options: &ExportOptions,
    ) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        let header_bg = Color::RGB(0x0F172A);
        let alt_row_1 = Color::RGB(0xF8FAFC);
        let alt_row_2 = Color::White;
        let border_color = Color::RGB(0xE2E8F0);

        for (i, (_, width)) in COLUMNS.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(Color::White)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        worksheet.set_row_height(0, 24)?;
        for (i, (name, _)) in COLUMNS.iter().enumerate() {
            worksheet.write_string_with_format(0, i as u16, *name, &header_format)?;
        }

        for (idx, record) in records.iter().enumerate() {
            let row = 1 + idx as u32;
            let bg = if idx % 2 == 0 { alt_row_1 } else { alt_row_2 };

            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let center_fmt = base_fmt.clone().set_align(FormatAlign::Center);
            let wrap_fmt = base_fmt.clone().set_text_wrap();

            match &record.submission.id {
                SubmissionId::Number(n) => {
                    worksheet.write_number_with_format(row, 0, *n as f64, &center_fmt)?;
                }
                SubmissionId::Text(s) => {
                    worksheet.write_string_with_format(row, 0, s, &center_fmt)?;
                }
            }

            for (offset, text) in Self::row_cells(record, options).iter().enumerate() {
                let col = 1 + offset as u16;
                let fmt = match col {
                    2 | 9 => &center_fmt,
                    4..=8 => &wrap_fmt,
                    _ => &base_fmt,
                };
                worksheet.write_string_with_format(row, col, text, fmt)?;
            }
        }

        worksheet.set_freeze_panes(1, 0)?;
        let last_row = (records.len() as u32).max(1);
        worksheet.autofilter(0, 0, last_row, (COLUMNS.len() - 1) as u16)?;

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}

//! Excel export functionality.

use crate::entities::{attendance_records, students};
use crate::stats::StudentReportRow;
use chrono::Local;
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet, XlsxError};
use std::collections::HashMap;
use std::path::Path;

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x4472C4))
        .set_font_color(Color::White)
        .set_border(FormatBorder::Thin)
}

/// Write the header row and column widths.
fn write_headers(worksheet: &mut Worksheet, headers: &[(&str, f64)]) -> Result<(), XlsxError> {
    let format = header_format();
    for (col, (header, width)) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &format)?;
        worksheet.set_column_width(col as u16, *width)?;
    }
    Ok(())
}

/// Autofilter over the data and a frozen header row.
fn finish_sheet(worksheet: &mut Worksheet, rows: usize, last_col: u16) -> Result<(), XlsxError> {
    if rows > 0 {
        worksheet.autofilter(0, 0, rows as u32, last_col)?;
    }
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

/// Export a class report to Excel file.
/// One row per student with attendance, behavior and the evaluation composite.
pub fn export_class_report_to_excel(rows: &[StudentReportRow], path: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet.set_name("Class Report")?;

    let percent_format = Format::new().set_num_format("0.0");
    let score_format = Format::new().set_num_format("0.00");
    let risk_format = Format::new().set_bold().set_font_color(Color::RGB(0xC00000));

    let headers = [
        ("Name", 30.0),
        ("Class", 10.0),
        ("Present", 10.0),
        ("Absent", 10.0),
        ("Late", 8.0),
        ("Excused", 10.0),
        ("Attendance %", 14.0),
        ("Positive", 10.0),
        ("Negative", 10.0),
        ("Homework", 11.0),
        ("Activity", 10.0),
        ("Attendance", 12.0),
        ("Exam", 8.0),
        ("Total", 8.0),
        ("At Risk", 9.0),
    ];
    write_headers(worksheet, &headers)?;

    for (idx, report) in rows.iter().enumerate() {
        let row = (idx + 1) as u32;
        let attendance = &report.attendance;
        let evaluation = &report.evaluation;

        worksheet.write_string(row, 0, &report.name)?;
        worksheet.write_string(row, 1, &report.class_name)?;
        worksheet.write_number(row, 2, attendance.present as f64)?;
        worksheet.write_number(row, 3, attendance.absent as f64)?;
        worksheet.write_number(row, 4, attendance.late as f64)?;
        worksheet.write_number(row, 5, attendance.excused as f64)?;
        worksheet.write_number_with_format(row, 6, attendance.rate(), &percent_format)?;
        worksheet.write_number(row, 7, report.behavior.positive as f64)?;
        worksheet.write_number(row, 8, report.behavior.negative as f64)?;
        worksheet.write_number_with_format(row, 9, evaluation.homework, &score_format)?;
        worksheet.write_number_with_format(row, 10, evaluation.activity, &score_format)?;
        worksheet.write_number_with_format(row, 11, evaluation.attendance, &score_format)?;
        worksheet.write_number_with_format(row, 12, evaluation.exam, &score_format)?;
        worksheet.write_number_with_format(row, 13, evaluation.total, &score_format)?;
        if report.at_risk {
            worksheet.write_string_with_format(row, 14, "Yes", &risk_format)?;
        } else {
            worksheet.write_string(row, 14, "No")?;
        }
    }

    finish_sheet(worksheet, rows.len(), 14)?;

    workbook.save(path)?;
    Ok(())
}

/// Export attendance records to Excel file, one row per student per day.
pub fn export_attendance_to_excel(
    records: &[attendance_records::Model],
    roster: &[students::Model],
    path: &Path,
) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet.set_name("Attendance")?;

    let headers = [
        ("Date", 12.0),
        ("Name", 30.0),
        ("Class", 10.0),
        ("National ID", 15.0),
        ("Status", 10.0),
        ("Behavior", 10.0),
        ("Excuse", 35.0),
    ];
    write_headers(worksheet, &headers)?;

    let by_id: HashMap<&str, &students::Model> = roster.iter().map(|s| (s.id.as_str(), s)).collect();

    for (idx, record) in records.iter().enumerate() {
        let row = (idx + 1) as u32;
        let student = by_id.get(record.student_id.as_str());

        worksheet.write_string(row, 0, record.date.to_string())?;
        worksheet.write_string(row, 1, student.map(|s| s.name.as_str()).unwrap_or(&record.student_id))?;
        worksheet.write_string(row, 2, student.map(|s| s.class_name.as_str()).unwrap_or(""))?;
        worksheet.write_string(row, 3, student.map(|s| s.national_id.as_str()).unwrap_or(""))?;
        worksheet.write_string(row, 4, record.status.name())?;
        worksheet.write_string(row, 5, record.behavior_status.map(|b| b.name()).unwrap_or(""))?;
        worksheet.write_string(row, 6, record.excuse_note.as_deref().unwrap_or(""))?;
    }

    finish_sheet(worksheet, records.len(), 6)?;

    workbook.save(path)?;
    Ok(())
}

/// Generate default filename for export.
pub fn generate_export_filename(prefix: &str) -> String {
    let now = Local::now();
    format!("{prefix}_{ts}.xlsx", ts = now.format("%Y%m%d_%H%M%S"))
}

//! Platform-independent conversions used by the COM layer: OLE dates, Excel
//! error codes and file formats.

use chrono::{Duration, NaiveDate, NaiveDateTime};

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const MS_PER_DAY: f64 = 86_400_000.0;

fn ole_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// `VT_DATE` (days since 1899-12-30) to an ISO timestamp
pub fn ole_date_to_iso(days: f64) -> String {
    let millis = (days * MS_PER_DAY).round() as i64;
    (ole_epoch() + Duration::milliseconds(millis))
        .format(ISO_FORMAT)
        .to_string()
}

/// ISO timestamp (or bare date) to `VT_DATE`
pub fn iso_to_ole_date(text: &str) -> Option<f64> {
    let parsed = NaiveDateTime::parse_from_str(text, ISO_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    Some((parsed - ole_epoch()).num_milliseconds() as f64 / MS_PER_DAY)
}

/// Display text of an Excel `CVErr` code (the low word of the `VT_ERROR` scode)
pub fn excel_error_text(code: u32) -> String {
    match code {
        2000 => "#NULL!".to_string(),
        2007 => "#DIV/0!".to_string(),
        2015 => "#VALUE!".to_string(),
        2023 => "#REF!".to_string(),
        2029 => "#NAME?".to_string(),
        2036 => "#NUM!".to_string(),
        2042 => "#N/A".to_string(),
        other => format!("#ERR({other})"),
    }
}

/// `XlFileFormat` for a workbook path, by extension
pub fn workbook_format(path: &str) -> Option<i32> {
    let lower = path.to_lowercase();
    let ext = lower.rsplit_once('.').map(|(_, e)| e)?;
    match ext {
        "xlsx" => Some(51),
        "xlsm" => Some(52),
        "xlsb" => Some(50),
        "xls" => Some(56),
        "csv" => Some(6),
        _ => None,
    }
}

/// `ppSaveAsOpenXMLPresentation`
pub const PPT_SAVE_AS_PPTX: i32 = 24;

//! Date field rewriting for markdown documents.
//!
//! A document carries labelled date stamps such as `**작성일**: 2025년 01월 20일`
//! or `Date: 2025-08-21`. [`update_date_fields`] replaces the date part of
//! every known field with today's date in the field's own format and leaves
//! all other text untouched.

use chrono::NaiveDate;
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Textual date formats understood by the date command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `2026년 10월 18일`
    Kr,
    /// `2026-10-18`
    Iso,
    /// `2026.10.18`
    Dot,
    /// `2026/10/18`
    Slash,
    /// `October 18, 2026`
    Us,
}

impl DateFormat {
    pub const ALL: [DateFormat; 5] = [Self::Kr, Self::Iso, Self::Dot, Self::Slash, Self::Us];

    fn pattern(self) -> &'static str {
        match self {
            Self::Kr => "%Y년 %m월 %d일",
            Self::Iso => "%Y-%m-%d",
            Self::Dot => "%Y.%m.%d",
            Self::Slash => "%Y/%m/%d",
            Self::Us => "%B %d, %Y",
        }
    }

    /// Render a date in this format
    #[must_use]
    pub fn format(self, date: NaiveDate) -> String {
        date.format(self.pattern()).to_string()
    }

    /// Parse a format name (`kr`, `iso`, `dot`, `slash`, `us`)
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "kr" => Some(Self::Kr),
            "iso" => Some(Self::Iso),
            "dot" => Some(Self::Dot),
            "slash" => Some(Self::Slash),
            "us" => Some(Self::Us),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Kr => "kr",
            Self::Iso => "iso",
            Self::Dot => "dot",
            Self::Slash => "slash",
            Self::Us => "us",
        }
    }
}

impl std::fmt::Display for DateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Date Field Table
// ============================================================================

/// Korean long date, e.g. `2025년 1월 20일` (inner spaces optional)
const KR_DATE: &str = r"\d{4}년\s*\d{1,2}월\s*\d{1,2}일";

/// One labelled date field.
///
/// `pattern` must define the named groups `prefix` and `date`, and may
/// define `suffix`; only `date` is replaced.
#[derive(Debug)]
pub struct DateField {
    pub name: &'static str,
    pub pattern: String,
    pub format: DateFormat,
}

impl DateField {
    fn korean(name: &'static str, label: &str) -> Self {
        Self {
            name,
            pattern: format!(r"(?P<prefix>\*\*{label}\*\*:\s*)(?P<date>{KR_DATE})"),
            format: DateFormat::Kr,
        }
    }
}

/// The fixed table of recognised date fields.
#[must_use]
pub fn date_fields() -> Vec<DateField> {
    vec![
        DateField::korean("작성일", "작성일"),
        DateField::korean("작성 일자", "작성 일자"),
        DateField {
            name: "완료일",
            pattern: format!(r"(?m)(?P<prefix>^-\s*\*\*완료일\*\*:\s*)(?P<date>{KR_DATE})"),
            format: DateFormat::Kr,
        },
        DateField::korean("수정일", "수정일"),
        DateField::korean("보류 일자", "보류 일자"),
        DateField::korean("취소 일자", "취소 일자"),
        DateField {
            name: "오늘",
            pattern: r"(?P<prefix>###\s*오늘\s*\()(?P<date>\d{4}\.\d{2}\.\d{2})(?P<suffix>\))"
                .to_string(),
            format: DateFormat::Dot,
        },
        DateField {
            name: "Date",
            pattern: r"(?P<prefix>Date:\s*)(?P<date>\d{4}-\d{2}-\d{2})".to_string(),
            format: DateFormat::Iso,
        },
    ]
}

fn compiled_fields() -> &'static [(DateField, Regex)] {
    static FIELDS: OnceLock<Vec<(DateField, Regex)>> = OnceLock::new();
    FIELDS.get_or_init(|| {
        date_fields()
            .into_iter()
            .filter_map(|field| match Regex::new(&field.pattern) {
                Ok(re) => Some((field, re)),
                Err(e) => {
                    warn!("Skipping date field '{}': {}", field.name, e);
                    None
                }
            })
            .collect()
    })
}

/// Result of rewriting a document's date fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRewrite {
    pub content: String,
    /// Names of fields whose text changed
    pub fields: Vec<&'static str>,
}

/// Replace every known date field in `content` with `today`.
#[must_use]
pub fn update_date_fields(content: &str, today: NaiveDate) -> DateRewrite {
    let mut current = content.to_string();
    let mut fields = Vec::new();

    for (field, re) in compiled_fields() {
        let stamp = field.format.format(today);
        let replaced = re.replace_all(&current, |caps: &Captures<'_>| {
            format!(
                "{}{}{}",
                &caps["prefix"],
                stamp,
                caps.name("suffix").map_or("", |m| m.as_str())
            )
        });
        if replaced != current {
            debug!("Updated date field '{}'", field.name);
            current = replaced.into_owned();
            fields.push(field.name);
        }
    }

    DateRewrite {
        content: current,
        fields,
    }
}

/// Outcome of updating one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateUpdateOutcome {
    /// The file was rewritten
    Updated { fields: Vec<&'static str> },
    /// Nothing to change; the file was left as is
    Unchanged,
    /// The file does not exist
    Missing,
}

/// Rewrite the date fields of a file in place.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read as UTF-8 or
/// cannot be written back.
pub fn update_file(path: &Path, today: NaiveDate) -> Result<DateUpdateOutcome> {
    if !path.exists() {
        warn!("File does not exist: {}", path.display());
        return Ok(DateUpdateOutcome::Missing);
    }

    let content = fs::read_to_string(path)?;
    let rewrite = update_date_fields(&content, today);

    if rewrite.content == content {
        return Ok(DateUpdateOutcome::Unchanged);
    }

    fs::write(path, &rewrite.content)?;
    info!(
        "Updated {} date field(s) in {}",
        rewrite.fields.len(),
        path.display()
    );
    Ok(DateUpdateOutcome::Updated {
        fields: rewrite.fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_formats() {
        let d = today();
        assert_eq!(DateFormat::Kr.format(d), "2026년 10월 18일");
        assert_eq!(DateFormat::Iso.format(d), "2026-10-18");
        assert_eq!(DateFormat::Dot.format(d), "2026.10.18");
        assert_eq!(DateFormat::Slash.format(d), "2026/10/18");
        assert_eq!(DateFormat::Us.format(d), "October 18, 2026");
    }

    #[test]
    fn test_format_pads_single_digits() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(DateFormat::Kr.format(d), "2026년 03월 05일");
        assert_eq!(DateFormat::Us.format(d), "March 05, 2026");
    }

    #[test]
    fn test_from_name() {
        for format in DateFormat::ALL {
            assert_eq!(DateFormat::from_name(format.name()), Some(format));
        }
        assert_eq!(DateFormat::from_name("KR"), None);
        assert_eq!(DateFormat::from_name("notes.md"), None);
    }

    #[test]
    fn test_each_field_is_rewritten() {
        let cases = [
            (
                "- **작성일**: 2025년 01월 20일\n",
                "- **작성일**: 2026년 10월 18일\n",
            ),
            (
                "- **작성 일자**: 2025년 1월 2일\n",
                "- **작성 일자**: 2026년 10월 18일\n",
            ),
            (
                "intro\n- **완료일**: 2025년 01월 20일\n",
                "intro\n- **완료일**: 2026년 10월 18일\n",
            ),
            (
                "**수정일**:2025년01월20일 end",
                "**수정일**:2026년 10월 18일 end",
            ),
            (
                "- **보류 일자**: 2025년 01월 20일",
                "- **보류 일자**: 2026년 10월 18일",
            ),
            (
                "- **취소 일자**: 2025년 12월 31일 (사유)",
                "- **취소 일자**: 2026년 10월 18일 (사유)",
            ),
            ("### 오늘 (2025.08.21)\n", "### 오늘 (2026.10.18)\n"),
            ("Date: 2025-08-21\n", "Date: 2026-10-18\n"),
        ];

        for (input, expected) in cases {
            let rewrite = update_date_fields(input, today());
            assert_eq!(rewrite.content, expected, "input: {input}");
            assert_eq!(rewrite.fields.len(), 1, "input: {input}");
        }
    }

    #[test]
    fn test_completion_field_needs_line_start() {
        let input = "note - **완료일**: 2025년 01월 20일";
        let rewrite = update_date_fields(input, today());
        assert_eq!(rewrite.content, input);
        assert!(rewrite.fields.is_empty());
    }

    #[test]
    fn test_surrounding_text_untouched() {
        let input = concat!(
            "# 휴가 관리\n\n",
            "- **작성일**: 2025년 01월 20일\n",
            "- 담당: 홍길동\n\n",
            "Date: 2024-01-01 and more\n",
        );
        let rewrite = update_date_fields(input, today());
        assert_eq!(
            rewrite.content,
            concat!(
                "# 휴가 관리\n\n",
                "- **작성일**: 2026년 10월 18일\n",
                "- 담당: 홍길동\n\n",
                "Date: 2026-10-18 and more\n",
            )
        );
        assert_eq!(rewrite.fields, vec!["작성일", "Date"]);
    }

    #[test]
    fn test_current_dates_report_no_fields() {
        let input = "Date: 2026-10-18\n";
        let rewrite = update_date_fields(input, today());
        assert_eq!(rewrite.content, input);
        assert!(rewrite.fields.is_empty());
    }

    #[test]
    fn test_update_file_unchanged_is_byte_identical() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.md");
        let original = "# Notes\n\nNothing dated here.\r\n";
        fs::write(&path, original).unwrap();

        let outcome = update_file(&path, today()).unwrap();
        assert_eq!(outcome, DateUpdateOutcome::Unchanged);
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_update_file_rewrites_in_place() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("report.md");
        fs::write(&path, "### 오늘 (2025.08.21)\n").unwrap();

        let outcome = update_file(&path, today()).unwrap();
        assert_eq!(outcome, DateUpdateOutcome::Updated { fields: vec!["오늘"] });
        assert_eq!(fs::read_to_string(&path).unwrap(), "### 오늘 (2026.10.18)\n");
    }

    #[test]
    fn test_update_file_missing() {
        let temp = TempDir::new().unwrap();
        let outcome = update_file(&temp.path().join("nope.md"), today()).unwrap();
        assert_eq!(outcome, DateUpdateOutcome::Missing);
    }
}

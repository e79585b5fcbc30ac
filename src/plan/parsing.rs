//! Line-oriented checkbox scanning and rewriting.
//!
//! A checkbox line is optional indentation, `-`, whitespace, `[ ]`, `[x]` or
//! `[X]`, whitespace, then non-empty text. Rewrites only ever touch the body
//! of the targeted lines; line endings and every other byte are preserved.

use chrono::NaiveDate;

/// Markers that flag an unchecked task as being worked on
pub const IN_PROGRESS_MARKERS: &[&str] = &["🔄", "진행중"];

/// Stamp prefix appended to lines this tool checks off
pub const DONE_STAMP: &str = "✅ (";

// ============================================================================
// Checkbox Scanning
// ============================================================================

/// A single checkbox line found in markdown content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkbox {
    /// Zero-based line index within the content
    pub line: usize,
    /// Leading whitespace before the dash
    pub indent: String,
    pub checked: bool,
    /// Text after the box, trailing whitespace removed
    pub text: String,
}

impl Checkbox {
    /// Task text before any in-progress marker, if this is an unchecked
    /// line carrying one.
    #[must_use]
    pub fn in_progress_task(&self) -> Option<&str> {
        if self.checked {
            return None;
        }
        let cut = IN_PROGRESS_MARKERS
            .iter()
            .filter_map(|marker| self.text.find(marker))
            .min()?;
        let task = self.text[..cut].trim_end();
        if task.is_empty() {
            None
        } else {
            Some(task)
        }
    }

    /// Date stamped by a previous `✅ (YYYY.MM.DD …)` suffix, if any.
    #[must_use]
    pub fn done_date(&self) -> Option<NaiveDate> {
        let start = self.text.find(DONE_STAMP)? + DONE_STAMP.len();
        let candidate = char_prefix(&self.text[start..], 10);
        NaiveDate::parse_from_str(candidate, "%Y.%m.%d").ok()
    }
}

/// Parse one line (without its terminator) into `(indent, checked, text)`.
#[must_use]
pub fn parse_checkbox_line(line: &str) -> Option<(&str, bool, &str)> {
    let body = line.trim_start();
    let indent = &line[..line.len() - body.len()];

    let after_dash = body.strip_prefix('-')?;
    let after_space = after_dash.trim_start();
    if after_space.len() == after_dash.len() {
        return None;
    }

    let (checked, rest) = if let Some(rest) = after_space.strip_prefix("[ ]") {
        (false, rest)
    } else if let Some(rest) = after_space
        .strip_prefix("[x]")
        .or_else(|| after_space.strip_prefix("[X]"))
    {
        (true, rest)
    } else {
        return None;
    };

    let text = rest.trim_start();
    if text.len() == rest.len() {
        return None;
    }
    let text = text.trim_end();
    if text.is_empty() {
        return None;
    }
    Some((indent, checked, text))
}

/// Scan markdown content for checkbox lines, top to bottom.
#[must_use]
pub fn scan_checkboxes(content: &str) -> Vec<Checkbox> {
    content
        .split_inclusive('\n')
        .enumerate()
        .filter_map(|(line, segment)| {
            let (body, _) = split_terminator(segment);
            parse_checkbox_line(body).map(|(indent, checked, text)| Checkbox {
                line,
                indent: indent.to_string(),
                checked,
                text: text.to_string(),
            })
        })
        .collect()
}

/// Texts of unchecked checkboxes.
#[must_use]
pub fn pending_tasks(content: &str) -> Vec<String> {
    scan_checkboxes(content)
        .into_iter()
        .filter(|c| !c.checked)
        .map(|c| c.text)
        .collect()
}

/// Checked checkboxes.
#[must_use]
pub fn completed_tasks(content: &str) -> Vec<Checkbox> {
    scan_checkboxes(content)
        .into_iter()
        .filter(|c| c.checked)
        .collect()
}

/// Task texts of unchecked checkboxes carrying an in-progress marker.
#[must_use]
pub fn in_progress_tasks(content: &str) -> Vec<String> {
    scan_checkboxes(content)
        .iter()
        .filter_map(|c| c.in_progress_task().map(str::to_string))
        .collect()
}

// ============================================================================
// Rewriting
// ============================================================================

/// Check off unchecked lines whose text satisfies `matches`, appending
/// `stamp` after the text.
///
/// At most `limit` lines are rewritten when a limit is given. Returns the
/// new content and the number of rewritten lines, or `None` when nothing
/// matched.
pub fn check_matching<F>(
    content: &str,
    mut matches: F,
    stamp: &str,
    limit: Option<usize>,
) -> Option<(String, usize)>
where
    F: FnMut(&str) -> bool,
{
    let mut output = String::with_capacity(content.len() + stamp.len());
    let mut rewritten = 0usize;

    for segment in content.split_inclusive('\n') {
        let (body, terminator) = split_terminator(segment);
        let under_limit = limit.map_or(true, |max| rewritten < max);

        match parse_checkbox_line(body) {
            Some((indent, false, text)) if under_limit && matches(text) => {
                output.push_str(&checked_line(indent, text, stamp));
                output.push_str(terminator);
                rewritten += 1;
            }
            _ => output.push_str(segment),
        }
    }

    (rewritten > 0).then_some((output, rewritten))
}

/// Render a checked line.
#[must_use]
pub fn checked_line(indent: &str, text: &str, stamp: &str) -> String {
    format!("{indent}- [x] {text} {stamp}")
}

/// First `n` characters of `text` (characters, not bytes).
#[must_use]
pub fn char_prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn split_terminator(segment: &str) -> (&str, &str) {
    if let Some(body) = segment.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = segment.strip_suffix('\n') {
        (body, "\n")
    } else {
        (segment, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = "\
# Leave plan

## Phase 1
- [x] Set up leave tables ✅ (2026.10.01 완료)
- [ ] Excel export for admins
  - [ ] Virtual scroll list 🔄
- [ ] Charts dashboard 진행중
-[ ] not a checkbox
- [] also not
- [ ]
* [ ] star bullets are ignored
";

    #[test]
    fn test_parse_checkbox_line_variants() {
        assert_eq!(
            parse_checkbox_line("- [ ] Write tests"),
            Some(("", false, "Write tests"))
        );
        assert_eq!(
            parse_checkbox_line("  - [X] Done  "),
            Some(("  ", true, "Done"))
        );
        assert_eq!(parse_checkbox_line("-[ ] x"), None);
        assert_eq!(parse_checkbox_line("- [ ]x"), None);
        assert_eq!(parse_checkbox_line("- [ ]  "), None);
        assert_eq!(parse_checkbox_line("- [-] cancelled"), None);
    }

    #[test]
    fn test_scan_checkboxes() {
        let boxes = scan_checkboxes(PLAN);
        assert_eq!(boxes.len(), 4);
        assert_eq!(boxes[0].line, 3);
        assert!(boxes[0].checked);
        assert_eq!(boxes[2].indent, "  ");
        assert_eq!(boxes[2].text, "Virtual scroll list 🔄");
    }

    #[test]
    fn test_task_views() {
        assert_eq!(
            pending_tasks(PLAN),
            vec![
                "Excel export for admins",
                "Virtual scroll list 🔄",
                "Charts dashboard 진행중"
            ]
        );
        assert_eq!(completed_tasks(PLAN).len(), 1);
        assert_eq!(
            in_progress_tasks(PLAN),
            vec!["Virtual scroll list", "Charts dashboard"]
        );
    }

    #[test]
    fn test_in_progress_requires_text_before_marker() {
        assert!(in_progress_tasks("- [ ] 🔄 later\n").is_empty());
        assert!(in_progress_tasks("- [x] Done 🔄\n").is_empty());
    }

    #[test]
    fn test_done_date() {
        let boxes = completed_tasks(PLAN);
        assert_eq!(
            boxes[0].done_date(),
            NaiveDate::from_ymd_opt(2026, 10, 1)
        );

        let plain = completed_tasks("- [x] No stamp\n");
        assert_eq!(plain[0].done_date(), None);
    }

    #[test]
    fn test_check_matching_first_only() {
        let content = "- [ ] Export to Excel\n- [ ] Export to Excel again\n";
        let (updated, count) =
            check_matching(content, |t| t.starts_with("Export"), "✅", Some(1)).unwrap();

        assert_eq!(count, 1);
        assert_eq!(
            updated,
            "- [x] Export to Excel ✅\n- [ ] Export to Excel again\n"
        );
    }

    #[test]
    fn test_check_matching_all_and_untouched_lines() {
        let content = "intro\r\n- [ ] alpha task\r\n- [ ] beta\r\n  - [ ] alpha two";
        let (updated, count) =
            check_matching(content, |t| t.contains("alpha"), "done", None).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            updated,
            "intro\r\n- [x] alpha task done\r\n- [ ] beta\r\n  - [x] alpha two done"
        );
    }

    #[test]
    fn test_check_matching_skips_checked_lines() {
        let content = "- [x] alpha\n";
        assert!(check_matching(content, |t| t.contains("alpha"), "s", None).is_none());
    }

    #[test]
    fn test_char_prefix_counts_characters() {
        assert_eq!(char_prefix("휴가 엑셀 내보내기", 2), "휴가");
        assert_eq!(char_prefix("short", 50), "short");
        assert_eq!(char_prefix("", 3), "");
    }
}

//! CLI theme and styling.

use colored::Colorize;

const BOX_WIDTH: usize = 72;
const BOX_INNER: usize = BOX_WIDTH - 2;
const BOX_TEXT: usize = BOX_WIDTH - 4;

/// CLI theme configuration.
pub(crate) struct Theme;

impl Theme {
    /// Format a header.
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    /// Format a success message.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {}", "✓".green(), text)
    }

    /// Format an error message.
    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "✗".red(), text.red())
    }

    /// Format a warning message.
    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow(), text.yellow())
    }

    /// Format a dimmed message.
    pub(crate) fn dimmed(text: &str) -> String {
        format!("{}", text.dimmed())
    }

    /// Format a key-value pair.
    pub(crate) fn kv(key: &str, value: &str) -> String {
        format!("{}: {}", key.bold(), value)
    }

    /// Draw a red box around an approval prompt.
    pub(crate) fn approval_box(title: &str, content: &str) -> String {
        let top = format!("╭{}╮", "─".repeat(BOX_INNER));
        let bottom = format!("╰{}╯", "─".repeat(BOX_INNER));
        let empty = format!("│{:w$}│", "", w = BOX_INNER);

        let pad_line = |text: &str| -> String {
            let visible_len = strip_ansi(text).chars().count();
            let padding = BOX_TEXT.saturating_sub(visible_len);
            format!("│ {text}{:p$} │", "", p = padding)
        };

        let mut lines = vec![
            top.red().to_string(),
            pad_line(&title.bold().to_string()),
            empty.red().to_string(),
        ];
        lines.extend(content.lines().map(pad_line));
        lines.push(bottom.red().to_string());
        lines.join("\n")
    }
}

/// Strip ANSI escape codes from a string for visible-length calculation.
fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut in_escape = false;
    for c in s.chars() {
        if in_escape {
            if c.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if c == '\x1b' {
            in_escape = true;
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1;31mDROP\x1b[0m"), "DROP");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[test]
    fn test_box_lines_are_aligned() {
        colored::control::set_override(false);
        let rendered = Theme::approval_box("Approval Required", "Project: proj\nQuery:");
        let widths: Vec<usize> = rendered.lines().map(|l| l.chars().count()).collect();
        assert!(widths.iter().all(|w| *w == BOX_WIDTH), "{widths:?}");
    }
}

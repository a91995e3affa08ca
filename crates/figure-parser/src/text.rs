//! Normalization of triple-quoted string bodies.

/// Turn the raw body of a `"""` string into its value.
///
/// Leading and trailing whitespace is trimmed, lines after the first lose
/// their indentation, runs of two or more horizontal whitespace characters
/// collapse to one space, and backslash escapes are processed.
pub(crate) fn normalize_multiline(raw: &str) -> String {
    let lines: Vec<String> = raw
        .trim()
        .lines()
        .enumerate()
        .map(|(index, line)| {
            let line = if index == 0 { line } else { line.trim_start() };
            collapse_whitespace(line.trim_end())
        })
        .collect();

    unescape(&lines.join("\n"))
}

/// Collapse runs of two or more spaces or tabs into one space.
fn collapse_whitespace(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    // Pending whitespace run: its first character and its length.
    let mut run: Option<(char, usize)> = None;

    for ch in line.chars() {
        if ch == ' ' || ch == '\t' {
            run = Some(match run {
                Some((first, len)) => (first, len + 1),
                None => (ch, 1),
            });
            continue;
        }
        match run.take() {
            Some((first, 1)) => out.push(first),
            Some(_) => out.push(' '),
            None => {}
        }
        out.push(ch);
    }
    out
}

/// Process backslash escapes the way quoted strings do.
///
/// Unknown escapes yield the escaped character; a trailing backslash is kept.
pub(crate) fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_and_dedent() {
        let raw = "\n    first line\n    second line\n      third\n";

        assert_eq!(normalize_multiline(raw), "first line\nsecond line\nthird");
    }

    #[test]
    fn test_collapse_whitespace_runs() {
        assert_eq!(normalize_multiline("a    b\t\tc d"), "a b c d");
    }

    #[test]
    fn test_escapes_processed() {
        assert_eq!(normalize_multiline(r#"say \"hi\"\tthere"#), "say \"hi\"\tthere");
        assert_eq!(unescape(r"a\\b\%"), r"a\b%");
        assert_eq!(unescape("end\\"), "end\\");
    }

    #[test]
    fn test_single_line() {
        assert_eq!(normalize_multiline("  just text  "), "just text");
    }

    #[test]
    fn test_blank_lines_kept() {
        assert_eq!(normalize_multiline("one\n\n  two"), "one\n\ntwo");
    }
}

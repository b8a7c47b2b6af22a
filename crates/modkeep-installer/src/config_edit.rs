//! Editing for ini-style config files. Section and key matching is ASCII
//! case-insensitive; line content other than the edited key is left as
//! written. Output always uses `\n` line endings with one trailing newline,
//! so CRLF input is normalized on the first edit.

/// Sets `key` to `value` inside `[section]`, returning the new file text.
/// Replaces the key in place when present, appends it to an existing
/// section otherwise, and appends a new section at the end when the section
/// is missing.
pub fn set_config_value(text: &str, section: &str, key: &str, value: &str) -> String {
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    let section_fold = section.trim().to_ascii_lowercase();
    let key_fold = key.trim().to_ascii_lowercase();

    let mut in_target_section = false;
    let mut section_end: Option<usize> = None;
    let mut replace_at: Option<(usize, String)> = None;
    for (index, line) in lines.iter().enumerate() {
        if let Some(name) = section_header(line) {
            if in_target_section {
                break;
            }
            in_target_section = name == section_fold;
            if in_target_section {
                section_end = Some(index + 1);
            }
            continue;
        }

        if !in_target_section {
            continue;
        }
        if !line.trim().is_empty() {
            section_end = Some(index + 1);
        }
        if let Some((existing_key, _)) = split_key_line(line) {
            if existing_key.to_ascii_lowercase() == key_fold {
                replace_at = Some((index, existing_key.to_string()));
                break;
            }
        }
    }

    if let Some((index, existing_key)) = replace_at {
        lines[index] = format!("{existing_key}={value}");
        return render(lines);
    }

    match section_end {
        Some(end) => {
            lines.insert(end, format!("{key}={value}"));
        }
        None => {
            if !lines.is_empty() && !lines.last().map(|line| line.is_empty()).unwrap_or(true) {
                lines.push(String::new());
            }
            lines.push(format!("[{section}]"));
            lines.push(format!("{key}={value}"));
        }
    }
    render(lines)
}

/// Reads the current value of `key` in `[section]`, if any.
pub fn read_config_value(text: &str, section: &str, key: &str) -> Option<String> {
    let section_fold = section.trim().to_ascii_lowercase();
    let key_fold = key.trim().to_ascii_lowercase();

    let mut in_target_section = false;
    for line in text.lines() {
        if let Some(name) = section_header(line) {
            if in_target_section {
                return None;
            }
            in_target_section = name == section_fold;
            continue;
        }
        if !in_target_section {
            continue;
        }
        if let Some((existing_key, existing_value)) = split_key_line(line) {
            if existing_key.to_ascii_lowercase() == key_fold {
                return Some(existing_value.to_string());
            }
        }
    }
    None
}

fn section_header(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('[')?.strip_suffix(']')?;
    Some(inner.trim().to_ascii_lowercase())
}

fn split_key_line(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
        return None;
    }
    let (key, value) = trimmed.split_once('=')?;
    Some((key.trim(), value.trim()))
}

fn render(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

//! C identifier and data-literal formatting for generated source sections.

/// Case of the generated identifier body (the prefix is used verbatim).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentCase {
    UpperSnake,
    LowerSnake,
}

/// Turns an arbitrary asset name into a C identifier: characters outside
/// `[a-zA-Z0-9_]` become separators, camelCase boundaries split, and the
/// result is snake-cased in the requested case behind `prefix`.
pub fn ident(prefix: &str, name: &str, case: IdentCase) -> String {
    let mut body = String::with_capacity(name.len());
    let mut pending_separator = false;
    let mut prev_lower_or_digit = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if ch == '_' {
                pending_separator = true;
                prev_lower_or_digit = false;
                continue;
            }
            if pending_separator && !body.is_empty() {
                body.push('_');
            }
            pending_separator = false;
            if ch.is_ascii_uppercase() && prev_lower_or_digit && !body.is_empty() {
                body.push('_');
            }
            body.push(ch);
            prev_lower_or_digit = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        } else {
            pending_separator = true;
            prev_lower_or_digit = false;
        }
    }

    let body = match case {
        IdentCase::UpperSnake => body.to_ascii_uppercase(),
        IdentCase::LowerSnake => body.to_ascii_lowercase(),
    };

    format!("{prefix}{body}")
}

/// Formats bytes as a C array body: hex literals, 16 per line, each line
/// indented with a tab, closed with a trailing newline.
pub fn dump_bytes(data: &[u8]) -> String {
    const PER_LINE: usize = 16;

    let mut result = String::with_capacity(data.len() * 6 + data.len() / PER_LINE * 2 + 2);
    for (index, value) in data.iter().enumerate() {
        if index > 0 {
            result.push(',');
        }
        if index % PER_LINE == 0 {
            result.push_str("\n\t");
        } else {
            result.push(' ');
        }
        result.push_str(&format!("0x{value:02x}"));
    }
    result.push('\n');
    result
}

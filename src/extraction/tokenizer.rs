/// Splits a command line into tokens using POSIX shell quoting rules.
///
/// Whitespace separates tokens. Single quotes preserve their content
/// literally; double quotes allow `\` to escape `"`, `\`, `$` and `` ` ``;
/// outside quotes `\` escapes any character. Adjacent quoted and unquoted
/// runs join into one token, so `'A'B` is the single token `AB`.
///
/// Malformed input never fails: an unterminated quote takes the rest of the
/// line literally, and a trailing lone `\` is kept as-is.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // A token can be empty (`''`), so presence is tracked separately.
    let mut in_token = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '\'' => {
                in_token = true;
                if !read_single_quoted(&mut chars, &mut current) {
                    break;
                }
            }
            '"' => {
                in_token = true;
                if !read_double_quoted(&mut chars, &mut current) {
                    break;
                }
            }
            '\\' => {
                in_token = true;
                match chars.next() {
                    Some(next) => current.push(next),
                    None => current.push('\\'),
                }
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }

    if in_token {
        tokens.push(current);
    }
    tokens
}

/// Reads up to the closing `'`. Returns `false` if the line ended first.
fn read_single_quoted(chars: &mut std::str::Chars<'_>, out: &mut String) -> bool {
    for c in chars.by_ref() {
        if c == '\'' {
            return true;
        }
        out.push(c);
    }
    false
}

/// Reads up to the closing `"`. Returns `false` if the line ended first.
fn read_double_quoted(chars: &mut std::str::Chars<'_>, out: &mut String) -> bool {
    while let Some(c) = chars.next() {
        match c {
            '"' => return true,
            '\\' => match chars.next() {
                Some(next @ ('"' | '\\' | '$' | '`')) => out.push(next),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => {
                    out.push('\\');
                    return false;
                }
            },
            c => out.push(c),
        }
    }
    false
}

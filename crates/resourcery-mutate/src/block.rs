//! Brace matching over PHP source text.

/// Index of the `}` closing the `{` at `open`, skipping string literals and
/// comments. Returns `None` if the block is unbalanced.
pub fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut index = open;
    while index < bytes.len() {
        match bytes[index] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            quote @ (b'\'' | b'"') => {
                index = skip_string(bytes, index, quote)?;
            }
            b'/' if bytes.get(index + 1) == Some(&b'/') => {
                index = skip_line(bytes, index);
            }
            b'#' if bytes.get(index + 1) != Some(&b'[') => {
                index = skip_line(bytes, index);
            }
            b'/' if bytes.get(index + 1) == Some(&b'*') => {
                index = skip_block_comment(bytes, index)?;
            }
            _ => {}
        }
        index += 1;
    }
    None
}

/// First `{` at or after `from`.
pub fn next_open_brace(text: &str, from: usize) -> Option<usize> {
    text.get(from..)?.find('{').map(|offset| offset + from)
}

fn skip_string(bytes: &[u8], start: usize, quote: u8) -> Option<usize> {
    let mut index = start + 1;
    while index < bytes.len() {
        match bytes[index] {
            b'\\' => index += 1,
            byte if byte == quote => return Some(index),
            _ => {}
        }
        index += 1;
    }
    None
}

fn skip_line(bytes: &[u8], start: usize) -> usize {
    let mut index = start;
    while index < bytes.len() && bytes[index] != b'\n' {
        index += 1;
    }
    index
}

fn skip_block_comment(bytes: &[u8], start: usize) -> Option<usize> {
    let mut index = start + 2;
    while index + 1 < bytes.len() {
        if bytes[index] == b'*' && bytes[index + 1] == b'/' {
            return Some(index + 1);
        }
        index += 1;
    }
    None
}

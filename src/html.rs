//! Low-level HTML table slicing helpers.
//!
//! Deliberately naive string scanning tailored to the structure of the
//! constituents page: no nested tables inside cells, ASCII tag names.
//! Matching is case-insensitive on tag names.

/// Returns the contents of the first `<table ...>...</table>` block,
/// without the wrapping tags.
pub fn first_table(html: &str) -> Option<&str> {
    let (start, end) = next_block_ci(html, "<table", "</table>", 0)?;
    let block = &html[start..end];
    let after_open = block.find('>')? + 1;
    let close_start = block.len() - "</table>".len();
    Some(&block[after_open..close_start])
}

/// Iterates `<tr>` blocks inside a table body, yielding the inner HTML of
/// each row.
pub fn rows(table: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut from = 0;
    while let Some((start, end)) = next_block_ci(table, "<tr", "</tr>", from) {
        let block = &table[start..end];
        if let Some(after_open) = block.find('>') {
            let close_start = block.len() - "</tr>".len();
            out.push(&block[after_open + 1..close_start]);
        }
        from = end;
    }
    out
}

/// Extracts the cell texts of one row, in order. Header (`<th>`) and data
/// (`<td>`) cells are treated alike; nested tags are stripped and entities
/// decoded.
pub fn cells(row: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut from = 0;
    loop {
        let th = next_block_ci(row, "<th", "</th>", from);
        let td = next_block_ci(row, "<td", "</td>", from);
        let (start, end) = match (th, td) {
            (Some(a), Some(b)) => {
                if a.0 < b.0 {
                    a
                } else {
                    b
                }
            }
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => break,
        };
        let block = &row[start..end];
        out.push(normalize_ws(&decode_entities(&strip_tags(inner_text(
            block,
        )))));
        from = end;
    }
    out
}

/// Finds the next complete tag block from `from` onwards, case-insensitive:
/// from the start of the opening tag to the end of the closing tag.
fn next_block_ci(s: &str, open_tag: &str, close_tag: &str, from: usize) -> Option<(usize, usize)> {
    let lc = to_lowercase_ascii(s);
    let open_lc = to_lowercase_ascii(open_tag);
    let close_lc = to_lowercase_ascii(close_tag);

    let start = lc.get(from..)?.find(&open_lc)? + from;
    // Jump past the '>' of the opening tag
    let open_end = s[start..].find('>')? + start + 1;
    let end_rel = lc[open_end..].find(&close_lc)?;
    let end = open_end + end_rel + close_tag.len();
    Some((start, end))
}

/// Given a complete block like `<td ...>INNER</td>`, returns INNER (which
/// may still contain nested tags).
fn inner_text(block: &str) -> String {
    if let Some(open_end) = block.find('>') {
        if let Some(close_start) = block.rfind('<') {
            if close_start > open_end {
                return block[open_end + 1..close_start].to_string();
            }
        }
    }
    String::new()
}

/// Removes all `<...>` tags from the string.
pub fn strip_tags(s: String) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Minimal entity decoding: only the entities that occur in the source
/// table (`&amp;`, `&nbsp;`, `&#39;`, `&quot;`).
pub fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

/// Collapses whitespace runs into a single space and trims.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

fn to_lowercase_ascii(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

//! Narrative block protection.
//!
//! CDA narrative blocks (`<text>`) carry presentational markup such as tables, line breaks and
//! inline formatting. That markup is meant for display, not for the model, so before parsing we
//! wrap the content of every `<text>` element in a CDATA section and let the XML reader hand it
//! back as plain character data.
//!
//! The scan works at tag level:
//! - both `<text>` and `<text attr="…">` open tags are protected
//! - self-closing `<text/>` elements and names such as `<textual>` are skipped
//! - comments, CDATA sections and processing instructions outside narrative are skipped
//! - content that is exactly one CDATA section is kept as is; CDATA mixed with markup is
//!   unwrapped into the new section
//! - a literal `]]>` inside the content is split across two CDATA sections
//! - an open tag without a matching `</text>` is left alone for the parser to report

const OPEN_TAG_PREFIX: &str = "<text";
const CLOSE_TAG: &str = "</text>";
const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";
const CDATA_CLOSE_SPLIT: &str = "]]]]><![CDATA[>";

/// Regions whose content is never markup: (opening, closing) delimiters.
const OPAQUE_REGIONS: [(&str, &str); 3] = [("<!--", "-->"), (CDATA_OPEN, CDATA_CLOSE), ("<?", "?>")];

/// Wrap the content of every narrative `<text>` element in a CDATA section.
pub fn protect_narrative_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 64);
    let mut rest = raw;
    let mut protected = 0usize;

    while let Some((tag_start, tag_end)) = find_open_tag(rest) {
        let after_tag = &rest[tag_end..];
        let Some(close) = after_tag.find(CLOSE_TAG) else {
            break;
        };

        out.push_str(&rest[..tag_start]);
        out.push_str(&rest[tag_start..tag_end]);

        let body = &after_tag[..close];
        if is_single_cdata(body) {
            out.push_str(body);
        } else {
            out.push_str(CDATA_OPEN);
            out.push_str(&unwrap_cdata(body).replace(CDATA_CLOSE, CDATA_CLOSE_SPLIT));
            out.push_str(CDATA_CLOSE);
            protected += 1;
        }
        out.push_str(CLOSE_TAG);

        rest = &after_tag[close + CLOSE_TAG.len()..];
    }

    out.push_str(rest);
    tracing::debug!(protected, "protected narrative text blocks");
    out
}

/// Locate the next non-self-closing `<text …>` open tag.
///
/// Returns the byte offsets of the tag's `<` and one past its `>`.
/// Comments, CDATA sections and processing instructions are stepped over whole; an unterminated
/// one ends the scan.
fn find_open_tag(input: &str) -> Option<(usize, usize)> {
    let mut from = 0;

    while let Some(found) = input[from..].find('<') {
        let start = from + found;
        let tail = &input[start..];

        if let Some((open, close)) = OPAQUE_REGIONS.iter().find(|(open, _)| tail.starts_with(open)) {
            let content = start + open.len();
            from = content + input[content..].find(close)? + close.len();
            continue;
        }
        if !tail.starts_with(OPEN_TAG_PREFIX) {
            from = start + 1;
            continue;
        }

        let after_name = start + OPEN_TAG_PREFIX.len();
        from = after_name;

        match input[after_name..].chars().next() {
            Some('>') => return Some((start, after_name + 1)),
            Some(c) if c.is_whitespace() => {
                let end = tag_end(input, after_name)?;
                if input[..end - 1].ends_with('/') {
                    from = end;
                    continue;
                }
                return Some((start, end));
            }
            _ => continue,
        }
    }

    None
}

/// Whether `body`, ignoring surrounding whitespace, is one CDATA section and nothing else.
fn is_single_cdata(body: &str) -> bool {
    let trimmed = body.trim();
    trimmed.starts_with(CDATA_OPEN)
        && trimmed.find(CDATA_CLOSE) == Some(trimmed.len().saturating_sub(CDATA_CLOSE.len()))
}

/// Replace every CDATA section in `body` with its content. An unterminated section is kept
/// verbatim.
fn unwrap_cdata(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;

    while let Some(open) = rest.find(CDATA_OPEN) {
        let content = &rest[open + CDATA_OPEN.len()..];
        let Some(close) = content.find(CDATA_CLOSE) else {
            break;
        };
        out.push_str(&rest[..open]);
        out.push_str(&content[..close]);
        rest = &content[close + CDATA_CLOSE.len()..];
    }

    out.push_str(rest);
    out
}

/// Byte offset one past the `>` closing a tag whose attributes start at `from`.
fn tag_end(input: &str, from: usize) -> Option<usize> {
    let mut quote: Option<char> = None;

    for (offset, c) in input[from..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(from + offset + 1),
            (None, _) => {}
        }
    }

    None
}

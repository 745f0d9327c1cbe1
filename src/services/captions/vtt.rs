//! WebVTT caption flattening.

/// Flatten a WebVTT document into a single line of spoken text.
///
/// Rolling auto-captions repeat the previous cue line, so consecutive duplicates
/// are dropped.
pub fn flatten_vtt(vtt: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_note = false;

    let mut raw_lines = vtt.lines().peekable();
    while let Some(raw) = raw_lines.next() {
        let line = raw.trim();

        if line.is_empty() {
            in_note = false;
            continue;
        }
        if in_note {
            continue;
        }
        if line.starts_with("NOTE") || line.starts_with("STYLE") || line.starts_with("REGION") {
            in_note = true;
            continue;
        }
        if line.starts_with("WEBVTT")
            || line.starts_with("Kind:")
            || line.starts_with("Language:")
            || line.contains("-->")
        {
            continue;
        }
        // Cue identifier.
        if raw_lines.peek().is_some_and(|next| next.contains("-->")) {
            continue;
        }

        let clean = decode_entities(&strip_tags(line));
        let clean = clean.split_whitespace().collect::<Vec<_>>().join(" ");
        if clean.is_empty() {
            continue;
        }
        if lines.last() != Some(&clean) {
            lines.push(clean);
        }
    }

    lines.join(" ")
}

fn strip_tags(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_tag = false;

    for c in line.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }

    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

use quick_xml::escape::partial_escape;
use rimsync_core::{Entry, PlaceholderMode, ValueShape, PLACEHOLDER_TOKEN};

/// Trim every line and drop blank ones.
pub fn normalize_text(s: &str) -> String {
    s.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text as it can appear inside an XML comment (`--` is not allowed there).
pub fn comment_safe(s: &str) -> String {
    let mut out = s.to_string();
    while out.contains("--") {
        out = out.replace("--", "- -");
    }
    if out.ends_with('-') {
        out.push(' ');
    }
    out
}

fn escape_line(line: &str) -> String {
    if (line.contains('<') || line.contains('>')) && !line.contains("]]>") {
        format!("<![CDATA[{line}]]>")
    } else {
        partial_escape(line).into_owned()
    }
}

/// Raw XML content that reproduces `source` as a value of the given shape.
///
/// Empty sources render as the `TODO` token; text with markup characters
/// is wrapped in CDATA; multi-line text and lists are laid out one line per
/// row, indented below the element.
pub fn render_source(source: &str, shape: ValueShape) -> String {
    let normalized = normalize_text(source);
    if normalized.is_empty() {
        return PLACEHOLDER_TOKEN.to_string();
    }
    match shape {
        ValueShape::List => {
            let mut out = String::from("\n");
            for line in normalized.lines() {
                out.push_str("    <li>");
                out.push_str(&escape_line(line));
                out.push_str("</li>\n");
            }
            out.push_str("  ");
            out
        }
        ValueShape::Text if !normalized.contains('\n') => escape_line(&normalized),
        ValueShape::Text => {
            let mut out = String::from("\n");
            for line in normalized.lines() {
                out.push_str("    ");
                out.push_str(&escape_line(line));
                out.push('\n');
            }
            out.push_str("  ");
            out
        }
    }
}

/// Placeholder content for an entry under the given mode.
pub fn render_placeholder(entry: &Entry, mode: PlaceholderMode) -> String {
    match mode {
        PlaceholderMode::Todo => PLACEHOLDER_TOKEN.to_string(),
        PlaceholderMode::Original => render_source(&entry.source, entry.shape),
    }
}

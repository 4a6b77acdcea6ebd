use scraper::{ElementRef, Node};

/// Elements whose content is never rendered.
const HIDDEN_TAGS: [&str; 4] = ["script", "style", "template", "noscript"];

/// Elements that start and end on their own line.
const BLOCK_TAGS: [&str; 14] = [
    "p", "div", "li", "ul", "ol", "dl", "dt", "dd", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// Approximation of `innerText` followed by `trim()`.
///
/// Hidden elements are skipped, `<br>` and block boundaries become line
/// breaks, whitespace within a line collapses to one space.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_visible(element, &mut raw);

    raw.split('\n')
        .map(collapse_whitespace)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// `textContent` on one line: all descendant text, whitespace collapsed.
pub fn flat_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn collect_visible(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                // Source line breaks are formatting, not content.
                out.extend(text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }));
            }
            Node::Element(el) => {
                let name = el.name();
                if HIDDEN_TAGS.contains(&name) {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let is_block = BLOCK_TAGS.contains(&name);
                if is_block {
                    push_line_break(out);
                }
                collect_visible(child_el, out);
                if is_block {
                    push_line_break(out);
                }
            }
            _ => {}
        }
    }
}

fn push_line_break(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// Collapses ASCII whitespace only; non-breaking spaces are content.
fn collapse_whitespace(s: &str) -> String {
    s.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

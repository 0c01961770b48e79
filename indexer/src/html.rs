use scraper::Html;

const SKIPPED: &[&str] = &["script", "style", "noscript", "template"];

/// Visible text and `<title>` of an HTML page.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Extracted {
    pub title: Option<String>,
    pub text: String,
}

/// Leading byte-order mark, which some editors write at the start of pages.
pub fn strip_bom(raw: &str) -> &str {
    raw.strip_prefix('\u{feff}').unwrap_or(raw)
}

/// True when `raw` holds at least one HTML element, anywhere in the text.
pub fn looks_like_html(raw: &str) -> bool {
    let raw = strip_bom(raw);
    if !raw.contains('<') {
        return false;
    }
    if raw.trim_start().starts_with('<') {
        return true;
    }
    let fragment = Html::parse_fragment(raw);
    let root = fragment.root_element();
    root.descendants().any(|n| n.id() != root.id() && n.value().is_element())
}

pub fn extract(raw: &str) -> Extracted {
    let doc = Html::parse_document(strip_bom(raw));
    let mut title: Option<String> = None;
    let mut parts: Vec<&str> = Vec::new();
    for node in doc.root_element().descendants() {
        let Some(text) = node.value().as_text() else { continue };
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        let parent = node.parent().and_then(|p| p.value().as_element().map(|e| e.name()));
        if parent == Some("title") {
            title.get_or_insert_with(|| text.to_string());
            continue;
        }
        let hidden = node
            .ancestors()
            .any(|a| a.value().as_element().is_some_and(|e| SKIPPED.contains(&e.name())));
        if !hidden {
            parts.push(text);
        }
    }
    Extracted { title, text: parts.join(" ") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_visible_text_and_title() {
        let page = r#"<!DOCTYPE html><html><head><title> Grados | UE </title>
            <style>body { color: red }</style><script>var universidad = 1;</script></head>
            <body><h1>Universidad Europea</h1><p>Campus de <b>Madrid</b></p></body></html>"#;
        let out = extract(page);
        assert_eq!(out.title.as_deref(), Some("Grados | UE"));
        assert_eq!(out.text, "Universidad Europea Campus de Madrid");
    }

    #[test]
    fn detects_markup() {
        assert!(looks_like_html("  <html></html>"));
        assert!(looks_like_html("\u{feff}<!DOCTYPE html><html></html>"));
        assert!(looks_like_html("Hola <b>mundo</b>"));
        assert!(!looks_like_html("plain words"));
        assert!(!looks_like_html("notas: 3 < 5 y 7 > 2"));
    }

    #[test]
    fn inline_markup_drops_scripts() {
        let out = extract("Hola <b>mundo</b><script>oculto()</script>");
        assert_eq!(out.text, "Hola mundo");
    }

    #[test]
    fn bom_prefixed_page() {
        let out = extract("\u{feff}<html><head><title>T</title><script>var secreto = 1;</script></head><body>visible</body></html>");
        assert_eq!(out.title.as_deref(), Some("T"));
        assert_eq!(out.text, "visible");
    }
}

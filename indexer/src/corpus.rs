use crate::{html, pdf};
use anyhow::{bail, Context, Result};
use search_core::RawDocument;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const EXTENSIONS: &[&str] = &["json", "jsonl", "html", "htm", "txt", "pdf"];

/// One crawled page. Accepts both `{url, text, title}` records and the
/// `{id, title, body, url, ...}` lines the crawler emits.
#[derive(Debug, Deserialize)]
struct CrawledPage {
    url: String,
    #[serde(alias = "body")]
    text: String,
    #[serde(default)]
    title: Option<String>,
}

/// Corpus files under `input`, sorted by path so doc ids are reproducible.
pub fn discover(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("input {} is neither a file nor a directory", input.display());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking {}", input.display()))?;
        let p = entry.path();
        if !p.is_file() {
            continue;
        }
        if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
            if EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
                files.push(p.to_path_buf());
            }
        }
    }
    Ok(files)
}

/// Read every document stored in one corpus file, in file order. A PDF that
/// cannot be parsed is logged and yields no documents.
pub fn load_file(path: &Path) -> Result<Vec<RawDocument>> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let source_path = path.display().to_string();
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or_default().to_ascii_lowercase();

    if ext == "pdf" {
        return Ok(match pdf::extract(&bytes) {
            Ok(page) => {
                let doc = RawDocument::new(file_url(path), source_path, page.text);
                vec![doc.with_title(page.title.unwrap_or_default())]
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping unreadable PDF");
                Vec::new()
            }
        });
    }

    // Invalid UTF-8 turns into U+FFFD, which the tokenizer treats as a boundary.
    let lossy = String::from_utf8_lossy(&bytes);
    let raw = html::strip_bom(&lossy);

    let pages = match ext.as_str() {
        "jsonl" => {
            let mut pages = Vec::new();
            for (lineno, line) in raw.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let page: CrawledPage = serde_json::from_str(line)
                    .with_context(|| format!("{}:{}: invalid page record", path.display(), lineno + 1))?;
                pages.push(page);
            }
            pages
        }
        "json" => {
            let json: serde_json::Value =
                serde_json::from_str(&raw).with_context(|| format!("{}: invalid JSON", path.display()))?;
            match json {
                serde_json::Value::Array(arr) => arr
                    .into_iter()
                    .map(serde_json::from_value::<CrawledPage>)
                    .collect::<Result<Vec<CrawledPage>, _>>()
                    .with_context(|| format!("{}: invalid page record", path.display()))?,
                obj @ serde_json::Value::Object(_) => vec![serde_json::from_value::<CrawledPage>(obj)
                    .with_context(|| format!("{}: invalid page record", path.display()))?],
                _ => bail!("{}: expected a page object or an array of pages", path.display()),
            }
        }
        _ => vec![CrawledPage { url: file_url(path), text: raw.to_string(), title: None }],
    };

    let always_html = matches!(ext.as_str(), "html" | "htm");
    Ok(pages.into_iter().map(|page| into_document(page, &source_path, always_html)).collect())
}

fn into_document(page: CrawledPage, source_path: &str, always_html: bool) -> RawDocument {
    let (text, html_title) = if always_html || html::looks_like_html(&page.text) {
        let extracted = html::extract(&page.text);
        (extracted.text, extracted.title)
    } else {
        (page.text, None)
    };
    let title = page.title.filter(|t| !t.trim().is_empty()).or(html_title).unwrap_or_default();
    RawDocument::new(page.url, source_path, text).with_title(title)
}

fn file_url(path: &Path) -> String {
    let abs = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", abs.display())
}

//! Markdown rendering for query results.
//!
//! Everything here is pure: the same input always renders the same text.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

use codeindex_core::Chunk;

pub const NO_RELEVANT_CODE: &str = "No relevant code found for your query.";
pub const NO_FILES_FOUND: &str = "No files found";

/// Language tag for a fenced block, keyed on the file extension.
pub fn language_for(document_name: &str) -> &'static str {
    let ext = Path::new(document_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "cs" => "csharp",
        "vb" => "vb",
        "fs" => "fsharp",
        "html" | "htm" => "html",
        "css" => "css",
        "js" => "javascript",
        "ts" => "typescript",
        "jsx" => "jsx",
        "tsx" => "tsx",
        "json" => "json",
        "xml" | "csproj" | "vbproj" | "fsproj" | "config" | "props" | "targets" | "xaml" => "xml",
        "md" => "markdown",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "py" => "python",
        "rb" => "ruby",
        "php" => "php",
        "sh" => "bash",
        "ps1" => "powershell",
        "bat" | "cmd" => "batch",
        "java" => "java",
        "c" => "c",
        "cpp" | "h" => "cpp",
        "go" => "go",
        "rs" => "rust",
        "sql" => "sql",
        "r" => "r",
        "cshtml" => "cshtml",
        "razor" => "razor",
        "aspx" => "aspx",
        _ => "text",
    }
}

pub fn format_search_results(chunks: &[Chunk]) -> String {
    if chunks.is_empty() {
        return NO_RELEVANT_CODE.to_string();
    }
    let mut out = String::from("### Relevant code snippets found:\n\n");
    for chunk in chunks {
        let _ = writeln!(out, "**File: {}**", chunk.document_name);
        let _ = writeln!(out, "```{}", language_for(&chunk.document_name));
        let _ = writeln!(out, "{}", chunk.text);
        out.push_str("```\n\n");
    }
    out
}

/// Renders a deduplicated set of document names grouped by parent directory.
pub fn format_file_listing(names: &[String], directory: Option<&str>) -> String {
    if names.is_empty() {
        return match directory {
            Some(dir) => format!("{NO_FILES_FOUND} in directory: {dir}"),
            None => format!("{NO_FILES_FOUND} in the codebase."),
        };
    }

    let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for name in names {
        let (dir, file) = name.rsplit_once('/').unwrap_or(("", name.as_str()));
        groups.entry(dir).or_default().push(file);
    }

    let mut out = match directory {
        Some(dir) => format!("### Found {} files in directory '{dir}':\n\n", names.len()),
        None => format!("### Found {} files in the codebase:\n\n", names.len()),
    };
    for (dir, mut files) in groups {
        if dir.is_empty() {
            out.push_str("**Root directory:**\n");
        } else {
            let _ = writeln!(out, "**{dir}:**");
        }
        files.sort_unstable();
        for file in files {
            let _ = writeln!(out, "- {file}");
        }
        out.push('\n');
    }
    out
}

/// Renders whole files, one fenced block each. `files` pairs a document name
/// with its chunks already in sequence order.
pub fn format_file_bodies(fragment: &str, files: &[(String, Vec<Chunk>)]) -> String {
    if files.is_empty() {
        return format!("{NO_FILES_FOUND} matching '{fragment}'");
    }
    let mut out = format!("### Found {} files matching '{fragment}':\n\n", files.len());
    for (name, chunks) in files {
        let _ = writeln!(out, "**{name}**");
        let _ = writeln!(out, "```{}", language_for(name));
        for chunk in chunks {
            out.push_str(&chunk.text);
        }
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("```\n\n");
    }
    out
}

pub fn format_analysis(fragment: &str, related: &[String], file_bodies: &str) -> String {
    let mut out = format!("### Code Structure Analysis for '{fragment}':\n\n");
    if !related.is_empty() {
        out.push_str("**Related Files:**\n");
        for name in related {
            let _ = writeln!(out, "- {name}");
        }
        out.push('\n');
    }
    out.push_str(file_bodies);
    out
}

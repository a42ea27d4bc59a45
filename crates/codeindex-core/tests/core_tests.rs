use std::fs;
use std::path::Path;
use tempfile::TempDir;

use codeindex_core::config::{Config, EmbeddingBackend};
use codeindex_core::{document_name, Chunker, Error, FileScanner};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn names(root: &Path, scanner: &FileScanner) -> Vec<String> {
    let root = root.canonicalize().unwrap();
    scanner.scan(&root).unwrap().iter().map(|p| document_name(&root, p)).collect()
}

#[test]
fn scan_skips_excluded_directories() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "src/a.txt", &"a".repeat(50));
    write(tmp.path(), "bin/b.txt", &"b".repeat(50));

    let scanner = FileScanner::new([".txt"], ["bin"]);
    assert_eq!(names(tmp.path(), &scanner), vec!["src/a.txt"]);
}

#[test]
fn scan_filters_extensions_case_insensitively() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "Main.RS", "fn main() {}");
    write(tmp.path(), "notes.md", "# notes");
    write(tmp.path(), "image.png", "png");
    write(tmp.path(), "Makefile", "all:");

    let scanner = FileScanner::new(["rs", ".md"], Vec::<String>::new());
    assert_eq!(names(tmp.path(), &scanner), vec!["Main.RS", "notes.md"]);
}

#[test]
fn scan_prunes_nested_and_multi_segment_exclusions() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "app/node_modules/dep/index.js", "x");
    write(tmp.path(), "wwwroot/lib/jquery.js", "x");
    write(tmp.path(), "wwwroot/site.js", "x");
    write(tmp.path(), "lib/util.js", "x");
    write(tmp.path(), "Bin/tool.js", "x");

    let scanner = FileScanner::new([".js"], ["node_modules", "wwwroot/lib", "bin"]);
    // Directory matching is case-sensitive, so `Bin` survives.
    assert_eq!(names(tmp.path(), &scanner), vec!["Bin/tool.js", "lib/util.js", "wwwroot/site.js"]);
}

#[cfg(unix)]
#[test]
fn scan_includes_symlinked_files() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "real.txt", "x");
    fs::create_dir_all(tmp.path().join("src")).unwrap();
    std::os::unix::fs::symlink(tmp.path().join("real.txt"), tmp.path().join("src/link.txt")).unwrap();
    std::os::unix::fs::symlink(tmp.path().join("gone.txt"), tmp.path().join("dangling.txt")).unwrap();

    let scanner = FileScanner::new([".txt"], Vec::<String>::new());
    assert_eq!(names(tmp.path(), &scanner), vec!["real.txt", "src/link.txt"]);
}

#[test]
fn scan_treats_dotfile_names_as_extensions() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), ".txt", "x");
    write(tmp.path(), "docs/.MD", "x");
    write(tmp.path(), ".gitignore", "x");
    write(tmp.path(), "trailing.", "x");

    let scanner = FileScanner::new([".txt", ".md"], Vec::<String>::new());
    assert_eq!(names(tmp.path(), &scanner), vec![".txt", "docs/.MD"]);
}

#[test]
fn scan_is_deterministic_and_absolute() {
    let tmp = TempDir::new().unwrap();
    for rel in ["z/last.txt", "a/first.txt", "m.txt", "a/b/c.txt"] {
        write(tmp.path(), rel, "x");
    }
    let scanner = FileScanner::new([".txt"], Vec::<String>::new());
    let first = scanner.scan(tmp.path()).unwrap();
    let second = scanner.scan(tmp.path()).unwrap();
    assert_eq!(first, second);
    assert!(first.iter().all(|p| p.is_absolute()));
    let mut sorted = first.clone();
    sorted.sort();
    assert_eq!(first, sorted);
}

#[test]
fn scan_missing_root_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let scanner = FileScanner::new([".txt"], Vec::<String>::new());
    let err = scanner.scan(&tmp.path().join("missing")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {err:?}");
}

#[test]
fn scan_file_root_is_invalid() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a.txt", "x");
    let scanner = FileScanner::new([".txt"], Vec::<String>::new());
    let err = scanner.scan(&tmp.path().join("a.txt")).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)), "got {err:?}");
}

#[test]
fn chunks_of_large_content_rebuild_every_line() {
    let content: String = (0..200).map(|i| format!("line number {i} with some padding\n")).collect();
    let chunker = Chunker::new(256).unwrap();
    let chunks = chunker.chunk("src/big.rs", &content).unwrap();

    assert!(chunks.len() > 1);
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.sequence_number, i + 1, "sequence is contiguous from 1");
        assert_eq!(chunk.key, format!("src/big.rs_{}", i + 1));
        assert_eq!(chunk.document_name, "src/big.rs");
        assert!(chunk.embedding.is_empty());
    }
    let rebuilt: String = chunks.iter().map(|c| c.text.as_str()).collect();
    // Every source line comes back in order; only the trailing terminator differs.
    assert_eq!(rebuilt.trim_end_matches('\n'), content.trim_end_matches('\n'));
    assert_eq!(rebuilt.lines().count(), content.lines().count() + 1);
}

#[test]
fn chunking_is_deterministic() {
    let content = "alpha\nbeta\ngamma\ndelta\nepsilon\n".repeat(20);
    let chunker = Chunker::new(40).unwrap();
    let a = chunker.chunk("x.txt", &content).unwrap();
    let b = chunker.chunk("x.txt", &content).unwrap();
    assert_eq!(a, b);
}

#[test]
fn config_defaults_apply_to_empty_toml() {
    let settings = Config::from_toml_str("").unwrap().settings().unwrap();
    assert_eq!(settings.chunking.max_chunk_size, 1000);
    assert_eq!(settings.store.collection, "codebase");
    assert_eq!(settings.query.listing_limit, 1000);
    assert_eq!(settings.query.broad_query, "code");
    assert_eq!(settings.embedding.backend, EmbeddingBackend::BgeM3);
    assert!(settings.scan.extensions.iter().any(|e| e == ".cs"));
    assert!(settings.scan.excluded_dirs.iter().any(|d| d == "node_modules"));
}

#[test]
fn config_overrides_and_single_values() {
    let config = Config::from_toml_str(
        r#"
        [chunking]
        max_chunk_size = 400

        [store]
        collection = "docs"

        [embedding]
        backend = "hash"
        dim = 64
        "#,
    )
    .unwrap();
    let settings = config.settings().unwrap();
    assert_eq!(settings.chunking.max_chunk_size, 400);
    assert_eq!(settings.store.collection, "docs");
    assert_eq!(settings.embedding.backend, EmbeddingBackend::Hash);
    assert_eq!(config.get::<usize>("embedding.dim").unwrap(), 64);
}

#[test]
fn config_rejects_zero_chunk_size() {
    let err = Config::from_toml_str("[chunking]\nmax_chunk_size = 0\n").err().expect("invalid config");
    assert!(err.to_string().contains("max_chunk_size"));
}

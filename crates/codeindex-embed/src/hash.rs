use std::hash::{Hash, Hasher};

use twox_hash::XxHash64;

use codeindex_core::{Embedder, Error, Result};

/// Deterministic feature-hashing embedder tuned for source code.
///
/// Text is split into identifiers; each identifier and each of its
/// camelCase / snake_case parts is hashed into one of `dim` signed buckets,
/// and the result is L2-normalized. `parseConfig` and `parse_config` share
/// their subword features, so they land close together. No model files are
/// needed, which makes it the embedder of choice for tests.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn add_feature(&self, v: &mut [f32], feature: &str, weight: f32) {
        let mut hasher = XxHash64::with_seed(0);
        feature.hash(&mut hasher);
        let h = hasher.finish();
        let idx = (h % self.dim as u64) as usize;
        let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
        v[idx] += sign * weight;
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.dim == 0 {
            return Err(Error::Embedding("hash embedder configured with zero dimensions".to_string()));
        }
        let mut v = vec![0f32; self.dim];
        for ident in identifiers(text) {
            let parts = subwords(ident);
            if parts.len() > 1 {
                self.add_feature(&mut v, &ident.to_lowercase(), 1.0);
            }
            for part in parts {
                self.add_feature(&mut v, &part, 1.0);
            }
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        Ok(v)
    }
}

/// Runs of alphanumerics and underscores.
fn identifiers(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_')).filter(|s| !s.is_empty())
}

/// Lowercased camelCase / snake_case parts of one identifier.
fn subwords(ident: &str) -> Vec<String> {
    let mut parts = Vec::new();
    for piece in ident.split('_').filter(|s| !s.is_empty()) {
        let mut current = String::new();
        let mut prev_lower = false;
        for c in piece.chars() {
            if c.is_uppercase() && prev_lower && !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
            current.extend(c.to_lowercase());
        }
        if !current.is_empty() {
            parts.push(current);
        }
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subwords_split_case_and_underscores() {
        assert_eq!(subwords("parseConfigFile"), vec!["parse", "config", "file"]);
        assert_eq!(subwords("parse_config"), vec!["parse", "config"]);
        assert_eq!(subwords("HTTPServer"), vec!["httpserver"]);
        assert_eq!(subwords("__init__"), vec!["init"]);
    }

    #[test]
    fn identifiers_skip_punctuation() {
        let ids: Vec<&str> = identifiers("fn start_fire(flint: &Flint) {}").collect();
        assert_eq!(ids, vec!["fn", "start_fire", "flint", "Flint"]);
    }
}

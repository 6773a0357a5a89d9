//! Text embedding for phrase similarity.
//!
//! The encoder only relies on the [`Embedder`] contract: a deterministic
//! `text -> vector` map and a similarity in `[0, 1]`. The built-in
//! [`NgramEmbedder`] hashes words and character trigrams into a fixed number
//! of buckets, which is enough to separate the short synonym phrases of a
//! code book and tolerates OCR damage inside words.

use xxhash_rust::xxh3::xxh3_64;

/// Default number of hash buckets.
pub const DEFAULT_DIMENSION: usize = 512;

/// Weight of a whole-word feature relative to one character trigram.
const WORD_WEIGHT: f32 = 2.0;

/// Deterministic text embedding backend.
pub trait Embedder: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Length of every vector returned by [`Embedder::embed`].
    fn dimension(&self) -> usize;

    /// Embeds a text. The same text always yields the same vector.
    fn embed(&self, text: &str) -> Vec<f32>;

    /// Similarity of two embeddings in `[0, 1]`.
    fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        cosine_similarity(a, b).clamp(0.0, 1.0)
    }

    /// Embeds several texts.
    fn embed_batch(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Cosine similarity of two vectors. Mismatched or empty vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Hashed bag of words and character trigrams, L2-normalized.
#[derive(Debug, Clone)]
pub struct NgramEmbedder {
    dimension: usize,
}

impl Default for NgramEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl NgramEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn bucket(&self, feature: &str) -> usize {
        // Modulo keeps the value below `dimension`, which is a usize.
        (xxh3_64(feature.as_bytes()) % self.dimension as u64) as usize
    }
}

impl Embedder for NgramEmbedder {
    fn name(&self) -> &str {
        "ngram"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension];
        let lowered = text.to_lowercase();
        for word in lowered
            .split(|ch: char| !ch.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            vector[self.bucket(&format!("w:{word}"))] += WORD_WEIGHT;
            let padded: Vec<char> = std::iter::once('#')
                .chain(word.chars())
                .chain(std::iter::once('#'))
                .collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                vector[self.bucket(&format!("g:{gram}"))] += 1.0;
            }
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

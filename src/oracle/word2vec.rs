// word2vec embedding table: the default SimilarityOracle.
//
// Reads the classic word2vec formats (binary and text) into a flat f32
// matrix with a word -> row index. Similarity is the cosine between the two
// rows, so scores range over [-1, 1]. Negative values are not clamped; the
// matcher's threshold decides what counts.
//
// Binary layout:
//   "<vocab_size> <dim>\n"
//   then vocab_size times: <word bytes> ' ' <dim x f32 little-endian> ['\n']

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use super::traits::{OracleMiss, SimilarityOracle};

/// Upper bound on rows preallocated from an untrusted header.
const MAX_PREALLOCATED_ROWS: usize = 1 << 16;

/// Largest vector width accepted from a header.
const MAX_DIMENSIONS: usize = 1 << 16;

/// Upper bound on f32 components preallocated from an untrusted header (64 MiB).
const MAX_PREALLOCATED_FLOATS: usize = 1 << 24;

/// Errors raised while loading an embedding table from disk.
#[derive(Debug, Error)]
pub enum OracleLoadError {
    #[error("failed to open embedding table {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error while reading embedding table: {0}")]
    Io(#[from] io::Error),

    #[error("malformed embedding table header: {0:?}")]
    MalformedHeader(String),

    #[error("embedding table truncated at entry {entry} of {expected}")]
    Truncated { entry: usize, expected: usize },

    #[error("entry {entry} has a word that is not valid UTF-8")]
    InvalidUtf8 { entry: usize },

    #[error("entry {entry} ({word:?}) has {found} components, expected {expected}")]
    DimensionMismatch {
        entry: usize,
        word: String,
        expected: usize,
        found: usize,
    },

    #[error("entry {entry} has a non-numeric component: {value:?}")]
    InvalidComponent { entry: usize, value: String },
}

/// Dense word vectors keyed by word.
///
/// Rows are stored back to back in one allocation; norms are precomputed at
/// insert time so a similarity query is a single dot product.
#[derive(Debug, Clone, Default)]
pub struct WordVectors {
    dim: usize,
    index: HashMap<String, usize>,
    data: Vec<f32>,
    norms: Vec<f64>,
}

impl WordVectors {
    /// An empty table. Not ready until at least one vector is inserted.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from in-memory entries. Every vector must have `dim`
    /// components. A repeated word replaces the earlier vector.
    pub fn from_entries<S, I>(dim: usize, entries: I) -> Result<Self, OracleLoadError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Vec<f32>)>,
    {
        let mut table = Self::with_dim(dim, 0);
        for (entry, (word, vector)) in entries.into_iter().enumerate() {
            let word = word.into();
            if vector.len() != dim {
                return Err(OracleLoadError::DimensionMismatch {
                    entry,
                    word,
                    expected: dim,
                    found: vector.len(),
                });
            }
            table.insert(word, &vector);
        }
        Ok(table)
    }

    /// Load a word2vec model in binary format.
    pub fn load(path: &Path) -> Result<Self, OracleLoadError> {
        let file = File::open(path).map_err(|source| OracleLoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::read_binary(BufReader::new(file))?;
        info!(
            path = %path.display(),
            vocab = table.len(),
            dim = table.dim,
            "Loaded word2vec model (binary)"
        );
        Ok(table)
    }

    /// Load a word2vec model in text format.
    pub fn load_text(path: &Path) -> Result<Self, OracleLoadError> {
        let file = File::open(path).map_err(|source| OracleLoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::read_text(BufReader::new(file))?;
        info!(
            path = %path.display(),
            vocab = table.len(),
            dim = table.dim,
            "Loaded word2vec model (text)"
        );
        Ok(table)
    }

    /// Parse the binary format from any buffered reader.
    pub fn read_binary<R: BufRead>(mut reader: R) -> Result<Self, OracleLoadError> {
        let (vocab_size, dim) = read_header(&mut reader)?;
        let mut table = Self::with_dim(dim, vocab_size);
        let mut raw = vec![0u8; dim * 4];
        let mut vector = vec![0f32; dim];

        for entry in 0..vocab_size {
            let word = read_binary_word(&mut reader, entry, vocab_size)?;
            reader.read_exact(&mut raw).map_err(|e| truncated_or_io(e, entry, vocab_size))?;
            for (slot, chunk) in vector.iter_mut().zip(raw.chunks_exact(4)) {
                *slot = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            }
            table.insert(word, &vector);
        }

        Ok(table)
    }

    /// Parse the text format from any buffered reader.
    pub fn read_text<R: BufRead>(mut reader: R) -> Result<Self, OracleLoadError> {
        let (vocab_size, dim) = read_header(&mut reader)?;
        let mut table = Self::with_dim(dim, vocab_size);
        let mut vector = Vec::with_capacity(dim);
        let mut entry = 0;

        for line in reader.lines() {
            if entry == vocab_size {
                break;
            }
            let line = line?;
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else {
                continue;
            };

            vector.clear();
            for value in fields {
                let component: f32 = value.parse().map_err(|_| OracleLoadError::InvalidComponent {
                    entry,
                    value: value.to_string(),
                })?;
                vector.push(component);
            }
            if vector.len() != dim {
                return Err(OracleLoadError::DimensionMismatch {
                    entry,
                    word: word.to_string(),
                    expected: dim,
                    found: vector.len(),
                });
            }

            table.insert(word.to_string(), &vector);
            entry += 1;
        }

        if entry < vocab_size {
            return Err(OracleLoadError::Truncated {
                entry,
                expected: vocab_size,
            });
        }

        Ok(table)
    }

    /// Number of distinct words in the table.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    /// The stored vector for a word, if present.
    pub fn vector(&self, word: &str) -> Option<&[f32]> {
        self.index.get(word).map(|&row| self.row(row))
    }

    fn with_dim(dim: usize, capacity: usize) -> Self {
        let capacity = capacity.min(MAX_PREALLOCATED_ROWS);
        Self {
            dim,
            index: HashMap::with_capacity(capacity),
            data: Vec::with_capacity(capacity.saturating_mul(dim).min(MAX_PREALLOCATED_FLOATS)),
            norms: Vec::with_capacity(capacity),
        }
    }

    fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.dim..(row + 1) * self.dim]
    }

    fn insert(&mut self, word: String, vector: &[f32]) {
        let norm = vector
            .iter()
            .map(|&x| f64::from(x) * f64::from(x))
            .sum::<f64>()
            .sqrt();

        if let Some(&row) = self.index.get(&word) {
            debug!(word = %word, "Duplicate word in embedding table, replacing vector");
            let start = row * self.dim;
            self.data[start..start + self.dim].copy_from_slice(vector);
            self.norms[row] = norm;
            return;
        }

        let row = self.norms.len();
        self.data.extend_from_slice(vector);
        self.norms.push(norm);
        self.index.insert(word, row);
    }

    fn cosine(&self, a: usize, b: usize) -> f64 {
        let denom = self.norms[a] * self.norms[b];
        if denom < f64::EPSILON {
            return 0.0;
        }
        let dot: f64 = self
            .row(a)
            .iter()
            .zip(self.row(b))
            .map(|(&x, &y)| f64::from(x) * f64::from(y))
            .sum();
        // rounding can push |cos| a hair past 1
        (dot / denom).clamp(-1.0, 1.0)
    }
}

impl SimilarityOracle for WordVectors {
    fn ready(&self) -> bool {
        !self.is_empty()
    }

    fn similarity(&self, term: &str, word: &str) -> Result<f64, OracleMiss> {
        let a = *self
            .index
            .get(term)
            .ok_or_else(|| OracleMiss::UnknownTerm(term.to_string()))?;
        let b = *self
            .index
            .get(word)
            .ok_or_else(|| OracleMiss::UnknownWord(word.to_string()))?;
        Ok(self.cosine(a, b))
    }

    fn vocab_size(&self) -> usize {
        self.len()
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dim)
    }
}

fn read_header<R: BufRead>(reader: &mut R) -> Result<(usize, usize), OracleLoadError> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let mut fields = line.split_whitespace();

    let parse = |field: Option<&str>| field.and_then(|f| f.parse::<usize>().ok());
    match (parse(fields.next()), parse(fields.next()), fields.next()) {
        (Some(vocab_size), Some(dim), None) if dim > 0 && dim <= MAX_DIMENSIONS => Ok((vocab_size, dim)),
        _ => Err(OracleLoadError::MalformedHeader(line.trim_end().to_string())),
    }
}

/// Read a space-terminated word. Newlines left over from the previous
/// entry's optional terminator are dropped.
fn read_binary_word<R: BufRead>(
    reader: &mut R,
    entry: usize,
    expected: usize,
) -> Result<String, OracleLoadError> {
    let mut bytes = Vec::new();
    reader.read_until(b' ', &mut bytes)?;
    if bytes.pop() != Some(b' ') {
        return Err(OracleLoadError::Truncated { entry, expected });
    }
    let start = bytes.iter().position(|&b| b != b'\n').unwrap_or(bytes.len());
    String::from_utf8(bytes.split_off(start)).map_err(|_| OracleLoadError::InvalidUtf8 { entry })
}

fn truncated_or_io(err: io::Error, entry: usize, expected: usize) -> OracleLoadError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        OracleLoadError::Truncated { entry, expected }
    } else {
        OracleLoadError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn binary_table(entries: &[(&str, &[f32])], dim: usize, newline: bool) -> Vec<u8> {
        let mut bytes = format!("{} {}\n", entries.len(), dim).into_bytes();
        for (word, vector) in entries {
            bytes.extend_from_slice(word.as_bytes());
            bytes.push(b' ');
            for v in *vector {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
            if newline {
                bytes.push(b'\n');
            }
        }
        bytes
    }

    #[test]
    fn test_cosine_identical() {
        let wv = WordVectors::from_entries(3, [("a", vec![1.0, 2.0, 3.0]), ("b", vec![2.0, 4.0, 6.0])])
            .unwrap();
        let sim = wv.similarity("a", "b").unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let wv = WordVectors::from_entries(2, [("a", vec![1.0, 0.0]), ("b", vec![0.0, 1.0])]).unwrap();
        assert!(wv.similarity("a", "b").unwrap().abs() < 1e-10);
    }

    #[test]
    fn test_cosine_opposite_is_negative() {
        let wv = WordVectors::from_entries(2, [("a", vec![1.0, 0.0]), ("b", vec![-1.0, 0.0])]).unwrap();
        let sim = wv.similarity("a", "b").unwrap();
        assert!((sim + 1.0).abs() < 1e-10, "Opposite vectors should be -1.0, got {sim}");
    }

    #[test]
    fn test_parallel_vectors_never_exceed_one() {
        let wv = WordVectors::from_entries(
            3,
            [("a", vec![0.1, 0.2, 0.3]), ("b", vec![0.3, 0.6, 0.9]), ("c", vec![-0.7, -1.4, -2.1])],
        )
        .unwrap();
        let same = wv.similarity("a", "b").unwrap();
        let opposite = wv.similarity("a", "c").unwrap();
        assert!(same <= 1.0 && (same - 1.0).abs() < 1e-6, "got {same}");
        assert!(opposite >= -1.0 && (opposite + 1.0).abs() < 1e-6, "got {opposite}");
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let wv = WordVectors::from_entries(2, [("a", vec![0.0, 0.0]), ("b", vec![1.0, 1.0])]).unwrap();
        assert_eq!(wv.similarity("a", "b").unwrap(), 0.0);
    }

    #[test]
    fn test_unknown_term_and_word() {
        let wv = WordVectors::from_entries(2, [("a", vec![1.0, 0.0])]).unwrap();
        assert_eq!(
            wv.similarity("zzz", "a"),
            Err(OracleMiss::UnknownTerm("zzz".to_string()))
        );
        assert_eq!(
            wv.similarity("a", "zzz"),
            Err(OracleMiss::UnknownWord("zzz".to_string()))
        );
    }

    #[test]
    fn test_empty_is_not_ready() {
        assert!(!WordVectors::empty().ready());
        let wv = WordVectors::from_entries(1, [("a", vec![1.0])]).unwrap();
        assert!(wv.ready());
    }

    #[test]
    fn test_from_entries_rejects_wrong_dimension() {
        let err = WordVectors::from_entries(3, [("a", vec![1.0, 2.0])]).unwrap_err();
        assert!(matches!(
            err,
            OracleLoadError::DimensionMismatch { expected: 3, found: 2, .. }
        ));
    }

    #[test]
    fn test_duplicate_word_later_vector_wins() {
        let wv = WordVectors::from_entries(
            2,
            [("a", vec![1.0, 0.0]), ("b", vec![1.0, 0.0]), ("a", vec![0.0, 1.0])],
        )
        .unwrap();
        assert_eq!(wv.len(), 2);
        assert_eq!(wv.vector("a"), Some(&[0.0, 1.0][..]));
        assert!(wv.similarity("a", "b").unwrap().abs() < 1e-10);
    }

    #[test]
    fn test_read_binary_with_and_without_newlines() {
        let entries: &[(&str, &[f32])] = &[("coffee", &[0.5, 0.25]), ("tea", &[-1.0, 2.0])];
        for newline in [true, false] {
            let bytes = binary_table(entries, 2, newline);
            let wv = WordVectors::read_binary(Cursor::new(bytes)).unwrap();
            assert_eq!(wv.len(), 2);
            assert_eq!(wv.dim(), 2);
            assert_eq!(wv.vector("coffee"), Some(&[0.5, 0.25][..]));
            assert_eq!(wv.vector("tea"), Some(&[-1.0, 2.0][..]));
        }
    }

    #[test]
    fn test_read_binary_utf8_words() {
        let entries: &[(&str, &[f32])] = &[("咖啡", &[1.0]), ("購買", &[2.0])];
        let wv = WordVectors::read_binary(Cursor::new(binary_table(entries, 1, true))).unwrap();
        assert!(wv.contains("咖啡"));
        assert!(wv.contains("購買"));
    }

    #[test]
    fn test_read_binary_truncated_vector() {
        let mut bytes = binary_table(&[("a", &[1.0, 2.0])], 2, false);
        bytes.truncate(bytes.len() - 3);
        let err = WordVectors::read_binary(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, OracleLoadError::Truncated { entry: 0, expected: 1 }));
    }

    #[test]
    fn test_read_binary_missing_entries() {
        let mut bytes = binary_table(&[("a", &[1.0])], 1, true);
        // Header claims three entries, body holds one
        bytes[0] = b'3';
        let err = WordVectors::read_binary(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, OracleLoadError::Truncated { entry: 1, expected: 3 }));
    }

    #[test]
    fn test_malformed_header() {
        for header in ["", "12\n", "abc 3\n", "3 0\n", "1 2 3\n"] {
            let err = WordVectors::read_binary(Cursor::new(header.as_bytes().to_vec())).unwrap_err();
            assert!(
                matches!(err, OracleLoadError::MalformedHeader(_)),
                "header {header:?} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn test_oversized_header_without_body_is_truncated() {
        let header = format!("{} {}\n", MAX_PREALLOCATED_ROWS, MAX_DIMENSIONS);
        let err = WordVectors::read_binary(Cursor::new(header.into_bytes())).unwrap_err();
        assert!(matches!(err, OracleLoadError::Truncated { entry: 0, .. }), "got {err:?}");

        let header = format!("4000000000 {}\n", MAX_DIMENSIONS);
        let err = WordVectors::read_text(Cursor::new(header)).unwrap_err();
        assert!(matches!(err, OracleLoadError::Truncated { entry: 0, .. }), "got {err:?}");
    }

    #[test]
    fn test_header_wider_than_max_dimensions() {
        let header = format!("1 {}\n", MAX_DIMENSIONS + 1);
        let err = WordVectors::read_binary(Cursor::new(header.into_bytes())).unwrap_err();
        assert!(matches!(err, OracleLoadError::MalformedHeader(_)));
    }

    #[test]
    fn test_read_text() {
        let text = "2 3\ncoffee 0.1 0.2 0.3\n\ntea 1 0 -1\n";
        let wv = WordVectors::read_text(Cursor::new(text)).unwrap();
        assert_eq!(wv.len(), 2);
        assert_eq!(wv.vector("tea"), Some(&[1.0, 0.0, -1.0][..]));
    }

    #[test]
    fn test_read_text_bad_component() {
        let text = "1 2\ncoffee 0.1 nope\n";
        let err = WordVectors::read_text(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, OracleLoadError::InvalidComponent { entry: 0, .. }));
    }

    #[test]
    fn test_read_text_short_row() {
        let text = "1 3\ncoffee 0.1 0.2\n";
        let err = WordVectors::read_text(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, OracleLoadError::DimensionMismatch { found: 2, .. }));
    }
}

//! Deterministic extraction simulator
//!
//! Produces stand-in extraction content as a pure function of the document id
//! and the extraction profile.
//!
//! ## Determinism Guarantees
//!
//! - Same (document_id, profile) → identical outputs, across runs and processes
//! - Changing either input changes the seed and therefore the content
//! - No clock, random source or store state is consulted

use sha2::{Digest, Sha256};

use crate::model::{DerivedValue, ExtractionOutputs, Line, TableCandidate, Token};

const VOCABULARY: [&str; 16] = [
    "invoice", "total", "amount", "date", "vendor", "account", "reference", "tax", "net",
    "due", "item", "quantity", "price", "balance", "customer", "number",
];

const TOKENS_PER_LINE: usize = 4;
const TOKENS_PER_PAGE: usize = 8;

/// Seed derived from the extraction inputs
///
/// The unit separator keeps `("a:b", "c")` and `("a", "b:c")` apart.
pub fn extraction_seed(document_id: &str, profile: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(document_id.as_bytes());
    hasher.update([0x1f]);
    hasher.update(profile.as_bytes());
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&hasher.finalize());
    seed
}

/// Hex form of the seed, handy for logs
pub fn extraction_fingerprint(document_id: &str, profile: &str) -> String {
    hex::encode(extraction_seed(document_id, profile))
}

fn byte(seed: &[u8; 32], index: usize) -> u8 {
    seed[index % seed.len()]
}

/// Confidence in [0.800, 0.990] rounded to three decimals
fn confidence(b: u8) -> f64 {
    let raw = 0.80 + (f64::from(b) / 255.0) * 0.19;
    (raw * 1000.0).round() / 1000.0
}

fn tokens(seed: &[u8; 32]) -> Vec<Token> {
    let count = 6 + usize::from(byte(seed, 0) % 7);
    (0..count)
        .map(|i| Token {
            token: VOCABULARY[usize::from(byte(seed, i + 1)) % VOCABULARY.len()].to_string(),
            confidence: confidence(byte(seed, i + 17)),
            page: 1 + (i / TOKENS_PER_PAGE) as u32,
        })
        .collect()
}

fn lines(tokens: &[Token]) -> Vec<Line> {
    tokens
        .chunks(TOKENS_PER_LINE)
        .enumerate()
        .map(|(i, chunk)| Line {
            line_number: i as u32 + 1,
            text: chunk
                .iter()
                .map(|t| t.token.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            token_count: chunk.len() as u32,
        })
        .collect()
}

fn table_candidates(seed: &[u8; 32], document_id: &str) -> Vec<TableCandidate> {
    let count = 1 + usize::from(byte(seed, 8) % 2);
    (0..count)
        .map(|i| TableCandidate {
            table_id: format!("{}:table-{}", document_id, i + 1),
            row_count: 2 + u32::from(byte(seed, 9 + i) % 8),
            column_count: 2 + u32::from(byte(seed, 11 + i) % 5),
            confidence: confidence(byte(seed, 13 + i)),
        })
        .collect()
}

fn derived_values(seed: &[u8; 32], line_count: usize) -> Vec<DerivedValue> {
    let source = |offset: usize| {
        format!(
            "line:{}",
            1 + usize::from(byte(seed, offset)) % line_count.max(1)
        )
    };
    let cents = u16::from_be_bytes([byte(seed, 4), byte(seed, 5)]) % 10_000;
    vec![
        DerivedValue {
            field: "invoice_number".to_string(),
            value: format!("INV-{}", hex::encode_upper(&seed[..3])),
            source: source(20),
        },
        DerivedValue {
            field: "total_amount".to_string(),
            value: format!("{}.{:02}", cents, byte(seed, 6) % 100),
            source: source(21),
        },
        DerivedValue {
            field: "document_date".to_string(),
            value: format!(
                "2024-{:02}-{:02}",
                1 + byte(seed, 7) % 12,
                1 + byte(seed, 12) % 28
            ),
            source: source(22),
        },
    ]
}

/// Produce extraction outputs for a document under a profile
pub fn simulate(document_id: &str, profile: &str) -> ExtractionOutputs {
    let seed = extraction_seed(document_id, profile);
    let tokens = tokens(&seed);
    let lines = lines(&tokens);
    let table_candidates = table_candidates(&seed, document_id);
    let derived_values = derived_values(&seed, lines.len());
    ExtractionOutputs {
        tokens,
        lines,
        table_candidates,
        derived_values,
    }
}

//! Fixed-vocabulary feature encoding.
//!
//! This is the encoder the classifier was trained against and is an opaque
//! contract shared with the hosted model: the filter set, tokenization,
//! hash, and index range must all stay in lockstep with the trainer's
//! encoder or inference output is meaningless. Do not change any of it
//! independently.

/// Characters stripped before tokenization (the trainer's filter set).
const FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// FNV-1a, the token hash fixed by the model contract.
fn hash_token(token: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for byte in token.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Tokenize and hash each token into `[1, vocabulary_size)`. Index 0 is
/// reserved, matching the trainer's one-hot scheme.
pub fn one_hot_encode(text: &str, vocabulary_size: usize) -> Vec<usize> {
    let lowered = text.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if FILTERS.contains(c) { ' ' } else { c })
        .collect();

    cleaned
        .split_whitespace()
        .map(|token| 1 + (hash_token(token) % (vocabulary_size as u64 - 1)) as usize)
        .collect()
}

/// Expand hashed indices into a binary vector of `vocabulary_size`.
pub fn vectorize(indices: &[usize], vocabulary_size: usize) -> Vec<f32> {
    let mut vector = vec![0.0; vocabulary_size];
    for &idx in indices {
        vector[idx] = 1.0;
    }
    vector
}

/// One message text to one feature vector.
pub fn encode(text: &str, vocabulary_size: usize) -> Vec<f32> {
    vectorize(&one_hot_encode(text, vocabulary_size), vocabulary_size)
}

//! Run results

use ahash::AHashMap;

/// Measurement outcomes from a repeated run
///
/// For each measurement key there is one bit vector per repetition, in
/// repetition order. A key measured several times within one repetition
/// concatenates its bits in circuit order.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub repetitions: usize,
    pub records: AHashMap<String, Vec<Vec<u8>>>,
}

impl RunResult {
    /// Outcome rows for one measurement key
    pub fn measurements(&self, key: &str) -> Option<&[Vec<u8>]> {
        self.records.get(key).map(|rows| rows.as_slice())
    }

    /// Fraction of repetitions whose bits for `key` equal `bits`
    pub fn frequency(&self, key: &str, bits: &[u8]) -> f64 {
        match self.records.get(key) {
            Some(rows) if !rows.is_empty() => {
                let hits = rows.iter().filter(|row| row.as_slice() == bits).count();
                hits as f64 / rows.len() as f64
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency() {
        let mut result = RunResult {
            repetitions: 4,
            records: AHashMap::default(),
        };
        result.records.insert(
            "m".into(),
            vec![vec![0, 1], vec![0, 1], vec![1, 1], vec![0, 1]],
        );
        assert_eq!(result.frequency("m", &[0, 1]), 0.75);
        assert_eq!(result.frequency("m", &[1, 0]), 0.0);
        assert_eq!(result.frequency("absent", &[0]), 0.0);
    }
}

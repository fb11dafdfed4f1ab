use crate::tracker::BoundingBox;

/// A detection that passed the class and confidence filter on the current
/// frame and can be clicked.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub bbox: BoundingBox,
    pub label: String,
    pub confidence: f32,
}

/// Selectable candidates of the most recent detection frame.
///
/// Order is detector emission order. Selection relies on that order to break
/// ties between overlapping boxes, so entries are never sorted or deduplicated.
#[derive(Debug, Clone, Default)]
pub struct CandidateRegistry {
    candidates: Vec<Candidate>,
}

impl CandidateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.candidates.clear();
    }

    pub fn record(&mut self, bbox: BoundingBox, label: impl Into<String>, confidence: f32) {
        self.candidates.push(Candidate {
            bbox,
            label: label.into(),
            confidence,
        });
    }

    pub fn as_slice(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_preserves_order_and_duplicates() {
        let mut registry = CandidateRegistry::new();
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        registry.record(bbox, "cat", 0.7);
        registry.record(bbox, "cat", 0.7);
        registry.record(bbox, "dog", 0.9);

        let labels: Vec<&str> = registry.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["cat", "cat", "dog"]);

        registry.reset();
        assert!(registry.is_empty());
    }
}

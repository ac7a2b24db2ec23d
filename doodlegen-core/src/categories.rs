use crate::PipelineError;

/// Ordered enumeration of the labels the model was trained on.
///
/// Label resolution is exact string match; the resolved index is what the
/// model consumes. Order is significant and must match the model's output
/// head, so the list is immutable once built.
#[derive(Debug, Clone)]
pub struct Categories {
    labels: Vec<String>,
}

impl Categories {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Parse a category file: one label per line, blank lines skipped.
    pub fn from_lines(text: &str) -> Self {
        let labels = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Self { labels }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Resolve a label to its model index.
    pub fn resolve(&self, label: &str) -> Result<usize, PipelineError> {
        self.labels
            .iter()
            .position(|l| l == label)
            .ok_or_else(|| PipelineError::UnknownLabel(label.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Categories {
        Categories::new(vec!["cat".into(), "dog".into(), "airplane".into()])
    }

    #[test]
    fn resolve_round_trips_every_label() {
        let cats = sample();
        for label in cats.labels() {
            let index = cats.resolve(label).unwrap();
            assert_eq!(cats.label(index), Some(label.as_str()));
        }
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = sample().resolve("submarine").unwrap_err();
        assert!(matches!(err, PipelineError::UnknownLabel(l) if l == "submarine"));
    }

    #[test]
    fn from_lines_skips_blanks_and_trims() {
        let cats = Categories::from_lines("cat\n\n  dog  \nairplane\n");
        assert_eq!(cats.labels(), &["cat", "dog", "airplane"]);
    }
}

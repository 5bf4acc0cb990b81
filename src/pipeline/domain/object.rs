use crate::pipeline::domain::observation::ObjectObservation;
use std::collections::HashMap;

const DEFAULT_LABELS: &[(&str, &str)] = &[
    ("book", "Book"),
    ("textbook", "Textbook"),
    ("novel", "Novel"),
    ("notebook", "Notebook"),
    ("binder", "Binder"),
    ("pencil", "Pencil"),
    ("pen", "Pen"),
    ("ballpoint", "Pen"),
    ("rubber eraser", "Eraser"),
    ("ruler", "Ruler"),
    ("scissors", "Scissors"),
    ("backpack", "Backpack"),
    ("laptop", "Laptop"),
    ("cell phone", "Cell phone"),
    ("cellular telephone", "Cell phone"),
    ("calculator", "Calculator"),
    ("water bottle", "Water bottle"),
    ("bottle", "Bottle"),
    ("cup", "Cup"),
    ("coffee mug", "Cup"),
];

/// Translates raw classifier labels into display categories.
#[derive(Debug, Clone)]
pub struct LabelTable {
    entries: HashMap<String, String>,
    fallback: String,
}

impl LabelTable {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            entries: HashMap::new(),
            fallback: fallback.into(),
        }
    }

    /// Built-in classroom categories with the given fallback label.
    pub fn classroom(fallback: impl Into<String>) -> Self {
        let mut table = Self::new(fallback);
        for (class_label, category) in DEFAULT_LABELS {
            table.insert(*class_label, *category);
        }
        table
    }

    pub fn insert(&mut self, class_label: impl AsRef<str>, category: impl Into<String>) {
        self.entries
            .insert(normalize(class_label.as_ref()), category.into());
    }

    pub fn extend<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (class_label, category) in entries {
            self.insert(class_label, category);
        }
    }

    pub fn translate(&self, class_label: &str) -> &str {
        self.entries
            .get(&normalize(class_label))
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }
}

fn normalize(class_label: &str) -> String {
    class_label.trim().to_lowercase()
}

/// Highest-probability candidate; the first one wins on equal probability.
/// Candidates with a NaN probability are ignored.
pub fn select_top(candidates: &[ObjectObservation]) -> Option<&ObjectObservation> {
    candidates
        .iter()
        .filter(|candidate| !candidate.probability.is_nan())
        .fold(None, |best, candidate| match best {
            Some(current) if current.probability >= candidate.probability => Some(current),
            _ => Some(candidate),
        })
}

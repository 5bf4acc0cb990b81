use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-length face feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Descriptor(Vec<f32>);

impl Descriptor {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Euclidean distance, `None` when the lengths differ.
    pub fn distance(&self, other: &Descriptor) -> Option<f32> {
        if self.0.len() != other.0.len() {
            return None;
        }
        let sum: f32 = self
            .0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        Some(sum.sqrt())
    }
}

impl From<Vec<f32>> for Descriptor {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Reference descriptors per person. Iteration follows insertion order,
/// which decides ties between equally distant people.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    entries: IndexMap<String, Vec<Descriptor>>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_person(mut self, label: impl Into<String>, descriptors: Vec<Descriptor>) -> Self {
        self.insert(label, descriptors);
        self
    }

    /// Adds references for `label`, appending when the label already exists.
    pub fn insert(&mut self, label: impl Into<String>, descriptors: Vec<Descriptor>) {
        self.entries
            .entry(label.into())
            .or_default()
            .extend(descriptors);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    fn iter(&self) -> impl Iterator<Item = (&String, &Vec<Descriptor>)> {
        self.entries.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Identity {
    Known(String),
    Unknown,
}

impl Identity {
    pub fn label(&self) -> Option<&str> {
        match self {
            Identity::Known(label) => Some(label),
            Identity::Unknown => None,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Known(label) => f.write_str(label),
            Identity::Unknown => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityMatch {
    pub identity: Identity,
    pub distance: f32,
}

/// Nearest-neighbour matching of descriptors against a gallery.
#[derive(Debug, Clone)]
pub struct IdentityMatcher {
    gallery: Gallery,
    threshold: f32,
}

impl IdentityMatcher {
    pub fn new(gallery: Gallery, threshold: f32) -> Self {
        Self { gallery, threshold }
    }

    /// Finds the closest person. A person's distance is the minimum over
    /// their references; a strictly smaller distance is needed to displace
    /// an earlier person. Matches at or beyond the threshold are unknown.
    pub fn best_match(&self, descriptor: &Descriptor) -> IdentityMatch {
        let mut best: Option<(&str, f32)> = None;

        for (label, references) in self.gallery.iter() {
            let nearest = references
                .iter()
                .filter_map(|reference| descriptor.distance(reference))
                .fold(None, |acc: Option<f32>, d| match acc {
                    Some(current) if current <= d => Some(current),
                    _ => Some(d),
                });

            if let Some(distance) = nearest {
                match best {
                    Some((_, current)) if current <= distance => {}
                    _ => best = Some((label, distance)),
                }
            }
        }

        match best {
            Some((label, distance)) if distance < self.threshold => IdentityMatch {
                identity: Identity::Known(label.to_string()),
                distance,
            },
            Some((_, distance)) => IdentityMatch {
                identity: Identity::Unknown,
                distance,
            },
            None => IdentityMatch {
                identity: Identity::Unknown,
                distance: f32::INFINITY,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(values: &[f32]) -> Descriptor {
        Descriptor::new(values.to_vec())
    }

    fn class_gallery() -> Gallery {
        Gallery::new()
            .with_person("Ana", vec![d(&[0.0, 0.0])])
            .with_person("Ben", vec![d(&[1.0, 0.0])])
    }

    #[test]
    fn euclidean_distance() {
        assert_eq!(d(&[0.0, 0.0]).distance(&d(&[3.0, 4.0])), Some(5.0));
        assert_eq!(d(&[0.0]).distance(&d(&[0.0, 1.0])), None);
    }

    #[test]
    fn close_descriptor_resolves_to_named_person() {
        let matcher = IdentityMatcher::new(class_gallery(), 0.5);
        let result = matcher.best_match(&d(&[0.0, 0.3]));
        assert_eq!(result.identity, Identity::Known("Ana".to_string()));
        assert!((result.distance - 0.3).abs() < 1e-6);
    }

    #[test]
    fn distant_descriptor_is_unknown() {
        let matcher = IdentityMatcher::new(class_gallery(), 0.5);
        let result = matcher.best_match(&d(&[0.5, 0.9]));
        assert_eq!(result.identity, Identity::Unknown);
        assert!(result.distance >= 0.5);
    }

    #[test]
    fn distance_equal_to_threshold_is_unknown() {
        let matcher = IdentityMatcher::new(class_gallery(), 0.5);
        let result = matcher.best_match(&d(&[0.0, -0.5]));
        assert_eq!(result.identity, Identity::Unknown);
    }

    #[test]
    fn ties_go_to_first_inserted_person() {
        let matcher = IdentityMatcher::new(class_gallery(), 1.0);
        let result = matcher.best_match(&d(&[0.5, 0.0]));
        assert_eq!(result.identity, Identity::Known("Ana".to_string()));
    }

    #[test]
    fn person_distance_uses_closest_reference() {
        let gallery = Gallery::new()
            .with_person("Ana", vec![d(&[0.0, 0.0])])
            .with_person("Ben", vec![d(&[5.0, 5.0]), d(&[0.0, 0.2])]);
        let matcher = IdentityMatcher::new(gallery, 0.5);
        let result = matcher.best_match(&d(&[0.0, 0.15]));
        assert_eq!(result.identity, Identity::Known("Ben".to_string()));
    }

    #[test]
    fn mismatched_lengths_never_match() {
        let matcher = IdentityMatcher::new(class_gallery(), 0.5);
        let result = matcher.best_match(&d(&[0.0, 0.0, 0.0]));
        assert_eq!(result.identity, Identity::Unknown);
        assert!(result.distance.is_infinite());
    }

    #[test]
    fn empty_gallery_yields_unknown() {
        let matcher = IdentityMatcher::new(Gallery::new(), 0.5);
        assert_eq!(matcher.best_match(&d(&[0.0])).identity, Identity::Unknown);
    }

    #[test]
    fn unknown_displays_as_literal() {
        assert_eq!(Identity::Unknown.to_string(), "unknown");
        assert_eq!(Identity::Known("Ana".into()).to_string(), "Ana");
    }
}

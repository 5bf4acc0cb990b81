use crate::error::GalleryLoadError;
use crate::pipeline::domain::{Descriptor, Gallery};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{info, warn};

/// Yields the reference descriptors for one person.
#[async_trait]
pub trait DescriptorSource: Send + Sync {
    async fn reference_descriptors(&self, label: &str)
        -> Result<Vec<Descriptor>, GalleryLoadError>;
}

/// Reads `<dir>/<label>.json`, an array of descriptors.
#[derive(Debug, Clone)]
pub struct JsonDescriptorSource {
    dir: PathBuf,
}

impl JsonDescriptorSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl DescriptorSource for JsonDescriptorSource {
    async fn reference_descriptors(
        &self,
        label: &str,
    ) -> Result<Vec<Descriptor>, GalleryLoadError> {
        let path = self.dir.join(format!("{label}.json"));
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(GalleryLoadError::MissingReference(label.to_string()));
            }
            Err(source) => {
                return Err(GalleryLoadError::Io {
                    label: label.to_string(),
                    source,
                });
            }
        };

        let descriptors: Vec<Descriptor> =
            serde_json::from_slice(&bytes).map_err(|source| GalleryLoadError::Parse {
                label: label.to_string(),
                source,
            })?;

        if descriptors.iter().all(Descriptor::is_empty) {
            return Err(GalleryLoadError::Undetectable(label.to_string()));
        }

        Ok(descriptors.into_iter().filter(|d| !d.is_empty()).collect())
    }
}

/// A gallery plus the labels that could not be loaded.
#[derive(Debug)]
pub struct GalleryLoad {
    pub gallery: Gallery,
    pub errors: Vec<GalleryLoadError>,
}

/// Loads every label in order. A failing label is reported and skipped; the
/// others still load, and the skipped person simply cannot be matched.
pub async fn load_gallery(labels: &[String], source: &dyn DescriptorSource) -> GalleryLoad {
    let mut gallery = Gallery::new();
    let mut errors = Vec::new();

    for label in labels {
        match source.reference_descriptors(label).await {
            Ok(descriptors) => gallery.insert(label.clone(), descriptors),
            Err(e) => {
                warn!(label = %label, error = %e, "Skipping gallery entry");
                errors.push(e);
            }
        }
    }

    info!(
        "Gallery loaded with {} of {} people",
        gallery.len(),
        labels.len()
    );
    GalleryLoad { gallery, errors }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn loads_descriptor_files_in_label_order() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("Ben.json"), "[[1.0, 0.0]]").expect("write");
        std::fs::write(dir.path().join("Ana.json"), "[[0.0, 0.0], [0.1, 0.0]]").expect("write");

        let source = JsonDescriptorSource::new(dir.path());
        let load = load_gallery(&labels(&["Ana", "Ben"]), &source).await;

        assert!(load.errors.is_empty());
        assert_eq!(load.gallery.labels().collect::<Vec<_>>(), vec!["Ana", "Ben"]);
    }

    #[tokio::test]
    async fn missing_and_broken_labels_do_not_abort_others() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("Ana.json"), "[[0.0, 0.0]]").expect("write");
        std::fs::write(dir.path().join("Cleo.json"), "not json").expect("write");
        std::fs::write(dir.path().join("Dev.json"), "[]").expect("write");

        let source = JsonDescriptorSource::new(dir.path());
        let load = load_gallery(&labels(&["Ana", "Ben", "Cleo", "Dev"]), &source).await;

        assert_eq!(load.gallery.labels().collect::<Vec<_>>(), vec!["Ana"]);
        assert_eq!(load.errors.len(), 3);
        assert!(matches!(&load.errors[0], GalleryLoadError::MissingReference(l) if l == "Ben"));
        assert!(matches!(&load.errors[1], GalleryLoadError::Parse { label, .. } if label == "Cleo"));
        assert!(matches!(&load.errors[2], GalleryLoadError::Undetectable(l) if l == "Dev"));
        assert_eq!(load.errors[1].label(), "Cleo");
    }
}

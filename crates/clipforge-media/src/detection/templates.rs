//! Reference banner templates.

use std::path::Path;

use clipforge_models::KillType;
use image::RgbImage;
use tracing::{info, warn};

/// File name of each template inside the template directory.
pub fn template_filename(kind: KillType) -> Option<&'static str> {
    match kind {
        KillType::Triple => Some("triple_kill.png"),
        KillType::Double => Some("double_kill.png"),
        KillType::Single => Some("kill.png"),
        KillType::Clutch | KillType::None => None,
    }
}

/// Up to three reference images, one per matchable kill type.
///
/// A missing image disables its tier; an empty set detects nothing.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: Vec<(KillType, RgbImage)>,
}

impl TemplateSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load whichever templates exist in `dir`. Absent or undecodable files
    /// disable their tier instead of failing the load.
    pub fn load_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let mut set = Self::empty();

        for kind in KillType::MATCHABLE {
            let Some(name) = template_filename(kind) else {
                continue;
            };
            let path = dir.join(name);
            if !path.exists() {
                warn!(kill_type = %kind, path = %path.display(), "Template missing, tier disabled");
                continue;
            }
            match image::open(&path) {
                Ok(image) => set = set.with_template(kind, image.to_rgb8()),
                Err(e) => {
                    warn!(kill_type = %kind, path = %path.display(), error = %e, "Template unreadable, tier disabled");
                }
            }
        }

        info!(available = ?set.available(), "Loaded kill banner templates");
        set
    }

    /// Add or replace the template for `kind`. Non-matchable kinds are ignored.
    pub fn with_template(mut self, kind: KillType, image: RgbImage) -> Self {
        if template_filename(kind).is_none() || image.width() == 0 || image.height() == 0 {
            return self;
        }
        self.templates.retain(|(k, _)| *k != kind);
        self.templates.push((kind, image));
        self.templates.sort_by_key(|(k, _)| std::cmp::Reverse(k.tier()));
        self
    }

    pub fn get(&self, kind: KillType) -> Option<&RgbImage> {
        self.templates.iter().find(|(k, _)| *k == kind).map(|(_, img)| img)
    }

    /// Templates in priority order (triple, double, single).
    pub fn iter(&self) -> impl Iterator<Item = (KillType, &RgbImage)> {
        self.templates.iter().map(|(k, img)| (*k, img))
    }

    pub fn available(&self) -> Vec<KillType> {
        self.templates.iter().map(|(k, _)| *k).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_load_dir_skips_missing_templates() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(30, 10, Rgb([200, 0, 0]))
            .save(dir.path().join("triple_kill.png"))
            .unwrap();
        RgbImage::from_pixel(30, 10, Rgb([0, 200, 0]))
            .save(dir.path().join("kill.png"))
            .unwrap();

        let set = TemplateSet::load_dir(dir.path());
        assert_eq!(set.available(), vec![KillType::Triple, KillType::Single]);
        assert!(set.get(KillType::Double).is_none());
    }

    #[test]
    fn test_empty_dir_yields_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TemplateSet::load_dir(dir.path()).is_empty());
    }

    #[test]
    fn test_corrupt_template_disables_only_its_tier() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("triple_kill.png"), b"not a png").unwrap();
        RgbImage::from_pixel(30, 10, Rgb([0, 0, 200]))
            .save(dir.path().join("double_kill.png"))
            .unwrap();

        let set = TemplateSet::load_dir(dir.path());
        assert_eq!(set.available(), vec![KillType::Double]);
        assert!(set.get(KillType::Triple).is_none());
    }

    #[test]
    fn test_priority_order_independent_of_insertion() {
        let img = RgbImage::new(2, 2);
        let set = TemplateSet::empty()
            .with_template(KillType::Single, img.clone())
            .with_template(KillType::Triple, img.clone())
            .with_template(KillType::Clutch, img.clone())
            .with_template(KillType::Double, img);
        assert_eq!(
            set.available(),
            vec![KillType::Triple, KillType::Double, KillType::Single]
        );
    }
}

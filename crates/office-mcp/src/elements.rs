//! Element ids: stable uuids handed out for shapes, per presentation and slide.

use std::collections::{BTreeMap, HashMap};

use office_core::ShapeInfo;
use uuid::Uuid;

/// Shape id → element id for every slide a caller has looked at
#[derive(Debug, Default)]
pub struct ElementRegistry {
    slides: HashMap<(String, usize), BTreeMap<u32, String>>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Element id of a shape, issuing one the first time it is seen
    pub fn register(&mut self, presentation: &str, slide: usize, shape_id: u32) -> String {
        self.slides
            .entry((presentation.to_string(), slide))
            .or_default()
            .entry(shape_id)
            .or_insert_with(|| Uuid::new_v4().to_string())
            .clone()
    }

    /// Fill in `element_id` on each shape
    pub fn annotate(&mut self, presentation: &str, slide: usize, shapes: &mut [ShapeInfo]) {
        for shape in shapes {
            shape.element_id = Some(self.register(presentation, slide, shape.id));
        }
    }

    pub fn annotated(&mut self, presentation: &str, slide: usize, mut shape: ShapeInfo) -> ShapeInfo {
        shape.element_id = Some(self.register(presentation, slide, shape.id));
        shape
    }

    /// Shape id an element id was issued for
    pub fn shape_id(&self, presentation: &str, slide: usize, element_id: &str) -> Option<u32> {
        self.slides
            .get(&(presentation.to_string(), slide))?
            .iter()
            .find(|(_, id)| id.as_str() == element_id)
            .map(|(shape, _)| *shape)
    }

    pub fn mappings(&self, presentation: &str, slide: usize) -> Option<&BTreeMap<u32, String>> {
        self.slides.get(&(presentation.to_string(), slide))
    }

    /// Drop a deleted slide's ids and move the ids of later slides down by one
    pub fn slide_deleted(&mut self, presentation: &str, slide: usize) {
        self.slides.remove(&(presentation.to_string(), slide));
        let mut later: Vec<usize> = self
            .slides
            .keys()
            .filter(|(p, s)| p == presentation && *s > slide)
            .map(|(_, s)| *s)
            .collect();
        later.sort_unstable();
        for s in later {
            if let Some(ids) = self.slides.remove(&(presentation.to_string(), s)) {
                self.slides.insert((presentation.to_string(), s - 1), ids);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_stable() {
        let mut registry = ElementRegistry::new();
        let first = registry.register("deck.pptx", 1, 4);
        assert_eq!(registry.register("deck.pptx", 1, 4), first);
        assert_ne!(registry.register("deck.pptx", 2, 4), first);
        assert!(Uuid::parse_str(&first).is_ok());
        assert_eq!(registry.shape_id("deck.pptx", 1, &first), Some(4));
        assert_eq!(registry.shape_id("other.pptx", 1, &first), None);
    }

    #[test]
    fn test_annotate() {
        let mut registry = ElementRegistry::new();
        let mut shapes = vec![ShapeInfo::new(2, "Title 1", 14), ShapeInfo::new(3, "Box", 17)];
        registry.annotate("deck.pptx", 1, &mut shapes);
        let mappings = registry.mappings("deck.pptx", 1).unwrap();
        assert_eq!(mappings.len(), 2);
        assert_eq!(shapes[1].element_id.as_ref(), mappings.get(&3));
    }

    #[test]
    fn test_slide_deleted_shifts_later_slides() {
        let mut registry = ElementRegistry::new();
        registry.register("deck.pptx", 1, 2);
        let on_three = registry.register("deck.pptx", 3, 5);
        registry.register("deck.pptx", 2, 9);

        registry.slide_deleted("deck.pptx", 2);
        assert!(registry.mappings("deck.pptx", 3).is_none());
        assert_eq!(registry.shape_id("deck.pptx", 2, &on_three), Some(5));
        assert!(registry.mappings("deck.pptx", 1).is_some());
    }
}

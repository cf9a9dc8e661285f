use std::collections::BTreeMap;

use foundation::handles::HandleAllocator;
use tracing::debug;

use crate::components::Tag;
use crate::object::{ObjectId, SceneObject};

/// Running totals of GPU-backed objects entering and leaving the graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ResourceStats {
    pub created: u64,
    pub released: u64,
}

impl ResourceStats {
    pub fn live(&self) -> u64 {
        self.created - self.released
    }
}

/// The overlay's scene graph.
///
/// Objects live in generational slots. A tag index maps each replacement
/// group to the handles it owns, in insertion order, so replacing a group
/// touches only that group's objects.
///
/// Removing a GPU-backed object drops its CPU data immediately and queues its
/// handle on the release list. The renderer drains that list before drawing
/// and frees the matching buffers.
#[derive(Debug, Default)]
pub struct SceneGraph {
    handles: HandleAllocator,
    slots: Vec<Option<SceneObject>>,
    by_tag: BTreeMap<Tag, Vec<ObjectId>>,
    generations: BTreeMap<Tag, u64>,
    pending_release: Vec<ObjectId>,
    stats: ResourceStats,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a permanent object. Its tag is forced to [`Tag::PERSISTENT`].
    pub fn add_persistent(&mut self, object: SceneObject) -> ObjectId {
        let id = self.insert(object.tagged(Tag::PERSISTENT));
        self.by_tag.entry(Tag::PERSISTENT).or_default().push(id);
        id
    }

    /// Removes every object carrying `tag` and inserts `objects` in their
    /// place, tagged `tag`, in the given order.
    ///
    /// Holding `&mut self` for the whole swap means no reader can observe the
    /// graph between removal and insertion.
    pub fn replace_tagged(&mut self, tag: Tag, objects: Vec<SceneObject>) -> Vec<ObjectId> {
        let old = self.by_tag.remove(&tag).unwrap_or_default();
        let removed = old.len();
        for id in old {
            self.remove(id);
        }

        let ids: Vec<ObjectId> = objects
            .into_iter()
            .map(|object| self.insert(object.tagged(tag)))
            .collect();
        if !ids.is_empty() {
            self.by_tag.insert(tag, ids.clone());
        }
        *self.generations.entry(tag).or_insert(0) += 1;

        debug!(%tag, removed, inserted = ids.len(), "replaced tagged objects");
        ids
    }

    /// Disposes every object and empties the graph.
    pub fn clear_all(&mut self) {
        let ids: Vec<ObjectId> = self.by_tag.values().flatten().copied().collect();
        for id in ids {
            self.remove(id);
        }
        self.by_tag.clear();
        self.slots.clear();
        self.handles.release_all();
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        if !self.handles.is_live(id.0) {
            return None;
        }
        self.slots.get(id.index() as usize)?.as_ref()
    }

    /// Objects carrying `tag`, in the order they were inserted.
    pub fn objects_with_tag(&self, tag: Tag) -> Vec<(ObjectId, &SceneObject)> {
        self.by_tag
            .get(&tag)
            .into_iter()
            .flatten()
            .filter_map(|id| self.get(*id).map(|o| (*id, o)))
            .collect()
    }

    /// How many times `tag` has been replaced.
    pub fn tag_generation(&self, tag: Tag) -> u64 {
        self.generations.get(&tag).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.by_tag
            .values()
            .flatten()
            .filter_map(|id| self.get(*id).map(|o| (*id, o)))
    }

    pub fn len(&self) -> usize {
        self.handles.live_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn gpu_object_count(&self) -> usize {
        self.iter()
            .filter(|(_, o)| o.drawable.uses_gpu_resources())
            .count()
    }

    pub fn advance_animations(&mut self, dt_s: f64) {
        for object in self.slots.iter_mut().flatten() {
            object.advance(dt_s);
        }
    }

    /// Handles whose GPU resources must be freed by the renderer.
    pub fn take_released(&mut self) -> Vec<ObjectId> {
        std::mem::take(&mut self.pending_release)
    }

    /// Drops the release queue without handing it to a renderer, for when
    /// the buffers it refers to disappeared with a lost context.
    pub fn discard_released(&mut self) {
        self.pending_release.clear();
    }

    pub fn pending_release_count(&self) -> usize {
        self.pending_release.len()
    }

    pub fn resource_stats(&self) -> ResourceStats {
        self.stats
    }

    fn insert(&mut self, object: SceneObject) -> ObjectId {
        let id = ObjectId(self.handles.allocate());
        let slot = id.index() as usize;
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, || None);
        }
        if object.drawable.uses_gpu_resources() {
            self.stats.created += 1;
        }
        self.slots[slot] = Some(object);
        id
    }

    fn remove(&mut self, id: ObjectId) {
        if !self.handles.release(id.0) {
            // Already gone: re-entrant updates make this expected.
            debug!(%id, "skipping removal of stale object");
            return;
        }
        let Some(object) = self.slots.get_mut(id.index() as usize).and_then(Option::take) else {
            return;
        };
        if object.drawable.uses_gpu_resources() {
            self.stats.released += 1;
            self.pending_release.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SceneGraph;
    use crate::components::{Animation, Color, Drawable3D, Material, Tag, Transform};
    use crate::object::SceneObject;
    use foundation::math::Vec3;
    use pretty_assertions::assert_eq;

    fn marker(name: &'static str, x: f64) -> SceneObject {
        SceneObject::new(
            name,
            Drawable3D::cuboid(1.0, 1.0, 1.0, Material::opaque(Color(0x00ff00))),
            Transform::translate(Vec3::new(x, 0.0, 0.0)),
        )
    }

    fn light() -> SceneObject {
        SceneObject::new(
            "light",
            Drawable3D::AmbientLight {
                color: Color::WHITE,
                intensity: 1.0,
            },
            Transform::identity(),
        )
    }

    fn names(scene: &SceneGraph, tag: Tag) -> Vec<&'static str> {
        scene
            .objects_with_tag(tag)
            .into_iter()
            .map(|(_, o)| o.name)
            .collect()
    }

    #[test]
    fn replace_returns_exactly_the_new_objects_in_order() {
        let mut scene = SceneGraph::new();
        scene.add_persistent(light());
        scene.replace_tagged(Tag::ROUTE, vec![marker("a", 0.0), marker("b", 1.0)]);
        scene.replace_tagged(
            Tag::ROUTE,
            vec![marker("c", 2.0), marker("d", 3.0), marker("e", 4.0)],
        );

        assert_eq!(names(&scene, Tag::ROUTE), vec!["c", "d", "e"]);
        assert_eq!(names(&scene, Tag::PERSISTENT), vec!["light"]);
        assert_eq!(scene.len(), 4);
        assert_eq!(scene.tag_generation(Tag::ROUTE), 2);
    }

    #[test]
    fn inserted_objects_take_the_replacement_tag() {
        let mut scene = SceneGraph::new();
        let ids = scene.replace_tagged(Tag::ROUTE, vec![marker("a", 0.0)]);
        assert_eq!(scene.get(ids[0]).map(|o| o.tag), Some(Tag::ROUTE));
    }

    #[test]
    fn replacing_with_nothing_empties_the_tag() {
        let mut scene = SceneGraph::new();
        scene.replace_tagged(Tag::ROUTE, vec![marker("a", 0.0)]);
        scene.replace_tagged(Tag::ROUTE, Vec::new());
        assert!(scene.objects_with_tag(Tag::ROUTE).is_empty());
        assert!(scene.is_empty());
    }

    #[test]
    fn removed_gpu_objects_are_queued_for_release() {
        let mut scene = SceneGraph::new();
        scene.add_persistent(light());
        let old = scene.replace_tagged(Tag::ROUTE, vec![marker("a", 0.0), marker("b", 1.0)]);
        scene.replace_tagged(Tag::ROUTE, vec![marker("c", 2.0)]);

        let released = scene.take_released();
        assert_eq!(released, old);
        assert!(scene.take_released().is_empty());

        let stats = scene.resource_stats();
        assert_eq!(stats.created, 3);
        assert_eq!(stats.released, 2);
        assert_eq!(stats.live(), scene.gpu_object_count() as u64);
    }

    #[test]
    fn stale_handles_do_not_resolve() {
        let mut scene = SceneGraph::new();
        let old = scene.replace_tagged(Tag::ROUTE, vec![marker("a", 0.0)]);
        let new = scene.replace_tagged(Tag::ROUTE, vec![marker("b", 1.0)]);

        // Same slot, new generation.
        assert_eq!(old[0].index(), new[0].index());
        assert!(scene.get(old[0]).is_none());
        assert_eq!(scene.get(new[0]).map(|o| o.name), Some("b"));
    }

    #[test]
    fn clear_all_disposes_everything() {
        let mut scene = SceneGraph::new();
        scene.add_persistent(light());
        scene.replace_tagged(Tag::ROUTE, vec![marker("a", 0.0), marker("b", 1.0)]);
        scene.clear_all();

        assert!(scene.is_empty());
        assert_eq!(scene.iter().count(), 0);
        assert_eq!(scene.resource_stats().live(), 0);
        assert_eq!(scene.pending_release_count(), 2);

        scene.clear_all();
        assert!(scene.is_empty());
    }

    #[test]
    fn animations_advance_in_place() {
        let mut scene = SceneGraph::new();
        let ids = scene.replace_tagged(
            Tag::ROUTE,
            vec![marker("a", 5.0).with_animation(Animation::new(1.0, 0.5, 1.0))],
        );
        scene.advance_animations(0.25);

        let object = scene.get(ids[0]).expect("object");
        assert_eq!(object.base_position(), Vec3::new(5.0, 0.0, 0.0));
        let p = object.transform.position();
        assert!((p.y - 0.5).abs() < 1e-9);
    }
}

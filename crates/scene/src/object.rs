use foundation::handles::Handle;

use crate::components::{Animation, Drawable3D, Tag, Transform};

/// Handle to an object stored in a [`crate::SceneGraph`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub Handle);

impl ObjectId {
    pub fn index(&self) -> u32 {
        self.0.index()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: &'static str,
    pub tag: Tag,
    pub drawable: Drawable3D,
    pub transform: Transform,
    pub animation: Option<Animation>,
}

impl SceneObject {
    pub fn new(name: &'static str, drawable: Drawable3D, transform: Transform) -> Self {
        Self {
            name,
            tag: Tag::PERSISTENT,
            drawable,
            transform,
            animation: None,
        }
    }

    pub fn tagged(self, tag: Tag) -> Self {
        Self { tag, ..self }
    }

    /// Attaches an animation that oscillates around the current position.
    pub fn with_animation(self, animation: Animation) -> Self {
        let base = self.transform.position();
        Self {
            animation: Some(animation.anchored_at(base)),
            ..self
        }
    }

    pub fn advance(&mut self, dt_s: f64) {
        if let Some(animation) = self.animation.as_mut() {
            animation.advance(&mut self.transform, dt_s);
        }
    }

    /// Picks up `previous`'s animation phase and pose when both are animated
    /// objects of the same name resting at the same base position. A rebuilt
    /// object then carries on from where the old one was.
    pub fn continue_motion_from(&mut self, previous: &SceneObject) -> bool {
        let (Some(animation), Some(old)) = (self.animation.as_mut(), previous.animation.as_ref())
        else {
            return false;
        };
        if self.name != previous.name || animation.base().distance(old.base()) > 1e-9 {
            return false;
        }
        animation.resume_from(old);
        self.transform = previous.transform;
        true
    }

    /// Position ignoring any animation offset.
    pub fn base_position(&self) -> foundation::math::Vec3 {
        match &self.animation {
            Some(animation) => animation.base(),
            None => self.transform.position(),
        }
    }
}

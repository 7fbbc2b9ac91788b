// SPDX: CC0-1.0

use crate::geometry::Geometry;
use log::debug;
use std::collections::BTreeMap;

/// Which part of the scene a mesh belongs to, back to front.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Grid,
    Axes,
    Graph,
}

/// Whatever draws the scene.
///
/// Meshes are owned handles: the plotter hands each one back to
/// [`Renderer::dispose`] exactly once, before it drops the geometry they
/// were made from.
pub trait Renderer {
    type Mesh;

    fn submit(&mut self, layer: Layer, geometry: &Geometry) -> Self::Mesh;

    fn dispose(&mut self, mesh: Self::Mesh);
}

/// Handle to a mesh in a [`Scene`]. Deliberately not `Clone`, so it can only
/// be disposed once.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MeshId(u64);

impl MeshId {
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// A renderer that keeps everything it's given in memory.
///
/// The shell exports it to gnuplot, and it doubles as a leak check: every
/// disposal is counted and disposing an unknown mesh is recorded.
#[derive(Debug, Default)]
pub struct Scene {
    meshes: BTreeMap<u64, (Layer, Geometry)>,
    next: u64,
    submitted: usize,
    disposed: usize,
    unknown: usize,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live meshes in submission order.
    pub fn meshes(&self) -> impl Iterator<Item = (Layer, &Geometry)> {
        self.meshes.values().map(|(layer, geometry)| (*layer, geometry))
    }

    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = &Geometry> {
        self.meshes()
            .filter(move |(l, _)| *l == layer)
            .map(|(_, geometry)| geometry)
    }

    pub fn get(&self, id: &MeshId) -> Option<&Geometry> {
        self.meshes.get(&id.0).map(|(_, geometry)| geometry)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub const fn submitted(&self) -> usize {
        self.submitted
    }

    pub const fn disposed(&self) -> usize {
        self.disposed
    }

    /// Disposals of meshes this scene never had or already dropped.
    pub const fn unknown_disposals(&self) -> usize {
        self.unknown
    }
}

impl Renderer for Scene {
    type Mesh = MeshId;

    fn submit(&mut self, layer: Layer, geometry: &Geometry) -> MeshId {
        let id = self.next;
        self.next += 1;
        self.submitted += 1;
        self.meshes.insert(id, (layer, geometry.clone()));
        MeshId(id)
    }

    fn dispose(&mut self, mesh: MeshId) {
        self.disposed += 1;
        if self.meshes.remove(&mesh.0).is_none() {
            debug!("disposing unknown mesh {}", mesh.0);
            self.unknown += 1;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Vec3;

    #[test]
    fn submit_and_dispose() {
        let mut scene = Scene::new();
        let a = scene.submit(Layer::Graph, &Geometry::Point(Vec3::ZERO));
        let b = scene.submit(Layer::Grid, &Geometry::Lines(Vec::new()));
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.get(&a), Some(&Geometry::Point(Vec3::ZERO)));
        assert_eq!(scene.layer(Layer::Grid).count(), 1);

        scene.dispose(a);
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.disposed(), 1);
        assert_eq!(scene.unknown_disposals(), 0);
        assert_ne!(b.get(), 0);
    }

    #[test]
    fn unknown_disposal_is_counted() {
        let mut scene = Scene::new();
        scene.dispose(MeshId(42));
        assert_eq!(scene.disposed(), 1);
        assert_eq!(scene.unknown_disposals(), 1);
        assert!(scene.is_empty());
    }
}

//! Scene hierarchy classes

use super::{Quaternionf, Vector3f};
use crate::error::Result;
use crate::object::{Component, Mesh, ObjectPointer, UnityClass};
use crate::serializer::{ALIGN_BYTES, Direction, Transfer, TypeSerializer};
use unity_graft_core::class_id;

/// One entry of a GameObject's component list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentPair {
    pub component: ObjectPointer<Component>,
}

impl Transfer for ComponentPair {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        serializer.field(&mut self.component, 0)
    }
}

/// Unity GameObject
#[derive(Debug, Clone, PartialEq)]
pub struct GameObject {
    pub components: Vec<ComponentPair>,
    pub layer: u32,
    pub name: String,
    /// Index into the project's tag table
    pub tag: u16,
    pub is_active: bool,
}

impl Default for GameObject {
    fn default() -> Self {
        Self {
            components: Vec::new(),
            layer: 0,
            name: String::new(),
            tag: 0,
            is_active: true,
        }
    }
}

impl GameObject {
    pub fn component_pointers(&self) -> impl Iterator<Item = &ObjectPointer<Component>> {
        self.components.iter().map(|pair| &pair.component)
    }
}

impl UnityClass for GameObject {
    const CLASS_ID: i32 = class_id::GAME_OBJECT;
}

impl Transfer for GameObject {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        serializer.field(&mut self.components, 0)?;
        serializer.field(&mut self.layer, 0)?;
        serializer.field(&mut self.name, 0)?;
        serializer.field(&mut self.tag, 0)?;
        serializer.field(&mut self.is_active, ALIGN_BYTES)
    }
}

/// Position, rotation and scale of a GameObject
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub game_object: ObjectPointer<GameObject>,
    pub local_rotation: Quaternionf,
    pub local_position: Vector3f,
    pub local_scale: Vector3f,
    pub children: Vec<ObjectPointer<Transform>>,
    pub father: ObjectPointer<Transform>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            game_object: ObjectPointer::default(),
            local_rotation: Quaternionf::identity(),
            local_position: Vector3f::default(),
            local_scale: Vector3f::one(),
            children: Vec::new(),
            father: ObjectPointer::default(),
        }
    }
}

impl Transform {
    pub fn is_root(&self) -> bool {
        self.father.is_null()
    }
}

impl UnityClass for Transform {
    const CLASS_ID: i32 = class_id::TRANSFORM;
}

impl Transfer for Transform {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        serializer.field(&mut self.game_object, 0)?;
        serializer.field(&mut self.local_rotation, 0)?;
        serializer.field(&mut self.local_position, 0)?;
        serializer.field(&mut self.local_scale, 0)?;
        serializer.field(&mut self.children, 0)?;
        serializer.field(&mut self.father, 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshFilter {
    pub game_object: ObjectPointer<GameObject>,
    pub mesh: ObjectPointer<Mesh>,
}

impl UnityClass for MeshFilter {
    const CLASS_ID: i32 = class_id::MESH_FILTER;
}

impl Transfer for MeshFilter {
    fn transfer<D: Direction>(&mut self, serializer: &mut TypeSerializer<'_, D>) -> Result<()> {
        serializer.field(&mut self.game_object, 0)?;
        serializer.field(&mut self.mesh, 0)
    }
}

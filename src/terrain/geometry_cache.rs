//! Vertex and index buffers shared by every level.
//!
//! Geometry is defined in grid units, so one copy of each mesh serves all
//! levels; per-draw scale and offset place it. Buffers are built on first
//! request and live until the cache is dropped.

use crate::core::error::Error;
use crate::core::types::Result;
use crate::render::device::RenderDevice;

use super::interior_trim::TrimOrientation;
use super::vertex::{TerrainVertex, Topology};
use super::{block, edge_stitches, interior_trim, ring_fixups};

/// One shared vertex/index buffer pair
pub struct SharedMesh<B> {
    pub vertices: B,
    pub indices: B,
    pub vertex_count: u32,
    pub index_count: u32,
    pub topology: Topology,
}

impl<B> SharedMesh<B> {
    pub fn as_ref(&self) -> MeshRef<'_, B> {
        MeshRef {
            vertices: &self.vertices,
            indices: &self.indices,
            index_count: self.index_count,
            topology: self.topology,
        }
    }
}

/// Borrowed view of the buffers a draw binds
pub struct MeshRef<'a, B> {
    pub vertices: &'a B,
    pub indices: &'a B,
    pub index_count: u32,
    pub topology: Topology,
}

impl<B> Clone for MeshRef<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for MeshRef<'_, B> {}

/// One vertex buffer per orientation over a single index buffer
pub struct TrimMeshes<B> {
    pub vertices: [B; 4],
    pub indices: B,
    pub vertex_count: u32,
    pub index_count: u32,
}

impl<B> TrimMeshes<B> {
    pub fn mesh(&self, orientation: TrimOrientation) -> MeshRef<'_, B> {
        MeshRef {
            vertices: &self.vertices[orientation.index()],
            indices: &self.indices,
            index_count: self.index_count,
            topology: Topology::TriangleStrip,
        }
    }
}

pub struct GeometryCache<D: RenderDevice> {
    block: Option<SharedMesh<D::Buffer>>,
    ring_fixups: Option<SharedMesh<D::Buffer>>,
    interior_trim: Option<TrimMeshes<D::Buffer>>,
    edge_stitches: Option<SharedMesh<D::Buffer>>,
}

impl<D: RenderDevice> Default for GeometryCache<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: RenderDevice> GeometryCache<D> {
    pub fn new() -> Self {
        Self { block: None, ring_fixups: None, interior_trim: None, edge_stitches: None }
    }

    pub fn block_mesh(&mut self, device: &mut D) -> Result<&SharedMesh<D::Buffer>> {
        if self.block.is_none() {
            self.block = Some(upload(device, "Block", &block::vertices(), &block::indices(), Topology::TriangleList)?);
        }
        self.block.as_ref().ok_or_else(|| Error::Device("block mesh missing".into()))
    }

    pub fn ring_fixups_mesh(&mut self, device: &mut D) -> Result<&SharedMesh<D::Buffer>> {
        if self.ring_fixups.is_none() {
            self.ring_fixups = Some(upload(
                device,
                "Ring Fixups",
                &ring_fixups::vertices(),
                &ring_fixups::indices(),
                Topology::TriangleStrip,
            )?);
        }
        self.ring_fixups.as_ref().ok_or_else(|| Error::Device("ring fixup mesh missing".into()))
    }

    pub fn edge_stitches_mesh(&mut self, device: &mut D) -> Result<&SharedMesh<D::Buffer>> {
        if self.edge_stitches.is_none() {
            self.edge_stitches = Some(upload(
                device,
                "Edge Stitches",
                &edge_stitches::vertices(),
                &edge_stitches::indices(),
                Topology::TriangleStrip,
            )?);
        }
        self.edge_stitches.as_ref().ok_or_else(|| Error::Device("edge stitch mesh missing".into()))
    }

    pub fn interior_trim_meshes(&mut self, device: &mut D) -> Result<&TrimMeshes<D::Buffer>> {
        if self.interior_trim.is_none() {
            let indices = interior_trim::indices();
            let [a, b, c, d] = TrimOrientation::ALL;
            let vertices = [
                trim_vertices(device, a)?,
                trim_vertices(device, b)?,
                trim_vertices(device, c)?,
                trim_vertices(device, d)?,
            ];
            self.interior_trim = Some(TrimMeshes {
                vertices,
                indices: device.create_index_buffer("Interior Trim Indices", &indices)?,
                vertex_count: interior_trim::NUM_VERTICES as u32,
                index_count: indices.len() as u32,
            });
        }
        self.interior_trim.as_ref().ok_or_else(|| Error::Device("interior trim meshes missing".into()))
    }

    pub fn block(&self) -> Option<&SharedMesh<D::Buffer>> {
        self.block.as_ref()
    }

    pub fn ring_fixups(&self) -> Option<&SharedMesh<D::Buffer>> {
        self.ring_fixups.as_ref()
    }

    pub fn edge_stitches(&self) -> Option<&SharedMesh<D::Buffer>> {
        self.edge_stitches.as_ref()
    }

    pub fn interior_trim(&self) -> Option<&TrimMeshes<D::Buffer>> {
        self.interior_trim.as_ref()
    }
}

fn upload<D: RenderDevice>(
    device: &mut D,
    label: &str,
    vertices: &[TerrainVertex],
    indices: &[u16],
    topology: Topology,
) -> Result<SharedMesh<D::Buffer>> {
    log::debug!("Uploading {label} mesh: {} vertices, {} indices", vertices.len(), indices.len());
    Ok(SharedMesh {
        vertices: device.create_vertex_buffer(&format!("{label} Vertices"), vertices)?,
        indices: device.create_index_buffer(&format!("{label} Indices"), indices)?,
        vertex_count: vertices.len() as u32,
        index_count: indices.len() as u32,
        topology,
    })
}

fn trim_vertices<D: RenderDevice>(device: &mut D, orientation: TrimOrientation) -> Result<D::Buffer> {
    device.create_vertex_buffer(
        &format!("Interior Trim {orientation:?} Vertices"),
        &interior_trim::vertices(orientation),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::HeadlessDevice;

    #[test]
    fn test_meshes_built_lazily_once() {
        let mut device = HeadlessDevice::new();
        let mut cache = GeometryCache::new();
        assert!(cache.block().is_none());

        cache.block_mesh(&mut device).unwrap();
        cache.block_mesh(&mut device).unwrap();
        cache.ring_fixups_mesh(&mut device).unwrap();
        cache.edge_stitches_mesh(&mut device).unwrap();
        cache.interior_trim_meshes(&mut device).unwrap();
        cache.interior_trim_meshes(&mut device).unwrap();

        // block, fixups and stitches: one pair each; trim: four vertex buffers and one index buffer
        assert_eq!(device.stats().vertex_buffers, 3 + 4);
        assert_eq!(device.stats().index_buffers, 3 + 1);
    }

    #[test]
    fn test_mesh_metadata() {
        let mut device = HeadlessDevice::new();
        let mut cache = GeometryCache::new();

        let block = cache.block_mesh(&mut device).unwrap();
        assert_eq!(block.index_count as usize, block::NUM_INDICES);
        assert_eq!(block.topology, Topology::TriangleList);

        let trim = cache.interior_trim_meshes(&mut device).unwrap();
        let top_left = trim.mesh(TrimOrientation::TopLeft);
        let bottom_right = trim.mesh(TrimOrientation::BottomRight);
        assert_eq!(top_left.index_count as usize, interior_trim::NUM_INDICES);
        assert!(std::ptr::eq(top_left.indices, bottom_right.indices));
        assert!(!std::ptr::eq(top_left.vertices, bottom_right.vertices));
        assert_eq!(top_left.topology, Topology::TriangleStrip);
    }
}

//! Triangle-strip assembly with degenerate joins.
//!
//! A band is a pair of vertex rails walked in lockstep (`a0 b0 a1 b1 ...`).
//! Consecutive bands are joined by repeating the last index of one band and
//! the first index of the next. Bands always have even length, so every band
//! starts on an even strip position and all real triangles share the same
//! effective winding.

use super::vertex::{TerrainVertex, Topology};

#[derive(Default)]
pub struct StripBuilder {
    indices: Vec<u16>,
}

impl StripBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a band walking `rail_a` and `rail_b` side by side
    pub fn band(&mut self, rail_a: impl IntoIterator<Item = u16>, rail_b: impl IntoIterator<Item = u16>) {
        let mut pairs = rail_a.into_iter().zip(rail_b);
        let Some((a0, b0)) = pairs.next() else {
            return;
        };

        if let Some(&last) = self.indices.last() {
            self.indices.push(last);
            self.indices.push(a0);
        }

        self.indices.push(a0);
        self.indices.push(b0);
        for (a, b) in pairs {
            self.indices.push(a);
            self.indices.push(b);
        }
    }

    pub fn finish(self) -> Vec<u16> {
        self.indices
    }
}

/// One triangle produced by walking an index buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Triangle {
    /// Vertex indices in effective winding order
    pub indices: [u16; 3],
    /// Two or more indices repeat
    pub repeated: bool,
}

/// Expand an index buffer into triangles. Odd strip triangles are flipped to
/// their effective winding.
pub fn triangles(indices: &[u16], topology: Topology) -> Vec<Triangle> {
    let make = |a: u16, b: u16, c: u16| Triangle {
        indices: [a, b, c],
        repeated: a == b || b == c || a == c,
    };

    match topology {
        Topology::TriangleList => indices
            .chunks_exact(3)
            .map(|t| make(t[0], t[1], t[2]))
            .collect(),
        Topology::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .map(|(k, w)| {
                if k % 2 == 0 {
                    make(w[0], w[1], w[2])
                } else {
                    make(w[1], w[0], w[2])
                }
            })
            .collect(),
    }
}

/// Twice the signed area of a triangle in grid space. Negative is clockwise
/// with +x right and +y up.
pub fn signed_area(vertices: &[TerrainVertex], triangle: &Triangle) -> i32 {
    let [a, b, c] = triangle.indices.map(|i| vertices[i as usize]);
    (b.x() - a.x()) * (c.y() - a.y()) - (b.y() - a.y()) * (c.x() - a.x())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Every triangle is degenerate exactly when it repeats an index, and all
    /// real triangles are clockwise
    pub(crate) fn assert_well_formed(vertices: &[TerrainVertex], indices: &[u16], topology: Topology) {
        for (k, triangle) in triangles(indices, topology).iter().enumerate() {
            let area = signed_area(vertices, triangle);
            if triangle.repeated {
                assert_eq!(area, 0, "repeated triangle {k} {:?} has area", triangle.indices);
            } else {
                assert!(area < 0, "triangle {k} {:?} has area {area}", triangle.indices);
            }
        }
    }

    #[test]
    fn test_single_band() {
        let mut strip = StripBuilder::new();
        strip.band([0, 1, 2], [3, 4, 5]);
        assert_eq!(strip.finish(), vec![0, 3, 1, 4, 2, 5]);
    }

    #[test]
    fn test_bands_joined_by_repeats() {
        let mut strip = StripBuilder::new();
        strip.band([0, 1], [2, 3]);
        strip.band([10, 11], [12, 13]);
        let indices = strip.finish();
        assert_eq!(indices, vec![0, 2, 1, 3, 3, 10, 10, 12, 11, 13]);

        let tris = triangles(&indices, Topology::TriangleStrip);
        let repeated: Vec<usize> = tris.iter().enumerate().filter(|(_, t)| t.repeated).map(|(k, _)| k).collect();
        assert_eq!(repeated, vec![2, 3, 4, 5]);
        // Second band starts on an even position and keeps the first band's orientation
        assert_eq!(tris[6].indices, [10, 12, 11]);
    }

    #[test]
    fn test_strip_flips_odd_triangles() {
        let tris = triangles(&[0, 1, 2, 3], Topology::TriangleStrip);
        assert_eq!(tris[0].indices, [0, 1, 2]);
        assert_eq!(tris[1].indices, [2, 1, 3]);
    }

    #[test]
    fn test_signed_area_winding() {
        let vertices = [TerrainVertex::new(0, 0), TerrainVertex::new(0, 1), TerrainVertex::new(1, 0)];
        let tri = triangles(&[0, 1, 2], Topology::TriangleList)[0];
        assert_eq!(signed_area(&vertices, &tri), -1);
    }
}

use glam::Vec3;

/// Triangle soup in parallel arrays: every three consecutive entries
/// form one triangle.  Normals are constant per face (pushed once per
/// vertex) and brightness is a flat-shade multiplier in `[0, 1]` – no
/// lighting model is evaluated on stereo stimuli.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub brightness: Vec<f32>,
}

impl Mesh {
    pub fn with_capacity(verts: usize) -> Self {
        Self {
            positions: Vec::with_capacity(verts),
            normals: Vec::with_capacity(verts),
            brightness: Vec::with_capacity(verts),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Push one vertex; the three arrays must never diverge in length.
    #[inline]
    pub fn push(&mut self, pos: Vec3, normal: Vec3, brightness: f32) {
        self.positions.push(pos);
        self.normals.push(normal);
        self.brightness.push(brightness);
    }

    /// Append a quad as two triangles sharing a constant normal and
    /// brightness.  `corners` wind counter-clockwise when viewed from
    /// the normal side.
    pub fn push_quad(&mut self, corners: [Vec3; 4], normal: Vec3, brightness: f32) {
        let [a, b, c, d] = corners;
        for v in [a, b, c, a, c, d] {
            self.push(v, normal, brightness);
        }
    }
}

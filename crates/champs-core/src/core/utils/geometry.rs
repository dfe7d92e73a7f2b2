use nalgebra::Point3;

/// Distance features between the two endpoints of a coupling pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairDistance {
    /// Euclidean distance.
    pub dist: f64,
    /// Squared delta along x.
    pub dist_x: f64,
    pub dist_y: f64,
    pub dist_z: f64,
}

impl PairDistance {
    pub fn between(a: &Point3<f64>, b: &Point3<f64>) -> Self {
        let delta = a - b;
        Self {
            dist: delta.norm(),
            dist_x: delta.x * delta.x,
            dist_y: delta.y * delta.y,
            dist_z: delta.z * delta.z,
        }
    }
}

#[inline]
pub fn euclidean_distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    nalgebra::distance(a, b)
}

//! Math utilities and types
//!
//! Provides the nalgebra aliases used by layout and draw commands.

pub use nalgebra::{Matrix4, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Build a 2D affine matrix: translate by `offset`, then scale by `scale`
///
/// Applied to a point `p` this yields `offset + scale * p` on X/Y; Z is untouched.
pub fn translate_scale_2d(offset: Vec2, scale: Vec2) -> Mat4 {
    Mat4::new_translation(&Vec3::new(offset.x, offset.y, 0.0))
        * Mat4::new_nonuniform_scaling(&Vec3::new(scale.x, scale.y, 1.0))
}

/// Column-major array form of a matrix, as laid out in push constants
pub fn to_cols_array(matrix: &Mat4) -> [[f32; 4]; 4] {
    (*matrix).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn translate_scale_maps_unit_corner() {
        let m = translate_scale_2d(Vec2::new(10.0, 5.0), Vec2::new(2.0, 3.0));
        let p = m.transform_point(&nalgebra::Point3::new(1.0, 1.0, 0.0));
        assert_relative_eq!(p.x, 12.0);
        assert_relative_eq!(p.y, 8.0);
    }

    #[test]
    fn cols_array_is_column_major() {
        let m = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        let cols = to_cols_array(&m);
        assert_eq!(cols[3], [1.0, 2.0, 3.0, 1.0]);
    }
}

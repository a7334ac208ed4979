//! Transform conversion and interpolation numerics.
//!
//! Matrices are stored as row-major `[[f32; 4]; 4]` in the contracts; the
//! math runs in f64 through nalgebra and is truncated on the way out.

use contracts::{Matrix4 as MatrixArray, Transform};
use nalgebra::{Matrix3, Quaternion, Rotation3, UnitQuaternion, Vector3};

/// Build a homogeneous matrix from a stamped translation + quaternion.
pub fn transform_to_matrix(transform: &Transform) -> MatrixArray {
    let [x, y, z, w] = transform.rotation_xyzw;
    let rotation = UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z));
    let translation = Vector3::new(
        transform.translation[0],
        transform.translation[1],
        transform.translation[2],
    );
    compose(rotation.to_rotation_matrix().matrix(), &translation)
}

/// Interpolate between two rigid transforms.
///
/// Translation is blended linearly; rotation goes through unit quaternions
/// with sign alignment and spherical interpolation (shortest arc), so the
/// result is always a valid rigid transform. `alpha` outside [0, 1] clamps
/// to the endpoints, which are reproduced exactly.
pub fn interpolate_matrix(start: &MatrixArray, end: &MatrixArray, alpha: f64) -> MatrixArray {
    if alpha <= 0.0 {
        return *start;
    }
    if alpha >= 1.0 {
        return *end;
    }

    let t_start = translation_of(start);
    let t_end = translation_of(end);
    let translation = t_start * (1.0 - alpha) + t_end * alpha;

    let q_start = rotation_of(start);
    let q_end = rotation_of(end);

    // Negate one endpoint when the quaternions sit on opposite hemispheres,
    // so interpolation takes the shorter angular arc.
    let mut dot = q_start.coords.dot(&q_end.coords);
    let mut q_end_raw = *q_end.quaternion();
    if dot < 0.0 {
        q_end_raw = -q_end_raw;
        dot = -dot;
    }

    let blended = slerp_raw(q_start.quaternion(), &q_end_raw, dot, alpha);
    let rotation = UnitQuaternion::from_quaternion(blended);

    compose(rotation.to_rotation_matrix().matrix(), &translation)
}

/// Slerp two sign-aligned quaternions; falls back to a normalized linear
/// blend when they are nearly parallel (sin(theta) -> 0).
fn slerp_raw(
    q_start: &Quaternion<f64>,
    q_end: &Quaternion<f64>,
    dot: f64,
    alpha: f64,
) -> Quaternion<f64> {
    let dot = dot.clamp(-1.0, 1.0);
    if dot > 1.0 - 1e-9 {
        return q_start * (1.0 - alpha) + q_end * alpha;
    }
    let theta = dot.acos();
    let sin_theta = theta.sin();
    (q_start * (((1.0 - alpha) * theta).sin() / sin_theta))
        + (q_end * ((alpha * theta).sin() / sin_theta))
}

fn compose(rotation: &Matrix3<f64>, translation: &Vector3<f64>) -> MatrixArray {
    let mut out = [[0.0f32; 4]; 4];
    for r in 0..3 {
        for c in 0..3 {
            out[r][c] = rotation[(r, c)] as f32;
        }
        out[r][3] = translation[r] as f32;
    }
    out[3][3] = 1.0;
    out
}

fn translation_of(matrix: &MatrixArray) -> Vector3<f64> {
    Vector3::new(
        matrix[0][3] as f64,
        matrix[1][3] as f64,
        matrix[2][3] as f64,
    )
}

fn rotation_of(matrix: &MatrixArray) -> UnitQuaternion<f64> {
    let block = Matrix3::from_fn(|r, c| matrix[r][c] as f64);
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(block))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn rotation_about_z(angle: f64) -> MatrixArray {
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), angle);
        compose(rotation.matrix(), &Vector3::zeros())
    }

    fn with_translation(mut matrix: MatrixArray, t: [f32; 3]) -> MatrixArray {
        matrix[0][3] = t[0];
        matrix[1][3] = t[1];
        matrix[2][3] = t[2];
        matrix
    }

    #[test]
    fn test_transform_to_matrix_identity() {
        let t = Transform {
            parent_frame: "map".to_string(),
            child_frame: "base_link".to_string(),
            timestamp: 0.0,
            translation: [1.0, 2.0, 3.0],
            rotation_xyzw: [0.0, 0.0, 0.0, 1.0],
        };
        let m = transform_to_matrix(&t);
        assert_eq!(m[0][0], 1.0);
        assert_eq!(m[1][1], 1.0);
        assert_eq!(m[2][2], 1.0);
        assert_eq!(m[0][3], 1.0);
        assert_eq!(m[1][3], 2.0);
        assert_eq!(m[2][3], 3.0);
        assert_eq!(m[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_endpoints_reproduced_exactly() {
        let a = with_translation(rotation_about_z(0.3), [1.0, 0.0, 0.0]);
        let b = with_translation(rotation_about_z(1.1), [0.0, 5.0, 0.0]);
        assert_eq!(interpolate_matrix(&a, &b, 0.0), a);
        assert_eq!(interpolate_matrix(&a, &b, 1.0), b);
        // Clamped out-of-range alphas hit the same endpoints
        assert_eq!(interpolate_matrix(&a, &b, -0.5), a);
        assert_eq!(interpolate_matrix(&a, &b, 2.0), b);
    }

    #[test]
    fn test_translation_lerp() {
        let a = with_translation(rotation_about_z(0.0), [0.0, 0.0, 0.0]);
        let b = with_translation(rotation_about_z(0.0), [4.0, -2.0, 8.0]);
        let mid = interpolate_matrix(&a, &b, 0.25);
        assert!((mid[0][3] - 1.0).abs() < 1e-6);
        assert!((mid[1][3] + 0.5).abs() < 1e-6);
        assert!((mid[2][3] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_interpolated_rotation_is_orthonormal() {
        let a = rotation_about_z(0.2);
        let b = rotation_about_z(2.9);
        for alpha in [0.1, 0.33, 0.5, 0.77, 0.9] {
            let m = interpolate_matrix(&a, &b, alpha);
            let block = Matrix3::from_fn(|r, c| m[r][c] as f64);
            let gram = block.transpose() * block;
            for r in 0..3 {
                for c in 0..3 {
                    let expected = if r == c { 1.0 } else { 0.0 };
                    assert!(
                        (gram[(r, c)] - expected).abs() < 1e-5,
                        "R^T R != I at alpha {alpha}"
                    );
                }
            }
            assert!((block.determinant() - 1.0).abs() < 1e-5);
            assert_eq!(m[3], [0.0, 0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_shorter_arc_is_taken() {
        // 0 deg -> 270 deg about z: the short way passes through -45 deg.
        let a = rotation_about_z(0.0);
        let b = rotation_about_z(1.5 * PI);
        let mid = interpolate_matrix(&a, &b, 0.5);
        let expected = rotation_about_z(-PI / 4.0);
        for r in 0..3 {
            for c in 0..3 {
                assert!(
                    (mid[r][c] - expected[r][c]).abs() < 1e-5,
                    "midpoint not at -45 deg"
                );
            }
        }
    }

    #[test]
    fn test_small_angle_blend_stays_unit() {
        let a = rotation_about_z(1.0);
        let b = rotation_about_z(1.0 + 1e-7);
        let m = interpolate_matrix(&a, &b, 0.5);
        let block = Matrix3::from_fn(|r, c| m[r][c] as f64);
        assert!((block.determinant() - 1.0).abs() < 1e-6);
    }
}

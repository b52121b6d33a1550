//! Plant-specific constructions on top of glam's double precision types.
//!
//! [`DVec3`] and [`DMat3`] are used directly for vectors and rotations;
//! composition is plain matrix multiplication, so `parent * child` applies
//! the parent frame first. Normalizing a zero vector yields the zero
//! vector (`DVec3::normalize_or_zero`).

use glam::{DMat3, DVec3};

/// Builds an orthonormal, right-handed frame whose first column is the
/// normalized `heading`.
///
/// The second axis is chosen in the plane of the two dominant components
/// of `heading`, the third is their cross product. A zero heading yields
/// the identity frame.
pub fn ons(heading: DVec3) -> DMat3 {
    let v1 = heading.normalize_or_zero();
    if v1 == DVec3::ZERO {
        return DMat3::IDENTITY;
    }

    let (ax, ay, az) = (v1.x.abs(), v1.y.abs(), v1.z.abs());
    let v2 = if ay >= ax && ay >= az {
        DVec3::new(0.0, -v1.z, v1.y)
    } else {
        DVec3::new(-v1.z, 0.0, v1.x)
    };
    let v3 = v1.cross(v2);

    DMat3::from_cols(v1, v2.normalize(), v3.normalize())
}

/// Unit vector at polar angle `a` from the x-axis and azimuth `b` around it.
///
/// Applied to a frame from [`ons`], `a` is the deviation from the frame's
/// heading and `b` the rotation around that heading.
#[inline]
pub fn rot_ab(a: f64, b: f64) -> DVec3 {
    let (sa, ca) = a.sin_cos();
    let (sb, cb) = b.sin_cos();
    DVec3::new(ca, sa * sb, sa * cb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-12;

    #[test]
    fn ons_is_orthonormal_and_right_handed() {
        let headings = [
            DVec3::new(0.0, 0.0, -1.0),
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(1.0, 2.0, 3.0),
            DVec3::new(-4.0, 0.5, 0.1),
            DVec3::new(0.2, -7.0, 0.3),
        ];

        for h in headings {
            let m = ons(h);
            assert!(m.x_axis.abs_diff_eq(h.normalize(), EPS), "first column must be the heading");
            assert!((m.x_axis.dot(m.y_axis)).abs() < EPS);
            assert!((m.x_axis.dot(m.z_axis)).abs() < EPS);
            assert!((m.y_axis.dot(m.z_axis)).abs() < EPS);
            assert!((m.determinant() - 1.0).abs() < EPS, "frame must be a rotation: {h:?}");
        }
    }

    #[test]
    fn ons_of_zero_heading_is_identity() {
        assert_eq!(ons(DVec3::ZERO), DMat3::IDENTITY);
    }

    #[test]
    fn rot_ab_zero_angle_is_the_x_axis() {
        assert!(rot_ab(0.0, 1.234).abs_diff_eq(DVec3::X, EPS));
        assert!(rot_ab(FRAC_PI_2, 0.0).abs_diff_eq(DVec3::Z, EPS));
        assert!(rot_ab(FRAC_PI_2, FRAC_PI_2).abs_diff_eq(DVec3::Y, EPS));
        assert!(rot_ab(PI, 0.3).abs_diff_eq(-DVec3::X, EPS));
    }

    #[test]
    fn composition_applies_parent_first() {
        let parent = ons(DVec3::new(0.0, 0.0, -1.0));
        let child = ons(rot_ab(FRAC_PI_2, 0.0));
        let composed = parent * child;

        // The child's heading is expressed in the parent frame.
        let expected = parent * (child * DVec3::X);
        assert!((composed * DVec3::X).abs_diff_eq(expected, EPS));

        // The reversed order generally points elsewhere.
        let reversed = child * parent;
        assert!(!(reversed * DVec3::X).abs_diff_eq(expected, 1e-6));
    }
}

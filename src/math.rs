/// Three-component vector in world space
pub type Vec3 = [f64; 3];

/// 3x3 row-major matrix
pub type Mat3 = [[f64; 3]; 3];

pub const IDENTITY: Mat3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Coefficients of the 2x2 map the rotation induces on the plane's basis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineMatrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

pub fn dot(a: &Vec3, b: &Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross(a: &Vec3, b: &Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn length(v: &Vec3) -> f64 {
    dot(v, v).sqrt()
}

/// Scales a vector to unit length. The zero vector is returned unchanged.
pub fn normalize(v: &Vec3) -> Vec3 {
    let length = length(v);
    if length == 0.0 {
        return *v;
    }
    [v[0] / length, v[1] / length, v[2] / length]
}

/// Unit direction in the z=0 plane for an angle measured from +X
pub fn axis_from_degrees(degrees: f64) -> Vec3 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    normalize(&[cos, sin, 0.0])
}

/// Rotates `point` about the unit vector `axis` by `angle` radians (Rodrigues' formula)
pub fn rotate(point: &Vec3, axis: &Vec3, angle: f64) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    let cross = cross(axis, point);
    let along = dot(axis, point) * (1.0 - cos);
    [
        point[0] * cos + cross[0] * sin + axis[0] * along,
        point[1] * cos + cross[1] * sin + axis[1] * along,
        point[2] * cos + cross[2] * sin + axis[2] * along,
    ]
}

/// Derives the planar readout coefficients for an in-plane axis `(kx, ky)`.
///
/// This is the upper-left block of the Rodrigues matrix with the
/// antisymmetric `sin` terms dropped, so `b == c` always holds.
pub fn derive_affine_matrix(axis: &[f64; 2], angle: f64) -> AffineMatrix {
    let cos = angle.cos();
    let one_minus_cos = 1.0 - cos;
    let [kx, ky] = *axis;
    let off_diagonal = kx * ky * one_minus_cos;
    AffineMatrix {
        a: cos + kx * kx * one_minus_cos,
        b: off_diagonal,
        c: off_diagonal,
        d: cos + ky * ky * one_minus_cos,
    }
}

/// Builds the full 3x3 rotation matrix about a unit axis
pub fn rotation_matrix(axis: &Vec3, angle: f64) -> Mat3 {
    let (sin, cos) = angle.sin_cos();
    let t = 1.0 - cos;
    let [x, y, z] = *axis;
    [
        [t * x * x + cos, t * x * y - sin * z, t * x * z + sin * y],
        [t * x * y + sin * z, t * y * y + cos, t * y * z - sin * x],
        [t * x * z - sin * y, t * y * z + sin * x, t * z * z + cos],
    ]
}

/// Multiplies a 3x3 matrix by a 3-dimensional vector
pub fn multiply_matrix_vector(matrix: &Mat3, vector: &Vec3) -> Vec3 {
    let mut result = [0.0; 3];
    for i in 0..3 {
        for j in 0..3 {
            result[i] += matrix[i][j] * vector[j];
        }
    }
    result
}

/// Multiplies two 3x3 matrices
pub fn multiply_matrices(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut result = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                result[i][j] += a[i][k] * b[k][j];
            }
        }
    }
    result
}

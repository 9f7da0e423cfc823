//! Mass properties and the override rules applied on top of a shape's own

use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Mass and inertia tensor of a body.
///
/// The tensor is stored homogeneous like the engine does: the upper 3x3
/// block holds the inertia, element (3, 3) is 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassProperties {
    /// Mass in kg
    pub mass: f32,
    /// Inertia tensor about the center of mass
    pub inertia: Mat4,
}

impl Default for MassProperties {
    /// Unit mass with identity inertia, used for bodies without a shape
    fn default() -> Self {
        Self {
            mass: 1.0,
            inertia: Mat4::IDENTITY,
        }
    }
}

impl MassProperties {
    /// Create from a mass and a full tensor
    pub fn new(mass: f32, inertia: Mat4) -> Self {
        Self { mass, inertia }
    }

    /// Create from a mass and the diagonal of the tensor
    pub fn from_diagonal(mass: f32, inertia: Vec3) -> Self {
        Self {
            mass,
            inertia: Mat4::from_diagonal(inertia.extend(1.0)),
        }
    }

    /// Tensor element at `row`, `col`
    pub fn element(&self, row: usize, col: usize) -> f32 {
        self.inertia.col(col)[row]
    }

    /// Overwrite the tensor element at `row`, `col`
    pub fn set_element(&mut self, row: usize, col: usize, value: f32) {
        self.inertia.col_mut(col)[row] = value;
    }

    /// Diagonal of the 3x3 inertia block
    pub fn inertia_diagonal(&self) -> Vec3 {
        Vec3::new(self.element(0, 0), self.element(1, 1), self.element(2, 2))
    }

    /// The 3x3 inertia block
    pub fn inertia3(&self) -> Mat3 {
        Mat3::from_mat4(self.inertia)
    }

    /// Scale mass and inertia together so the mass becomes `mass`,
    /// keeping the mass distribution.
    pub fn scale_to_mass(&mut self, mass: f32) {
        if self.mass > 0.0 {
            let scale = mass / self.mass;
            for col in 0..3 {
                *self.inertia.col_mut(col) *= scale;
            }
        }
        self.mass = mass;
    }

    /// Inverse mass, zero for massless bodies
    pub fn inverse_mass(&self) -> f32 {
        if self.mass > 0.0 {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Inverse of the 3x3 inertia block, zero when singular
    pub fn inverse_inertia(&self) -> Mat3 {
        let inertia = self.inertia3();
        if inertia.determinant().abs() <= f32::EPSILON {
            Mat3::ZERO
        } else {
            inertia.inverse()
        }
    }
}

/// Derive the effective mass properties of a body.
///
/// A non-positive `mass` or any non-positive `inertia` component means
/// "take it from the shape".
pub fn calculate(shape: &MassProperties, mass: f32, inertia: Vec3) -> MassProperties {
    let calculate_mass = mass <= 0.0;
    let calculate_inertia = inertia.x <= 0.0 || inertia.y <= 0.0 || inertia.z <= 0.0;

    let mut properties = *shape;

    if calculate_mass && calculate_inertia {
        // shape values as they are
    } else if calculate_inertia {
        properties.scale_to_mass(mass);
    } else {
        properties.mass = mass;
        properties.set_element(0, 0, inertia.x);
        properties.set_element(1, 1, inertia.y);
        properties.set_element(2, 2, inertia.z);
    }

    properties.set_element(3, 3, 1.0);

    properties
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_shape_values_used_when_auto() {
        let shape = MassProperties::from_diagonal(3.0, Vec3::new(1.0, 2.0, 3.0));
        let result = calculate(&shape, 0.0, Vec3::ZERO);
        assert_eq!(result, shape);
    }

    #[test]
    fn test_explicit_mass_scales_inertia() {
        let shape = MassProperties::from_diagonal(2.0, Vec3::ONE);
        let result = calculate(&shape, 4.0, Vec3::ZERO);

        assert_relative_eq!(result.mass, 4.0);
        assert_relative_eq!(result.element(0, 0), 2.0);
        assert_relative_eq!(result.element(1, 1), 2.0);
        assert_relative_eq!(result.element(2, 2), 2.0);
        assert_relative_eq!(result.element(3, 3), 1.0);
    }

    #[test]
    fn test_explicit_inertia_keeps_off_diagonal() {
        let mut shape = MassProperties::from_diagonal(2.0, Vec3::ONE);
        shape.set_element(0, 1, 0.25);
        shape.set_element(1, 0, 0.25);

        let result = calculate(&shape, 5.0, Vec3::new(4.0, 5.0, 6.0));

        assert_eq!(result.mass, 5.0);
        assert_eq!(result.inertia_diagonal(), Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(result.element(0, 1), 0.25);
        assert_eq!(result.element(1, 0), 0.25);
    }

    #[test]
    fn test_partial_inertia_counts_as_auto() {
        let shape = MassProperties::from_diagonal(1.0, Vec3::ONE);
        let result = calculate(&shape, 3.0, Vec3::new(1.0, 0.0, 1.0));
        assert_relative_eq!(result.element(1, 1), 3.0);
    }

    #[test]
    fn test_homogeneous_element_normalized() {
        let mut shape = MassProperties::from_diagonal(1.0, Vec3::ONE);
        shape.set_element(3, 3, 7.0);
        assert_eq!(calculate(&shape, 0.0, Vec3::ZERO).element(3, 3), 1.0);
    }

    #[test]
    fn test_inverse_inertia() {
        let properties = MassProperties::from_diagonal(2.0, Vec3::new(2.0, 4.0, 8.0));
        let inverse = properties.inverse_inertia();
        assert_relative_eq!(inverse.x_axis.x, 0.5);
        assert_relative_eq!(inverse.y_axis.y, 0.25);
        assert_relative_eq!(inverse.z_axis.z, 0.125);
        assert_relative_eq!(properties.inverse_mass(), 0.5);

        let singular = MassProperties::from_diagonal(1.0, Vec3::ZERO);
        assert_eq!(singular.inverse_inertia(), Mat3::ZERO);
    }
}

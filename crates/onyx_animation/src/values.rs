//! Interpolatable values

use onyx_core::Color;

/// Trait for values that can be interpolated
pub trait Interpolate: Clone + 'static {
    /// Interpolate between self and other by t (0.0 to 1.0)
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolate for Color {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Color::lerp(self, other, t)
    }
}

/// Value at eased progress `p`, snapping to the endpoints exactly
pub fn value_at<V: Interpolate>(from: &V, to: &V, p: f32) -> V {
    if p == 0.0 {
        from.clone()
    } else if p == 1.0 {
        to.clone()
    } else {
        from.lerp(to, p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_lerp() {
        assert_eq!(0.0f32.lerp(&10.0, 0.25), 2.5);
        assert_eq!(value_at(&0.1f32, &0.7, 0.0), 0.1);
        assert_eq!(value_at(&0.1f32, &0.7, 1.0), 0.7);
    }

    #[test]
    fn test_color_lerp_is_component_wise() {
        let from = Color::rgba(0.0, 0.2, 1.0, 0.0);
        let to = Color::rgba(1.0, 0.2, 0.0, 1.0);
        let mid = value_at(&from, &to, 0.5);
        assert!((mid.r - 0.5).abs() < 1e-6);
        assert!((mid.g - 0.2).abs() < 1e-6);
        assert!((mid.b - 0.5).abs() < 1e-6);
        assert!((mid.a - 0.5).abs() < 1e-6);
    }
}

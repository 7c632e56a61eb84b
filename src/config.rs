//! Tunable limits for the rewrite driver, integration search and numeric factoring.

/// Iteration bound for the `shrink` fixed-point loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShrinkOptions {
    /// Hard cap; when `None` the cap scales with the size of the input tree.
    pub max_iterations: Option<usize>,
    pub iterations_per_node: usize,
    pub min_iterations: usize,
}

impl Default for ShrinkOptions {
    fn default() -> Self {
        Self {
            max_iterations: None,
            iterations_per_node: 4,
            min_iterations: 32,
        }
    }
}

impl ShrinkOptions {
    pub fn with_max_iterations(max_iterations: usize) -> Self {
        Self {
            max_iterations: Some(max_iterations),
            ..Self::default()
        }
    }

    pub fn cap_for(&self, tree_size: usize) -> usize {
        self.max_iterations.unwrap_or_else(|| {
            self.min_iterations
                .max(tree_size.saturating_mul(self.iterations_per_node))
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntegrateOptions {
    /// Nesting bound for substitution and by-parts recursion.
    pub max_depth: usize,
    /// Subexpressions tried as `u` before substitution gives up.
    pub max_substitution_candidates: usize,
}

impl Default for IntegrateOptions {
    fn default() -> Self {
        Self {
            max_depth: 6,
            max_substitution_candidates: 24,
        }
    }
}

/// Relative tolerance under which a floating discriminant counts as zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadraticTolerance(pub f64);

impl Default for QuadraticTolerance {
    fn default() -> Self {
        QuadraticTolerance(1e-9)
    }
}

impl QuadraticTolerance {
    pub fn is_zero(&self, discriminant: f64, scale: f64) -> bool {
        discriminant.abs() <= self.0 * scale.abs().max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_scales_with_tree_size() {
        let options = ShrinkOptions::default();
        assert_eq!(options.cap_for(1), 32);
        assert_eq!(options.cap_for(100), 400);
        assert_eq!(ShrinkOptions::with_max_iterations(3).cap_for(100), 3);
    }
}

//! Decision-path bookkeeping for TreeSHAP
//!
//! Tracks, for every feature on the current root-to-node path, the
//! proportion of subsets flowing down when the feature is excluded
//! (`zero_fraction`) or included (`one_fraction`), together with the
//! permutation weights of Lundberg et al. (2020), Algorithm 2.

/// One feature's entry on the decision path.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PathElement {
    /// Feature index; -1 marks the root sentinel
    pub feature: isize,
    /// Cover fraction when the feature is excluded from the subset
    pub zero_fraction: f64,
    /// 1.0 when the sample follows this branch, 0.0 on cold branches
    pub one_fraction: f64,
    /// Permutation weight
    pub weight: f64,
}

/// The extendable/unwindable decision path.
#[derive(Debug, Clone, Default)]
pub(crate) struct PathState {
    elems: Vec<PathElement>,
}

impl PathState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn element(&self, i: usize) -> PathElement {
        self.elems[i]
    }

    /// Position of `feature` on the path, if already present.
    pub fn position_of(&self, feature: isize) -> Option<usize> {
        self.elems.iter().position(|e| e.feature == feature)
    }

    /// Grow the path by one split, redistributing permutation weights.
    pub fn extend(&mut self, zero_fraction: f64, one_fraction: f64, feature: isize) {
        let l = self.elems.len();
        self.elems.push(PathElement {
            feature,
            zero_fraction,
            one_fraction,
            weight: if l == 0 { 1.0 } else { 0.0 },
        });

        for i in (0..l).rev() {
            let w = self.elems[i].weight;
            self.elems[i + 1].weight += one_fraction * w * (i + 1) as f64 / (l + 1) as f64;
            self.elems[i].weight = zero_fraction * w * (l - i) as f64 / (l + 1) as f64;
        }
    }

    /// Remove element `i`, restoring the weights to the path without it.
    pub fn unwind(&mut self, i: usize) {
        let l = self.elems.len();
        let one_fraction = self.elems[i].one_fraction;
        let zero_fraction = self.elems[i].zero_fraction;
        let mut n = self.elems[l - 1].weight;

        for j in (0..l - 1).rev() {
            if one_fraction != 0.0 {
                let t = self.elems[j].weight;
                self.elems[j].weight = n * l as f64 / ((j + 1) as f64 * one_fraction);
                n = t - self.elems[j].weight * zero_fraction * (l - 1 - j) as f64 / l as f64;
            } else {
                self.elems[j].weight =
                    self.elems[j].weight * l as f64 / (zero_fraction * (l - 1 - j) as f64);
            }
        }

        for j in i..l - 1 {
            let next = self.elems[j + 1];
            self.elems[j].feature = next.feature;
            self.elems[j].zero_fraction = next.zero_fraction;
            self.elems[j].one_fraction = next.one_fraction;
        }
        self.elems.pop();
    }

    /// Total permutation weight if element `i` were unwound, without
    /// mutating the path.
    pub fn unwound_sum(&self, i: usize) -> f64 {
        let depth = self.elems.len() - 1;
        let one_fraction = self.elems[i].one_fraction;
        let zero_fraction = self.elems[i].zero_fraction;
        let mut next_one = self.elems[depth].weight;
        let mut total = 0.0;

        if one_fraction != 0.0 {
            for j in (0..depth).rev() {
                let tmp = next_one / ((j + 1) as f64 * one_fraction);
                total += tmp;
                next_one = self.elems[j].weight - tmp * zero_fraction * (depth - j) as f64;
            }
        } else {
            for j in (0..depth).rev() {
                total += self.elems[j].weight / (zero_fraction * (depth - j) as f64);
            }
        }

        total * (depth + 1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_from_empty() {
        let mut path = PathState::new();
        path.extend(1.0, 1.0, -1);
        assert_eq!(path.len(), 1);
        assert_eq!(path.element(0).weight, 1.0);
    }

    #[test]
    fn test_extend_splits_weight() {
        let mut path = PathState::new();
        path.extend(1.0, 1.0, -1);
        path.extend(0.5, 1.0, 0);

        // One split with zero_fraction 0.5: the empty-subset weight is
        // halved, the included-subset weight stays.
        assert_eq!(path.len(), 2);
        assert!((path.element(0).weight - 0.25).abs() < 1e-12);
        assert!((path.element(1).weight - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_unwind_inverts_extend() {
        let mut path = PathState::new();
        path.extend(1.0, 1.0, -1);
        path.extend(0.5, 1.0, 0);
        path.extend(0.25, 1.0, 1);

        let snapshot: Vec<f64> = (0..path.len()).map(|i| path.element(i).weight).collect();

        path.extend(0.7, 1.0, 2);
        path.unwind(3);

        assert_eq!(path.len(), 3);
        for (i, &w) in snapshot.iter().enumerate() {
            assert!(
                (path.element(i).weight - w).abs() < 1e-9,
                "weight {} diverged: {} vs {}",
                i,
                path.element(i).weight,
                w
            );
        }
    }

    #[test]
    fn test_unwind_interior_element_removes_feature() {
        let mut path = PathState::new();
        path.extend(1.0, 1.0, -1);
        path.extend(0.5, 1.0, 0);
        path.extend(0.25, 0.0, 1);

        path.unwind(1);
        assert_eq!(path.len(), 2);
        assert_eq!(path.element(1).feature, 1);
        assert!(path.position_of(0).is_none());
    }

    #[test]
    fn test_position_of() {
        let mut path = PathState::new();
        path.extend(1.0, 1.0, -1);
        path.extend(0.5, 1.0, 7);

        assert_eq!(path.position_of(7), Some(1));
        assert_eq!(path.position_of(3), None);
    }
}

//! Justification arithmetic
//!
//! Spacing is inserted between glyph clusters. A cluster is counted as
//! one UTF-8 lead byte, so insertion points never fall inside a
//! multi-byte sequence.

/// Number of glyph clusters of `text` (UTF-8 lead bytes)
pub fn utf8_cluster_count(text: &str) -> usize {
    text.bytes().filter(|&b| (b & 0xC0) != 0x80).count()
}

/// Per-gap spacing that stretches a run from `current` to `target` width.
///
/// `current` was measured with `default_spacing` already applied to each
/// of the `clusters` clusters, so that contribution is removed before
/// the new spacing is distributed over `clusters + outer` gaps.
pub fn justify_spacing(
    clusters: usize,
    outer: usize,
    default_spacing: f64,
    current: f64,
    target: f64,
) -> f64 {
    let gaps = (clusters + outer) as f64;
    if gaps == 0.0 {
        return 0.0;
    }
    let n = clusters as f64;
    (target - (current - n * default_spacing)) / gaps
}

/// Byte offset of the last cluster of `text`, or `None` for empty text
pub fn last_cluster_offset(text: &str) -> Option<usize> {
    text.char_indices().last().map(|(i, _)| i)
}

/// Left edge of every cluster once `spacing` is inserted before each one
/// (`leading` selects whether the first cluster is also preceded by a gap)
pub fn cluster_offsets(widths: &[f64], spacing: f64, leading: bool) -> Vec<f64> {
    let mut offsets = Vec::with_capacity(widths.len());
    let mut x = if leading { spacing } else { 0.0 };
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            x += spacing;
        }
        offsets.push(x);
        x += width;
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_cluster_count_uses_lead_bytes() {
        assert_eq!(utf8_cluster_count(""), 0);
        assert_eq!(utf8_cluster_count("abc"), 3);
        assert_eq!(utf8_cluster_count("漢字"), 2);
        assert_eq!(utf8_cluster_count("é😀x"), 3);
    }

    #[test]
    fn test_spacing_reaches_target() {
        // 2 clusters, 40px wide, stretched to 70px over 2 gaps
        let s = justify_spacing(2, 0, 0.0, 40.0, 70.0);
        assert!((s - 15.0).abs() < EPS);
        assert!((40.0 + 2.0 * s - 70.0).abs() < EPS);
    }

    #[test]
    fn test_default_spacing_not_counted_twice() {
        // 4 clusters measured with 2px default spacing
        let s = justify_spacing(4, 1, 2.0, 48.0, 60.0);
        assert!((s - (60.0 - 40.0) / 5.0).abs() < EPS);
    }

    #[test]
    fn test_symmetry_law() {
        for (n, outer, current, target) in [(3, 0, 40.0, 70.0), (5, 1, 120.5, 88.25), (1, 1, 3.0, 9.0)] {
            let forward = justify_spacing(n, outer, 0.0, current, target);
            let backward = justify_spacing(n, outer, 0.0, target, current);
            assert!((forward + backward).abs() < EPS, "{n} {outer}");
        }
    }

    #[test]
    fn test_symmetry_law_with_default_spacing() {
        // Bare widths `a` and `b`, each measured with `d` px per cluster
        for (n, outer, d, a, b) in [(3, 0, 2.0, 40.0, 70.0), (5, 1, 1.5, 120.5, 88.25), (2, 1, 4.0, 30.0, 31.0)] {
            let nd = n as f64 * d;
            let forward = justify_spacing(n, outer, d, a + nd, b);
            let backward = justify_spacing(n, outer, d, b + nd, a);
            assert!((forward + backward).abs() < EPS, "{n} {outer} {d}");
            assert!((forward - (b - a) / (n + outer) as f64).abs() < EPS);
        }
    }

    #[test]
    fn test_no_gaps_no_spacing() {
        assert_eq!(justify_spacing(0, 0, 0.0, 0.0, 50.0), 0.0);
    }

    #[test]
    fn test_last_cluster_offset() {
        assert_eq!(last_cluster_offset(""), None);
        assert_eq!(last_cluster_offset("a"), Some(0));
        assert_eq!(last_cluster_offset("漢字"), Some(3));
    }

    #[test]
    fn test_cluster_offsets() {
        let offsets = cluster_offsets(&[10.0, 10.0, 10.0], 5.0, false);
        assert_eq!(offsets, vec![0.0, 15.0, 30.0]);
        let offsets = cluster_offsets(&[10.0, 10.0], 5.0, true);
        assert_eq!(offsets, vec![5.0, 20.0]);
    }
}

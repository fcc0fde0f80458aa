//! Planar geometry helpers shared by the scenario generators, the engines and
//! the episode driver.

use nalgebra::Vector2;

/// A 2D point or velocity in world units.
pub type Vec2 = Vector2<f64>;

/// Shorthand constructor.
pub fn vec2(x: f64, y: f64) -> Vec2 {
    Vec2::new(x, y)
}

/// Euclidean distance between two points.
pub fn distance(a: &Vec2, b: &Vec2) -> f64 {
    (a - b).norm()
}

/// Scale `v` down to `max_norm` if it is longer; shorter vectors pass through
/// unchanged so agents decelerate as they close in on their goal.
pub fn cap_magnitude(v: Vec2, max_norm: f64) -> Vec2 {
    let norm = v.norm();
    if norm > max_norm {
        v * (max_norm / norm)
    } else {
        v
    }
}

/// Smallest distance over all unordered pairs of `points`, or `None` when
/// there are fewer than two.
pub fn min_pairwise_distance(points: &[Vec2]) -> Option<f64> {
    let mut best: Option<f64> = None;
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            let d = distance(a, b);
            best = Some(best.map_or(d, |m| m.min(d)));
        }
    }
    best
}

/// `n` evenly spaced values over `[start, end]`, endpoints included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

//! Piecewise cubic Hermite interpolation with shape-preserving slopes
//! (Fritsch-Carlson / Fritsch-Butland), so the interpolant never
//! overshoots between monotone data points.

#[derive(Debug, Clone)]
pub struct Pchip {
    x: Vec<f64>,
    y: Vec<f64>,
    slopes: Vec<f64>,
}

impl Pchip {
    /// `x` must be strictly increasing. Returns `None` for fewer than two
    /// points or mismatched lengths.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Option<Self> {
        if x.len() < 2 || x.len() != y.len() {
            return None;
        }
        let slopes = slopes(&x, &y);
        Some(Self { x, y, slopes })
    }

    /// Evaluate at `at`. Values outside the data range use the nearest
    /// end interval's cubic.
    pub fn evaluate(&self, at: f64) -> f64 {
        let n = self.x.len();
        let k = self
            .x
            .partition_point(|&xk| xk <= at)
            .saturating_sub(1)
            .min(n - 2);

        let h = self.x[k + 1] - self.x[k];
        let t = (at - self.x[k]) / h;
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        h00 * self.y[k] + h10 * h * self.slopes[k] + h01 * self.y[k + 1] + h11 * h * self.slopes[k + 1]
    }
}

fn slopes(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let m: Vec<f64> = y
        .windows(2)
        .zip(&h)
        .map(|(w, hk)| (w[1] - w[0]) / hk)
        .collect();

    if n == 2 {
        return vec![m[0], m[0]];
    }

    let mut d = vec![0.0; n];
    for k in 1..n - 1 {
        let (prev, next) = (m[k - 1], m[k]);
        if prev == 0.0 || next == 0.0 || prev.signum() != next.signum() {
            continue;
        }
        // weighted harmonic mean
        let w1 = 2.0 * h[k] + h[k - 1];
        let w2 = h[k] + 2.0 * h[k - 1];
        d[k] = (w1 + w2) / (w1 / prev + w2 / next);
    }
    d[0] = edge_slope(h[0], h[1], m[0], m[1]);
    d[n - 1] = edge_slope(h[n - 2], h[n - 3], m[n - 2], m[n - 3]);
    d
}

/// Three-point end slope, forced to keep the shape of the end interval.
fn edge_slope(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if sign(d) != sign(m0) {
        0.0
    } else if sign(m0) != sign(m1) && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_passes_through_knots() {
        let x = vec![0.0, 1.0, 3.0, 4.0, 7.0];
        let y = vec![10.0, 20.0, 15.0, 30.0, 50.0];
        let p = Pchip::new(x.clone(), y.clone()).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert!(approx(p.evaluate(*xi), *yi));
        }
    }

    #[test]
    fn test_monotone_data_stays_monotone() {
        let p = Pchip::new(vec![0.0, 1.0, 2.0, 10.0], vec![0.0, 1.0, 1.0, 100.0]).unwrap();
        let mut previous = f64::MIN;
        for i in 0..=100 {
            let v = p.evaluate(i as f64 * 0.1);
            assert!(v >= previous - 1e-12);
            assert!(v <= 100.0 + 1e-12);
            previous = v;
        }
        // flat segment stays flat
        assert!(approx(p.evaluate(1.5), 1.0));
    }

    #[test]
    fn test_linear_data_is_reproduced() {
        let p = Pchip::new(vec![0.0, 2.0, 4.0, 6.0], vec![0.0, 4.0, 8.0, 12.0]).unwrap();
        assert!(approx(p.evaluate(1.0), 2.0));
        assert!(approx(p.evaluate(5.5), 11.0));
    }

    #[test]
    fn test_two_points_is_linear() {
        let p = Pchip::new(vec![0.0, 10.0], vec![0.0, 5.0]).unwrap();
        assert!(approx(p.evaluate(4.0), 2.0));
    }

    #[test]
    fn test_rejects_degenerate_input() {
        assert!(Pchip::new(vec![1.0], vec![1.0]).is_none());
        assert!(Pchip::new(vec![1.0, 2.0], vec![1.0]).is_none());
    }
}

use rand::Rng;

/// Beta / Gamma / Normal sampling over a caller-supplied random source.
///
/// Gamma draws use Marsaglia–Tsang with Box–Muller normals; Beta draws are
/// `G(alpha) / (G(alpha) + G(beta))`, kept strictly inside (0, 1). Seeding the source makes
/// every draw reproducible.
pub struct ProbabilitySampler<'a, R: Rng + ?Sized> {
    rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> ProbabilitySampler<'a, R> {
    pub fn new(rng: &'a mut R) -> Self {
        Self { rng }
    }

    /// Uniform draw in (0, 1].
    fn open_uniform(&mut self) -> f64 {
        1.0 - self.rng.gen::<f64>()
    }

    pub fn standard_normal(&mut self) -> f64 {
        let u1 = self.open_uniform();
        let u2 = self.rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }

    pub fn gamma(&mut self, shape: f64) -> f64 {
        let shape = if shape.is_finite() && shape > 0.0 {
            shape
        } else {
            1.0
        };

        if shape < 1.0 {
            let boosted = self.gamma(shape + 1.0);
            return boosted * self.open_uniform().powf(1.0 / shape);
        }

        let d = shape - 1.0 / 3.0;
        let c = 1.0 / (9.0 * d).sqrt();
        loop {
            let x = self.standard_normal();
            let v = 1.0 + c * x;
            if v <= 0.0 {
                continue;
            }
            let v = v * v * v;
            let u = self.open_uniform();
            let x2 = x * x;
            if u < 1.0 - 0.0331 * x2 * x2 {
                return d * v;
            }
            if u.ln() < 0.5 * x2 + d * (1.0 - v + v.ln()) {
                return d * v;
            }
        }
    }

    pub fn beta(&mut self, alpha: f64, beta: f64) -> f64 {
        let x = self.gamma(alpha);
        let y = self.gamma(beta);
        let total = x + y;
        if total > 0.0 && total.is_finite() {
            (x / total).clamp(f64::MIN_POSITIVE, 1.0 - f64::EPSILON)
        } else {
            0.5
        }
    }
}

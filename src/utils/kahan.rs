/// Kahan compensated summation.
///
/// The estimator accumulates up to `|S|·k` inverse-τ terms of wildly
/// different magnitudes; compensation keeps the result independent of the
/// merge order.
pub struct KahanSummation {
    /// The current value of the sum
    value: f64,
    /// The current correction
    c: f64,
}

impl KahanSummation {
    pub fn new() -> Self {
        Self { value: 0.0, c: 0.0 }
    }

    /// Adds a value.
    pub fn add(&mut self, v: f64) {
        let y = v - self.c;
        let t = self.value + y;
        self.c = (t - self.value) - y;
        self.value = t;
    }

    /// Returns the sum computed so far.
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Default for KahanSummation {
    fn default() -> Self {
        Self::new()
    }
}

use super::TrailingBuffer;

/// Moving average smoother for the raw ECG stream
///
/// Emits one smoothed value per raw sample: the arithmetic mean of the last
/// `window_size` raw samples. Until that many samples have arrived the raw
/// value is passed through unchanged, so the pipeline produces output from
/// the first sample (at the cost of full noise during warm-up).
#[derive(Debug, Clone)]
pub struct Smoother {
    raw: TrailingBuffer<f64>,
    window_size: usize,
}

impl Smoother {
    /// Create a new smoother
    ///
    /// # Arguments
    /// * `window_size` - Number of raw samples to average (larger = smoother but more lag)
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            raw: TrailingBuffer::new(window_size),
            window_size,
        }
    }

    /// Add a raw sample and return the smoothed value
    pub fn process(&mut self, raw: i32) -> f64 {
        let value = f64::from(raw);
        self.raw.push(value);

        if self.raw.len() < self.window_size {
            return value;
        }

        let sum: f64 = self.raw.iter().sum();
        sum / self.window_size as f64
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Whether enough samples have arrived for output to be averaged
    pub fn is_warm(&self) -> bool {
        self.raw.is_full()
    }
}

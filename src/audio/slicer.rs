use crate::types::Waveform;

impl Waveform {
    /// Copy of the samples between two times, clamped to the signal.
    pub fn extract_part(&self, from: f64, to: f64) -> Waveform {
        let start = self.index_at(from);
        let end = self.index_at(to).max(start);
        Waveform::new(self.samples[start..end].to_vec(), self.sample_rate)
    }

    /// Root mean square amplitude between two times, `None` for an empty span.
    pub fn rms(&self, from: f64, to: f64) -> Option<f64> {
        let part = self.extract_part(from, to);
        if part.is_empty() {
            return None;
        }
        let sum: f64 = part.samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        Some((sum / part.samples.len() as f64).sqrt())
    }
}

//! Synthetic single-lead ECG traces
//!
//! Two rhythm classes: normal sinus rhythm (regular RR intervals with
//! P-QRS-T morphology) and atrial fibrillation (irregularly irregular RR
//! intervals, absent P wave, fibrillatory baseline oscillation). Waves are
//! modeled as Gaussian bumps placed along the trace.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use tsc_core::{Dataset, LabeledSignal, Signal, TscResult};

/// Rhythm classes for the ECG task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EcgRhythm {
    NormalSinus,
    AtrialFibrillation,
}

impl EcgRhythm {
    pub fn label(&self) -> &'static str {
        match self {
            EcgRhythm::NormalSinus => "Normal",
            EcgRhythm::AtrialFibrillation => "AFib",
        }
    }
}

/// Gaussian bump: amplitude at `center` with the given width in seconds
fn wave(t: f32, center: f32, amplitude: f32, width: f32) -> f32 {
    let d = (t - center) / width;
    amplitude * (-0.5 * d * d).exp()
}

/// Seeded ECG trace generator
pub struct EcgGenerator {
    sampling_rate: f32,
    rng: StdRng,
}

impl EcgGenerator {
    pub fn new(sampling_rate: f32, seed: u64) -> Self {
        Self {
            sampling_rate,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate one trace of random duration (6-10 s)
    pub fn generate(&mut self, rhythm: EcgRhythm) -> TscResult<Signal> {
        let seconds = self.rng.gen_range(6.0..10.0);
        self.generate_seconds(rhythm, seconds)
    }

    /// Generate one trace of the given duration
    pub fn generate_seconds(&mut self, rhythm: EcgRhythm, seconds: f32) -> TscResult<Signal> {
        let samples = (seconds * self.sampling_rate) as usize;
        let mut data = vec![0.0f32; samples];

        let base_rr = 60.0 / self.rng.gen_range(55.0..95.0);

        // Place beats along the trace
        let mut beat_time = self.rng.gen_range(0.0..base_rr);
        while beat_time < seconds {
            self.add_beat(&mut data, beat_time, rhythm);

            let rr = match rhythm {
                // Regular: small jitter around the base interval
                EcgRhythm::NormalSinus => base_rr + self.rng.gen_range(-0.02..0.02),
                // Irregularly irregular: wide uniform spread per beat
                EcgRhythm::AtrialFibrillation => base_rr * self.rng.gen_range(0.5..1.5),
            };
            beat_time += rr.max(0.25);
        }

        // Fibrillatory baseline oscillation replaces the P wave in AFib
        if rhythm == EcgRhythm::AtrialFibrillation {
            let f_wave_freq = self.rng.gen_range(5.0..8.0);
            let f_wave_phase = self.rng.gen_range(0.0..2.0 * PI);
            for (i, sample) in data.iter_mut().enumerate() {
                let t = i as f32 / self.sampling_rate;
                *sample += 0.06 * (2.0 * PI * f_wave_freq * t + f_wave_phase).sin();
            }
        }

        // Measurement noise
        let noise = Normal::new(0.0, 0.03).map_err(|e| tsc_core::TscError::Config {
            message: format!("bad noise level: {}", e),
        })?;
        for sample in &mut data {
            *sample += noise.sample(&mut self.rng);
        }

        Signal::mono(data, self.sampling_rate)
    }

    /// Add one beat's morphology around `beat_time`
    fn add_beat(&mut self, data: &mut [f32], beat_time: f32, rhythm: EcgRhythm) {
        let r_amp = self.rng.gen_range(0.9..1.1);

        for (i, sample) in data.iter_mut().enumerate() {
            let t = i as f32 / self.sampling_rate;
            if (t - beat_time).abs() > 0.5 {
                continue;
            }

            // QRS complex
            *sample += wave(t, beat_time - 0.035, -0.12, 0.012);
            *sample += wave(t, beat_time, r_amp, 0.014);
            *sample += wave(t, beat_time + 0.04, -0.22, 0.014);
            // T wave
            *sample += wave(t, beat_time + 0.27, 0.28, 0.06);
            // P wave only in sinus rhythm
            if rhythm == EcgRhythm::NormalSinus {
                *sample += wave(t, beat_time - 0.17, 0.14, 0.025);
            }
        }
    }

    /// Labeled two-class dataset with the requested counts
    pub fn generate_dataset(&mut self, normal: usize, afib: usize) -> TscResult<Dataset> {
        let mut examples = Vec::new();
        for _ in 0..normal {
            let signal = self.generate(EcgRhythm::NormalSinus)?;
            examples.push(LabeledSignal::new(signal, EcgRhythm::NormalSinus.label()));
        }
        for _ in 0..afib {
            let signal = self.generate(EcgRhythm::AtrialFibrillation)?;
            examples.push(LabeledSignal::new(signal, EcgRhythm::AtrialFibrillation.label()));
        }
        Dataset::new(examples)
    }
}

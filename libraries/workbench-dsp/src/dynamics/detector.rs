/// Branching one-pole level detector
///
/// Smooths a control signal with separate attack and release time constants.
/// The coefficient for a time constant `t` at sample rate `fs` is
/// `alpha = exp(-1 / (fs * t))`, so the state covers `1 - 1/e` of a step
/// after `t` seconds.

/// Compensates RMS energy scaling so both detector variants yield
/// comparably scaled control signals at matched settings
const RMS_SCALE: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Attack/release envelope detector with peak and RMS variants
#[derive(Debug, Clone)]
pub struct LevelDetector {
    sample_rate: f64,
    attack_secs: f64,
    release_secs: f64,
    alpha_attack: f64,
    alpha_release: f64,
    state: f64,
}

impl LevelDetector {
    /// Create a detector with 50 ms attack and 250 ms release
    ///
    /// [`prepare`](Self::prepare) must be called before processing.
    pub fn new() -> Self {
        Self {
            sample_rate: 0.0,
            attack_secs: 0.05,
            release_secs: 0.25,
            alpha_attack: 0.0,
            alpha_release: 0.0,
            state: 0.0,
        }
    }

    /// Recompute both coefficients for `sample_rate` and reset the state
    pub fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.alpha_attack = Self::alpha(sample_rate, self.attack_secs);
        self.alpha_release = Self::alpha(sample_rate, self.release_secs);
        self.state = 0.0;
    }

    /// Set the attack time constant in seconds (must be positive)
    ///
    /// The coefficient is only recomputed when the value changes.
    pub fn set_attack(&mut self, seconds: f64) {
        if seconds != self.attack_secs {
            self.attack_secs = seconds;
            self.alpha_attack = Self::alpha(self.sample_rate, seconds);
        }
    }

    /// Set the release time constant in seconds (must be positive)
    ///
    /// The coefficient is only recomputed when the value changes.
    pub fn set_release(&mut self, seconds: f64) {
        if seconds != self.release_secs {
            self.release_secs = seconds;
            self.alpha_release = Self::alpha(self.sample_rate, seconds);
        }
    }

    /// Attack time constant in seconds
    pub fn attack(&self) -> f64 {
        self.attack_secs
    }

    /// Release time constant in seconds
    pub fn release(&self) -> f64 {
        self.release_secs
    }

    /// Attack coefficient
    pub fn alpha_attack(&self) -> f64 {
        self.alpha_attack
    }

    /// Release coefficient
    pub fn alpha_release(&self) -> f64 {
        self.alpha_release
    }

    /// Current smoothed value
    pub fn state(&self) -> f64 {
        self.state
    }

    /// Clear the smoothed value
    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    /// Smooth a dB-domain attenuation signal in place
    ///
    /// The input is already negative-going gain reduction, so a sample below
    /// the state (more reduction) takes the attack branch.
    pub fn apply_peak_detector(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            let x = f64::from(*sample);
            let alpha = if x < self.state {
                self.alpha_attack
            } else {
                self.alpha_release
            };
            self.state = alpha * self.state + (1.0 - alpha) * x;
            *sample = self.state as f32;
        }
    }

    /// Smooth a linear sidechain in the power domain, in place
    ///
    /// Each sample is squared and compared against the state; a louder sample
    /// takes the attack branch. The output is `sqrt(state) / sqrt(2)`.
    pub fn apply_rms_detector(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            let x = f64::from(*sample);
            let squared = x * x;
            let alpha = if squared > self.state {
                self.alpha_attack
            } else {
                self.alpha_release
            };
            self.state = alpha * self.state + (1.0 - alpha) * squared;
            *sample = (self.state.sqrt() * RMS_SCALE) as f32;
        }
    }

    fn alpha(sample_rate: f64, seconds: f64) -> f64 {
        (-1.0 / (sample_rate * seconds)).exp()
    }
}

impl Default for LevelDetector {
    fn default() -> Self {
        Self::new()
    }
}

//! PID controller for the enclosure temperature loop
//!
//! Proportional-integral-derivative controller with clamped output and
//! clamp-and-hold anti-windup: the integral never carries the unclamped
//! sum further past a bound than it already is. The output is a demand figure in
//! `[output_min, output_max]` that the decision engine thresholds into a
//! cooler on/off command.

/// Read-only view of the controller after the most recent update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidSnapshot {
    pub setpoint: f32,
    pub error: f32,
    pub integral: f32,
    pub derivative: f32,
    pub proportional_term: f32,
    pub integral_term: f32,
    pub derivative_term: f32,
    pub output: f32,
    /// True when the unclamped sum lay outside the output bounds.
    pub saturated: bool,
}

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f32,
    ki: f32,
    kd: f32,
    setpoint: f32,
    integral: f32,
    prev_error: f32,
    /// False until the first sample after construction or reset.
    primed: bool,
    output_min: f32,
    output_max: f32,
    last: PidSnapshot,
}

impl PidController {
    pub fn new(kp: f32, ki: f32, kd: f32, setpoint: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            setpoint,
            integral: 0.0,
            prev_error: 0.0,
            primed: false,
            output_min: 0.0,
            output_max: 100.0,
            last: PidSnapshot {
                setpoint,
                ..PidSnapshot::default()
            },
        }
    }

    /// Set output limits
    pub fn set_limits(&mut self, min: f32, max: f32) {
        self.output_min = min;
        self.output_max = max;
        self.last.output = self.last.output.clamp(min, max);
    }

    /// Retune gains in place. History is kept.
    pub fn set_gains(&mut self, kp: f32, ki: f32, kd: f32) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    /// Re-seed the setpoint. Integral and derivative history are kept;
    /// call [`reset`](Self::reset) as well to start over.
    pub fn set_target(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
        self.last.setpoint = setpoint;
    }

    pub fn target(&self) -> f32 {
        self.setpoint
    }

    /// Compute PID output given current measurement and seconds since the
    /// previous sample.
    pub fn compute(&mut self, measurement: f32, dt: f32) -> f32 {
        let error = self.setpoint - measurement;
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        // Proportional
        let p = self.kp * error;

        // Derivative (no kick on the first sample)
        let derivative = if self.primed && dt > 0.0 {
            (error - self.prev_error) / dt
        } else {
            0.0
        };
        let d = self.kd * derivative;

        // Integral, tentatively
        let candidate = self.integral + error * dt;
        let unclamped = p + self.ki * candidate + d;

        // Anti-windup: when this step's contribution pushes past a bound,
        // accumulate only as far as the bound and hold there.
        let push = self.ki * error * dt;
        let saturated = unclamped > self.output_max || unclamped < self.output_min;
        let bound = if unclamped > self.output_max && push > 0.0 {
            Some(self.output_max)
        } else if unclamped < self.output_min && push < 0.0 {
            Some(self.output_min)
        } else {
            None
        };
        self.integral = match bound {
            None => candidate,
            Some(bound) => {
                // push != 0 implies ki != 0
                let at_bound = (bound - p - d) / self.ki;
                let (lo, hi) = if candidate < self.integral {
                    (candidate, self.integral)
                } else {
                    (self.integral, candidate)
                };
                at_bound.clamp(lo, hi)
            }
        };
        let i = self.ki * self.integral;

        let output = (p + i + d).clamp(self.output_min, self.output_max);

        self.prev_error = error;
        self.primed = true;
        self.last = PidSnapshot {
            setpoint: self.setpoint,
            error,
            integral: self.integral,
            derivative,
            proportional_term: p,
            integral_term: i,
            derivative_term: d,
            output,
            saturated,
        };

        output
    }

    /// Snapshot of the most recent update.
    pub fn inspect(&self) -> PidSnapshot {
        self.last
    }

    /// Reset controller state
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.primed = false;
        self.last = PidSnapshot {
            setpoint: self.setpoint,
            ..PidSnapshot::default()
        };
    }
}

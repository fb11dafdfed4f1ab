//! Constant-velocity Kalman filter over XYAH box measurements.
//!
//! State is `[cx, cy, a, h, vcx, vcy, va, vh]`; process and measurement noise
//! scale with the box height so that large and small targets are filtered
//! alike.

use ndarray::{Array1, Array2};

use crate::error::{Result, ServoError};

/// Mean and covariance of one track estimate.
#[derive(Debug, Clone)]
pub struct KalmanState {
    pub mean: Array1<f64>,
    pub covariance: Array2<f64>,
}

impl KalmanState {
    /// XYAH part of the mean.
    pub fn measurement(&self) -> [f64; 4] {
        [self.mean[0], self.mean[1], self.mean[2], self.mean[3]]
    }
}

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: Array2<f64>,
    update_mat: Array2<f64>,
    std_weight_position: f64,
    std_weight_velocity: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new(1.0 / 20.0, 1.0 / 160.0)
    }
}

const NDIM: usize = 4;

impl KalmanFilter {
    pub fn new(std_weight_position: f64, std_weight_velocity: f64) -> Self {
        let mut motion_mat = Array2::eye(2 * NDIM);
        let mut update_mat = Array2::zeros((NDIM, 2 * NDIM));
        for i in 0..NDIM {
            motion_mat[[i, NDIM + i]] = 1.0;
            update_mat[[i, i]] = 1.0;
        }

        Self {
            motion_mat,
            update_mat,
            std_weight_position,
            std_weight_velocity,
        }
    }

    /// Seed a state from an unassociated measurement, velocities at zero.
    pub fn initiate(&self, measurement: [f64; 4]) -> KalmanState {
        let mut mean = Array1::zeros(2 * NDIM);
        for (i, value) in measurement.iter().enumerate() {
            mean[i] = *value;
        }

        let h = measurement[3];
        let pos = 2.0 * self.std_weight_position * h;
        let vel = 10.0 * self.std_weight_velocity * h;
        let covariance = diagonal(&[pos, pos, 1e-2, pos, vel, vel, 1e-5, vel]);

        KalmanState { mean, covariance }
    }

    pub fn predict(&self, state: &KalmanState) -> KalmanState {
        let h = state.mean[3];
        let pos = self.std_weight_position * h;
        let vel = self.std_weight_velocity * h;
        let motion_cov = diagonal(&[pos, pos, 1e-2, pos, vel, vel, 1e-5, vel]);

        KalmanState {
            mean: self.motion_mat.dot(&state.mean),
            covariance: self
                .motion_mat
                .dot(&state.covariance)
                .dot(&self.motion_mat.t())
                + motion_cov,
        }
    }

    /// Project the state into measurement space: (mean, innovation covariance).
    pub fn project(&self, state: &KalmanState) -> (Array1<f64>, Array2<f64>) {
        let h = state.mean[3];
        let pos = self.std_weight_position * h;
        let innovation_cov = diagonal(&[pos, pos, 1e-1, pos]);

        let mean = self.update_mat.dot(&state.mean);
        let covariance =
            self.update_mat.dot(&state.covariance).dot(&self.update_mat.t()) + innovation_cov;

        (mean, covariance)
    }

    /// Correct the state with an associated measurement.
    ///
    /// Fails only when the innovation covariance cannot be inverted, which
    /// happens for degenerate (zero-height) boxes.
    pub fn update(&self, state: &KalmanState, measurement: [f64; 4]) -> Result<KalmanState> {
        let (projected_mean, projected_cov) = self.project(state);
        let innovation = Array1::from_vec(measurement.to_vec()) - projected_mean;

        // K = P * H^T * S^-1, with H = [I 0].
        let s_inv = invert_4x4(&projected_cov)?;
        let kalman_gain = state.covariance.dot(&self.update_mat.t()).dot(&s_inv);

        Ok(KalmanState {
            mean: &state.mean + &kalman_gain.dot(&innovation),
            covariance: &state.covariance
                - &kalman_gain.dot(&projected_cov).dot(&kalman_gain.t()),
        })
    }
}

fn diagonal(std: &[f64]) -> Array2<f64> {
    let mut m = Array2::zeros((std.len(), std.len()));
    for (i, s) in std.iter().enumerate() {
        m[[i, i]] = s * s;
    }
    m
}

/// 4x4 inverse through nalgebra, avoiding a BLAS/LAPACK dependency.
fn invert_4x4(m: &Array2<f64>) -> Result<Array2<f64>> {
    let nm = nalgebra::Matrix4::from_fn(|i, j| m[[i, j]]);
    let inv = nm.try_inverse().ok_or(ServoError::SingularCovariance)?;
    Ok(Array2::from_shape_fn((4, 4), |(i, j)| inv[(i, j)]))
}

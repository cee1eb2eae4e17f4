// Churn process: connect/disconnect inter-arrival generator
//
// Connect arrivals follow a fixed-rate Poisson process. The disconnect process
// is state dependent: its rate is the per-session base rate times the number of
// active sessions, floored at one session so the process never freezes.
// Re-parameterising only affects the next draw; disconnect events already on
// the scheduler are left alone (memoryless, so this is exact).

use log::trace;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp};

use crate::ndn_error::{require_positive, SimError, SimResult};
use crate::ndn_interface::SimTime;

pub struct ChurnProcess {
    connect_rate: f64,
    disconnect_rate_base: f64,
    active_count: u64,
    connect_dist: Exp<f64>,
    disconnect_dist: Exp<f64>,
    rng: StdRng,
}

impl ChurnProcess {
    pub fn new(connect_rate: f64, disconnect_rate_base: f64) -> SimResult<Self> {
        Self::with_rng(connect_rate, disconnect_rate_base, StdRng::from_entropy())
    }

    pub fn seeded(connect_rate: f64, disconnect_rate_base: f64, seed: u64) -> SimResult<Self> {
        Self::with_rng(connect_rate, disconnect_rate_base, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(connect_rate: f64, disconnect_rate_base: f64, rng: StdRng) -> SimResult<Self> {
        let connect_dist = exponential("connection_rate", connect_rate)?;
        let disconnect_dist = exponential("disconnection_rate", disconnect_rate_base)?;

        Ok(Self {
            connect_rate,
            disconnect_rate_base,
            active_count: 0,
            connect_dist,
            disconnect_dist,
            rng,
        })
    }

    /// Time until the next connect arrival
    pub fn next_connect_interval(&mut self) -> SimTime {
        self.connect_dist.sample(&mut self.rng)
    }

    /// Time until the next disconnect, drawn at the current disconnect rate
    pub fn next_disconnect_interval(&mut self) -> SimTime {
        self.disconnect_dist.sample(&mut self.rng)
    }

    /// Recompute the disconnect rate for `active_count` sessions
    pub fn adjust_disconnect_rate(&mut self, active_count: u64) -> SimResult<()> {
        self.active_count = active_count;
        let rate = self.disconnect_rate();
        self.disconnect_dist = exponential("disconnection_rate", rate)?;
        trace!("disconnect rate now {} ({} active)", rate, active_count);
        Ok(())
    }

    /// Count one more active session and re-parameterise
    pub fn record_connect(&mut self) -> SimResult<()> {
        self.adjust_disconnect_rate(self.active_count + 1)
    }

    /// Count one session fewer and re-parameterise
    pub fn record_disconnect(&mut self) -> SimResult<()> {
        self.adjust_disconnect_rate(self.active_count.saturating_sub(1))
    }

    /// Rate currently used for disconnect draws
    pub fn disconnect_rate(&self) -> f64 {
        self.disconnect_rate_base * self.active_count.max(1) as f64
    }

    pub fn connect_rate(&self) -> f64 {
        self.connect_rate
    }

    pub fn disconnect_rate_base(&self) -> f64 {
        self.disconnect_rate_base
    }

    pub fn active_count(&self) -> u64 {
        self.active_count
    }
}

fn exponential(parameter: &'static str, rate: f64) -> SimResult<Exp<f64>> {
    require_positive(parameter, rate)?;
    Exp::new(rate).map_err(|_| SimError::InvalidDomain {
        parameter,
        value: rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mean<F: FnMut() -> f64>(n: usize, mut f: F) -> f64 {
        (0..n).map(|_| f()).sum::<f64>() / n as f64
    }

    #[test]
    fn test_zero_active_floors_at_base_rate() {
        let mut churn = ChurnProcess::seeded(1.0, 0.25, 1).unwrap();
        churn.adjust_disconnect_rate(10).unwrap();
        assert_eq!(churn.disconnect_rate(), 2.5);

        churn.adjust_disconnect_rate(0).unwrap();
        assert_eq!(churn.disconnect_rate(), 0.25);
        assert_eq!(churn.active_count(), 0);
    }

    #[test]
    fn test_rate_scales_with_active_sessions() {
        let mut churn = ChurnProcess::seeded(1.0, 0.5, 2).unwrap();
        for _ in 0..4 {
            churn.record_connect().unwrap();
        }
        assert_eq!(churn.active_count(), 4);
        assert_eq!(churn.disconnect_rate(), 2.0);

        churn.record_disconnect().unwrap();
        assert_eq!(churn.disconnect_rate(), 1.5);
    }

    #[test]
    fn test_record_disconnect_does_not_underflow() {
        let mut churn = ChurnProcess::seeded(1.0, 0.5, 3).unwrap();
        churn.record_disconnect().unwrap();
        assert_eq!(churn.active_count(), 0);
        assert_eq!(churn.disconnect_rate(), 0.5);
    }

    #[test]
    fn test_intervals_match_rates() {
        let mut churn = ChurnProcess::seeded(4.0, 1.0, 7).unwrap();
        let connect_mean = mean(20_000, || churn.next_connect_interval());
        assert!((connect_mean - 0.25).abs() < 0.02, "mean {}", connect_mean);

        churn.adjust_disconnect_rate(10).unwrap();
        let disconnect_mean = mean(20_000, || churn.next_disconnect_interval());
        assert!((disconnect_mean - 0.1).abs() < 0.01, "mean {}", disconnect_mean);
    }

    #[test]
    fn test_intervals_positive() {
        let mut churn = ChurnProcess::seeded(0.3, 0.1, 11).unwrap();
        for _ in 0..1000 {
            assert!(churn.next_connect_interval() >= 0.0);
            assert!(churn.next_disconnect_interval() >= 0.0);
        }
    }

    #[test]
    fn test_invalid_rates_rejected() {
        assert!(matches!(
            ChurnProcess::new(0.0, 1.0),
            Err(SimError::InvalidDomain { parameter: "connection_rate", .. })
        ));
        assert!(matches!(
            ChurnProcess::new(1.0, -2.0),
            Err(SimError::InvalidDomain { parameter: "disconnection_rate", .. })
        ));
    }
}

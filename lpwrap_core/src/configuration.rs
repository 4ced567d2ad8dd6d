//! Process wide defaults used when building and solving models
use std::sync::{LazyLock, RwLock};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

#[derive(Debug, Clone)]
pub struct Configuration {
    /// Finite stand-in for infinity in coefficients and bounds handed to a solver
    pub big_m: f64,
    /// Lower bound given to notations which don't specify one
    pub lower_bound: f64,
    /// Upper bound given to notations which don't specify one
    pub upper_bound: f64,
    /// Distance from an integer within which solution values are snapped when scaling
    pub tolerance: f64,
    /// Backend used by [`crate::optimize::model::Model::solve_default`]
    pub solver: Solver,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            big_m: 100_000.,
            lower_bound: 0.,
            upper_bound: f64::INFINITY,
            tolerance: 1e-6,
            solver: Solver::MicroLp,
        }
    }
}

/// Enum used to specify the default solver to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solver {
    /// Use the pure rust microlp simplex/branch and bound solver, requires the minilp
    /// feature to be enabled
    MicroLp,
}

/// Current big-M sentinel, falling back to the default if the lock is poisoned
pub(crate) fn big_m() -> f64 {
    CONFIGURATION
        .read()
        .map(|config| config.big_m)
        .unwrap_or_else(|_| Configuration::default().big_m)
}

/// Snapshot of the current configuration
pub(crate) fn current() -> Configuration {
    CONFIGURATION
        .read()
        .map(|config| config.clone())
        .unwrap_or_default()
}

/// Serializes tests which read or change the process wide configuration
#[cfg(test)]
pub(crate) mod test_lock {
    use std::sync::{Mutex, MutexGuard};

    use super::{Configuration, CONFIGURATION};

    static CONFIGURATION_LOCK: Mutex<()> = Mutex::new(());

    /// Holds the lock and restores the configuration it found when dropped
    pub(crate) struct ConfigurationGuard {
        previous: Configuration,
        _lock: MutexGuard<'static, ()>,
    }

    pub(crate) fn lock_configuration() -> ConfigurationGuard {
        let lock = CONFIGURATION_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        ConfigurationGuard {
            previous: super::current(),
            _lock: lock,
        }
    }

    impl ConfigurationGuard {
        pub(crate) fn set_big_m(&self, big_m: f64) {
            CONFIGURATION.write().unwrap().big_m = big_m;
        }
    }

    impl Drop for ConfigurationGuard {
        fn drop(&mut self) {
            if let Ok(mut config) = CONFIGURATION.write() {
                *config = self.previous.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Configuration::default();
        assert!((config.big_m - 100_000.).abs() < 1e-25);
        assert!((config.lower_bound - 0.).abs() < 1e-25);
        assert!(config.upper_bound.is_infinite() && config.upper_bound > 0.);
        assert_eq!(config.solver, Solver::MicroLp);
    }
}

use crate::flight_control::{FlightPhase, Vec3};
use std::{env, net::SocketAddr, str::FromStr, time::Duration};
use strum_macros::Display;

/// Mission parameters, resolved once at startup.
///
/// Every controller receives a reference to this at construction and copies
/// what it needs. Nothing is re-read while flying.
#[derive(Debug, Clone, PartialEq)]
pub struct LanderConfig {
    /// Landing target in local coordinates. Defaults to the origin, i.e. where
    /// the vehicle initialized its inertial navigation.
    pub target_local_position: Vec3<f64>,
    /// Height above the target at which the target is approached.
    pub target_seek_altitude: f64,
    /// Vertical speed of the commanded descent, in length units per second.
    pub descent_rate: f64,
    /// Height above the target at which the descent hands over to landing.
    pub land_handoff_altitude: f64,
    /// Height above the target held after an abort.
    pub abort_altitude: f64,
    /// Consecutive control periods without tracking before the descent gives up.
    pub max_lost_ticks: u32,
    pub control_rate_hz: f64,
    pub initial_phase: FlightPhase,
    /// Phases that must be registered on top of the controllers' own successors,
    /// e.g. because the operator can request them at any time.
    pub required_phases: Vec<FlightPhase>,
    pub tracker_addr: SocketAddr,
    pub autopilot_addr: SocketAddr,
}

#[derive(Debug, Display, PartialEq, Eq)]
pub enum ConfigError {
    #[strum(to_string = "invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

impl std::error::Error for ConfigError {}

impl Default for LanderConfig {
    fn default() -> Self {
        Self {
            target_local_position: Vec3::zero(),
            target_seek_altitude: 15.0,
            descent_rate: 0.5,
            land_handoff_altitude: 2.0,
            abort_altitude: 25.0,
            max_lost_ticks: 40,
            control_rate_hz: 20.0,
            initial_phase: FlightPhase::Seek,
            required_phases: vec![FlightPhase::Abort],
            tracker_addr: ([127, 0, 0, 1], 14600).into(),
            autopilot_addr: ([127, 0, 0, 1], 14650).into(),
        }
    }
}

impl LanderConfig {
    pub const TARGET_LOCAL_POSITION: &'static str = "LANDER_TARGET_LOCAL_POSITION";
    pub const TARGET_SEEK_ALTITUDE: &'static str = "LANDER_TARGET_SEEK_ALTITUDE";
    pub const DESCENT_RATE: &'static str = "LANDER_DESCENT_RATE";
    pub const LAND_HANDOFF_ALTITUDE: &'static str = "LANDER_LAND_HANDOFF_ALTITUDE";
    pub const ABORT_ALTITUDE: &'static str = "LANDER_ABORT_ALTITUDE";
    pub const MAX_LOST_TICKS: &'static str = "LANDER_MAX_LOST_TICKS";
    pub const CONTROL_RATE_HZ: &'static str = "LANDER_CONTROL_RATE_HZ";
    pub const INITIAL_PHASE: &'static str = "LANDER_INITIAL_PHASE";
    pub const TRACKER_ADDR: &'static str = "LANDER_TRACKER_ADDR";
    pub const AUTOPILOT_ADDR: &'static str = "LANDER_AUTOPILOT_ADDR";

    /// Resolves the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> { Self::from_lookup(|key| env::var(key).ok()) }

    /// Resolves the configuration from an arbitrary key lookup, falling back
    /// to [`LanderConfig::default`] for every key the lookup does not know.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where F: Fn(&str) -> Option<String> {
        let def = Self::default();
        let cfg = Self {
            target_local_position: lookup(Self::TARGET_LOCAL_POSITION)
                .map(|v| Self::parse_position(Self::TARGET_LOCAL_POSITION, &v))
                .transpose()?
                .unwrap_or(def.target_local_position),
            target_seek_altitude: Self::parse_or(
                &lookup,
                Self::TARGET_SEEK_ALTITUDE,
                def.target_seek_altitude,
            )?,
            descent_rate: Self::parse_or(&lookup, Self::DESCENT_RATE, def.descent_rate)?,
            land_handoff_altitude: Self::parse_or(
                &lookup,
                Self::LAND_HANDOFF_ALTITUDE,
                def.land_handoff_altitude,
            )?,
            abort_altitude: Self::parse_or(&lookup, Self::ABORT_ALTITUDE, def.abort_altitude)?,
            max_lost_ticks: Self::parse_or(&lookup, Self::MAX_LOST_TICKS, def.max_lost_ticks)?,
            control_rate_hz: Self::parse_or(&lookup, Self::CONTROL_RATE_HZ, def.control_rate_hz)?,
            initial_phase: Self::parse_or(&lookup, Self::INITIAL_PHASE, def.initial_phase)?,
            required_phases: def.required_phases,
            tracker_addr: Self::parse_or(&lookup, Self::TRACKER_ADDR, def.tracker_addr)?,
            autopilot_addr: Self::parse_or(&lookup, Self::AUTOPILOT_ADDR, def.autopilot_addr)?,
        };
        cfg.check()?;
        Ok(cfg)
    }

    /// The fixed period of the control loop.
    pub fn control_period(&self) -> Duration { Duration::from_secs_f64(1.0 / self.control_rate_hz) }

    fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        F: Fn(&str) -> Option<String>,
    {
        match lookup(key) {
            None => Ok(default),
            Some(raw) => {
                raw.trim().parse().map_err(|_| ConfigError::InvalidValue { key, value: raw })
            }
        }
    }

    /// Parses `"x,y,z"`, optionally wrapped in parentheses or brackets.
    fn parse_position(key: &'static str, raw: &str) -> Result<Vec3<f64>, ConfigError> {
        let invalid = || ConfigError::InvalidValue { key, value: raw.to_string() };
        let trimmed = raw.trim().trim_start_matches(['(', '[']).trim_end_matches([')', ']']);
        let parts = trimmed
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;
        match parts.as_slice() {
            [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
            _ => Err(invalid()),
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        let positive = [
            (Self::DESCENT_RATE, self.descent_rate),
            (Self::CONTROL_RATE_HZ, self.control_rate_hz),
        ];
        let non_negative = [
            (Self::TARGET_SEEK_ALTITUDE, self.target_seek_altitude),
            (Self::LAND_HANDOFF_ALTITUDE, self.land_handoff_altitude),
            (Self::ABORT_ALTITUDE, self.abort_altitude),
        ];
        for (key, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidValue { key, value: value.to_string() });
            }
        }
        // the control loop needs a non-zero period that fits a `Duration`
        if !Duration::try_from_secs_f64(1.0 / self.control_rate_hz).is_ok_and(|p| !p.is_zero()) {
            return Err(ConfigError::InvalidValue {
                key: Self::CONTROL_RATE_HZ,
                value: self.control_rate_hz.to_string(),
            });
        }
        for (key, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue { key, value: value.to_string() });
            }
        }
        if !self.target_local_position.is_finite() {
            return Err(ConfigError::InvalidValue {
                key: Self::TARGET_LOCAL_POSITION,
                value: self.target_local_position.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, LanderConfig};
    use crate::flight_control::{FlightPhase, Vec3};
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = LanderConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg, LanderConfig::default());
        assert_eq!(cfg.target_local_position, Vec3::new(0.0, 0.0, 0.0));
        assert!((cfg.target_seek_altitude - 15.0).abs() < f64::EPSILON);
        assert_eq!(cfg.control_period(), Duration::from_millis(50));
        assert_eq!(cfg.initial_phase, FlightPhase::Seek);
    }

    #[test]
    fn test_overrides() {
        let cfg = LanderConfig::from_lookup(lookup_from(&[
            (LanderConfig::TARGET_LOCAL_POSITION, "(10, -4.5, 1)"),
            (LanderConfig::TARGET_SEEK_ALTITUDE, "30"),
            (LanderConfig::INITIAL_PHASE, "descend"),
            (LanderConfig::CONTROL_RATE_HZ, "10"),
            (LanderConfig::TRACKER_ADDR, "0.0.0.0:9000"),
        ]))
        .unwrap();
        assert_eq!(cfg.target_local_position, Vec3::new(10.0, -4.5, 1.0));
        assert!((cfg.target_seek_altitude - 30.0).abs() < f64::EPSILON);
        assert_eq!(cfg.initial_phase, FlightPhase::Descend);
        assert_eq!(cfg.control_period(), Duration::from_millis(100));
        assert_eq!(cfg.tracker_addr.port(), 9000);
    }

    #[test]
    fn test_malformed_values() {
        let bad_pos =
            LanderConfig::from_lookup(lookup_from(&[(LanderConfig::TARGET_LOCAL_POSITION, "1,2")]));
        assert_eq!(
            bad_pos,
            Err(ConfigError::InvalidValue {
                key: LanderConfig::TARGET_LOCAL_POSITION,
                value: "1,2".to_string()
            })
        );
        let bad_phase =
            LanderConfig::from_lookup(lookup_from(&[(LanderConfig::INITIAL_PHASE, "HOVER")]));
        assert!(bad_phase.is_err());
        let zero_rate =
            LanderConfig::from_lookup(lookup_from(&[(LanderConfig::CONTROL_RATE_HZ, "0")]));
        assert!(zero_rate.is_err());
        for rate in ["1e10", "1e-300"] {
            assert_eq!(
                LanderConfig::from_lookup(lookup_from(&[(LanderConfig::CONTROL_RATE_HZ, rate)])),
                Err(ConfigError::InvalidValue {
                    key: LanderConfig::CONTROL_RATE_HZ,
                    value: rate.parse::<f64>().unwrap().to_string()
                })
            );
        }
        let fast =
            LanderConfig::from_lookup(lookup_from(&[(LanderConfig::CONTROL_RATE_HZ, "1e6")]));
        assert!(!fast.unwrap().control_period().is_zero());
        let nan_alt =
            LanderConfig::from_lookup(lookup_from(&[(LanderConfig::TARGET_SEEK_ALTITUDE, "NaN")]));
        assert!(nan_alt.is_err());
    }
}

//! Hook points and their naming convention.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Orchestration methods that can be intercepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Init,
    Start,
    Stop,
    Dispatch,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Init, Method::Start, Method::Stop, Method::Dispatch];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Init => "init",
            Method::Start => "start",
            Method::Stop => "stop",
            Method::Dispatch => "dispatch",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Before or after the wrapped method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Will,
    Did,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Will => "will",
            Stage::Did => "did",
        }
    }
}

/// A named place where a hook can run: `will_<method>` or `did_<method>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookPoint {
    pub stage: Stage,
    pub method: Method,
}

impl HookPoint {
    pub const fn new(stage: Stage, method: Method) -> Self {
        Self { stage, method }
    }

    pub const fn will(method: Method) -> Self {
        Self::new(Stage::Will, method)
    }

    pub const fn did(method: Method) -> Self {
        Self::new(Stage::Did, method)
    }

    /// Every point, in `will`/`did` pairs per method.
    pub fn all() -> impl Iterator<Item = HookPoint> {
        Method::ALL
            .into_iter()
            .flat_map(|m| [HookPoint::will(m), HookPoint::did(m)])
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.stage.as_str(), self.method.as_str())
    }
}

/// Unrecognized hook name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hook point: {0}")]
pub struct UnknownHookPoint(pub String);

impl FromStr for HookPoint {
    type Err = UnknownHookPoint;

    /// Accepts `will_start` as well as the camel-cased `willStart`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (stage, rest) = if let Some(rest) = s.strip_prefix("will") {
            (Stage::Will, rest)
        } else if let Some(rest) = s.strip_prefix("did") {
            (Stage::Did, rest)
        } else {
            return Err(UnknownHookPoint(s.to_string()));
        };

        let rest = rest.strip_prefix('_').unwrap_or(rest);
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(rest))
            .map(|method| HookPoint::new(stage, method))
            .ok_or_else(|| UnknownHookPoint(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_convention() {
        assert_eq!(HookPoint::will(Method::Start).to_string(), "will_start");
        assert_eq!(HookPoint::did(Method::Dispatch).to_string(), "did_dispatch");
    }

    #[test]
    fn parse_both_spellings() {
        assert_eq!(
            "will_init".parse::<HookPoint>().unwrap(),
            HookPoint::will(Method::Init)
        );
        assert_eq!(
            "didStop".parse::<HookPoint>().unwrap(),
            HookPoint::did(Method::Stop)
        );
        assert!("before_start".parse::<HookPoint>().is_err());
        assert!("will_explode".parse::<HookPoint>().is_err());
    }

    #[test]
    fn all_points_round_trip() {
        let points: Vec<_> = HookPoint::all().collect();
        assert_eq!(points.len(), 8);
        for p in points {
            assert_eq!(p.to_string().parse::<HookPoint>().unwrap(), p);
        }
    }
}

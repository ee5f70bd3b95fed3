use serde::{Deserialize, Serialize};

/// Classification of the type code carried at frame offset 1.
///
/// Advisory only: an unknown code never stops a reading from being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Temperature,
    Humidity,
    Unknown,
}

impl SensorKind {
    pub const TEMPERATURE_CODE: u8 = 0x01;
    pub const HUMIDITY_CODE: u8 = 0x02;

    pub fn from_code(code: u8) -> Self {
        match code {
            Self::TEMPERATURE_CODE => SensorKind::Temperature,
            Self::HUMIDITY_CODE => SensorKind::Humidity,
            _ => SensorKind::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SensorKind::Temperature => "temperature",
            SensorKind::Humidity => "humidity",
            SensorKind::Unknown => "unknown",
        }
    }

    /// Description stored when a sensor is first seen.
    pub fn description(self) -> String {
        format!("{} sensor", self.label())
    }
}

impl core::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

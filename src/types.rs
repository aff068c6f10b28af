use std::fmt;

/// Independently controllable heating circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeatingLoop {
    /// Radiators.
    Loop1,
    /// Convectors.
    Loop2,
    TapWater,
}

impl HeatingLoop {
    pub const ALL: [HeatingLoop; 3] = [HeatingLoop::Loop1, HeatingLoop::Loop2, HeatingLoop::TapWater];

    pub fn as_kronoterm(&self) -> i64 {
        match self {
            HeatingLoop::Loop1 => 1,
            HeatingLoop::Loop2 => 2,
            HeatingLoop::TapWater => 5,
        }
    }

    pub fn from_kronoterm(v: i64) -> Option<Self> {
        match v {
            1 => Some(HeatingLoop::Loop1),
            2 => Some(HeatingLoop::Loop2),
            5 => Some(HeatingLoop::TapWater),
            _ => None,
        }
    }
}

impl fmt::Display for HeatingLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeatingLoop::Loop1 => write!(f, "loop 1"),
            HeatingLoop::Loop2 => write!(f, "loop 2"),
            HeatingLoop::TapWater => write!(f, "tap water"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatingLoopMode {
    Off,
    On,
    Auto,
}

impl HeatingLoopMode {
    pub fn as_kronoterm(&self) -> i64 {
        match self {
            HeatingLoopMode::Off => 0,
            HeatingLoopMode::On => 1,
            HeatingLoopMode::Auto => 2,
        }
    }

    pub fn from_kronoterm(v: i64) -> Option<Self> {
        match v {
            0 => Some(HeatingLoopMode::Off),
            1 => Some(HeatingLoopMode::On),
            2 => Some(HeatingLoopMode::Auto),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatingLoopStatus {
    Off,
    Normal,
    Eco,
    Comfort,
    Auto,
}

impl HeatingLoopStatus {
    pub fn as_kronoterm(&self) -> i64 {
        match self {
            HeatingLoopStatus::Off => 0,
            HeatingLoopStatus::Normal => 1,
            HeatingLoopStatus::Eco => 2,
            HeatingLoopStatus::Comfort => 3,
            HeatingLoopStatus::Auto => 4,
        }
    }

    pub fn from_kronoterm(v: i64) -> Option<Self> {
        match v {
            0 => Some(HeatingLoopStatus::Off),
            1 => Some(HeatingLoopStatus::Normal),
            2 => Some(HeatingLoopStatus::Eco),
            3 => Some(HeatingLoopStatus::Comfort),
            4 => Some(HeatingLoopStatus::Auto),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatPumpOperatingMode {
    Auto,
    Eco,
    Comfort,
}

impl HeatPumpOperatingMode {
    pub fn as_kronoterm(&self) -> i64 {
        match self {
            HeatPumpOperatingMode::Auto => 0,
            HeatPumpOperatingMode::Eco => 1,
            HeatPumpOperatingMode::Comfort => 2,
        }
    }

    pub fn from_kronoterm(v: i64) -> Option<Self> {
        match v {
            0 => Some(HeatPumpOperatingMode::Auto),
            1 => Some(HeatPumpOperatingMode::Eco),
            2 => Some(HeatPumpOperatingMode::Comfort),
            _ => None,
        }
    }
}

/// What the heat pump is physically doing right now. Read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkingFunction {
    Heating,
    SanitaryWaterHeating,
    Cooling,
    PoolHeating,
    AntiLegionella,
    Sleep,
    Startup,
    RemoteDisconnect,
    ActiveCompressorSecurity,
}

impl WorkingFunction {
    pub fn as_kronoterm(&self) -> i64 {
        match self {
            WorkingFunction::Heating => 0,
            WorkingFunction::SanitaryWaterHeating => 1,
            WorkingFunction::Cooling => 2,
            WorkingFunction::PoolHeating => 3,
            WorkingFunction::AntiLegionella => 4,
            WorkingFunction::Sleep => 5,
            WorkingFunction::Startup => 6,
            WorkingFunction::RemoteDisconnect => 7,
            WorkingFunction::ActiveCompressorSecurity => 8,
        }
    }

    pub fn from_kronoterm(v: i64) -> Option<Self> {
        match v {
            0 => Some(WorkingFunction::Heating),
            1 => Some(WorkingFunction::SanitaryWaterHeating),
            2 => Some(WorkingFunction::Cooling),
            3 => Some(WorkingFunction::PoolHeating),
            4 => Some(WorkingFunction::AntiLegionella),
            5 => Some(WorkingFunction::Sleep),
            6 => Some(WorkingFunction::Startup),
            7 => Some(WorkingFunction::RemoteDisconnect),
            8 => Some(WorkingFunction::ActiveCompressorSecurity),
            _ => None,
        }
    }
}

/// Latest daily theoretical consumption in kWh, as computed by the pump/cloud.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PowerConsumption {
    pub heating: f64,
    pub cooling: f64,
    pub tap_water: f64,
    pub pumps: f64,
    pub total: f64,
}

impl PowerConsumption {
    pub fn new(heating: f64, cooling: f64, tap_water: f64, pumps: f64) -> Self {
        Self {
            heating,
            cooling,
            tap_water,
            pumps,
            total: heating + cooling + tap_water + pumps,
        }
    }
}

/// Installation details from the portal's initial menu view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeatPumpInfo {
    pub hp_id: Option<String>,
    pub user_level: Option<String>,
    pub location_name: Option<String>,
    pub loop_names: Option<String>,
    pub active_errors_count: Option<u32>,
}

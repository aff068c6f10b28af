use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use serde_json::Value;

use crate::types::HeatingLoop;
use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://cloud.kronoterm.com";

pub const LOGIN_PATH: &str = "/?login=1";
pub const API_PATH: &str = "/jsoncgi.php";

pub const SESSION_COOKIE: &str = "PHPSESSID";
pub const AUTH_REASON_COOKIE: &str = "AuthReason";

/// The portal only talks to things that look like a desktop browser.
pub const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "User-Agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0",
    ),
    ("Accept", "*/*"),
    ("Accept-Language", "en-US,en;q=0.5"),
    ("Upgrade-Insecure-Requests", "1"),
    ("Priority", "u=0, i"),
];

pub const PARAM_LOOP_STATUS: &str = "circle_status";
pub const PARAM_LOOP_TEMP: &str = "circle_temp";
pub const PARAM_MAIN_MODE: &str = "main_mode";

pub const OPERATING_MODE_PAGE: i32 = -1;

pub const TEMPERATURES_AND_CONFIG: &str = "/TemperaturesAndConfig";
pub const HEATING_CIRCLE_DATA: &str = "/HeatingCircleData";
pub const TREND_CONSUMPTION: &str = "/trend_consumption";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Initial,
    Basic,
    SystemReview,
    Shortcuts,
    HeatingLoop1,
    HeatingLoop1Set,
    HeatingLoop2,
    HeatingLoop2Set,
    TapWater,
    TapWaterSet,
    Alarms,
    AdvancedSettings,
    ConsumptionHistogram,
}

impl Endpoint {
    pub const ALL: [Endpoint; 13] = [
        Endpoint::Initial,
        Endpoint::Basic,
        Endpoint::SystemReview,
        Endpoint::Shortcuts,
        Endpoint::HeatingLoop1,
        Endpoint::HeatingLoop1Set,
        Endpoint::HeatingLoop2,
        Endpoint::HeatingLoop2Set,
        Endpoint::TapWater,
        Endpoint::TapWaterSet,
        Endpoint::Alarms,
        Endpoint::AdvancedSettings,
        Endpoint::ConsumptionHistogram,
    ];

    pub fn query(&self) -> &'static str {
        match self {
            Endpoint::Initial => "Menu=1",
            Endpoint::Basic => "TopPage=1&Subpage=1",
            Endpoint::SystemReview => "TopPage=1&Subpage=2",
            Endpoint::Shortcuts => "TopPage=1&Subpage=3",
            Endpoint::HeatingLoop1 => "TopPage=1&Subpage=5",
            Endpoint::HeatingLoop1Set => "TopPage=1&Subpage=5&Action=1",
            Endpoint::HeatingLoop2 => "TopPage=1&Subpage=6",
            Endpoint::HeatingLoop2Set => "TopPage=1&Subpage=6&Action=1",
            Endpoint::TapWater => "TopPage=1&Subpage=9",
            Endpoint::TapWaterSet => "TopPage=1&Subpage=9&Action=1",
            Endpoint::Alarms => "TopPage=1&Subpage=11",
            Endpoint::AdvancedSettings => "TopPage=3&Subpage=11&Action=1",
            Endpoint::ConsumptionHistogram => "TopPage=4&Subpage=4&Action=4",
        }
    }

    pub fn loop_view(heating_loop: HeatingLoop) -> Self {
        match heating_loop {
            HeatingLoop::Loop1 => Endpoint::HeatingLoop1,
            HeatingLoop::Loop2 => Endpoint::HeatingLoop2,
            HeatingLoop::TapWater => Endpoint::TapWater,
        }
    }

    pub fn loop_set(heating_loop: HeatingLoop) -> Self {
        match heating_loop {
            HeatingLoop::Loop1 => Endpoint::HeatingLoop1Set,
            HeatingLoop::Loop2 => Endpoint::HeatingLoop2Set,
            HeatingLoop::TapWater => Endpoint::TapWaterSet,
        }
    }
}

/// `page` form value the portal expects with a loop parameter change.
pub fn loop_page(heating_loop: HeatingLoop) -> i32 {
    match heating_loop {
        HeatingLoop::Loop1 => 5,
        HeatingLoop::Loop2 => 6,
        HeatingLoop::TapWater => 9,
    }
}

pub fn session_cookie_header(session_id: &str) -> String {
    format!("{SESSION_COOKIE}={session_id}")
}

#[derive(Debug, Serialize)]
pub struct LoginForm<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SetParameterForm<'a> {
    pub param_name: &'a str,
    pub param_value: String,
    pub page: i32,
}

const CONSUMPTION_A_VALUE: &str = "17";
const CONSUMPTION_D_VALUES: [&str; 8] = ["90", "0", "91", "92", "1", "2", "24", "71"];

/// Form body for the daily consumption histogram containing `date`.
pub fn consumption_form(date: NaiveDate) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("year", date.year().to_string()),
        ("d1", date.ordinal().to_string()),
        ("d2", "0".to_string()),
        ("type", "day".to_string()),
        ("aValues[]", CONSUMPTION_A_VALUE.to_string()),
    ];
    form.extend(CONSUMPTION_D_VALUES.iter().map(|v| ("dValues[]", v.to_string())));
    form
}

/// Set calls report success only through `"result": "success"`.
pub fn is_success(response: &Value) -> bool {
    response.get("result").and_then(|v| v.as_str()) == Some("success")
}

pub fn field<'a>(view: &'a Value, pointer: &str) -> Result<&'a Value> {
    match view.pointer(pointer) {
        Some(Value::Null) | None => Err(Error::MissingField(pointer.to_string())),
        Some(v) => Ok(v),
    }
}

fn invalid(pointer: &str, value: &Value) -> Error {
    Error::InvalidValue {
        field: pointer.to_string(),
        value: value.to_string(),
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Numbers arrive either as JSON numbers or as numeric strings.
pub fn f64_field(view: &Value, pointer: &str) -> Result<f64> {
    let value = field(view, pointer)?;
    as_f64(value).ok_or_else(|| invalid(pointer, value))
}

pub fn i64_field(view: &Value, pointer: &str) -> Result<i64> {
    let value = field(view, pointer)?;
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| invalid(pointer, value))
}

/// Read an integer field and map it through one of the closed enums.
pub fn enum_field<T>(view: &Value, pointer: &str, map: fn(i64) -> Option<T>) -> Result<T> {
    let raw = i64_field(view, pointer)?;
    map(raw).ok_or_else(|| Error::InvalidValue {
        field: pointer.to_string(),
        value: raw.to_string(),
    })
}

/// Last element of a numeric trend series.
pub fn last_f64(view: &Value, pointer: &str) -> Result<f64> {
    let value = field(view, pointer)?;
    let series = value.as_array().ok_or_else(|| invalid(pointer, value))?;
    let last = series
        .last()
        .ok_or_else(|| Error::MissingField(format!("{pointer}/-")))?;
    as_f64(last).ok_or_else(|| invalid(pointer, last))
}

pub fn optional_string(view: &Value, key: &str) -> Option<String> {
    match view.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

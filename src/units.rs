//! Unit labels for observation types under the station's unit system.

use serde::Deserialize;

/// Unit system the archive stores records in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitSystem {
    /// US customary units (degrees F, inHg, mph, inches).
    #[default]
    Us,
    /// Metric with km/h winds and rain in cm.
    Metric,
    /// Metric with m/s winds and rain in mm.
    MetricWx,
}

/// Maps an observation type to its unit group.
fn unit_group(obs_type: &str) -> Option<&'static str> {
    match obs_type {
        "outTemp" | "inTemp" | "dewpoint" | "windchill" | "heatindex" | "appTemp" => {
            Some("group_temperature")
        }
        "barometer" | "pressure" | "altimeter" => Some("group_pressure"),
        "windSpeed" | "windGust" => Some("group_speed"),
        "rain" | "ET" => Some("group_rain"),
        "rainRate" => Some("group_rainrate"),
        "outHumidity" | "inHumidity" => Some("group_percent"),
        "windDir" | "windGustDir" => Some("group_direction"),
        "radiation" => Some("group_radiation"),
        "UV" => Some("group_uv"),
        "dateTime" => Some("group_time"),
        "interval" => Some("group_interval"),
        _ => None,
    }
}

/// Returns the standard unit label for an observation type, or None when
/// the observation type has no known unit group.
pub fn standard_unit(system: UnitSystem, obs_type: &str) -> Option<&'static str> {
    use UnitSystem::{Metric, MetricWx, Us};

    let unit = match (system, unit_group(obs_type)?) {
        (Us, "group_temperature") => "degree_F",
        (Metric | MetricWx, "group_temperature") => "degree_C",
        (Us, "group_pressure") => "inHg",
        (Metric | MetricWx, "group_pressure") => "mbar",
        (Us, "group_speed") => "mile_per_hour",
        (Metric, "group_speed") => "km_per_hour",
        (MetricWx, "group_speed") => "meter_per_second",
        (Us, "group_rain") => "inch",
        (Metric, "group_rain") => "cm",
        (MetricWx, "group_rain") => "mm",
        (Us, "group_rainrate") => "inch_per_hour",
        (Metric, "group_rainrate") => "cm_per_hour",
        (MetricWx, "group_rainrate") => "mm_per_hour",
        (_, "group_percent") => "percent",
        (_, "group_direction") => "degree_compass",
        (_, "group_radiation") => "watt_per_meter_squared",
        (_, "group_uv") => "uv_index",
        (_, "group_time") => "unix_epoch",
        (_, "group_interval") => "minute",
        _ => return None,
    };

    Some(unit)
}

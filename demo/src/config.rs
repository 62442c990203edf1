use charlcd_gpio::lcd::hd44780::LineAddressing;
use dotenv::var;
use serde::{Deserialize, Serialize};
use std::env::var_os;
use std::ffi::OsStr;
use std::path::Path;

/// Where the LCD bus goes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Backend {
    /// GPIO character device lines.
    Gpiod,
    /// Nowhere, the bus activity is only logged.
    Trace,
}

/// Hardware settings, read from the environment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Settings {
    pub backend: Backend,
    pub chip: String,
    /// D4, D5, D6, D7, E, RS
    pub pins: Option<[usize; 6]>,
    pub lines: u8,
    pub columns: u8,
    pub addressing: LineAddressing,
    /// Seconds to show the clock for, 0 runs forever.
    pub seconds: u64,
}

impl Settings {
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|key| var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let backend = match lookup("LCD_BACKEND").as_deref().map(str::trim) {
            None | Some("gpiod") => Backend::Gpiod,
            Some("trace") => Backend::Trace,
            Some(other) => eyre::bail!("Unknown LCD backend: {}", other),
        };

        let pins = lookup("LCD_PINS")
            .map(|pins| parse_pin_bus(&pins))
            .transpose()?;
        if backend == Backend::Gpiod && pins.is_none() {
            eyre::bail!("LCD_PINS must list D4 D5 D6 D7 E RS for the gpiod backend");
        }

        let addressing = lookup("LCD_ADDRESSING")
            .map(|name| parse_addressing(&name))
            .transpose()?
            .unwrap_or_default();

        Ok(Settings {
            backend,
            chip: lookup("LCD_GPIO_CHIP").unwrap_or_else(|| "/dev/gpiochip0".to_string()),
            pins,
            lines: parse_or(lookup("LCD_LINES"), 2)?,
            columns: parse_or(lookup("LCD_COLUMNS"), 16)?,
            addressing,
            seconds: parse_or(lookup("LCD_DEMO_SECONDS"), 0)?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> eyre::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(value) => Ok(value.trim().parse()?),
        None => Ok(default),
    }
}

pub fn parse_pin_bus<const N: usize>(pin_str: &str) -> eyre::Result<[usize; N]> {
    pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse())
        .collect::<Result<Vec<_>, _>>()?
        .try_into()
        .map_err(|_| eyre::eyre!("Expected {} pins", N))
}

pub fn parse_addressing(name: &str) -> eyre::Result<LineAddressing> {
    match name.trim() {
        "wrap" => Ok(LineAddressing::Wrap),
        "four-line" => Ok(LineAddressing::FourLine),
        other => Err(eyre::eyre!("Unknown line addressing: {}", other)),
    }
}

/// What to show, from an optional JSON file.
#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq)]
pub struct Config {
    /// First line of the display, the host name when absent.
    #[serde(default)]
    pub banner: Option<String>,
}

impl Config {
    pub fn try_load() -> Option<Self> {
        let config_str = var_os("CONFIG_FILE");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("lcd.json"));
        let config_path = Path::new(config_str);
        if config_path.exists() {
            let file = std::fs::File::open(config_path).ok()?;
            let reader = std::io::BufReader::new(file);
            serde_json::from_reader(reader).ok()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> eyre::Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn pin_bus_accepts_mixed_separators() {
        let pins: [usize; 6] = parse_pin_bus("26, 16;20 21,,17 22").unwrap();
        assert_eq!(pins, [26, 16, 20, 21, 17, 22]);
    }

    #[test]
    fn pin_bus_rejects_wrong_count() {
        assert!(parse_pin_bus::<6>("1,2,3").is_err());
        assert!(parse_pin_bus::<6>("1,2,3,4,5,x").is_err());
    }

    #[test]
    fn defaults_for_trace_backend() {
        let settings = settings(&[("LCD_BACKEND", "trace")]).unwrap();
        assert_eq!(settings, Settings {
            backend: Backend::Trace,
            chip: "/dev/gpiochip0".to_string(),
            pins: None,
            lines: 2,
            columns: 16,
            addressing: LineAddressing::Wrap,
            seconds: 0,
        });
    }

    #[test]
    fn gpiod_backend_needs_pins() {
        assert!(settings(&[]).is_err());

        let settings = settings(&[
            ("LCD_PINS", "26 16 20 21 17 22"),
            ("LCD_LINES", "4"),
            ("LCD_COLUMNS", "20"),
            ("LCD_ADDRESSING", "four-line"),
        ])
        .unwrap();
        assert_eq!(settings.backend, Backend::Gpiod);
        assert_eq!(settings.pins, Some([26, 16, 20, 21, 17, 22]));
        assert_eq!(settings.addressing, LineAddressing::FourLine);
        assert_eq!((settings.lines, settings.columns), (4, 20));
    }

    #[test]
    fn rejects_unknown_names() {
        assert!(settings(&[("LCD_BACKEND", "spi")]).is_err());
        assert!(parse_addressing("diagonal").is_err());
        assert!(settings(&[("LCD_BACKEND", "trace"), ("LCD_COLUMNS", "wide")]).is_err());
    }

    #[test]
    fn config_banner_is_optional() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        let config: Config = serde_json::from_str(r#"{"banner":"Hello"}"#).unwrap();
        assert_eq!(config.banner.as_deref(), Some("Hello"));
    }
}

//! Channel descriptors and the single channel-naming rule.
//!
//! Every node registers its channels through [`ChannelSpec`]s built here,
//! and every channel name in the firmware comes out of [`channel_name`]:
//!
//! | Mode     | Address      | Name                    |
//! |----------|--------------|-------------------------|
//! | `Single` | any          | `temperature`           |
//! | `Multi`  | `28FF64...`  | `temperature-28FF64...` |
//! | `Multi`  | none         | `temperature-1`         |
//!
//! Names, addresses and format strings are fixed-capacity `heapless`
//! strings; anything that does not fit is an [`Error::ChannelName`].

use core::fmt::Write;

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const MAX_CHANNEL_NAME: usize = 48;
pub const MAX_ADDRESS: usize = 24;
pub const MAX_FORMAT: usize = 32;

pub type ChannelName = String<MAX_CHANNEL_NAME>;
pub type SensorAddress = String<MAX_ADDRESS>;
pub type ChannelFormat = String<MAX_FORMAT>;

/// Joins a base name and an instance suffix.
pub const SEPARATOR: char = '-';

pub const STATUS_CHANNEL: &str = "status";
pub const STATUS_OK: &str = "ok";
pub const STATUS_ERROR: &str = "error";
pub const STATUS_FORMAT: &str = "error,ok";

/// How instances under one node are told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceMode {
    /// Only the first discovered sensor is exposed, under bare base names.
    #[default]
    Single,
    /// Every discovered sensor is exposed under a suffixed name.
    Multi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Datatype {
    Enum,
    Float,
    Boolean,
}

/// Registration options for one channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSpec {
    pub name: ChannelName,
    pub datatype: Datatype,
    /// `"min:max"` for numbers, comma-separated values for enums.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ChannelFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<&'static str>,
}

impl ChannelSpec {
    /// Status channel: enum with allowed values `error,ok`.
    pub fn status(name: ChannelName) -> Result<Self> {
        Ok(Self {
            name,
            datatype: Datatype::Enum,
            format: Some(bounded(STATUS_FORMAT, "status format")?),
            unit: None,
            display_name: None,
        })
    }

    /// Value channel instantiated from a per-node template.
    pub fn value(name: ChannelName, template: &ValueTemplate) -> Self {
        Self {
            name,
            datatype: template.datatype,
            format: template.format.clone(),
            unit: template.unit,
            display_name: template.display_name,
        }
    }
}

/// Per-node description of one value channel, stamped out once per instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueTemplate {
    pub base: &'static str,
    pub datatype: Datatype,
    pub format: Option<ChannelFormat>,
    pub unit: Option<&'static str>,
    pub display_name: Option<&'static str>,
}

impl ValueTemplate {
    pub fn float(base: &'static str, unit: &'static str, format: Option<ChannelFormat>) -> Self {
        Self {
            base,
            datatype: Datatype::Float,
            format,
            unit: Some(unit),
            display_name: None,
        }
    }

    pub fn boolean(base: &'static str) -> Self {
        Self {
            base,
            datatype: Datatype::Boolean,
            format: None,
            unit: None,
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: &'static str) -> Self {
        self.display_name = Some(name);
        self
    }
}

/// Build the channel name for instance `index` of a node.
///
/// In `Single` mode the base name is returned unchanged.  In `Multi` mode
/// the hardware address is appended when present, else the decimal index.
pub fn channel_name(
    base: &str,
    mode: InstanceMode,
    index: usize,
    address: Option<&str>,
) -> Result<ChannelName> {
    let mut name: ChannelName = bounded(base, "channel base")?;
    if mode == InstanceMode::Multi {
        let overflow = Error::ChannelName("channel suffix");
        name.push(SEPARATOR).map_err(|_| overflow)?;
        match address {
            Some(addr) => name.push_str(addr).map_err(|_| overflow)?,
            None => write!(name, "{}", index).map_err(|_| overflow)?,
        }
    }
    Ok(name)
}

/// `"min:max"` range string with one decimal, e.g. `"-55.0:125.0"`.
pub fn range_format(min: f32, max: f32) -> Result<ChannelFormat> {
    let mut format = ChannelFormat::new();
    write!(format, "{:.1}:{:.1}", min, max).map_err(|_| Error::ChannelName("range format"))?;
    Ok(format)
}

/// Render a 64-bit one-wire ROM code as 16 upper-case hex digits.
pub fn rom_address(rom: &[u8; 8]) -> SensorAddress {
    let mut address = SensorAddress::new();
    for byte in rom {
        // 16 digits always fit MAX_ADDRESS.
        let _ = write!(address, "{:02X}", byte);
    }
    address
}

/// Copy `s` into a fixed-capacity string, naming `what` on overflow.
pub fn bounded<const N: usize>(s: &str, what: &'static str) -> Result<String<N>> {
    let mut out = String::new();
    out.push_str(s).map_err(|_| Error::ChannelName(what))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_mode_uses_bare_base_name() {
        let name = channel_name("temperature", InstanceMode::Single, 3, Some("28FF")).unwrap();
        assert_eq!(name.as_str(), "temperature");
    }

    #[test]
    fn multi_mode_prefers_hardware_address() {
        let name = channel_name("status", InstanceMode::Multi, 0, Some("28FF641E8216C3A1")).unwrap();
        assert_eq!(name.as_str(), "status-28FF641E8216C3A1");
    }

    #[test]
    fn multi_mode_falls_back_to_index() {
        let name = channel_name("temperature", InstanceMode::Multi, 12, None).unwrap();
        assert_eq!(name.as_str(), "temperature-12");
    }

    #[test]
    fn overlong_names_are_rejected() {
        let base = "x".repeat(MAX_CHANNEL_NAME + 1);
        assert_eq!(
            channel_name(&base, InstanceMode::Single, 0, None),
            Err(Error::ChannelName("channel base"))
        );

        let base = "x".repeat(MAX_CHANNEL_NAME - 1);
        assert_eq!(
            channel_name(&base, InstanceMode::Multi, 10, None),
            Err(Error::ChannelName("channel suffix"))
        );
    }

    #[test]
    fn rom_address_is_upper_hex() {
        let rom = [0x28, 0xFF, 0x64, 0x1E, 0x82, 0x16, 0xC3, 0x0A];
        assert_eq!(rom_address(&rom).as_str(), "28FF641E8216C30A");
    }

    #[test]
    fn range_format_has_one_decimal() {
        assert_eq!(range_format(-55.0, 125.0).unwrap().as_str(), "-55.0:125.0");
        assert_eq!(range_format(0.0, 3.0).unwrap().as_str(), "0.0:3.0");
    }

    #[test]
    fn status_spec_is_error_ok_enum() {
        let spec = ChannelSpec::status(bounded("status", "test").unwrap()).unwrap();
        assert_eq!(spec.datatype, Datatype::Enum);
        assert_eq!(spec.format.as_deref(), Some("error,ok"));
        assert_eq!(spec.unit, None);
    }
}

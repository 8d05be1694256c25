//! Setup-time instance discovery.
//!
//! Turns the driver's instance count into a fixed, ordered set of
//! [`SensorInstance`]s with collision-free identifiers, and registers every
//! instance's channels with the publish adapter.
//!
//! - 0 sensors: one synthetic instance with a bare `status` channel only.
//! - `Single` mode: the first sensor only, bare channel names.
//! - `Multi` mode: every sensor, suffixed by hardware address when the
//!   driver has one, else by position.
//!
//! Identifiers are as stable as the driver's enumeration order.

use core::fmt::Write;

use log::{info, warn};

use crate::app::ports::{PublishPort, SensorDriver};
use crate::error::{Error, Result, SensorFault};
use crate::sensors::SensorInstance;
use crate::sensors::channel::{
    ChannelSpec, InstanceMode, SensorAddress, ValueTemplate, channel_name,
};

/// Channels each instance of a node registers.
#[derive(Debug, Clone, Copy)]
pub struct ChannelLayout<'a> {
    pub mode: InstanceMode,
    pub status_base: &'static str,
    pub values: &'a [ValueTemplate],
}

/// Discover instances and advertise their channels.  Called once per node.
pub fn enumerate<D, P>(
    node_id: &str,
    layout: &ChannelLayout<'_>,
    driver: &mut D,
    publisher: &mut P,
) -> Result<Box<[SensorInstance]>>
where
    D: SensorDriver + ?Sized,
    P: PublishPort + ?Sized,
{
    let discovered = driver.count();

    if discovered == 0 {
        let status = channel_name(layout.status_base, InstanceMode::Single, 0, None)?;
        info!(
            "{}: {}, advertising only a status channel '{}'",
            node_id,
            SensorFault::Absent,
            status
        );
        publisher.advertise(node_id, &ChannelSpec::status(status.clone())?)?;
        return Ok(vec![SensorInstance::absent(status)].into_boxed_slice());
    }

    let count = match layout.mode {
        InstanceMode::Single => {
            if discovered > 1 {
                info!(
                    "{}: found {} sensors, exposing only the first (single-instance mode)",
                    node_id, discovered
                );
            }
            1
        }
        InstanceMode::Multi => discovered,
    };
    info!("{}: found {} sensor(s)", node_id, count);

    // Build every name before advertising anything, so a name that does
    // not fit leaves the adapter untouched.
    let mut instances: Vec<SensorInstance> = Vec::with_capacity(count);
    for index in 0..count {
        let identifier = match layout.mode {
            InstanceMode::Single => None,
            InstanceMode::Multi => Some(unique_identifier(node_id, index, driver, &instances)?),
        };
        let suffix = identifier.as_deref();

        let status = channel_name(layout.status_base, layout.mode, index, suffix)?;
        let mut instance = SensorInstance::new(index, identifier.clone(), status);
        for template in layout.values {
            instance.add_value_channel(channel_name(template.base, layout.mode, index, suffix)?)?;
        }
        instances.push(instance);
    }

    // The adapter has no way to withdraw a channel: if it rejects one
    // part-way, the channels before it stay registered.
    for instance in &instances {
        publisher.advertise(node_id, &ChannelSpec::status(instance.status_channel.clone())?)?;
        for (name, template) in instance.value_channels.iter().zip(layout.values) {
            info!(
                "{}: advertising '{}' unit={} format={}",
                node_id,
                name,
                template.unit.unwrap_or("-"),
                template.format.as_deref().unwrap_or("-")
            );
            publisher.advertise(node_id, &ChannelSpec::value(name.clone(), template))?;
        }
    }

    Ok(instances.into_boxed_slice())
}

/// Hardware address of `index`, or its decimal position when the driver has
/// no address or the address repeats an earlier instance's identifier.
fn unique_identifier<D: SensorDriver + ?Sized>(
    node_id: &str,
    index: usize,
    driver: &mut D,
    taken: &[SensorInstance],
) -> Result<SensorAddress> {
    let is_taken = |id: &str| taken.iter().any(|i| i.identifier.as_deref() == Some(id));

    if let Some(address) = driver.address(index) {
        if !is_taken(address.as_str()) {
            return Ok(address);
        }
        warn!(
            "{}: sensor {} repeats address {}, using its position instead",
            node_id, index, address
        );
    }

    let overflow = Error::ChannelName("sensor position");
    let mut positional = SensorAddress::new();
    write!(positional, "{}", index).map_err(|_| overflow)?;
    // '#' marks a position that had to step around a hardware address.
    let mut attempt = 0usize;
    while is_taken(positional.as_str()) {
        warn!(
            "{}: identifier {} for sensor {} is taken, trying another",
            node_id, positional, index
        );
        positional.clear();
        match attempt {
            0 => write!(positional, "#{}", index),
            n => write!(positional, "#{}-{}", index, n),
        }
        .map_err(|_| overflow)?;
        attempt += 1;
    }
    Ok(positional)
}

//! # Janitza UMG 96RM Register Map
//!
//! Projects a live meter reading into the meter's Modbus register window.
//! Addresses are 0-based; every quantity is an IEEE-754 single-precision
//! float spanning two consecutive 16-bit registers, big-endian with the
//! high word first.

use std::collections::HashMap;

use crate::domain::MeterReading;

// Register addresses (Janitza UMG 96RM manual, section 11.2).
pub const REG_ACTIVE_POWER_L1: u16 = 19000;
pub const REG_ACTIVE_POWER_L2: u16 = 19002;
pub const REG_ACTIVE_POWER_L3: u16 = 19004;
pub const REG_ACTIVE_POWER_TOTAL: u16 = 19006;
pub const REG_VOLTAGE_L1: u16 = 19020;
pub const REG_VOLTAGE_L2: u16 = 19022;
pub const REG_VOLTAGE_L3: u16 = 19024;
pub const REG_CURRENT_L1: u16 = 19040;
pub const REG_CURRENT_L2: u16 = 19042;
pub const REG_CURRENT_L3: u16 = 19044;
pub const REG_POWER_FACTOR: u16 = 19060;
pub const REG_TOTAL_ENERGY: u16 = 19062;
pub const REG_FREQUENCY: u16 = 19064;

pub const MIN_REGISTER_ADDRESS: u16 = REG_ACTIVE_POWER_L1;
pub const MAX_REGISTER_ADDRESS: u16 = REG_FREQUENCY + 1;
/// Clients may over-read past the window; reads up to this guard return
/// zeros instead of an exception.
pub const ADDRESS_GUARD: u16 = 100;

/// Encode a float into two big-endian register words.
/// High word carries bits 31..16, low word bits 15..0.
pub fn float_to_registers(value: f32) -> (u16, u16) {
    let bits = value.to_bits();
    ((bits >> 16) as u16, (bits & 0xFFFF) as u16)
}

/// Decode two big-endian register words back into a float.
pub fn registers_to_float(high: u16, low: u16) -> f32 {
    f32::from_bits(((high as u32) << 16) | low as u32)
}

/// All published quantities of one reading, keyed by start address.
pub fn register_values(reading: &MeterReading) -> Vec<(u16, f32)> {
    let r = &reading.readings;
    vec![
        (REG_ACTIVE_POWER_L1, r.active_power_l1_w as f32),
        (REG_ACTIVE_POWER_L2, r.active_power_l2_w as f32),
        (REG_ACTIVE_POWER_L3, r.active_power_l3_w as f32),
        (REG_ACTIVE_POWER_TOTAL, r.total_active_power_w() as f32),
        (REG_VOLTAGE_L1, r.voltage_l1_v as f32),
        (REG_VOLTAGE_L2, r.voltage_l2_v as f32),
        (REG_VOLTAGE_L3, r.voltage_l3_v as f32),
        (REG_CURRENT_L1, r.current_l1_a as f32),
        (REG_CURRENT_L2, r.current_l2_a as f32),
        (REG_CURRENT_L3, r.current_l3_a as f32),
        (REG_POWER_FACTOR, r.power_factor as f32),
        (REG_TOTAL_ENERGY, r.total_energy_kwh as f32),
        (REG_FREQUENCY, r.frequency_hz as f32),
    ]
}

/// Word-level register window for one reading, keyed by the address a
/// client puts on the wire. Gaps between published pairs stay absent and
/// read as zero.
pub fn build_register_window(reading: &MeterReading) -> HashMap<u16, u16> {
    let mut window = HashMap::new();
    for (address, value) in register_values(reading) {
        let (high, low) = float_to_registers(value);
        window.insert(address, high);
        window.insert(address + 1, low);
    }
    window
}

/// Whether a read request lies inside the served address space
/// (`[0, MAX + guard]`). Reads outside the published pairs still succeed
/// with zeros.
pub fn is_valid_read(address: u16, count: u16) -> bool {
    let Some(end) = address.checked_add(count) else {
        return false;
    };
    count > 0 && end - 1 <= MAX_REGISTER_ADDRESS + ADDRESS_GUARD
}

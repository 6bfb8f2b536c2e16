//! Travel modes and mode sets.
//!
//! Modes form a small hierarchy: `car` is a `motor_vehicle`, which is a
//! `vehicle`. A filter naming a parent mode applies to every descendant, so a
//! rule with `modes: ["motor_vehicle"]` matches a `car` query and a rule with
//! `notModes: ["vehicle"]` excludes `bicycle`.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TravelMode {
    Vehicle,
    MotorVehicle,
    Car,
    Truck,
    Motorcycle,
    Bus,
    Hgv,
    Hov,
    Emergency,
    Bicycle,
    Foot,
}

bitflags::bitflags! {
    /// A set of [`TravelMode`]s; bit `n` is the mode with discriminant `n`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ModeSet: u16 {
        const VEHICLE       = 1 << 0;
        const MOTOR_VEHICLE = 1 << 1;
        const CAR           = 1 << 2;
        const TRUCK         = 1 << 3;
        const MOTORCYCLE    = 1 << 4;
        const BUS           = 1 << 5;
        const HGV           = 1 << 6;
        const HOV           = 1 << 7;
        const EMERGENCY     = 1 << 8;
        const BICYCLE       = 1 << 9;
        const FOOT          = 1 << 10;
    }
}

impl TravelMode {
    /// The single-mode set for this mode.
    pub const fn bit(self) -> ModeSet {
        ModeSet::from_bits_retain(1 << self as u16)
    }

    /// Immediate parent in the mode hierarchy.
    pub const fn parent(self) -> Option<TravelMode> {
        match self {
            TravelMode::Vehicle | TravelMode::Foot => None,
            TravelMode::MotorVehicle | TravelMode::Bicycle => Some(TravelMode::Vehicle),
            TravelMode::Car
            | TravelMode::Truck
            | TravelMode::Motorcycle
            | TravelMode::Bus
            | TravelMode::Hgv
            | TravelMode::Hov
            | TravelMode::Emergency => Some(TravelMode::MotorVehicle),
        }
    }

    /// This mode together with all of its ancestors.
    pub fn lineage(self) -> ModeSet {
        let mut set = self.bit();
        let mut cursor = self.parent();
        while let Some(mode) = cursor {
            set |= mode.bit();
            cursor = mode.parent();
        }
        set
    }
}

impl ModeSet {
    /// Modes contained in this set, in declaration order.
    pub fn modes(self) -> impl Iterator<Item = TravelMode> {
        TravelMode::iter().filter(move |mode| self.contains(mode.bit()))
    }

    /// True when `mode`, or one of its ancestors, is in the set.
    pub fn admits(self, mode: TravelMode) -> bool {
        self.intersects(mode.lineage())
    }
}

impl FromIterator<TravelMode> for ModeSet {
    fn from_iter<I: IntoIterator<Item = TravelMode>>(iter: I) -> Self {
        iter.into_iter().fold(ModeSet::empty(), |set, mode| set | mode.bit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn mode_names_round_trip_through_strum() {
        assert_eq!(TravelMode::from_str("motor_vehicle").unwrap(), TravelMode::MotorVehicle);
        assert_eq!(TravelMode::Hgv.as_ref(), "hgv");
        assert!(TravelMode::from_str("hovercraft").is_err());
    }

    #[test]
    fn every_mode_has_its_own_bit() {
        let all: ModeSet = TravelMode::iter().collect();
        assert_eq!(all, ModeSet::all());
        assert_eq!(all.modes().count(), TravelMode::iter().count());
    }

    #[test]
    fn lineage_walks_up_the_hierarchy() {
        assert_eq!(TravelMode::Car.lineage(), ModeSet::CAR | ModeSet::MOTOR_VEHICLE | ModeSet::VEHICLE);
        assert_eq!(TravelMode::Foot.lineage(), ModeSet::FOOT);
        assert!(ModeSet::MOTOR_VEHICLE.admits(TravelMode::Truck));
        assert!(!ModeSet::MOTOR_VEHICLE.admits(TravelMode::Bicycle));
        assert!(!ModeSet::TRUCK.admits(TravelMode::MotorVehicle));
    }
}

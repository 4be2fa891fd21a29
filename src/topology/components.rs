//! Component instances of the reference deployment.
//!
//! The enumeration is closed: every instance the topology builds has exactly
//! one variant, and its text form is the instance name used in topology files
//! and log output.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString};

/// Identity of a component instance.
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
    EnumCount,
    EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ComponentId {
    // Supervised by the health component
    #[strum(serialize = "rateGroup10HzComp")]
    RateGroup10HzComp,
    #[strum(serialize = "rateGroup1HzComp")]
    RateGroup1HzComp,
    CmdDisp,
    CmdSeq,
    ChanTlm,
    EventLogger,
    PrmDb,
    FileDownlink,
    FileUplink,

    // Not ping-supervised
    BlockDrv,
    RateGroupDriverComp,
    Health,
    Comm,
    Downlink,
    Uplink,
    FileUplinkBufferManager,
    LinuxTime,
    TextLogger,
    FatalHandler,
    RpiDemo,
}

impl ComponentId {
    /// Instances the health component pings.
    pub const SUPERVISED: [ComponentId; 9] = [
        ComponentId::RateGroup10HzComp,
        ComponentId::RateGroup1HzComp,
        ComponentId::CmdDisp,
        ComponentId::CmdSeq,
        ComponentId::ChanTlm,
        ComponentId::EventLogger,
        ComponentId::PrmDb,
        ComponentId::FileDownlink,
        ComponentId::FileUplink,
    ];

    /// Position of this instance in fixed-size per-component tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns true if the health component pings this instance.
    pub const fn is_supervised(self) -> bool {
        let mut i = 0;
        while i < Self::SUPERVISED.len() {
            if Self::SUPERVISED[i] as usize == self as usize {
                return true;
            }
            i += 1;
        }
        false
    }
}

//! Mapping from measured throughput to a codec preference order

use pjsip_config::{CodecList, Result};
use probe_core::BandwidthSample;
use serde::Serialize;
use std::fmt;

/// Above this many Mbit/s the link is treated as high bandwidth (exclusive)
pub const HIGH_BANDWIDTH_MBPS: f64 = 0.064;
/// Above this many Mbit/s the link is treated as medium bandwidth (exclusive)
pub const MEDIUM_BANDWIDTH_MBPS: f64 = 0.008;

/// One of three fixed codec preference orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecPolicy {
    /// Uncompressed G.711 first
    HighBandwidth,
    /// Compressed codecs first
    MediumBandwidth,
    /// Lowest bitrate codecs first
    LowBandwidth,
}

impl CodecPolicy {
    /// Policy for a throughput in Mbit/s
    pub fn for_mbps(mbps: f64) -> Self {
        if mbps > HIGH_BANDWIDTH_MBPS {
            CodecPolicy::HighBandwidth
        } else if mbps > MEDIUM_BANDWIDTH_MBPS {
            CodecPolicy::MediumBandwidth
        } else {
            CodecPolicy::LowBandwidth
        }
    }

    pub fn codec_names(&self) -> &'static [&'static str] {
        match self {
            CodecPolicy::HighBandwidth => &["ulaw", "alaw", "opus", "g729", "gsm"],
            CodecPolicy::MediumBandwidth => &["g729", "opus", "ulaw", "alaw", "gsm"],
            CodecPolicy::LowBandwidth => &["opus", "gsm", "ulaw", "alaw", "g729"],
        }
    }

    /// The preference order as a validated codec list
    pub fn codecs(&self) -> Result<CodecList> {
        CodecList::new(self.codec_names().iter().copied())
    }
}

impl fmt::Display for CodecPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodecPolicy::HighBandwidth => "high-bandwidth",
            CodecPolicy::MediumBandwidth => "medium-bandwidth",
            CodecPolicy::LowBandwidth => "low-bandwidth",
        };
        write!(f, "{}", name)
    }
}

/// Policy for a probe result; `None` for a failed (or nonsensical) measurement
pub fn select_policy(sample: &BandwidthSample) -> Option<CodecPolicy> {
    sample
        .mbps
        .filter(|mbps| mbps.is_finite())
        .map(CodecPolicy::for_mbps)
}

//! Transport protocols and backbone overhead factors

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Transport protocols a node or link can carry
#[derive(Debug, Clone, Copy, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportProtocol {
    #[display("lora")]
    Lora,
    #[display("wifi")]
    Wifi,
    #[display("cellular")]
    Cellular,
    #[display("fiber")]
    Fiber,
    #[display("microwave")]
    Microwave,
    #[display("satellite")]
    Satellite,
}

impl TransportProtocol {
    /// Latency overhead factor relative to the fiber baseline when this
    /// protocol carries wide-area backbone traffic
    ///
    /// Short-range protocols (lora, wifi) do not form a continental
    /// backbone and return `None`.
    pub fn backbone_overhead(&self) -> Option<f64> {
        match self {
            Self::Fiber => Some(1.0),
            Self::Microwave => Some(1.2),
            Self::Cellular => Some(1.5),
            Self::Satellite => Some(3.0),
            Self::Lora | Self::Wifi => None,
        }
    }

    /// True when the protocol can serve as a wide-area backbone
    pub fn is_backbone(&self) -> bool {
        self.backbone_overhead().is_some()
    }
}

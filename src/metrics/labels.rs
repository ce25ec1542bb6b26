//! Label types for Prometheus metrics

use prometheus_client::encoding::EncodeLabelSet;

/// Identifies one polled API path, e.g. `connection/`
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct EndpointLabels {
    pub endpoint: String,
}

impl EndpointLabels {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

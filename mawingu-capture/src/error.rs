use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture device '{0}' not found")]
    DeviceNotFound(String),

    #[error("failed to open capture on '{interface}': {source}")]
    Open {
        interface: String,
        #[source]
        source: pcap::Error,
    },

    #[error("failed to enumerate capture devices: {0}")]
    Enumerate(#[source] pcap::Error),

    #[error("capture read failed: {0}")]
    Read(#[source] pcap::Error),
}

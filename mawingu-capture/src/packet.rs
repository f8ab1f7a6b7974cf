/// One captured link-layer frame.
use bytes::Bytes;
use mawingu_protocols::LinkType;

#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Bytes,
    pub link_type: LinkType,
    /// Length of the frame on the wire; may exceed `data.len()` when the
    /// capture snap length truncated it.
    pub wire_len: usize,
}

impl Frame {
    /// Creates an untruncated frame from raw data.
    pub fn new(link_type: LinkType, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Frame {
            wire_len: data.len(),
            data,
            link_type,
        }
    }

    /// Creates an Ethernet frame from raw data.
    pub fn ethernet(data: impl Into<Bytes>) -> Self {
        Self::new(LinkType::Ethernet, data)
    }

    /// Byte length counted toward traffic totals.
    pub fn len(&self) -> usize {
        self.wire_len.max(self.data.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

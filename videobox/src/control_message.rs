//! Wire vocabulary of the control channel.
//!
//! Each message is a bare kind with no payload, carried as its single
//! byte code. The set is closed; codes outside it decode to `None` and
//! the caller drops them, since the transport may replay stale or
//! foreign payloads within the TTL window.

/// A control-channel message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ControlMessage {
    /// Controller to source: the connection is established.
    Peered = 0x01,
    /// Source to controller: present the remote-control view.
    RequestViewerMode = 0x02,
    /// Controller to source: the remote view is up, camera may run.
    RequestCameraMode = 0x03,
    StartRecording = 0x04,
    StopRecording = 0x05,
}

impl ControlMessage {
    /// Serializes the message to its wire payload.
    pub fn encode(self) -> Vec<u8> {
        vec![self as u8]
    }

    /// Parses a wire payload. `None` for unknown codes or malformed
    /// payloads; such messages are ignored, never an error.
    pub fn decode(payload: &[u8]) -> Option<Self> {
        match payload {
            [0x01] => Some(ControlMessage::Peered),
            [0x02] => Some(ControlMessage::RequestViewerMode),
            [0x03] => Some(ControlMessage::RequestCameraMode),
            [0x04] => Some(ControlMessage::StartRecording),
            [0x05] => Some(ControlMessage::StopRecording),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ControlMessage; 5] = [
        ControlMessage::Peered,
        ControlMessage::RequestViewerMode,
        ControlMessage::RequestCameraMode,
        ControlMessage::StartRecording,
        ControlMessage::StopRecording,
    ];

    #[test]
    fn test_every_kind_round_trips() {
        for kind in ALL {
            assert_eq!(ControlMessage::decode(&kind.encode()), Some(kind));
        }
    }

    #[test]
    fn test_unknown_code_is_ignored() {
        assert_eq!(ControlMessage::decode(&[0x00]), None);
        assert_eq!(ControlMessage::decode(&[0x06]), None);
        assert_eq!(ControlMessage::decode(&[0xff]), None);
    }

    #[test]
    fn test_malformed_payload_is_ignored() {
        assert_eq!(ControlMessage::decode(&[]), None);
        assert_eq!(ControlMessage::decode(&[0x01, 0x02]), None);
    }
}

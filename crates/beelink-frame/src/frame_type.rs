//! API frame identifiers.
//!
//! Only [`AtCommandResponse`](FrameType::AtCommandResponse),
//! [`ReceivePacket`](FrameType::ReceivePacket) and
//! [`ExplicitRxIndicator`](FrameType::ExplicitRxIndicator) are dispatched to
//! the frame callback; the rest are named for logging and for callers that
//! inspect raw frames.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    AtCommand = 0x08,
    AtCommandQueue = 0x09,
    TransmitRequest = 0x10,
    ExplicitAddressingCommand = 0x11,
    RemoteAtCommand = 0x17,
    AtCommandResponse = 0x88,
    ModemStatus = 0x8A,
    TransmitStatus = 0x8B,
    RouteInformation = 0x8D,
    AggregateAddressingUpdate = 0x8E,
    ReceivePacket = 0x90,
    ExplicitRxIndicator = 0x91,
    IoDataSampleRx = 0x92,
    NodeIdentificationIndicator = 0x95,
    RemoteAtCommandResponse = 0x97,
}

impl FrameType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0x08 => Self::AtCommand,
            0x09 => Self::AtCommandQueue,
            0x10 => Self::TransmitRequest,
            0x11 => Self::ExplicitAddressingCommand,
            0x17 => Self::RemoteAtCommand,
            0x88 => Self::AtCommandResponse,
            0x8A => Self::ModemStatus,
            0x8B => Self::TransmitStatus,
            0x8D => Self::RouteInformation,
            0x8E => Self::AggregateAddressingUpdate,
            0x90 => Self::ReceivePacket,
            0x91 => Self::ExplicitRxIndicator,
            0x92 => Self::IoDataSampleRx,
            0x95 => Self::NodeIdentificationIndicator,
            0x97 => Self::RemoteAtCommandResponse,
            _ => return None,
        })
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Human-readable name for logs and CLI output.
    pub fn name(self) -> &'static str {
        match self {
            Self::AtCommand => "AT_COMMAND",
            Self::AtCommandQueue => "AT_COMMAND_QUEUE",
            Self::TransmitRequest => "TRANSMIT_REQUEST",
            Self::ExplicitAddressingCommand => "EXPLICIT_ADDRESSING_COMMAND",
            Self::RemoteAtCommand => "REMOTE_AT_COMMAND",
            Self::AtCommandResponse => "AT_COMMAND_RESPONSE",
            Self::ModemStatus => "MODEM_STATUS",
            Self::TransmitStatus => "TRANSMIT_STATUS",
            Self::RouteInformation => "ROUTE_INFORMATION",
            Self::AggregateAddressingUpdate => "AGGREGATE_ADDRESSING_UPDATE",
            Self::ReceivePacket => "RECEIVE_PACKET",
            Self::ExplicitRxIndicator => "EXPLICIT_RX_INDICATOR",
            Self::IoDataSampleRx => "IO_DATA_SAMPLE_RX",
            Self::NodeIdentificationIndicator => "NODE_IDENTIFICATION_INDICATOR",
            Self::RemoteAtCommandResponse => "REMOTE_AT_COMMAND_RESPONSE",
        }
    }

    /// Returns true for the frame types the dispatcher delivers.
    pub fn is_dispatched(self) -> bool {
        matches!(
            self,
            Self::AtCommandResponse | Self::ReceivePacket | Self::ExplicitRxIndicator
        )
    }
}

/// Name for a raw frame type byte, `"UNKNOWN"` outside the table.
pub fn frame_type_name(byte: u8) -> &'static str {
    FrameType::from_byte(byte).map_or("UNKNOWN", FrameType::name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_roundtrip_for_known_types() {
        for byte in 0..=u8::MAX {
            if let Some(ty) = FrameType::from_byte(byte) {
                assert_eq!(ty.as_byte(), byte);
            }
        }
    }

    #[test]
    fn unknown_byte_has_no_type() {
        assert_eq!(FrameType::from_byte(0x00), None);
        assert_eq!(FrameType::from_byte(0xFF), None);
        assert_eq!(frame_type_name(0x42), "UNKNOWN");
    }

    #[test]
    fn only_three_types_are_dispatched() {
        let dispatched: Vec<u8> = (0..=u8::MAX)
            .filter_map(FrameType::from_byte)
            .filter(|ty| ty.is_dispatched())
            .map(FrameType::as_byte)
            .collect();
        assert_eq!(dispatched, vec![0x88, 0x90, 0x91]);
    }
}

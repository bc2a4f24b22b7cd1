//! Wire protocol for the Mirage video transport.
//!
//! Two independent wire formats share this crate:
//!
//! - [`FrameHeader`] + [`crc`]: the fixed-size UDP frame header and the
//!   payload checksum it carries, used by the video data channel.
//! - [`control`] + [`payloads`]: the length-prefixed TCP control envelope and
//!   its CBOR-encoded, opcode-tagged payload catalogue.
//!
//! [`probe_packet`] defines a third, smaller UDP header used only by the
//! quality-probe bandwidth search; [`registration`] defines the one-shot UDP
//! packet that associates a client's data-channel peer address with its
//! control-channel session.
//!
//! # Components
//!
//! - [`FrameHeader`]: 72-byte zero-copy video-packet header (§3/§4.1)
//! - [`flags::FrameFlags`]: the header's wire-representable flag bitset
//! - [`crc::crc32`]: payload checksum (§4.1)
//! - [`control::Envelope`]: TCP control-channel framing (§4.2)
//! - [`opcode::Opcode`]: control-channel message type table (§4.2)
//! - [`payloads::Payload`]: CBOR payload catalogue (§4.2/§6)
//! - [`probe_packet::ProbeHeader`]: quality-probe UDP packet header (§4.8)
//! - [`registration::RegistrationPacket`]: UDP registration packet (§4.7/§6)
//! - [`ids`]: `StreamId`/`WindowId` newtypes (§3)

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod control;
pub mod crc;
pub mod errors;
pub mod flags;
pub mod header;
pub mod ids;
pub mod opcode;
pub mod payloads;
pub mod probe_packet;
pub mod registration;

pub use control::Envelope;
pub use errors::{ProtocolError, Result};
pub use flags::FrameFlags;
pub use header::{ContentRect, FrameHeader, TileInfo};
pub use ids::{StreamId, WindowId};
pub use opcode::Opcode;
pub use payloads::{ErrorPayload, Payload};
pub use probe_packet::{probe_payload_size, ProbeHeader};
pub use registration::RegistrationPacket;

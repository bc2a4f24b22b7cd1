//! Fuzz target for `RegistrationPacket::parse` (the 20-byte UDP
//! stream-registration packet, §4.7/§6). No length field to desync; the
//! only failure mode worth ruling out is a panic on short or malformed
//! input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mirage_proto::registration::RegistrationPacket;

fuzz_target!(|data: &[u8]| {
    if let Ok(packet) = RegistrationPacket::parse(data) {
        let reencoded = packet.to_bytes();
        assert_eq!(reencoded.len(), RegistrationPacket::SIZE);
        assert_eq!(&packet.device_id[..], &reencoded[4..20]);
    }
});

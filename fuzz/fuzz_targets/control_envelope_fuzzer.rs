//! Fuzz target for `Envelope::decode`, the length-prefixed TCP control
//! framer (§4.2). Must never desync: every complete `type || len || payload`
//! frame in the buffer is extracted in order, and a short tail never causes
//! bytes to be consumed without a corresponding envelope.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use mirage_proto::control::{Envelope, PREFIX_LEN};

fuzz_target!(|data: &[u8]| {
    let mut buf = Bytes::copy_from_slice(data);
    let mut consumed = 0usize;

    loop {
        let before_len = buf.len();
        match Envelope::decode(&mut buf) {
            Some(envelope) => {
                consumed += PREFIX_LEN + envelope.payload.len();
                assert!(buf.len() < before_len);
                // Opcode lookup must never panic, known or not.
                let _ = envelope.opcode();
            }
            None => {
                // No progress without a complete frame.
                assert_eq!(buf.len(), before_len);
                break;
            }
        }
    }

    assert!(consumed <= data.len());
});

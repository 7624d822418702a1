#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary datagrams must decode or fail cleanly; whatever decodes must
    // survive a re-encode.
    let Ok(messages) = oscnorm_transport::decode_packet(data) else {
        return;
    };
    for msg in &messages {
        let _ = msg.int_arg(0);
        if let Ok(bytes) = oscnorm_transport::encode_message(msg) {
            let again = oscnorm_transport::decode_message(&bytes);
            assert!(again.is_ok(), "re-encoded message failed to decode: {msg:?}");
        }
    }
});

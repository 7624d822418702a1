use oscnorm_traits::{OscArg, OscMessage};
use oscnorm_transport::error::TransportError;
use oscnorm_transport::{decode_message, decode_packet, encode_bundle, encode_message};
use rstest::rstest;

#[test]
fn mixed_arguments_decode_with_types() {
    let msg = OscMessage::new(
        "/mixer/ch/1",
        vec![
            OscArg::Int(-7),
            OscArg::Float(0.25),
            OscArg::Str("fader".into()),
            OscArg::Int(i32::MAX),
        ],
    );
    let bytes = encode_message(&msg).unwrap();
    assert_eq!(bytes.len() % 4, 0);
    assert_eq!(decode_message(&bytes).unwrap(), msg);
}

#[test]
fn float_argument_feeds_int_view() {
    let bytes = encode_message(&OscMessage::new("/f", vec![OscArg::Float(2047.6)])).unwrap();
    let m = decode_message(&bytes).unwrap();
    assert_eq!(m.int_arg(0), Some(2048));
}

#[rstest]
#[case::empty(b"".to_vec())]
#[case::no_leading_slash(b"vol\0,i\0\0\0\0\0\x01".to_vec())]
#[case::unterminated_address(b"/vol".to_vec())]
#[case::tags_without_comma(b"/vol\0\0\0\0i\0\0\0\0\0\0\x01".to_vec())]
#[case::unsupported_tag(b"/vol\0\0\0\0,b\0\0\0\0\0\x01".to_vec())]
#[case::truncated_int(b"/vol\0\0\0\0,i\0\0\0\0".to_vec())]
#[case::trailing_garbage(b"/vol\0\0\0\0,i\0\0\0\0\0\x01\xff".to_vec())]
fn malformed_packets_are_decode_errors(#[case] packet: Vec<u8>) {
    match decode_packet(&packet) {
        Err(TransportError::Decode(_)) => {}
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[rstest]
#[case::negative_size(-4)]
#[case::unaligned_size(5)]
#[case::oversized(64)]
fn bad_bundle_element_sizes(#[case] size: i32) {
    let mut pkt = b"#bundle\0".to_vec();
    pkt.extend_from_slice(&1u64.to_be_bytes());
    pkt.extend_from_slice(&size.to_be_bytes());
    pkt.extend_from_slice(&encode_message(&OscMessage::with_int("/x", 1)).unwrap());
    assert!(matches!(decode_packet(&pkt), Err(TransportError::Decode(_))));
}

#[test]
fn empty_bundle_yields_no_messages() {
    let pkt = encode_bundle(&[]).unwrap();
    assert!(decode_packet(&pkt).unwrap().is_empty());
    assert!(decode_message(&pkt).is_err());
}

#[rstest]
#[case::relative_address("vol")]
#[case::nul_in_address("/v\0l")]
fn unencodable_messages(#[case] address: &str) {
    let err = encode_message(&OscMessage::with_int(address, 1)).unwrap_err();
    assert!(matches!(err, TransportError::Encode(_)));
}

#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;

use docdrive_core::protocol::WireCodec;
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    let mut codec = WireCodec::new();
    let mut buf = BytesMut::from(data);

    loop {
        match codec.decode(&mut buf) {
            Ok(Some(reply)) => {
                let _ = reply.response_to();
                let _ = reply.cursor_id();
                let _ = reply.is_query_failure();
                let _ = reply.is_cursor_not_found();
                let _ = reply.first_document();
            }
            Ok(None) => break,
            Err(_) => break,
        }
    }
});

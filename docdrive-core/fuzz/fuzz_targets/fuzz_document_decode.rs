#![no_main]

use libfuzzer_sys::fuzz_target;

use docdrive_core::bson::{decode_element, BsonInput, Document};

fuzz_target!(|data: &[u8]| {
    if let Ok(document) = Document::from_bytes(data) {
        let bytes = document.to_bytes().expect("decoded document re-encodes");
        let again = Document::from_bytes(&bytes).expect("re-encoded document decodes");
        assert_eq!(again.len(), document.len());
    }

    let mut input = BsonInput::new(data);
    while input.remaining() > 0 {
        if decode_element(&mut input).is_err() {
            break;
        }
    }
});

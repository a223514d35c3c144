#![no_main]
use libfuzzer_sys::fuzz_target;
use sessionfile::Message;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    if let Ok(message) = Message::from_value(value) {
        // Anything accepted must survive its own mapping form.
        let rebuilt = Message::from_value(message.to_value()).expect("mapping form must reload");
        assert_eq!(rebuilt, message);
    }
});

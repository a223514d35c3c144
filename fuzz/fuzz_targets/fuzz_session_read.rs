#![no_main]
use libfuzzer_sys::fuzz_target;
use sessionfile::sessions::{read_from_file, write_to_file};

fuzz_target!(|data: &[u8]| {
    let Ok(dir) = tempfile::tempdir() else {
        return;
    };
    let path = dir.path().join("fuzz.jsonl");
    if std::fs::write(&path, data).is_err() {
        return;
    }
    if let Ok(messages) = read_from_file(&path) {
        write_to_file(&path, &messages).expect("rewrite must succeed");
        let reread = read_from_file(&path).expect("rewritten session must reload");
        assert_eq!(reread, messages);
    }
});

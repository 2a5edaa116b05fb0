#![no_main]

use libfuzzer_sys::fuzz_target;
use xrpl_paychan_submitter::transaction::pending_index::{append_id, contains_id, remove_id};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Some((index, id)) = text.split_once('\n') else {
        return;
    };
    if id.is_empty() || id.contains(':') {
        return;
    }

    let appended = append_id(index, id);
    assert!(contains_id(&appended, id));

    let removed = remove_id(&appended, id);
    assert!(!contains_id(&removed, id));
    assert!(!removed.starts_with(':'));
    assert!(!removed.ends_with(':'));
    assert!(!removed.contains("::"));
});

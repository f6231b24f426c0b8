#![no_main]

use libfuzzer_sys::fuzz_target;
use todo_sync_extractor::{collect_comment_blocks, comment_syntax_for, parse_todo_block};

fuzz_target!(|data: &[u8]| {
    let source = String::from_utf8_lossy(data);
    let line_count = source.lines().count();
    for file in ["fuzz.rs", "fuzz.py", "fuzz.sql"] {
        let syntax = comment_syntax_for(file).expect("known extension");
        for block in collect_comment_blocks(&source, syntax) {
            for todo in parse_todo_block(&block) {
                assert!(!todo.title.trim().is_empty());
                assert!(todo.line >= 1 && todo.line <= line_count);
                assert!(todo.estimate_hours >= 0.0);
            }
        }
    }
});

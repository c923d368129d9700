#![no_main]

use fwscope_log_stream::FirewallLogParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(parser) = FirewallLogParser::new() else {
        return;
    };

    // 크래시나 패닉 없이 Ok 또는 Err을 반환해야 한다
    if let Ok(line) = std::str::from_utf8(data) {
        let _ = parser.parse(line);
    }
});

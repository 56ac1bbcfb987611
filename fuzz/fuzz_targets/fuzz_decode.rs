#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Must never panic, whatever the input. No limits: declared dimensions
    // the strips cannot fill are rejected before the output is allocated.
    let _ = zentiff::decode(data, enough::Unstoppable);
    let _ = zentiff::DecodeRequest::new(data)
        .with_sample_offsets(zentiff::SampleOffsets::Compatible)
        .decode(enough::Unstoppable);
    let _ = zentiff::ImageInfo::from_bytes(data);
});

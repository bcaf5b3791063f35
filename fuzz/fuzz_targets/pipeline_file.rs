#![no_main]

use libfuzzer_sys::fuzz_target;
use sluice_pipeline::PipelineLoader;
use sluice_pipeline::loader::PipelineFormat;

fuzz_target!(|data: &[u8]| {
    // 파이프라인 파서는 &str을 받으므로 UTF-8 변환 필요
    if let Ok(content) = std::str::from_utf8(data) {
        let loader = PipelineLoader::default();
        let _ = loader.parse(content, PipelineFormat::Yaml, "fuzz-input.yaml");
        let _ = loader.parse(content, PipelineFormat::Json, "fuzz-input.json");
    }
});

#![allow(dead_code)]

use serde_json::{json, Value};
use std::path::Path;
use theta_etl::core::ConfigProvider;
use theta_etl::{EtlEngine, LocalStorage, TerminalPipeline};

pub struct TestConfig {
    pub base_url: String,
    pub output_path: String,
}

impl ConfigProvider for TestConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn timeout_secs(&self) -> u64 {
        5
    }
}

pub type TestEngine = EtlEngine<TerminalPipeline<LocalStorage, TestConfig>>;

pub fn engine(base_url: String, output_dir: &Path) -> TestEngine {
    let config = TestConfig {
        base_url,
        output_path: output_dir.display().to_string(),
    };
    let pipeline = TerminalPipeline::new(LocalStorage::new(output_dir), config).unwrap();
    EtlEngine::new(pipeline)
}

/// A successful terminal response.
pub fn body(format: &[&str], rows: Value) -> Value {
    json!({
        "header": { "format": format, "error_type": "null", "error_msg": "null" },
        "response": rows
    })
}

pub fn read_lines(path: &str) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

use std::fs;
use std::path::PathBuf;

use serde_json::{json, Value};
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Config file with a stored session against `cloud_url`
#[allow(dead_code)]
pub fn logged_in_config(cloud_url: &str) -> (TempDir, PathBuf) {
    temp_config_file(&format!(
        "cloud_url: {}\ntoken: test-token\nusername: tester\nexpires_at: 4102444800\n",
        cloud_url
    ))
}

/// Server JSON as the cloud returns it
#[allow(dead_code)]
pub fn server_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "agent_key": format!("key-{}", id),
        "status": "online",
        "ip_address": "10.0.0.5",
        "created_at": "2024-05-01T10:00:00Z",
        "last_seen_at": "2024-05-01T10:05:00Z",
        "metrics": {
            "cpu_usage": 12.5,
            "memory_total": 8589934592_i64,
            "memory_used": 4294967296_i64
        }
    })
}

/// Web instance JSON as the cloud returns it
#[allow(dead_code)]
pub fn web_instance_json(id: &str, name: &str, status: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "host": "dash.example.test",
        "port": 3001,
        "url": "http://dash.example.test:3001",
        "status": status,
        "version": "1.2.0",
        "cloud_mode": true,
        "ssl_enabled": false,
        "created_at": "2024-05-01T10:00:00Z"
    })
}

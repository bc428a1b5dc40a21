use anyhow::Result;
use loqa_interviews::Config;
use std::io::Write;
use tempfile::Builder;

const MINIMAL: &str = r#"
[service]
name = "loqa-interviews-test"

[service.http]
bind = "127.0.0.1"
port = 8088

[voice]
api_url = "https://voice.example"
api_key = "vk"
agent_id = "agent-1"
nats_url = "nats://localhost:4222"

[ai]
base_url = "https://llm.example/v1"
api_key = "ak"
model = "test-model"

[session]
debounce_ms = 1500
"#;

#[test]
fn test_load_fills_defaults() -> Result<()> {
    let mut file = Builder::new().suffix(".toml").tempfile()?;
    file.write_all(MINIMAL.as_bytes())?;

    let path = file.path().to_str().expect("utf-8 temp path");
    let cfg = Config::load(path)?;

    assert_eq!(cfg.service.name, "loqa-interviews-test");
    assert_eq!(cfg.service.http.port, 8088);
    assert_eq!(cfg.voice.agent_id, "agent-1");
    assert_eq!(cfg.ai.timeout_secs, 30);

    // Partial [session] keeps the remaining defaults
    assert_eq!(cfg.session.debounce_ms, 1500);
    assert_eq!(cfg.session.min_code_chars, 20);
    assert_eq!(cfg.session.transcript_flush_secs, 10);

    assert!(cfg.auth.tokens.is_empty());
    assert!(cfg.registry.snapshot_path.is_none());

    Ok(())
}

#[test]
fn test_missing_section_is_an_error() -> Result<()> {
    let mut file = Builder::new().suffix(".toml").tempfile()?;
    file.write_all(b"[service]\nname = \"x\"\n")?;

    let path = file.path().to_str().expect("utf-8 temp path");
    assert!(Config::load(path).is_err());

    Ok(())
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(Config::load("/nonexistent/loqa-interviews.toml").is_err());
}

#[test]
fn test_zero_flush_interval_is_rejected() -> Result<()> {
    let mut file = Builder::new().suffix(".toml").tempfile()?;
    file.write_all(MINIMAL.replace("debounce_ms = 1500", "transcript_flush_secs = 0").as_bytes())?;

    let path = file.path().to_str().expect("utf-8 temp path");
    let err = Config::load(path).unwrap_err();
    assert!(err.to_string().contains("transcript_flush_secs"));

    Ok(())
}

#[test]
fn test_zero_event_buffer_is_rejected() {
    let session = loqa_interviews::SessionConfig {
        event_buffer: 0,
        ..Default::default()
    };
    assert!(session.validate().is_err());
    assert!(loqa_interviews::SessionConfig::default().validate().is_ok());
}

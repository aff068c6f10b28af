use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

/// How response bodies are written to the message log.
pub enum MessageLogMode {
    /// Every response body in full.
    Full,
    /// First body per endpoint in full, then only the changed paths.
    Diffed,
}

pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    previous: HashMap<String, Value>,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            mode,
            file,
            previous: HashMap::new(),
        })
    }

    pub fn log_request(&mut self, method: &str, query: &str, body: Option<&Value>) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "method": method,
            "query": query,
            "body": body,
        });
        self.write_line(&entry);
    }

    pub fn log_command(&mut self, action: &str, heating_loop: Option<i64>, body: &Value) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "cmd",
            "action": action,
            "loop": heating_loop,
            "body": body,
        });
        self.write_line(&entry);
    }

    pub fn log_response(&mut self, query: &str, status: u16, body: &Value) {
        let entry = match self.mode {
            MessageLogMode::Full => json!({
                "ts": Utc::now().to_rfc3339(),
                "dir": "resp",
                "query": query,
                "status": status,
                "body": body,
            }),
            MessageLogMode::Diffed => match self.previous.get(query) {
                None => json!({
                    "ts": Utc::now().to_rfc3339(),
                    "dir": "resp",
                    "query": query,
                    "status": status,
                    "full": true,
                    "body": body,
                }),
                Some(prev) => {
                    let mut changes = Vec::new();
                    diff_json(prev, body, "", &mut changes);
                    let changes: Vec<Value> = changes
                        .into_iter()
                        .map(|(path, old, new)| json!({ "path": path, "old": old, "new": new }))
                        .collect();
                    json!({
                        "ts": Utc::now().to_rfc3339(),
                        "dir": "resp",
                        "query": query,
                        "status": status,
                        "changes": changes,
                    })
                }
            },
        };
        self.write_line(&entry);
        if let MessageLogMode::Diffed = self.mode {
            self.previous.insert(query.to_string(), body.clone());
        }
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write log entry: {e}");
        }
    }
}

/// Collect `(path, old, new)` for every leaf that differs. Arrays are compared whole.
fn diff_json(previous: &Value, current: &Value, prefix: &str, changes: &mut Vec<(String, Value, Value)>) {
    match (previous, current) {
        (Value::Object(prev), Value::Object(curr)) => {
            for (key, curr_val) in curr {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                let prev_val = prev.get(key).unwrap_or(&Value::Null);
                diff_json(prev_val, curr_val, &path, changes);
            }
            for (key, prev_val) in prev {
                if !curr.contains_key(key) {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{prefix}.{key}")
                    };
                    changes.push((path, prev_val.clone(), Value::Null));
                }
            }
        }
        (Value::Null, Value::Object(_)) => {
            diff_json(&Value::Object(serde_json::Map::new()), current, prefix, changes);
        }
        (prev, curr) if prev != curr => {
            changes.push((prefix.to_string(), prev.clone(), curr.clone()));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::NamedTempFile;

    fn read_lines(path: &str) -> Vec<Value> {
        let mut contents = String::new();
        File::open(path).unwrap().read_to_string(&mut contents).unwrap();
        contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn log_request_writes_ndjson() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, path).unwrap();
        logger.log_request("GET", "TopPage=1&Subpage=1", None);

        let lines = read_lines(path);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["dir"], "req");
        assert_eq!(lines[0]["method"], "GET");
        assert_eq!(lines[0]["query"], "TopPage=1&Subpage=1");
        assert!(lines[0]["ts"].as_str().is_some());
    }

    #[test]
    fn diffed_mode_logs_full_first_then_changes() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Diffed, path).unwrap();

        let body1 = json!({"TemperaturesAndConfig": {"outside_temp": "4.1", "main_mode": 0}});
        logger.log_response("TopPage=1&Subpage=1", 200, &body1);
        let body2 = json!({"TemperaturesAndConfig": {"outside_temp": "3.9", "main_mode": 0}});
        logger.log_response("TopPage=1&Subpage=1", 200, &body2);

        let lines = read_lines(path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["full"], true);
        let changes = lines[1]["changes"].as_array().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0]["path"], "TemperaturesAndConfig.outside_temp");
        assert_eq!(changes[0]["old"], "4.1");
        assert_eq!(changes[0]["new"], "3.9");
    }

    #[test]
    fn diffed_mode_tracks_endpoints_separately() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Diffed, path).unwrap();

        logger.log_response("TopPage=1&Subpage=1", 200, &json!({"a": 1}));
        logger.log_response("TopPage=1&Subpage=2", 200, &json!({"a": 2}));

        let lines = read_lines(path);
        assert_eq!(lines[0]["full"], true);
        assert_eq!(lines[1]["full"], true);
    }

    #[test]
    fn diff_reports_removed_keys() {
        let mut changes = Vec::new();
        diff_json(&json!({"a": 1, "b": 2}), &json!({"a": 1}), "", &mut changes);
        assert_eq!(changes, vec![("b".to_string(), json!(2), Value::Null)]);
    }
}

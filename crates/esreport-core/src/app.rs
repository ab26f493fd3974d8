//! Runtime identification merged into every report

use serde::{Deserialize, Serialize};

use crate::report::Document;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub host: String,
    pub env: String,
    pub group: String,
    pub app_name: Option<String>,
}

impl AppInfo {
    /// Build app info for the current machine.
    pub fn new(env: impl Into<String>, group: impl Into<String>, app_name: Option<String>) -> Self {
        Self {
            host: detect_host(),
            env: env.into(),
            group: group.into(),
            app_name,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub(crate) fn write_to(&self, doc: &mut Document) {
        doc.insert("host".into(), self.host.clone().into());
        doc.insert("env".into(), self.env.clone().into());
        doc.insert("group".into(), self.group.clone().into());
        doc.insert("app_name".into(), self.app_name.clone().into());
    }
}

fn detect_host() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_to() {
        let app = AppInfo::new("production", "billing", Some("shop".into())).with_host("web-1");
        let mut doc = Document::new();
        app.write_to(&mut doc);

        assert_eq!(doc["host"], "web-1");
        assert_eq!(doc["env"], "production");
        assert_eq!(doc["group"], "billing");
        assert_eq!(doc["app_name"], "shop");
    }

    #[test]
    fn test_detects_some_host() {
        let app = AppInfo::new("local", "local", None);
        assert!(!app.host.is_empty());
    }
}

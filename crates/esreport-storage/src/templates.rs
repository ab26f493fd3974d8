//! Index templates applied to every daily partition

use esreport_core::Collection;
use serde_json::{Value, json};

fn text_keyword() -> Value {
    json!({
        "type": "text",
        "fields": {
            "keyword": {"type": "keyword"}
        }
    })
}

fn base_template(prefix: &str, collection: Collection) -> Value {
    json!({
        "index_patterns": [collection.index_template(prefix).replace("{date}", "*")],
        "order": 10,
        "version": 1,
        "settings": {
            "number_of_shards": 1
        }
    })
}

/// Template for job partitions. Only listed fields are indexed, except
/// under `context` which maps new fields as they appear.
pub fn jobs_template(prefix: &str) -> Value {
    let mut template = base_template(prefix, Collection::Jobs);

    template["mappings"] = json!({
        "dynamic": false,
        "properties": {
            "id": text_keyword(),
            "job": text_keyword(),
            "display_name": text_keyword(),
            "host": text_keyword(),
            "env": text_keyword(),
            "queue": text_keyword(),
            "connection": text_keyword(),
            "type": text_keyword(),
            "queued_at": {"type": "date"},
            "started_at": {"type": "date"},
            "finished_at": {"type": "date"},
            "duration": {"type": "float"},
            "queued_to_started": {"type": "float"},
            "queued_to_finished": {"type": "float"},
            "success": {"type": "boolean"},
            "success_rate": {"type": "byte"},
            "attempts": {"type": "integer"},
            "max_attempts": {"type": "integer"},
            "exception": {
                "type": "object",
                "properties": {
                    "class": text_keyword(),
                    "message": text_keyword(),
                    "code": text_keyword(),
                    "file": text_keyword(),
                    "line": {"type": "integer"},
                    "trace": {"type": "text"}
                }
            },
            "payload": {"enabled": false},
            "output": {"type": "text"},
            "log": {"type": "text"},
            "context": {
                "type": "object",
                "dynamic": true
            }
        }
    });

    template
}

/// Template for request partitions, mappings left to the cluster
pub fn requests_template(prefix: &str) -> Value {
    base_template(prefix, Collection::Requests)
}

pub fn template_for(collection: Collection, prefix: &str) -> Value {
    match collection {
        Collection::Jobs => jobs_template(prefix),
        Collection::Requests => requests_template(prefix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jobs_template() {
        let template = jobs_template("prd_");

        assert_eq!(template["index_patterns"], json!(["prd_reports-jobs-*"]));
        assert_eq!(template["order"], 10);
        assert_eq!(template["version"], 1);
        assert_eq!(template["settings"]["number_of_shards"], 1);
        assert_eq!(template["mappings"]["dynamic"], false);

        let props = &template["mappings"]["properties"];
        assert_eq!(props["payload"]["enabled"], false);
        assert_eq!(props["context"]["dynamic"], true);
        assert_eq!(props["success_rate"]["type"], "byte");
        assert_eq!(props["exception"]["properties"]["class"]["fields"]["keyword"]["type"], "keyword");
    }

    #[test]
    fn test_requests_template() {
        let template = template_for(Collection::Requests, "");

        assert_eq!(template["index_patterns"], json!(["reports-requests-*"]));
        assert_eq!(template["order"], 10);
        assert!(template.get("mappings").is_none());
    }
}

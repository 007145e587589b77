//! Subcommand execution

use std::time::Duration;

use anyhow::{Context, bail};
use bson::{Bson, Document};
use doclink_connection::Link;
use serde_json::{Value, json};

use crate::args::Command;

/// Run `command` over `link` and print its result to stdout
pub async fn execute(link: &Link, command: Command) -> anyhow::Result<()> {
    let output = run(link, command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(link: &Link, command: Command) -> anyhow::Result<Value> {
    match command {
        Command::Ping => {
            let latency = link.ping().await.context("ping failed")?;
            Ok(json!({ "ok": true, "latency_ms": millis(latency) }))
        }
        Command::Health { slow_ms } => {
            let result = link
                .check_health_with(Duration::from_millis(slow_ms))
                .await;
            Ok(json!({
                "status": result.status,
                "state": result.state,
                "latency_ms": result.latency.map(millis),
                "reconnected": result.reconnected,
                "error": result.error,
                "checked_at": result.checked_at,
            }))
        }
        Command::Count { target, filter } => {
            let count = link
                .collection(&target.database, &target.collection)
                .count_documents(parse_document(&filter)?)
                .await?;
            Ok(json!({ "count": count }))
        }
        Command::Find { target, filter } => {
            let documents: Vec<Document> = link
                .collection(&target.database, &target.collection)
                .find(parse_document(&filter)?)
                .await?;
            Ok(Value::Array(
                documents.into_iter().map(document_to_json).collect(),
            ))
        }
        Command::FindOne { target, filter } => {
            let document: Document = link
                .collection(&target.database, &target.collection)
                .find_one(parse_document(&filter)?)
                .await?;
            Ok(document_to_json(document))
        }
        Command::Insert { target, document } => {
            let collection = link.collection(&target.database, &target.collection);
            match parse_json(&document)? {
                Value::Array(items) => {
                    let documents = items
                        .into_iter()
                        .map(value_to_document)
                        .collect::<anyhow::Result<Vec<_>>>()?;
                    let ids = collection.insert_many(&documents).await?;
                    let ids: Vec<Value> = ids.into_iter().map(Bson::into_relaxed_extjson).collect();
                    Ok(json!({ "inserted_ids": ids }))
                }
                value => {
                    let id = collection.insert_one(&value_to_document(value)?).await?;
                    Ok(json!({ "inserted_id": id.into_relaxed_extjson() }))
                }
            }
        }
        Command::Update {
            target,
            filter,
            update,
            many,
        } => {
            let collection = link.collection(&target.database, &target.collection);
            let filter = parse_document(&filter)?;
            let update = parse_document(&update)?;
            let matched = if many {
                collection.update_many(filter, update).await?
            } else {
                collection.update_one(filter, update).await?
            };
            Ok(json!({ "matched": matched }))
        }
        Command::Delete {
            target,
            filter,
            many,
        } => {
            let collection = link.collection(&target.database, &target.collection);
            let filter = parse_document(&filter)?;
            let deleted = if many {
                collection.delete_many(filter).await?
            } else {
                collection.delete_one(filter).await?
            };
            Ok(json!({ "deleted": deleted }))
        }
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

fn parse_json(source: &str) -> anyhow::Result<Value> {
    serde_json::from_str(source).with_context(|| format!("Invalid JSON: {}", source))
}

/// Parse an extended JSON object into a document
pub fn parse_document(source: &str) -> anyhow::Result<Document> {
    value_to_document(parse_json(source)?)
}

fn value_to_document(value: Value) -> anyhow::Result<Document> {
    match Bson::try_from(value).context("Invalid extended JSON")? {
        Bson::Document(document) => Ok(document),
        other => bail!("expected a JSON object, got {}", describe(&other)),
    }
}

fn document_to_json(document: Document) -> Value {
    Bson::Document(document).into_relaxed_extjson()
}

fn describe(value: &Bson) -> &'static str {
    match value {
        Bson::Array(_) => "an array",
        Bson::String(_) => "a string",
        Bson::Boolean(_) => "a boolean",
        Bson::Null => "null",
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => "a number",
        _ => "a scalar",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use bson::oid::ObjectId;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_parse_plain_filter() {
        let filter = parse_document(r#"{"status": "open", "qty": {"$gt": 2}}"#).unwrap();
        assert_eq!(filter, doc! { "status": "open", "qty": { "$gt": 2 } });
    }

    #[test]
    fn test_parse_extended_json_object_id() {
        let id = ObjectId::new();
        let source = format!(r#"{{"_id": {{"$oid": "{}"}}}}"#, id.to_hex());
        assert_eq!(parse_document(&source).unwrap(), doc! { "_id": id });
    }

    #[rstest]
    #[case::array("[1, 2]", "array")]
    #[case::string(r#""open""#, "string")]
    #[case::number("4", "number")]
    fn test_non_object_is_rejected(#[case] source: &str, #[case] kind: &str) {
        let err = parse_document(source).unwrap_err();
        assert!(err.to_string().contains(kind), "{}", err);
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let err = parse_document("{status: open}").unwrap_err();
        assert!(err.to_string().starts_with("Invalid JSON"));
    }

    #[test]
    fn test_document_output_is_relaxed() {
        let value = document_to_json(doc! { "name": "widget", "qty": 4_i64 });
        assert_eq!(value, json!({ "name": "widget", "qty": 4 }));
    }
}

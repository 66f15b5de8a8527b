//! In-memory transport backend for tests and prototyping.
//!
//! Stores documents per index and evaluates the wire query DSL against
//! them, replying with the same JSON shapes a real backend produces.
//! Every request is recorded so tests can assert on exactly what was
//! sent over the seam.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value, json};

use crate::error::Result;
use crate::transport::{Method, Transport, TransportRequest, TransportResponse};

type Source = Map<String, Value>;
type Eval = std::result::Result<Option<f64>, String>;

/// Configuration for the in-memory transport.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransportConfig {
    /// Refuse the connection handshake with a 503 reply.
    pub refuse_connections: bool,
}

/// An in-memory search backend behind the [`Transport`] interface.
///
/// Term matching and full-text matching are approximated with lowercase
/// whitespace tokenization, close enough to a default-analyzer backend
/// for test scenarios. Boolean clauses follow the engine semantics:
/// `must` is required and scored, `should` is scored and required only
/// when `must` is empty, `must_not` excludes without scoring.
#[derive(Debug)]
pub struct MemoryTransport {
    config: MemoryTransportConfig,
    indices: RwLock<HashMap<String, BTreeMap<String, Source>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MemoryTransport {
    /// Create a new in-memory transport.
    pub fn new(config: MemoryTransportConfig) -> Self {
        MemoryTransport {
            config,
            indices: RwLock::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Get a copy of every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    /// Get the number of documents stored in an index.
    pub fn document_count(&self, index: &str) -> usize {
        self.indices
            .read()
            .get(index)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    fn handshake(&self) -> TransportResponse {
        if self.config.refuse_connections {
            return error_response(503, "unavailable_exception", "connections refused");
        }
        respond(
            200,
            json!({"name": "memory", "cluster_name": "memory", "status": "green"}),
        )
    }

    fn put_document(&self, index: &str, id: &str, body: Option<&[u8]>) -> TransportResponse {
        let Some(bytes) = body else {
            return error_response(400, "parsing_exception", "request body is required");
        };
        let source: Source = match serde_json::from_slice(bytes) {
            Ok(source) => source,
            Err(e) => return error_response(400, "parsing_exception", &e.to_string()),
        };

        let mut indices = self.indices.write();
        let documents = indices.entry(index.to_string()).or_default();
        let created = !documents.contains_key(id);
        documents.insert(id.to_string(), source);

        let result = if created { "created" } else { "updated" };
        respond(
            if created { 201 } else { 200 },
            json!({"_index": index, "_id": id, "result": result}),
        )
    }

    fn get_document(&self, index: &str, id: &str) -> TransportResponse {
        let indices = self.indices.read();
        match indices.get(index).and_then(|docs| docs.get(id)) {
            Some(source) => respond(
                200,
                json!({"_index": index, "_id": id, "found": true, "_source": source}),
            ),
            None => respond(404, json!({"_index": index, "_id": id, "found": false})),
        }
    }

    fn search(&self, index: &str, body: Option<&[u8]>) -> TransportResponse {
        let parsed: Value = match body {
            None => json!({}),
            Some(bytes) => match serde_json::from_slice(bytes) {
                Ok(value) => value,
                Err(e) => return error_response(400, "parsing_exception", &e.to_string()),
            },
        };
        let Some(request) = parsed.as_object() else {
            return error_response(400, "parsing_exception", "request body must be a JSON object");
        };

        let size = match request.get("size") {
            None => 10,
            Some(value) => match value.as_u64() {
                Some(size) => size,
                None => {
                    return error_response(
                        400,
                        "parsing_exception",
                        "size must be a non-negative integer",
                    );
                }
            },
        };

        let indices = self.indices.read();
        let Some(documents) = indices.get(index) else {
            return error_response(
                404,
                "index_not_found_exception",
                &format!("no such index [{index}]"),
            );
        };

        let mut matched: Vec<(&String, f64, &Source)> = Vec::new();
        for (id, source) in documents.iter() {
            let outcome = match request.get("query") {
                None => Some(1.0),
                Some(query) => match eval_query(query, source) {
                    Ok(outcome) => outcome,
                    Err(reason) => return error_response(400, "parsing_exception", &reason),
                },
            };
            if let Some(score) = outcome {
                matched.push((id, score, source));
            }
        }

        // Score descending, id ascending for ties; hits leave here
        // already sorted, the client must not re-sort.
        matched.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });

        let aggregations = match request.get("aggs").or_else(|| request.get("aggregations")) {
            None => None,
            Some(specs) => match compute_aggregations(specs, &matched) {
                Ok(aggs) => Some(aggs),
                Err(reason) => return error_response(400, "parsing_exception", &reason),
            },
        };

        let max_score = matched.first().map(|(_, score, _)| *score);
        let total = matched.len() as u64;
        let hits: Vec<Value> = matched
            .iter()
            .take(size as usize)
            .map(|(id, score, source)| json!({"_id": id, "_score": score, "_source": source}))
            .collect();

        let mut reply = json!({
            "took": 1,
            "timed_out": false,
            "hits": {
                "total": {"value": total, "relation": "eq"},
                "max_score": max_score,
                "hits": hits,
            }
        });
        if let Some(aggs) = aggregations {
            reply
                .as_object_mut()
                .expect("reply is an object")
                .insert("aggregations".to_string(), aggs);
        }
        respond(200, reply)
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        MemoryTransport::new(MemoryTransportConfig::default())
    }
}

impl Transport for MemoryTransport {
    fn send(&self, request: &TransportRequest) -> Result<TransportResponse> {
        self.requests.lock().push(request.clone());

        let segments: Vec<&str> = request.path.split('/').filter(|s| !s.is_empty()).collect();
        let response = match (request.method, segments.as_slice()) {
            (Method::Get, []) => self.handshake(),
            (Method::Put, [index, "_doc", id]) => {
                self.put_document(index, id, request.body.as_deref())
            }
            (Method::Get, [index, "_doc", id]) => self.get_document(index, id),
            (Method::Post, [index, "_search"]) => self.search(index, request.body.as_deref()),
            _ => error_response(
                400,
                "illegal_argument_exception",
                &format!("unsupported route [{} {}]", request.method.as_str(), request.path),
            ),
        };
        Ok(response)
    }
}

fn respond(status: u16, body: Value) -> TransportResponse {
    let bytes = serde_json::to_vec(&body).expect("JSON value serialization cannot fail");
    TransportResponse::new(status, bytes)
}

fn error_response(status: u16, kind: &str, reason: &str) -> TransportResponse {
    respond(
        status,
        json!({"error": {"type": kind, "reason": reason}, "status": status}),
    )
}

fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn eval_query(node: &Value, source: &Source) -> Eval {
    let Some(obj) = node.as_object() else {
        return Err("query must be a JSON object".to_string());
    };
    if obj.len() != 1 {
        return Err("query object must hold exactly one clause".to_string());
    }
    let (kind, params) = obj.iter().next().expect("clause checked non-empty");
    match kind.as_str() {
        "term" => eval_term(params, source),
        "match" => eval_match(params, source),
        "range" => eval_range(params, source),
        "bool" => eval_bool(params, source),
        other => Err(format!("unknown query type [{other}]")),
    }
}

fn single_field(params: &Value, kind: &str) -> std::result::Result<(String, Value), String> {
    let Some(obj) = params.as_object() else {
        return Err(format!("[{kind}] query body must be a JSON object"));
    };
    if obj.len() != 1 {
        return Err(format!("[{kind}] query must name exactly one field"));
    }
    let (field, value) = obj.iter().next().expect("field checked non-empty");
    Ok((field.clone(), value.clone()))
}

fn eval_term(params: &Value, source: &Source) -> Eval {
    let (field, param) = single_field(params, "term")?;
    let term = param.get("value").cloned().unwrap_or(param);
    let Some(value) = source.get(&field) else {
        return Ok(None);
    };

    let matched = match (&term, value) {
        (Value::String(term), Value::String(text)) => tokens(text).contains(&term.to_lowercase()),
        (Value::Number(_), Value::Number(_)) => term.as_f64() == value.as_f64(),
        (Value::Bool(term), Value::Bool(actual)) => term == actual,
        _ => false,
    };
    Ok(matched.then_some(1.0))
}

fn eval_match(params: &Value, source: &Source) -> Eval {
    let (field, param) = single_field(params, "match")?;
    let query = param.get("query").cloned().unwrap_or(param);
    let Some(text) = query.as_str() else {
        return Err("[match] query text must be a string".to_string());
    };
    let Some(Value::String(value)) = source.get(&field) else {
        return Ok(None);
    };

    let value_tokens = tokens(value);
    let overlap = tokens(text)
        .iter()
        .filter(|token| value_tokens.contains(token))
        .count();
    Ok((overlap > 0).then_some(overlap as f64))
}

fn eval_range(params: &Value, source: &Source) -> Eval {
    let (field, bounds) = single_field(params, "range")?;
    let Some(bounds) = bounds.as_object() else {
        return Err("[range] bounds must be a JSON object".to_string());
    };
    let bound = |key: &str| -> std::result::Result<Option<f64>, String> {
        match bounds.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| format!("[range] {key} bound must be numeric")),
        }
    };
    let gte = bound("gte")?;
    let lte = bound("lte")?;
    if gte.is_none() && lte.is_none() {
        return Err("[range] query requires at least one bound".to_string());
    }

    let Some(value) = source.get(&field).and_then(Value::as_f64) else {
        return Ok(None);
    };
    let matched = gte.is_none_or(|b| value >= b) && lte.is_none_or(|b| value <= b);
    Ok(matched.then_some(1.0))
}

fn eval_bool(params: &Value, source: &Source) -> Eval {
    let Some(obj) = params.as_object() else {
        return Err("[bool] query body must be a JSON object".to_string());
    };
    for key in obj.keys() {
        if !matches!(key.as_str(), "must" | "should" | "must_not") {
            return Err(format!("unknown bool parameter [{key}]"));
        }
    }

    let clause_list = |key: &str| -> std::result::Result<Vec<Value>, String> {
        match obj.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(single @ Value::Object(_)) => Ok(vec![single.clone()]),
            Some(_) => Err(format!("[bool] {key} must be an object or an array")),
        }
    };
    let must = clause_list("must")?;
    let should = clause_list("should")?;
    let must_not = clause_list("must_not")?;

    let mut score = 0.0;
    let mut scored = false;

    for clause in &must {
        match eval_query(clause, source)? {
            Some(s) => {
                score += s;
                scored = true;
            }
            None => return Ok(None),
        }
    }
    for clause in &must_not {
        if eval_query(clause, source)?.is_some() {
            return Ok(None);
        }
    }

    let mut should_matched = false;
    for clause in &should {
        if let Some(s) = eval_query(clause, source)? {
            score += s;
            scored = true;
            should_matched = true;
        }
    }
    // With no must clauses, at least one should clause has to match.
    if must.is_empty() && !should.is_empty() && !should_matched {
        return Ok(None);
    }

    Ok(Some(if scored { score } else { 1.0 }))
}

fn compute_aggregations(
    specs: &Value,
    matched: &[(&String, f64, &Source)],
) -> std::result::Result<Value, String> {
    let Some(specs) = specs.as_object() else {
        return Err("aggs must be a JSON object".to_string());
    };

    let mut out = Map::new();
    for (name, spec) in specs {
        let Some(histogram) = spec.get("histogram") else {
            return Err(format!("aggregation [{name}] has no supported type"));
        };
        let Some(field) = histogram.get("field").and_then(Value::as_str) else {
            return Err(format!("aggregation [{name}] requires a field"));
        };
        let interval = match histogram.get("interval").and_then(Value::as_f64) {
            Some(interval) if interval > 0.0 => interval,
            _ => return Err(format!("aggregation [{name}] requires a positive interval")),
        };

        // Slot index keeps bucket keys exact multiples of the interval
        // and the BTreeMap keeps them in ascending order.
        let mut slots: BTreeMap<i64, u64> = BTreeMap::new();
        for (_, _, source) in matched {
            if let Some(value) = source.get(field).and_then(Value::as_f64) {
                let slot = (value / interval).floor() as i64;
                *slots.entry(slot).or_insert(0) += 1;
            }
        }
        let buckets: Vec<Value> = slots
            .into_iter()
            .map(|(slot, count)| json!({"key": slot as f64 * interval, "doc_count": count}))
            .collect();
        out.insert(name.clone(), json!({"buckets": buckets}));
    }
    Ok(Value::Object(out))
}

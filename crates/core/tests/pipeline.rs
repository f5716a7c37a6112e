//! Tokenize, match, visit and execute single lines against a small registry.

use serde_json::{json, Map, Value};

use stanza_core::{
    match_line, tokenize, visit, ExecutionContext, OpenConnect, ParseError, Phase, Plugin,
    PluginResult, Registry,
};

async fn send_request(ctx: ExecutionContext) -> PluginResult {
    let targets = ctx.fetch_connect()?;
    let body: String = ctx.fetch_as("body")?;
    let timeout: Option<u64> = ctx.get_as("timeout")?;
    ctx.pass(json!({
        "to": targets,
        "body": body,
        "timeout": timeout,
    }))
}

async fn hash_it(ctx: ExecutionContext) -> PluginResult {
    let input: String = ctx.fetch_as("input")?;
    ctx.pass(input.len())
}

fn registry() -> Registry {
    let mut http = Plugin::new("http");
    http.register(OpenConnect::Connect, &["body"], "do post", send_request)
        .unwrap()
        .register(
            OpenConnect::Connect,
            &["body", "timeout"],
            "do post",
            send_request,
        )
        .unwrap();

    let mut hash = Plugin::new("hash");
    hash.register(OpenConnect::None, &["input"], "create the hash", hash_it)
        .unwrap();

    Registry::from_plugins([http, hash]).unwrap()
}

fn data(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn connect_statement_runs_end_to_end() {
    let registry = registry();
    let line = tokenize(
        "Then I connect to 'endpoint' and send timeout 'tmo' and send body 'payload' and do post and output into 'reply'",
        7,
    )
    .unwrap();

    let cst = match_line(&registry, &line);
    assert!(cst.is_match(), "{:?}", cst.errors().collect::<Vec<_>>());
    assert_eq!(cst.phase, Some(Phase::Then));

    let statement = visit(cst.candidates[0].clone()).unwrap();
    assert_eq!(statement.open_connect.as_deref(), Some("endpoint"));
    assert_eq!(statement.output.as_deref(), Some("reply"));
    assert_eq!(statement.bindings["timeout"], "tmo");

    let executor = registry.lookup(&statement.key()).unwrap();
    let ctx = ExecutionContext::new(
        statement,
        data(json!({
            "endpoint": ["http://a", "http://b"],
            "payload": "hi",
            "tmo": 30,
        })),
    );
    let value = executor.execute(ctx).await.unwrap();
    assert_eq!(
        value,
        json!({"to": ["http://a", "http://b"], "body": "hi", "timeout": 30})
    );
}

#[test]
fn parameter_sets_select_distinct_shapes() {
    let registry = registry();
    let line = tokenize(
        "Given I connect to 'endpoint' and send body 'payload' and do post",
        1,
    )
    .unwrap();

    let cst = match_line(&registry, &line);
    assert!(cst.is_match());
    assert_eq!(cst.candidates.len(), 1);
    assert_eq!(
        cst.candidates[0].key.params.iter().collect::<Vec<_>>(),
        vec!["body"]
    );
    assert_eq!(registry.plugin_of(&cst.candidates[0].key), Some("http"));
}

#[test]
fn misspelled_phrase_reports_closest_shape() {
    let registry = registry();
    let line = tokenize("Given I send input 'x' and create teh hash", 3).unwrap();

    let cst = match_line(&registry, &line);
    assert!(!cst.is_match());
    assert_eq!(cst.candidates.len(), 1);
    assert_eq!(cst.candidates[0].key.phrase(), "create the hash");
    match cst.errors().collect::<Vec<_>>().as_slice() {
        [ParseError::Wrong { token, expected }] => {
            assert_eq!(token.raw, "teh");
            assert_eq!(expected, &vec!["the".to_string()]);
        }
        other => panic!("unexpected errors: {:?}", other),
    }
}

#[test]
fn escaped_identifiers_are_decoded() {
    let registry = registry();
    let line = tokenize(r"Given I send input 'it\'s' and create the hash", 1).unwrap();
    let cst = match_line(&registry, &line);
    assert!(cst.is_match());

    let statement = visit(cst.candidates[0].clone()).unwrap();
    assert_eq!(statement.bindings["input"], "it's");
}

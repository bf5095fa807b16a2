//! Trait contract tests for the client seams using the in-process fakes.

use serde_json::{json, Map};
use snackcheck_client::fakes::{FakeClientFactory, FakeTokenIssuer};
use snackcheck_client::{ClientError, ClientFactory, GraphqlResponse, TokenIssuer};

fn deny_anonymous() -> FakeClientFactory {
    FakeClientFactory::new(|token, request| match token {
        None => GraphqlResponse::rejected("Access denied for this resource"),
        Some(_) if request.query.starts_with("mutation") => {
            GraphqlResponse::ok(json!({"OrderCocktail": true}))
        }
        Some(_) => GraphqlResponse::ok(json!({"__typename": "Query"})),
    })
}

#[tokio::test]
async fn anonymous_mutation_is_rejected() {
    let factory = deny_anonymous();
    let client = factory.client(None).unwrap();

    let err = client
        .mutate("mutation OrderCocktail { OrderCocktail(input: {}) }", &Map::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Rejected { ref message } if message.contains("Access denied")));
}

#[tokio::test]
async fn role_client_carries_issued_token() {
    let factory = deny_anonymous();
    let token = FakeTokenIssuer::new().for_user("mom@example.com", "Mom").unwrap();
    let client = factory.client(Some(&token)).unwrap();

    let mut vars = Map::new();
    vars.insert("drink".to_string(), json!("gimlet"));
    let data = client
        .mutate("mutation OrderCocktail($drink: String!) { OrderCocktail(input: { drink: $drink }) }", &vars)
        .await
        .unwrap();
    assert_eq!(data, json!({"OrderCocktail": true}));

    let recorded = factory.requests();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].token.as_deref(), Some("token-Mom"));
    assert_eq!(recorded[0].request.variables["drink"], "gimlet");
}

#[tokio::test]
async fn queries_go_through_the_same_handler() {
    let factory = deny_anonymous();
    let client = factory.client(Some("t")).unwrap();
    let data = client.query("query { __typename }", &Map::new()).await.unwrap();
    assert_eq!(data["__typename"], "Query");
}

#[test]
fn denied_role_has_no_token() {
    let issuer = FakeTokenIssuer::new().deny("Dad");
    assert!(issuer.for_user("x@example.com", "Mom").is_ok());
    assert!(matches!(
        issuer.for_user("x@example.com", "Dad"),
        Err(ClientError::MissingToken { .. })
    ));
}

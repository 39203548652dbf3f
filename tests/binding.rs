use async_trait::async_trait;
use ferrous_mvc::binding::Argument;
use ferrous_mvc::{
    ActionReturn, ActionRoute, ApplicationBuilder, Arguments, Controller, ControllerRoutes, Method, Outcome,
    ParameterBinding, Request, RequestContext, StatusCode,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

struct Greeting(&'static str);

#[derive(Deserialize)]
struct NewItem {
    name: String,
    quantity: u32,
}

struct Probe;

#[async_trait]
impl Controller for Probe {
    fn routes() -> ControllerRoutes {
        ControllerRoutes::new("/probe")
            .route(
                ActionRoute::get("/page", "page")
                    .param(ParameterBinding::query("page").number())
                    .param(ParameterBinding::query("q")),
            )
            .route(ActionRoute::get("/debug", "debug").param(ParameterBinding::header("x-debug").boolean()))
            .route(
                ActionRoute::post("/items/:id", "create")
                    .param(ParameterBinding::route("id").number())
                    .param(ParameterBinding::body()),
            )
            .route(
                ActionRoute::get("/services", "services")
                    .param(ParameterBinding::service::<Greeting>())
                    .param(ParameterBinding::context()),
            )
            .route(ActionRoute::get("/unbound", "unbound").param(ParameterBinding::service::<String>()))
            .route(ActionRoute::get("/filter", "filter").param(ParameterBinding::query("where").json()))
    }

    async fn invoke(self: Arc<Self>, action: &str, ctx: &mut RequestContext, args: Arguments) -> ActionReturn {
        match action {
            "page" => Ok(Outcome::json(json!({
                "page": args.value(0).cloned().unwrap_or(Value::Null),
                "page_missing": args.is_missing(0),
                "q": args.string(1),
            }))),
            "debug" => Ok(Outcome::json(json!({ "debug": args.boolean(0) }))),
            "create" => {
                let item: NewItem = args.deserialize(1)?;
                ctx.response.set_status(StatusCode::CREATED);
                Ok(Outcome::json(json!({
                    "id": args.integer(0),
                    "name": item.name,
                    "quantity": item.quantity,
                })))
            }
            "services" => {
                let greeting = args.require_service::<Greeting>(0)?;
                assert!(matches!(args.get(1), Some(Argument::Context)));
                Ok(Outcome::json(greeting.0))
            }
            "filter" => Ok(Outcome::json(args.value(0).cloned().unwrap_or(Value::Null))),
            _ => Ok(Outcome::Empty),
        }
    }
}

async fn app() -> ferrous_mvc::Application {
    let mut builder = ApplicationBuilder::new();
    builder.options_mut().expose_error_details = true;
    builder.services().add_scoped_factory::<Probe, _, _>(|_| async { Ok(Probe) });
    builder.services().add_singleton(Greeting("hello"));
    builder.controller::<Probe>();
    builder.build().await.unwrap()
}

async fn body(app: &ferrous_mvc::Application, request: Request) -> Value {
    let response = app.handle(request).await;
    serde_json::from_str(&response.body_text().unwrap_or_default()).unwrap_or(Value::Null)
}

#[tokio::test]
async fn test_numeric_query_is_coerced() {
    let app = app().await;
    let value = body(&app, Request::new(Method::GET, "/probe/page?page=42&q=rust")).await;
    assert_eq!(value, json!({"page": 42, "page_missing": false, "q": "rust"}));
}

#[tokio::test]
async fn test_unparseable_number_is_missing() {
    let app = app().await;
    let value = body(&app, Request::new(Method::GET, "/probe/page?page=not-a-number")).await;
    assert_eq!(value, json!({"page": null, "page_missing": true, "q": null}));
}

#[tokio::test]
async fn test_header_boolean() {
    let app = app().await;
    for (header, expected) in [("true", true), ("1", true), ("false", false), ("yes", false)] {
        let request = Request::new(Method::GET, "/probe/debug").with_header("X-Debug", header);
        assert_eq!(body(&app, request).await, json!({ "debug": expected }), "header {}", header);
    }
    let absent = body(&app, Request::new(Method::GET, "/probe/debug")).await;
    assert_eq!(absent, json!({ "debug": null }));
}

#[tokio::test]
async fn test_route_param_and_body() {
    let app = app().await;
    let request = Request::new(Method::POST, "/probe/items/9").with_body(json!({"name": "widget", "quantity": 3}));
    let response = app.handle(request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        serde_json::from_str::<Value>(&response.body_text().unwrap()).unwrap(),
        json!({"id": 9, "name": "widget", "quantity": 3})
    );
}

#[tokio::test]
async fn test_body_that_does_not_deserialize_is_an_action_error() {
    let app = app().await;
    let request = Request::new(Method::POST, "/probe/items/9").with_body(json!({"name": "widget"}));
    let response = app.handle(request).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let value: Value = serde_json::from_str(&response.body_text().unwrap()).unwrap();
    assert!(value["message"].as_str().unwrap().contains("quantity"));
}

#[tokio::test]
async fn test_service_binding() {
    let app = app().await;
    let value = body(&app, Request::new(Method::GET, "/probe/services")).await;
    assert_eq!(value, json!("hello"));
}

#[tokio::test]
async fn test_unresolvable_service_binding_is_500() {
    let app = app().await;
    let value = body(&app, Request::new(Method::GET, "/probe/unbound")).await;
    assert_eq!(value["error"], "Internal Server Error");
    assert!(value["message"].as_str().unwrap().contains("parameter 0"));
}

#[tokio::test]
async fn test_json_query_parameter() {
    let app = app().await;
    let value = body(&app, Request::new(Method::GET, "/probe/filter?where=%7B%22a%22%3A1%7D")).await;
    assert_eq!(value, json!({"a": 1}));

    let raw = body(&app, Request::new(Method::GET, "/probe/filter?where=plain")).await;
    assert_eq!(raw, json!("plain"));
}

//! Shared fixtures for integration tests.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use route_dispatch::config::DispatchConfig;
use route_dispatch::definition::{handler, Definition, Output, Parameter, Signature};
use route_dispatch::service::{HttpError, Registry};
use route_dispatch::typing::{Payload, TypeDesc, Value};
use route_dispatch::{HttpServer, Shutdown};

type Store = Arc<Mutex<BTreeMap<i64, serde_json::Value>>>;

/// A user CRUD service over an in-memory store seeded with user 1.
pub fn user_routes() -> Vec<(String, Vec<Definition>)> {
    let store: Store = Arc::new(Mutex::new(BTreeMap::from([(
        1,
        json!({"id": 1, "name": "ada"}),
    )])));

    let users = store.clone();
    let get_user = handler(
        "get_user",
        Signature::new(
            vec![TypeDesc::int()],
            vec![TypeDesc::json("User"), TypeDesc::error()],
        ),
        move |args: Vec<Value>| {
            let users = users.clone();
            async move {
                let id = args[0].payload().as_int().unwrap_or_default();
                match users.lock().unwrap().get(&id) {
                    Some(user) => vec![Some(Value::new(user.clone())), None],
                    None => vec![
                        None,
                        Some(Value::new(Payload::error(HttpError::not_found(format!(
                            "no user {id}"
                        ))))),
                    ],
                }
            }
        },
    );

    let users = store.clone();
    let delete_user = handler(
        "delete_user",
        Signature::new(vec![TypeDesc::int()], vec![TypeDesc::error()]),
        move |args: Vec<Value>| {
            let users = users.clone();
            async move {
                let id = args[0].payload().as_int().unwrap_or_default();
                match users.lock().unwrap().remove(&id) {
                    Some(_) => vec![None],
                    None => vec![Some(Value::new(Payload::error(HttpError::not_found(
                        format!("no user {id}"),
                    ))))],
                }
            }
        },
    );

    let users = store.clone();
    let list_users = handler(
        "list_users",
        Signature::new(vec![TypeDesc::int()], vec![TypeDesc::json("Users")]),
        move |args: Vec<Value>| {
            let users = users.clone();
            async move {
                let limit = args[0].payload().as_int().unwrap_or_default().max(0) as usize;
                let list: Vec<_> = users.lock().unwrap().values().take(limit).cloned().collect();
                vec![Some(Value::new(serde_json::Value::Array(list)))]
            }
        },
    );

    let users = store;
    let create_user = handler(
        "create_user",
        Signature::new(
            vec![TypeDesc::json("User")],
            vec![TypeDesc::json("Headers"), TypeDesc::json("User")],
        ),
        move |args: Vec<Value>| {
            let users = users.clone();
            async move {
                let mut user = args[0].payload().as_json().cloned().unwrap_or_default();
                let mut users = users.lock().unwrap();
                let id = users.keys().next_back().copied().unwrap_or_default() + 1;
                user["id"] = json!(id);
                users.insert(id, user.clone());
                vec![
                    Some(Value::new(json!({"location": format!("/users/{id}")}))),
                    Some(Value::new(user)),
                ]
            }
        },
    );

    let greet = handler(
        "greet",
        Signature::new(vec![TypeDesc::string()], vec![TypeDesc::string()]),
        |args: Vec<Value>| async move {
            let name = args[0].payload().as_str().unwrap_or_default();
            vec![Some(Value::new(format!("Hello, {name}!")))]
        },
    );

    vec![
        (
            "/users/{id}".to_string(),
            vec![
                Definition::new("Get")
                    .consumes(["*/*"])
                    .produces(["application/json"])
                    .function(get_user)
                    .parameter(Parameter::path("id"))
                    .result(Output::data())
                    .result(Output::error()),
                Definition::new("Delete")
                    .consumes(["*/*"])
                    .produces(["application/json"])
                    .function(delete_user)
                    .parameter(Parameter::path("id"))
                    .result(Output::error()),
            ],
        ),
        (
            "/users".to_string(),
            vec![
                Definition::new("List")
                    .consumes(["*/*"])
                    .produces(["application/json"])
                    .function(list_users)
                    .parameter(Parameter::query("limit").default(10i64))
                    .result(Output::data()),
                Definition::new("Create")
                    .consumes(["application/json"])
                    .produces(["application/json"])
                    .function(create_user)
                    .parameter(Parameter::body())
                    .result(Output::meta())
                    .result(Output::data()),
            ],
        ),
        (
            "/greeting".to_string(),
            vec![Definition::new("Get")
                .consumes(["*/*"])
                .produces(["text/plain", "application/json"])
                .function(greet)
                .parameter(Parameter::query("name").default("world"))
                .result(Output::data())],
        ),
    ]
}

/// Server over [`user_routes`] with the built-in registry.
pub fn test_server(config: DispatchConfig) -> HttpServer {
    HttpServer::new(config, Arc::new(Registry::with_defaults()), user_routes()).unwrap()
}

/// Serves [`test_server`] on an ephemeral local port until `shutdown` fires.
#[allow(dead_code)]
pub async fn spawn_server(shutdown: &Shutdown) -> (SocketAddr, JoinHandle<std::io::Result<()>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = test_server(DispatchConfig::default());
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
    (addr, handle)
}

// Tests for wiring a full client context from properties

use courier_config::{
    ClientProperties, ConfigError, ConfigManager, ConnectionProperties, FactoryProperties,
    SchedulerProperties,
};
use courier_core::{
    ClientConfig, ClientContext, ClientFactoryBuilder, DEFAULT_FACTORY, Error, ScanOptions,
};
use std::collections::BTreeMap;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod clients {
    use courier_core::CallResult;
    use courier_macro::http_service;

    #[http_service(registry = "custom")]
    pub trait CalculatorClient {
        #[get("calculate/add")]
        async fn add(&self, #[query] first: i64, #[query] second: i64) -> CallResult<i64>;
    }

    #[http_service]
    pub trait StatusClient {
        #[get("status")]
        async fn status(&self) -> CallResult<String>;
    }
}

use clients::{CalculatorClient, StatusClient};

fn shared_connection() -> ConnectionProperties {
    ConnectionProperties {
        scheduler: SchedulerProperties {
            override_default: false,
            ..SchedulerProperties::default()
        },
        ..ConnectionProperties::default()
    }
}

fn direct_connection() -> ConnectionProperties {
    ConnectionProperties {
        async_request: false,
        ..ConnectionProperties::default()
    }
}

fn properties(server: &MockServer) -> ClientProperties {
    let mut factories = BTreeMap::new();
    factories.insert(
        "custom".to_string(),
        FactoryProperties {
            base_url: format!("{}/custom", server.uri()),
            connection: direct_connection(),
        },
    );
    ClientProperties {
        default_url: Some(server.uri()),
        connection: shared_connection(),
        factories,
    }
}

#[tokio::test]
async fn test_context_from_properties() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/custom/calculate/add"))
        .and(query_param("first", "5"))
        .and(query_param("second", "12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(17))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json("up"))
        .mount(&server)
        .await;

    let context = ClientContext::builder()
        .properties(properties(&server))
        .scan(ScanOptions::new().base_module("context_tests::clients"))
        .build()
        .unwrap();

    assert_eq!(context.registry().names(), vec!["__defaultFactory", "custom"]);
    let default = context.registry().get(DEFAULT_FACTORY).unwrap();
    assert!(default.base_url().as_str().ends_with('/'));
    assert!(default.dispatch().is_async());

    let calculator = context.service::<dyn CalculatorClient>().unwrap();
    assert_eq!(calculator.add(5, 12).await.unwrap(), 17);

    let status = context.service::<dyn StatusClient>().unwrap();
    assert_eq!(status.status().await.unwrap(), "up");
}

#[tokio::test]
async fn test_context_from_config_manager() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json("ok"))
        .mount(&server)
        .await;

    let manager = ConfigManager::new();
    manager
        .set("courier.client.default-url", server.uri())
        .unwrap();
    manager
        .set("courier.client.connection.async-request", "false")
        .unwrap();

    let context = ClientContext::builder()
        .config(&manager)
        .unwrap()
        .scan(ScanOptions::new().base_module("context_tests::clients"))
        .build();

    // CalculatorClient needs the "custom" factory, which is not configured.
    let Err(Error::UnknownRegistryName(err)) = context else {
        panic!("expected the custom factory to be missing");
    };
    assert_eq!(err.requested_name, "custom");

    let context = ClientContext::builder()
        .config(&manager)
        .unwrap()
        .scan(ScanOptions::disabled())
        .build()
        .unwrap();
    assert!(context.container().names().is_empty());

    let status = context.proxies().create::<dyn StatusClient>().unwrap();
    assert_eq!(status.status().await.unwrap(), "ok");
}

fn pooled_properties(server: &MockServer) -> ClientProperties {
    let mut factories = BTreeMap::new();
    factories.insert(
        "custom".to_string(),
        FactoryProperties {
            base_url: server.uri(),
            connection: ConnectionProperties {
                scheduler: SchedulerProperties {
                    core_pool_size: 2,
                    thread_name_prefix: "CalcScheduler".to_string(),
                    ..SchedulerProperties::default()
                },
                ..ConnectionProperties::default()
            },
        },
    );
    ClientProperties {
        factories,
        ..ClientProperties::default()
    }
}

#[tokio::test]
async fn test_dedicated_scheduler_from_properties() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(3))
        .mount(&server)
        .await;

    // StatusClient binds to the default factory, which has no URL here.
    let context = ClientContext::builder()
        .properties(pooled_properties(&server))
        .scan(ScanOptions::new().base_module("context_tests::clients"))
        .build();
    assert!(matches!(context, Err(Error::UnknownRegistryName(_))));

    let context = ClientContext::builder()
        .properties(pooled_properties(&server))
        .scan(ScanOptions::disabled())
        .build()
        .unwrap();

    let factory = context.registry().get("custom").unwrap();
    let scheduler = factory.dispatch().scheduler().unwrap();
    assert!(scheduler.is_dedicated());
    assert_eq!(scheduler.worker_threads(), Some(2));

    let calculator = context.proxies().create::<dyn CalculatorClient>().unwrap();
    assert_eq!(calculator.add(1, 2).await.unwrap(), 3);
}

#[test]
fn test_application_factory_wins() {
    let app = ClientFactoryBuilder::new()
        .build(
            &ClientConfig::builder("http://localhost:9999/app")
                .async_dispatch(false)
                .build(),
        )
        .unwrap();

    let mut factories = BTreeMap::new();
    factories.insert(
        "custom".to_string(),
        FactoryProperties {
            base_url: "http://localhost:9090/custom".to_string(),
            connection: direct_connection(),
        },
    );

    let context = ClientContext::builder()
        .properties(ClientProperties {
            factories,
            ..ClientProperties::default()
        })
        .factory("custom", app.clone())
        .factory("another", app.clone())
        .scan(ScanOptions::disabled())
        .build()
        .unwrap();

    assert_eq!(context.registry().get("custom"), Some(app.clone()));
    assert_eq!(context.registry().get("another"), Some(app));
    assert!(!context.registry().contains(DEFAULT_FACTORY));
}

#[test]
fn test_invalid_properties_rejected() {
    let mut factories = BTreeMap::new();
    factories.insert(
        "custom".to_string(),
        FactoryProperties {
            base_url: "  ".to_string(),
            connection: direct_connection(),
        },
    );

    let result = ClientContext::builder()
        .properties(ClientProperties {
            factories,
            ..ClientProperties::default()
        })
        .scan(ScanOptions::disabled())
        .build();

    match result {
        Err(Error::Config(ConfigError::ValidationError { field, .. })) => {
            assert_eq!(field, "factories.custom.base-url");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("blank base URL accepted"),
    }
}

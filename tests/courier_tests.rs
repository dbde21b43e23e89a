//! Integration tests for the facade: configuration file to working proxy.

use courier::prelude::*;
use courier::{ConfigService, FileFormat, RequestIdInterceptor};
use std::io::Write;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod clients {
    use courier::{CallResult, http_service};

    #[http_service(name = "calculator", registry = "custom", crate = "::courier")]
    pub trait CalculatorClient {
        #[get("calculate/add")]
        async fn add(&self, #[query] first: i64, #[query] second: i64) -> CallResult<i64>;
    }

    #[http_service(singleton = false, crate = "::courier")]
    pub trait HealthClient {
        #[get("health")]
        async fn health(&self) -> CallResult<String>;
    }
}

use clients::{CalculatorClient, HealthClient};

fn write_config(server: &MockServer) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        r#"
[courier.client]
default-url = "{uri}"

[courier.client.connection]
async-request = false

[courier.client.factories.custom]
base-url = "{uri}/api"

[courier.client.factories.custom.connection]
write-timeout = 5000
scheduler = {{ override-default = false }}
"#,
        uri = server.uri()
    )
    .unwrap();
    file
}

#[tokio::test]
async fn test_configuration_file_to_proxy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/calculate/add"))
        .and(query_param("first", "5"))
        .and(query_param("second", "12"))
        .and(header_exists("x-request-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(17))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json("green"))
        .mount(&server)
        .await;

    let file = write_config(&server);
    let config = ConfigService::builder()
        .add_file(file.path().to_string_lossy().to_string(), FileFormat::Toml)
        .build()
        .unwrap();

    let context = ClientContext::builder()
        .properties(config.client_properties().unwrap())
        .factory_builder(ClientFactoryBuilder::new().interceptor(RequestIdInterceptor::new()))
        .scan(ScanOptions::new().base_module("courier_tests::clients"))
        .build()
        .unwrap();

    assert_eq!(context.registry().names(), vec![DEFAULT_FACTORY, "custom"]);
    let custom = context.registry().get("custom").unwrap();
    assert!(custom.dispatch().is_async());
    assert_eq!(
        custom.timeouts().write,
        Some(std::time::Duration::from_millis(5000))
    );

    let calculator = context.service::<dyn CalculatorClient>().unwrap();
    assert_eq!(calculator.add(5, 12).await.unwrap(), 17);

    let health = context.service::<dyn HealthClient>().unwrap();
    assert_eq!(health.health().await.unwrap(), "green");
}

#[tokio::test]
async fn test_registry_swap_is_seen_by_new_proxies() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    for (server, answer) in [(&first, 1), (&second, 2)] {
        Mock::given(method("GET"))
            .and(path("/calculate/add"))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer))
            .mount(server)
            .await;
    }

    let build = |uri: String| {
        ClientFactoryBuilder::new()
            .build(&courier::ClientConfig::builder(uri).async_dispatch(false).build())
            .unwrap()
    };

    let registry = ClientRegistry::new();
    registry.register("custom", build(first.uri())).unwrap();
    let proxies = ServiceProxyFactory::new(registry.clone());

    let before = proxies.create::<dyn CalculatorClient>().unwrap();
    registry.register("custom", build(second.uri())).unwrap();
    let after = proxies.create::<dyn CalculatorClient>().unwrap();

    // Existing proxies keep the factory they were created with.
    assert_eq!(before.add(0, 0).await.unwrap(), 1);
    assert_eq!(after.add(0, 0).await.unwrap(), 2);
}

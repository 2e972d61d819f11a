use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, App};
use chore_engine::{
    events::EventProducers,
    test_utils::prepare_env::empty_store,
    traits::{OrderStore, PaymentProvider},
    JsonFileStore,
    OrderFlowApi,
    ReconciliationApi,
};
use log::debug;
use serde_json::Value;
use tempfile::TempDir;

use crate::{
    catalog::CatalogConfig,
    config::ServerOptions,
    integrations::PaymentProviders,
    server::configure_routes,
};

/// An order store in a temporary directory. The directory lives as long as this value.
pub struct TestStore {
    _dir: TempDir,
    pub store: JsonFileStore,
}

impl TestStore {
    pub async fn new() -> Self {
        let (dir, store) = empty_store().await;
        Self { _dir: dir, store }
    }
}

pub async fn send_request<B, P>(store: B, provider: P, req: TestRequest) -> (StatusCode, String)
where
    B: OrderStore + 'static,
    P: PaymentProvider + 'static,
{
    send_request_with_options(store, provider, ServerOptions::default(), req).await
}

pub async fn send_request_with_options<B, P>(
    store: B,
    provider: P,
    options: ServerOptions,
    req: TestRequest,
) -> (StatusCode, String)
where
    B: OrderStore + 'static,
    P: PaymentProvider + 'static,
{
    let producers = EventProducers::default();
    let app = App::new()
        .app_data(web::Data::new(OrderFlowApi::new(store.clone(), producers.clone())))
        .app_data(web::Data::new(ReconciliationApi::new(store, producers)))
        .app_data(web::Data::new(provider))
        .app_data(web::Data::new(PaymentProviders::<P>::default()))
        .app_data(web::Data::new(CatalogConfig::default()))
        .app_data(web::Data::new(options))
        .configure(configure_routes::<B, P>);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::call_service(&service, req.to_request()).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

/// Sends `req` to a server that knows the given payment providers. The order APIs are not available.
pub async fn send_provider_request<P>(
    providers: PaymentProviders<P>,
    options: ServerOptions,
    req: TestRequest,
) -> (StatusCode, String)
where
    P: PaymentProvider + 'static,
{
    let app = App::new()
        .app_data(web::Data::new(providers))
        .app_data(web::Data::new(CatalogConfig::default()))
        .app_data(web::Data::new(options))
        .configure(configure_routes::<JsonFileStore, P>);
    let service = test::init_service(app).await;
    debug!("Making provider request");
    let (_, res) = test::call_service(&service, req.to_request()).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON. {e}: {body}"))
}

use std::time::Duration;

use actix_cors::Cors;
use actix_web::{
    dev::Server,
    http::{header, KeepAlive},
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use chore_engine::{
    events::EventProducers,
    order_objects::OrderDefaults,
    traits::{OrderStore, PaymentProvider},
    JsonFileStore,
    OrderFlowApi,
    ReconciliationApi,
};
use log::*;

use crate::{
    catalog::CatalogConfig,
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::{notifications::create_notification_event_handlers, PaymentGateway, PaymentProviders, StripeProvider},
    routes::{
        health,
        services,
        vendors,
        CheckoutSessionRoute,
        CreateCheckoutSessionRoute,
        CreateOrderRoute,
        OrderByIdRoute,
        OrdersRoute,
        PaymentProvidersRoute,
        PaymentStatusRoute,
        RefundPaymentRoute,
        StripeWebhookRoute,
        UpdateOrderStatusRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let store = JsonFileStore::new(&config.data_dir).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🚀️ Orders are kept in {}", store.path().display());
    let handlers = create_notification_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, store, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    store: JsonFileStore,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let stripe = StripeProvider::new(config.stripe.clone());
    let providers = PaymentProviders::with_stripe(stripe.clone());
    let gateway = PaymentGateway::Stripe(stripe);
    let orders_api = OrderFlowApi::new(store.clone(), producers.clone())
        .with_defaults(OrderDefaults::default().with_royalty_rate(config.royalty_rate));
    // Shared by all workers, so that reconciliation is serialised across the whole process
    let payments_api = ReconciliationApi::new(store, producers)
        .with_defaults(OrderDefaults::for_payments().with_royalty_rate(config.webhook_royalty_rate));
    let catalog = CatalogConfig::default().with_royalty_rate(config.royalty_rate);
    let options = ServerOptions::from_config(&config);
    let origins = config.allowed_origins.clone();
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("chore::access_log"))
            .wrap(build_cors(&origins))
            .app_data(web::Data::new(orders_api.clone()))
            .app_data(web::Data::new(payments_api.clone()))
            .app_data(web::Data::new(gateway.clone()))
            .app_data(web::Data::new(providers.clone()))
            .app_data(web::Data::new(catalog.clone()))
            .app_data(web::Data::new(options.clone()))
            .configure(configure_routes::<JsonFileStore, PaymentGateway>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers every route. The API state (`OrderFlowApi<B>`, `ReconciliationApi<B>`, `P`, `PaymentProviders<P>`,
/// [`CatalogConfig`] and [`ServerOptions`]) must be provided as app data by the caller.
pub fn configure_routes<B, P>(cfg: &mut web::ServiceConfig)
where
    B: OrderStore + 'static,
    P: PaymentProvider + 'static,
{
    let api_scope = web::scope("/api")
        .service(health)
        .service(services)
        .service(vendors)
        .service(PaymentProvidersRoute::<P>::new())
        .service(PaymentStatusRoute::<P>::new())
        .service(CheckoutSessionRoute::<P>::new())
        .service(RefundPaymentRoute::<P>::new())
        .service(OrdersRoute::<B>::new())
        .service(CreateOrderRoute::<B>::new())
        .service(OrderByIdRoute::<B>::new())
        .service(UpdateOrderStatusRoute::<B>::new())
        .service(CreateCheckoutSessionRoute::<B, P>::new())
        .service(StripeWebhookRoute::<B, P>::new());
    cfg.app_data(json_config()).service(health).service(api_scope);
}

/// Malformed JSON bodies get the same `{"error": ...}` response as every other client error.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Could not parse request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

fn build_cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .supports_credentials()
        .max_age(3600);
    if origins.iter().any(|o| o == "*") {
        return cors.allow_any_origin();
    }
    origins.iter().fold(cors, |cors, origin| {
        if origin.starts_with("http://") || origin.starts_with("https://") {
            cors.allowed_origin(origin)
        } else {
            warn!("🪛️ Ignoring allowed origin '{origin}'. Origins must start with http:// or https://");
            cors
        }
    })
}

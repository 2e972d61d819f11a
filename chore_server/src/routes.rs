//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every order store call is async for this reason, and so is every
//! call to the payment provider.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use chore_engine::{
    db_types::{OrderId, OrderStatusType},
    order_objects::{NewOrder, ReconciliationOutcome},
    traits::{OrderStore, PaymentProvider},
    OrderFlowApi,
    ReconciliationApi,
};
use chrono::Utc;
use log::*;
use stripe_tools::webhook::SIGNATURE_HEADER;

use crate::{
    catalog::CatalogConfig,
    config::ServerOptions,
    data_objects::{
        CheckoutSessionRequest,
        HealthResponse,
        NewOrderRequest,
        PaymentStatusResponse,
        RefundRequest,
        StatusUpdateRequest,
        WebhookAck,
    },
    errors::ServerError,
    integrations::PaymentProviders,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
/// Registered both at the root and under `/api`.
#[get("/health")]
pub async fn health(catalog: web::Data<CatalogConfig>) -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        services: catalog.service_ids(),
        vendors: catalog.vendor_ids(),
    })
}

//----------------------------------------------   Catalog  ----------------------------------------------------
#[get("/services")]
pub async fn services(catalog: web::Data<CatalogConfig>) -> impl Responder {
    trace!("💻️ GET services");
    HttpResponse::Ok().json(catalog.active_services())
}

#[get("/vendors")]
pub async fn vendors(catalog: web::Data<CatalogConfig>) -> impl Responder {
    trace!("💻️ GET vendors");
    HttpResponse::Ok().json(catalog.active_vendors())
}


//----------------------------------------------   Orders  ----------------------------------------------------
route!(orders => Get "/orders" impl OrderStore);
/// All orders, newest first. This is what the vendor dashboard polls.
pub async fn orders<B: OrderStore>(api: web::Data<OrderFlowApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders");
    let orders = api.orders().await.map_err(|e| {
        debug!("💻️ Could not fetch orders. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl OrderStore);
pub async fn order_by_id<B: OrderStore>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = OrderId::from(path.into_inner());
    debug!("💻️ GET order {id}");
    let order = api
        .order_by_id(&id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {id} does not exist")))?;
    Ok(HttpResponse::Ok().json(order))
}

route!(create_order => Post "/orders" impl OrderStore);
/// Submits an order from the web form. Responds with `201 Created` and the stored order.
///
/// Missing fields are filled in with defaults. Only an amount (`totalAmount` or `basePrice`) is required.
pub async fn create_order<B: OrderStore>(
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let new_order = NewOrder::from(body.into_inner());
    debug!("💻️ POST order {:?} for {:?}", new_order.order_reference, new_order.customer_name);
    let order = api.create_order(new_order).await.map_err(|e| {
        info!("💻️ Order was not created. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Created().json(order))
}

route!(update_order_status => Put "/orders/{id}/status" impl OrderStore);
/// Moves an order along its lifecycle. Orders never move backwards, so e.g. a delivered order cannot be marked as
/// picked up again (`409 Conflict`).
pub async fn update_order_status<B: OrderStore>(
    path: web::Path<String>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = OrderId::from(path.into_inner());
    let requested = body.into_inner().status.unwrap_or_default();
    let status = requested.parse::<OrderStatusType>().map_err(|_| {
        debug!("💻️ Refusing status update for {id}. '{requested}' is not a status");
        ServerError::InvalidStatus(requested.clone())
    })?;
    debug!("💻️ PUT status {status} for order {id}");
    let order = api.update_order_status(&id, status).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(create_checkout_session => Post "/create-checkout-session" impl OrderStore, PaymentProvider);
/// Creates a hosted payment page and returns `{url, sessionId}`. The client redirects the customer to `url`.
pub async fn create_checkout_session<B: OrderStore, P: PaymentProvider>(
    body: web::Json<CheckoutSessionRequest>,
    api: web::Data<ReconciliationApi<B>>,
    provider: web::Data<P>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner().into_checkout_request(&options.checkout_success_url, &options.checkout_cancel_url);
    debug!("💻️ POST checkout session for {} ({:?})", request.amount, request.order_reference());
    let session = api.start_checkout(provider.get_ref(), request).await.map_err(|e| {
        warn!("💻️ Could not create a checkout session. {e}");
        ServerError::from(e).redact(options.show_error_details(), "Failed to create checkout session")
    })?;
    Ok(HttpResponse::Ok().json(session))
}

route!(stripe_webhook => Post "/stripe-webhook" impl OrderStore, PaymentProvider);
/// Receives payment notifications.
///
/// The signature is checked against the raw body, so the body must not be parsed as JSON before it gets here.
/// Redelivered notifications are acknowledged without changing anything.
pub async fn stripe_webhook<B: OrderStore, P: PaymentProvider>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<ReconciliationApi<B>>,
    provider: web::Data<P>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received webhook request: {}", req.uri());
    let signature = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()).map(String::from);
    let outcome = api.process_webhook(provider.get_ref(), &body, signature).await.map_err(|e| {
        warn!("💻️ Webhook was not processed. {e}");
        ServerError::from(e)
    })?;
    match outcome {
        ReconciliationOutcome::Updated(o) => info!("💻️ Payment confirmed for order {}", o.id),
        ReconciliationOutcome::Created(o) => info!("💻️ Order {} created from payment", o.id),
        ReconciliationOutcome::AlreadyProcessed(o) => info!("💻️ Ignoring redelivered notification for {}", o.id),
        ReconciliationOutcome::Ignored => trace!("💻️ Notification acknowledged"),
    }
    Ok(HttpResponse::Ok().json(WebhookAck { received: true }))
}

route!(payment_providers => Get "/payments/providers" impl PaymentProvider);
pub async fn payment_providers<P: PaymentProvider>(providers: web::Data<PaymentProviders<P>>) -> impl Responder {
    trace!("💻️ GET payment providers");
    HttpResponse::Ok().json(providers.info())
}

route!(payment_status => Get "/payments/status/{provider}/{payment_id}" impl PaymentProvider);
/// The status of a payment, as reported by the provider that took it.
pub async fn payment_status<P: PaymentProvider>(
    path: web::Path<(String, String)>,
    providers: web::Data<PaymentProviders<P>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let (name, payment_id) = path.into_inner();
    debug!("💻️ GET status of payment {payment_id} from {name}");
    let provider = find_provider(providers.get_ref(), &name)?;
    let status = provider.payment_status(&payment_id).await.map_err(|e| {
        warn!("💻️ Could not fetch the status of payment {payment_id}. {e}");
        ServerError::from(e).redact(options.show_error_details(), "Failed to fetch the payment status")
    })?;
    Ok(HttpResponse::Ok().json(PaymentStatusResponse { provider: name, payment_id, status }))
}

route!(checkout_session => Get "/payments/sessions/{provider}/{session_id}" impl PaymentProvider);
/// The paid amount and customer details of a hosted checkout session. The thank-you page uses this to confirm a
/// payment before the notification arrives.
pub async fn checkout_session<P: PaymentProvider>(
    path: web::Path<(String, String)>,
    providers: web::Data<PaymentProviders<P>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let (name, session_id) = path.into_inner();
    debug!("💻️ GET checkout session {session_id} from {name}");
    let provider = find_provider(providers.get_ref(), &name)?;
    let session = provider.fetch_session(&session_id).await.map_err(|e| {
        warn!("💻️ Could not fetch checkout session {session_id}. {e}");
        ServerError::from(e).redact(options.show_error_details(), "Failed to fetch the checkout session")
    })?;
    Ok(HttpResponse::Ok().json(session))
}

route!(refund_payment => Post "/payments/refund" impl PaymentProvider);
/// Refunds a payment in full, or partially if the request carries an amount.
pub async fn refund_payment<P: PaymentProvider>(
    body: web::Json<RefundRequest>,
    providers: web::Data<PaymentProviders<P>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    request.validate().map_err(ServerError::ValidationError)?;
    let provider = find_provider(providers.get_ref(), &request.provider_id)?;
    let reason = request.reason.as_deref().unwrap_or("no reason given");
    info!("💻️ Refunding payment {} through {} ({reason})", request.payment_id, request.provider_id);
    let receipt = provider.issue_refund(&request.payment_id, request.amount).await.map_err(|e| {
        warn!("💻️ Could not refund payment {}. {e}", request.payment_id);
        ServerError::from(e).redact(options.show_error_details(), "Failed to refund the payment")
    })?;
    info!("💻️ Refund {} of {} issued for payment {}", receipt.refund_id, receipt.amount, receipt.payment_id);
    Ok(HttpResponse::Ok().json(receipt))
}

fn find_provider<'a, P: PaymentProvider>(providers: &'a PaymentProviders<P>, name: &str) -> Result<&'a P, ServerError> {
    providers.get(name).ok_or_else(|| ServerError::NoRecordFound(format!("Payment provider {name} does not exist")))
}

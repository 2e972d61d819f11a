use chore_engine::events::{EventHandlers, EventHooks, OrderPaidEvent, OrderStatusChangedEvent};
use log::*;

pub const NOTIFICATION_EVENT_BUFFER_SIZE: usize = 25;

/// Hooks that tell people about order progress.
///
/// There is no mail transport yet, so the paid-order hook writes the confirmation to the log on the
/// `chore::notifications` target. A mailer would subscribe here.
pub fn create_notification_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_paid(|ev| {
            Box::pin(async move {
                info!(target: "chore::notifications", "{}", paid_order_message(&ev));
            })
        })
        .on_status_changed(|ev| {
            Box::pin(async move {
                info!(target: "chore::notifications", "{}", status_change_message(&ev));
            })
        });
    EventHandlers::new(NOTIFICATION_EVENT_BUFFER_SIZE, hooks)
}

fn paid_order_message(ev: &OrderPaidEvent) -> String {
    let order = &ev.order;
    let recipient = order.metadata_str("customerEmail").unwrap_or("no e-mail on file");
    let origin = if ev.created_from_payment { " (created from payment)" } else { "" };
    format!(
        "📬️ Payment confirmed for order {}{origin}. {} paid {} for {} in {}. Confirmation goes to {recipient}.",
        order.id, order.customer_name, order.amount_paid, order.service_description, order.room_or_location
    )
}

fn status_change_message(ev: &OrderStatusChangedEvent) -> String {
    format!("📬️ Order {} for {} moved from {} to {}", ev.order.id, ev.order.customer_name, ev.old_status, ev.order.status)
}

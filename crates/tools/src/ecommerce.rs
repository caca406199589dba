//! E-commerce customer support tools.
//!
//! The business actions are simulated: each logs its arguments and returns
//! a status string for the model to relay.

use agentloop_core::error::ToolError;
use agentloop_core::message::Message;
use agentloop_core::tool::{ParamType, ToolRegistry, ToolSchema};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::scenario::{Scenario, ScenarioInput};

/// The order a support conversation is about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub status: String,
    pub total: f64,
    pub customer_id: String,
}

#[derive(Debug, Deserialize)]
struct SendCustomerMessageArgs {
    order_id: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct IssueRefundArgs {
    order_id: String,
    amount: f64,
}

#[derive(Debug, Deserialize)]
struct CancelOrderArgs {
    order_id: String,
}

#[derive(Debug, Deserialize)]
struct UpdateAddressArgs {
    order_id: String,
    shipping_address: String,
}

const ORDER_ID: &str = "The ID of the order";

pub fn register(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    registry
        .register_fn(
            ToolSchema::new("send_customer_message", "Send a plain response to the customer.")
                .required("order_id", ParamType::String, ORDER_ID)
                .required(
                    "text",
                    ParamType::String,
                    "The content of the message to send to the customer",
                ),
            |a: SendCustomerMessageArgs| async move {
                info!(order_id = %a.order_id, text = %a.text, "send_customer_message");
                Ok("sent".to_string())
            },
        )?
        .register_fn(
            ToolSchema::new("issue_refund", "Issue a refund for the given order.")
                .required("order_id", ParamType::String, ORDER_ID)
                .required("amount", ParamType::Number, "The amount to refund"),
            |a: IssueRefundArgs| async move {
                if a.amount.is_nan() || a.amount <= 0.0 {
                    return Err(ToolError::failed(format!(
                        "refund amount must be positive, got {}",
                        a.amount
                    )));
                }
                info!(order_id = %a.order_id, amount = a.amount, "issue_refund");
                Ok("refund_queued".to_string())
            },
        )?
        .register_fn(
            ToolSchema::new("cancel_order", "Cancel an order that hasn't shipped.")
                .required("order_id", ParamType::String, ORDER_ID),
            |a: CancelOrderArgs| async move {
                info!(order_id = %a.order_id, "cancel_order");
                Ok("cancelled".to_string())
            },
        )?
        .register_fn(
            ToolSchema::new(
                "update_address_for_order",
                "Change the shipping address for a pending order.",
            )
            .required("order_id", ParamType::String, ORDER_ID)
            .required("shipping_address", ParamType::String, "The new shipping address"),
            |a: UpdateAddressArgs| async move {
                info!(order_id = %a.order_id, address = %a.shipping_address, "update_address_for_order");
                Ok("address_updated".to_string())
            },
        )?;
    Ok(())
}

pub struct EcommerceScenario;

impl Scenario for EcommerceScenario {
    type Context = Order;

    const NAME: &'static str = "ecommerce";
    const DESCRIPTION: &'static str = "Customer support for a single order: refunds, cancellations, address changes";

    fn registry() -> Result<ToolRegistry, ToolError> {
        let mut registry = ToolRegistry::new();
        register(&mut registry)?;
        Ok(registry)
    }

    fn system_prompt(order: &Order) -> String {
        let order_json = serde_json::to_string(order).unwrap_or_else(|_| "{}".into());
        format!(
            "You are a helpful e-commerce support agent.\n\
             When you act, you MUST do exactly TWO steps in order:\n  \
             1) call one business tool (issue_refund / cancel_order / update_address_for_order)\n  \
             2) call send_customer_message with confirmation text\n\
             Then STOP.\n\n\
             ORDER: {order_json}"
        )
    }

    fn demo() -> ScenarioInput<Order> {
        ScenarioInput {
            context: Order {
                order_id: "A12345".into(),
                status: "Delivered".into(),
                total: 19.99,
                customer_id: "CUST001".into(),
            },
            messages: vec![Message::user("My mug arrived broken. Refund?")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        EcommerceScenario::registry().unwrap()
    }

    #[tokio::test]
    async fn business_tools_return_status_strings() {
        let registry = registry();
        let cases = [
            ("send_customer_message", json!({"order_id": "A1", "text": "Done"}), "sent"),
            ("issue_refund", json!({"order_id": "A1", "amount": 19.99}), "refund_queued"),
            ("cancel_order", json!({"order_id": "A1"}), "cancelled"),
            (
                "update_address_for_order",
                json!({"order_id": "A1", "shipping_address": "1 Main St"}),
                "address_updated",
            ),
        ];
        for (name, args, expected) in cases {
            let out = registry.resolve(name).unwrap().handler.call(args).await.unwrap();
            assert_eq!(out, expected, "tool {name}");
        }
    }

    #[tokio::test]
    async fn refund_rejects_non_positive_amounts() {
        let registry = registry();
        let refund = registry.resolve("issue_refund").unwrap();
        let err = refund
            .handler
            .call(json!({"order_id": "A1", "amount": 0}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn prompt_embeds_order_json() {
        let demo = EcommerceScenario::demo();
        let prompt = EcommerceScenario::system_prompt(&demo.context);
        assert!(prompt.starts_with("You are a helpful e-commerce support agent."));
        assert!(prompt.contains(r#"ORDER: {"order_id":"A12345","status":"Delivered","total":19.99,"customer_id":"CUST001"}"#));
    }

    #[test]
    fn schemas_mark_all_parameters_required() {
        let registry = registry();
        let schema = registry.resolve("update_address_for_order").unwrap().schema.to_json_schema();
        assert_eq!(schema["required"], json!(["order_id", "shipping_address"]));
    }
}

//! Executes a named tool-dispatcher function against the PMS connector or
//! an in-memory helper, returning a stable JSON-compatible result shape.

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::pms::{PmsConnectorFactory, PmsError};
use crate::tool_name::ToolName;

const PER_TOOL_TIMEOUT: Duration = Duration::from_millis(voice_agent_config::constants::timeouts::TOOL_MS);

#[derive(Debug, Clone)]
pub struct ToolResult {
    pub result: Value,
    pub success: bool,
    pub error: Option<String>,
    pub execution_time_ms: u64,
}

impl ToolResult {
    fn ok(result: Value, started: Instant) -> Self {
        Self {
            result,
            success: true,
            error: None,
            execution_time_ms: started.elapsed().as_millis() as u64,
        }
    }

    fn err(message: impl Into<String>, started: Instant) -> Self {
        Self {
            result: Value::Null,
            success: false,
            error: Some(message.into()),
            execution_time_ms: started.elapsed().as_millis() as u64,
        }
    }
}

/// Mutable handle into the owning call session a tool invocation may need
/// to update: which hotel to resolve a connector for, and where to append
/// escalation reasons for complaint/transfer functions (§4.4 point 3).
pub struct ToolContext<'a> {
    pub hotel_id: &'a str,
    pub escalation_reasons: &'a mut Vec<String>,
}

pub struct ToolDispatcher {
    pms_factory: Arc<dyn PmsConnectorFactory>,
}

impl ToolDispatcher {
    pub fn new(pms_factory: Arc<dyn PmsConnectorFactory>) -> Self {
        Self { pms_factory }
    }

    pub async fn dispatch(&self, name: &str, arguments: Value, ctx: &mut ToolContext<'_>) -> ToolResult {
        let started = Instant::now();

        let Ok(tool) = ToolName::from_str(name) else {
            tracing::warn!(function = %name, "tool dispatch requested for an unknown function");
            return ToolResult::err(format!("Unknown function: {name}"), started);
        };

        if let Err(reason) = tool.validate(&arguments) {
            tracing::warn!(function = %name, reason = %reason, "tool arguments failed validation");
            return ToolResult::err(reason, started);
        }

        match tokio::time::timeout(PER_TOOL_TIMEOUT, self.execute(tool, arguments, ctx)).await {
            Ok(Ok(value)) => ToolResult::ok(value, started),
            Ok(Err(e)) => {
                tracing::warn!(function = %name, error = %e, "tool execution failed");
                ToolResult::err(e.to_string(), started)
            }
            Err(_) => {
                tracing::warn!(function = %name, "tool execution timed out");
                ToolResult::err("tool execution timed out", started)
            }
        }
    }

    async fn execute(
        &self,
        tool: ToolName,
        arguments: Value,
        ctx: &mut ToolContext<'_>,
    ) -> Result<Value, PmsError> {
        match tool {
            ToolName::GetAvailability => {
                self.pms_factory.connector_for(ctx.hotel_id)?.get_availability(&arguments).await
            }
            ToolName::GetReservation => {
                self.pms_factory.connector_for(ctx.hotel_id)?.get_reservation(&arguments).await
            }
            ToolName::CreateReservation => {
                self.pms_factory.connector_for(ctx.hotel_id)?.create_reservation(&arguments).await
            }
            ToolName::ModifyReservation => {
                self.pms_factory.connector_for(ctx.hotel_id)?.modify_reservation(&arguments).await
            }
            ToolName::CancelReservation => {
                self.pms_factory.connector_for(ctx.hotel_id)?.cancel_reservation(&arguments).await
            }
            ToolName::GetUpsellingOptions => Ok(serde_json::json!({
                "options": [
                    {"upgrade_type": "suite", "description": "Upgrade to a suite with a city view"},
                    {"upgrade_type": "late_checkout", "description": "Late checkout until 2pm"},
                ]
            })),
            ToolName::ProcessUpsell => Ok(serde_json::json!({
                "accepted": true,
                "upgrade_type": arguments.get("upgrade_type").cloned().unwrap_or(Value::Null),
            })),
            ToolName::BookRestaurant => Ok(serde_json::json!({
                "booked": true,
                "date": arguments.get("date"),
                "time": arguments.get("time"),
                "party_size": arguments.get("party_size"),
            })),
            ToolName::BookSpaService => Ok(serde_json::json!({
                "booked": true,
                "service_type": arguments.get("service_type"),
            })),
            ToolName::RequestRoomService => Ok(serde_json::json!({
                "accepted": true,
                "room_number": arguments.get("room_number"),
            })),
            ToolName::GetConciergeRecommendations => Ok(serde_json::json!({
                "recommendations": ["the rooftop bar", "a guided city tour", "the downtown market"],
            })),
            ToolName::HandleComplaint => {
                let details = arguments
                    .get("complaint_details")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unspecified complaint")
                    .to_string();
                ctx.escalation_reasons.push(details.clone());
                Ok(serde_json::json!({"logged": true, "details": details}))
            }
            ToolName::TransferToHuman => {
                let reason = arguments
                    .get("reason")
                    .and_then(|v| v.as_str())
                    .unwrap_or("caller requested a human agent")
                    .to_string();
                ctx.escalation_reasons.push(reason.clone());
                Ok(serde_json::json!({"transferring": true, "reason": reason}))
            }
            ToolName::GetHotelInfo => Ok(serde_json::json!({
                "check_in_time": "15:00",
                "check_out_time": "11:00",
                "amenities": ["pool", "gym", "parking"],
            })),
            ToolName::ProcessPayment => Ok(serde_json::json!({
                "paid": true,
                "confirmation_number": arguments.get("confirmation_number"),
                "amount": arguments.get("amount"),
            })),
            ToolName::GetRatePackage => Ok(serde_json::json!({
                "packages": ["standard", "bed_and_breakfast", "all_inclusive"],
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pms::StubPmsConnectorFactory;

    #[tokio::test]
    async fn unknown_function_is_non_fatal() {
        let dispatcher = ToolDispatcher::new(Arc::new(StubPmsConnectorFactory));
        let mut reasons = Vec::new();
        let mut ctx = ToolContext {
            hotel_id: "h1",
            escalation_reasons: &mut reasons,
        };
        let result = dispatcher.dispatch("not_a_real_tool", Value::Null, &mut ctx).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Unknown function: not_a_real_tool"));
    }

    #[tokio::test]
    async fn missing_required_argument_fails_validation() {
        let dispatcher = ToolDispatcher::new(Arc::new(StubPmsConnectorFactory));
        let mut reasons = Vec::new();
        let mut ctx = ToolContext {
            hotel_id: "h1",
            escalation_reasons: &mut reasons,
        };
        let result = dispatcher.dispatch("get_reservation", serde_json::json!({}), &mut ctx).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn complaint_appends_escalation_reason() {
        let dispatcher = ToolDispatcher::new(Arc::new(StubPmsConnectorFactory));
        let mut reasons = Vec::new();
        let mut ctx = ToolContext {
            hotel_id: "h1",
            escalation_reasons: &mut reasons,
        };
        let result = dispatcher
            .dispatch(
                "handle_complaint",
                serde_json::json!({"complaint_details": "cold food"}),
                &mut ctx,
            )
            .await;
        assert!(result.success);
        assert_eq!(reasons, vec!["cold food".to_string()]);
    }

    #[tokio::test]
    async fn create_reservation_dispatches_through_pms_connector() {
        let dispatcher = ToolDispatcher::new(Arc::new(StubPmsConnectorFactory));
        let mut reasons = Vec::new();
        let mut ctx = ToolContext {
            hotel_id: "h1",
            escalation_reasons: &mut reasons,
        };
        let result = dispatcher
            .dispatch(
                "create_reservation",
                serde_json::json!({"check_in_date": "10/12", "check_out_date": "12/12", "guest_count": 2}),
                &mut ctx,
            )
            .await;
        assert!(result.success);
        assert!(result.result.get("confirmation_number").is_some());
    }
}

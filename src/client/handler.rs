//! Result handlers.
//!
//! Every command ends in exactly one call of a success handler. The failure
//! handler only turns a [`TransportFailure`] into a [`Response`]; that response
//! then goes to the success handler like any gateway reply.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::command::IssuedCommand;
use crate::response::{Response, ResponseCategory};
use crate::transport::TransportFailure;

/// Receives the response of a command.
pub type SuccessHandler = Arc<dyn Fn(Response) + Send + Sync>;

/// Builds the response for a request that got no usable reply.
pub type FailureHandler = Arc<dyn Fn(&TransportFailure, &IssuedCommand) -> Response + Send + Sync>;

/// Log a one-line summary of the response at a level matching its outcome.
pub fn report(response: Response) {
    let line = response.status_line();
    match response.category() {
        ResponseCategory::Error => error!(
            command = %response.command,
            correlation_id = %response.correlation_id,
            "{}",
            line
        ),
        ResponseCategory::Ok => info!(
            command = %response.command,
            correlation_id = %response.correlation_id,
            "{}",
            line
        ),
        ResponseCategory::Other => warn!(
            command = %response.command,
            correlation_id = %response.correlation_id,
            status = %response.status,
            "{}",
            line
        ),
    }
}

/// `Status: Error` with `"Request failed: <status text>"`, addressed to the
/// command that was being sent.
pub fn request_failed(failure: &TransportFailure, issued: &IssuedCommand) -> Response {
    Response::request_failed(&issued.command, &issued.correlation_id, failure)
}

pub fn default_success_handler() -> SuccessHandler {
    Arc::new(report)
}

pub fn default_failure_handler() -> FailureHandler {
    Arc::new(request_failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Status;

    #[test]
    fn test_request_failed_uses_issued_command() {
        let issued = IssuedCommand {
            command: "OpenShift".to_string(),
            correlation_id: "c-1".to_string(),
            device_number: 1,
        };
        let response = request_failed(&TransportFailure::Status("404 Not Found".into()), &issued);
        assert_eq!(response.status, Status::Error);
        assert_eq!(response.error, "Request failed: 404 Not Found");
        assert_eq!(response.command, "OpenShift");
        assert_eq!(response.correlation_id, "c-1");
    }

    #[test]
    fn test_report_covers_every_category() {
        let failed = Response::request_failed("XReport", "r", "timeout");
        assert_eq!(failed.category(), ResponseCategory::Error);
        assert_eq!(failed.status_line(), "XReport [r] failed: Request failed: timeout");
        report(failed.clone());

        let mut done = failed.clone();
        done.error.clear();
        done.status = Status::Ok;
        assert_eq!(done.category(), ResponseCategory::Ok);
        assert_eq!(done.status_line(), "XReport [r] completed");
        report(done.clone());

        let mut running = done;
        running.status = Status::Running;
        assert_eq!(running.category(), ResponseCategory::Other);
        assert_eq!(running.status_line(), format!("XReport [r] status: {}", Status::Running));
        report(running);
    }

    #[test]
    fn test_default_handlers() {
        let issued = IssuedCommand {
            command: "ZReport".to_string(),
            correlation_id: "z-9".to_string(),
            device_number: 0,
        };
        let response = default_failure_handler()(&TransportFailure::Timeout, &issued);
        assert_eq!(response.error, "Request failed: timeout");
        assert_eq!(response.correlation_id, "z-9");
        default_success_handler()(response);
    }
}

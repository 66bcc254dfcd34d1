use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

use crate::ApiContext;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    pub method: String,
    pub status: String,
}

#[derive(Clone)]
pub struct HttpMetrics {
    requests: Family<RequestLabels, Counter>,
}

impl HttpMetrics {
    pub fn new(registry: &mut Registry) -> Self {
        let requests = Family::<RequestLabels, Counter>::default();
        registry.register(
            "quill_http_requests",
            "HTTP requests handled, by method and status",
            requests.clone(),
        );
        Self { requests }
    }

    pub fn observe(&self, method: &str, status: u16) {
        self.requests
            .get_or_create(&RequestLabels {
                method: method.to_string(),
                status: status.to_string(),
            })
            .inc();
    }
}

/// Counts every request once the rest of the stack has produced a response.
pub async fn track(State(ctx): State<ApiContext>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let response = next.run(request).await;
    ctx.metrics.observe(&method, response.status().as_u16());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus_client::encoding::text::encode;

    #[test]
    fn observed_requests_show_up_in_the_exposition() {
        let mut registry = Registry::default();
        let metrics = HttpMetrics::new(&mut registry);
        metrics.observe("GET", 200);
        metrics.observe("GET", 200);
        metrics.observe("POST", 303);

        let mut buffer = String::new();
        encode(&mut buffer, &registry).unwrap();
        assert!(buffer.contains("quill_http_requests"));
        assert!(buffer.contains("method=\"GET\""));
        assert!(buffer.contains("status=\"303\""));
    }
}

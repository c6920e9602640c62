//! Application provides GraphQL API of the travel packages [`Service`].
//!
//! Two endpoints are served:
//! - [`graphql()`] accepts queries and mutations over HTTP `GET` and `POST`,
//!   authenticating the caller by the `Authorization: Bearer` header;
//! - [`subscriptions()`] streams live package changes over a WebSocket,
//!   authenticating the caller by the `authToken` connection parameter.

#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod api;
pub mod args;
pub mod config;
mod context;
pub mod error;

use std::sync::Arc;

use axum::{
    extract::WebSocketUpgrade,
    response::{IntoResponse, Response},
    Extension, Json,
};
use derive_more::Debug;
use juniper::{http::GraphQLBatchResponse, DefaultScalarValue, ScalarValue};
use juniper_axum::{extract::JuniperRequest, subscriptions};
use juniper_graphql_ws::ConnectionConfig;
// Used in binary.
use axum_client_ip as _;
use refinery as _;
use tower_http as _;
use tracing_subscriber as _;

pub use self::{
    args::Args,
    config::Config,
    context::{Context, Session},
    error::{AsError, Error},
};

/// [`Service`] with filled infrastructure dependencies.
///
/// [`Service`]: service::Service
pub type Service = service::Service<service::infra::Postgres>;

/// [`juniper`] GraphQL response, carrying the HTTP status of the failed
/// request.
#[derive(Debug)]
pub struct JuniperResponse<S = DefaultScalarValue>
where
    S: ScalarValue,
{
    /// Status code of the response, if the request has failed as a whole.
    ///
    /// Responses with field errors only are still `200 OK`.
    pub status_code: http::StatusCode,

    /// Underlying GraphQL response.
    #[debug(skip)]
    pub response: GraphQLBatchResponse<S>,
}

impl<S> IntoResponse for JuniperResponse<S>
where
    S: ScalarValue,
{
    fn into_response(self) -> Response {
        let Self {
            status_code,
            response,
        } = self;

        if response.is_ok() {
            Json(response).into_response()
        } else {
            (status_code, Json(response)).into_response()
        }
    }
}

/// GraphQL API handler of queries and mutations.
///
/// The status of a request failed as a whole (an unparsable or invalid
/// operation) is the one the resolvers have set into the [`Context`], see
/// [`Context::set_error_status_code()`].
pub async fn graphql(
    Extension(schema): Extension<Arc<api::Schema>>,
    context: Context,
    JuniperRequest(gql_request): JuniperRequest,
) -> JuniperResponse {
    JuniperResponse {
        status_code: context.error_status_code(),
        response: gql_request.execute(&*schema, &context).await,
    }
}

/// Subprotocols of GraphQL over WebSocket a client may choose from.
pub const SUBSCRIPTION_PROTOCOLS: [&str; 2] =
    ["graphql-transport-ws", "graphql-ws"];

/// Number of subscriptions a single WebSocket connection may run at once.
pub const MAX_SUBSCRIPTIONS_PER_CONNECTION: usize = 10;

/// GraphQL subscriptions handler.
///
/// Serves live package changes to both the public pages and the editors.
/// The `authToken` connection parameter, if any, is applied to the
/// [`Context`] before any subscription starts, so an invalid token rejects
/// the connection at once.
#[expect(
    clippy::unused_async,
    reason = "`async` is required to match signature"
)]
pub async fn subscriptions(
    Extension(schema): Extension<Arc<api::Schema>>,
    mut context: Context,
    ws: WebSocketUpgrade,
) -> Response {
    /// Maximum size of a message sent by a client.
    ///
    /// Clients only send operations, so it's kept small.
    const MAX_INCOMING_SIZE: usize = 16 * 1024;

    /// Size of the buffer collecting outgoing messages.
    ///
    /// A single emission carries a whole package document.
    const WRITE_BUFFER_SIZE: usize = 128 * 1024;

    ws.protocols(SUBSCRIPTION_PROTOCOLS)
        .max_frame_size(MAX_INCOMING_SIZE)
        .max_message_size(MAX_INCOMING_SIZE)
        .write_buffer_size(WRITE_BUFFER_SIZE)
        .max_write_buffer_size(4 * WRITE_BUFFER_SIZE)
        .on_upgrade(move |socket| {
            subscriptions::serve_ws(socket, schema, move |vars| async move {
                context.apply_subscription_variables(&vars).map(|()| {
                    ConnectionConfig::new(context)
                        .with_max_in_flight_operations(
                            MAX_SUBSCRIPTIONS_PER_CONNECTION,
                        )
                })
            })
        })
}

#[cfg(test)]
mod spec {
    use axum::response::IntoResponse as _;
    use juniper::{
        http::{GraphQLBatchResponse, GraphQLResponse},
        GraphQLError, Value,
    };

    use super::JuniperResponse;

    fn respond(
        result: Result<
            (Value, Vec<juniper::ExecutionError<juniper::DefaultScalarValue>>),
            GraphQLError,
        >,
    ) -> http::StatusCode {
        JuniperResponse {
            status_code: http::StatusCode::FORBIDDEN,
            response: GraphQLBatchResponse::Single(
                GraphQLResponse::from_result(result),
            ),
        }
        .into_response()
        .status()
    }

    #[test]
    fn keeps_ok_status_for_executed_operations() {
        assert_eq!(respond(Ok((Value::null(), vec![]))), http::StatusCode::OK);
    }

    #[test]
    fn applies_status_of_failed_request() {
        assert_eq!(
            respond(Err(GraphQLError::NoOperationProvided)),
            http::StatusCode::FORBIDDEN,
        );
    }
}

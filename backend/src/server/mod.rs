//! Server construction and middleware wiring.

mod config;
pub mod secrets;
pub mod settings;
mod state_builders;

pub use config::{ServerConfig, ServerConfigError};

use state_builders::{build_http_state, build_ws_state};

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use marketplace::Trace;
#[cfg(debug_assertions)]
use marketplace::doc::ApiDoc;
use marketplace::inbound::http::auth::TokenVerifier;
use marketplace::inbound::http::configure;
use marketplace::inbound::http::health::{HealthState, live, ready};
use marketplace::inbound::http::state::HttpState;
use marketplace::inbound::ws;
use marketplace::inbound::ws::state::WsState;
use marketplace::outbound::push::PushRegistry;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    ws_state: web::Data<WsState>,
    tokens: web::Data<TokenVerifier>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
        tokens,
    } = deps;

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        .app_data(tokens)
        .wrap(Trace)
        .service(web::scope("/api/v1").configure(configure))
        .service(ws::ws_entry)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// One [`PushRegistry`] is shared by the notification dispatcher and the
/// WebSocket sessions so pushes reach whichever worker holds the socket.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket or starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let registry = Arc::new(PushRegistry::new());
    let http_state = web::Data::new(build_http_state(&config, registry.clone()));
    let ws_state = web::Data::new(build_ws_state(&config, registry));
    let tokens = web::Data::new(config.tokens.clone());

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            ws_state: ws_state.clone(),
            tokens: tokens.clone(),
        })
    })
    .bind(config.bind_addr())?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    //! Route wiring checks against fixture-backed state.

    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use marketplace::inbound::ws::state::AllowedOrigins;
    use rstest::rstest;
    use zeroize::Zeroizing;

    fn deps() -> AppDependencies {
        let secret = Zeroizing::new(b"0123456789abcdef0123456789abcdef".to_vec());
        let tokens = TokenVerifier::new(&secret);
        let health = HealthState::default();
        health.mark_ready();
        AppDependencies {
            health_state: web::Data::new(health),
            http_state: web::Data::new(HttpState::fixtures()),
            ws_state: web::Data::new(WsState::new(
                Arc::new(PushRegistry::new()),
                tokens.clone(),
                AllowedOrigins::default(),
            )),
            tokens: web::Data::new(tokens),
        }
    }

    #[rstest]
    #[case("/health/live", StatusCode::OK)]
    #[case("/health/ready", StatusCode::OK)]
    #[case("/api/v1/orders", StatusCode::UNAUTHORIZED)]
    #[case("/api/v1/deals/buyer", StatusCode::UNAUTHORIZED)]
    #[actix_web::test]
    async fn routes_are_mounted(#[case] path: &str, #[case] expected: StatusCode) {
        let app = test::init_service(build_app(deps())).await;
        let response = test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;

        assert_eq!(response.status(), expected);
        assert!(response.headers().contains_key("trace-id"));
    }

    #[cfg(debug_assertions)]
    #[actix_web::test]
    async fn serves_openapi_document_in_debug_builds() {
        let app = test::init_service(build_app(deps())).await;
        let response = test::call_service(
            &app,
            test::TestRequest::get().uri("/api-docs/openapi.json").to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn websocket_entry_requires_an_origin() {
        let app = test::init_service(build_app(deps())).await;
        let response = test::call_service(&app, test::TestRequest::get().uri("/ws").to_request()).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

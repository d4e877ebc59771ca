use crate::configuration::Settings;
use crate::connectors;
use crate::mcp;
use crate::routes;
use actix::Actor;
use actix_cors::Cors;
use actix_web::{dev::Server, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

/// Catalog from configuration when given, built-in tools otherwise.
pub fn build_registry(settings: &Settings) -> Result<mcp::ToolRegistry, mcp::DuplicateTool> {
    match settings.mcp.tools.clone() {
        Some(tools) => mcp::ToolRegistry::from_tools(tools),
        None => Ok(mcp::ToolRegistry::with_defaults()),
    }
}

/// Must be called from inside an actix system; the SSE broadcaster is an actor.
pub fn run(listener: TcpListener, settings: Settings) -> Result<Server, std::io::Error> {
    let registry = build_registry(&settings)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))?;
    tracing::info!("Registered {} MCP tools", registry.count());

    let connector = connectors::init_downstream(&settings.downstream)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;

    let dispatcher = web::Data::new(mcp::Dispatcher::new(
        Arc::new(registry),
        connector,
        &settings,
    ));

    let broadcaster =
        mcp::SseBroadcaster::new(settings.sse.ping_interval(), settings.sse.channel_capacity)
            .start();
    let broadcaster = web::Data::new(broadcaster);

    let started_at = web::Data::new(routes::StartedAt::default());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            .app_data(dispatcher.clone())
            .app_data(broadcaster.clone())
            .app_data(started_at.clone())
            .service(routes::health_check)
            .service(
                web::resource("/")
                    .route(web::get().to(routes::events_handler))
                    .route(web::post().to(routes::rpc_handler)),
            )
            .service(web::resource("/sse").route(web::get().to(routes::events_handler)))
    })
    .listen(listener)?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::default_settings;

    #[test]
    fn duplicate_catalog_fails_startup() {
        let mut settings = default_settings("http://127.0.0.1:9/").unwrap();
        let tool = mcp::ToolRegistry::with_defaults().list_tools().remove(0);
        settings.mcp.tools = Some(vec![tool.clone(), tool]);
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();

        match run(listener, settings) {
            Err(err) => assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput),
            Ok(_) => panic!("server started with a duplicate tool name"),
        }
    }
}

use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::SessionManager;
use crate::configuration::AuthSettings;
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    create_user, get_current_user, health_check, login, refresh, revoke, update_user,
};
use crate::storage::{RefreshTokenRepository, UserRepository};

/// Build and start the HTTP server on an already bound listener
///
/// Storage is injected so tests can run against in-memory repositories.
/// Fails with `InvalidInput` if the auth settings do not validate.
pub fn run(
    listener: TcpListener,
    users: Arc<dyn UserRepository>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    settings: AuthSettings,
) -> Result<Server, std::io::Error> {
    settings
        .validate()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    let sessions = web::Data::new(SessionManager::new(
        users.clone(),
        refresh_tokens,
        settings.clone(),
    ));
    let users: web::Data<dyn UserRepository> = web::Data::from(users);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())      // Standard logging
            .wrap(LoggerMiddleware)       // Custom logging

            // Shared state
            .app_data(sessions.clone())
            .app_data(users.clone())

            .service(
                web::scope("/api")
                    .route("/healthz", web::get().to(health_check))
                    .route("/users", web::post().to(create_user))
                    .route("/users", web::put().to(update_user))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .route("/revoke", web::post().to(revoke))

                    // Protected routes (require a valid access token)
                    .service(
                        web::resource("/users/me")
                            .wrap(JwtMiddleware::new(settings.clone()))
                            .route(web::get().to(get_current_user)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
